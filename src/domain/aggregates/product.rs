//! Product Aggregate

use serde::Serialize;
use crate::domain::value_objects::{Category, Money, ProductId};

/// A purchasable catalog entry. Immutable once the catalog is loaded.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    brand: String,
    price: Money,
    original_price: Option<Money>,
    image: String,
    category: Category,
    rating: f32,
    reviews: u32,
    discount: Option<u8>,
    is_new: bool,
    is_best_seller: bool,
    description: Option<String>,
    size: Option<String>,
    in_stock: bool,
}

impl Product {
    pub fn new(id: u32, name: impl Into<String>, brand: impl Into<String>, price: Money, category: Category) -> Self {
        Self {
            id: ProductId::new(id), name: name.into(), brand: brand.into(), price, original_price: None,
            image: String::new(), category, rating: 0.0, reviews: 0, discount: None,
            is_new: false, is_best_seller: false, description: None, size: None, in_stock: true,
        }
    }

    pub fn with_original_price(mut self, price: Money) -> Self { self.original_price = Some(price); self }
    pub fn with_image(mut self, url: impl Into<String>) -> Self { self.image = url.into(); self }
    /// Rating is clamped into 0..=5.
    pub fn with_rating(mut self, rating: f32, reviews: u32) -> Self { self.rating = rating.clamp(0.0, 5.0); self.reviews = reviews; self }
    pub fn with_discount(mut self, percent: u8) -> Self { self.discount = Some(percent.min(100)); self }
    pub fn with_description(mut self, text: impl Into<String>) -> Self { self.description = Some(text.into()); self }
    pub fn with_size(mut self, size: impl Into<String>) -> Self { self.size = Some(size.into()); self }
    pub fn mark_new(mut self) -> Self { self.is_new = true; self }
    pub fn mark_best_seller(mut self) -> Self { self.is_best_seller = true; self }
    pub fn out_of_stock(mut self) -> Self { self.in_stock = false; self }

    pub fn id(&self) -> ProductId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn brand(&self) -> &str { &self.brand }
    pub fn price(&self) -> Money { self.price }
    pub fn original_price(&self) -> Option<Money> { self.original_price }
    pub fn image(&self) -> &str { &self.image }
    pub fn category(&self) -> Category { self.category }
    pub fn rating(&self) -> f32 { self.rating }
    pub fn reviews(&self) -> u32 { self.reviews }
    pub fn discount(&self) -> Option<u8> { self.discount }
    pub fn is_new(&self) -> bool { self.is_new }
    pub fn is_best_seller(&self) -> bool { self.is_best_seller }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn size(&self) -> Option<&str> { self.size.as_deref() }
    pub fn is_in_stock(&self) -> bool { self.in_stock }
}

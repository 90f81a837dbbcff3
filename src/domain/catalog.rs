//! Product catalog and stateless filtering

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Category, Money, ProductId};

const SERUM_IMAGE: &str = "https://images.unsplash.com/photo-1556228720-195a672e8a03?w=400&h=400&fit=crop";
const HAIR_IMAGE: &str = "https://images.unsplash.com/photo-1596462502278-27bfdc403348?w=400&h=400&fit=crop";
const CAPSULE_IMAGE: &str = "https://images.unsplash.com/photo-1584308666744-24d5c474f2ae?w=400&h=400&fit=crop";

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self { Self { products } }

    /// The storefront's built-in product list.
    pub fn healprint() -> Self {
        Self::new(vec![
            Product::new(1, "Hyaluronic Acid Serum", "SkinGlow", Money::from_cents(2499), Category::Skincare)
                .with_original_price(Money::from_cents(3499)).with_rating(4.8, 124).with_discount(29)
                .with_image(SERUM_IMAGE).mark_best_seller().with_size("30ml")
                .with_description("Deeply hydrating serum with 2% hyaluronic acid for plump, youthful skin"),
            Product::new(2, "Biotin Hair Growth Vitamins", "HairVital", Money::from_cents(1850), Category::HairCare)
                .with_original_price(Money::from_cents(2500)).with_rating(4.6, 89).with_discount(26)
                .with_image(HAIR_IMAGE).mark_new().with_size("60 capsules")
                .with_description("Essential vitamins for stronger, thicker hair growth"),
            Product::new(3, "Omega-3 Skin Health Capsules", "NutriSkin", Money::from_cents(2875), Category::Supplements)
                .with_original_price(Money::from_cents(3500)).with_rating(4.7, 156).with_discount(18)
                .with_image(CAPSULE_IMAGE).with_size("90 capsules")
                .with_description("Essential fatty acids for healthy skin from within"),
            Product::new(4, "Gentle Cleansing Foam", "PureFace", Money::from_cents(1599), Category::Skincare)
                .with_original_price(Money::from_cents(2200)).with_rating(4.5, 78).with_discount(27)
                .with_image(SERUM_IMAGE).mark_new().with_size("150ml")
                .with_description("Gentle foaming cleanser for all skin types"),
            Product::new(5, "Collagen Hair Mask", "HairVital", Money::from_cents(2250), Category::HairCare)
                .with_original_price(Money::from_cents(3000)).with_rating(4.8, 92).with_discount(25)
                .with_image(HAIR_IMAGE).mark_best_seller()
                .with_description("Intensive treatment mask for damaged and weak hair"),
            Product::new(6, "Probiotic Skin Support", "GutGlow", Money::from_cents(3599), Category::Supplements)
                .with_original_price(Money::from_cents(4500)).with_rating(4.6, 134).with_discount(20)
                .with_image(CAPSULE_IMAGE).mark_new()
                .with_description("Probiotic blend for healthy gut and clear skin"),
            Product::new(7, "Niacinamide Oil Control", "ClearSkin", Money::from_cents(1999), Category::Skincare)
                .with_original_price(Money::from_cents(2800)).with_rating(4.7, 98).with_discount(29)
                .with_image(SERUM_IMAGE)
                .with_description("Controls oil production and minimizes pores"),
            Product::new(8, "Keratin Hair Treatment", "HairVital", Money::from_cents(3800), Category::HairCare)
                .with_original_price(Money::from_cents(5000)).with_rating(4.8, 145).with_discount(24)
                .with_image(HAIR_IMAGE).mark_best_seller()
                .with_description("Professional keratin treatment for smooth, shiny hair"),
        ])
    }

    pub fn products(&self) -> &[Product] { &self.products }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }
    pub fn get(&self, id: ProductId) -> Option<&Product> { self.products.iter().find(|p| p.id() == id) }

    /// Applies `filter` and returns matches in the requested order. Featured order is catalog order.
    pub fn search(&self, filter: &ProductFilter) -> Vec<&Product> {
        let mut matches: Vec<&Product> = self.products.iter().filter(|p| filter.matches(p)).collect();
        filter.sort.apply(&mut matches);
        matches
    }
}

/// `all` or a single category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "skincare" => Ok(Self::Only(Category::Skincare)),
            "hair-care" => Ok(Self::Only(Category::HairCare)),
            "supplements" => Ok(Self::Only(Category::Supplements)),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = UnknownCategory;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value { CategoryFilter::All => "all".to_string(), CategoryFilter::Only(c) => c.as_str().to_string() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    Name,
    Rating,
}

impl SortOrder {
    fn apply(&self, products: &mut [&Product]) {
        match self {
            Self::Featured => {}
            Self::PriceLow => products.sort_by_key(|p| p.price()),
            Self::PriceHigh => products.sort_by(|a, b| b.price().cmp(&a.price())),
            Self::Name => products.sort_by(|a, b| a.name().cmp(b.name())),
            Self::Rating => products.sort_by(|a, b| b.rating().partial_cmp(&a.rating()).unwrap_or(Ordering::Equal)),
        }
    }
}

/// Storefront search criteria. The default matches every product in catalog order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    pub search: String,
    pub category: CategoryFilter,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub min_rating: Option<f32>,
    pub in_stock: bool,
    pub sort: SortOrder,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = needle.is_empty()
            || product.name().to_lowercase().contains(&needle)
            || product.brand().to_lowercase().contains(&needle);
        let matches_category = match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => product.category() == c,
        };
        matches_search
            && matches_category
            && self.min_price.map_or(true, |min| product.price() >= min)
            && self.max_price.map_or(true, |max| product.price() <= max)
            && self.min_rating.map_or(true, |min| product.rating() >= min)
            && (!self.in_stock || product.is_in_stock())
    }
}

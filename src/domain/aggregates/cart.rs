//! Cart Aggregate

use serde::Serialize;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Category, Money, ProductId};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

/// A cart line, copied from the product when it was first added.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: String,
    pub brand: String,
    pub category: Category,
    pub quantity: u32,
}

impl CartItem {
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id(), name: product.name().to_string(), price: product.price(),
            image: product.image().to_string(), brand: product.brand().to_string(),
            category: product.category(), quantity: 1,
        }
    }

    pub fn line_total(&self) -> Money { self.price * self.quantity }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn get(&self, id: ProductId) -> Option<&CartItem> { self.items.iter().find(|i| i.id == id) }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    /// Sum of quantities across lines.
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn total(&self) -> Money { self.items.iter().map(CartItem::line_total).sum() }

    /// Adds one unit of `product`, merging into an existing line for the same id.
    pub fn add(&mut self, product: &Product) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == product.id()) {
            existing.quantity = existing.quantity.saturating_add(1);
        } else {
            self.items.push(CartItem::from_product(product));
        }
    }

    /// Sets a line's quantity. Anything below 1 removes the line; unknown ids are ignored.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        if quantity < 1 {
            self.remove(id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Returns whether a line was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) { self.items.clear(); }

    /// Hands the lines over, leaving the cart empty.
    pub fn take_items(&mut self) -> Vec<CartItem> { std::mem::take(&mut self.items) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serum() -> Product { Product::new(1, "Serum", "SkinGlow", Money::from_cents(2499), Category::Skincare) }
    fn mask() -> Product { Product::new(5, "Hair Mask", "HairVital", Money::from_cents(2250), Category::HairCare) }

    #[test]
    fn test_add_twice_merges_lines() {
        let mut cart = Cart::new();
        cart.add(&serum());
        cart.add(&serum());
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Money::from_cents(4998));
    }

    #[test]
    fn test_add_copies_product_fields() {
        let mut cart = Cart::new();
        cart.add(&mask());
        let line = cart.get(ProductId::new(5)).unwrap();
        assert_eq!(line.name, "Hair Mask");
        assert_eq!(line.brand, "HairVital");
        assert_eq!(line.category, Category::HairCare);
        assert_eq!(line.quantity, 1);
    }

    #[test]
    fn test_update_quantity_below_one_removes() {
        for q in [0, -1, -40] {
            let mut cart = Cart::new();
            cart.add(&serum());
            cart.add(&mask());
            cart.update_quantity(ProductId::new(1), q);
            assert!(cart.get(ProductId::new(1)).is_none());
            assert_eq!(cart.item_count(), 1);
            assert_eq!(cart.total(), Money::from_cents(2250));
        }
    }

    #[test]
    fn test_update_quantity_recomputes_totals() {
        let mut cart = Cart::new();
        cart.add(&serum());
        cart.add(&mask());
        cart.update_quantity(ProductId::new(5), 3);
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.total(), Money::from_cents(2499 + 3 * 2250));
        cart.update_quantity(ProductId::new(99), 3);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::new();
        cart.add(&serum());
        assert!(!cart.remove(ProductId::new(42)));
        assert!(cart.remove(ProductId::new(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_zeroes_totals() {
        let mut cart = Cart::new();
        cart.add(&serum());
        cart.add(&mask());
        cart.clear();
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total(), Money::ZERO);
    }
}

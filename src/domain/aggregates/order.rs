//! Order Aggregate

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::aggregates::CartItem;
use crate::domain::value_objects::{Money, OrderId};

/// Calendar days between order placement and the estimated delivery date.
pub const DELIVERY_DAYS: u64 = 3;

/// Subtotals strictly above this ship free.
pub fn free_shipping_threshold() -> Money { Money::from_cents(5000) }
pub fn flat_shipping_fee() -> Money { Money::from_cents(999) }
pub fn tax_rate() -> Decimal { Decimal::new(8, 2) }

/// Price breakdown frozen into an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderTotals {
    pub fn for_subtotal(subtotal: Money) -> Self {
        let shipping = if subtotal > free_shipping_threshold() { Money::ZERO } else { flat_shipping_fee() };
        let tax = subtotal.apply_rate(tax_rate());
        Self { subtotal, shipping, tax, total: subtotal + shipping + tax }
    }

    pub fn for_items(items: &[CartItem]) -> Self {
        Self::for_subtotal(items.iter().map(CartItem::line_total).sum())
    }

    pub fn ships_free(&self) -> bool { self.shipping.is_zero() }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    PayPal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Card => "card", Self::PayPal => "paypal" }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Self::Card => "Credit / Debit Card", Self::PayPal => "PayPal" })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub street: String,
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: String,
    pub phone: Option<String>,
}

/// Everything checkout collected, before the payment gateway has approved it.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderDraft {
    pub id: OrderId,
    pub items: Vec<CartItem>,
    pub totals: OrderTotals,
    pub contact: ContactDetails,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// A completed purchase. Nothing on it changes after creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Order {
    id: OrderId,
    items: Vec<CartItem>,
    totals: OrderTotals,
    contact: ContactDetails,
    shipping_address: ShippingAddress,
    payment_method: PaymentMethod,
    payment_reference: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl Order {
    pub fn place(draft: OrderDraft, payment_reference: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: draft.id, items: draft.items, totals: draft.totals, contact: draft.contact,
            shipping_address: draft.shipping_address, payment_method: draft.payment_method,
            payment_reference: payment_reference.into(), notes: draft.notes, created_at,
        }
    }

    pub fn id(&self) -> &OrderId { &self.id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn totals(&self) -> &OrderTotals { &self.totals }
    pub fn total(&self) -> Money { self.totals.total }
    pub fn contact(&self) -> &ContactDetails { &self.contact }
    pub fn shipping_address(&self) -> &ShippingAddress { &self.shipping_address }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn payment_reference(&self) -> &str { &self.payment_reference }
    pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    pub fn estimated_delivery(&self) -> NaiveDate {
        let placed = self.created_at.date_naive();
        placed.checked_add_days(Days::new(DELIVERY_DAYS)).unwrap_or(placed)
    }

    /// e.g. "October 19, 2026 at 02:30 PM"
    pub fn formatted_date(&self) -> String { self.created_at.format("%B %-d, %Y at %I:%M %p").to_string() }

    /// e.g. "October 22, 2026"
    pub fn formatted_delivery(&self) -> String { self.estimated_delivery().format("%B %-d, %Y").to_string() }

    /// Plain-text receipt.
    pub fn receipt(&self) -> String { Receipt(self).to_string() }
}

struct Receipt<'a>(&'a Order);

impl fmt::Display for Receipt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = self.0;
        writeln!(f, "HealPrint Marketplace receipt")?;
        writeln!(f, "Order {}", order.id)?;
        writeln!(f, "Placed {}", order.formatted_date())?;
        writeln!(f)?;
        for item in &order.items {
            writeln!(f, "{} x {} ({}) @ {} = {}", item.quantity, item.name, item.brand, item.price, item.line_total())?;
        }
        writeln!(f)?;
        writeln!(f, "Subtotal: {}", order.totals.subtotal)?;
        if order.totals.ships_free() {
            writeln!(f, "Shipping: Free")?;
        } else {
            writeln!(f, "Shipping: {}", order.totals.shipping)?;
        }
        writeln!(f, "Tax: {}", order.totals.tax)?;
        writeln!(f, "Total: {}", order.totals.total)?;
        writeln!(f)?;
        let a = &order.shipping_address;
        writeln!(f, "Ship to: {}", a.name)?;
        match &a.apartment {
            Some(apt) => writeln!(f, "  {}, {}", a.street, apt)?,
            None => writeln!(f, "  {}", a.street)?,
        }
        writeln!(f, "  {}, {} {}", a.city, a.state, a.zip)?;
        writeln!(f, "  {}", a.country)?;
        writeln!(f, "Paid with: {} (ref {})", order.payment_method, order.payment_reference)?;
        writeln!(f, "Estimated delivery: {}", order.formatted_delivery())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::domain::value_objects::{Category, ProductId};

    fn line(cents: i64, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(1), name: "Serum".into(), price: Money::from_cents(cents), image: String::new(),
            brand: "SkinGlow".into(), category: Category::Skincare, quantity,
        }
    }

    #[test]
    fn test_totals_small_order_pays_shipping() {
        let totals = OrderTotals::for_items(&[line(2499, 1)]);
        assert_eq!(totals.subtotal, Money::from_cents(2499));
        assert_eq!(totals.shipping, Money::from_cents(999));
        assert_eq!(totals.tax, Money::from_cents(200));
        assert_eq!(totals.total, Money::from_cents(3698));
    }

    #[test]
    fn test_totals_over_threshold_ship_free() {
        let totals = OrderTotals::for_items(&[line(2000, 2), line(2000, 1)]);
        assert_eq!(totals.subtotal, Money::from_cents(6000));
        assert!(totals.ships_free());
        assert_eq!(totals.tax, Money::from_cents(480));
        assert_eq!(totals.total, Money::from_cents(6480));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(OrderTotals::for_subtotal(Money::from_cents(5000)).shipping, Money::from_cents(999));
        assert_eq!(OrderTotals::for_subtotal(Money::from_cents(5001)).shipping, Money::ZERO);
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        for cents in [1, 999, 4999, 5000, 5001, 12345] {
            let t = OrderTotals::for_subtotal(Money::from_cents(cents));
            assert_eq!(t.total, t.subtotal + t.shipping + t.tax);
        }
    }

    #[test]
    fn test_delivery_estimate_and_receipt() {
        let draft = OrderDraft {
            id: OrderId::generate(),
            items: vec![line(2499, 1)],
            totals: OrderTotals::for_items(&[line(2499, 1)]),
            contact: ContactDetails { email: "jane@example.com".into(), phone: None },
            shipping_address: ShippingAddress {
                name: "Jane Doe".into(), street: "123 Main Street".into(), apartment: Some("Apt 4B".into()),
                city: "New York".into(), state: "NY".into(), zip: "10001".into(), country: "US".into(),
            },
            payment_method: PaymentMethod::Card,
            notes: None,
        };
        let placed = Utc.with_ymd_and_hms(2026, 10, 30, 14, 30, 0).unwrap();
        let order = Order::place(draft, "SIM-1", placed);
        assert_eq!(order.estimated_delivery(), NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
        assert_eq!(order.formatted_delivery(), "November 2, 2026");
        assert_eq!(order.formatted_date(), "October 30, 2026 at 02:30 PM");
        let receipt = order.receipt();
        assert!(receipt.contains("1 x Serum (SkinGlow) @ $24.99 = $24.99"));
        assert!(receipt.contains("Total: $36.98"));
        assert!(receipt.contains("123 Main Street, Apt 4B"));
        assert!(receipt.contains("Shipping: $9.99"));
        assert!(receipt.ends_with("Estimated delivery: November 2, 2026\n"));
    }
}

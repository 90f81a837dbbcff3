//! Value Objects for the marketplace

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use uuid::Uuid;

/// Catalog product identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u32);

impl ProductId {
    pub const fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<u32> for ProductId {
    fn from(value: u32) -> Self { Self(value) }
}

/// Order identifier: `ORD-`, creation millis, then the random tail of a v7 UUID.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn generate() -> Self {
        Self(format!("ORD-{}-{}", Utc::now().timestamp_millis(), &Uuid::now_v7().simple().to_string()[24..]).to_uppercase())
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Money value object, always US dollars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    /// Builds an amount from whole cents, e.g. `Money::from_cents(2499)` is $24.99.
    pub fn from_cents(cents: i64) -> Self { Self(Decimal::new(cents, 2)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }

    /// Multiplies by a rate and rounds half away from zero to whole cents.
    pub fn apply_rate(&self, rate: Decimal) -> Money {
        Money((self.0 * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0 + rhs.0) }
}

impl Mul<u32> for Money {
    type Output = Money;
    fn mul(self, qty: u32) -> Money { Money(self.0 * Decimal::from(qty)) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, Add::add) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

/// Product category. The catalog only stocks these three.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Skincare,
    HairCare,
    Supplements,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Skincare => "skincare", Self::HairCare => "hair-care", Self::Supplements => "supplements" }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(2499);
        assert_eq!(a * 2, Money::from_cents(4998));
        assert_eq!(a + Money::from_cents(1), Money::from_cents(2500));
        assert_eq!(vec![a, a, a].into_iter().sum::<Money>(), Money::from_cents(7497));
    }
    #[test]
    fn test_apply_rate_rounds_to_cents() {
        let rate = Decimal::new(8, 2);
        assert_eq!(Money::from_cents(2499).apply_rate(rate), Money::from_cents(200));
        assert_eq!(Money::from_cents(6000).apply_rate(rate), Money::from_cents(480));
        assert_eq!(Money::from_cents(703).apply_rate(rate), Money::from_cents(56));
        assert_eq!(Money::from_cents(1).apply_rate(Decimal::new(5, 1)), Money::from_cents(1));
    }
    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(999).to_string(), "$9.99");
        assert_eq!(Money::new(Decimal::new(60, 0)).to_string(), "$60.00");
    }
    #[test]
    fn test_order_ids_are_unique() {
        let a = OrderId::generate();
        let b = OrderId::generate();
        assert!(a.as_str().starts_with("ORD-"));
        assert_ne!(a, b);
    }
    #[test]
    fn test_category_serde() {
        assert_eq!(serde_json::to_string(&Category::HairCare).unwrap(), "\"hair-care\"");
    }
}

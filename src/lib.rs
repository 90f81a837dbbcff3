//! HealPrint Marketplace
//!
//! Cart, wishlist, checkout and order confirmation for the HealPrint
//! skin and hair-care storefront.
//!
//! ## Features
//! - Product catalog with search, category, price and rating filters
//! - Shopping cart with merged lines and derived totals
//! - Three-step checkout (contact, shipping, payment) with per-field validation
//! - Pluggable payment gateway with retry on transient failures
//! - Order history and confirmation with delivery estimate and receipt
//! - HTTP API hosting one marketplace per shopper session

use thiserror::Error;

pub mod api;
pub mod config;
pub mod domain;
pub mod payment;

pub use config::Config;
pub use domain::aggregates::{CheckoutError, CheckoutStep, Order, Product};
pub use domain::value_objects::{Money, OrderId, ProductId};
pub use domain::{Catalog, Marketplace, ProductFilter, View};
pub use payment::{PaymentError, PaymentGateway, SimulatedGateway};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketplaceError {
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    #[error("Checkout is not open")]
    CheckoutNotOpen,

    #[error("No order to confirm")]
    NoCurrentOrder,

    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

pub type Result<T> = std::result::Result<T, MarketplaceError>;

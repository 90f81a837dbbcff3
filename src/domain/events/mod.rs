//! Domain events
use serde::Serialize;
use crate::domain::value_objects::{Money, OrderId, ProductId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketplaceEvent {
    Cart(CartEvent),
    Wishlist(WishlistEvent),
    Checkout(CheckoutEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded { product_id: ProductId, quantity: u32 },
    ItemRemoved { product_id: ProductId },
    QuantityUpdated { product_id: ProductId, quantity: u32 },
    Cleared,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WishlistEvent {
    Saved { product_id: ProductId },
    Unsaved { product_id: ProductId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CheckoutEvent {
    Started { items: usize, subtotal: Money },
    Abandoned,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: OrderId, total: Money, items: u32 },
    ConfirmationClosed { order_id: OrderId },
}

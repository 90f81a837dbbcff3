//! Aggregates module
pub mod product;
pub mod cart;
pub mod wishlist;
pub mod order;
pub mod checkout;

pub use product::Product;
pub use cart::{Cart, CartItem};
pub use wishlist::Wishlist;
pub use order::{ContactDetails, Order, OrderDraft, OrderTotals, PaymentMethod, ShippingAddress};
pub use checkout::{CardForm, CheckoutError, CheckoutSession, CheckoutStep, ContactForm, FieldError, PaymentForm, ShippingForm};

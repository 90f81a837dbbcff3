//! Marketplace aggregate root
//!
//! Owns the cart, wishlist, order history and the checkout session, plus the
//! three panel flags. All mutation goes through `&mut self`, so placing an
//! order (append history, clear cart, show confirmation) is observed as one
//! step.

use serde::Serialize;

use crate::domain::aggregates::{Cart, CheckoutSession, Order, Product, Wishlist};
use crate::domain::events::{CartEvent, CheckoutEvent, MarketplaceEvent, OrderEvent, WishlistEvent};
use crate::domain::value_objects::{Money, OrderId, ProductId};
use crate::payment::PaymentGateway;
use crate::{MarketplaceError, Result};

/// Which screen the shopper is looking at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Catalog,
    Cart,
    Checkout,
    Confirmation,
}

#[derive(Clone, Debug, Default)]
pub struct Marketplace {
    cart: Cart,
    wishlist: Wishlist,
    orders: Vec<Order>,
    current_order: Option<usize>,
    checkout: Option<CheckoutSession>,
    is_cart_open: bool,
    is_checkout_open: bool,
    is_order_confirmation_open: bool,
    events: Vec<MarketplaceEvent>,
}

impl Marketplace {
    pub fn new() -> Self { Self::default() }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn wishlist(&self) -> &Wishlist { &self.wishlist }
    pub fn orders(&self) -> &[Order] { &self.orders }
    pub fn order(&self, id: &OrderId) -> Option<&Order> { self.orders.iter().find(|o| o.id() == id) }
    pub fn current_order(&self) -> Option<&Order> { self.current_order.and_then(|i| self.orders.get(i)) }
    pub fn checkout(&self) -> Option<&CheckoutSession> { self.checkout.as_ref() }
    pub fn cart_item_count(&self) -> u32 { self.cart.item_count() }
    pub fn cart_total(&self) -> Money { self.cart.total() }
    pub fn is_in_wishlist(&self, id: ProductId) -> bool { self.wishlist.contains(id) }
    pub fn is_cart_open(&self) -> bool { self.is_cart_open }
    pub fn is_checkout_open(&self) -> bool { self.is_checkout_open }
    pub fn is_order_confirmation_open(&self) -> bool { self.is_order_confirmation_open }

    pub fn view(&self) -> View {
        if self.is_order_confirmation_open { View::Confirmation }
        else if self.is_checkout_open { View::Checkout }
        else if self.is_cart_open { View::Cart }
        else { View::Catalog }
    }

    // Cart

    pub fn add_to_cart(&mut self, product: &Product) {
        self.cart.add(product);
        let quantity = self.cart.get(product.id()).map_or(0, |i| i.quantity);
        self.raise(MarketplaceEvent::Cart(CartEvent::ItemAdded { product_id: product.id(), quantity }));
    }

    pub fn remove_from_cart(&mut self, id: ProductId) {
        if self.cart.remove(id) {
            self.raise(MarketplaceEvent::Cart(CartEvent::ItemRemoved { product_id: id }));
        }
    }

    /// Quantities below 1 remove the line.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        if quantity < 1 {
            self.remove_from_cart(id);
            return;
        }
        if self.cart.get(id).is_none() { return; }
        self.cart.update_quantity(id, quantity);
        let quantity = self.cart.get(id).map_or(0, |i| i.quantity);
        self.raise(MarketplaceEvent::Cart(CartEvent::QuantityUpdated { product_id: id, quantity }));
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.raise(MarketplaceEvent::Cart(CartEvent::Cleared));
    }

    // Wishlist

    /// Returns whether the product is saved afterwards.
    pub fn toggle_wishlist(&mut self, id: ProductId) -> bool {
        let saved = self.wishlist.toggle(id);
        let event = if saved { WishlistEvent::Saved { product_id: id } } else { WishlistEvent::Unsaved { product_id: id } };
        self.raise(MarketplaceEvent::Wishlist(event));
        saved
    }

    pub fn add_to_wishlist(&mut self, id: ProductId) {
        if self.wishlist.add(id) {
            self.raise(MarketplaceEvent::Wishlist(WishlistEvent::Saved { product_id: id }));
        }
    }

    pub fn remove_from_wishlist(&mut self, id: ProductId) {
        if self.wishlist.remove(id) {
            self.raise(MarketplaceEvent::Wishlist(WishlistEvent::Unsaved { product_id: id }));
        }
    }

    // Panels

    pub fn toggle_cart(&mut self) { self.is_cart_open = !self.is_cart_open; }
    pub fn open_cart(&mut self) { self.is_cart_open = true; }
    pub fn close_cart(&mut self) { self.is_cart_open = false; }

    /// Snapshots the cart into a new checkout session and shows it.
    ///
    /// An empty cart is refused and the shopper is sent back to the catalog.
    pub fn open_checkout(&mut self) -> Result<&mut CheckoutSession> {
        let session = match CheckoutSession::start(self.cart.items().to_vec()) {
            Ok(session) => session,
            Err(e) => {
                self.is_cart_open = false;
                self.is_checkout_open = false;
                self.checkout = None;
                return Err(e.into());
            }
        };
        if self.is_order_confirmation_open {
            self.close_order_confirmation();
        }
        self.raise(MarketplaceEvent::Checkout(CheckoutEvent::Started {
            items: session.items().len(),
            subtotal: session.totals().subtotal,
        }));
        self.is_cart_open = false;
        self.is_checkout_open = true;
        Ok(self.checkout.insert(session))
    }

    /// Hides checkout and discards the session.
    pub fn close_checkout(&mut self) {
        self.is_checkout_open = false;
        if self.checkout.take().is_some_and(|s| !s.is_submitted()) {
            self.raise(MarketplaceEvent::Checkout(CheckoutEvent::Abandoned));
        }
    }

    pub fn checkout_mut(&mut self) -> Result<&mut CheckoutSession> {
        self.checkout.as_mut().ok_or(MarketplaceError::CheckoutNotOpen)
    }

    /// Charges the open checkout and, on approval, completes the order.
    pub async fn place_order(&mut self, gateway: &dyn PaymentGateway, max_attempts: u32) -> Result<&Order> {
        let session = self.checkout.as_mut().ok_or(MarketplaceError::CheckoutNotOpen)?;
        let order = session.submit(gateway, max_attempts).await?;
        Ok(self.complete_order(order))
    }

    /// Records `order`, empties the cart and shows the confirmation in one step.
    pub fn complete_order(&mut self, order: Order) -> &Order {
        tracing::info!(order_id = %order.id(), total = %order.total(), items = order.item_count(), "order placed");
        self.raise(MarketplaceEvent::Order(OrderEvent::Placed {
            order_id: order.id().clone(),
            total: order.total(),
            items: order.item_count(),
        }));
        self.orders.push(order);
        self.cart.clear();
        self.current_order = Some(self.orders.len() - 1);
        self.checkout = None;
        self.is_cart_open = false;
        self.is_checkout_open = false;
        self.is_order_confirmation_open = true;
        &self.orders[self.orders.len() - 1]
    }

    pub fn open_order_confirmation(&mut self) -> Result<&Order> {
        let index = self.current_order.ok_or(MarketplaceError::NoCurrentOrder)?;
        self.is_checkout_open = false;
        self.checkout = None;
        self.is_order_confirmation_open = true;
        self.orders.get(index).ok_or(MarketplaceError::NoCurrentOrder)
    }

    /// "Continue shopping": forget the current order and return to the catalog.
    pub fn close_order_confirmation(&mut self) {
        if let Some(order) = self.current_order.take().and_then(|i| self.orders.get(i)) {
            let order_id = order.id().clone();
            self.raise(MarketplaceEvent::Order(OrderEvent::ConfirmationClosed { order_id }));
        }
        self.is_order_confirmation_open = false;
        self.is_cart_open = false;
    }

    pub fn take_events(&mut self) -> Vec<MarketplaceEvent> { std::mem::take(&mut self.events) }
    fn raise(&mut self, e: MarketplaceEvent) { self.events.push(e); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{CheckoutError, CheckoutStep, ContactForm, PaymentForm, PaymentMethod, ShippingForm};
    use crate::domain::value_objects::Category;
    use crate::payment::testing::ScriptedGateway;
    use crate::payment::{PaymentError, SimulatedGateway};

    fn product(id: u32, cents: i64) -> Product {
        Product::new(id, format!("Product {id}"), "Brand", Money::from_cents(cents), Category::Skincare)
    }

    fn fill_checkout(market: &mut Marketplace) {
        let session = market.checkout_mut().unwrap();
        session.set_contact(ContactForm { email: "jane@example.com".into(), phone: String::new() }).unwrap();
        session.next().unwrap();
        session.set_shipping(ShippingForm {
            first_name: "Jane".into(), last_name: "Doe".into(), address: "1 Main St".into(),
            city: "Austin".into(), state: "TX".into(), zip: "73301".into(), ..ShippingForm::default()
        }).unwrap();
        session.next().unwrap();
        session.set_payment(PaymentForm { payment_method: Some(PaymentMethod::PayPal), ..PaymentForm::default() }).unwrap();
    }

    #[test]
    fn test_cart_operations_and_derived_values() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.add_to_cart(&product(1, 2499));
        market.add_to_cart(&product(2, 1000));
        assert_eq!(market.cart().items().len(), 2);
        assert_eq!(market.cart_item_count(), 3);
        assert_eq!(market.cart_total(), Money::from_cents(5998));
        market.update_quantity(ProductId::new(1), 0);
        assert_eq!(market.cart_item_count(), 1);
        market.remove_from_cart(ProductId::new(99));
        market.clear_cart();
        assert_eq!(market.cart_total(), Money::ZERO);
    }

    #[test]
    fn test_open_checkout_closes_cart() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.open_cart();
        assert_eq!(market.view(), View::Cart);
        market.open_checkout().unwrap();
        assert!(!market.is_cart_open());
        assert_eq!(market.view(), View::Checkout);
    }

    #[test]
    fn test_empty_cart_checkout_returns_to_catalog() {
        let mut market = Marketplace::new();
        market.open_cart();
        let err = market.open_checkout().unwrap_err();
        assert!(matches!(err, MarketplaceError::Checkout(CheckoutError::EmptyCart)));
        assert_eq!(market.view(), View::Catalog);
        assert!(market.checkout().is_none());
    }

    #[test]
    fn test_checkout_ignores_later_cart_changes() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.open_checkout().unwrap();
        market.add_to_cart(&product(2, 10000));
        let session = market.checkout().unwrap();
        assert_eq!(session.items().len(), 1);
        assert_eq!(session.totals().total, Money::from_cents(3698));
    }

    #[tokio::test]
    async fn test_place_order_is_atomic() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2000));
        market.add_to_cart(&product(1, 2000));
        market.add_to_cart(&product(2, 2000));
        market.open_checkout().unwrap();
        fill_checkout(&mut market);

        let order = market.place_order(&SimulatedGateway::instant(), 1).await.unwrap().clone();
        assert_eq!(order.total(), Money::from_cents(6480));
        assert!(market.cart().is_empty());
        assert_eq!(market.orders().len(), 1);
        assert_eq!(market.orders()[0], order);
        assert_eq!(market.current_order(), Some(&order));
        assert_eq!(order.items().iter().map(|i| i.quantity).sum::<u32>(), 3);
        assert_eq!(market.view(), View::Confirmation);
        assert!(!market.is_checkout_open());
        assert!(market.checkout().is_none());
    }

    #[tokio::test]
    async fn test_declined_order_keeps_cart_and_history() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.open_checkout().unwrap();
        fill_checkout(&mut market);
        let gateway = ScriptedGateway::failing_with([PaymentError::Declined { reason: "no".into() }]);
        let err = market.place_order(&gateway, 1).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Checkout(CheckoutError::Payment(_))));
        assert_eq!(market.cart_item_count(), 1);
        assert!(market.orders().is_empty());
        assert_eq!(market.checkout().map(|s| s.step()), Some(CheckoutStep::Payment));
    }

    #[tokio::test]
    async fn test_incomplete_checkout_cannot_place_order() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.open_checkout().unwrap();
        let err = market.place_order(&SimulatedGateway::instant(), 1).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Checkout(CheckoutError::InvalidTransition { .. })));
        assert!(market.orders().is_empty());
    }

    #[tokio::test]
    async fn test_continue_shopping_clears_current_order() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.open_checkout().unwrap();
        fill_checkout(&mut market);
        market.place_order(&SimulatedGateway::instant(), 1).await.unwrap();
        market.close_order_confirmation();
        assert!(market.current_order().is_none());
        assert_eq!(market.orders().len(), 1);
        assert_eq!(market.view(), View::Catalog);
        assert!(matches!(market.open_order_confirmation(), Err(MarketplaceError::NoCurrentOrder)));
    }

    #[test]
    fn test_place_order_requires_open_checkout() {
        let mut market = Marketplace::new();
        assert!(matches!(market.checkout_mut(), Err(MarketplaceError::CheckoutNotOpen)));
    }

    #[test]
    fn test_wishlist_toggle_and_events() {
        let mut market = Marketplace::new();
        let id = ProductId::new(4);
        assert!(market.toggle_wishlist(id));
        assert!(market.is_in_wishlist(id));
        assert!(!market.toggle_wishlist(id));
        assert!(!market.is_in_wishlist(id));
        let events = market.take_events();
        assert_eq!(events, vec![
            MarketplaceEvent::Wishlist(WishlistEvent::Saved { product_id: id }),
            MarketplaceEvent::Wishlist(WishlistEvent::Unsaved { product_id: id }),
        ]);
        assert!(market.take_events().is_empty());
    }

    #[test]
    fn test_wishlist_add_and_remove_are_idempotent() {
        let mut market = Marketplace::new();
        let id = ProductId::new(2);
        market.add_to_wishlist(id);
        market.add_to_wishlist(id);
        assert!(market.is_in_wishlist(id));
        assert_eq!(market.wishlist().ids().count(), 1);
        market.remove_from_wishlist(id);
        market.remove_from_wishlist(id);
        assert!(!market.is_in_wishlist(id));
        assert_eq!(market.take_events(), vec![
            MarketplaceEvent::Wishlist(WishlistEvent::Saved { product_id: id }),
            MarketplaceEvent::Wishlist(WishlistEvent::Unsaved { product_id: id }),
        ]);
    }

    #[test]
    fn test_cart_drawer_flags() {
        let mut market = Marketplace::new();
        market.toggle_cart();
        assert!(market.is_cart_open());
        market.toggle_cart();
        assert!(!market.is_cart_open());
        market.open_cart();
        market.open_cart();
        assert_eq!(market.view(), View::Cart);
        market.close_cart();
        assert_eq!(market.view(), View::Catalog);
    }

    #[tokio::test]
    async fn test_refused_checkout_keeps_confirmation() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.open_checkout().unwrap();
        fill_checkout(&mut market);
        let order_id = market.place_order(&SimulatedGateway::instant(), 1).await.unwrap().id().clone();

        let err = market.open_checkout().unwrap_err();
        assert!(matches!(err, MarketplaceError::Checkout(CheckoutError::EmptyCart)));
        assert_eq!(market.current_order().map(|o| o.id()), Some(&order_id));
        assert_eq!(market.view(), View::Confirmation);
    }

    #[tokio::test]
    async fn test_opening_checkout_closes_confirmation() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.open_checkout().unwrap();
        fill_checkout(&mut market);
        market.place_order(&SimulatedGateway::instant(), 1).await.unwrap();

        market.add_to_cart(&product(2, 1000));
        market.open_checkout().unwrap();
        assert!(market.current_order().is_none());
        assert_eq!(market.view(), View::Checkout);
    }

    #[tokio::test]
    async fn test_order_lookup_by_id() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.open_checkout().unwrap();
        fill_checkout(&mut market);
        let order_id = market.place_order(&SimulatedGateway::instant(), 1).await.unwrap().id().clone();
        market.close_order_confirmation();
        assert_eq!(market.order(&order_id).map(|o| o.total()), Some(Money::from_cents(3698)));
        assert!(market.order(&OrderId::generate()).is_none());
    }

    #[test]
    fn test_close_checkout_records_abandonment() {
        let mut market = Marketplace::new();
        market.add_to_cart(&product(1, 2499));
        market.open_checkout().unwrap();
        market.take_events();
        market.close_checkout();
        assert_eq!(market.take_events(), vec![MarketplaceEvent::Checkout(CheckoutEvent::Abandoned)]);
        assert_eq!(market.view(), View::Catalog);
        assert_eq!(market.cart_item_count(), 1);
    }
}

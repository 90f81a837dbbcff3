//! Request handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::domain::aggregates::{CartItem, CheckoutSession, ContactForm, Order, PaymentForm, Product, ShippingForm};
use crate::domain::value_objects::{Money, OrderId, ProductId};
use crate::domain::{Marketplace, ProductFilter, View};
use crate::MarketplaceError;

type ApiResult<T> = Result<T, ApiError>;

/// Runs `f` against the session's marketplace, or an empty one when the
/// session has never been written to.
async fn read<T>(s: &AppState, session: &str, f: impl FnOnce(&Marketplace) -> T) -> T {
    let Some(market) = s.existing_session(session) else { return f(&Marketplace::default()) };
    let m = market.lock().await;
    f(&m)
}

/// Drains the marketplace's domain events into the log.
fn publish(session: &str, market: &mut Marketplace) {
    for event in market.take_events() {
        tracing::info!(session, ?event, "marketplace event");
    }
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub view: View,
    pub cart_item_count: u32,
    pub cart_total: Money,
    pub wishlist: Vec<ProductId>,
    pub orders: usize,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub total: Money,
    pub is_open: bool,
}

impl From<&Marketplace> for CartView {
    fn from(m: &Marketplace) -> Self {
        Self { items: m.cart().items().to_vec(), item_count: m.cart_item_count(), total: m.cart_total(), is_open: m.is_cart_open() }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step_number: u8,
    #[serde(flatten)]
    pub session: CheckoutSession,
}

impl From<&CheckoutSession> for CheckoutView {
    fn from(s: &CheckoutSession) -> Self { Self { step_number: s.step().number(), session: s.clone() } }
}

#[derive(Debug, Serialize)]
pub struct ConfirmationView {
    pub order: Order,
    pub order_date: String,
    pub estimated_delivery: String,
}

impl From<&Order> for ConfirmationView {
    fn from(o: &Order) -> Self {
        Self { order: o.clone(), order_date: o.formatted_date(), estimated_delivery: o.formatted_delivery() }
    }
}

#[derive(Debug, Serialize)]
pub struct WishlistToggled {
    pub product_id: ProductId,
    pub saved: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

// =============================================================================
// Catalog
// =============================================================================

pub async fn list_products(State(s): State<AppState>, Query(filter): Query<ProductFilter>) -> Json<Vec<Product>> {
    Json(s.catalog.search(&filter).into_iter().cloned().collect())
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<ProductId>) -> ApiResult<Json<Product>> {
    s.catalog.get(id).cloned().map(Json).ok_or(ApiError(MarketplaceError::ProductNotFound(id)))
}

// =============================================================================
// Session, cart and wishlist
// =============================================================================

pub async fn get_session(State(s): State<AppState>, Path(session): Path<String>) -> Json<SessionView> {
    read(&s, &session, |m| {
        Json(SessionView {
            view: m.view(),
            cart_item_count: m.cart_item_count(),
            cart_total: m.cart_total(),
            wishlist: m.wishlist().ids().collect(),
            orders: m.orders().len(),
        })
    })
    .await
}

pub async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Json<CartView> {
    read(&s, &session, |m| Json(CartView::from(m))).await
}

pub async fn add_to_cart(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<AddToCartRequest>,
) -> ApiResult<(StatusCode, Json<CartView>)> {
    let product = s.catalog.get(r.product_id).ok_or(MarketplaceError::ProductNotFound(r.product_id))?;
    let market = s.session(&session);
    let mut m = market.lock().await;
    m.add_to_cart(product);
    publish(&session, &mut m);
    Ok((StatusCode::CREATED, Json(CartView::from(&*m))))
}

pub async fn update_quantity(
    State(s): State<AppState>,
    Path((session, id)): Path<(String, ProductId)>,
    Json(r): Json<UpdateQuantityRequest>,
) -> Json<CartView> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    m.update_quantity(id, r.quantity);
    publish(&session, &mut m);
    Json(CartView::from(&*m))
}

pub async fn remove_from_cart(State(s): State<AppState>, Path((session, id)): Path<(String, ProductId)>) -> Json<CartView> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    m.remove_from_cart(id);
    publish(&session, &mut m);
    Json(CartView::from(&*m))
}

pub async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> StatusCode {
    let market = s.session(&session);
    let mut m = market.lock().await;
    m.clear_cart();
    publish(&session, &mut m);
    StatusCode::NO_CONTENT
}

pub async fn toggle_cart(State(s): State<AppState>, Path(session): Path<String>) -> Json<CartView> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    m.toggle_cart();
    Json(CartView::from(&*m))
}

pub async fn get_wishlist(State(s): State<AppState>, Path(session): Path<String>) -> Json<Vec<Product>> {
    read(&s, &session, |m| Json(m.wishlist().ids().filter_map(|id| s.catalog.get(id).cloned()).collect())).await
}

pub async fn toggle_wishlist(
    State(s): State<AppState>,
    Path((session, id)): Path<(String, ProductId)>,
) -> ApiResult<Json<WishlistToggled>> {
    s.catalog.get(id).ok_or(MarketplaceError::ProductNotFound(id))?;
    let market = s.session(&session);
    let mut m = market.lock().await;
    let saved = m.toggle_wishlist(id);
    publish(&session, &mut m);
    Ok(Json(WishlistToggled { product_id: id, saved }))
}

// =============================================================================
// Checkout
// =============================================================================

pub async fn open_checkout(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<CheckoutView>> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    let view = m.open_checkout().map(|c| CheckoutView::from(&*c));
    publish(&session, &mut m);
    Ok(Json(view?))
}

pub async fn get_checkout(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<CheckoutView>> {
    let view = read(&s, &session, |m| m.checkout().map(CheckoutView::from)).await;
    Ok(Json(view.ok_or(MarketplaceError::CheckoutNotOpen)?))
}

pub async fn close_checkout(State(s): State<AppState>, Path(session): Path<String>) -> StatusCode {
    let market = s.session(&session);
    let mut m = market.lock().await;
    m.close_checkout();
    publish(&session, &mut m);
    StatusCode::NO_CONTENT
}

pub async fn set_contact(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(form): Json<ContactForm>,
) -> ApiResult<Json<CheckoutView>> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    let checkout = m.checkout_mut()?;
    checkout.set_contact(form)?;
    Ok(Json(CheckoutView::from(&*checkout)))
}

pub async fn set_shipping(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(form): Json<ShippingForm>,
) -> ApiResult<Json<CheckoutView>> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    let checkout = m.checkout_mut()?;
    checkout.set_shipping(form)?;
    Ok(Json(CheckoutView::from(&*checkout)))
}

pub async fn set_payment(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(form): Json<PaymentForm>,
) -> ApiResult<Json<CheckoutView>> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    let checkout = m.checkout_mut()?;
    checkout.set_payment(form)?;
    Ok(Json(CheckoutView::from(&*checkout)))
}

pub async fn next_step(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<CheckoutView>> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    let checkout = m.checkout_mut()?;
    let step = checkout.next()?;
    tracing::info!(%session, %step, "checkout advanced");
    Ok(Json(CheckoutView::from(&*checkout)))
}

pub async fn previous_step(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<CheckoutView>> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    let checkout = m.checkout_mut()?;
    checkout.back()?;
    Ok(Json(CheckoutView::from(&*checkout)))
}

pub async fn submit_order(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> ApiResult<(StatusCode, Json<ConfirmationView>)> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    let placed = m.place_order(s.gateway.as_ref(), s.payment_max_attempts).await.map(ConfirmationView::from);
    publish(&session, &mut m);
    if let Err(e) = &placed {
        tracing::warn!(%session, error = %e, "order not placed");
    }
    Ok((StatusCode::CREATED, Json(placed?)))
}

// =============================================================================
// Confirmation and history
// =============================================================================

pub async fn get_confirmation(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<ConfirmationView>> {
    let view = read(&s, &session, |m| m.current_order().map(ConfirmationView::from)).await;
    Ok(Json(view.ok_or(MarketplaceError::NoCurrentOrder)?))
}

pub async fn show_confirmation(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<Json<ConfirmationView>> {
    let market = s.session(&session);
    let mut m = market.lock().await;
    let order = m.open_order_confirmation()?;
    Ok(Json(ConfirmationView::from(order)))
}

pub async fn continue_shopping(State(s): State<AppState>, Path(session): Path<String>) -> StatusCode {
    let market = s.session(&session);
    let mut m = market.lock().await;
    m.close_order_confirmation();
    publish(&session, &mut m);
    StatusCode::NO_CONTENT
}

pub async fn download_receipt(State(s): State<AppState>, Path(session): Path<String>) -> ApiResult<impl IntoResponse> {
    let receipt = read(&s, &session, |m| m.current_order().map(|o| (o.id().clone(), o.receipt()))).await;
    let (order_id, body) = receipt.ok_or(MarketplaceError::NoCurrentOrder)?;
    let disposition = format!("attachment; filename=\"{order_id}.txt\"");
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()), (header::CONTENT_DISPOSITION, disposition)],
        body,
    ))
}

pub async fn list_orders(State(s): State<AppState>, Path(session): Path<String>) -> Json<Vec<Order>> {
    read(&s, &session, |m| Json(m.orders().to_vec())).await
}

pub async fn get_order(
    State(s): State<AppState>,
    Path((session, order_id)): Path<(String, OrderId)>,
) -> ApiResult<Json<ConfirmationView>> {
    let view = read(&s, &session, |m| m.order(&order_id).map(ConfirmationView::from)).await;
    Ok(Json(view.ok_or(MarketplaceError::OrderNotFound(order_id))?))
}

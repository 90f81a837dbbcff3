//! HTTP API
//!
//! Every shopper session gets its own [`Marketplace`]. Mutating routes create
//! it on first use; reads of an unknown session answer from an empty one.
//! Sessions idle past `session_idle_timeout` are evicted when a new one is
//! created.

mod error;
mod handlers;

use axum::{routing::{get, post, put}, Json, Router};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::domain::{Catalog, Marketplace};
use crate::payment::{PaymentGateway, SimulatedGateway};

pub use error::ApiError;

pub type SharedMarketplace = Arc<Mutex<Marketplace>>;

/// A shopper's marketplace and when it was last used.
#[derive(Clone, Debug)]
pub struct Session {
    market: SharedMarketplace,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub sessions: Arc<DashMap<String, Session>>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub payment_max_attempts: u32,
    pub session_idle_timeout: Duration,
}

impl AppState {
    pub fn new(catalog: Catalog, gateway: Arc<dyn PaymentGateway>, payment_max_attempts: u32) -> Self {
        Self {
            catalog: Arc::new(catalog),
            sessions: Arc::new(DashMap::new()),
            gateway,
            payment_max_attempts,
            session_idle_timeout: Config::default().session_idle_timeout,
        }
    }

    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout = timeout;
        self
    }

    /// Storefront catalog with the simulated gateway configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Catalog::healprint(), Arc::new(SimulatedGateway::new(config.payment_delay)), config.payment_max_attempts)
            .with_session_idle_timeout(config.session_idle_timeout)
    }

    /// Returns the session's marketplace, creating an empty one on first use.
    ///
    /// Creating a session first sweeps out idle ones.
    pub fn session(&self, id: &str) -> SharedMarketplace {
        let now = Instant::now();
        if let Some(market) = self.touch(id, now) {
            return market;
        }
        self.evict_idle(now);
        let entry = self.sessions.entry(id.to_string()).or_insert_with(|| Session { market: SharedMarketplace::default(), last_seen: now });
        entry.market.clone()
    }

    /// Returns the session's marketplace if it exists. Never creates one.
    pub fn existing_session(&self, id: &str) -> Option<SharedMarketplace> {
        self.touch(id, Instant::now())
    }

    /// Drops sessions idle for longer than the timeout. Sessions with a request in flight are kept.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| {
            now.saturating_duration_since(s.last_seen) < self.session_idle_timeout || Arc::strong_count(&s.market) > 1
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.sessions.len(), "idle sessions evicted");
        }
        evicted
    }

    fn touch(&self, id: &str, now: Instant) -> Option<SharedMarketplace> {
        let mut session = self.sessions.get_mut(id)?;
        session.last_seen = now;
        Some(session.market.clone())
    }
}

pub fn router(state: AppState) -> Router {
    use handlers::*;

    let session = Router::new()
        .route("/", get(get_session))
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/toggle", post(toggle_cart))
        .route("/cart/:product_id", put(update_quantity).delete(remove_from_cart))
        .route("/wishlist", get(get_wishlist))
        .route("/wishlist/:product_id", post(toggle_wishlist))
        .route("/checkout", get(get_checkout).post(open_checkout).delete(close_checkout))
        .route("/checkout/contact", put(set_contact))
        .route("/checkout/shipping", put(set_shipping))
        .route("/checkout/payment", put(set_payment))
        .route("/checkout/next", post(next_step))
        .route("/checkout/back", post(previous_step))
        .route("/checkout/submit", post(submit_order))
        .route("/confirmation", get(get_confirmation).post(show_confirmation).delete(continue_shopping))
        .route("/confirmation/receipt", get(download_receipt))
        .route("/orders", get(list_orders))
        .route("/orders/:order_id", get(get_order));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "healprint-marketplace"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .nest("/api/v1/sessions/:session", session)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(Catalog::healprint(), Arc::new(SimulatedGateway::instant()), 1)
            .with_session_idle_timeout(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_existing_session_does_not_create() {
        let state = state();
        assert!(state.existing_session("nobody").is_none());
        assert!(state.sessions.is_empty());
        let market = state.session("shopper");
        assert!(Arc::ptr_eq(&market, &state.existing_session("shopper").unwrap()));
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted_on_create() {
        let state = state();
        drop(state.session("old"));
        tokio::time::advance(Duration::from_secs(30)).await;
        drop(state.session("recent"));
        tokio::time::advance(Duration::from_secs(45)).await;
        drop(state.session("new"));
        assert!(state.existing_session("old").is_none());
        assert!(state.existing_session("recent").is_some());
        assert_eq!(state.sessions.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_session_is_not_evicted() {
        let state = state();
        let held = state.session("busy");
        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(state.evict_idle(Instant::now()), 0);
        drop(held);
        assert_eq!(state.evict_idle(Instant::now()), 1);
        assert!(state.sessions.is_empty());
    }
}

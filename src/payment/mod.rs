//! Payment gateway boundary
//!
//! Checkout hands a [`PaymentRequest`] to a [`PaymentGateway`] and only builds
//! an order once the gateway approves. The shipped [`SimulatedGateway`] waits a
//! fixed delay and approves everything; a real processor plugs in behind the
//! same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::PaymentMethod;
use crate::domain::value_objects::{Money, OrderId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub email: String,
    /// Last four digits for card payments.
    pub card_last4: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub reference: String,
    pub authorized_at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment declined: {reason}")]
    Declined { reason: String },

    #[error("Payment gateway error: {message}")]
    Gateway { message: String, retryable: bool },
}

impl PaymentError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Gateway { retryable: true, .. })
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError>;
}

/// Approves every request after `delay`.
#[derive(Clone, Debug)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self { Self { delay } }
    pub fn instant() -> Self { Self::new(Duration::ZERO) }
}

impl Default for SimulatedGateway {
    fn default() -> Self { Self::new(Duration::from_millis(2000)) }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reference = format!("SIM-{}", Uuid::new_v4().simple());
        tracing::debug!(order_id = %request.order_id, amount = %request.amount, %reference, "simulated payment approved");
        Ok(PaymentReceipt { reference, authorized_at: Utc::now() })
    }
}

/// Calls the gateway, retrying transient failures until `max_attempts` calls have been made.
pub async fn authorize_with_retry(
    gateway: &dyn PaymentGateway,
    request: &PaymentRequest,
    max_attempts: u32,
) -> Result<PaymentReceipt, PaymentError> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match gateway.authorize(request).await {
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(order_id = %request.order_id, attempt, error = %e, "retrying payment");
                attempt += 1;
            }
            other => return other,
        }
    }
}

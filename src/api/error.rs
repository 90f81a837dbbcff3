//! HTTP mapping for marketplace errors

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;

use crate::domain::aggregates::{CheckoutError, CheckoutStep, FieldError};
use crate::payment::PaymentError;
use crate::MarketplaceError;

#[derive(Debug)]
pub struct ApiError(pub MarketplaceError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<CheckoutStep>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MarketplaceError::ProductNotFound(_) | MarketplaceError::OrderNotFound(_) | MarketplaceError::NoCurrentOrder => StatusCode::NOT_FOUND,
            MarketplaceError::CheckoutNotOpen => StatusCode::CONFLICT,
            MarketplaceError::Checkout(e) => match e {
                CheckoutError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::EmptyCart | CheckoutError::InvalidTransition { .. } => StatusCode::CONFLICT,
                CheckoutError::Payment(PaymentError::Declined { .. }) => StatusCode::PAYMENT_REQUIRED,
                CheckoutError::Payment(PaymentError::Gateway { .. }) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl<E: Into<MarketplaceError>> From<E> for ApiError {
    fn from(e: E) -> Self { ApiError(e.into()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (step, fields) = match &self.0 {
            MarketplaceError::Checkout(CheckoutError::Validation { step, fields }) => (Some(*step), fields.clone()),
            _ => (None, Vec::new()),
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(ErrorBody { error: self.0.to_string(), step, fields })).into_response()
    }
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for the JSON cart API. All route
//! handlers should return `Result<T, AppError>`. Cart failures have already
//! been logged and signalled by the store; this layer only maps them to a
//! status code and the shopper-facing message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::cart::{CartError, CartFailure};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A cart operation was rejected or failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartFailure),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl AppError {
    /// Status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Cart(failure) => match failure.error {
                CartError::ProductNotFound(_) | CartError::ProductNotInCart(_) => {
                    StatusCode::NOT_FOUND
                }
                CartError::OutOfStock(_) | CartError::InsufficientStock { .. } => {
                    StatusCode::CONFLICT
                }
                CartError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                CartError::Api(_) => StatusCode::BAD_GATEWAY,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Cart failures were already logged and captured by the store
        let message = match &self {
            Self::Cart(failure) => failure.user_message().to_string(),
            Self::BadRequest(msg) => msg.clone(),
        };

        (status, Json(ErrorBody { error: &message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "add product", Some(&[("product_id", "42")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use rocketshoes_core::ProductId;

    use super::*;
    use crate::cart::CartOperation;

    fn cart_error(operation: CartOperation, error: CartError) -> AppError {
        AppError::Cart(CartFailure { operation, error })
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_cart_error_status_codes() {
        let id = ProductId::new(1);

        assert_eq!(
            cart_error(CartOperation::Remove, CartError::ProductNotInCart(id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            cart_error(CartOperation::Add, CartError::OutOfStock(id)).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            cart_error(
                CartOperation::UpdateAmount,
                CartError::InsufficientStock {
                    id,
                    requested: 6,
                    available: 5
                }
            )
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            cart_error(CartOperation::Add, CartError::Timeout).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::BadRequest("missing product_id".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}

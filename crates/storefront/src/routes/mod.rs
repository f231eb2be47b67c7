//! HTTP route handlers for the storefront cart API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check (registered in main)
//!
//! # Cart (JSON)
//! GET  /cart                   - Current cart
//! POST /cart/add               - {"product_id": 42}
//! POST /cart/update            - {"product_id": 42, "amount": 3}
//! POST /cart/remove            - {"product_id": 42}
//! ```
//!
//! Mutations answer with the cart after the change, or with
//! `{"error": "<message>"}` when the change was not applied.

pub mod cart;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the cart router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/cart/update", post(cart::update))
        .route("/cart/remove", post(cart::remove))
}

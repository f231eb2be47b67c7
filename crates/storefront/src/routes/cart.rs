//! Cart route handlers.
//!
//! Thin JSON wrappers over [`CartStore`](crate::cart::CartStore): parse the
//! request, run the operation, answer with the resulting cart.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rocketshoes_core::{CartEntry, Price, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::Cart;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Cart item display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub amount: u32,
    pub price: Price,
    pub price_formatted: String,
    pub line_total: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
}

impl From<&CartEntry> for CartItemView {
    fn from(entry: &CartEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            image: entry.image.clone(),
            amount: entry.amount,
            price: entry.price,
            price_formatted: entry.price.display(),
            line_total: entry.line_total().display(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.entries().iter().map(CartItemView::from).collect(),
            subtotal: cart.subtotal().display(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

/// Update amount request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn current(state: &AppState) -> Json<CartView> {
    Json(CartView::from(&state.cart().cart()))
}

/// Current cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    current(&state)
}

/// Add one unit of a product.
#[instrument(skip(state, payload))]
pub async fn add(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<Json<CartView>> {
    let request = body(payload)?;
    state.cart().add_product(request.product_id).await?;
    Ok(current(&state))
}

/// Set a product's amount.
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdateCartRequest>, JsonRejection>,
) -> Result<Json<CartView>> {
    let request = body(payload)?;
    state
        .cart()
        .update_product_amount(request.product_id, request.amount)
        .await?;
    Ok(current(&state))
}

/// Remove a product.
#[instrument(skip(state, payload))]
pub async fn remove(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RemoveFromCartRequest>, JsonRejection>,
) -> Result<Json<CartView>> {
    let request = body(payload)?;
    state.cart().remove_product(request.product_id).await?;
    Ok(current(&state))
}

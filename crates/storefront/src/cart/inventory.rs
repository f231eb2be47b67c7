//! Read-side access to stock and catalog data.

use std::future::Future;

use rocketshoes_core::{CatalogProduct, ProductId, StockRecord};

use crate::api::ApiError;

/// Stock and catalog lookups the cart depends on.
///
/// `Ok(None)` means the backend has no record for the product. Transport and
/// decoding failures are `Err`.
pub trait Inventory: Send + Sync {
    /// Units currently available for `id`.
    fn stock(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<StockRecord>, ApiError>> + Send;

    /// Title, price and image for `id`.
    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<CatalogProduct>, ApiError>> + Send;
}

//! Cache types for catalog responses.
//!
//! Only catalog metadata is cached. Stock is always read live.

use std::sync::Arc;

use rocketshoes_core::{CatalogProduct, ProductId};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<CatalogProduct>),
    Products(Arc<[CatalogProduct]>),
}

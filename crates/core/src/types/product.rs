//! Catalog, stock and cart entry records.
//!
//! These mirror the JSON shapes served by the storefront backend
//! (`/products`, `/stock`) and the entries persisted for a shopper's cart.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// Product metadata from the catalog (`GET /products/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    /// Product image URL.
    pub image: String,
}

/// Units available for a product (`GET /stock/{id}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: ProductId,
    pub amount: u32,
}

impl StockRecord {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.amount > 0
    }

    /// Whether `requested` units can be served from this record.
    #[must_use]
    pub const fn covers(&self, requested: u32) -> bool {
        requested <= self.amount
    }
}

/// A product selected by the shopper, with the chosen quantity.
///
/// `amount` is always at least 1; an entry that would drop to zero is
/// removed from the cart instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    pub amount: u32,
}

impl CartEntry {
    /// A fresh single-unit entry for a catalog product.
    #[must_use]
    pub fn from_product(product: CatalogProduct) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount: 1,
        }
    }

    /// Same entry with a different quantity; every other field is kept.
    #[must_use]
    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    /// Price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.amount
    }
}

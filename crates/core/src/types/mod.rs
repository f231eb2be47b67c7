//! Core types for Rocketshoes.
//!
//! This module provides type-safe wrappers for the cart's domain concepts.

pub mod id;
pub mod price;
pub mod product;

pub use id::*;
pub use price::{Price, PriceError};
pub use product::{CartEntry, CatalogProduct, StockRecord};

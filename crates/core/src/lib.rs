//! Rocketshoes Core - Shared types library.
//!
//! This crate provides the domain types used across all Rocketshoes components:
//! - `storefront` - Cart store, stock/catalog client and the JSON cart API
//! - `cli` - Command-line driver for the same cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, cart entries and stock records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

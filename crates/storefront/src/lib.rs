//! Rocketshoes Storefront library.
//!
//! This crate provides the shopper's cart as a library, allowing it to be
//! tested and reused by the HTTP binary and the CLI.
//!
//! # Modules
//!
//! - [`cart`] - `CartStore`, persistence and user notifications
//! - [`api`] - Stock/catalog backend client
//! - [`routes`] - JSON cart API
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

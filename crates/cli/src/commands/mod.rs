//! CLI command implementations.
//!
//! # Environment Variables
//!
//! Commands read the same variables as the storefront (see
//! `rocketshoes_storefront::config`). `CART_API_URL` is required; the cart
//! file lives under `CART_STORAGE_DIR`.

pub mod cart;
pub mod stock;

use rocketshoes_storefront::api::{ApiClient, ApiError};
use rocketshoes_storefront::cart::CartFailure;
use rocketshoes_storefront::config::{ConfigError, StorefrontConfig};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The stock/catalog backend could not be reached.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A cart operation was rejected.
    #[error("{0}")]
    Cart(#[from] CartFailure),
}

/// Load configuration and build the backend client.
fn connect() -> Result<(StorefrontConfig, ApiClient), CliError> {
    let config = StorefrontConfig::from_env()?;
    let api = ApiClient::new(&config.api)?;
    Ok((config, api))
}

//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::{CartOptions, CartStore, FileStorage, TracingNotifier};
use crate::config::StorefrontConfig;

/// The cart as wired up for the storefront binary and CLI.
pub type StorefrontCart = CartStore<ApiClient, FileStorage, TracingNotifier>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the cart and the backend client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    api: ApiClient,
    cart: StorefrontCart,
}

impl AppState {
    /// Create a new application state, hydrating the cart from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub async fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let cart = open_cart(config, api.clone()).await;

        Ok(Self {
            inner: Arc::new(AppStateInner { api, cart }),
        })
    }

    /// Get a reference to the stock/catalog client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the shopper's cart.
    #[must_use]
    pub fn cart(&self) -> &StorefrontCart {
        &self.inner.cart
    }
}

/// Hydrate the file-backed cart described by `config`.
pub async fn open_cart(config: &StorefrontConfig, api: ApiClient) -> StorefrontCart {
    let options = CartOptions {
        storage_key: config.storage.key.clone(),
        lookup_timeout: config.api.request_timeout,
    };

    CartStore::hydrate(
        api,
        FileStorage::new(&config.storage.dir),
        TracingNotifier,
        options,
    )
    .await
}

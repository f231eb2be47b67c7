//! Integration tests for Rocketshoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! The stock/catalog backend is played by a local `mockito` server, so the
//! tests need no running services.
//!
//! # Test Categories
//!
//! - `cart_flow` - Add/update/remove sequences against the backend
//! - `cart_persistence` - Reloading a saved cart from disk

use std::path::Path;

use mockito::{Mock, Server, ServerGuard};
use rocketshoes_core::ProductId;
use rocketshoes_storefront::api::ApiClient;
use rocketshoes_storefront::config::{
    CartApiConfig, DEFAULT_STORAGE_KEY, StorageConfig, StorefrontConfig,
};
use url::Url;

/// A stand-in for the stock/catalog backend.
pub struct MockBackend {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl MockBackend {
    /// Start an empty backend. Unmocked paths answer 501.
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
            mocks: Vec::new(),
        }
    }

    /// Serve `GET /stock/{id}` with the given amount.
    pub async fn stock(&mut self, id: i32, amount: u32) -> &mut Self {
        let mock = self
            .server
            .mock("GET", format!("/stock/{id}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"id":{id},"amount":{amount}}}"#))
            .create_async()
            .await;
        self.mocks.push(mock);
        self
    }

    /// Serve `GET /products/{id}` with the given title and price.
    pub async fn product(&mut self, id: i32, title: &str, price: f64) -> &mut Self {
        let body = serde_json::json!({
            "id": id,
            "title": title,
            "price": price,
            "image": format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"),
        });
        let mock = self
            .server
            .mock("GET", format!("/products/{id}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;
        self.mocks.push(mock);
        self
    }

    /// Answer 404 for both stock and catalog lookups of `id`.
    pub async fn missing(&mut self, id: i32) -> &mut Self {
        for path in [format!("/stock/{id}"), format!("/products/{id}")] {
            let mock = self
                .server
                .mock("GET", path.as_str())
                .with_status(404)
                .with_body("{}")
                .create_async()
                .await;
            self.mocks.push(mock);
        }
        self
    }

    /// Client settings pointing at this backend.
    #[must_use]
    pub fn api_config(&self) -> CartApiConfig {
        CartApiConfig::new(Url::parse(&self.server.url()).expect("mockito URL is valid"))
    }

    /// A client pointing at this backend.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).expect("Failed to build API client")
    }

    /// Full storefront configuration with the cart stored under `dir`.
    #[must_use]
    pub fn storefront_config(&self, dir: &Path) -> StorefrontConfig {
        StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 3333,
            api: self.api_config(),
            storage: StorageConfig {
                dir: dir.to_path_buf(),
                key: DEFAULT_STORAGE_KEY.to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

/// Product IDs of a cart's entries, in order.
#[must_use]
pub fn ids(entries: &[rocketshoes_core::CartEntry]) -> Vec<ProductId> {
    entries.iter().map(|entry| entry.id).collect()
}

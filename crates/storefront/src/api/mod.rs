//! Stock and catalog API client.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`, one request per lookup
//! - The backend is source of truth for stock - stock is NEVER cached
//! - Catalog metadata (title, price, image) is cached with `moka`
//!   (TTL from `CART_CATALOG_CACHE_TTL_SECS`, default 5 minutes)
//!
//! # Endpoints
//!
//! ```text
//! GET /stock/{id}     -> { id, amount }
//! GET /stock          -> [{ id, amount }]
//! GET /products/{id}  -> { id, title, price, image }
//! GET /products       -> [{ id, title, price, image }]
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! client.prefetch_catalog().await?;
//!
//! if let Some(stock) = client.stock(ProductId::new(42)).await? {
//!     println!("{} units left", stock.amount);
//! }
//! ```

mod cache;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rocketshoes_core::{CatalogProduct, ProductId, StockRecord};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::cart::Inventory;
use crate::config::CartApiConfig;

use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the stock/catalog backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint path could not be resolved against the base URL.
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    /// The configured token cannot be sent as a header.
    #[error("invalid API token format: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
}

impl ApiError {
    /// Whether repeating the request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Parse(_) | Self::Url(_) | Self::InvalidToken(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront stock/catalog backend.
///
/// Cheap to clone; clones share the HTTP connection pool and catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CartApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        let cache = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: with_trailing_slash(config.base_url.clone()),
                cache,
            }),
        })
    }

    /// GET a JSON document. A 404 is an absent record, not an error.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(path, "Record not found");
            return Ok(None);
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map(Some).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Stock Methods
    // =========================================================================

    /// Get the stock record for a product, or `None` if the backend has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn stock(&self, id: ProductId) -> Result<Option<StockRecord>, ApiError> {
        self.get_json(&format!("stock/{id}")).await
    }

    /// Get every stock record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn stock_list(&self) -> Result<Vec<StockRecord>, ApiError> {
        Ok(self.get_json("stock").await?.unwrap_or_default())
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get catalog metadata for a product, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Option<CatalogProduct>, ApiError> {
        let key = CacheKey::Product(id);

        if let Some(cache) = &self.inner.cache
            && let Some(CacheValue::Product(product)) = cache.get(&key).await
        {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let product: Option<CatalogProduct> = self.get_json(&format!("products/{id}")).await?;

        if let (Some(cache), Some(product)) = (&self.inner.cache, &product) {
            cache
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }

        Ok(product)
    }

    /// Get the full catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<[CatalogProduct]>, ApiError> {
        if let Some(cache) = &self.inner.cache
            && let Some(CacheValue::Products(products)) = cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Arc<[CatalogProduct]> = self
            .get_json::<Vec<CatalogProduct>>("products")
            .await?
            .unwrap_or_default()
            .into();

        if let Some(cache) = &self.inner.cache {
            cache
                .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
                .await;
        }

        Ok(products)
    }

    /// Warm the catalog cache from `GET /products`.
    ///
    /// Returns the number of products cached. A no-op returning 0 when
    /// caching is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn prefetch_catalog(&self) -> Result<usize, ApiError> {
        let Some(cache) = &self.inner.cache else {
            return Ok(0);
        };

        let products = self.products().await?;
        for product in products.iter() {
            cache
                .insert(
                    CacheKey::Product(product.id),
                    CacheValue::Product(Box::new(product.clone())),
                )
                .await;
        }

        tracing::info!(count = products.len(), "Catalog prefetched");
        Ok(products.len())
    }
}

impl Inventory for ApiClient {
    async fn stock(&self, id: ProductId) -> Result<Option<StockRecord>, ApiError> {
        Self::stock(self, id).await
    }

    async fn product(&self, id: ProductId) -> Result<Option<CatalogProduct>, ApiError> {
        Self::product(self, id).await
    }
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

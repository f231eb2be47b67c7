//! Shopping cart state.
//!
//! [`CartStore`] owns the shopper's cart, validates quantities against live
//! stock, mirrors every committed change into [`CartStorage`] and tells
//! observers about it.
//!
//! # Guarantees
//!
//! - At most one entry per product; every entry has `amount >= 1`.
//! - An amount is only ever set to a value no larger than the stock count
//!   observed during the same operation.
//! - Mutations are serialized: the cart lock is held from the first lookup
//!   until the new cart is committed, so two rapid clicks apply one after
//!   the other instead of both reading the same starting cart.
//! - A failed operation leaves memory and storage untouched and signals
//!   exactly one message through the [`Notifier`].
//!
//! # Example
//!
//! ```rust,ignore
//! let store = CartStore::hydrate(api, FileStorage::new(".rocketshoes"), TracingNotifier, CartOptions::default()).await;
//!
//! store.add_product(ProductId::new(42)).await?;
//! store.update_product_amount(ProductId::new(42), 3).await?;
//! assert_eq!(store.cart().item_count(), 3);
//! ```

mod inventory;
pub mod notify;
pub mod record;
pub mod storage;

pub use inventory::Inventory;
pub use notify::{MessageLog, Notifier, TracingNotifier};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rocketshoes_core::{CartEntry, Price, ProductId, StockRecord};
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::api::ApiError;
use crate::config::DEFAULT_STORAGE_KEY;
use crate::error::add_breadcrumb;

use record::Decoded;

const ADD_FAILED: &str = "Erro na adição do produto";
const REMOVE_FAILED: &str = "Erro na remoção do produto";
const UPDATE_FAILED: &str = "Erro na alteração de quantidade do produto";
const OUT_OF_STOCK: &str = "Quantidade solicitada fora de estoque";

// =============================================================================
// Errors
// =============================================================================

/// Why a cart operation was not applied.
#[derive(Debug, Error)]
pub enum CartError {
    /// The catalog has no such product.
    #[error("product {0} not found in catalog")]
    ProductNotFound(ProductId),

    /// No stock record, or zero units available.
    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    /// Fewer units available than requested.
    #[error("product {id}: requested {requested}, only {available} in stock")]
    InsufficientStock {
        id: ProductId,
        requested: u64,
        available: u32,
    },

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    ProductNotInCart(ProductId),

    /// A stock or catalog lookup did not answer in time.
    #[error("stock/catalog lookup timed out")]
    Timeout,

    /// A stock or catalog lookup failed.
    #[error("stock/catalog lookup failed: {0}")]
    Api(#[source] ApiError),
}

impl From<ApiError> for CartError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout => Self::Timeout,
            other => Self::Api(other),
        }
    }
}

impl CartError {
    /// Whether this is a business-rule rejection rather than a technical failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Timeout | Self::Api(_))
    }

    /// Whether trying the same operation again may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Api(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Message shown to the shopper when `operation` fails with this error.
    #[must_use]
    pub const fn user_message(&self, operation: CartOperation) -> &'static str {
        match self {
            Self::InsufficientStock { .. } => OUT_OF_STOCK,
            _ => operation.failure_message(),
        }
    }
}

/// The mutating operations the cart exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl CartOperation {
    /// Generic message for a failure of this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => ADD_FAILED,
            Self::Remove => REMOVE_FAILED,
            Self::UpdateAmount => UPDATE_FAILED,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add product",
            Self::Remove => "remove product",
            Self::UpdateAmount => "update product amount",
        }
    }
}

impl std::fmt::Display for CartOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed operation, as reported to the caller.
///
/// `operation` is the operation whose message was shown, which differs from
/// the one called when adding an existing product delegates to an update.
#[derive(Debug, Error)]
#[error("{operation} failed: {error}")]
pub struct CartFailure {
    pub operation: CartOperation,
    #[source]
    pub error: CartError,
}

impl CartFailure {
    /// The message that was signalled to the shopper.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        self.error.user_message(self.operation)
    }
}

// =============================================================================
// Cart snapshot
// =============================================================================

/// An ordered, immutable view of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// The entry for `id`, if present.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total units across all entries.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.entries.iter().map(|entry| u64::from(entry.amount)).sum()
    }

    /// Sum of every entry's line total.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.entries.iter().map(CartEntry::line_total).sum()
    }

    fn with_entry(&self, entry: CartEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.push(entry);
        Self { entries }
    }

    fn with_amount(&self, id: ProductId, amount: u32) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|entry| {
                    if entry.id == id {
                        entry.with_amount(amount)
                    } else {
                        entry.clone()
                    }
                })
                .collect(),
        }
    }

    fn without(&self, id: ProductId) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|entry| entry.id != id)
                .cloned()
                .collect(),
        }
    }
}

impl From<Vec<CartEntry>> for Cart {
    fn from(entries: Vec<CartEntry>) -> Self {
        Self { entries }
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// Tunables for a [`CartStore`].
#[derive(Debug, Clone)]
pub struct CartOptions {
    /// Storage key of the persisted cart.
    pub storage_key: String,
    /// Upper bound on each stock or catalog lookup.
    pub lookup_timeout: Duration,
}

impl Default for CartOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            lookup_timeout: Duration::from_secs(10),
        }
    }
}

/// The shopper's cart and the only way to change it.
///
/// Cheap to clone; clones operate on the same cart.
pub struct CartStore<I, S, N> {
    inner: Arc<CartStoreInner<I, S, N>>,
}

impl<I, S, N> Clone for CartStore<I, S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CartStoreInner<I, S, N> {
    inventory: I,
    storage: S,
    notifier: N,
    options: CartOptions,
    /// Held for the whole of every mutating operation.
    cart: Mutex<Cart>,
    updates: watch::Sender<Cart>,
}

impl<I, S, N> CartStore<I, S, N>
where
    I: Inventory,
    S: CartStorage,
    N: Notifier,
{
    /// Create a store, adopting whatever cart `storage` holds.
    ///
    /// Missing, unreadable or malformed data yields an empty cart. Legacy
    /// data is upgraded and written back in the current format.
    #[instrument(skip_all, fields(key = %options.storage_key))]
    pub async fn hydrate(inventory: I, storage: S, notifier: N, options: CartOptions) -> Self {
        let (cart, upgraded) = match storage.load(&options.storage_key).await {
            Ok(Some(raw)) => match record::decode(&raw) {
                Ok(Decoded::Current(entries)) => (Cart::from(entries), false),
                Ok(Decoded::Legacy(entries)) => {
                    info!(entries = entries.len(), "Upgrading legacy cart record");
                    (Cart::from(entries), true)
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cart record");
                    (Cart::default(), false)
                }
            },
            Ok(None) => (Cart::default(), false),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted cart, starting empty");
                (Cart::default(), false)
            }
        };

        debug!(entries = cart.len(), "Cart hydrated");

        let (updates, _) = watch::channel(cart.clone());
        let store = Self {
            inner: Arc::new(CartStoreInner {
                inventory,
                storage,
                notifier,
                options,
                cart: Mutex::new(cart.clone()),
                updates,
            }),
        };

        if upgraded {
            store.persist(&cart).await;
        }
        store
    }

    /// Snapshot of the cart as of the last committed change.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.updates.borrow().clone()
    }

    /// Receive the new cart after every committed change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.updates.subscribe()
    }

    /// Put one more unit of a product in the cart.
    ///
    /// A product already in the cart goes through
    /// [`update_product_amount`](Self::update_product_amount) with its amount
    /// plus one. Otherwise the product must be in the catalog and have stock,
    /// and is appended with amount 1.
    ///
    /// # Errors
    ///
    /// `ProductNotFound` or `OutOfStock` when the product cannot be added,
    /// update errors when an existing entry cannot grow, and lookup failures.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_product(&self, id: ProductId) -> Result<(), CartFailure> {
        let mut cart = self.inner.cart.lock().await;

        if let Some(existing) = cart.get(id) {
            let amount = i64::from(existing.amount) + 1;
            debug!(amount, "Product already in cart, increasing amount");
            return self.update_locked(&mut cart, id, amount).await;
        }

        let result = self.try_add(&mut cart, id).await;
        self.finish(CartOperation::Add, id, result)
    }

    /// Take a product out of the cart. No stock lookup is involved.
    ///
    /// # Errors
    ///
    /// `ProductNotInCart` when there is no entry for `id`.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_product(&self, id: ProductId) -> Result<(), CartFailure> {
        let mut cart = self.inner.cart.lock().await;

        let result = if cart.get(id).is_some() {
            let next = cart.without(id);
            self.commit(&mut cart, next, CartOperation::Remove, id).await;
            Ok(())
        } else {
            Err(CartError::ProductNotInCart(id))
        };

        self.finish(CartOperation::Remove, id, result)
    }

    /// Set the amount of a product already in the cart.
    ///
    /// Amounts of zero or less are ignored without error or write.
    ///
    /// # Errors
    ///
    /// `ProductNotInCart`, `OutOfStock`, `InsufficientStock` or a lookup failure.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_product_amount(
        &self,
        id: ProductId,
        amount: i64,
    ) -> Result<(), CartFailure> {
        let mut cart = self.inner.cart.lock().await;
        self.update_locked(&mut cart, id, amount).await
    }

    async fn update_locked(
        &self,
        cart: &mut Cart,
        id: ProductId,
        amount: i64,
    ) -> Result<(), CartFailure> {
        if amount <= 0 {
            debug!(amount, "Ignoring non-positive amount");
            return Ok(());
        }

        let result = self.try_update(cart, id, amount).await;
        self.finish(CartOperation::UpdateAmount, id, result)
    }

    async fn try_add(&self, cart: &mut Cart, id: ProductId) -> Result<(), CartError> {
        let inventory = &self.inner.inventory;
        let (stock, product) = tokio::join!(
            self.lookup(inventory.stock(id)),
            self.lookup(inventory.product(id)),
        );

        available_stock(id, stock?)?;
        let product = product?.ok_or(CartError::ProductNotFound(id))?;

        let next = cart.with_entry(CartEntry::from_product(product));
        self.commit(cart, next, CartOperation::Add, id).await;
        Ok(())
    }

    async fn try_update(
        &self,
        cart: &mut Cart,
        id: ProductId,
        amount: i64,
    ) -> Result<(), CartError> {
        if cart.get(id).is_none() {
            return Err(CartError::ProductNotInCart(id));
        }

        let stock = available_stock(id, self.lookup(self.inner.inventory.stock(id)).await?)?;

        // Amounts beyond u32 can never be covered by a stock record
        let Some(requested) = u32::try_from(amount)
            .ok()
            .filter(|&requested| stock.covers(requested))
        else {
            return Err(CartError::InsufficientStock {
                id,
                requested: amount.unsigned_abs(),
                available: stock.amount,
            });
        };

        let next = cart.with_amount(id, requested);
        self.commit(cart, next, CartOperation::UpdateAmount, id).await;
        Ok(())
    }

    /// Run a lookup under the configured timeout.
    async fn lookup<T>(
        &self,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, CartError> {
        tokio::time::timeout(self.inner.options.lookup_timeout, request)
            .await
            .map_err(|_| CartError::Timeout)?
            .map_err(CartError::from)
    }

    /// Replace the cart, mirror it to storage and wake observers.
    async fn commit(&self, cart: &mut Cart, next: Cart, operation: CartOperation, id: ProductId) {
        *cart = next;
        self.persist(cart).await;
        self.inner.updates.send_replace(cart.clone());

        let product_id = id.to_string();
        let data = [("product_id", product_id.as_str())];
        add_breadcrumb("cart", operation.as_str(), Some(data.as_slice()));
    }

    /// Best-effort write of the cart. The in-memory cart stays authoritative.
    async fn persist(&self, cart: &Cart) {
        let key = &self.inner.options.storage_key;
        let raw = match record::encode(cart.entries()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode cart");
                return;
            }
        };

        if let Err(e) = self.inner.storage.save(key, &raw).await {
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                error = %e,
                sentry_event_id = %event_id,
                "Failed to persist cart"
            );
        }
    }

    /// Log and signal a failure, then hand it to the caller.
    fn finish(
        &self,
        operation: CartOperation,
        id: ProductId,
        result: Result<(), CartError>,
    ) -> Result<(), CartFailure> {
        let Err(error) = result else {
            return Ok(());
        };

        let failure = CartFailure { operation, error };
        if failure.error.is_rejection() {
            info!(product_id = %id, error = %failure.error, "Cart change rejected");
        } else {
            let event_id = sentry::capture_error(&failure);
            tracing::error!(
                product_id = %id,
                error = %failure.error,
                retryable = failure.error.is_retryable(),
                sentry_event_id = %event_id,
                "Cart change failed"
            );
        }

        self.inner.notifier.error(failure.user_message());
        Err(failure)
    }
}

/// A stock record with at least one unit, or `OutOfStock`.
fn available_stock(id: ProductId, stock: Option<StockRecord>) -> Result<StockRecord, CartError> {
    stock
        .filter(StockRecord::is_available)
        .ok_or(CartError::OutOfStock(id))
}

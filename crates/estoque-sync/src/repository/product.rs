//! # Product Repository
//!
//! Write-through-with-fallback access to the product collection.
//!
//! ## Offline Insert & the Duplicate Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  save(product, is_new = true)                           │
//! │                                                                         │
//! │  ONLINE                          OFFLINE                               │
//! │  ──────                          ───────                               │
//! │  remote INSERT decides           local collection decides:             │
//! │  identity conflicts              code already cached → Duplicate       │
//! │       │                               │                                │
//! │       ▼                               ▼                                │
//! │  cache write (merge if           front-insert + enqueue                │
//! │  the code is already                                                   │
//! │  cached - remote accepted                                              │
//! │  it, so it is an update)                                               │
//! │                                                                         │
//! │  New products go to the FRONT of the collection so fresh codes         │
//! │  surface first in the UI list.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use estoque_core::{validation, CoreError, PendingMutation, Product};
use estoque_store::{CollectionKind, LocalStore};

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::gateway::{Collection, Command, Query, RemoteGateway};
use crate::rows;

/// Repository for product operations.
#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<LocalStore>,
    gateway: Arc<dyn RemoteGateway>,
    engine: Arc<SyncEngine>,
}

impl ProductRepository {
    pub(crate) fn new(
        store: Arc<LocalStore>,
        gateway: Arc<dyn RemoteGateway>,
        engine: Arc<SyncEngine>,
    ) -> Self {
        ProductRepository { store, gateway, engine }
    }

    /// Fetches all products: remote when available (ordered by name), the
    /// local cache otherwise - including when a remote *read* fails, since
    /// stale data beats no data on a read path.
    pub async fn fetch_all(&self) -> SyncResult<Vec<Product>> {
        if self.gateway.is_available() {
            match self
                .gateway
                .query(Collection::Products, Query::order_by("name"))
                .await
            {
                Ok(remote_rows) => {
                    return Ok(remote_rows.iter().filter_map(rows::product_from_row).collect())
                }
                Err(error) => {
                    warn!(error = %error, "Remote product read failed, serving local cache")
                }
            }
        }
        Ok(self.store.read_collection(CollectionKind::Products).await?)
    }

    /// Looks a product up in the local cache by its code.
    pub async fn get_local(&self, id: &str) -> SyncResult<Option<Product>> {
        let products: Vec<Product> = self.store.read_collection(CollectionKind::Products).await?;
        Ok(products.into_iter().find(|p| p.id == id))
    }

    /// Saves a product, write-through with fallback.
    ///
    /// `is_new` selects remote insert vs upsert. While offline, a new
    /// product whose code is already cached fails with
    /// [`CoreError::Duplicate`] and nothing is queued.
    pub async fn save(&self, product: &Product, is_new: bool) -> SyncResult<()> {
        validation::validate_product(product)?;

        if self.gateway.is_available() {
            // remote first: a rejected write must not touch the cache
            self.push_remote(product, is_new).await?;
            self.write_local(product, is_new, true).await?;
            debug!(id = %product.id, is_new, "Product saved remotely");
        } else {
            self.write_local(product, is_new, false).await?;
            self.engine
                .enqueue(PendingMutation::product(product, is_new)?)
                .await?;
            info!(id = %product.id, is_new, "Product saved offline and queued");
        }
        Ok(())
    }

    /// Drain path: remote command only, no validation, no cache write.
    pub(crate) async fn apply_remote(&self, product: &Product, is_new: bool) -> SyncResult<()> {
        self.push_remote(product, is_new).await
    }

    async fn push_remote(&self, product: &Product, is_new: bool) -> SyncResult<()> {
        let row = rows::product_to_row(product);
        let command = if is_new {
            Command::Insert(row)
        } else {
            // upsert merges by identity - safe for replays
            Command::Upsert(row)
        };
        self.gateway.execute(Collection::Products, command).await?;
        Ok(())
    }

    /// Updates the cached collection.
    ///
    /// `remote_confirmed` marks the online path: the remote store accepted
    /// the write, so an already-cached code on an insert is treated as a
    /// merge instead of a duplicate (it can legitimately happen right after
    /// a drain replayed the same product).
    async fn write_local(
        &self,
        product: &Product,
        is_new: bool,
        remote_confirmed: bool,
    ) -> SyncResult<()> {
        let mut products: Vec<Product> = self.store.read_collection(CollectionKind::Products).await?;
        let existing = products.iter().position(|p| p.id == product.id);

        if is_new {
            match existing {
                Some(_) if !remote_confirmed => {
                    return Err(CoreError::Duplicate {
                        id: product.id.clone(),
                    }
                    .into())
                }
                Some(index) => products[index] = product.clone(),
                None => products.insert(0, product.clone()),
            }
        } else if let Some(index) = existing {
            products[index] = product.clone();
        }

        self.store
            .write_collection(CollectionKind::Products, &products)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

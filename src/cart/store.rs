//! Cart Store
//!
//! Owns the live cart for the lifetime of the process. Mutations are applied
//! to memory synchronously and persisted afterwards by a background task, so
//! reads always reflect the latest mutation even while a write is in flight.

use std::{
    fmt, mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{
    cart::{
        CartCollection,
        checkout::{CheckoutError, CheckoutSummary},
        observer::{PersistenceObserver, TracingObserver},
        operations::CartOperation,
    },
    pricing::TotalPriceError,
    products::{Product, ProductId},
    storage::{CartStorage, KeyValueStore},
};

/// Lifecycle of a [`CartStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    /// Created, stored cart not yet requested.
    Uninitialized,

    /// Stored cart is being read. Mutations are queued.
    Loading,

    /// Stored cart restored. Mutations are persisted.
    Ready,
}

/// Result of [`CartStore::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializeOutcome {
    /// The stored cart was restored with this many lines.
    Restored {
        /// Number of restored lines
        lines: usize,
    },

    /// The stored cart could not be read and the cart started empty.
    StartedEmpty,

    /// The store was already initialised; nothing was reloaded.
    AlreadyInitialized,
}

#[derive(Debug)]
enum PendingWrite {
    Save(CartCollection),
    Clear,
}

#[derive(Debug)]
enum PersistCommand {
    Write(PendingWrite),
    Flush(oneshot::Sender<()>),
}

#[derive(Debug)]
struct Inner {
    state: CartState,
    cart: CartCollection,
    queued: Vec<CartOperation>,
}

/// Cart State Store
///
/// Construct one per process and hand it to consumers by reference. Mutations
/// issued before [`CartStore::initialize`] finishes are applied to memory and
/// queued; once the stored cart is loaded they are replayed on top of it, so a
/// shopper's first tap is never lost and never overwritten by the load.
pub struct CartStore {
    inner: Mutex<Inner>,
    storage: CartStorage,
    observer: Arc<dyn PersistenceObserver>,
    persist: mpsc::UnboundedSender<PersistCommand>,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("inner", &self.lock())
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store persisting through `store`, reporting through `tracing`.
    ///
    /// Must be called from within a tokio runtime: the persistence task is
    /// spawned here.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_observer(store, Arc::new(TracingObserver))
    }

    /// Create a store with a custom persistence observer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_observer(
        store: Arc<dyn KeyValueStore>,
        observer: Arc<dyn PersistenceObserver>,
    ) -> Self {
        let storage = CartStorage::new(store);
        let (persist, commands) = mpsc::unbounded_channel();

        tokio::spawn(run_persistence(
            storage.clone(),
            Arc::clone(&observer),
            commands,
        ));

        Self {
            inner: Mutex::new(Inner {
                state: CartState::Uninitialized,
                cart: CartCollection::new(),
                queued: Vec::new(),
            }),
            storage,
            observer,
            persist,
        }
    }

    /// Load the stored cart and start accepting persisted mutations.
    ///
    /// A failed load is reported to the observer and yields an empty cart; it
    /// is never returned as an error. Calling this again is a reported no-op.
    #[tracing::instrument(name = "cart.store.initialize", skip(self))]
    pub async fn initialize(&self) -> InitializeOutcome {
        {
            let mut inner = self.lock();

            if inner.state != CartState::Uninitialized {
                warn!(state = ?inner.state, "cart store already initialised; ignoring");

                return InitializeOutcome::AlreadyInitialized;
            }

            inner.state = CartState::Loading;
        }

        let (base, outcome) = match self.storage.load().await {
            Ok(cart) => {
                self.observer.on_loaded(cart.len());

                let lines = cart.len();

                (cart, InitializeOutcome::Restored { lines })
            }
            Err(error) => {
                self.observer.on_load_failed(&error);

                (CartCollection::new(), InitializeOutcome::StartedEmpty)
            }
        };

        let mut inner = self.lock();
        let queued = mem::take(&mut inner.queued);

        inner.cart = queued.iter().fold(base, |cart, op| op.apply(&cart));
        inner.state = CartState::Ready;

        if !queued.is_empty() {
            info!(replayed = queued.len(), "replayed cart mutations queued during load");

            let write = if inner.cart.is_empty() {
                PendingWrite::Clear
            } else {
                PendingWrite::Save(inner.cart.clone())
            };

            self.schedule(write);
        }

        outcome
    }

    /// Apply an operation to the cart and schedule it to be persisted.
    ///
    /// The new cart is visible to readers as soon as this returns.
    pub fn mutate(&self, operation: CartOperation) {
        let mut inner = self.lock();

        if let CartOperation::AddItem(product) = &operation
            && !inner.cart.contains(product.id)
            && let Err(error) = product.validate()
        {
            warn!(product_id = %product.id, %error, "refusing to add invalid product");

            return;
        }

        inner.cart = operation.apply(&inner.cart);

        debug!(
            operation = operation.name(),
            lines = inner.cart.len(),
            items = inner.cart.item_count(),
            "applied cart operation"
        );

        if inner.state == CartState::Ready {
            let write = match operation {
                CartOperation::Clear => PendingWrite::Clear,
                _ => PendingWrite::Save(inner.cart.clone()),
            };

            self.schedule(write);
        } else {
            inner.queued.push(operation);
        }
    }

    /// Add one unit of `product`.
    pub fn add_to_cart(&self, product: Product) {
        self.mutate(CartOperation::AddItem(product));
    }

    /// Set the quantity of a line; zero or less removes it.
    pub fn set_quantity(&self, id: ProductId, quantity: i64) {
        self.mutate(CartOperation::SetQuantity(id, quantity));
    }

    /// Remove the line for a product.
    pub fn remove_from_cart(&self, id: ProductId) {
        self.mutate(CartOperation::RemoveItem(id));
    }

    /// Remove every line.
    pub fn clear_cart(&self) {
        self.mutate(CartOperation::Clear);
    }

    /// Snapshot of the current cart.
    pub fn items(&self) -> CartCollection {
        self.lock().cart.clone()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lock().cart.item_count()
    }

    /// Sum of `price * quantity` over all lines.
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError::Overflow`] if the total is not representable.
    pub fn total(&self) -> Result<Decimal, TotalPriceError> {
        self.lock().cart.total()
    }

    /// Quantity of a product in the cart, if present.
    pub fn quantity_of(&self, id: ProductId) -> Option<u32> {
        self.lock()
            .cart
            .get(id)
            .map(|item| item.quantity().get())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CartState {
        self.lock().state
    }

    /// Summarise the cart for checkout without clearing it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] if the cart is empty or its total overflows.
    pub fn checkout(&self) -> Result<CheckoutSummary, CheckoutError> {
        let summary = CheckoutSummary::from_cart(&self.lock().cart)?;

        info!(
            items = summary.item_count(),
            total = %summary.total(),
            "checked out cart"
        );

        Ok(summary)
    }

    /// Wait until every write scheduled so far has completed or failed.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();

        if self.persist.send(PersistCommand::Flush(ack)).is_err() {
            return;
        }

        _ = done.await;
    }

    fn schedule(&self, write: PendingWrite) {
        if self.persist.send(PersistCommand::Write(write)).is_err() {
            warn!("cart persistence task has stopped; change kept in memory only");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drains persistence commands, collapsing writes that queued up behind a
/// slow one so only the latest cart is written.
async fn run_persistence(
    storage: CartStorage,
    observer: Arc<dyn PersistenceObserver>,
    mut commands: mpsc::UnboundedReceiver<PersistCommand>,
) {
    while let Some(command) = commands.recv().await {
        let mut latest = None;
        let mut next = Some(command);

        while let Some(command) = next {
            match command {
                PersistCommand::Write(write) => latest = Some(write),
                PersistCommand::Flush(ack) => {
                    if let Some(write) = latest.take() {
                        execute(&storage, observer.as_ref(), write).await;
                    }

                    _ = ack.send(());
                }
            }

            next = commands.try_recv().ok();
        }

        if let Some(write) = latest {
            execute(&storage, observer.as_ref(), write).await;
        }
    }

    debug!("cart persistence task stopped");
}

async fn execute(storage: &CartStorage, observer: &dyn PersistenceObserver, write: PendingWrite) {
    match write {
        PendingWrite::Save(cart) => match storage.save(&cart).await {
            Ok(()) => observer.on_saved(cart.len()),
            Err(error) => observer.on_save_failed(&error),
        },
        PendingWrite::Clear => match storage.clear().await {
            Ok(()) => observer.on_cleared(),
            Err(error) => observer.on_clear_failed(&error),
        },
    }
}

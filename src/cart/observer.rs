//! Persistence Observer

use tracing::{debug, info, warn};

use crate::storage::CartStorageError;

/// Observer for the outcome of cart persistence.
///
/// Persistence never reports failures back to the code that mutated the cart:
/// the in-memory cart stays authoritative and failures are surfaced here
/// instead. Success callbacks default to doing nothing.
pub trait PersistenceObserver: Send + Sync {
    /// Called when the stored cart was loaded at initialisation.
    fn on_loaded(&self, _lines: usize) {}

    /// Called when loading failed and the cart started empty.
    fn on_load_failed(&self, error: &CartStorageError);

    /// Called after a cart write completed.
    fn on_saved(&self, _lines: usize) {}

    /// Called when a cart write failed.
    fn on_save_failed(&self, error: &CartStorageError);

    /// Called after the stored cart was removed.
    fn on_cleared(&self) {}

    /// Called when removing the stored cart failed.
    fn on_clear_failed(&self, error: &CartStorageError);
}

/// Observer that reports persistence outcomes through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PersistenceObserver for TracingObserver {
    fn on_loaded(&self, lines: usize) {
        info!(lines, "restored cart from storage");
    }

    fn on_load_failed(&self, error: &CartStorageError) {
        warn!(%error, "failed to load cart from storage; starting with an empty cart");
    }

    fn on_saved(&self, lines: usize) {
        debug!(lines, "persisted cart");
    }

    fn on_save_failed(&self, error: &CartStorageError) {
        warn!(%error, "failed to save cart to storage");
    }

    fn on_cleared(&self) {
        debug!("cleared stored cart");
    }

    fn on_clear_failed(&self, error: &CartStorageError) {
        warn!(%error, "failed to clear stored cart");
    }
}

/// Observer that ignores every outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PersistenceObserver for NoopObserver {
    fn on_load_failed(&self, _error: &CartStorageError) {}

    fn on_save_failed(&self, _error: &CartStorageError) {}

    fn on_clear_failed(&self, _error: &CartStorageError) {}
}

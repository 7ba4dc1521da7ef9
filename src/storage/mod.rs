//! Storage
//!
//! The durable key-value primitive the cart persists through, plus its
//! in-memory and file-backed implementations.

use std::io;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

pub mod cart;
pub mod file;
pub mod memory;
pub mod records;

pub use cart::{CART_KEY, CartStorage, CartStorageError};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a key-value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),

    /// Key cannot be mapped onto the backend
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Backend-specific failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Durable string key-value store.
#[automock]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

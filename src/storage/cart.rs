//! Cart Storage
//!
//! Translates a [`CartCollection`] to and from a single JSON blob stored under
//! [`CART_KEY`].

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::{CartCollection, CartError, CartLineItem},
    storage::{
        KeyValueStore, StorageError,
        records::{
            CURRENT_VERSION, CartEnvelope, EnvelopeHeader, LEGACY_VERSION, LineItemRecord,
            RecordError,
        },
    },
};

/// Key the whole cart blob is stored under.
pub const CART_KEY: &str = "cart";

/// Errors loading or saving the cart blob.
#[derive(Debug, Error)]
pub enum CartStorageError {
    /// The key-value backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The stored blob is not valid JSON or does not match the record layout.
    #[error("failed to decode stored cart: {0}")]
    Decode(#[source] serde_json::Error),

    /// The cart could not be encoded.
    #[error("failed to encode cart: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored envelope has a version this build cannot read.
    #[error("unsupported cart schema version {0}")]
    UnsupportedVersion(u32),

    /// A stored line item failed the structural checks.
    #[error("invalid line item at index {index}: {source}")]
    InvalidItem {
        /// Position of the offending line in the stored list
        index: usize,

        /// Why the line was rejected
        #[source]
        source: RecordError,
    },

    /// The stored lines break the one-line-per-product rule.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Durable store adapter for the cart.
#[derive(Clone)]
pub struct CartStorage {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CartStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStorage")
            .field("key", &CART_KEY)
            .finish_non_exhaustive()
    }
}

impl CartStorage {
    /// Wrap a key-value backend.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Encode the full collection and write it under [`CART_KEY`].
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    pub async fn save(&self, cart: &CartCollection) -> Result<(), CartStorageError> {
        let blob = encode(cart)?;

        self.store.set(CART_KEY, &blob).await?;

        debug!(lines = cart.len(), bytes = blob.len(), "saved cart");

        Ok(())
    }

    /// Read and decode the stored cart. A missing key is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails or if the blob, or any line
    /// in it, is invalid. No partial recovery is attempted.
    pub async fn load(&self) -> Result<CartCollection, CartStorageError> {
        let Some(blob) = self.store.get(CART_KEY).await? else {
            debug!("no stored cart");

            return Ok(CartCollection::new());
        };

        decode(&blob)
    }

    /// Remove the stored cart entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    pub async fn clear(&self) -> Result<(), CartStorageError> {
        self.store.remove(CART_KEY).await?;

        debug!("removed stored cart");

        Ok(())
    }
}

/// Encode a cart as the current versioned envelope.
///
/// # Errors
///
/// Returns [`CartStorageError::Encode`] if serialization fails.
pub fn encode(cart: &CartCollection) -> Result<String, CartStorageError> {
    let envelope = CartEnvelope {
        version: CURRENT_VERSION,
        items: cart.iter().map(LineItemRecord::from).collect(),
    };

    serde_json::to_string(&envelope).map_err(CartStorageError::Encode)
}

/// Decode a stored blob, migrating older layouts to the current one.
///
/// Objects are read as versioned envelopes; anything else is read as the
/// legacy unversioned list of line items.
///
/// # Errors
///
/// Returns an error if the blob is malformed, has an unknown version or
/// contains an invalid line.
pub fn decode(blob: &str) -> Result<CartCollection, CartStorageError> {
    let value: Value = serde_json::from_str(blob).map_err(CartStorageError::Decode)?;

    let (version, records) = if value.is_object() {
        let header: EnvelopeHeader =
            serde_json::from_value(value.clone()).map_err(CartStorageError::Decode)?;

        if header.version != CURRENT_VERSION {
            return Err(CartStorageError::UnsupportedVersion(header.version));
        }

        let envelope: CartEnvelope =
            serde_json::from_value(value).map_err(CartStorageError::Decode)?;

        (envelope.version, envelope.items)
    } else {
        let records: Vec<LineItemRecord> =
            serde_json::from_value(value).map_err(CartStorageError::Decode)?;

        (LEGACY_VERSION, records)
    };

    let items = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            CartLineItem::try_from(record)
                .map_err(|source| CartStorageError::InvalidItem { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if version == LEGACY_VERSION {
        debug!(lines = items.len(), "migrated legacy cart blob");
    }

    Ok(CartCollection::try_from(items)?)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        cart::operations::CartOperation,
        fixtures::product,
        products::ProductId,
        storage::{MemoryStore, MockKeyValueStore},
    };

    use super::*;

    fn sample_cart() -> CartCollection {
        [
            CartOperation::AddItem(product(1, Decimal::new(1099, 2))),
            CartOperation::AddItem(product(2, Decimal::from(5))),
            CartOperation::AddItem(product(1, Decimal::new(1099, 2))),
        ]
        .iter()
        .fold(CartCollection::new(), |cart, op| op.apply(&cart))
    }

    const LEGACY_BLOB: &str = r#"[
        {
            "id": 4,
            "title": "Mens Casual Slim Fit",
            "price": 15.99,
            "description": "The color could be slightly different",
            "category": "men's clothing",
            "image": "https://example.com/4.jpg",
            "rating": { "rate": 2.1, "count": 430 },
            "quantity": 3
        }
    ]"#;

    #[tokio::test]
    async fn save_then_load_restores_cart() -> TestResult {
        let store = MemoryStore::new();
        let storage = CartStorage::new(Arc::new(store.clone()));
        let cart = sample_cart();

        storage.save(&cart).await?;

        assert_eq!(storage.load().await?, cart);

        Ok(())
    }

    #[tokio::test]
    async fn save_writes_versioned_envelope() -> TestResult {
        let store = MemoryStore::new();
        let storage = CartStorage::new(Arc::new(store.clone()));

        storage.save(&sample_cart()).await?;

        let blob = store.value(CART_KEY).ok_or("nothing stored")?;
        let value: Value = serde_json::from_str(&blob)?;

        assert_eq!(value["version"], 1);
        assert_eq!(value["items"][0]["id"], 1);
        assert_eq!(value["items"][0]["quantity"], 2);
        assert_eq!(value["items"][1]["rating"]["rate"], 4.5);

        Ok(())
    }

    #[tokio::test]
    async fn load_missing_key_is_empty_cart() -> TestResult {
        let storage = CartStorage::new(Arc::new(MemoryStore::new()));

        assert!(storage.load().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_key() -> TestResult {
        let store = MemoryStore::new();
        let storage = CartStorage::new(Arc::new(store.clone()));

        storage.save(&sample_cart()).await?;
        storage.clear().await?;

        assert_eq!(store.value(CART_KEY), None);

        Ok(())
    }

    #[tokio::test]
    async fn load_surfaces_backend_errors() {
        let mut store = MockKeyValueStore::new();

        store
            .expect_get()
            .returning(|_| Err(StorageError::Backend("disk on fire".to_string())));

        let storage = CartStorage::new(Arc::new(store));

        let result = storage.load().await;

        assert!(
            matches!(result, Err(CartStorageError::Storage(_))),
            "expected Storage error, got {result:?}"
        );
    }

    #[test]
    fn decode_migrates_legacy_array() -> TestResult {
        let cart = decode(LEGACY_BLOB)?;

        let line = cart.get(ProductId::new(4)).ok_or("missing legacy line")?;

        assert_eq!(line.quantity().get(), 3);
        assert_eq!(line.product().price, Decimal::new(1599, 2));
        assert_eq!(line.product().rating.count, 430);

        Ok(())
    }

    #[test]
    fn decode_rejects_unparseable_blob() {
        assert!(matches!(
            decode("{not json"),
            Err(CartStorageError::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_unknown_version() {
        assert!(matches!(
            decode(r#"{"version": 7, "items": []}"#),
            Err(CartStorageError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn decode_rejects_missing_field() {
        let blob = r#"[{ "id": 1, "title": "No price", "image": "", "description": "",
            "category": "", "rating": { "rate": 1, "count": 1 }, "quantity": 1 }]"#;

        assert!(matches!(decode(blob), Err(CartStorageError::Decode(_))));
    }

    #[test]
    fn decode_rejects_wrong_field_type() {
        let blob = LEGACY_BLOB.replace(r#""quantity": 3"#, r#""quantity": "3""#);

        assert!(matches!(decode(&blob), Err(CartStorageError::Decode(_))));
    }

    #[test]
    fn decode_rejects_fractional_quantity() {
        let blob = LEGACY_BLOB.replace(r#""quantity": 3"#, r#""quantity": 1.5"#);

        assert!(matches!(decode(&blob), Err(CartStorageError::Decode(_))));
    }

    #[test]
    fn decode_rejects_whole_cart_for_one_bad_line() -> TestResult {
        let mut envelope: Value = serde_json::from_str(&encode(&sample_cart())?)?;

        envelope["items"][1]["quantity"] = Value::from(0);

        let result = decode(&envelope.to_string());

        assert!(
            matches!(
                result,
                Err(CartStorageError::InvalidItem {
                    index: 1,
                    source: RecordError::ZeroQuantity
                })
            ),
            "expected InvalidItem at index 1, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn decode_rejects_duplicate_lines() -> TestResult {
        let duplicated = format!(
            "[{},{}]",
            LEGACY_BLOB.trim().trim_start_matches('[').trim_end_matches(']'),
            LEGACY_BLOB.trim().trim_start_matches('[').trim_end_matches(']')
        );

        let result = decode(&duplicated);

        assert!(
            matches!(
                result,
                Err(CartStorageError::Cart(CartError::DuplicateItem(id))) if id == ProductId::new(4)
            ),
            "expected DuplicateItem, got {result:?}"
        );

        Ok(())
    }
}

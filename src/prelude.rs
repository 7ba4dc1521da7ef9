//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        CartCollection, CartError, CartLineItem,
        checkout::{CheckoutError, CheckoutLine, CheckoutSummary},
        observer::{NoopObserver, PersistenceObserver, TracingObserver},
        operations::CartOperation,
        store::{CartState, CartStore, InitializeOutcome},
    },
    catalog::{CatalogError, CatalogSource, HttpCatalog, ProductFilter},
    pricing::{TotalPriceError, format_price, line_total, total_price},
    products::{Product, ProductError, ProductId, Rating},
    storage::{
        CART_KEY, CartStorage, CartStorageError, FileStore, KeyValueStore, MemoryStore,
        StorageError,
    },
};

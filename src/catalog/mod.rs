//! Catalog
//!
//! The remote product catalog is an unreliable black box: failures are handed
//! to the caller as-is and never retried here.

use async_trait::async_trait;
use mockall::automock;
use reqwest::StatusCode;
use thiserror::Error;

use crate::products::{Product, ProductError, ProductId};

pub mod filter;
pub mod http;

pub use filter::{ProductFilter, categories};
pub use http::HttpCatalog;

/// Errors fetching from the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no product with this id.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// Transport or decoding failure.
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-success status.
    #[error("catalog responded with status {0}")]
    UnexpectedStatus(StatusCode),

    /// The response body could not be decoded.
    #[error("invalid catalog response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// The catalog returned a product that cannot be put in a cart.
    #[error("invalid catalog product {id}: {source}")]
    InvalidProduct {
        /// Id of the rejected product
        id: ProductId,

        /// Broken invariant
        #[source]
        source: ProductError,
    },
}

/// Source of catalog products.
#[automock]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch a single product. Products failing [`Product::validate`] are
    /// rejected.
    async fn fetch_product(&self, id: ProductId) -> Result<Product, CatalogError>;

    /// Fetch every valid product in catalog order.
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError>;
}

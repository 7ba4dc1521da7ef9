//! HTTP Catalog

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::{
    catalog::{CatalogError, CatalogSource},
    products::{Product, ProductId},
};

/// Default catalog base URL.
pub const DEFAULT_CATALOG_URL: &str = "https://fakestoreapi.com";

/// HTTP client for a fake-store style product API.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: String,
    http: Client,
}

impl HttpCatalog {
    /// Create a client for the catalog at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// URL listing every product.
    pub fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }

    /// URL of a single product.
    pub fn product_url(&self, id: ProductId) -> String {
        format!("{}/products/{id}", self.base_url)
    }
}

impl Default for HttpCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_URL)
    }
}

/// Decode a single-product body. Unknown ids come back as an empty body.
fn decode_product(id: ProductId, body: &str) -> Result<Product, CatalogError> {
    let body = body.trim();

    if body.is_empty() || body == "null" {
        return Err(CatalogError::NotFound(id));
    }

    let product: Product = serde_json::from_str(body)?;

    validate(product)
}

fn validate(product: Product) -> Result<Product, CatalogError> {
    match product.validate() {
        Ok(()) => Ok(product),
        Err(source) => Err(CatalogError::InvalidProduct {
            id: product.id,
            source,
        }),
    }
}

/// Keep the products that pass validation, logging the rest.
fn valid_products(products: Vec<Product>) -> Vec<Product> {
    products
        .into_iter()
        .filter_map(|product| match validate(product) {
            Ok(product) => Some(product),
            Err(error) => {
                warn!(%error, "skipping invalid catalog product");
                None
            }
        })
        .collect()
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    #[tracing::instrument(name = "catalog.fetch_product", skip(self), err)]
    async fn fetch_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let response = self.http.get(self.product_url(id)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(CatalogError::NotFound(id)),
            status if !status.is_success() => return Err(CatalogError::UnexpectedStatus(status)),
            _ => {}
        }

        let body = response.text().await?;

        decode_product(id, &body)
    }

    #[tracing::instrument(name = "catalog.fetch_products", skip(self), err)]
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let response = self.http.get(self.products_url()).send().await?;

        let status = response.status();

        if !status.is_success() {
            return Err(CatalogError::UnexpectedStatus(status));
        }

        let products = valid_products(response.json().await?);

        debug!(count = products.len(), "fetched catalog");

        Ok(products)
    }
}

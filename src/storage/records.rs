//! Cart Records
//!
//! Persisted shapes of the cart. Records mirror the stored JSON exactly and are
//! converted into domain types only after passing the structural checks.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::CartLineItem,
    products::{Product, ProductError, ProductId, Rating},
};

/// Current schema version written by [`CartEnvelope`].
pub const CURRENT_VERSION: u32 = 1;

/// Unversioned bare-array blobs are read as this version.
pub const LEGACY_VERSION: u32 = 0;

/// Reasons a decoded line item record is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    /// Quantity must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The stored product snapshot is invalid.
    #[error(transparent)]
    Product(#[from] ProductError),
}

/// Rating Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    /// Average rating
    pub rate: f64,

    /// Number of ratings
    pub count: u64,
}

/// Line Item Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    /// Product id
    pub id: u64,

    /// Product title
    pub title: String,

    /// Unit price captured when the line was added
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Image URI
    pub image: String,

    /// Product description
    pub description: String,

    /// Product category
    pub category: String,

    /// Product rating
    pub rating: RatingRecord,

    /// Quantity in the cart
    pub quantity: u32,
}

/// Versioned cart envelope, the current on-disk layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEnvelope {
    /// Schema version of `items`
    pub version: u32,

    /// Line items in cart order
    pub items: Vec<LineItemRecord>,
}

/// Only the version of a stored envelope, read before the payload.
#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeHeader {
    pub(crate) version: u32,
}

impl From<&CartLineItem> for LineItemRecord {
    fn from(item: &CartLineItem) -> Self {
        let product = item.product();

        Self {
            id: product.id.get(),
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            rating: RatingRecord {
                rate: product.rating.rate,
                count: product.rating.count,
            },
            quantity: item.quantity().get(),
        }
    }
}

impl TryFrom<LineItemRecord> for CartLineItem {
    type Error = RecordError;

    fn try_from(record: LineItemRecord) -> Result<Self, Self::Error> {
        let quantity = NonZeroU32::new(record.quantity).ok_or(RecordError::ZeroQuantity)?;

        let product = Product {
            id: ProductId::new(record.id),
            title: record.title,
            price: record.price,
            image: record.image,
            description: record.description,
            category: record.category,
            rating: Rating {
                rate: record.rating.rate,
                count: record.rating.count,
            },
        };

        product.validate()?;

        Ok(CartLineItem::with_quantity(product, quantity))
    }
}

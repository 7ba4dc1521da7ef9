//! Products

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest allowed average rating.
pub const MAX_RATING: f64 = 5.0;

/// Reasons a product record is unusable.
#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    /// Prices cannot be negative.
    #[error("price {0} is negative")]
    NegativePrice(Decimal),

    /// Rating must be a finite value from 0 to 5.
    #[error("rating {0} is outside 0..=5")]
    RatingOutOfRange(f64),
}

/// Catalog-unique product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Wrap a raw catalog id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw catalog id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregated customer rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average rating, from 0 to 5
    pub rate: f64,

    /// Number of ratings
    pub count: u64,
}

/// Product
///
/// An immutable catalog record. Cart line items keep a copy of the product as
/// it was when first added, so later catalog changes never alter cart totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Product title
    pub title: String,

    /// Unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Image URI
    pub image: String,

    /// Long-form description
    pub description: String,

    /// Catalog category
    pub category: String,

    /// Customer rating
    pub rating: Rating,
}

impl Product {
    /// Check the invariants every stored cart line relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError`] for a negative price or a rating outside
    /// `0..=5`.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.price < Decimal::ZERO {
            return Err(ProductError::NegativePrice(self.price));
        }

        if !(0.0..=MAX_RATING).contains(&self.rating.rate) {
            return Err(ProductError::RatingOutOfRange(self.rating.rate));
        }

        Ok(())
    }
}

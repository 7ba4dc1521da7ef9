//! Cart
//!
//! The canonical cart data: an ordered collection of line items with at most
//! one line per product. Totals are always derived from the lines.

use std::{num::NonZeroU32, slice};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    pricing::{TotalPriceError, total_price},
    products::{Product, ProductId},
};

pub mod checkout;
pub mod observer;
pub mod operations;
pub mod store;

/// Errors related to cart construction.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Two line items share the same product id.
    #[error("product {0} appears in more than one line item")]
    DuplicateItem(ProductId),
}

/// A product snapshot and the quantity of it in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem {
    product: Product,
    quantity: NonZeroU32,
}

impl CartLineItem {
    /// Creates a new line item with a quantity of one.
    pub fn new(product: Product) -> Self {
        Self::with_quantity(product, NonZeroU32::MIN)
    }

    /// Creates a new line item with the given quantity.
    pub fn with_quantity(product: Product, quantity: NonZeroU32) -> Self {
        Self { product, quantity }
    }

    /// Returns the product id, which identifies the line.
    pub fn id(&self) -> ProductId {
        self.product.id
    }

    /// Returns the product snapshot captured when the line was added.
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Returns the quantity.
    pub fn quantity(&self) -> NonZeroU32 {
        self.quantity
    }
}

/// Cart Collection
///
/// Insertion order is preserved: the first product added stays first unless
/// it is removed and added again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartCollection {
    items: Vec<CartLineItem>,
}

impl CartCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over the line items in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, CartLineItem> {
        self.items.iter()
    }

    /// Get the line item for a product, if present.
    pub fn get(&self, id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Check whether a product has a line in the cart.
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Get the number of distinct line items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line quantities.
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity().get()))
            .sum()
    }

    /// Sum of `price * quantity` over all lines, using snapshot prices.
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError::Overflow`] if the total is not representable.
    pub fn total(&self) -> Result<Decimal, TotalPriceError> {
        total_price(&self.items)
    }

    /// Product ids in line order.
    pub fn ids(&self) -> Vec<ProductId> {
        self.items.iter().map(CartLineItem::id).collect()
    }

    fn position(&self, id: ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

impl TryFrom<Vec<CartLineItem>> for CartCollection {
    type Error = CartError;

    fn try_from(items: Vec<CartLineItem>) -> Result<Self, Self::Error> {
        for (idx, item) in items.iter().enumerate() {
            if items.iter().take(idx).any(|earlier| earlier.id() == item.id()) {
                return Err(CartError::DuplicateItem(item.id()));
            }
        }

        Ok(Self { items })
    }
}

impl<'a> IntoIterator for &'a CartCollection {
    type Item = &'a CartLineItem;
    type IntoIter = slice::Iter<'a, CartLineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

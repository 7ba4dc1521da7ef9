//! Pricing

use rust_decimal::Decimal;
use rusty_money::{Money, iso};
use thiserror::Error;

use crate::{cart::CartLineItem, products::ProductId};

/// Errors that can occur while calculating prices.
#[derive(Debug, Error, PartialEq)]
pub enum TotalPriceError {
    /// A line total or the running sum left the representable range.
    #[error("price overflow while totalling product {0}")]
    Overflow(ProductId),
}

/// Calculates the price of a single line: unit price multiplied by quantity.
///
/// # Errors
///
/// Returns [`TotalPriceError::Overflow`] if the product does not fit in a
/// [`Decimal`].
pub fn line_total(item: &CartLineItem) -> Result<Decimal, TotalPriceError> {
    item.product()
        .price
        .checked_mul(Decimal::from(item.quantity().get()))
        .ok_or(TotalPriceError::Overflow(item.id()))
}

/// Calculates the total price of a list of line items.
///
/// An empty list totals zero.
///
/// # Errors
///
/// Returns [`TotalPriceError::Overflow`] if a line total or the sum does not
/// fit in a [`Decimal`].
pub fn total_price<'a>(
    items: impl IntoIterator<Item = &'a CartLineItem>,
) -> Result<Decimal, TotalPriceError> {
    items.into_iter().try_fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(line_total(item)?)
            .ok_or(TotalPriceError::Overflow(item.id()))
    })
}

/// Formats an amount as US dollars for display.
pub fn format_price(amount: Decimal) -> String {
    Money::from_decimal(amount, iso::USD).to_string()
}

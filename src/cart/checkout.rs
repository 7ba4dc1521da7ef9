//! Checkout
//!
//! Checkout is local only: it summarises the cart for the shopper and leaves
//! clearing the cart to the caller.

use std::io;

use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::{CartCollection, CartLineItem},
    pricing::{TotalPriceError, format_price, line_total},
    products::ProductId,
};

/// Reasons a cart cannot be checked out.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// There is nothing to check out.
    #[error("the cart is empty")]
    EmptyCart,

    /// The order total cannot be represented.
    #[error(transparent)]
    Pricing(#[from] TotalPriceError),
}

/// One priced line of a checkout summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLine {
    /// Product id
    pub id: ProductId,

    /// Product title
    pub title: String,

    /// Snapshot unit price
    pub unit_price: Decimal,

    /// Quantity bought
    pub quantity: u32,

    /// `unit_price * quantity`
    pub line_total: Decimal,
}

impl TryFrom<&CartLineItem> for CheckoutLine {
    type Error = TotalPriceError;

    fn try_from(item: &CartLineItem) -> Result<Self, Self::Error> {
        Ok(Self {
            id: item.id(),
            title: item.product().title.clone(),
            unit_price: item.product().price,
            quantity: item.quantity().get(),
            line_total: line_total(item)?,
        })
    }
}

/// Summary of a placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary {
    lines: Vec<CheckoutLine>,
    item_count: u64,
    total: Decimal,
}

impl CheckoutSummary {
    /// Summarise a cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when there is nothing to check out
    /// and [`CheckoutError::Pricing`] when a total overflows.
    pub fn from_cart(cart: &CartCollection) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        Ok(Self {
            lines: cart
                .iter()
                .map(CheckoutLine::try_from)
                .collect::<Result<_, _>>()?,
            item_count: cart.item_count(),
            total: cart.total()?,
        })
    }

    /// Priced lines in cart order.
    pub fn lines(&self) -> &[CheckoutLine] {
        &self.lines
    }

    /// Total number of units.
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Order total.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Writes the summary as a table followed by the order total.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        let mut builder = Builder::default();

        builder.push_record(["Item", "Unit Price", "Qty", "Line Total"]);

        for line in &self.lines {
            builder.push_record([
                line.title.clone(),
                format_price(line.unit_price),
                line.quantity.to_string(),
                format_price(line.line_total),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(1..4), Alignment::right());

        writeln!(out, "{table}")?;
        writeln!(
            out,
            "Items: {}  Total: {}",
            self.item_count,
            format_price(self.total)
        )
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{cart::operations::CartOperation, fixtures::product};

    use super::*;

    fn cart() -> CartCollection {
        [
            CartOperation::AddItem(product(1, Decimal::TEN)),
            CartOperation::AddItem(product(2, Decimal::from(5))),
            CartOperation::SetQuantity(ProductId::new(1), 2),
            CartOperation::SetQuantity(ProductId::new(2), 3),
        ]
        .iter()
        .fold(CartCollection::new(), |cart, op| op.apply(&cart))
    }

    #[test]
    fn empty_cart_has_no_summary() {
        assert_eq!(
            CheckoutSummary::from_cart(&CartCollection::new()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let cart = [
            CartOperation::AddItem(product(1, Decimal::MAX)),
            CartOperation::AddItem(product(2, Decimal::MAX)),
        ]
        .iter()
        .fold(CartCollection::new(), |cart, op| op.apply(&cart));

        assert!(matches!(
            CheckoutSummary::from_cart(&cart),
            Err(CheckoutError::Pricing(TotalPriceError::Overflow(_)))
        ));
    }

    #[test]
    fn summary_totals_match_cart() -> TestResult {
        let summary = CheckoutSummary::from_cart(&cart())?;

        assert_eq!(summary.total(), Decimal::from(35));
        assert_eq!(summary.item_count(), 5);
        assert_eq!(summary.lines().len(), 2);

        let first = summary.lines().first().ok_or("missing first line")?;

        assert_eq!(first.line_total, Decimal::from(20));

        Ok(())
    }

    #[test]
    fn write_to_renders_lines_and_total() -> TestResult {
        let summary = CheckoutSummary::from_cart(&cart())?;
        let mut out = Vec::new();

        summary.write_to(&mut out)?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("Product 1"), "{rendered}");
        assert!(rendered.contains("Product 2"), "{rendered}");
        assert!(rendered.contains("Items: 5"), "{rendered}");
        assert!(rendered.contains("35.00"), "{rendered}");

        Ok(())
    }
}

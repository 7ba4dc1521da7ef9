//! Command Line Consumer
//!
//! Drives a [`CartStore`] and a [`CatalogSource`] from parsed commands and
//! renders the results as tables.

use std::io;

use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;
use tracing::info;

use crate::{
    cart::{CartCollection, checkout::CheckoutError, store::CartStore},
    catalog::{CatalogError, CatalogSource, ProductFilter, categories},
    config::Command,
    observability::ObservabilityError,
    pricing::{TotalPriceError, format_price, line_total},
    products::{Product, ProductId},
    storage::StorageError,
};

/// Errors surfaced to the shell.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be parsed.
    #[error(transparent)]
    Config(#[from] clap::Error),

    /// Logging could not be set up.
    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    /// The cart's backing store could not be opened.
    #[error("failed to open cart storage: {0}")]
    Storage(#[from] StorageError),

    /// The catalog request failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The cart total cannot be computed.
    #[error(transparent)]
    Pricing(#[from] TotalPriceError),

    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Storefront session: one cart store and one catalog.
#[derive(Debug)]
pub struct Storefront<'a, C> {
    cart: &'a CartStore,
    catalog: &'a C,
}

impl<'a, C: CatalogSource> Storefront<'a, C> {
    /// Create a session over an initialised cart store.
    pub fn new(cart: &'a CartStore, catalog: &'a C) -> Self {
        Self { cart, catalog }
    }

    /// Run one command, writing its output to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog request or writing the output fails.
    /// Cart mutations never fail here; persistence problems are logged.
    #[tracing::instrument(
        name = "cli.execute",
        skip(self, out),
        fields(product_id = ?command.product_id()),
        err
    )]
    pub async fn execute(
        &self,
        command: &Command,
        mut out: impl io::Write,
    ) -> Result<(), CliError> {
        match command {
            Command::Products { search, category } => {
                let mut filter = ProductFilter::new();

                if let Some(search) = search {
                    filter = filter.with_query(search.as_str());
                }

                if let Some(category) = category {
                    filter = filter.with_category(category.as_str());
                }

                let products = self.catalog.fetch_products().await?;

                write_products(&mut out, &filter.apply(&products))?;
            }
            Command::Product { id } => {
                let id = ProductId::new(*id);
                let product = self.catalog.fetch_product(id).await?;

                write_product(&mut out, &product, self.cart.quantity_of(id))?;
            }
            Command::Categories => {
                let products = self.catalog.fetch_products().await?;

                for category in categories(&products) {
                    writeln!(out, "{category}")?;
                }
            }
            Command::Cart => write_cart(&mut out, &self.cart.items())?,
            Command::Add { id } => {
                let product = self.catalog.fetch_product(ProductId::new(*id)).await?;
                let title = product.title.clone();

                self.cart.add_to_cart(product);

                writeln!(out, "Added {title} to cart")?;
                write_cart(&mut out, &self.cart.items())?;
            }
            Command::Set { id, quantity } => {
                let id = ProductId::new(*id);

                if self.cart.quantity_of(id).is_none() {
                    writeln!(out, "Product {id} is not in the cart")?;
                    return Ok(());
                }

                self.cart.set_quantity(id, *quantity);

                write_cart(&mut out, &self.cart.items())?;
            }
            Command::Remove { id } => {
                self.cart.remove_from_cart(ProductId::new(*id));

                write_cart(&mut out, &self.cart.items())?;
            }
            Command::Clear => {
                self.cart.clear_cart();

                writeln!(out, "Cart cleared")?;
            }
            Command::Checkout { keep } => {
                let summary = match self.cart.checkout() {
                    Ok(summary) => summary,
                    Err(CheckoutError::EmptyCart) => {
                        writeln!(out, "Your cart is empty")?;
                        return Ok(());
                    }
                    Err(CheckoutError::Pricing(error)) => return Err(error.into()),
                };

                summary.write_to(&mut out)?;

                if !keep {
                    self.cart.clear_cart();
                    info!("cart cleared after checkout");
                }

                writeln!(out, "Thank you for your order!")?;
            }
        }

        Ok(())
    }
}

fn write_products(out: &mut impl io::Write, products: &[&Product]) -> io::Result<()> {
    if products.is_empty() {
        return writeln!(out, "No products found");
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Title", "Category", "Price", "Rating"]);

    for product in products {
        builder.push_record([
            product.id.to_string(),
            product.title.clone(),
            product.category.clone(),
            format_price(product.price),
            format!("{:.1} ({})", product.rating.rate, product.rating.count),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..5), Alignment::right());

    writeln!(out, "{table}")
}

fn write_product(
    out: &mut impl io::Write,
    product: &Product,
    in_cart: Option<u32>,
) -> io::Result<()> {
    writeln!(out, "{} (#{})", product.title, product.id)?;
    writeln!(out, "Category: {}", product.category)?;
    writeln!(out, "Price: {}", format_price(product.price))?;
    writeln!(
        out,
        "Rating: {:.1} from {} reviews",
        product.rating.rate, product.rating.count
    )?;
    writeln!(out)?;
    writeln!(out, "{}", product.description)?;

    if let Some(quantity) = in_cart {
        writeln!(out)?;
        writeln!(out, "In cart: {quantity}")?;
    }

    Ok(())
}

fn write_cart(out: &mut impl io::Write, cart: &CartCollection) -> Result<(), CliError> {
    if cart.is_empty() {
        writeln!(out, "Your cart is empty")?;

        return Ok(());
    }

    let total = cart.total()?;

    let mut builder = Builder::default();

    builder.push_record(["ID", "Item", "Unit Price", "Qty", "Line Total"]);

    for item in cart {
        builder.push_record([
            item.id().to_string(),
            item.product().title.clone(),
            format_price(item.product().price),
            item.quantity().to_string(),
            format_price(line_total(item)?),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(
        out,
        "Items: {}  Total: {}",
        cart.item_count(),
        format_price(total)
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::predicate::eq;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        catalog::MockCatalogSource,
        fixtures::{product, titled_product},
        storage::MemoryStore,
    };

    use super::*;

    async fn ready_store() -> CartStore {
        let store = CartStore::new(Arc::new(MemoryStore::new()));

        store.initialize().await;

        store
    }

    async fn run(
        cart: &CartStore,
        catalog: &MockCatalogSource,
        command: Command,
    ) -> Result<String, CliError> {
        let mut out = Vec::new();

        Storefront::new(cart, catalog).execute(&command, &mut out).await?;

        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[tokio::test]
    async fn add_fetches_product_and_updates_cart() -> TestResult {
        let cart = ready_store().await;
        let mut catalog = MockCatalogSource::new();

        catalog
            .expect_fetch_product()
            .with(eq(ProductId::new(7)))
            .times(2)
            .returning(|id| Ok(product(id.get(), Decimal::from(12))));

        run(&cart, &catalog, Command::Add { id: 7 }).await?;
        let rendered = run(&cart, &catalog, Command::Add { id: 7 }).await?;

        assert_eq!(cart.quantity_of(ProductId::new(7)), Some(2));
        assert!(rendered.contains("Added Product 7 to cart"), "{rendered}");
        assert!(rendered.contains("Items: 2"), "{rendered}");
        assert!(rendered.contains("24.00"), "{rendered}");

        Ok(())
    }

    #[tokio::test]
    async fn add_of_unknown_product_leaves_cart_untouched() -> TestResult {
        let cart = ready_store().await;
        let mut catalog = MockCatalogSource::new();

        catalog
            .expect_fetch_product()
            .returning(|id| Err(CatalogError::NotFound(id)));

        let result = run(&cart, &catalog, Command::Add { id: 404 }).await;

        assert!(matches!(
            result,
            Err(CliError::Catalog(CatalogError::NotFound(_)))
        ));
        assert!(cart.items().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn set_to_zero_removes_line() -> TestResult {
        let cart = ready_store().await;
        let catalog = MockCatalogSource::new();

        cart.add_to_cart(product(1, Decimal::ONE));

        let rendered = run(&cart, &catalog, Command::Set { id: 1, quantity: 0 }).await?;

        assert!(cart.items().is_empty());
        assert!(rendered.contains("Your cart is empty"), "{rendered}");

        Ok(())
    }

    #[tokio::test]
    async fn set_on_missing_line_reports_it() -> TestResult {
        let cart = ready_store().await;
        let catalog = MockCatalogSource::new();

        let rendered = run(&cart, &catalog, Command::Set { id: 9, quantity: 3 }).await?;

        assert!(rendered.contains("not in the cart"), "{rendered}");
        assert!(cart.items().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn checkout_clears_unless_kept() -> TestResult {
        let cart = ready_store().await;
        let catalog = MockCatalogSource::new();

        cart.add_to_cart(product(1, Decimal::TEN));

        let kept = run(&cart, &catalog, Command::Checkout { keep: true }).await?;

        assert!(kept.contains("Total: $10.00"), "{kept}");
        assert_eq!(cart.item_count(), 1);

        let placed = run(&cart, &catalog, Command::Checkout { keep: false }).await?;

        assert!(placed.contains("Thank you"), "{placed}");
        assert!(cart.items().is_empty());

        let empty = run(&cart, &catalog, Command::Checkout { keep: false }).await?;

        assert!(empty.contains("Your cart is empty"), "{empty}");

        Ok(())
    }

    #[tokio::test]
    async fn products_apply_filters() -> TestResult {
        let cart = ready_store().await;
        let mut catalog = MockCatalogSource::new();

        catalog.expect_fetch_products().returning(|| {
            Ok(vec![
                titled_product(1, "Backpack", "men's clothing"),
                titled_product(2, "Ring", "jewelery"),
            ])
        });

        let rendered = run(
            &cart,
            &catalog,
            Command::Products {
                search: None,
                category: Some("jewelery".to_string()),
            },
        )
        .await?;

        assert!(rendered.contains("Ring"), "{rendered}");
        assert!(!rendered.contains("Backpack"), "{rendered}");

        let none = run(
            &cart,
            &catalog,
            Command::Products {
                search: Some("laptop".to_string()),
                category: None,
            },
        )
        .await?;

        assert!(none.contains("No products found"), "{none}");

        Ok(())
    }

    #[tokio::test]
    async fn categories_are_listed_once() -> TestResult {
        let cart = ready_store().await;
        let mut catalog = MockCatalogSource::new();

        catalog.expect_fetch_products().returning(|| {
            Ok(vec![
                titled_product(1, "Backpack", "men's clothing"),
                titled_product(2, "Shirt", "men's clothing"),
                titled_product(3, "Ring", "jewelery"),
            ])
        });

        let rendered = run(&cart, &catalog, Command::Categories).await?;

        assert_eq!(rendered, "men's clothing\njewelery\n");

        Ok(())
    }

    #[tokio::test]
    async fn product_shows_quantity_in_cart() -> TestResult {
        let cart = ready_store().await;
        let mut catalog = MockCatalogSource::new();

        catalog
            .expect_fetch_product()
            .returning(|id| Ok(product(id.get(), Decimal::ONE)));

        cart.add_to_cart(product(5, Decimal::ONE));

        let rendered = run(&cart, &catalog, Command::Product { id: 5 }).await?;

        assert!(rendered.contains("Product 5 (#5)"), "{rendered}");
        assert!(rendered.contains("In cart: 1"), "{rendered}");

        Ok(())
    }

    #[tokio::test]
    async fn overflowing_cart_is_an_error_not_a_crash() -> TestResult {
        let cart = ready_store().await;
        let catalog = MockCatalogSource::new();

        cart.add_to_cart(product(1, Decimal::MAX));
        cart.set_quantity(ProductId::new(1), 2);

        assert!(matches!(
            run(&cart, &catalog, Command::Cart).await,
            Err(CliError::Pricing(TotalPriceError::Overflow(_)))
        ));
        assert!(matches!(
            run(&cart, &catalog, Command::Checkout { keep: false }).await,
            Err(CliError::Pricing(TotalPriceError::Overflow(_)))
        ));
        assert_eq!(cart.item_count(), 2);

        Ok(())
    }
}

//! Fixtures
//!
//! Small product builders shared by unit tests, integration tests and demos.

use rust_decimal::Decimal;

use crate::products::{Product, ProductId, Rating};

/// Build a product with the given id and price and placeholder details.
pub fn product(id: u64, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        price,
        image: format!("https://example.com/products/{id}.jpg"),
        description: format!("Description of product {id}"),
        category: "electronics".to_string(),
        rating: Rating {
            rate: 4.5,
            count: 10,
        },
    }
}

/// Build a product with a specific title and category, priced at one unit.
pub fn titled_product(id: u64, title: &str, category: &str) -> Product {
    Product {
        title: title.to_string(),
        category: category.to_string(),
        ..product(id, Decimal::ONE)
    }
}

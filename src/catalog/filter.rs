//! Product Filtering

use rustc_hash::FxHashSet;

use crate::products::Product;

/// Category label that matches every product.
pub const ALL_CATEGORIES: &str = "All";

/// Search and category filter over catalog products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    query: Option<String>,
    category: Option<String>,
}

impl ProductFilter {
    /// A filter that matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to products whose title or description contains `query`,
    /// ignoring case. Blank queries match everything.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into().trim().to_lowercase();

        self.query = (!query.is_empty()).then_some(query);
        self
    }

    /// Restrict to a category, ignoring case. [`ALL_CATEGORIES`] clears it.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into().trim().to_string();

        self.category = (!category.is_empty() && !category.eq_ignore_ascii_case(ALL_CATEGORIES))
            .then_some(category);
        self
    }

    /// Check whether a product passes the filter.
    pub fn matches(&self, product: &Product) -> bool {
        let category_matches = self
            .category
            .as_ref()
            .is_none_or(|category| product.category.to_lowercase() == category.to_lowercase());

        let query_matches = self.query.as_ref().is_none_or(|query| {
            product.title.to_lowercase().contains(query)
                || product.description.to_lowercase().contains(query)
        });

        category_matches && query_matches
    }

    /// Matching products, in catalog order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products
            .iter()
            .filter(|product| self.matches(product))
            .collect()
    }
}

/// Distinct categories in the order they first appear.
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen = FxHashSet::default();

    products
        .iter()
        .filter(|product| seen.insert(product.category.as_str()))
        .map(|product| product.category.clone())
        .collect()
}

//! Storefront derivations over a fetched product list.
//!
//! Pure functions, recomputed on every call. The server never filters;
//! `GET /api/products` always returns the full catalog.

use crate::models::Product;

/// How many products the home page features.
pub const FEATURED_COUNT: usize = 3;

/// ProductFilter
///
/// The two products-page inputs. An empty `search` matches every name; a
/// `category` of `None` or `""` is the "all categories" wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: String,
    pub category: Option<String>,
}

impl ProductFilter {
    pub fn new(search: impl Into<String>, category: Option<&str>) -> Self {
        Self {
            search: search.into(),
            category: category.map(str::to_string),
        }
    }

    /// Case-insensitive substring match on the name, AND exact category
    /// equality unless the category is the wildcard.
    pub fn matches(&self, product: &Product) -> bool {
        let matches_search = product
            .name
            .to_lowercase()
            .contains(&self.search.to_lowercase());
        let matches_category = match self.category.as_deref() {
            None | Some("") => true,
            Some(category) => product.category == category,
        };
        matches_search && matches_category
    }

    /// The matching subsequence of `products`, in original order.
    pub fn apply<'p>(&self, products: &'p [Product]) -> Vec<&'p Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Distinct categories in first-seen order, for the category selector.
pub fn categories(products: &[Product]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for product in products {
        if !seen.contains(&product.category.as_str()) {
            seen.push(&product.category);
        }
    }
    seen
}

/// The first `count` products, as shown on the home page.
pub fn featured(products: &[Product], count: usize) -> &[Product] {
    &products[..count.min(products.len())]
}

//! Product lookup for order entry

use shared::models::Product;
use std::collections::HashSet;

/// Category value that matches every product
pub const ALL_CATEGORIES: &str = "All";

/// Products in `category` whose name contains `query` (case-insensitive).
///
/// A blank query matches every name.
pub fn filter_products<'a>(products: &'a [Product], category: &str, query: &str) -> Vec<&'a Product> {
    let query = query.trim().to_lowercase();
    products
        .iter()
        .filter(|p| category == ALL_CATEGORIES || p.category == category)
        .filter(|p| query.is_empty() || p.name.to_lowercase().contains(&query))
        .collect()
}

/// Distinct categories in first-seen order, headed by [`ALL_CATEGORIES`]
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(
            products
                .iter()
                .filter(|p| !p.category.is_empty())
                .filter(|p| seen.insert(p.category.as_str()))
                .map(|p| p.category.clone()),
        )
        .collect()
}

//! Product catalogs a collection predicate can be evaluated against.
//!
//! The database catalog translates the predicate into SQL; the in-memory
//! catalog evaluates it product by product. Both must return the same
//! products for the same predicate.

use crate::database::Product;
use anyhow::Result;
use async_trait::async_trait;
use storefront_common::{CollectionRules, Expr, Visibility};

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Products admitted by `visibility` that satisfy `predicate`, ordered by id
    async fn query(&self, visibility: &Visibility, predicate: &Expr) -> Result<Vec<Product>>;
}

/// Catalog over a fixed set of products held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    products: Vec<Product>,
}

impl MemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn query(&self, visibility: &Visibility, predicate: &Expr) -> Result<Vec<Product>> {
        let mut matched: Vec<Product> = self
            .products
            .iter()
            .filter(|p| visibility.admits(*p) && predicate.matches(*p))
            .cloned()
            .collect();
        matched.sort_by_key(|p| p.id);
        Ok(matched)
    }
}

/// Products of `store_id` that belong to a collection with `rules` at `now_ns`.
/// A collection without conditions contains nothing.
pub async fn get_matching_products<C: Catalog + ?Sized>(
    catalog: &C,
    store_id: i64,
    rules: &CollectionRules,
    now_ns: i64,
) -> Result<Vec<Product>> {
    if rules.is_empty() {
        tracing::debug!("Collection in store {} has no conditions", store_id);
        return Ok(Vec::new());
    }

    let visibility = Visibility::new(store_id, now_ns);
    let predicate = rules.predicate();
    tracing::debug!(
        "Querying store {} with {} conditions ({})",
        store_id,
        rules.conditions().len(),
        rules.mode()
    );
    catalog.query(&visibility, &predicate).await
}

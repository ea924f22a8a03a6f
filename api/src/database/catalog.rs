use super::products::{ProductRow, PRODUCT_SELECT};
use super::types::Database;
use super::Product;
use crate::catalog::Catalog;
use crate::query::{build_sql, visibility_sql, SqlValue};
use anyhow::Result;
use async_trait::async_trait;
use storefront_common::{Expr, Visibility};

#[async_trait]
impl Catalog for Database {
    async fn query(&self, visibility: &Visibility, predicate: &Expr) -> Result<Vec<Product>> {
        let filter = build_sql(predicate).map_err(anyhow::Error::msg)?;
        let scope = visibility_sql(visibility);

        let query = format!(
            "{} WHERE {} AND ({}) ORDER BY p.id",
            PRODUCT_SELECT, scope.sql, filter.sql
        );
        tracing::debug!("Catalog query: {}", query);

        let mut query_builder = sqlx::query_as::<_, ProductRow>(&query);
        for value in scope.values.into_iter().chain(filter.values) {
            query_builder = match value {
                SqlValue::String(s) => query_builder.bind(s),
                SqlValue::Integer(i) => query_builder.bind(i),
            };
        }

        let rows = query_builder.fetch_all(&self.pool).await?;
        self.attach_tags(rows).await
    }
}

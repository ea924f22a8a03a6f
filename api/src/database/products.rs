use super::core::now_ns;
use super::types::Database;
use anyhow::{bail, Context, Result};
use poem_openapi::Object;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::collections::HashMap;
use storefront_common::media::{MediaItem, MediaKind, ProductMediaSet};
use storefront_common::money::{self, AMOUNT_DECIMAL_PLACES};
use storefront_common::ProductAttributes;

/// Columns of a product row joined with its type name. The join alias is
/// `pty` so condition subqueries are free to use their own aliases.
pub(crate) const PRODUCT_SELECT: &str = "SELECT p.id, p.store_id, pty.name AS product_type, p.title, p.price_cents, p.stock, p.published, p.date_available_ns
     FROM products p
     LEFT JOIN product_types pty ON pty.id = p.product_type_id";

/// Product ids bound per tag lookup, well under SQLite's variable limit
const TAG_LOOKUP_CHUNK: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct Product {
    pub id: i64,
    pub store_id: i64,
    #[oai(skip_serializing_if_is_none)]
    pub product_type: Option<String>,
    pub title: String,
    pub price_cents: i64,
    /// Price rendered with two decimal places
    pub price: String,
    pub stock: i64,
    pub published: bool,
    pub date_available_ns: i64,
    pub tags: Vec<String>,
}

impl ProductAttributes for Product {
    fn store_id(&self) -> i64 {
        self.store_id
    }

    fn product_type(&self) -> Option<&str> {
        self.product_type.as_deref()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn stock(&self) -> i64 {
        self.stock
    }

    fn price(&self) -> Decimal {
        money::from_cents(self.price_cents)
    }

    fn published(&self) -> bool {
        self.published
    }

    fn date_available_ns(&self) -> i64 {
        self.date_available_ns
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i64,
    store_id: i64,
    product_type: Option<String>,
    title: String,
    price_cents: i64,
    stock: i64,
    published: bool,
    date_available_ns: i64,
}

impl ProductRow {
    fn into_product(self, tags: Vec<String>) -> Product {
        Product {
            id: self.id,
            store_id: self.store_id,
            product_type: self.product_type,
            title: self.title,
            price_cents: self.price_cents,
            price: money::format_cents(self.price_cents),
            stock: self.stock,
            published: self.published,
            date_available_ns: self.date_available_ns,
            tags,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductType {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub product_type: Option<String>,
    pub price: Decimal,
    pub stock: i64,
    pub published: bool,
    pub date_available_ns: i64,
    pub tags: Vec<String>,
}

/// Partial product update; `None` leaves a field unchanged.
/// `product_type: Some(None)` clears the type.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub product_type: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub published: Option<bool>,
    pub date_available_ns: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMedia {
    pub id: i64,
    pub product_id: i64,
    pub kind: MediaKind,
    pub path: String,
    pub is_primary: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductMediaRow {
    id: i64,
    product_id: i64,
    kind: String,
    path: String,
    is_primary: bool,
}

impl TryFrom<ProductMediaRow> for ProductMedia {
    type Error = anyhow::Error;

    fn try_from(row: ProductMediaRow) -> Result<Self> {
        Ok(ProductMedia {
            id: row.id,
            product_id: row.product_id,
            kind: row.kind.parse().map_err(anyhow::Error::msg)?,
            path: row.path,
            is_primary: row.is_primary,
        })
    }
}

fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Product title cannot be empty");
    }
    Ok(title)
}

fn validate_stock(stock: i64) -> Result<i64> {
    if stock < 0 {
        bail!("Product stock cannot be negative");
    }
    Ok(stock)
}

fn price_to_cents(price: Decimal) -> Result<i64> {
    if price.is_sign_negative() && !price.is_zero() {
        bail!("Product price cannot be negative");
    }
    if price.normalize().scale() > AMOUNT_DECIMAL_PLACES {
        bail!(
            "Product price {} has more than {} decimal places",
            price,
            AMOUNT_DECIMAL_PLACES
        );
    }
    money::to_cents(price).ok_or_else(|| anyhow::anyhow!("Product price {} is out of range", price))
}

/// Trimmed, non-empty tag names with case-insensitive duplicates removed
fn normalize_tags(tags: &[String]) -> Vec<&str> {
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let folded = tag.to_lowercase();
        if !seen.contains(&folded) {
            seen.push(folded);
            result.push(tag);
        }
    }
    result
}

async fn resolve_product_type(conn: &mut SqliteConnection, store_id: i64, name: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Product type name cannot be empty");
    }
    let folded = name.to_lowercase();

    sqlx::query(
        "INSERT INTO product_types (store_id, name, name_folded) VALUES (?, ?, ?)
         ON CONFLICT (store_id, name_folded) DO NOTHING",
    )
    .bind(store_id)
    .bind(name)
    .bind(&folded)
    .execute(&mut *conn)
    .await?;

    let id: i64 =
        sqlx::query_scalar("SELECT id FROM product_types WHERE store_id = ? AND name_folded = ?")
            .bind(store_id)
            .bind(&folded)
            .fetch_one(&mut *conn)
            .await?;
    Ok(id)
}

async fn replace_product_tags(conn: &mut SqliteConnection, product_id: i64, tags: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM product_tags WHERE product_id = ?")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    for tag in normalize_tags(tags) {
        let folded = tag.to_lowercase();
        sqlx::query("INSERT INTO tags (name, name_folded) VALUES (?, ?) ON CONFLICT (name_folded) DO NOTHING")
            .bind(tag)
            .bind(&folded)
            .execute(&mut *conn)
            .await?;
        let tag_id: i64 = sqlx::query_scalar("SELECT id FROM tags WHERE name_folded = ?")
            .bind(&folded)
            .fetch_one(&mut *conn)
            .await?;
        sqlx::query("INSERT INTO product_tags (product_id, tag_id) VALUES (?, ?)")
            .bind(product_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Re-establish a single primary media item of `kind` for the product
async fn normalize_primary_media(conn: &mut SqliteConnection, product_id: i64, kind: MediaKind) -> Result<()> {
    let rows: Vec<(i64, bool)> = sqlx::query_as(
        "SELECT id, is_primary FROM product_media WHERE product_id = ? AND kind = ?",
    )
    .bind(product_id)
    .bind(kind.as_str())
    .fetch_all(&mut *conn)
    .await?;

    let mut set = ProductMediaSet::new(
        rows.into_iter()
            .map(|(id, is_primary)| MediaItem { id, is_primary })
            .collect(),
    );
    for change in set.ensure_exactly_one_primary() {
        sqlx::query("UPDATE product_media SET is_primary = ? WHERE id = ?")
            .bind(change.is_primary)
            .bind(change.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

impl Database {
    pub async fn create_product_type(&self, store_id: i64, name: &str) -> Result<ProductType> {
        let mut conn = self.pool.acquire().await?;
        let id = resolve_product_type(&mut conn, store_id, name).await?;

        let product_type =
            sqlx::query_as::<_, ProductType>("SELECT id, store_id, name FROM product_types WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(product_type)
    }

    pub async fn list_product_types(&self, store_id: i64) -> Result<Vec<ProductType>> {
        let types = sqlx::query_as::<_, ProductType>(
            "SELECT id, store_id, name FROM product_types WHERE store_id = ? ORDER BY name_folded",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    pub async fn create_product(&self, store_id: i64, product: NewProduct) -> Result<Product> {
        let title = validate_title(&product.title)?;
        let price_cents = price_to_cents(product.price)?;
        let stock = validate_stock(product.stock)?;
        let now = now_ns();

        let mut tx = self.pool.begin().await?;

        let product_type_id = match product.product_type.as_deref() {
            Some(name) => Some(resolve_product_type(&mut tx, store_id, name).await?),
            None => None,
        };

        let id = sqlx::query(
            "INSERT INTO products (store_id, product_type_id, title, title_folded, price_cents, stock, published, date_available_ns, created_at_ns, updated_at_ns)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(store_id)
        .bind(product_type_id)
        .bind(title)
        .bind(title.to_lowercase())
        .bind(price_cents)
        .bind(stock)
        .bind(product.published)
        .bind(product.date_available_ns)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert product")?
        .last_insert_rowid();

        replace_product_tags(&mut tx, id, &product.tags).await?;
        tx.commit().await?;

        tracing::debug!("Created product {} in store {}", id, store_id);

        self.get_product(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Product not found after insert"))
    }

    pub async fn update_product(&self, product_id: i64, update: ProductUpdate) -> Result<Product> {
        let current = self
            .get_product(product_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Product not found"))?;

        let mut tx = self.pool.begin().await?;

        let title = match update.title.as_deref() {
            Some(title) => validate_title(title)?.to_string(),
            None => current.title.clone(),
        };
        let price_cents = match update.price {
            Some(price) => price_to_cents(price)?,
            None => current.price_cents,
        };
        let stock = validate_stock(update.stock.unwrap_or(current.stock))?;
        let product_type_id = match update.product_type {
            Some(Some(ref name)) => Some(resolve_product_type(&mut tx, current.store_id, name).await?),
            Some(None) => None,
            None => sqlx::query_scalar("SELECT product_type_id FROM products WHERE id = ?")
                .bind(product_id)
                .fetch_one(&mut *tx)
                .await?,
        };

        sqlx::query(
            "UPDATE products SET product_type_id = ?, title = ?, title_folded = ?, price_cents = ?, stock = ?,
                 published = ?, date_available_ns = ?, updated_at_ns = ?
             WHERE id = ?",
        )
        .bind(product_type_id)
        .bind(&title)
        .bind(title.to_lowercase())
        .bind(price_cents)
        .bind(stock)
        .bind(update.published.unwrap_or(current.published))
        .bind(update.date_available_ns.unwrap_or(current.date_available_ns))
        .bind(now_ns())
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_product(product_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Product not found"))
    }

    /// Replace a product's tag set. Tags are shared across stores and
    /// matched case-insensitively.
    pub async fn set_product_tags(&self, product_id: i64, tags: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            bail!("Product not found");
        }
        replace_product_tags(&mut tx, product_id, tags).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{} WHERE p.id = ?", PRODUCT_SELECT))
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_tags(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Every product of a store, regardless of visibility
    pub async fn list_store_products(&self, store_id: i64) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{} WHERE p.store_id = ? ORDER BY p.id",
            PRODUCT_SELECT
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_tags(rows).await
    }

    /// Products of the store that are published and available at `now_ns`
    pub async fn list_visible_products(&self, store_slug: &str, now_ns: i64) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{} JOIN stores s ON s.id = p.store_id
             WHERE s.slug = ? AND p.published = 1 AND p.date_available_ns <= ?
             ORDER BY p.id",
            PRODUCT_SELECT
        ))
        .bind(store_slug)
        .bind(now_ns)
        .fetch_all(&self.pool)
        .await?;

        self.attach_tags(rows).await
    }

    pub(crate) async fn attach_tags(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
        for chunk in rows.chunks(TAG_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let query = format!(
                "SELECT pt.product_id, t.name FROM product_tags pt
                 JOIN tags t ON t.id = pt.tag_id
                 WHERE pt.product_id IN ({})
                 ORDER BY t.name_folded",
                placeholders
            );
            let mut query_builder = sqlx::query_as::<_, (i64, String)>(&query);
            for row in chunk {
                query_builder = query_builder.bind(row.id);
            }

            for (product_id, name) in query_builder.fetch_all(&self.pool).await? {
                tags.entry(product_id).or_default().push(name);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let product_tags = tags.remove(&row.id).unwrap_or_default();
                row.into_product(product_tags)
            })
            .collect())
    }

    /// Attach an image or attachment to a product. Exactly one item per kind
    /// stays primary: a new primary item demotes the previous one, and the
    /// first item of a kind becomes primary on its own.
    pub async fn add_product_media(
        &self,
        product_id: i64,
        kind: MediaKind,
        path: &str,
        is_primary: bool,
    ) -> Result<ProductMedia> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO product_media (product_id, kind, path, is_primary, created_at_ns)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(product_id)
        .bind(kind.as_str())
        .bind(path)
        .bind(is_primary)
        .bind(now_ns())
        .execute(&mut *tx)
        .await
        .context("Failed to insert product media")?
        .last_insert_rowid();

        normalize_primary_media(&mut tx, product_id, kind).await?;
        tx.commit().await?;

        self.get_product_media(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Product media not found after insert"))
    }

    /// Delete a media item, promoting the oldest remaining one when the
    /// primary is removed.
    pub async fn delete_product_media(&self, media_id: i64) -> Result<()> {
        let media = self
            .get_product_media(media_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Product media not found"))?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM product_media WHERE id = ?")
            .bind(media_id)
            .execute(&mut *tx)
            .await?;
        normalize_primary_media(&mut tx, media.product_id, media.kind).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_product_media(&self, media_id: i64) -> Result<Option<ProductMedia>> {
        let row = sqlx::query_as::<_, ProductMediaRow>(
            "SELECT id, product_id, kind, path, is_primary FROM product_media WHERE id = ?",
        )
        .bind(media_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductMedia::try_from).transpose()
    }

    pub async fn list_product_media(&self, product_id: i64, kind: MediaKind) -> Result<Vec<ProductMedia>> {
        let rows = sqlx::query_as::<_, ProductMediaRow>(
            "SELECT id, product_id, kind, path, is_primary FROM product_media
             WHERE product_id = ? AND kind = ? ORDER BY id",
        )
        .bind(product_id)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProductMedia::try_from).collect()
    }
}

#[cfg(test)]
mod tests;

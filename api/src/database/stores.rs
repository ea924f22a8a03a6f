use super::core::now_ns;
use super::types::Database;
use anyhow::{bail, Result};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use storefront_common::slug::{slug_candidates, slugify_or};
use storefront_common::uploads::store_image_file_path;
use uuid::Uuid;

pub const MAX_STORE_TITLE_LENGTH: usize = 35;

const STORE_COLUMNS: &str =
    "id, uuid, owner_id, title, slug, is_active, logo_path, created_at_ns, updated_at_ns";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, Object)]
pub struct Store {
    pub id: i64,
    pub uuid: String,
    pub owner_id: String,
    pub title: String,
    pub slug: String,
    pub is_active: bool,
    #[oai(skip_serializing_if_is_none)]
    pub logo_path: Option<String>,
    pub created_at_ns: i64,
    pub updated_at_ns: i64,
}

impl Store {
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}

fn validate_store_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Store title cannot be empty");
    }
    if title.chars().count() > MAX_STORE_TITLE_LENGTH {
        bail!(
            "Store title is too long (max {} characters)",
            MAX_STORE_TITLE_LENGTH
        );
    }
    Ok(title)
}

impl Database {
    /// Create a new, inactive store with a slug derived from its title.
    pub async fn create_store(&self, owner_id: &str, title: &str) -> Result<Store> {
        let title = validate_store_title(title)?;
        let slug = self.unique_store_slug(title, None).await?;
        let now = now_ns();

        let id = sqlx::query(
            "INSERT INTO stores (uuid, owner_id, title, slug, is_active, created_at_ns, updated_at_ns)
             VALUES (?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(owner_id)
        .bind(title)
        .bind(&slug)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::info!("Created store {} ({}) for owner {}", slug, id, owner_id);

        self.get_store(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Store not found after insert"))
    }

    pub async fn get_store(&self, id: i64) -> Result<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {} FROM stores WHERE id = ?",
            STORE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    pub async fn get_store_by_slug(&self, slug: &str) -> Result<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {} FROM stores WHERE slug = ?",
            STORE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    pub async fn list_stores(&self) -> Result<Vec<Store>> {
        let stores = sqlx::query_as::<_, Store>(&format!(
            "SELECT {} FROM stores ORDER BY id",
            STORE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(stores)
    }

    /// Rename a store; the slug is re-derived from the new title.
    pub async fn update_store_title(&self, id: i64, owner_id: &str, title: &str) -> Result<Store> {
        self.require_store_owner(id, owner_id).await?;
        let title = validate_store_title(title)?;
        let slug = self.unique_store_slug(title, Some(id)).await?;

        sqlx::query("UPDATE stores SET title = ?, slug = ?, updated_at_ns = ? WHERE id = ?")
            .bind(title)
            .bind(&slug)
            .bind(now_ns())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_store(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Store not found"))
    }

    pub async fn set_store_active(&self, id: i64, owner_id: &str, is_active: bool) -> Result<()> {
        self.require_store_owner(id, owner_id).await?;
        sqlx::query("UPDATE stores SET is_active = ?, updated_at_ns = ? WHERE id = ?")
            .bind(is_active)
            .bind(now_ns())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record a logo upload and return the storage path assigned to it.
    pub async fn set_store_logo(&self, id: i64, owner_id: &str, filename: &str) -> Result<String> {
        let store = self.require_store_owner(id, owner_id).await?;
        let store_uuid = Uuid::parse_str(&store.uuid)?;
        let path = store_image_file_path(&store_uuid, filename);

        sqlx::query("UPDATE stores SET logo_path = ?, updated_at_ns = ? WHERE id = ?")
            .bind(&path)
            .bind(now_ns())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(path)
    }

    /// Load a store and fail unless `owner_id` owns it
    pub(crate) async fn require_store_owner(&self, store_id: i64, owner_id: &str) -> Result<Store> {
        let store = self
            .get_store(store_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Store not found"))?;
        if !store.is_owned_by(owner_id) {
            bail!("Unauthorized: only the store owner can modify store {}", store.slug);
        }
        Ok(store)
    }

    pub(crate) async fn require_store_by_slug(&self, slug: &str) -> Result<Store> {
        self.get_store_by_slug(slug)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Store not found"))
    }

    async fn unique_store_slug(&self, title: &str, exclude_id: Option<i64>) -> Result<String> {
        let base = slugify_or(title, "store");
        for candidate in slug_candidates(&base) {
            let taken: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM stores WHERE slug = ? AND id != ?")
                    .bind(&candidate)
                    .bind(exclude_id.unwrap_or(-1))
                    .fetch_one(&self.pool)
                    .await?;
            if taken == 0 {
                return Ok(candidate);
            }
        }
        bail!("No free slug for store title {}", title)
    }
}

#[cfg(test)]
mod tests;

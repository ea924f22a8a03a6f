use super::core::now_ns;
use super::types::Database;
use super::Product;
use crate::catalog::get_matching_products;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use storefront_common::slug::{slug_candidates, slugify_or};
use storefront_common::{CollectionRules, CombinationMode, Condition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub store_id: i64,
    pub title: String,
    pub slug: String,
    pub mode: CombinationMode,
    pub created_at_ns: i64,
    pub updated_at_ns: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CollectionRow {
    id: i64,
    store_id: i64,
    title: String,
    slug: String,
    combination_mode: String,
    created_at_ns: i64,
    updated_at_ns: i64,
}

impl TryFrom<CollectionRow> for Collection {
    type Error = anyhow::Error;

    fn try_from(row: CollectionRow) -> Result<Self> {
        Ok(Collection {
            id: row.id,
            store_id: row.store_id,
            title: row.title,
            slug: row.slug,
            mode: row.combination_mode.parse().map_err(anyhow::Error::msg)?,
            created_at_ns: row.created_at_ns,
            updated_at_ns: row.updated_at_ns,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectionUpdate {
    pub title: Option<String>,
    pub mode: Option<CombinationMode>,
}

/// A persisted condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCondition {
    pub id: i64,
    pub collection_id: i64,
    #[serde(flatten)]
    pub condition: Condition,
}

#[derive(Debug, sqlx::FromRow)]
struct ConditionRow {
    id: i64,
    collection_id: i64,
    field_reference: String,
    filter_type: String,
    field_val: String,
}

impl TryFrom<ConditionRow> for StoredCondition {
    type Error = anyhow::Error;

    fn try_from(row: ConditionRow) -> Result<Self> {
        Ok(StoredCondition {
            id: row.id,
            collection_id: row.collection_id,
            condition: Condition::new(
                row.field_reference.parse().map_err(anyhow::Error::msg)?,
                row.filter_type.parse().map_err(anyhow::Error::msg)?,
                row.field_val,
            ),
        })
    }
}

const COLLECTION_COLUMNS: &str =
    "id, store_id, title, slug, combination_mode, created_at_ns, updated_at_ns";

fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Collection title cannot be empty");
    }
    Ok(title)
}

impl Database {
    pub async fn create_collection(
        &self,
        store_id: i64,
        owner_id: &str,
        title: &str,
        mode: CombinationMode,
    ) -> Result<Collection> {
        self.require_store_owner(store_id, owner_id).await?;
        let title = validate_title(title)?;
        let slug = self.unique_collection_slug(store_id, title, None).await?;
        let now = now_ns();

        let id = sqlx::query(
            "INSERT INTO collections (store_id, title, slug, combination_mode, created_at_ns, updated_at_ns)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(store_id)
        .bind(title)
        .bind(&slug)
        .bind(mode.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::info!("Created collection {} ({}) in store {}", slug, id, store_id);

        self.get_collection(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Collection not found after insert"))
    }

    pub async fn get_collection(&self, id: i64) -> Result<Option<Collection>> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {} FROM collections WHERE id = ?",
            COLLECTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Collection::try_from).transpose()
    }

    pub async fn list_collections(&self, store_slug: &str) -> Result<Vec<Collection>> {
        let store = self.require_store_by_slug(store_slug).await?;
        let rows = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {} FROM collections WHERE store_id = ? ORDER BY id",
            COLLECTION_COLUMNS
        ))
        .bind(store.id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Collection::try_from).collect()
    }

    pub async fn update_collection(
        &self,
        id: i64,
        owner_id: &str,
        update: CollectionUpdate,
    ) -> Result<Collection> {
        let current = self.require_collection_owner(id, owner_id).await?;

        let (title, slug) = match update.title.as_deref() {
            Some(title) => {
                let title = validate_title(title)?;
                let slug = self
                    .unique_collection_slug(current.store_id, title, Some(id))
                    .await?;
                (title.to_string(), slug)
            }
            None => (current.title, current.slug),
        };
        let mode = update.mode.unwrap_or(current.mode);

        sqlx::query(
            "UPDATE collections SET title = ?, slug = ?, combination_mode = ?, updated_at_ns = ? WHERE id = ?",
        )
        .bind(&title)
        .bind(&slug)
        .bind(mode.as_str())
        .bind(now_ns())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_collection(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Collection not found"))
    }

    /// Delete a collection together with its conditions
    pub async fn delete_collection(&self, id: i64, owner_id: &str) -> Result<()> {
        self.require_collection_owner(id, owner_id).await?;
        sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Validate and attach a condition to a collection. Invalid conditions
    /// fail with a [`storefront_common::ConditionError`] and are not stored.
    pub async fn add_condition(
        &self,
        collection_id: i64,
        owner_id: &str,
        condition: Condition,
    ) -> Result<StoredCondition> {
        self.require_collection_owner(collection_id, owner_id).await?;
        condition.validate()?;

        let id = sqlx::query(
            "INSERT INTO conditions (collection_id, field_reference, filter_type, field_val) VALUES (?, ?, ?, ?)",
        )
        .bind(collection_id)
        .bind(condition.field_reference.as_str())
        .bind(condition.filter_type.as_str())
        .bind(&condition.field_val)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(StoredCondition {
            id,
            collection_id,
            condition,
        })
    }

    pub async fn update_condition(
        &self,
        condition_id: i64,
        owner_id: &str,
        condition: Condition,
    ) -> Result<StoredCondition> {
        let stored = self.require_condition_owner(condition_id, owner_id).await?;
        condition.validate()?;

        sqlx::query(
            "UPDATE conditions SET field_reference = ?, filter_type = ?, field_val = ? WHERE id = ?",
        )
        .bind(condition.field_reference.as_str())
        .bind(condition.filter_type.as_str())
        .bind(&condition.field_val)
        .bind(condition_id)
        .execute(&self.pool)
        .await?;

        Ok(StoredCondition {
            id: condition_id,
            collection_id: stored.collection_id,
            condition,
        })
    }

    pub async fn delete_condition(&self, condition_id: i64, owner_id: &str) -> Result<()> {
        self.require_condition_owner(condition_id, owner_id).await?;
        sqlx::query("DELETE FROM conditions WHERE id = ?")
            .bind(condition_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_condition(&self, condition_id: i64) -> Result<Option<StoredCondition>> {
        let row = sqlx::query_as::<_, ConditionRow>(
            "SELECT id, collection_id, field_reference, filter_type, field_val FROM conditions WHERE id = ?",
        )
        .bind(condition_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredCondition::try_from).transpose()
    }

    /// Conditions of a collection ordered by field, then creation
    pub async fn list_conditions(&self, collection_id: i64) -> Result<Vec<StoredCondition>> {
        let rows = sqlx::query_as::<_, ConditionRow>(
            "SELECT id, collection_id, field_reference, filter_type, field_val FROM conditions
             WHERE collection_id = ? ORDER BY id",
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;

        let mut conditions = rows
            .into_iter()
            .map(StoredCondition::try_from)
            .collect::<Result<Vec<_>>>()?;
        conditions.sort_by_key(|c| (c.condition.field_reference, c.id));
        Ok(conditions)
    }

    pub async fn collection_rules(&self, collection: &Collection) -> Result<CollectionRules> {
        let conditions = self.list_conditions(collection.id).await?;
        let rules = CollectionRules::from_conditions(
            collection.mode,
            conditions.into_iter().map(|c| c.condition),
        )?;
        Ok(rules)
    }

    /// Visible products of the collection's store that satisfy its conditions
    pub async fn get_collection_products(&self, collection_id: i64, now_ns: i64) -> Result<Vec<Product>> {
        let collection = self
            .get_collection(collection_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Collection not found"))?;
        let rules = self.collection_rules(&collection).await?;

        get_matching_products(self, collection.store_id, &rules, now_ns).await
    }

    async fn require_collection_owner(&self, collection_id: i64, owner_id: &str) -> Result<Collection> {
        let collection = self
            .get_collection(collection_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Collection not found"))?;
        self.require_store_owner(collection.store_id, owner_id).await?;
        Ok(collection)
    }

    async fn require_condition_owner(&self, condition_id: i64, owner_id: &str) -> Result<StoredCondition> {
        let stored = self
            .get_condition(condition_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Condition not found"))?;
        self.require_collection_owner(stored.collection_id, owner_id)
            .await?;
        Ok(stored)
    }

    async fn unique_collection_slug(&self, store_id: i64, title: &str, exclude_id: Option<i64>) -> Result<String> {
        let base = slugify_or(title, "collection");
        for candidate in slug_candidates(&base) {
            let taken: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM collections WHERE store_id = ? AND slug = ? AND id != ?",
            )
            .bind(store_id)
            .bind(&candidate)
            .bind(exclude_id.unwrap_or(-1))
            .fetch_one(&self.pool)
            .await?;
            if taken == 0 {
                return Ok(candidate);
            }
        }
        bail!("No free slug for collection title {}", title)
    }
}

#[cfg(test)]
mod tests;

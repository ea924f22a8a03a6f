use super::types::Database;
use anyhow::{bail, Result};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, Object)]
pub struct ShippingAddress {
    pub id: i64,
    pub store_id: i64,
    pub user_id: String,
    pub company: String,
    pub address: String,
    pub suite: String,
    pub postal_code: String,
    pub telephone: String,
    /// City, region and country are slugs of the external place directory
    #[oai(skip_serializing_if_is_none)]
    pub city: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub state: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub country: Option<String>,
    pub created_at_ns: i64,
    pub updated_at_ns: i64,
}

/// Address fields as entered by the customer
#[derive(Debug, Clone, Default, Serialize, Deserialize, Object)]
pub struct NewShippingAddress {
    #[oai(default)]
    #[serde(default)]
    pub company: String,
    pub address: String,
    #[oai(default)]
    #[serde(default)]
    pub suite: String,
    #[oai(default)]
    #[serde(default)]
    pub postal_code: String,
    #[oai(default)]
    #[serde(default)]
    pub telephone: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl NewShippingAddress {
    fn normalized(mut self) -> Result<Self> {
        self.address = self.address.trim().to_string();
        if self.address.is_empty() {
            bail!("Shipping address cannot be empty");
        }
        self.company = self.company.trim().to_string();
        self.suite = self.suite.trim().to_string();
        self.postal_code = self.postal_code.trim().to_string();
        self.telephone = self.telephone.trim().to_string();
        Ok(self)
    }
}

const SHIPPING_COLUMNS: &str = "id, store_id, user_id, company, address, suite, postal_code, telephone,
     city, state, country, created_at_ns, updated_at_ns";

impl Database {
    pub async fn create_shipping_address(
        &self,
        store_slug: &str,
        user_id: &str,
        new: NewShippingAddress,
        now_ns: i64,
    ) -> Result<ShippingAddress> {
        let store = self.require_store_by_slug(store_slug).await?;
        let new = new.normalized()?;

        let id = sqlx::query(
            "INSERT INTO shipping_addresses
                (store_id, user_id, company, address, suite, postal_code, telephone,
                 city, state, country, created_at_ns, updated_at_ns)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(store.id)
        .bind(user_id)
        .bind(&new.company)
        .bind(&new.address)
        .bind(&new.suite)
        .bind(&new.postal_code)
        .bind(&new.telephone)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.country)
        .bind(now_ns)
        .bind(now_ns)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::debug!("Added shipping address {} for {} in store {}", id, user_id, store.slug);

        self.get_shipping_address(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Shipping address not found after insert"))
    }

    /// Replace the fields of a customer's address. The edited address becomes
    /// the active one.
    pub async fn update_shipping_address(
        &self,
        address_id: i64,
        user_id: &str,
        update: NewShippingAddress,
        now_ns: i64,
    ) -> Result<ShippingAddress> {
        let existing = self
            .get_shipping_address(address_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Shipping address not found"))?;
        if existing.user_id != user_id {
            bail!("Unauthorized: shipping address belongs to another customer");
        }
        let update = update.normalized()?;

        sqlx::query(
            "UPDATE shipping_addresses
             SET company = ?, address = ?, suite = ?, postal_code = ?, telephone = ?,
                 city = ?, state = ?, country = ?, updated_at_ns = ?
             WHERE id = ?",
        )
        .bind(&update.company)
        .bind(&update.address)
        .bind(&update.suite)
        .bind(&update.postal_code)
        .bind(&update.telephone)
        .bind(&update.city)
        .bind(&update.state)
        .bind(&update.country)
        .bind(now_ns)
        .bind(address_id)
        .execute(&self.pool)
        .await?;

        self.get_shipping_address(address_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Shipping address not found"))
    }

    pub async fn get_shipping_address(&self, address_id: i64) -> Result<Option<ShippingAddress>> {
        let address = sqlx::query_as::<_, ShippingAddress>(&format!(
            "SELECT {} FROM shipping_addresses WHERE id = ?",
            SHIPPING_COLUMNS
        ))
        .bind(address_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }

    /// Addresses of a store. With a customer, only theirs, most recently
    /// updated first; without one, every address in insertion order.
    pub async fn list_shipping_addresses(
        &self,
        store_slug: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ShippingAddress>> {
        let store = self.require_store_by_slug(store_slug).await?;

        let addresses = match user_id {
            Some(user_id) => {
                sqlx::query_as::<_, ShippingAddress>(&format!(
                    "SELECT {} FROM shipping_addresses
                     WHERE store_id = ? AND user_id = ?
                     ORDER BY updated_at_ns DESC, id DESC",
                    SHIPPING_COLUMNS
                ))
                .bind(store.id)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ShippingAddress>(&format!(
                    "SELECT {} FROM shipping_addresses WHERE store_id = ? ORDER BY id",
                    SHIPPING_COLUMNS
                ))
                .bind(store.id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(addresses)
    }

    /// The customer's most recently updated address in the store
    pub async fn get_active_shipping_address(
        &self,
        store_slug: &str,
        user_id: &str,
    ) -> Result<Option<ShippingAddress>> {
        let store = self.require_store_by_slug(store_slug).await?;
        let address = sqlx::query_as::<_, ShippingAddress>(&format!(
            "SELECT {} FROM shipping_addresses
             WHERE store_id = ? AND user_id = ?
             ORDER BY updated_at_ns DESC, id DESC
             LIMIT 1",
            SHIPPING_COLUMNS
        ))
        .bind(store.id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }
}

use super::core::{now_ns, NANOS_PER_DAY};
use super::types::Database;
use anyhow::{bail, Result};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use storefront_common::cart::{validate_quantity, CartError};
use storefront_common::money::{self, PricedLine, DEFAULT_CURRENCY};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct Cart {
    pub id: String,
    pub store_id: i64,
    #[oai(skip_serializing_if_is_none)]
    pub user_id: Option<String>,
    pub currency: String,
    pub amount_cents: i64,
    /// Amount rendered with two decimal places
    pub amount: String,
    pub is_active: bool,
    pub created_at_ns: i64,
    pub invalid_at_ns: i64,
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, Object)]
pub struct CartItem {
    pub id: i64,
    pub product_id: i64,
    pub title: String,
    pub note: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: String,
    store_id: i64,
    user_id: Option<String>,
    currency: String,
    amount_cents: i64,
    is_active: bool,
    created_at_ns: i64,
    invalid_at_ns: i64,
}

impl CartRow {
    fn into_cart(self, items: Vec<CartItem>) -> Cart {
        Cart {
            id: self.id,
            store_id: self.store_id,
            user_id: self.user_id,
            currency: self.currency,
            amount_cents: self.amount_cents,
            amount: money::format_cents(self.amount_cents),
            is_active: self.is_active,
            created_at_ns: self.created_at_ns,
            invalid_at_ns: self.invalid_at_ns,
            items,
        }
    }
}

const CART_COLUMNS: &str =
    "id, store_id, user_id, currency, amount_cents, is_active, created_at_ns, invalid_at_ns";

/// Load an active cart for modification
async fn load_active_cart(conn: &mut SqliteConnection, cart_id: &str) -> Result<CartRow> {
    let cart = sqlx::query_as::<_, CartRow>(&format!(
        "SELECT {} FROM carts WHERE id = ?",
        CART_COLUMNS
    ))
    .bind(cart_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| anyhow::anyhow!("Cart not found"))?;

    if !cart.is_active {
        return Err(CartError::Inactive(cart.id).into());
    }
    Ok(cart)
}

/// Recompute the cart amount from its lines
async fn refresh_cart_amount(conn: &mut SqliteConnection, cart_id: &str) -> Result<i64> {
    let lines: Vec<PricedLine> = sqlx::query_as::<_, (i64, i64)>(
        "SELECT price_cents, quantity FROM cart_items WHERE cart_id = ?",
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(price_cents, quantity)| PricedLine {
        price_cents,
        quantity,
    })
    .collect();

    let amount_cents = money::total_cents(&lines).ok_or(CartError::AmountOverflow)?;

    sqlx::query("UPDATE carts SET amount_cents = ?, updated_at_ns = ? WHERE id = ?")
        .bind(amount_cents)
        .bind(now_ns())
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    Ok(amount_cents)
}

impl Database {
    /// Open a cart in the store. Guest carts have no user.
    pub async fn create_cart(
        &self,
        store_slug: &str,
        user_id: Option<&str>,
        now_ns: i64,
        lifetime_days: i64,
    ) -> Result<Cart> {
        let store = self.require_store_by_slug(store_slug).await?;
        let id = Uuid::new_v4().to_string();
        let invalid_at_ns = now_ns.saturating_add(lifetime_days.saturating_mul(NANOS_PER_DAY));

        sqlx::query(
            "INSERT INTO carts (id, store_id, user_id, currency, amount_cents, is_active, created_at_ns, updated_at_ns, invalid_at_ns)
             VALUES (?, ?, ?, ?, 0, 1, ?, ?, ?)",
        )
        .bind(&id)
        .bind(store.id)
        .bind(user_id)
        .bind(DEFAULT_CURRENCY)
        .bind(now_ns)
        .bind(now_ns)
        .bind(invalid_at_ns)
        .execute(&self.pool)
        .await?;

        tracing::info!("Created cart {} in store {}", id, store.slug);

        self.get_cart(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Cart not found after insert"))
    }

    pub async fn get_cart(&self, cart_id: &str) -> Result<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {} FROM carts WHERE id = ?",
            CART_COLUMNS
        ))
        .bind(cart_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = self.get_cart_items(cart_id).await?;
        Ok(Some(row.into_cart(items)))
    }

    pub async fn get_cart_items(&self, cart_id: &str) -> Result<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT ci.id, ci.product_id, p.title, ci.note, ci.quantity, ci.price_cents,
                    ci.quantity * ci.price_cents AS total_cents
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.cart_id = ?
             ORDER BY ci.id",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Add `quantity` of a product to the cart. A product already in the cart
    /// has its line quantity increased; a new line records the product's
    /// current price. A non-empty `note` replaces the line note.
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        product_id: i64,
        quantity: i64,
        note: &str,
    ) -> Result<Cart> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;
        let cart = load_active_cart(&mut tx, cart_id).await?;

        let (product_store_id, price_cents): (i64, i64) =
            sqlx::query_as("SELECT store_id, price_cents FROM products WHERE id = ?")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Product not found"))?;
        if product_store_id != cart.store_id {
            return Err(CartError::ForeignProduct { product_id }.into());
        }

        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, note, quantity, price_cents)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (cart_id, product_id) DO UPDATE SET
                 quantity = cart_items.quantity + excluded.quantity,
                 note = CASE WHEN excluded.note = '' THEN cart_items.note ELSE excluded.note END",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(note.trim())
        .bind(quantity)
        .bind(price_cents)
        .execute(&mut *tx)
        .await?;

        let amount_cents = refresh_cart_amount(&mut tx, cart_id).await?;
        tx.commit().await?;

        tracing::debug!(
            "Cart {}: added {} x product {}, amount now {}",
            cart_id,
            quantity,
            product_id,
            money::format_cents(amount_cents)
        );

        self.get_cart(cart_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Cart not found"))
    }

    /// Remove a product's line from the cart
    pub async fn remove_from_cart(&self, cart_id: &str, product_id: i64) -> Result<Cart> {
        let mut tx = self.pool.begin().await?;
        load_active_cart(&mut tx, cart_id).await?;

        let removed = sqlx::query("DELETE FROM cart_items WHERE cart_id = ? AND product_id = ?")
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            bail!("Product {} is not in cart {}", product_id, cart_id);
        }

        refresh_cart_amount(&mut tx, cart_id).await?;
        tx.commit().await?;

        self.get_cart(cart_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Cart not found"))
    }

    /// Mark carts whose lifetime has ended as inactive. Returns the number of
    /// carts deactivated.
    pub async fn deactivate_expired_carts(&self, now_ns: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE carts SET is_active = 0, updated_at_ns = ? WHERE is_active = 1 AND invalid_at_ns <= ?",
        )
        .bind(now_ns)
        .bind(now_ns)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete every inactive cart with its lines. Orders placed from a deleted
    /// cart keep their items. Returns the number of carts deleted.
    pub async fn delete_inactive_carts(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM carts WHERE is_active = 0")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

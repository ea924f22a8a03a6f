use super::core::now_ns;
use super::types::Database;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use storefront_common::cart::CartError;
use storefront_common::money::{self, PricedLine};
use storefront_common::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub store_id: i64,
    pub user_id: String,
    pub cart_id: Option<String>,
    pub status: OrderStatus,
    pub currency: String,
    pub amount_cents: i64,
    pub discount_cents: i64,
    pub final_amount_cents: i64,
    pub created_at_ns: i64,
    pub updated_at_ns: i64,
    pub finished_at_ns: Option<i64>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub product_id: Option<i64>,
    pub title: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChange {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    pub actor_id: String,
    pub notes: String,
    pub created_at_ns: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    store_id: i64,
    user_id: String,
    cart_id: Option<String>,
    status: String,
    currency: String,
    amount_cents: i64,
    discount_cents: i64,
    final_amount_cents: i64,
    created_at_ns: i64,
    updated_at_ns: i64,
    finished_at_ns: Option<i64>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order> {
        Ok(Order {
            id: self.id,
            store_id: self.store_id,
            user_id: self.user_id,
            cart_id: self.cart_id,
            status: self.status.parse().map_err(anyhow::Error::msg)?,
            currency: self.currency,
            amount_cents: self.amount_cents,
            discount_cents: self.discount_cents,
            final_amount_cents: self.final_amount_cents,
            created_at_ns: self.created_at_ns,
            updated_at_ns: self.updated_at_ns,
            finished_at_ns: self.finished_at_ns,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusChangeRow {
    id: i64,
    order_id: i64,
    status: String,
    actor_id: String,
    notes: String,
    created_at_ns: i64,
}

const ORDER_COLUMNS: &str = "id, store_id, user_id, cart_id, status, currency, amount_cents, discount_cents, final_amount_cents, created_at_ns, updated_at_ns, finished_at_ns";

async fn record_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: OrderStatus,
    actor_id: &str,
    notes: &str,
    at_ns: i64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO order_status_history (order_id, status, actor_id, notes, created_at_ns) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(status.as_str())
    .bind(actor_id)
    .bind(notes)
    .bind(at_ns)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl Database {
    /// Turn an active cart into a pending order and retire the cart.
    pub async fn create_order_from_cart(&self, cart_id: &str, user_id: &str) -> Result<Order> {
        let now = now_ns();
        let mut tx = self.pool.begin().await?;

        let (store_id, cart_user, currency, is_active): (i64, Option<String>, String, bool) =
            sqlx::query_as("SELECT store_id, user_id, currency, is_active FROM carts WHERE id = ?")
                .bind(cart_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Cart not found"))?;
        if !is_active {
            return Err(CartError::Inactive(cart_id.to_string()).into());
        }
        if cart_user.as_deref().is_some_and(|owner| owner != user_id) {
            bail!("Unauthorized: cart {} belongs to another user", cart_id);
        }

        let lines: Vec<(i64, String, i64, i64)> = sqlx::query_as(
            "SELECT ci.product_id, p.title, ci.quantity, ci.price_cents
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.cart_id = ?
             ORDER BY ci.id",
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;
        if lines.is_empty() {
            return Err(CartError::Empty(cart_id.to_string()).into());
        }

        let priced: Vec<PricedLine> = lines
            .iter()
            .map(|(_, _, quantity, price_cents)| PricedLine {
                price_cents: *price_cents,
                quantity: *quantity,
            })
            .collect();
        let amount_cents = money::total_cents(&priced).ok_or(CartError::AmountOverflow)?;
        let discount_cents = 0;

        let order_id = sqlx::query(
            "INSERT INTO orders (store_id, user_id, cart_id, status, currency, amount_cents, discount_cents, final_amount_cents, created_at_ns, updated_at_ns)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(store_id)
        .bind(user_id)
        .bind(cart_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(&currency)
        .bind(amount_cents)
        .bind(discount_cents)
        .bind(amount_cents - discount_cents)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert order")?
        .last_insert_rowid();

        for ((product_id, title, quantity, price_cents), line) in lines.iter().zip(&priced) {
            let total_cents = line.total_cents().ok_or(CartError::AmountOverflow)?;
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, title, quantity, price_cents, total_cents)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(product_id)
            .bind(title)
            .bind(quantity)
            .bind(price_cents)
            .bind(total_cents)
            .execute(&mut *tx)
            .await?;
        }

        record_status(&mut tx, order_id, OrderStatus::Pending, user_id, "", now).await?;

        sqlx::query("UPDATE carts SET is_active = 0, updated_at_ns = ? WHERE id = ?")
            .bind(now)
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Order {} created from cart {} for {} ({} {})",
            order_id,
            cart_id,
            user_id,
            money::format_cents(amount_cents),
            currency
        );

        self.get_order(order_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Order not found after insert"))
    }

    /// Move an order to `status`, recording who did it. Closing an order
    /// stamps its finish time.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        actor_id: &str,
        status: OrderStatus,
        notes: &str,
    ) -> Result<Order> {
        let current = self
            .get_order(order_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Order not found"))?;
        let next = current.status.transition_to(status)?;
        let now = now_ns();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE orders SET status = ?, updated_at_ns = ?,
                 finished_at_ns = CASE WHEN ? THEN ? ELSE finished_at_ns END
             WHERE id = ? AND status = ?",
        )
        .bind(next.as_str())
        .bind(now)
        .bind(next.is_terminal())
        .bind(now)
        .bind(order_id)
        .bind(current.status.as_str())
        .execute(&mut *tx)
        .await?;
        record_status(&mut tx, order_id, next, actor_id, notes, now).await?;
        tx.commit().await?;

        tracing::info!(
            "Order {} moved from {} to {} by {}",
            order_id,
            current.status,
            next,
            actor_id
        );

        self.get_order(order_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Order not found"))
    }

    pub async fn get_order(&self, order_id: i64) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = ?",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.get_order_items(row.id).await?;
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    pub async fn get_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, product_id, title, quantity, price_cents, total_cents
             FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Orders placed in a store, newest first. Only the store owner may list them.
    pub async fn list_store_orders(&self, store_id: i64, owner_id: &str) -> Result<Vec<Order>> {
        self.require_store_owner(store_id, owner_id).await?;
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE store_id = ? ORDER BY created_at_ns DESC, id DESC",
            ORDER_COLUMNS
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        self.orders_with_items(rows).await
    }

    /// Orders placed by a user across all stores, newest first
    pub async fn list_user_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE user_id = ? ORDER BY created_at_ns DESC, id DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.orders_with_items(rows).await
    }

    pub async fn get_order_history(&self, order_id: i64) -> Result<Vec<OrderStatusChange>> {
        let rows = sqlx::query_as::<_, StatusChangeRow>(
            "SELECT id, order_id, status, actor_id, notes, created_at_ns
             FROM order_status_history WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderStatusChange {
                    id: row.id,
                    order_id: row.order_id,
                    status: row.status.parse().map_err(anyhow::Error::msg)?,
                    actor_id: row.actor_id,
                    notes: row.notes,
                    created_at_ns: row.created_at_ns,
                })
            })
            .collect()
    }

    async fn orders_with_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.get_order_items(row.id).await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests;

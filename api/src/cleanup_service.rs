use crate::database::{now_ns, Database};
use std::sync::Arc;
use std::time::Duration;

/// What a cart cleanup pass does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartCleanup {
    /// Deactivate carts whose lifetime has ended
    DeactivateExpired,
    /// Delete carts that are already inactive
    DeleteInactive,
}

/// Run one cleanup pass and return the number of carts affected
pub async fn clean_carts(database: &Database, mode: CartCleanup, now_ns: i64) -> anyhow::Result<u64> {
    let affected = match mode {
        CartCleanup::DeactivateExpired => database.deactivate_expired_carts(now_ns).await?,
        CartCleanup::DeleteInactive => database.delete_inactive_carts().await?,
    };

    match (mode, affected) {
        (_, 0) => tracing::debug!("No carts to clean up ({:?})", mode),
        (CartCleanup::DeactivateExpired, n) => tracing::info!("Deactivated {} expired carts", n),
        (CartCleanup::DeleteInactive, n) => tracing::info!("Deleted {} inactive carts", n),
    }

    Ok(affected)
}

/// Background service that periodically deactivates expired carts
pub struct CartCleanupService {
    database: Arc<Database>,
    interval: Duration,
}

impl CartCleanupService {
    pub fn new(database: Arc<Database>, interval_hours: u64) -> Self {
        Self {
            database,
            interval: Duration::from_secs(interval_hours * 60 * 60),
        }
    }

    /// Run the cleanup service indefinitely
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);

        // Run initial cleanup immediately on startup
        if let Err(e) = self.cleanup_once().await {
            tracing::error!("Initial cart cleanup failed: {:#}", e);
        }

        loop {
            interval.tick().await;
            if let Err(e) = self.cleanup_once().await {
                tracing::error!("Cart cleanup failed: {:#}", e);
            }
        }
    }

    async fn cleanup_once(&self) -> anyhow::Result<u64> {
        clean_carts(&self.database, CartCleanup::DeactivateExpired, now_ns()).await
    }
}

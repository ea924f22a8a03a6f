/// Default database URL for local development
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./storefront.db?mode=rwc";

pub mod carts;
pub mod catalog;
pub mod collections;
pub mod core;
pub mod orders;
pub mod products;
pub mod shipping;
pub mod stores;
pub mod types;

// Re-export main types
pub use self::core::{now_ns, NANOS_PER_DAY};
pub use carts::{Cart, CartItem};
pub use collections::{Collection, CollectionUpdate, StoredCondition};
pub use orders::{Order, OrderItem, OrderStatusChange};
pub use products::{NewProduct, Product, ProductMedia, ProductType, ProductUpdate};
pub use shipping::{NewShippingAddress, ShippingAddress};
pub use stores::Store;
pub use types::Database;

#[cfg(test)]
pub mod test_helpers;

#[cfg(test)]
mod migration_tests;

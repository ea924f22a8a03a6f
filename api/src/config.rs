use crate::database::DEFAULT_DATABASE_URL;
use std::fmt::Display;
use std::str::FromStr;
use storefront_common::cart::DEFAULT_CART_LIFETIME_DAYS;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CART_CLEANUP_INTERVAL_HOURS: u64 = 1;

/// Server settings read from the environment (and `.env`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub cart_lifetime_days: i64,
    pub cart_cleanup_interval_hours: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            cart_lifetime_days: DEFAULT_CART_LIFETIME_DAYS,
            cart_cleanup_interval_hours: DEFAULT_CART_CLEANUP_INTERVAL_HOURS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            port: parse_or_default(&lookup, "PORT", defaults.port),
            cart_lifetime_days: parse_or_default(
                &lookup,
                "CART_LIFETIME_DAYS",
                defaults.cart_lifetime_days,
            ),
            cart_cleanup_interval_hours: parse_or_default(
                &lookup,
                "CART_CLEANUP_INTERVAL_HOURS",
                defaults.cart_cleanup_interval_hours,
            )
            .max(1),
        }
    }
}

fn parse_or_default<T: FromStr + Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value {:?}, using default {}", key, raw, default);
            default
        }),
    }
}

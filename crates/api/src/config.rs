//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use outbox::{PublisherConfig, RetryPolicy};
use saga::Tables;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL URL; the in-memory store is used when unset
/// - `ORDERS_TABLE_NAME`, `TRANSACTIONS_TABLE_NAME`,
///   `INTEGRATION_EVENTS_TABLE_NAME` — table names
/// - `INTEGRATION_EVENTS_EVENT_BUS` — bus name (default: `"integration-events"`)
/// - `INTEGRATION_EVENTS_SOURCE` — source tag (default: `"order-service"`)
/// - `PUBLISH_MAX_RETRIES`, `PUBLISH_BASE_DELAY_MS`, `PUBLISH_MAX_DELAY_MS` —
///   delivery retry policy (defaults: `5`, `1000`, `5000`)
/// - `PUBLISH_MAX_CONCURRENCY` — entries delivered at once (default: `16`)
/// - `OUTBOX_STALE_CLAIM_SECS` — age after which a relay pass releases an
///   `IN_PROGRESS` claim (default: `300`)
/// - `DEFAULT_CREDIT_LIMIT` — credit granted to every customer (default: `1000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub orders_table: String,
    pub transactions_table: String,
    pub integration_events_table: String,
    pub event_bus: String,
    pub event_source: String,
    pub publish_max_retries: u32,
    pub publish_base_delay_ms: u64,
    pub publish_max_delay_ms: u64,
    pub publish_max_concurrency: usize,
    pub stale_claim_secs: u64,
    pub default_credit_limit: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        Self {
            host: string("HOST", defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            log_level: string("RUST_LOG", defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            orders_table: string("ORDERS_TABLE_NAME", defaults.orders_table),
            transactions_table: string("TRANSACTIONS_TABLE_NAME", defaults.transactions_table),
            integration_events_table: string(
                "INTEGRATION_EVENTS_TABLE_NAME",
                defaults.integration_events_table,
            ),
            event_bus: string("INTEGRATION_EVENTS_EVENT_BUS", defaults.event_bus),
            event_source: string("INTEGRATION_EVENTS_SOURCE", defaults.event_source),
            publish_max_retries: parse_or(&lookup, "PUBLISH_MAX_RETRIES", defaults.publish_max_retries),
            publish_base_delay_ms: parse_or(
                &lookup,
                "PUBLISH_BASE_DELAY_MS",
                defaults.publish_base_delay_ms,
            ),
            publish_max_delay_ms: parse_or(
                &lookup,
                "PUBLISH_MAX_DELAY_MS",
                defaults.publish_max_delay_ms,
            ),
            publish_max_concurrency: parse_or(
                &lookup,
                "PUBLISH_MAX_CONCURRENCY",
                defaults.publish_max_concurrency,
            ),
            stale_claim_secs: parse_or(&lookup, "OUTBOX_STALE_CLAIM_SECS", defaults.stale_claim_secs),
            default_credit_limit: parse_or(
                &lookup,
                "DEFAULT_CREDIT_LIMIT",
                defaults.default_credit_limit,
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the configured table names.
    pub fn tables(&self) -> Tables {
        Tables {
            orders: self.orders_table.clone(),
            transactions: self.transactions_table.clone(),
            integration_events: self.integration_events_table.clone(),
        }
    }

    /// Returns the publisher settings.
    pub fn publisher(&self) -> PublisherConfig {
        PublisherConfig {
            source: self.event_source.clone(),
            retry: RetryPolicy::new(
                self.publish_max_retries,
                Duration::from_millis(self.publish_base_delay_ms),
                Duration::from_millis(self.publish_max_delay_ms),
            ),
            max_concurrency: self.publish_max_concurrency,
        }
    }

    /// Returns the age after which an `IN_PROGRESS` claim counts as stale.
    pub fn stale_claim_age(&self) -> Duration {
        Duration::from_secs(self.stale_claim_secs)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable configuration value");
            default
        }),
        None => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        let tables = Tables::default();
        let publisher = PublisherConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            orders_table: tables.orders,
            transactions_table: tables.transactions,
            integration_events_table: tables.integration_events,
            event_bus: "integration-events".to_string(),
            event_source: publisher.source,
            publish_max_retries: publisher.retry.max_retries,
            publish_base_delay_ms: publisher.retry.base_delay.as_millis() as u64,
            publish_max_delay_ms: publisher.retry.max_delay.as_millis() as u64,
            publish_max_concurrency: publisher.max_concurrency,
            stale_claim_secs: 300,
            default_credit_limit: 1000,
        }
    }
}

//! Transactional item store.
//!
//! The store is the single persistence capability the outbox core relies on:
//! - atomic, all-or-nothing batches of conditional writes ([`TransactionalStore::transact`])
//! - point lookup by table and id
//! - equality scans over top-level document fields
//!
//! Two backends are provided: [`InMemoryStore`] for tests and local runs, and
//! [`PostgresStore`] which keeps every table in one JSONB `items` table.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;
pub mod version;
pub mod write;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::ScanFilter;
pub use store::{TransactionalStore, TransactionalStoreExt};
pub use version::Version;
pub use write::{Condition, FieldChange, WriteAction, WriteOp};

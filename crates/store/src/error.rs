use thiserror::Error;

/// Errors that can occur when interacting with the item store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A precondition of one operation in the batch did not hold.
    /// Nothing in the batch was applied.
    #[error("Condition failed for {table}/{id} (operation {index} in batch)")]
    ConditionFailed {
        table: String,
        id: String,
        index: usize,
    },

    /// The batch itself was malformed (e.g. two operations on one item).
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// The backend rejected the request for a reason other than a condition.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if this error is a failed write precondition.
    pub fn is_condition_failed(&self) -> bool {
        matches!(self, StoreError::ConditionFailed { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

//! Table names used by the saga.

/// Names of the tables the saga reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub orders: String,
    pub transactions: String,
    pub integration_events: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            orders: "orders".to_string(),
            transactions: "transactions".to_string(),
            integration_events: "integration-events".to_string(),
        }
    }
}

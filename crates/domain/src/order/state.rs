//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──┬──► Created    (credit reserved)
///           └──► Rejected   (credit denied)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed, awaiting the credit reservation outcome.
    #[default]
    Pending,

    /// Credit was reserved (terminal state).
    Created,

    /// Credit was denied (terminal state).
    Rejected,
}

impl OrderStatus {
    /// Returns true if a reservation outcome can still be applied.
    pub fn can_resolve(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::Rejected)
    }

    /// Returns the status an outcome resolves a pending order to.
    pub fn resolved(is_credit_reserved: bool) -> Self {
        if is_credit_reserved {
            OrderStatus::Created
        } else {
            OrderStatus::Rejected
        }
    }

    /// Returns the stored status tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Created => "CREATED",
            OrderStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_only_pending_can_resolve() {
        assert!(OrderStatus::Pending.can_resolve());
        assert!(!OrderStatus::Created.can_resolve());
        assert!(!OrderStatus::Rejected.can_resolve());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Created.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_resolved() {
        assert_eq!(OrderStatus::resolved(true), OrderStatus::Created);
        assert_eq!(OrderStatus::resolved(false), OrderStatus::Rejected);
    }

    #[test]
    fn test_serialization_uses_stored_tags() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        let status: OrderStatus = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(status, OrderStatus::Rejected);
        assert_eq!(OrderStatus::Created.to_string(), "CREATED");
    }
}

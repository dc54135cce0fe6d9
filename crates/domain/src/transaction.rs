//! Credit transaction entity.

use common::EntityId;
use serde::{Deserialize, Serialize};
use store::{FieldChange, Version};

use crate::entity::Entity;
use crate::order::{CustomerId, Money};

/// Direction of a credit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Income,
    Outcome,
}

/// A credit movement recorded against a customer for an order.
///
/// Written only when credit is reserved and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: EntityId,
    pub version: Version,
    pub amount: Money,
    pub customer_id: CustomerId,
    pub order_id: EntityId,
    pub kind: TransactionKind,
}

impl Transaction {
    /// Records credit reserved (spent) for an order.
    pub fn outcome(order_id: EntityId, customer_id: CustomerId, amount: Money) -> Self {
        Self {
            id: EntityId::new(),
            version: Version::first(),
            amount,
            customer_id,
            order_id,
            kind: TransactionKind::Outcome,
        }
    }
}

impl Entity for Transaction {
    const KIND: &'static str = "Transaction";
    const UPDATABLE_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn changes(&self) -> Vec<FieldChange> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_transaction_serializes_with_stored_names() {
        let tx = Transaction {
            id: EntityId::from("t1"),
            version: Version::first(),
            amount: Money::new(40),
            customer_id: CustomerId::new("c1"),
            order_id: EntityId::from("o1"),
            kind: TransactionKind::Outcome,
        };
        assert_eq!(
            serde_json::to_value(&tx).unwrap(),
            json!({
                "id": "t1",
                "version": 1,
                "amount": 40,
                "customerId": "c1",
                "orderId": "o1",
                "kind": "OUTCOME"
            })
        );
    }

    #[test]
    fn outcome_constructor() {
        let tx = Transaction::outcome(EntityId::from("o1"), CustomerId::new("c1"), Money::new(10));
        assert_eq!(tx.kind, TransactionKind::Outcome);
        assert_eq!(tx.version, Version::first());
        assert!(Transaction::UPDATABLE_FIELDS.is_empty());
    }
}

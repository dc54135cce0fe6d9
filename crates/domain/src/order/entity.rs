use common::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::{FieldChange, Version};

use super::{CustomerId, Money, OrderError, OrderStatus};
use crate::entity::Entity;

/// A customer order.
///
/// Orders are placed `PENDING` and resolved exactly once to `CREATED` or
/// `REJECTED` by the reservation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: EntityId,
    pub version: Version,
    pub amount: Money,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
}

impl Order {
    /// Places a new pending order with a fresh id.
    pub fn place(customer_id: CustomerId, amount: Money) -> Result<Self, OrderError> {
        if customer_id.is_blank() {
            return Err(OrderError::CustomerIdRequired);
        }
        if !amount.is_positive() {
            return Err(OrderError::InvalidAmount { amount });
        }

        Ok(Self {
            id: EntityId::new(),
            version: Version::first(),
            amount,
            customer_id,
            status: OrderStatus::Pending,
        })
    }

    /// Applies a credit reservation outcome to a pending order.
    pub fn resolve(&mut self, is_credit_reserved: bool) -> Result<OrderStatus, OrderError> {
        if !self.status.can_resolve() {
            return Err(OrderError::InvalidStatusTransition {
                current_status: self.status,
                action: "resolve",
            });
        }
        self.status = OrderStatus::resolved(is_credit_reserved);
        Ok(self.status)
    }
}

impl Entity for Order {
    const KIND: &'static str = "Order";
    const UPDATABLE_FIELDS: &'static [&'static str] = &["amount", "customerId", "status"];

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
        vec![
            FieldChange::new("amount", Value::from(self.amount)),
            FieldChange::new("customerId", Value::from(self.customer_id.as_str())),
            FieldChange::new("status", Value::from(self.status.as_str())),
        ]
    }
}

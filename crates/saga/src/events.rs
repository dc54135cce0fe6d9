//! Integration events emitted by the saga.

use common::EntityId;
use domain::{CustomerId, Money, Order};
use serde::{Deserialize, Serialize};

/// Emitted when a pending order has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub amount: Money,
    pub order_id: EntityId,
    pub customer_id: CustomerId,
}

impl OrderPlaced {
    pub const NAME: &'static str = "OrderPlaced";
}

impl From<&Order> for OrderPlaced {
    fn from(order: &Order) -> Self {
        Self {
            amount: order.amount,
            order_id: order.id.clone(),
            customer_id: order.customer_id.clone(),
        }
    }
}

/// Emitted after every credit check, whatever the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationOutcome {
    pub is_credit_reserved: bool,
    pub order_id: EntityId,
}

impl ReservationOutcome {
    pub const NAME: &'static str = "ReservationOutcome";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_placed_payload_shape() {
        let order = Order::place(CustomerId::new("c1"), Money::new(100)).unwrap();
        let payload = serde_json::to_value(OrderPlaced::from(&order)).unwrap();
        assert_eq!(
            payload,
            json!({"amount": 100, "orderId": order.id.as_str(), "customerId": "c1"})
        );
    }

    #[test]
    fn reservation_outcome_payload_shape() {
        let outcome = ReservationOutcome {
            is_credit_reserved: false,
            order_id: EntityId::from("o1"),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"isCreditReserved": false, "orderId": "o1"})
        );
    }
}

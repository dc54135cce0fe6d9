//! Credit service trait and implementations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::EntityId;
use domain::{CustomerId, DomainError, Money, OrderError};

use crate::error::SagaError;

/// Decides whether a customer's credit covers an order.
#[async_trait]
pub trait CreditService: Send + Sync {
    /// Attempts to reserve `amount` for the order.
    ///
    /// Returns whether credit was reserved. An error means no decision
    /// could be made.
    async fn reserve(
        &self,
        customer_id: &CustomerId,
        order_id: &EntityId,
        amount: Money,
    ) -> Result<bool, SagaError>;
}

#[async_trait]
impl<C: CreditService + ?Sized> CreditService for Arc<C> {
    async fn reserve(
        &self,
        customer_id: &CustomerId,
        order_id: &EntityId,
        amount: Money,
    ) -> Result<bool, SagaError> {
        (**self).reserve(customer_id, order_id, amount).await
    }
}

#[derive(Debug, Default)]
struct InMemoryCreditState {
    balances: HashMap<CustomerId, Money>,
    reservations: HashMap<EntityId, (CustomerId, Money)>,
    default_limit: Money,
    unavailable: bool,
}

/// In-memory credit ledger.
///
/// Every customer starts with the default limit. A reservation succeeds when
/// the available balance covers the amount and deducts it. Reserving again
/// for an order that already holds a reservation returns true without
/// deducting twice.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCreditService {
    state: Arc<RwLock<InMemoryCreditState>>,
}

impl InMemoryCreditService {
    /// Creates a ledger granting each customer `default_limit`.
    pub fn new(default_limit: Money) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryCreditState {
                default_limit,
                ..Default::default()
            })),
        }
    }

    /// Sets a customer's available balance.
    pub fn set_balance(&self, customer_id: CustomerId, balance: Money) {
        self.write().balances.insert(customer_id, balance);
    }

    /// Returns a customer's available balance.
    pub fn balance(&self, customer_id: &CustomerId) -> Money {
        let state = self.read();
        state
            .balances
            .get(customer_id)
            .copied()
            .unwrap_or(state.default_limit)
    }

    /// Makes every reservation fail with a service error while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.write().unavailable = unavailable;
    }

    /// Returns the number of orders holding a reservation.
    pub fn reservation_count(&self) -> usize {
        self.read().reservations.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryCreditState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryCreditState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CreditService for InMemoryCreditService {
    async fn reserve(
        &self,
        customer_id: &CustomerId,
        order_id: &EntityId,
        amount: Money,
    ) -> Result<bool, SagaError> {
        let mut state = self.write();

        if state.unavailable {
            return Err(SagaError::CreditService(
                "credit service unavailable".to_string(),
            ));
        }
        if state.reservations.contains_key(order_id) {
            return Ok(true);
        }

        if !amount.is_positive() {
            return Err(SagaError::Domain(DomainError::Order(
                OrderError::InvalidAmount { amount },
            )));
        }

        let available = state
            .balances
            .get(customer_id)
            .copied()
            .unwrap_or(state.default_limit);
        let Some(remaining) = available
            .checked_sub(amount)
            .filter(|remaining| *remaining >= Money::zero())
        else {
            tracing::info!(%customer_id, %order_id, %amount, %available, "credit denied");
            return Ok(false);
        };

        state.balances.insert(customer_id.clone(), remaining);
        state
            .reservations
            .insert(order_id.clone(), (customer_id.clone(), amount));
        Ok(true)
    }
}

/// Credit service that always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedCreditService {
    reserve: bool,
}

impl FixedCreditService {
    pub fn new(reserve: bool) -> Self {
        Self { reserve }
    }

    pub fn approving() -> Self {
        Self::new(true)
    }

    pub fn denying() -> Self {
        Self::new(false)
    }
}

#[async_trait]
impl CreditService for FixedCreditService {
    async fn reserve(
        &self,
        _customer_id: &CustomerId,
        _order_id: &EntityId,
        _amount: Money,
    ) -> Result<bool, SagaError> {
        Ok(self.reserve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reserve_deducts_balance() {
        let service = InMemoryCreditService::new(Money::new(100));
        let customer = CustomerId::new("c1");

        let reserved = service
            .reserve(&customer, &EntityId::new(), Money::new(60))
            .await
            .unwrap();
        assert!(reserved);
        assert_eq!(service.balance(&customer), Money::new(40));
        assert_eq!(service.reservation_count(), 1);
    }

    #[tokio::test]
    async fn test_reserve_rejects_non_positive_amounts() {
        let service = InMemoryCreditService::new(Money::new(100));
        let customer = CustomerId::new("c1");

        for amount in [Money::zero(), Money::new(-500), Money::new(i64::MIN)] {
            let err = service
                .reserve(&customer, &EntityId::new(), amount)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                SagaError::Domain(DomainError::Order(OrderError::InvalidAmount { .. }))
            ));
        }
        assert_eq!(service.balance(&customer), Money::new(100));
        assert_eq!(service.reservation_count(), 0);
    }

    #[tokio::test]
    async fn test_reserve_fractional_amount() {
        let service = InMemoryCreditService::new(Money::new(100));
        let customer = CustomerId::new("c1");
        let amount: Money = serde_json::from_str("12.5").unwrap();

        assert!(service.reserve(&customer, &EntityId::new(), amount).await.unwrap());
        let expected: Money = serde_json::from_str("87.5").unwrap();
        assert_eq!(service.balance(&customer), expected);
    }

    #[tokio::test]
    async fn test_reserve_denied_when_balance_too_low() {
        let service = InMemoryCreditService::new(Money::new(100));
        let customer = CustomerId::new("c1");

        service
            .reserve(&customer, &EntityId::new(), Money::new(60))
            .await
            .unwrap();
        let second = service
            .reserve(&customer, &EntityId::new(), Money::new(60))
            .await
            .unwrap();

        assert!(!second);
        assert_eq!(service.balance(&customer), Money::new(40));
    }

    #[tokio::test]
    async fn test_repeat_reservation_for_same_order_is_not_charged_twice() {
        let service = InMemoryCreditService::new(Money::new(100));
        let customer = CustomerId::new("c1");
        let order_id = EntityId::new();

        assert!(service.reserve(&customer, &order_id, Money::new(60)).await.unwrap());
        assert!(service.reserve(&customer, &order_id, Money::new(60)).await.unwrap());
        assert_eq!(service.balance(&customer), Money::new(40));
    }

    #[tokio::test]
    async fn test_explicit_balance_overrides_default_limit() {
        let service = InMemoryCreditService::new(Money::new(1000));
        let customer = CustomerId::new("c1");
        service.set_balance(customer.clone(), Money::new(5));

        let reserved = service
            .reserve(&customer, &EntityId::new(), Money::new(10))
            .await
            .unwrap();
        assert!(!reserved);
    }

    #[tokio::test]
    async fn test_unavailable_service_errors() {
        let service = InMemoryCreditService::new(Money::new(100));
        service.set_unavailable(true);

        let result = service
            .reserve(&CustomerId::new("c1"), &EntityId::new(), Money::new(1))
            .await;
        assert!(matches!(result, Err(SagaError::CreditService(_))));
        assert_eq!(service.reservation_count(), 0);
    }

    #[tokio::test]
    async fn test_fixed_service_answers_constantly() {
        let customer = CustomerId::new("c1");
        let order_id = EntityId::new();
        assert!(FixedCreditService::approving()
            .reserve(&customer, &order_id, Money::new(1_000_000))
            .await
            .unwrap());
        assert!(!FixedCreditService::denying()
            .reserve(&customer, &order_id, Money::new(1))
            .await
            .unwrap());
    }
}

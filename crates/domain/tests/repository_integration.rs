//! Integration tests for repositories and the unit of work.
//!
//! These tests verify version discipline across independent units of work
//! and the all-or-nothing behavior of multi-entity commits.

use common::EntityId;
use domain::{
    CustomerId, DomainError, Money, Order, OrderStatus, Repository, Transaction, TransactionKind,
    UnitOfWork,
};
use store::{InMemoryStore, Version};

const ORDERS: &str = "orders";
const TRANSACTIONS: &str = "transactions";

async fn place_order(store: &InMemoryStore) -> Order {
    let uow = UnitOfWork::new(store.clone());
    let orders = Repository::<Order, _>::new(ORDERS, &uow);
    let mut order = Order::place(CustomerId::new("c1"), Money::new(100)).unwrap();
    orders.add(&mut order).unwrap();
    uow.commit().await.unwrap();
    order
}

async fn load_order(store: &InMemoryStore, id: &EntityId) -> Option<Order> {
    let uow = UnitOfWork::new(store.clone());
    Repository::<Order, _>::new(ORDERS, &uow)
        .get(id)
        .await
        .unwrap()
}

mod optimistic_concurrency {
    use super::*;

    #[tokio::test]
    async fn racing_updates_yield_one_success_and_one_conflict() {
        let store = InMemoryStore::new();
        let placed = place_order(&store).await;

        // Both invocations read version 1 before either commits.
        let uow_a = UnitOfWork::new(store.clone());
        let uow_b = UnitOfWork::new(store.clone());
        let repo_a = Repository::<Order, _>::new(ORDERS, &uow_a);
        let repo_b = Repository::<Order, _>::new(ORDERS, &uow_b);

        let mut a = repo_a.get(&placed.id).await.unwrap().unwrap();
        let mut b = repo_b.get(&placed.id).await.unwrap().unwrap();
        a.resolve(true).unwrap();
        b.resolve(false).unwrap();
        repo_a.update(&mut a).unwrap();
        repo_b.update(&mut b).unwrap();

        let (ra, rb) = tokio::join!(uow_a.commit(), uow_b.commit());
        let results = [ra, rb];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::Conflict { .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);

        let stored = load_order(&store, &placed.id).await.unwrap();
        assert_eq!(stored.version, Version::new(2));
        assert!(stored.status.is_terminal());
    }

    #[tokio::test]
    async fn sequential_updates_advance_version_each_time() {
        let store = InMemoryStore::new();
        let placed = place_order(&store).await;

        for expected in 2..=4 {
            let uow = UnitOfWork::new(store.clone());
            let repo = Repository::<Order, _>::new(ORDERS, &uow);
            let mut order = repo.get(&placed.id).await.unwrap().unwrap();
            order.amount = order.amount.checked_add(Money::new(1)).expect("no overflow");
            repo.update(&mut order).unwrap();
            uow.commit().await.unwrap();

            let stored = load_order(&store, &placed.id).await.unwrap();
            assert_eq!(stored.version, Version::new(expected));
        }

        let stored = load_order(&store, &placed.id).await.unwrap();
        assert_eq!(stored.amount, Money::new(103));
        assert_eq!(stored.status, OrderStatus::Pending);
    }
}

mod atomic_commit {
    use super::*;

    #[tokio::test]
    async fn entities_across_tables_commit_together() {
        let store = InMemoryStore::new();
        let uow = UnitOfWork::new(store.clone());
        let orders = Repository::<Order, _>::new(ORDERS, &uow);
        let transactions = Repository::<Transaction, _>::new(TRANSACTIONS, &uow);

        let mut order = Order::place(CustomerId::new("c1"), Money::new(100)).unwrap();
        let mut tx = Transaction::outcome(order.id.clone(), order.customer_id.clone(), order.amount);
        orders.add(&mut order).unwrap();
        transactions.add(&mut tx).unwrap();
        assert_eq!(uow.pending(), 2);
        uow.commit().await.unwrap();

        assert_eq!(store.item_count(ORDERS).await, 1);
        assert_eq!(store.item_count(TRANSACTIONS).await, 1);

        let uow = UnitOfWork::new(store.clone());
        let stored = Repository::<Transaction, _>::new(TRANSACTIONS, &uow)
            .get(&tx.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.kind, TransactionKind::Outcome);
        assert_eq!(stored.order_id, order.id);
    }

    #[tokio::test]
    async fn conflict_on_one_entity_discards_the_other() {
        let store = InMemoryStore::new();
        let placed = place_order(&store).await;

        let uow = UnitOfWork::new(store.clone());
        let orders = Repository::<Order, _>::new(ORDERS, &uow);
        let transactions = Repository::<Transaction, _>::new(TRANSACTIONS, &uow);

        let mut tx = Transaction::outcome(placed.id.clone(), placed.customer_id.clone(), placed.amount);
        transactions.add(&mut tx).unwrap();

        let mut stale = placed.clone();
        stale.version = Version::new(9);
        orders.update(&mut stale).unwrap();

        assert!(uow.commit().await.unwrap_err().is_conflict());
        assert_eq!(store.item_count(TRANSACTIONS).await, 0);
    }

    #[tokio::test]
    async fn backend_failure_discards_everything() {
        let store = InMemoryStore::new();
        store.set_fail_on_transact(true);

        let uow = UnitOfWork::new(store.clone());
        let orders = Repository::<Order, _>::new(ORDERS, &uow);
        let mut order = Order::place(CustomerId::new("c1"), Money::new(100)).unwrap();
        orders.add(&mut order).unwrap();

        let err = uow.commit().await.unwrap_err();
        assert!(matches!(err, DomainError::Commit(_)));
        assert!(err.is_commit_failure());

        store.set_fail_on_transact(false);
        assert!(load_order(&store, &order.id).await.is_none());
    }
}

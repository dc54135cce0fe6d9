use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::{
    Result, ScanFilter, StoreError, WriteOp,
    store::{TransactionalStore, validate_batch},
};

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed item store.
///
/// Every logical table lives in the single `items` table. A batch runs in one
/// database transaction: each target row is locked with `SELECT ... FOR UPDATE`,
/// its conditions are evaluated, and the write is applied. Two concurrent
/// inserts of the same absent item are arbitrated by the primary key.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to the given database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn load_for_update(
        tx: &mut Transaction<'static, Postgres>,
        table: &str,
        id: &str,
    ) -> Result<Option<Value>> {
        let row = sqlx::query(
            "SELECT document FROM items WHERE table_name = $1 AND id = $2 FOR UPDATE",
        )
        .bind(table)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(|r| r.try_get::<Value, _>("document"))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn apply(
        tx: &mut Transaction<'static, Postgres>,
        op: &WriteOp,
        index: usize,
        document: Value,
        exists: bool,
    ) -> Result<()> {
        let result = if exists {
            sqlx::query(
                r#"
                UPDATE items SET document = $3, updated_at = NOW()
                WHERE table_name = $1 AND id = $2
                "#,
            )
            .bind(&op.table)
            .bind(&op.id)
            .bind(&document)
            .execute(&mut **tx)
            .await
        } else {
            sqlx::query("INSERT INTO items (table_name, id, document) VALUES ($1, $2, $3)")
                .bind(&op.table)
                .bind(&op.id)
                .bind(&document)
                .execute(&mut **tx)
                .await
        };

        result.map(|_| ()).map_err(|e| {
            // A concurrent transaction inserted the same item after our read.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
            {
                return StoreError::ConditionFailed {
                    table: op.table.clone(),
                    id: op.id.clone(),
                    index,
                };
            }
            StoreError::Database(e)
        })
    }
}

#[async_trait]
impl TransactionalStore for PostgresStore {
    async fn transact(&self, ops: Vec<WriteOp>) -> Result<()> {
        validate_batch(&ops)?;
        if ops.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for (index, op) in ops.iter().enumerate() {
            let current = Self::load_for_update(&mut tx, &op.table, &op.id).await?;

            if !op.preconditions_hold(current.as_ref()) {
                tracing::debug!(table = %op.table, id = %op.id, index, "write condition failed");
                metrics::counter!("store_condition_failures_total").increment(1);
                // Dropping the transaction rolls back every earlier write.
                return Err(StoreError::ConditionFailed {
                    table: op.table.clone(),
                    id: op.id.clone(),
                    index,
                });
            }

            let document = op.apply_to(current.as_ref());
            Self::apply(&mut tx, op, index, document, current.is_some()).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT document FROM items WHERE table_name = $1 AND id = $2")
            .bind(table)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<Value, _>("document"))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn scan(&self, table: &str, filter: &ScanFilter) -> Result<Vec<Value>> {
        let rows = sqlx::query(
            r#"
            SELECT document FROM items
            WHERE table_name = $1 AND document @> $2
            ORDER BY id ASC
            "#,
        )
        .bind(table)
        .bind(filter.as_json())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| r.try_get::<Value, _>("document").map_err(StoreError::from))
            .collect()
    }
}

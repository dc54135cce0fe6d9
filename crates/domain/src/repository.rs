//! Typed repository over one entity table.

use std::marker::PhantomData;

use common::EntityId;
use serde_json::Value;
use store::{FieldChange, TransactionalStore, WriteOp, write::VERSION_FIELD};

use crate::entity::Entity;
use crate::error::DomainError;
use crate::unit_of_work::UnitOfWork;

/// CRUD facade over one entity table, writing through a [`UnitOfWork`].
///
/// `add` and `update` only register operations; they take effect when the
/// unit of work commits. `get` reads the store directly and does not see
/// operations still pending in the unit of work (no read-your-own-writes
/// within one invocation).
pub struct Repository<'a, T, S>
where
    T: Entity,
    S: TransactionalStore,
{
    table: String,
    uow: &'a UnitOfWork<S>,
    _phantom: PhantomData<fn() -> T>,
}

impl<'a, T, S> Repository<'a, T, S>
where
    T: Entity,
    S: TransactionalStore,
{
    /// Creates a repository for the given table on a unit of work.
    pub fn new(table: impl Into<String>, uow: &'a UnitOfWork<S>) -> Self {
        Self {
            table: table.into(),
            uow,
            _phantom: PhantomData,
        }
    }

    /// Returns the backing table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Registers the insertion of a new entity.
    ///
    /// The version is forced to 1 regardless of what the caller supplied.
    /// The insert fails at commit if an item with the same id exists.
    #[tracing::instrument(skip(self, entity), fields(table = %self.table, id = %entity.id()))]
    pub fn add(&self, entity: &mut T) -> Result<(), DomainError> {
        entity.set_version(store::Version::first());
        let document = serde_json::to_value(&*entity)?;

        self.uow.register([WriteOp::insert(
            self.table.clone(),
            entity.id().as_str(),
            document,
        )]);
        Ok(())
    }

    /// Registers a versioned update of an existing entity.
    ///
    /// `entity.version()` must be the version the caller read. The write is
    /// conditioned on the stored version still being that value and sets
    /// the version to the next one; the entity is advanced accordingly. A
    /// lost race surfaces at commit as [`DomainError::Conflict`].
    #[tracing::instrument(skip(self, entity), fields(table = %self.table, id = %entity.id()))]
    pub fn update(&self, entity: &mut T) -> Result<(), DomainError> {
        if T::UPDATABLE_FIELDS.is_empty() {
            return Err(DomainError::Immutable { kind: T::KIND });
        }

        let expected = entity.version();
        let next = expected.next();

        let mut changes = entity.changes();
        changes.push(FieldChange::new(VERSION_FIELD, Value::from(next.as_i64())));

        self.uow.register([
            WriteOp::update(self.table.clone(), entity.id().as_str(), changes)
                .expect_version(expected),
        ]);
        entity.set_version(next);
        Ok(())
    }

    /// Looks up an entity by id.
    ///
    /// Returns None if no record exists.
    #[tracing::instrument(skip(self), fields(table = %self.table))]
    pub async fn get(&self, id: &EntityId) -> Result<Option<T>, DomainError> {
        match self.uow.store().get(&self.table, id.as_str()).await? {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }
}

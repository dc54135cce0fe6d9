//! Versioned entity trait.

use common::EntityId;
use serde::{Serialize, de::DeserializeOwned};
use store::{FieldChange, Version};

/// Trait for versioned records persisted through a [`Repository`](crate::Repository).
///
/// Entities carry an opaque id and a version used for optimistic concurrency.
/// Each entity type declares which fields an update may rewrite; updates are
/// compiled from that list into explicit [`FieldChange`] descriptors instead of
/// diffing arbitrary documents.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Entity kind name, used in logs and errors.
    const KIND: &'static str;

    /// Stored field names an update rewrites (the version is always written).
    ///
    /// An empty list marks the entity as immutable once created.
    const UPDATABLE_FIELDS: &'static [&'static str];

    /// Returns the entity's unique identifier.
    fn id(&self) -> &EntityId;

    /// Returns the version the caller last observed.
    fn version(&self) -> Version;

    /// Sets the entity version.
    fn set_version(&mut self, version: Version);

    /// Returns one field change per entry of [`UPDATABLE_FIELDS`](Self::UPDATABLE_FIELDS).
    fn changes(&self) -> Vec<FieldChange>;
}

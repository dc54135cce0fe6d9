//! Conditional write descriptors.

use serde_json::Value;

use crate::Version;

/// Name of the document field holding an entity's version.
pub const VERSION_FIELD: &str = "version";

/// A single top-level field assignment applied by an update.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub value: Value,
}

impl FieldChange {
    /// Creates a field change from a field name and a JSON value.
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// A precondition that must hold against the stored item for a write to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The item must not exist yet.
    NotExists,

    /// The stored `version` field must equal the given version.
    VersionEquals(Version),

    /// The stored top-level field must equal the given value.
    FieldEquals { field: String, value: Value },
}

impl Condition {
    /// Creates a field equality condition.
    pub fn field_equals(field: impl Into<String>, value: Value) -> Self {
        Condition::FieldEquals {
            field: field.into(),
            value,
        }
    }

    /// Evaluates this condition against the currently stored document, if any.
    pub fn holds(&self, current: Option<&Value>) -> bool {
        match self {
            Condition::NotExists => current.is_none(),
            Condition::VersionEquals(expected) => current
                .and_then(|doc| doc.get(VERSION_FIELD))
                .and_then(Value::as_i64)
                == Some(expected.as_i64()),
            Condition::FieldEquals { field, value } => {
                current.and_then(|doc| doc.get(field.as_str())) == Some(value)
            }
        }
    }
}

/// What a write does to its item.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteAction {
    /// Write the whole document, replacing any stored one.
    Put(Value),

    /// Assign the listed top-level fields of an existing document.
    Update(Vec<FieldChange>),
}

/// A conditional write against one item of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOp {
    pub table: String,
    pub id: String,
    pub action: WriteAction,
    pub conditions: Vec<Condition>,
}

impl WriteOp {
    /// Creates an insert that only succeeds if the item does not exist.
    pub fn insert(table: impl Into<String>, id: impl Into<String>, document: Value) -> Self {
        Self {
            table: table.into(),
            id: id.into(),
            action: WriteAction::Put(document),
            conditions: vec![Condition::NotExists],
        }
    }

    /// Creates an unconditional put.
    pub fn put(table: impl Into<String>, id: impl Into<String>, document: Value) -> Self {
        Self {
            table: table.into(),
            id: id.into(),
            action: WriteAction::Put(document),
            conditions: Vec::new(),
        }
    }

    /// Creates an update of an existing item.
    ///
    /// An update never creates an item; it fails its precondition when the
    /// item is absent.
    pub fn update(
        table: impl Into<String>,
        id: impl Into<String>,
        changes: Vec<FieldChange>,
    ) -> Self {
        Self {
            table: table.into(),
            id: id.into(),
            action: WriteAction::Update(changes),
            conditions: Vec::new(),
        }
    }

    /// Adds a precondition to this write.
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds a stored-version precondition to this write.
    pub fn expect_version(self, version: Version) -> Self {
        self.when(Condition::VersionEquals(version))
    }

    /// Returns true if every precondition holds against `current`.
    pub fn preconditions_hold(&self, current: Option<&Value>) -> bool {
        if matches!(self.action, WriteAction::Update(_)) && current.is_none() {
            return false;
        }
        self.conditions.iter().all(|c| c.holds(current))
    }

    /// Computes the document that results from applying this write to `current`.
    ///
    /// Callers must check [`preconditions_hold`](Self::preconditions_hold) first.
    pub fn apply_to(&self, current: Option<&Value>) -> Value {
        match &self.action {
            WriteAction::Put(document) => document.clone(),
            WriteAction::Update(changes) => {
                let mut document = current
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Default::default()));
                if let Value::Object(map) = &mut document {
                    for change in changes {
                        map.insert(change.field.clone(), change.value.clone());
                    }
                }
                document
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_requires_absence() {
        let op = WriteOp::insert("orders", "o1", json!({"id": "o1"}));
        assert!(op.preconditions_hold(None));
        assert!(!op.preconditions_hold(Some(&json!({"id": "o1"}))));
    }

    #[test]
    fn update_requires_existing_item_and_matching_version() {
        let op = WriteOp::update("orders", "o1", vec![FieldChange::new("status", json!("CREATED"))])
            .expect_version(Version::new(1));

        assert!(!op.preconditions_hold(None));
        assert!(!op.preconditions_hold(Some(&json!({"version": 2}))));
        assert!(op.preconditions_hold(Some(&json!({"version": 1}))));
    }

    #[test]
    fn update_merges_only_listed_fields() {
        let current = json!({"id": "o1", "amount": 100, "status": "PENDING", "version": 1});
        let op = WriteOp::update(
            "orders",
            "o1",
            vec![
                FieldChange::new("status", json!("REJECTED")),
                FieldChange::new(VERSION_FIELD, json!(2)),
            ],
        );

        let updated = op.apply_to(Some(&current));
        assert_eq!(
            updated,
            json!({"id": "o1", "amount": 100, "status": "REJECTED", "version": 2})
        );
    }

    #[test]
    fn field_equals_compares_json_values() {
        let condition = Condition::field_equals("status", json!("NOT_PUBLISHED"));
        assert!(condition.holds(Some(&json!({"status": "NOT_PUBLISHED"}))));
        assert!(!condition.holds(Some(&json!({"status": "IN_PROGRESS"}))));
        assert!(!condition.holds(None));
    }
}

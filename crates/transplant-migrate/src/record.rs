//! Source records fetched for copying.

use serde_json::Value;

use crate::EntityKind;

/// One source entity, as listed (or fetched in detail) from the source scope.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub identifier: String,
    pub name: String,
    /// Identifier of the parent record for kinds listed per parent.
    pub parent: Option<String>,
    /// The entity tree the create body is built from.
    pub entity: Value,
}

impl EntityRecord {
    /// Read a string field by JSON pointer, empty when absent.
    pub fn field(&self, pointer: &str) -> &str {
        self.entity
            .pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/*
 * condition.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Visibility conditions of schema groups and fields.
 */

use terra_id::FieldId;
use terra_value::Value;

use crate::group::Group;

/// "Available if field `field` holds `value`."
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: FieldId,
    value: Value,
}

impl Condition {
    pub fn new(field: impl Into<FieldId>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    pub fn field(&self) -> &FieldId {
        &self.field
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether `group` satisfies the condition. An absent field or an empty
    /// value never does.
    pub fn matches(&self, group: &Group) -> bool {
        group
            .field(&self.field)
            .and_then(|f| f.value())
            .is_some_and(|v| *v == self.value)
    }
}

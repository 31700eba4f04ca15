/*
 * actual.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A property value paired with the dataset value that overrides it.
 */

use serde_json::Value as Json;
use terra_value::{Value, ValueKind};

/// The literal value of a field together with the value its link resolved to.
///
/// Both sides are bound to `kind`; a side of another kind is dropped on
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueAndDatasetValue {
    kind: ValueKind,
    dataset_value: Option<Value>,
    property_value: Option<Value>,
}

impl ValueAndDatasetValue {
    pub fn new(
        kind: ValueKind,
        dataset_value: Option<Value>,
        property_value: Option<Value>,
    ) -> Self {
        Self {
            kind,
            dataset_value: dataset_value.filter(|v| v.kind() == kind),
            property_value: property_value.filter(|v| v.kind() == kind),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn dataset_value(&self) -> Option<&Value> {
        self.dataset_value.as_ref()
    }

    pub fn property_value(&self) -> Option<&Value> {
        self.property_value.as_ref()
    }

    /// The effective value: the dataset value when present, else the literal.
    pub fn value(&self) -> Option<&Value> {
        self.dataset_value.as_ref().or(self.property_value.as_ref())
    }

    pub fn interface(&self) -> Json {
        self.value().map_or(Json::Null, Value::interface)
    }
}

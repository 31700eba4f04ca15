/*
 * optional.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * A kind-bound value that may be absent.
 */

use serde_json::Value as Json;

use crate::ValueError;
use crate::kind::ValueKind;
use crate::value::Value;

/// A value slot bound to one [`ValueKind`].
///
/// Invariant: if a value is present, its kind equals the bound kind. Every
/// constructor and mutator upholds this; a rejected update leaves the slot
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalValue {
    kind: ValueKind,
    value: Option<Value>,
}

impl OptionalValue {
    /// Bind `kind` to `value`. Returns `None` if the value has another kind.
    pub fn new(kind: ValueKind, value: Option<Value>) -> Option<Self> {
        match &value {
            Some(v) if v.kind() != kind => None,
            _ => Some(Self { kind, value }),
        }
    }

    /// An empty slot of the given kind.
    pub fn empty(kind: ValueKind) -> Self {
        Self { kind, value: None }
    }

    /// A slot holding `value`, bound to the value's own kind.
    pub fn of(value: Value) -> Self {
        Self {
            kind: value.kind(),
            value: Some(value),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Replace the held value.
    ///
    /// Fails with [`ValueError::KindMismatch`] and leaves the slot untouched if
    /// `value` has a different kind.
    pub fn set_value(&mut self, value: Option<Value>) -> Result<(), ValueError> {
        if let Some(v) = &value
            && v.kind() != self.kind
        {
            return Err(ValueError::KindMismatch {
                expected: self.kind,
                got: v.kind(),
            });
        }
        self.value = value;
        Ok(())
    }

    /// Drop the held value, keeping the bound kind.
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Rebind to another kind, converting the value when possible.
    ///
    /// An empty slot always casts; a value that cannot be converted yields an
    /// empty slot of the new kind.
    pub fn cast(&self, kind: ValueKind) -> OptionalValue {
        OptionalValue {
            kind,
            value: self.value.as_ref().and_then(|v| v.cast(kind)),
        }
    }

    /// Generic representation of the held value, `null` when empty.
    pub fn interface(&self) -> Json {
        self.value.as_ref().map_or(Json::Null, Value::interface)
    }
}

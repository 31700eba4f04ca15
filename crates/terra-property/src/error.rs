/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for scene properties.
 */

use terra_dataset::LoadError;
use terra_id::{FieldId, SchemaGroupId, SchemaId};
use terra_value::ValueKind;
use thiserror::Error;

/// Who is at fault for an error.
///
/// The transport layer maps `Client` to a client-error response and `Server`
/// to a server-error response (logging the cause instead of exposing it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Server,
}

/// Errors raised by property builders, mutators and the loader-backed passes.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// A builder was not given an id.
    #[error("id is missing")]
    InvalidId,

    #[error("scene id is missing")]
    InvalidSceneId,

    /// The schema id is empty, or does not match the property's schema.
    #[error("invalid property schema id: '{0}'")]
    InvalidPropertySchemaId(SchemaId),

    /// An item violates a structural invariant of its container.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    #[error("field '{0}' is declared more than once")]
    DuplicatedField(FieldId),

    /// The schema group does not exist, or is declared twice.
    #[error("invalid schema group: '{0}'")]
    InvalidSchemaGroup(SchemaGroupId),

    /// The schema field rejects the value (kind, range or choice).
    #[error("invalid value for field '{field}'")]
    InvalidPropertyValue { field: FieldId },

    /// A field's bound kind differs from its schema field.
    #[error("field '{field}' is a {got} field but the schema declares {expected}")]
    InvalidPropertyType {
        field: FieldId,
        expected: ValueKind,
        got: ValueKind,
    },

    /// The dataset field at the end of a link is incompatible with the
    /// property field.
    #[error("cannot link field '{field}' to the dataset")]
    CannotLinkDataset { field: FieldId },

    /// The field does not exist in the schema, or the pointer names no field.
    #[error("invalid property field: '{0}'")]
    InvalidPropertyField(FieldId),

    #[error("invalid plugin manifest: {0}")]
    InvalidManifest(String),

    /// A dataset loader failed. The loader's error is kept as-is.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl PropertyError {
    /// Stable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            PropertyError::InvalidId => "P-1-10",
            PropertyError::InvalidSceneId => "P-1-11",
            PropertyError::InvalidPropertySchemaId(_) => "P-1-12",
            PropertyError::InvalidItem(_) => "P-1-13",
            PropertyError::DuplicatedField(_) => "P-1-14",
            PropertyError::InvalidSchemaGroup(_) => "P-1-15",
            PropertyError::InvalidPropertyValue { .. } => "P-2-10",
            PropertyError::InvalidPropertyType { .. } => "P-2-11",
            PropertyError::CannotLinkDataset { .. } => "P-2-12",
            PropertyError::InvalidPropertyField(_) => "P-2-13",
            PropertyError::InvalidManifest(_) => "P-3-10",
            PropertyError::Load(_) => "P-9-10",
        }
    }

    pub fn error_class(&self) -> ErrorClass {
        match self {
            PropertyError::Load(_) => ErrorClass::Server,
            _ => ErrorClass::Client,
        }
    }
}

/// Result type for property operations.
pub type Result<T> = std::result::Result<T, PropertyError>;

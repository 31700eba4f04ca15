/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Typed identifiers for properties, schemas and datasets.
 */

//! Typed identifiers for the scene property model.
//!
//! Two families of identifiers live here:
//!
//! - **Entity ids** ([`PropertyId`], [`ItemId`], [`SceneId`], [`DatasetId`],
//!   [`DatasetSchemaId`], [`DatasetFieldId`]) are time-ordered 128-bit ids.
//!   They are produced by an [`IdGenerator`] that the caller owns, so tests
//!   can inject a [`SequentialGenerator`] and get deterministic ids.
//! - **Declarative ids** ([`SchemaId`], [`SchemaGroupId`], [`FieldId`]) are
//!   names chosen by plugin authors in their manifests.
//!
//! # Example
//!
//! ```rust
//! use terra_id::{MonotonicGenerator, PropertyId};
//!
//! let generator = MonotonicGenerator::new();
//! let a = PropertyId::generate(&generator);
//! let b = PropertyId::generate(&generator);
//! assert!(a < b);
//! ```

mod entity;
mod generator;
mod name;

pub use entity::{DatasetFieldId, DatasetId, DatasetSchemaId, ItemId, PropertyId, SceneId};
pub use generator::{IdGenerator, MonotonicGenerator, SequentialGenerator};
pub use name::{FieldId, SchemaGroupId, SchemaId};

use thiserror::Error;

/// Errors produced while parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input is not a valid id of the requested kind.
    #[error("invalid {kind} id: '{input}'")]
    Invalid {
        /// Human-readable id kind (e.g. "dataset")
        kind: &'static str,
        /// The rejected input
        input: String,
    },
}

/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * External tabular datasets and traversal of the dataset reference graph.
 */

//! External tabular datasets.
//!
//! A [`DatasetSchema`] declares ordered, uniquely identified, typed fields. A
//! [`Dataset`] is one row conforming to a schema. Fields of kind `ref` point
//! at other datasets, which turns a set of rows into a graph (for instance,
//! relational tables imported from CSV).
//!
//! Datasets are immutable once built. They are fetched on demand through the
//! [`Loader`] and [`GraphLoader`] traits, which the persistence layer
//! implements. [`Map`] implements both without any I/O.
//!
//! # Traversal
//!
//! - [`Map::graph_search_by_fields`] follows a chain of field ids across
//!   references and returns the visited path plus the terminal field.
//! - [`GraphIterator`] walks references breadth-first up to a maximum depth
//!   and captures every visited dataset.

mod dataset;
mod graph;
mod loader;
mod map;
mod schema;

pub use dataset::{Dataset, DatasetBuilder, DatasetField};
pub use graph::{GraphIterator, traverse};
pub use loader::{GraphLoader, GraphSearch, LoadError, Loader};
pub use map::{List, Map, SchemaMap};
pub use schema::{DatasetSchema, DatasetSchemaBuilder, DatasetSchemaField};

pub use terra_id::{DatasetFieldId, DatasetId, DatasetSchemaId, SceneId};

use thiserror::Error;

/// Errors raised by dataset and dataset schema builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("dataset id is missing")]
    InvalidId,

    #[error("scene id is missing")]
    InvalidSceneId,

    #[error("dataset schema id is missing")]
    InvalidSchemaId,

    #[error("field '{0}' is declared more than once")]
    DuplicatedField(DatasetFieldId),

    #[error("representative field '{0}' is not declared by the schema")]
    InvalidRepresentativeField(DatasetFieldId),
}

/// Result type for dataset builders.
pub type Result<T> = std::result::Result<T, DatasetError>;

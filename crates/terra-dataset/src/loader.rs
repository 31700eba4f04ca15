/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Loader contracts through which datasets are fetched.
 */

//! Loader contracts.
//!
//! The persistence layer implements these traits; the property engine only
//! ever reaches datasets through them. "Not found" is never an error: a
//! [`Loader`] answers with `None` in that position, a [`GraphLoader`] with a
//! partial path and no field. [`LoadError`] is reserved for real I/O failures,
//! which abort whatever operation is in flight.
//!
//! Cancellation and timeouts belong to the implementation. Callers await one
//! loader call at a time and do not batch.

use async_trait::async_trait;
use terra_id::{DatasetFieldId, DatasetId};
use thiserror::Error;

use crate::dataset::{Dataset, DatasetField};
use crate::map::Map;

/// A failure of the storage behind a loader.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The backing store failed.
    #[error("dataset storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Any other loader failure.
    #[error("dataset loader error: {0}")]
    Other(String),
}

impl LoadError {
    /// Wrap a storage error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }

    /// Create an error from any message.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Positional dataset lookup.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load `ids`. The result has one entry per id, `None` where the dataset
    /// does not exist.
    async fn load(&self, ids: &[DatasetId]) -> Result<Vec<Option<Dataset>>, LoadError>;

    /// Load a single dataset.
    async fn load_one(&self, id: DatasetId) -> Result<Option<Dataset>, LoadError> {
        Ok(self.load(&[id]).await?.into_iter().next().flatten())
    }
}

/// Resolution of a field chain starting at a root dataset.
///
/// Same contract as [`Map::graph_search_by_fields`], possibly backed by
/// storage.
#[async_trait]
pub trait GraphLoader: Send + Sync {
    async fn load_graph(
        &self,
        root: DatasetId,
        fields: &[DatasetFieldId],
    ) -> Result<(Vec<Dataset>, Option<DatasetField>), LoadError>;
}

#[async_trait]
impl Loader for Map {
    async fn load(&self, ids: &[DatasetId]) -> Result<Vec<Option<Dataset>>, LoadError> {
        Ok(ids.iter().map(|id| self.get(*id).cloned()).collect())
    }
}

#[async_trait]
impl GraphLoader for Map {
    async fn load_graph(
        &self,
        root: DatasetId,
        fields: &[DatasetFieldId],
    ) -> Result<(Vec<Dataset>, Option<DatasetField>), LoadError> {
        let (path, field) = self.graph_search_by_fields(root, fields);
        Ok((
            path.into_iter().cloned().collect(),
            field.cloned(),
        ))
    }
}

/// Adapts a positional [`Loader`] into a [`GraphLoader`].
///
/// Issues exactly one loader call per hop, so a chain of `n` fields costs at
/// most `n` calls even when the data is cyclic.
#[derive(Debug, Clone)]
pub struct GraphSearch<L> {
    loader: L,
}

impl<L: Loader> GraphSearch<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn into_inner(self) -> L {
        self.loader
    }
}

#[async_trait]
impl<L: Loader> GraphLoader for GraphSearch<L> {
    async fn load_graph(
        &self,
        root: DatasetId,
        fields: &[DatasetFieldId],
    ) -> Result<(Vec<Dataset>, Option<DatasetField>), LoadError> {
        let mut path = Vec::with_capacity(fields.len());
        let mut current = root;

        for (i, field_id) in fields.iter().enumerate() {
            let Some(dataset) = self.loader.load_one(current).await? else {
                tracing::trace!(dataset = %current, "dataset not found during graph search");
                return Ok((path, None));
            };
            let field = dataset.field(*field_id).cloned();
            path.push(dataset);

            let Some(field) = field else {
                return Ok((path, None));
            };
            if i == fields.len() - 1 {
                return Ok((path, Some(field)));
            }
            match field.reference() {
                Some(next) => current = next,
                None => return Ok((path, None)),
            }
        }

        Ok((path, None))
    }
}

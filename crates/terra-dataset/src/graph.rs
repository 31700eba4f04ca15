/*
 * graph.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Bounded breadth-first traversal of dataset references.
 */

use terra_id::DatasetId;

use crate::dataset::Dataset;
use crate::loader::{LoadError, Loader};
use crate::map::Map;

/// Breadth-first walk over `ref` fields, starting at a root dataset.
///
/// The iterator does no I/O itself. The caller asks for the [`current`] id,
/// loads it, and hands the result to [`advance`]:
///
/// ```rust,ignore
/// let mut it = GraphIterator::new(root, 2);
/// while let Some(id) = it.current() {
///     let dataset = loader.load_one(id).await?;
///     it.advance(dataset);
/// }
/// let visited = it.into_map();
/// ```
///
/// The root is at depth 0; datasets referenced from depth `d` are visited at
/// depth `d + 1` as long as `d + 1 <= max_depth`. A `max_depth` of 0 visits
/// nothing. A level without further references ends the walk early. A dataset
/// is captured once even if the graph has cycles.
///
/// [`current`]: GraphIterator::current
/// [`advance`]: GraphIterator::advance
#[derive(Debug, Clone)]
pub struct GraphIterator {
    map: Map,
    level: Vec<DatasetId>,
    next_level: Vec<DatasetId>,
    index: usize,
    depth: usize,
    max_depth: usize,
    done: bool,
}

impl GraphIterator {
    pub fn new(root: DatasetId, max_depth: usize) -> Self {
        Self {
            map: Map::new(),
            level: vec![root],
            next_level: Vec::new(),
            index: 0,
            depth: 0,
            max_depth,
            done: max_depth == 0,
        }
    }

    /// The id to load next, or `None` when the walk is over.
    pub fn current(&self) -> Option<DatasetId> {
        if self.done {
            return None;
        }
        self.level.get(self.index).copied()
    }

    /// Record the dataset loaded for [`current`](Self::current) and move on.
    ///
    /// Pass `None` if the dataset does not exist; the walk continues with the
    /// remaining ids.
    pub fn advance(&mut self, loaded: Option<Dataset>) {
        if self.done {
            return;
        }

        if let Some(dataset) = loaded
            && !self.map.contains(dataset.id())
        {
            if self.depth < self.max_depth {
                self.next_level.extend(dataset.references());
            }
            self.map.insert(dataset);
        }

        self.index += 1;
        loop {
            while let Some(id) = self.level.get(self.index) {
                if !self.map.contains(*id) {
                    return;
                }
                self.index += 1;
            }

            // Current level exhausted.
            if self.depth >= self.max_depth || self.next_level.is_empty() {
                self.done = true;
                return;
            }
            self.level = std::mem::take(&mut self.next_level);
            self.index = 0;
            self.depth += 1;
        }
    }

    /// Depth of the id returned by [`current`](Self::current).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Datasets captured so far.
    pub fn result(&self) -> &Map {
        &self.map
    }

    pub fn into_map(self) -> Map {
        self.map
    }
}

/// Walk the reference graph from `root` through `loader`, up to `max_depth`.
pub async fn traverse<L: Loader + ?Sized>(
    loader: &L,
    root: DatasetId,
    max_depth: usize,
) -> Result<Map, LoadError> {
    let mut it = GraphIterator::new(root, max_depth);
    while let Some(id) = it.current() {
        let dataset = loader.load_one(id).await?;
        if dataset.is_none() {
            tracing::debug!(dataset = %id, depth = it.depth(), "referenced dataset not found");
        }
        it.advance(dataset);
    }
    Ok(it.into_map())
}

/*
 * map.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * In-memory collections of datasets and dataset schemas.
 */

use std::collections::HashMap;

use terra_id::{DatasetFieldId, DatasetId, DatasetSchemaId};

use crate::dataset::{Dataset, DatasetField};
use crate::schema::DatasetSchema;

/// Datasets indexed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map(HashMap<DatasetId, Dataset>);

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: Dataset) {
        self.0.insert(dataset.id(), dataset);
    }

    pub fn get(&self, id: DatasetId) -> Option<&Dataset> {
        self.0.get(&id)
    }

    pub fn contains(&self, id: DatasetId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.0.values()
    }

    /// Follow `fields` from `root`.
    ///
    /// Each field but the last must hold a reference to the next dataset. On
    /// success the visited datasets and the terminal field are returned. A
    /// missing dataset, a missing field or a non-reference hop ends the search
    /// early with the partial path and no field. The path never holds more
    /// than `fields.len()` datasets.
    pub fn graph_search_by_fields(
        &self,
        root: DatasetId,
        fields: &[DatasetFieldId],
    ) -> (Vec<&Dataset>, Option<&DatasetField>) {
        let mut path = Vec::with_capacity(fields.len());
        let mut current = root;

        for (i, field_id) in fields.iter().enumerate() {
            let Some(dataset) = self.get(current) else {
                return (path, None);
            };
            path.push(dataset);

            let Some(field) = dataset.field(*field_id) else {
                return (path, None);
            };
            if i == fields.len() - 1 {
                return (path, Some(field));
            }
            match field.reference() {
                Some(next) => current = next,
                None => return (path, None),
            }
        }

        (path, None)
    }
}

impl FromIterator<Dataset> for Map {
    fn from_iter<I: IntoIterator<Item = Dataset>>(iter: I) -> Self {
        Map(iter.into_iter().map(|d| (d.id(), d)).collect())
    }
}

impl Extend<Dataset> for Map {
    fn extend<I: IntoIterator<Item = Dataset>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(|d| (d.id(), d)));
    }
}

/// An ordered list of datasets, as returned by loaders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct List(Vec<Dataset>);

impl List {
    pub fn new(datasets: Vec<Dataset>) -> Self {
        List(datasets)
    }

    pub fn get(&self, id: DatasetId) -> Option<&Dataset> {
        self.0.iter().find(|d| d.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index by id. Later duplicates win.
    pub fn to_map(&self) -> Map {
        self.0.iter().cloned().collect()
    }

    pub fn into_inner(self) -> Vec<Dataset> {
        self.0
    }
}

impl From<Vec<Dataset>> for List {
    fn from(datasets: Vec<Dataset>) -> Self {
        List(datasets)
    }
}

/// Dataset schemas indexed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMap(HashMap<DatasetSchemaId, DatasetSchema>);

impl SchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema: DatasetSchema) {
        self.0.insert(schema.id(), schema);
    }

    pub fn get(&self, id: DatasetSchemaId) -> Option<&DatasetSchema> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<DatasetSchema> for SchemaMap {
    fn from_iter<I: IntoIterator<Item = DatasetSchema>>(iter: I) -> Self {
        SchemaMap(iter.into_iter().map(|s| (s.id(), s)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_id::{SceneId, SequentialGenerator};
    use terra_value::Value;

    struct Fixture {
        map: Map,
        a: DatasetId,
        b: DatasetId,
        next: DatasetFieldId,
        label: DatasetFieldId,
    }

    /// `a.next -> b`, `b.next -> a` (a cycle), each with a `label`.
    fn fixture() -> Fixture {
        let g = SequentialGenerator::new();
        let scene = SceneId::generate(&g);
        let schema = DatasetSchemaId::generate(&g);
        let (next, label) = (DatasetFieldId::generate(&g), DatasetFieldId::generate(&g));
        let (a, b) = (DatasetId::generate(&g), DatasetId::generate(&g));
        let row = |id: DatasetId, to: DatasetId, text: &str| {
            Dataset::builder()
                .id(id)
                .scene(scene)
                .schema(schema)
                .fields(vec![
                    DatasetField::new(next, Value::reference(to)),
                    DatasetField::new(label, Value::from(text)),
                ])
                .must_build()
        };
        let map = [row(a, b, "A"), row(b, a, "B")].into_iter().collect();
        Fixture {
            map,
            a,
            b,
            next,
            label,
        }
    }

    #[test]
    fn test_search_single_field() {
        let f = fixture();
        let (path, field) = f.map.graph_search_by_fields(f.a, &[f.label]);
        assert_eq!(path.len(), 1);
        assert_eq!(field.unwrap().value(), &Value::from("A"));
    }

    #[test]
    fn test_search_follows_references() {
        let f = fixture();
        let (path, field) = f.map.graph_search_by_fields(f.a, &[f.next, f.label]);
        assert_eq!(path.iter().map(|d| d.id()).collect::<Vec<_>>(), vec![f.a, f.b]);
        assert_eq!(field.unwrap().value(), &Value::from("B"));
    }

    #[test]
    fn test_search_terminates_on_cycles() {
        let f = fixture();
        let fields = [f.next, f.next, f.next, f.next, f.label];
        let (path, field) = f.map.graph_search_by_fields(f.a, &fields);
        assert_eq!(path.len(), fields.len());
        assert_eq!(field.unwrap().value(), &Value::from("A"));
    }

    #[test]
    fn test_search_misses() {
        let f = fixture();
        let g = SequentialGenerator::starting_at(1000);

        // Unknown root
        let (path, field) = f.map.graph_search_by_fields(DatasetId::generate(&g), &[f.label]);
        assert!(path.is_empty());
        assert!(field.is_none());

        // Non-reference hop
        let (path, field) = f.map.graph_search_by_fields(f.a, &[f.label, f.label]);
        assert_eq!(path.len(), 1);
        assert!(field.is_none());

        // Unknown field
        let (path, field) = f
            .map
            .graph_search_by_fields(f.a, &[DatasetFieldId::generate(&g)]);
        assert_eq!(path.len(), 1);
        assert!(field.is_none());

        // No fields at all
        let (path, field) = f.map.graph_search_by_fields(f.a, &[]);
        assert!(path.is_empty());
        assert!(field.is_none());
    }

    #[test]
    fn test_list_to_map() {
        let f = fixture();
        let list = List::new(f.map.iter().cloned().collect());
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_map(), f.map);
        assert!(list.get(f.b).is_some());
    }
}

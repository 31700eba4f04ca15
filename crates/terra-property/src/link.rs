/*
 * link.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Chains of links from property fields into the dataset graph.
 */

use serde::{Deserialize, Serialize};
use terra_dataset::{GraphLoader, LoadError, Map, SchemaMap};
use terra_id::{DatasetFieldId, DatasetId, DatasetSchemaId};
use terra_value::{Value, ValueKind};

/// One hop of a link chain: a field of a dataset schema, optionally pinned to
/// a concrete dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dataset: Option<DatasetId>,
    schema: DatasetSchemaId,
    field: DatasetFieldId,
}

impl Link {
    pub fn new(dataset: DatasetId, schema: DatasetSchemaId, field: DatasetFieldId) -> Self {
        Self {
            dataset: Some(dataset),
            schema,
            field,
        }
    }

    /// A hop that names only the schema field. It is bound to a dataset later,
    /// when the property is merged against a linked dataset.
    pub fn schema_only(schema: DatasetSchemaId, field: DatasetFieldId) -> Self {
        Self {
            dataset: None,
            schema,
            field,
        }
    }

    pub fn dataset(&self) -> Option<DatasetId> {
        self.dataset
    }

    pub fn schema(&self) -> DatasetSchemaId {
        self.schema
    }

    pub fn field(&self) -> DatasetFieldId {
        self.field
    }

    pub fn is_bound(&self) -> bool {
        self.dataset.is_some()
    }

    /// Fill the dataset slot if it is empty.
    pub fn apply_dataset(&self, dataset: Option<DatasetId>) -> Link {
        Link {
            dataset: self.dataset.or(dataset),
            ..*self
        }
    }

    /// The linked value, read from `datasets` without following references.
    pub fn value<'a>(&self, datasets: &'a Map) -> Option<&'a Value> {
        let ds = datasets.get(self.dataset?)?;
        ds.field(self.field).map(|f| f.value())
    }
}

/// An ordered chain of [`Link`]s.
///
/// Every hop but the last names a reference field whose value is the dataset
/// of the next hop. Only the first hop may be unbound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(Vec<Link>);

impl Links {
    /// Build a chain. Returns `None` if a hop other than the first is unbound.
    pub fn new(links: Vec<Link>) -> Option<Self> {
        if links.iter().skip(1).any(|l| !l.is_bound()) {
            return None;
        }
        Some(Self(links))
    }

    pub fn single(link: Link) -> Self {
        Self(vec![link])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.0.iter()
    }

    pub fn links(&self) -> &[Link] {
        &self.0
    }

    pub fn first(&self) -> Option<&Link> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Link> {
        self.0.last()
    }

    /// Whether every hop is bound to a dataset.
    pub fn is_linked_fully(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(Link::is_bound)
    }

    pub fn datasets(&self) -> Vec<DatasetId> {
        self.0.iter().filter_map(|l| l.dataset).collect()
    }

    pub fn dataset_schemas(&self) -> Vec<DatasetSchemaId> {
        self.0.iter().map(|l| l.schema).collect()
    }

    pub fn dataset_schema_field_ids(&self) -> Vec<DatasetFieldId> {
        self.0.iter().map(|l| l.field).collect()
    }

    pub fn has_dataset(&self, id: DatasetId) -> bool {
        self.0.iter().any(|l| l.dataset == Some(id))
    }

    pub fn has_schema(&self, id: DatasetSchemaId) -> bool {
        self.0.iter().any(|l| l.schema == id)
    }

    pub fn has_schema_and_dataset(&self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        self.0
            .iter()
            .any(|l| l.schema == schema && l.dataset == Some(dataset))
    }

    /// Bind the first hop to `dataset` if it is unbound.
    pub fn apply_dataset(&self, dataset: Option<DatasetId>) -> Links {
        let mut links = self.0.clone();
        if let Some(first) = links.first_mut() {
            *first = first.apply_dataset(dataset);
        }
        Links(links)
    }

    /// Whether the chain is consistent with the given schemas and datasets.
    ///
    /// Every hop's schema must be known and declare the hop's field, every
    /// hop but the last must name a reference field, and bound hops must
    /// point at a known dataset of the hop's schema.
    pub fn validate(&self, schemas: &SchemaMap, datasets: &Map) -> bool {
        let last = self.0.len().saturating_sub(1);
        self.0.iter().enumerate().all(|(i, link)| {
            let Some(field) = schemas.get(link.schema).and_then(|s| s.field(link.field)) else {
                return false;
            };
            if i < last && field.kind() != ValueKind::Ref {
                return false;
            }
            match link.dataset {
                Some(id) => datasets.get(id).is_some_and(|d| d.schema() == link.schema),
                None => i == 0,
            }
        })
    }

    /// Resolve the chain against an in-memory map.
    pub fn value<'a>(&self, datasets: &'a Map) -> Option<&'a Value> {
        let root = self.first()?.dataset?;
        let (_, field) = datasets.graph_search_by_fields(root, &self.dataset_schema_field_ids());
        field.map(|f| f.value())
    }

    /// Resolve the chain through `loader`, starting at the first hop's dataset
    /// and following the hop fields in order.
    ///
    /// An unbound chain or a broken path yields `Ok(None)`; only loader
    /// failures are errors.
    pub async fn dataset_value(&self, loader: &dyn GraphLoader) -> Result<Option<Value>, LoadError> {
        let Some(root) = self.first().and_then(|l| l.dataset) else {
            return Ok(None);
        };
        let (_, field) = loader
            .load_graph(root, &self.dataset_schema_field_ids())
            .await?;
        Ok(field.map(|f| f.value().clone()))
    }
}

impl From<Link> for Links {
    fn from(link: Link) -> Self {
        Links::single(link)
    }
}

#[cfg(test)]
mod tests {
    use terra_dataset::{Dataset, DatasetField, DatasetSchema, DatasetSchemaField};
    use terra_id::{SceneId, SequentialGenerator};

    use super::*;

    struct Fixture {
        schemas: SchemaMap,
        datasets: Map,
        city_schema: DatasetSchemaId,
        country_schema: DatasetSchemaId,
        city: DatasetId,
        country: DatasetId,
        f_country: DatasetFieldId,
        f_name: DatasetFieldId,
        f_code: DatasetFieldId,
    }

    fn fixture() -> Fixture {
        let g = SequentialGenerator::new();
        let scene = SceneId::generate(&g);
        let city_schema = DatasetSchemaId::generate(&g);
        let country_schema = DatasetSchemaId::generate(&g);
        let city = DatasetId::generate(&g);
        let country = DatasetId::generate(&g);
        let f_country = DatasetFieldId::generate(&g);
        let f_name = DatasetFieldId::generate(&g);
        let f_code = DatasetFieldId::generate(&g);

        let schemas = [
            DatasetSchema::builder()
                .id(city_schema)
                .scene(scene)
                .fields(vec![
                    DatasetSchemaField::new(f_country, "country", ValueKind::Ref)
                        .with_reference(country_schema),
                    DatasetSchemaField::new(f_name, "name", ValueKind::String),
                ])
                .must_build(),
            DatasetSchema::builder()
                .id(country_schema)
                .scene(scene)
                .fields(vec![DatasetSchemaField::new(f_code, "code", ValueKind::String)])
                .must_build(),
        ]
        .into_iter()
        .collect();

        let datasets = [
            Dataset::builder()
                .id(city)
                .scene(scene)
                .schema(city_schema)
                .fields(vec![
                    DatasetField::new(f_country, Value::reference(country)),
                    DatasetField::new(f_name, Value::from("Tokyo")),
                ])
                .must_build(),
            Dataset::builder()
                .id(country)
                .scene(scene)
                .schema(country_schema)
                .fields(vec![DatasetField::new(f_code, Value::from("JP"))])
                .must_build(),
        ]
        .into_iter()
        .collect();

        Fixture {
            schemas,
            datasets,
            city_schema,
            country_schema,
            city,
            country,
            f_country,
            f_name,
            f_code,
        }
    }

    #[test]
    fn test_only_first_hop_may_be_unbound() {
        let f = fixture();
        assert!(
            Links::new(vec![
                Link::schema_only(f.city_schema, f.f_country),
                Link::new(f.country, f.country_schema, f.f_code),
            ])
            .is_some()
        );
        assert!(
            Links::new(vec![
                Link::new(f.city, f.city_schema, f.f_country),
                Link::schema_only(f.country_schema, f.f_code),
            ])
            .is_none()
        );
    }

    #[test]
    fn test_apply_dataset_fills_first_hop_only() {
        let f = fixture();
        let template = Links::single(Link::schema_only(f.city_schema, f.f_name));
        assert!(!template.is_linked_fully());

        let bound = template.apply_dataset(Some(f.city));
        assert!(bound.is_linked_fully());
        assert_eq!(bound.datasets(), vec![f.city]);

        // a bound hop keeps its dataset
        assert_eq!(bound.apply_dataset(Some(f.country)), bound);
    }

    #[test]
    fn test_value_follows_references() {
        let f = fixture();
        let links = Links::new(vec![
            Link::new(f.city, f.city_schema, f.f_country),
            Link::new(f.country, f.country_schema, f.f_code),
        ])
        .unwrap();
        assert_eq!(links.value(&f.datasets), Some(&Value::from("JP")));
        assert_eq!(
            links.last().and_then(|l| l.value(&f.datasets)),
            Some(&Value::from("JP"))
        );
    }

    #[test]
    fn test_validate() {
        let f = fixture();
        let good = Links::new(vec![
            Link::new(f.city, f.city_schema, f.f_country),
            Link::new(f.country, f.country_schema, f.f_code),
        ])
        .unwrap();
        assert!(good.validate(&f.schemas, &f.datasets));

        // a non-terminal hop must be a reference field
        let bad = Links::new(vec![
            Link::new(f.city, f.city_schema, f.f_name),
            Link::new(f.country, f.country_schema, f.f_code),
        ])
        .unwrap();
        assert!(!bad.validate(&f.schemas, &f.datasets));

        // dataset of the wrong schema
        let wrong = Links::single(Link::new(f.country, f.city_schema, f.f_name));
        assert!(!wrong.validate(&f.schemas, &f.datasets));
    }

    #[tokio::test]
    async fn test_dataset_value_through_loader() {
        let f = fixture();
        let links = Links::single(Link::new(f.city, f.city_schema, f.f_name));
        let value = links.dataset_value(&f.datasets).await.unwrap();
        assert_eq!(value, Some(Value::from("Tokyo")));

        let unbound = Links::single(Link::schema_only(f.city_schema, f.f_name));
        assert_eq!(unbound.dataset_value(&f.datasets).await.unwrap(), None);
    }

    #[test]
    fn test_serialization() {
        let f = fixture();
        let links = Links::single(Link::schema_only(f.city_schema, f.f_name));
        let json = serde_json::to_value(&links).unwrap();
        assert!(json[0].get("dataset").is_none());
        let back: Links = serde_json::from_value(json).unwrap();
        assert_eq!(back, links);
        assert!(links.has_schema(f.city_schema));
        assert!(!links.has_dataset(f.city));
    }
}

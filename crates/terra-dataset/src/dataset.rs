/*
 * dataset.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Dataset rows.
 */

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde_json::{Map as JsonMap, Value as Json};
use terra_id::{DatasetFieldId, DatasetId, DatasetSchemaId, IdGenerator, SceneId};
use terra_value::{Value, ValueKind};

use crate::schema::DatasetSchema;
use crate::{DatasetError, Result};

/// The value of one field of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetField {
    field: DatasetFieldId,
    value: Value,
    source: String,
}

impl DatasetField {
    pub fn new(field: DatasetFieldId, value: Value) -> Self {
        Self {
            field,
            value,
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn field(&self) -> DatasetFieldId {
        self.field
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The dataset this field points at, if it holds a parseable reference.
    pub fn reference(&self) -> Option<DatasetId> {
        self.value.as_ref_id().and_then(|r| r.parse().ok())
    }
}

/// One row of external data.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    id: DatasetId,
    scene: SceneId,
    schema: DatasetSchemaId,
    source: String,
    fields: IndexMap<DatasetFieldId, DatasetField>,
}

impl Dataset {
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::default()
    }

    pub fn id(&self) -> DatasetId {
        self.id
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn schema(&self) -> DatasetSchemaId {
        self.schema
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &DatasetField> {
        self.fields.values()
    }

    pub fn field(&self, id: DatasetFieldId) -> Option<&DatasetField> {
        self.fields.get(&id)
    }

    /// The dataset referenced by the given field.
    pub fn field_ref(&self, id: DatasetFieldId) -> Option<DatasetId> {
        self.field(id).and_then(DatasetField::reference)
    }

    /// Every dataset referenced by any field, in field order.
    pub fn references(&self) -> impl Iterator<Item = DatasetId> + '_ {
        self.fields.values().filter_map(DatasetField::reference)
    }

    /// The field holding the row's display name, as designated by `schema`.
    pub fn name_field(&self, schema: &DatasetSchema) -> Option<&DatasetField> {
        if schema.id() != self.schema {
            return None;
        }
        schema
            .representative_field()
            .and_then(|f| self.field(f.id()))
    }

    /// Generic representation keyed by field names.
    ///
    /// Returns `None` if `schema` is not this dataset's schema. Fields unknown
    /// to the schema are skipped.
    pub fn interface(&self, schema: &DatasetSchema) -> Option<JsonMap<String, Json>> {
        if schema.id() != self.schema {
            return None;
        }
        Some(
            self.fields
                .values()
                .filter_map(|f| {
                    schema
                        .field(f.field)
                        .map(|sf| (sf.name().to_string(), f.value.interface()))
                })
                .collect(),
        )
    }
}

/// Builder for [`Dataset`].
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    id: Option<DatasetId>,
    scene: Option<SceneId>,
    schema: Option<DatasetSchemaId>,
    source: String,
    fields: Vec<DatasetField>,
}

impl DatasetBuilder {
    pub fn id(mut self, id: DatasetId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn new_id(mut self, generator: &dyn IdGenerator) -> Self {
        self.id = Some(DatasetId::generate(generator));
        self
    }

    pub fn scene(mut self, scene: SceneId) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn schema(mut self, schema: DatasetSchemaId) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn fields(mut self, fields: Vec<DatasetField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn build(self) -> Result<Dataset> {
        let id = self.id.ok_or(DatasetError::InvalidId)?;
        let scene = self.scene.ok_or(DatasetError::InvalidSceneId)?;
        let schema = self.schema.ok_or(DatasetError::InvalidSchemaId)?;

        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            match fields.entry(field.field) {
                Entry::Occupied(_) => return Err(DatasetError::DuplicatedField(field.field)),
                Entry::Vacant(slot) => {
                    slot.insert(field);
                }
            }
        }

        Ok(Dataset {
            id,
            scene,
            schema,
            source: self.source,
            fields,
        })
    }

    /// Build, panicking on invalid input. For fixtures only.
    pub fn must_build(self) -> Dataset {
        match self.build() {
            Ok(dataset) => dataset,
            Err(e) => panic!("invalid dataset: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DatasetSchemaField;
    use serde_json::json;
    use terra_id::SequentialGenerator;

    #[test]
    fn test_fields_and_references() {
        let g = SequentialGenerator::new();
        let (name, parent) = (DatasetFieldId::generate(&g), DatasetFieldId::generate(&g));
        let target = DatasetId::generate(&g);
        let schema = DatasetSchema::builder()
            .new_id(&g)
            .scene(SceneId::generate(&g))
            .fields(vec![
                DatasetSchemaField::new(name, "name", ValueKind::String),
                DatasetSchemaField::new(parent, "parent", ValueKind::Ref),
            ])
            .representative_field(name)
            .must_build();
        let ds = Dataset::builder()
            .new_id(&g)
            .scene(schema.scene())
            .schema(schema.id())
            .fields(vec![
                DatasetField::new(name, Value::from("Tokyo")),
                DatasetField::new(parent, Value::reference(target)),
            ])
            .must_build();

        assert_eq!(ds.field_ref(parent), Some(target));
        assert_eq!(ds.field_ref(name), None);
        assert_eq!(ds.references().collect::<Vec<_>>(), vec![target]);
        assert_eq!(ds.name_field(&schema).unwrap().value(), &Value::from("Tokyo"));
        assert_eq!(
            Json::Object(ds.interface(&schema).unwrap()),
            json!({"name": "Tokyo", "parent": target.to_string()})
        );
    }

    #[test]
    fn test_interface_requires_matching_schema() {
        let g = SequentialGenerator::new();
        let other = DatasetSchema::builder()
            .new_id(&g)
            .scene(SceneId::generate(&g))
            .must_build();
        let ds = Dataset::builder()
            .new_id(&g)
            .scene(SceneId::generate(&g))
            .schema(DatasetSchemaId::generate(&g))
            .must_build();
        assert!(ds.interface(&other).is_none());
        assert!(ds.name_field(&other).is_none());
    }

    #[test]
    fn test_build_errors() {
        let g = SequentialGenerator::new();
        let f = DatasetFieldId::generate(&g);
        assert_eq!(
            Dataset::builder()
                .new_id(&g)
                .scene(SceneId::generate(&g))
                .build(),
            Err(DatasetError::InvalidSchemaId)
        );
        assert_eq!(
            Dataset::builder()
                .new_id(&g)
                .scene(SceneId::generate(&g))
                .schema(DatasetSchemaId::generate(&g))
                .fields(vec![
                    DatasetField::new(f, Value::from(1.0)),
                    DatasetField::new(f, Value::from(2.0)),
                ])
                .build(),
            Err(DatasetError::DuplicatedField(f))
        );
    }

    #[test]
    #[should_panic(expected = "invalid dataset")]
    fn test_must_build_panics() {
        Dataset::builder().must_build();
    }
}

/*
 * schema.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Dataset schemas.
 */

use indexmap::IndexMap;
use indexmap::map::Entry;
use terra_id::{DatasetFieldId, DatasetSchemaId, IdGenerator, SceneId};
use terra_value::ValueKind;

use crate::{DatasetError, Result};

/// One typed column of a dataset schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSchemaField {
    id: DatasetFieldId,
    name: String,
    kind: ValueKind,
    source: String,
    /// For `ref` fields: the schema of the referenced datasets, when known.
    reference: Option<DatasetSchemaId>,
}

impl DatasetSchemaField {
    pub fn new(id: DatasetFieldId, name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            source: String::new(),
            reference: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_reference(mut self, schema: DatasetSchemaId) -> Self {
        self.reference = Some(schema);
        self
    }

    pub fn id(&self) -> DatasetFieldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn reference(&self) -> Option<DatasetSchemaId> {
        self.reference
    }
}

/// Declares the fields of a family of datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSchema {
    id: DatasetSchemaId,
    scene: SceneId,
    name: String,
    source: String,
    fields: IndexMap<DatasetFieldId, DatasetSchemaField>,
    representative_field: Option<DatasetFieldId>,
    dynamic: bool,
}

impl DatasetSchema {
    pub fn builder() -> DatasetSchemaBuilder {
        DatasetSchemaBuilder::default()
    }

    pub fn id(&self) -> DatasetSchemaId {
        self.id
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the rows are produced at runtime rather than imported.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &DatasetSchemaField> {
        self.fields.values()
    }

    pub fn field(&self, id: DatasetFieldId) -> Option<&DatasetSchemaField> {
        self.fields.get(&id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&DatasetSchemaField> {
        self.fields.values().find(|f| f.name == name)
    }

    pub fn field_by_source(&self, source: &str) -> Option<&DatasetSchemaField> {
        self.fields.values().find(|f| f.source == source)
    }

    /// The first field of the given kind, in declaration order.
    pub fn field_by_kind(&self, kind: ValueKind) -> Option<&DatasetSchemaField> {
        self.fields.values().find(|f| f.kind == kind)
    }

    /// The field designated as the display name of a row.
    pub fn representative_field(&self) -> Option<&DatasetSchemaField> {
        self.representative_field
            .and_then(|id| self.fields.get(&id))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`DatasetSchema`].
#[derive(Debug, Default)]
pub struct DatasetSchemaBuilder {
    id: Option<DatasetSchemaId>,
    scene: Option<SceneId>,
    name: String,
    source: String,
    fields: Vec<DatasetSchemaField>,
    representative_field: Option<DatasetFieldId>,
    dynamic: bool,
}

impl DatasetSchemaBuilder {
    pub fn id(mut self, id: DatasetSchemaId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn new_id(mut self, generator: &dyn IdGenerator) -> Self {
        self.id = Some(DatasetSchemaId::generate(generator));
        self
    }

    pub fn scene(mut self, scene: SceneId) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn fields(mut self, fields: Vec<DatasetSchemaField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn representative_field(mut self, field: DatasetFieldId) -> Self {
        self.representative_field = Some(field);
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn build(self) -> Result<DatasetSchema> {
        let id = self.id.ok_or(DatasetError::InvalidId)?;
        let scene = self.scene.ok_or(DatasetError::InvalidSceneId)?;

        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            match fields.entry(field.id) {
                Entry::Occupied(_) => return Err(DatasetError::DuplicatedField(field.id)),
                Entry::Vacant(slot) => {
                    slot.insert(field);
                }
            }
        }

        if let Some(rep) = self.representative_field
            && !fields.contains_key(&rep)
        {
            return Err(DatasetError::InvalidRepresentativeField(rep));
        }

        Ok(DatasetSchema {
            id,
            scene,
            name: self.name,
            source: self.source,
            fields,
            representative_field: self.representative_field,
            dynamic: self.dynamic,
        })
    }

    /// Build, panicking on invalid input. For fixtures only.
    pub fn must_build(self) -> DatasetSchema {
        match self.build() {
            Ok(schema) => schema,
            Err(e) => panic!("invalid dataset schema: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_id::SequentialGenerator;

    #[test]
    fn test_build_keeps_order() {
        let g = SequentialGenerator::new();
        let (f1, f2) = (DatasetFieldId::generate(&g), DatasetFieldId::generate(&g));
        let schema = DatasetSchema::builder()
            .new_id(&g)
            .scene(SceneId::generate(&g))
            .name("cities")
            .fields(vec![
                DatasetSchemaField::new(f2, "name", ValueKind::String),
                DatasetSchemaField::new(f1, "location", ValueKind::LatLng).with_source("csv:loc"),
            ])
            .representative_field(f2)
            .build()
            .unwrap();

        let ids: Vec<_> = schema.fields().map(|f| f.id()).collect();
        assert_eq!(ids, vec![f2, f1]);
        assert_eq!(schema.representative_field().unwrap().name(), "name");
        assert_eq!(schema.field_by_name("location").unwrap().id(), f1);
        assert_eq!(schema.field_by_source("csv:loc").unwrap().id(), f1);
        assert_eq!(schema.field_by_kind(ValueKind::LatLng).unwrap().id(), f1);
        assert!(schema.field_by_kind(ValueKind::Camera).is_none());
    }

    #[test]
    fn test_build_errors() {
        let g = SequentialGenerator::new();
        let f = DatasetFieldId::generate(&g);

        assert_eq!(
            DatasetSchema::builder().scene(SceneId::generate(&g)).build(),
            Err(DatasetError::InvalidId)
        );
        assert_eq!(
            DatasetSchema::builder().new_id(&g).build(),
            Err(DatasetError::InvalidSceneId)
        );
        assert_eq!(
            DatasetSchema::builder()
                .new_id(&g)
                .scene(SceneId::generate(&g))
                .fields(vec![
                    DatasetSchemaField::new(f, "a", ValueKind::String),
                    DatasetSchemaField::new(f, "b", ValueKind::Number),
                ])
                .build(),
            Err(DatasetError::DuplicatedField(f))
        );
        assert_eq!(
            DatasetSchema::builder()
                .new_id(&g)
                .scene(SceneId::generate(&g))
                .representative_field(f)
                .build(),
            Err(DatasetError::InvalidRepresentativeField(f))
        );
    }
}

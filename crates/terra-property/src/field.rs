/*
 * field.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Property fields.
 */

use terra_dataset::{Dataset, GraphLoader, LoadError, Loader};
use terra_id::{DatasetId, DatasetSchemaId, FieldId};
use terra_value::{OptionalValue, Value, ValueKind};

use crate::actual::ValueAndDatasetValue;
use crate::error::{PropertyError, Result};
use crate::link::Links;
use crate::schema::SchemaField;

/// A value slot of a group, optionally linked into the dataset graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    field: FieldId,
    value: OptionalValue,
    links: Option<Links>,
}

impl Field {
    pub fn new(field: impl Into<FieldId>, value: OptionalValue) -> Self {
        Self {
            field: field.into(),
            value,
            links: None,
        }
    }

    /// An empty field bound to the kind of `schema_field`.
    pub fn from_schema(schema_field: &SchemaField) -> Self {
        Self::new(
            schema_field.id().clone(),
            OptionalValue::empty(schema_field.kind()),
        )
    }

    pub fn with_links(mut self, links: Links) -> Self {
        self.link(links);
        self
    }

    pub fn id(&self) -> &FieldId {
        &self.field
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.value()
    }

    pub fn optional_value(&self) -> &OptionalValue {
        &self.value
    }

    pub fn links(&self) -> Option<&Links> {
        self.links.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.links.is_some()
    }

    /// No value and no link.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && !self.is_linked()
    }

    /// Set the value after checking it against `schema_field`.
    ///
    /// On error the field is left unchanged.
    pub fn update(&mut self, value: Option<Value>, schema_field: &SchemaField) -> Result<()> {
        if schema_field.id() != &self.field {
            return Err(PropertyError::InvalidPropertyField(schema_field.id().clone()));
        }
        if schema_field.kind() != self.kind() {
            return Err(PropertyError::InvalidPropertyType {
                field: self.field.clone(),
                expected: schema_field.kind(),
                got: self.kind(),
            });
        }
        if !schema_field.validate(value.as_ref()) {
            return Err(PropertyError::InvalidPropertyValue {
                field: self.field.clone(),
            });
        }
        self.value
            .set_value(value)
            .map_err(|_| PropertyError::InvalidPropertyValue {
                field: self.field.clone(),
            })
    }

    /// Replace the links. An empty chain unlinks the field.
    pub fn link(&mut self, links: Links) {
        self.links = (!links.is_empty()).then_some(links);
    }

    pub fn unlink(&mut self) {
        self.links = None;
    }

    /// Drop the value, keeping the bound kind and the links.
    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Rebind the field to another kind, converting the value when possible.
    /// Links are dropped since they were chosen for the old kind.
    pub fn cast(&mut self, kind: ValueKind) {
        if kind == self.kind() {
            return;
        }
        self.value = self.value.cast(kind);
        self.links = None;
    }

    /// The value the field shows when its chain ends in `dataset`.
    ///
    /// A linked field takes the value of its last hop's field from `dataset`
    /// when the hop is bound to that dataset. Otherwise only the literal is
    /// available.
    pub fn actual_value(&self, dataset: Option<&Dataset>) -> ValueAndDatasetValue {
        let dataset_value = self
            .links
            .as_ref()
            .and_then(|l| l.last())
            .zip(dataset)
            .filter(|(link, ds)| link.dataset() == Some(ds.id()))
            .and_then(|(link, ds)| ds.field(link.field()))
            .map(|f| f.value().clone());
        ValueAndDatasetValue::new(self.kind(), dataset_value, self.value().cloned())
    }

    /// Resolve the field's links through `loader`.
    pub async fn dataset_value(
        &self,
        loader: &dyn GraphLoader,
    ) -> std::result::Result<Option<Value>, LoadError> {
        match &self.links {
            Some(links) => links.dataset_value(loader).await,
            None => Ok(None),
        }
    }

    /// Bring the field in line with `schema_field` of a new schema.
    ///
    /// A value of another kind, or one the field no longer accepts, is
    /// cleared. A fully linked field is unlinked when the dataset field at the
    /// end of its chain no longer has the kind of `schema_field`.
    pub async fn migrate_schema(
        &mut self,
        schema_field: &SchemaField,
        loader: &dyn Loader,
    ) -> Result<()> {
        if self.kind() != schema_field.kind() {
            tracing::debug!(
                field = %self.field,
                from = %self.kind(),
                to = %schema_field.kind(),
                "field kind changed, dropping its value and links"
            );
            self.value = OptionalValue::empty(schema_field.kind());
            self.links = None;
        } else if !schema_field.validate(self.value()) {
            tracing::debug!(field = %self.field, "clearing a value the new schema rejects");
            self.value.clear();
        }

        let last_hop = self
            .links
            .as_ref()
            .filter(|l| l.is_linked_fully())
            .and_then(Links::last)
            .and_then(|l| Some((l.dataset()?, l.field())));
        if let Some((dataset, field)) = last_hop
            && let Some(ds) = loader.load_one(dataset).await?
            && ds.field(field).is_some_and(|f| f.kind() != schema_field.kind())
        {
            tracing::debug!(
                field = %self.field,
                %dataset,
                "unlinking field from a dataset field of another kind"
            );
            self.unlink();
        }
        Ok(())
    }

    pub fn datasets(&self) -> Vec<DatasetId> {
        self.links.as_ref().map(Links::datasets).unwrap_or_default()
    }

    pub fn is_dataset_linked(&self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        self.links
            .as_ref()
            .is_some_and(|l| l.has_schema_and_dataset(schema, dataset))
    }
}

#[cfg(test)]
mod tests {
    use terra_dataset::DatasetField;
    use terra_id::{DatasetFieldId, SceneId, SequentialGenerator};

    use super::*;
    use crate::link::Link;

    fn size_field() -> SchemaField {
        SchemaField::builder("size", ValueKind::Number)
            .max(10.0)
            .must_build()
    }

    #[test]
    fn test_update() {
        let sf = size_field();
        let mut f = Field::from_schema(&sf);
        assert!(f.is_empty());

        f.update(Some(Value::Number(4.0)), &sf).unwrap();
        assert_eq!(f.value(), Some(&Value::Number(4.0)));

        let err = f.update(Some(Value::Number(40.0)), &sf).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidPropertyValue { .. }));
        assert_eq!(f.value(), Some(&Value::Number(4.0)));

        let err = f.update(Some(Value::from("4")), &sf).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidPropertyValue { .. }));

        f.update(None, &sf).unwrap();
        assert!(f.is_empty());
    }

    #[test]
    fn test_update_rejects_other_schema_field() {
        let mut f = Field::new("size", OptionalValue::empty(ValueKind::String));
        let err = f.update(None, &size_field()).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidPropertyType { .. }));

        let mut f = Field::new("other", OptionalValue::empty(ValueKind::Number));
        let err = f.update(None, &size_field()).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidPropertyField(_)));
    }

    #[test]
    fn test_actual_value() {
        let g = SequentialGenerator::new();
        let (ds_id, schema, df) = (
            DatasetId::generate(&g),
            DatasetSchemaId::generate(&g),
            DatasetFieldId::generate(&g),
        );
        let ds = Dataset::builder()
            .id(ds_id)
            .scene(SceneId::generate(&g))
            .schema(schema)
            .fields(vec![DatasetField::new(df, Value::from("from dataset"))])
            .must_build();

        let literal = Field::new("label", OptionalValue::of(Value::from("literal")));
        assert_eq!(
            literal.actual_value(Some(&ds)).value(),
            Some(&Value::from("literal"))
        );

        let linked = literal
            .clone()
            .with_links(Links::single(Link::new(ds_id, schema, df)));
        let actual = linked.actual_value(Some(&ds));
        assert_eq!(actual.value(), Some(&Value::from("from dataset")));
        assert_eq!(actual.property_value(), Some(&Value::from("literal")));
        assert_eq!(
            linked.actual_value(None).value(),
            Some(&Value::from("literal"))
        );

        assert!(linked.is_dataset_linked(schema, ds_id));
        assert_eq!(linked.datasets(), vec![ds_id]);
    }

    #[test]
    fn test_cast_drops_links() {
        let g = SequentialGenerator::new();
        let mut f = Field::new("n", OptionalValue::of(Value::Number(12.0))).with_links(
            Links::single(Link::schema_only(
                DatasetSchemaId::generate(&g),
                DatasetFieldId::generate(&g),
            )),
        );
        f.cast(ValueKind::String);
        assert_eq!(f.value(), Some(&Value::from("12")));
        assert!(!f.is_linked());
    }

    #[test]
    fn test_migrate_to_other_kind_drops_links() {
        let g = SequentialGenerator::new();
        let template = Links::single(Link::schema_only(
            DatasetSchemaId::generate(&g),
            DatasetFieldId::generate(&g),
        ));
        let field = Field::new("size", OptionalValue::of(Value::Number(4.0)))
            .with_links(template.clone());
        let datasets = terra_dataset::Map::new();

        let mut same = field.clone();
        pollster::block_on(same.migrate_schema(&size_field(), &datasets)).unwrap();
        assert_eq!(same.value(), Some(&Value::Number(4.0)));
        assert_eq!(same.links(), Some(&template));

        let label = SchemaField::builder("size", ValueKind::String).must_build();
        let mut changed = field;
        pollster::block_on(changed.migrate_schema(&label, &datasets)).unwrap();
        assert_eq!(changed.kind(), ValueKind::String);
        assert_eq!(changed.value(), None);
        assert!(!changed.is_linked());
        assert!(changed.is_empty());
    }
}

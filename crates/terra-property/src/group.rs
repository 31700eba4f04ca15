/*
 * group.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Single instances of a schema group.
 */

use std::collections::HashSet;

use terra_dataset::Loader;
use terra_id::{DatasetId, DatasetSchemaId, FieldId, IdGenerator, ItemId, SchemaGroupId};

use crate::error::{PropertyError, Result};
use crate::field::Field;
use crate::item::{PropertyItem, extend_unique};
use crate::schema::SchemaGroup;

/// The fields of one schema group instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: ItemId,
    schema_group: SchemaGroupId,
    fields: Vec<Field>,
}

impl Group {
    /// An empty group.
    pub fn new(id: ItemId, schema_group: SchemaGroupId) -> Self {
        Self {
            id,
            schema_group,
            fields: Vec::new(),
        }
    }

    pub fn builder() -> GroupBuilder {
        GroupBuilder::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, id: &FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id() == id)
    }

    pub fn field_mut(&mut self, id: &FieldId) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id() == id)
    }

    pub fn has_field(&self, id: &FieldId) -> bool {
        self.field(id).is_some()
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &FieldId> {
        self.fields.iter().map(Field::id)
    }

    /// Insert `field`, replacing a field with the same id.
    pub fn add_field(&mut self, field: Field) {
        match self.field_mut(field.id()) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn remove_field(&mut self, id: &FieldId) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.id() != id);
        self.fields.len() != before
    }

    /// The field `id`, created empty if `schema_group` declares it.
    ///
    /// Returns `None` if `schema_group` is not this group's schema group or
    /// does not declare the field. The flag is `true` when the field was
    /// created by this call.
    pub fn get_or_create_field(
        &mut self,
        schema_group: &SchemaGroup,
        id: &FieldId,
    ) -> Option<(&mut Field, bool)> {
        if schema_group.id() != &self.schema_group {
            return None;
        }
        if let Some(i) = self.fields.iter().position(|f| f.id() == id) {
            return Some((&mut self.fields[i], false));
        }
        let schema_field = schema_group.field(id)?;
        self.fields.push(Field::from_schema(schema_field));
        self.fields.last_mut().map(|f| (f, true))
    }

    /// Migrate the fields to `schema_group` of a new schema, dropping the
    /// ones it does not declare.
    pub async fn migrate_schema(
        &mut self,
        schema_group: &SchemaGroup,
        loader: &dyn Loader,
    ) -> Result<()> {
        let id = self.id;
        self.fields.retain(|f| {
            let keep = schema_group.has_field(f.id());
            if !keep {
                tracing::debug!(
                    item = %id,
                    field = %f.id(),
                    "dropping field absent from the new schema"
                );
            }
            keep
        });
        for field in &mut self.fields {
            if let Some(sf) = schema_group.field(field.id()) {
                field.migrate_schema(sf, loader).await?;
            }
        }
        Ok(())
    }

    /// The field `schema_group` names as representative.
    pub fn representative_field<'a>(&'a self, schema_group: &SchemaGroup) -> Option<&'a Field> {
        self.field(schema_group.representative_field_id()?)
    }
}

impl PropertyItem for Group {
    fn id(&self) -> ItemId {
        self.id
    }

    fn schema_group(&self) -> &SchemaGroupId {
        &self.schema_group
    }

    /// Every field is empty (or there are none).
    fn is_empty(&self) -> bool {
        self.fields.iter().all(Field::is_empty)
    }

    fn prune(&mut self) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| !f.is_empty());
        self.fields.len() != before
    }

    fn has_linked_field(&self) -> bool {
        self.fields.iter().any(Field::is_linked)
    }

    fn datasets(&self) -> Vec<DatasetId> {
        let mut ids = Vec::new();
        for f in &self.fields {
            extend_unique(&mut ids, f.datasets());
        }
        ids
    }

    fn is_dataset_linked(&self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        self.fields.iter().any(|f| f.is_dataset_linked(schema, dataset))
    }

    fn unlink_all_by_dataset(&mut self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        let mut changed = false;
        for f in &mut self.fields {
            if f.is_dataset_linked(schema, dataset) {
                f.unlink();
                changed = true;
            }
        }
        changed
    }

    fn validate_schema(&self, schema_group: &SchemaGroup) -> Result<()> {
        if schema_group.id() != &self.schema_group {
            return Err(PropertyError::InvalidSchemaGroup(self.schema_group.clone()));
        }
        for field in &self.fields {
            let Some(sf) = schema_group.field(field.id()) else {
                return Err(PropertyError::InvalidPropertyField(field.id().clone()));
            };
            if sf.kind() != field.kind() {
                return Err(PropertyError::InvalidPropertyType {
                    field: field.id().clone(),
                    expected: sf.kind(),
                    got: field.kind(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`Group`].
#[derive(Debug, Clone, Default)]
pub struct GroupBuilder {
    id: Option<ItemId>,
    schema_group: SchemaGroupId,
    fields: Vec<Field>,
}

impl GroupBuilder {
    pub fn id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn new_id(mut self, generator: &dyn IdGenerator) -> Self {
        self.id = Some(ItemId::generate(generator));
        self
    }

    pub fn schema_group(mut self, schema_group: impl Into<SchemaGroupId>) -> Self {
        self.schema_group = schema_group.into();
        self
    }

    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn build(self) -> Result<Group> {
        let id = self.id.ok_or(PropertyError::InvalidId)?;
        if self.schema_group.is_empty() {
            return Err(PropertyError::InvalidSchemaGroup(self.schema_group));
        }
        let mut seen = HashSet::new();
        for f in &self.fields {
            if !seen.insert(f.id()) {
                return Err(PropertyError::DuplicatedField(f.id().clone()));
            }
        }
        Ok(Group {
            id,
            schema_group: self.schema_group,
            fields: self.fields,
        })
    }

    pub fn must_build(self) -> Group {
        match self.build() {
            Ok(g) => g,
            Err(e) => panic!("invalid group: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use terra_id::{DatasetFieldId, SequentialGenerator};
    use terra_value::{OptionalValue, Value, ValueKind};

    use super::*;
    use crate::link::{Link, Links};
    use crate::schema::SchemaField;

    fn schema_group() -> SchemaGroup {
        SchemaGroup::builder("default")
            .fields(vec![
                SchemaField::builder("a", ValueKind::Number).must_build(),
                SchemaField::builder("b", ValueKind::String).must_build(),
            ])
            .must_build()
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let g = SequentialGenerator::new();
        let err = Group::builder()
            .new_id(&g)
            .schema_group("default")
            .fields(vec![
                Field::new("a", OptionalValue::empty(ValueKind::Number)),
                Field::new("a", OptionalValue::empty(ValueKind::Number)),
            ])
            .build()
            .unwrap_err();
        assert!(matches!(err, PropertyError::DuplicatedField(_)));

        let err = Group::builder().schema_group("default").build().unwrap_err();
        assert!(matches!(err, PropertyError::InvalidId));
    }

    #[test]
    fn test_get_or_create_field_is_idempotent() {
        let g = SequentialGenerator::new();
        let sg = schema_group();
        let mut group = Group::new(ItemId::generate(&g), sg.id().clone());

        let (f, created) = group.get_or_create_field(&sg, &"a".into()).unwrap();
        assert!(created);
        assert_eq!(f.kind(), ValueKind::Number);

        let (_, created) = group.get_or_create_field(&sg, &"a".into()).unwrap();
        assert!(!created);
        assert_eq!(group.fields().len(), 1);

        assert!(group.get_or_create_field(&sg, &"zzz".into()).is_none());
    }

    #[test]
    fn test_prune_and_emptiness() {
        let g = SequentialGenerator::new();
        let mut group = Group::builder()
            .new_id(&g)
            .schema_group("default")
            .fields(vec![
                Field::new("a", OptionalValue::of(Value::Number(1.0))),
                Field::new("b", OptionalValue::empty(ValueKind::String)),
            ])
            .must_build();
        assert!(!group.is_empty());
        assert!(group.prune());
        assert_eq!(group.field_ids().map(FieldId::as_str).collect::<Vec<_>>(), ["a"]);
        assert!(!group.prune());

        group.remove_field(&"a".into());
        assert!(group.is_empty());
    }

    #[test]
    fn test_unlink_all_by_dataset() {
        let g = SequentialGenerator::new();
        let (ds, schema) = (DatasetId::generate(&g), DatasetSchemaId::generate(&g));
        let links = Links::single(Link::new(ds, schema, DatasetFieldId::generate(&g)));
        let mut group = Group::builder()
            .new_id(&g)
            .schema_group("default")
            .fields(vec![
                Field::new("b", OptionalValue::empty(ValueKind::String)).with_links(links),
            ])
            .must_build();
        assert!(group.has_linked_field());
        assert_eq!(group.datasets(), vec![ds]);

        assert!(!group.unlink_all_by_dataset(schema, DatasetId::generate(&g)));
        assert!(group.unlink_all_by_dataset(schema, ds));
        assert!(!group.has_linked_field());
        assert!(group.is_empty());
    }

    #[test]
    fn test_validate_schema() {
        let g = SequentialGenerator::new();
        let sg = schema_group();
        let ok = Group::builder()
            .new_id(&g)
            .schema_group("default")
            .fields(vec![Field::new("a", OptionalValue::of(Value::Number(1.0)))])
            .must_build();
        assert!(ok.validate_schema(&sg).is_ok());

        let wrong_kind = Group::builder()
            .new_id(&g)
            .schema_group("default")
            .fields(vec![Field::new("a", OptionalValue::of(Value::from("1")))])
            .must_build();
        assert!(matches!(
            wrong_kind.validate_schema(&sg),
            Err(PropertyError::InvalidPropertyType { .. })
        ));

        let unknown = Group::builder()
            .new_id(&g)
            .schema_group("default")
            .fields(vec![Field::new("x", OptionalValue::empty(ValueKind::Bool))])
            .must_build();
        assert!(matches!(
            unknown.validate_schema(&sg),
            Err(PropertyError::InvalidPropertyField(_))
        ));
    }
}

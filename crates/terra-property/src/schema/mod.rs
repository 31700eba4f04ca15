/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Property schemas.
 */

//! Property schemas.
//!
//! A [`Schema`] is the declarative side of a property: which groups exist,
//! whether each is repeatable, and which typed fields each group holds. Field
//! ids are unique across the whole schema, so a bare field id is enough to
//! find its group.

mod condition;
mod field;
mod group;
mod manifest;

pub use condition::Condition;
pub use field::{Choice, Linkable, SchemaField, SchemaFieldBuilder, SchemaFieldUi};
pub use group::{SchemaGroup, SchemaGroupBuilder};

use std::collections::HashSet;

use terra_id::{FieldId, SchemaGroupId, SchemaId};

use crate::error::{PropertyError, Result};
use crate::pointer::Pointer;

/// Addresses one field of a schema by group and field id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaFieldPointer {
    pub schema_group: SchemaGroupId,
    pub field: FieldId,
}

impl SchemaFieldPointer {
    pub fn new(schema_group: impl Into<SchemaGroupId>, field: impl Into<FieldId>) -> Self {
        Self {
            schema_group: schema_group.into(),
            field: field.into(),
        }
    }

    /// The equivalent instance pointer.
    pub fn pointer(&self) -> Pointer {
        Pointer::field_by_schema_group(self.schema_group.clone(), self.field.clone())
    }
}

/// Fields that take a location or a URL from a linked dataset row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkableFields {
    pub latlng: Option<SchemaFieldPointer>,
    pub url: Option<SchemaFieldPointer>,
}

impl LinkableFields {
    /// Whether every configured pointer resolves to a field of `schema`.
    pub fn validate(&self, schema: &Schema) -> bool {
        [&self.latlng, &self.url]
            .into_iter()
            .flatten()
            .all(|p| schema.field_by_pointer(p).is_some())
    }

    pub fn pointers(&self) -> impl Iterator<Item = &SchemaFieldPointer> {
        [&self.latlng, &self.url].into_iter().flatten()
    }
}

/// A property schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    id: SchemaId,
    version: u32,
    groups: Vec<SchemaGroup>,
    linkable: LinkableFields,
}

impl Schema {
    pub fn builder(id: impl Into<SchemaId>) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                id: id.into(),
                version: 0,
                groups: Vec::new(),
                linkable: LinkableFields::default(),
            },
        }
    }

    pub fn id(&self) -> &SchemaId {
        &self.id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn groups(&self) -> &[SchemaGroup] {
        &self.groups
    }

    pub fn group(&self, id: &SchemaGroupId) -> Option<&SchemaGroup> {
        self.groups.iter().find(|g| g.id() == id)
    }

    /// The group declaring field `id`.
    pub fn group_by_field(&self, id: &FieldId) -> Option<&SchemaGroup> {
        self.groups.iter().find(|g| g.has_field(id))
    }

    pub fn field(&self, id: &FieldId) -> Option<&SchemaField> {
        self.groups.iter().find_map(|g| g.field(id))
    }

    pub fn field_by_pointer(&self, ptr: &SchemaFieldPointer) -> Option<&SchemaField> {
        self.group(&ptr.schema_group)?.field(&ptr.field)
    }

    /// Resolve an instance pointer to the schema field it names.
    ///
    /// Uses the pointer's schema group when it has one, otherwise looks the
    /// field up across all groups. Item ids are not consulted.
    pub fn field_by_instance_pointer(&self, ptr: &Pointer) -> Option<(&SchemaGroup, &SchemaField)> {
        let field = ptr.field_id()?;
        let group = match ptr.schema_group() {
            Some(sg) => self.group(sg)?,
            None => self.group_by_field(field)?,
        };
        Some((group, group.field(field)?))
    }

    pub fn linkable_fields(&self) -> &LinkableFields {
        &self.linkable
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn version(mut self, version: u32) -> Self {
        self.schema.version = version;
        self
    }

    pub fn groups(mut self, groups: Vec<SchemaGroup>) -> Self {
        self.schema.groups = groups;
        self
    }

    pub fn linkable(mut self, linkable: LinkableFields) -> Self {
        self.schema.linkable = linkable;
        self
    }

    /// Finish the schema.
    ///
    /// Group ids and field ids must be unique across the schema. Linkable
    /// pointers that were not set explicitly are taken from the first field
    /// declared with the matching [`Linkable`] role; all of them must resolve.
    pub fn build(self) -> Result<Schema> {
        let mut schema = self.schema;
        if schema.id.is_empty() {
            return Err(PropertyError::InvalidPropertySchemaId(schema.id));
        }

        let mut groups = HashSet::new();
        let mut fields = HashSet::new();
        for group in &schema.groups {
            if !groups.insert(group.id()) {
                return Err(PropertyError::InvalidSchemaGroup(group.id().clone()));
            }
            for field in group.fields() {
                if !fields.insert(field.id()) {
                    return Err(PropertyError::DuplicatedField(field.id().clone()));
                }
            }
        }

        let declared = |role: Linkable| {
            schema.groups.iter().find_map(|g| {
                g.fields()
                    .iter()
                    .find(|f| f.linkable_as() == Some(role))
                    .map(|f| SchemaFieldPointer::new(g.id().clone(), f.id().clone()))
            })
        };
        let latlng = declared(Linkable::LatLng);
        let url = declared(Linkable::Url);
        if schema.linkable.latlng.is_none() {
            schema.linkable.latlng = latlng;
        }
        if schema.linkable.url.is_none() {
            schema.linkable.url = url;
        }

        if let Some(broken) = schema
            .linkable
            .pointers()
            .find(|p| schema.field_by_pointer(p).is_none())
        {
            return Err(PropertyError::InvalidPropertyField(broken.field.clone()));
        }
        Ok(schema)
    }

    pub fn must_build(self) -> Schema {
        match self.build() {
            Ok(s) => s,
            Err(e) => panic!("invalid property schema: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use terra_value::ValueKind;

    use super::*;

    fn group(id: &str, fields: &[(&str, ValueKind)]) -> SchemaGroup {
        SchemaGroup::builder(id)
            .fields(
                fields
                    .iter()
                    .map(|(f, k)| SchemaField::builder(*f, *k).must_build())
                    .collect(),
            )
            .must_build()
    }

    #[test]
    fn test_field_ids_are_unique_across_groups() {
        let err = Schema::builder("p~1.0.0/e")
            .groups(vec![
                group("g1", &[("a", ValueKind::Number)]),
                group("g2", &[("a", ValueKind::String)]),
            ])
            .build()
            .unwrap_err();
        assert!(matches!(err, PropertyError::DuplicatedField(_)));
    }

    #[test]
    fn test_group_ids_are_unique() {
        let err = Schema::builder("p~1.0.0/e")
            .groups(vec![group("g", &[]), group("g", &[])])
            .build()
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidSchemaGroup(_)));
    }

    #[test]
    fn test_lookup() {
        let s = Schema::builder("p~1.0.0/e")
            .groups(vec![
                group("g1", &[("a", ValueKind::Number)]),
                group("g2", &[("b", ValueKind::String)]),
            ])
            .must_build();
        assert_eq!(s.group_by_field(&"b".into()).map(|g| g.id().as_str()), Some("g2"));
        assert_eq!(s.field(&"a".into()).map(|f| f.kind()), Some(ValueKind::Number));
        assert!(s.field_by_pointer(&SchemaFieldPointer::new("g1", "b")).is_none());

        let (g, f) = s
            .field_by_instance_pointer(&Pointer::field_only("b"))
            .unwrap();
        assert_eq!((g.id().as_str(), f.id().as_str()), ("g2", "b"));
        assert!(
            s.field_by_instance_pointer(&Pointer::field_by_schema_group("g1", "b"))
                .is_none()
        );
    }

    #[test]
    fn test_linkable_pointers() {
        let base = || {
            Schema::builder("p~1.0.0/e").groups(vec![group(
                "default",
                &[("location", ValueKind::LatLng), ("link", ValueKind::Url)],
            )])
        };

        let s = base()
            .linkable(LinkableFields {
                latlng: Some(SchemaFieldPointer::new("default", "location")),
                url: None,
            })
            .must_build();
        assert!(s.linkable_fields().validate(&s));

        let err = base()
            .linkable(LinkableFields {
                latlng: None,
                url: Some(SchemaFieldPointer::new("default", "nope")),
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidPropertyField(_)));
    }

    #[test]
    fn test_linkable_roles_fill_pointers() {
        let s = Schema::builder("p~1.0.0/e")
            .groups(vec![
                SchemaGroup::builder("default")
                    .fields(vec![
                        SchemaField::builder("location", ValueKind::LatLng)
                            .linkable_as(Linkable::LatLng)
                            .must_build(),
                    ])
                    .must_build(),
            ])
            .must_build();
        assert_eq!(
            s.linkable_fields().latlng,
            Some(SchemaFieldPointer::new("default", "location"))
        );
        assert_eq!(s.linkable_fields().url, None);
    }
}

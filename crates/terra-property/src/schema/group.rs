/*
 * group.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Schema groups.
 */

use std::collections::HashSet;

use terra_id::{FieldId, SchemaGroupId};

use super::condition::Condition;
use super::field::SchemaField;
use crate::error::{PropertyError, Result};
use crate::group::Group;

/// A named set of fields. A list group is instantiated as a repeatable
/// [`GroupList`](crate::GroupList), otherwise as a single [`Group`].
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaGroup {
    id: SchemaGroupId,
    title: String,
    fields: Vec<SchemaField>,
    list: bool,
    representative_field: Option<FieldId>,
    condition: Option<Condition>,
}

impl SchemaGroup {
    pub fn builder(id: impl Into<SchemaGroupId>) -> SchemaGroupBuilder {
        SchemaGroupBuilder {
            group: SchemaGroup {
                id: id.into(),
                title: String::new(),
                fields: Vec::new(),
                list: false,
                representative_field: None,
                condition: None,
            },
        }
    }

    pub fn id(&self) -> &SchemaGroupId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field(&self, id: &FieldId) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.id() == id)
    }

    pub fn has_field(&self, id: &FieldId) -> bool {
        self.field(id).is_some()
    }

    pub fn is_list(&self) -> bool {
        self.list
    }

    pub fn representative_field_id(&self) -> Option<&FieldId> {
        self.representative_field.as_ref()
    }

    pub fn representative_field(&self) -> Option<&SchemaField> {
        self.representative_field
            .as_ref()
            .and_then(|id| self.field(id))
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Whether the group should be shown, given the values of `group`.
    pub fn is_available(&self, group: &Group) -> bool {
        self.condition.as_ref().is_none_or(|c| c.matches(group))
    }
}

/// Builder for [`SchemaGroup`].
#[derive(Debug, Clone)]
pub struct SchemaGroupBuilder {
    group: SchemaGroup,
}

impl SchemaGroupBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.group.title = title.into();
        self
    }

    pub fn fields(mut self, fields: Vec<SchemaField>) -> Self {
        self.group.fields = fields;
        self
    }

    pub fn list(mut self, list: bool) -> Self {
        self.group.list = list;
        self
    }

    pub fn representative_field(mut self, field: impl Into<FieldId>) -> Self {
        self.group.representative_field = Some(field.into());
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.group.condition = Some(condition);
        self
    }

    pub fn build(self) -> Result<SchemaGroup> {
        let group = self.group;
        if group.id.is_empty() {
            return Err(PropertyError::InvalidSchemaGroup(group.id));
        }
        let mut seen = HashSet::new();
        for field in &group.fields {
            if !seen.insert(field.id()) {
                return Err(PropertyError::DuplicatedField(field.id().clone()));
            }
        }
        if let Some(rep) = &group.representative_field
            && !group.has_field(rep)
        {
            return Err(PropertyError::InvalidPropertyField(rep.clone()));
        }
        Ok(group)
    }

    pub fn must_build(self) -> SchemaGroup {
        match self.build() {
            Ok(g) => g,
            Err(e) => panic!("invalid schema group: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use terra_value::ValueKind;

    use super::*;

    #[test]
    fn test_duplicated_field() {
        let err = SchemaGroup::builder("g")
            .fields(vec![
                SchemaField::builder("a", ValueKind::Number).must_build(),
                SchemaField::builder("a", ValueKind::String).must_build(),
            ])
            .build()
            .unwrap_err();
        assert!(matches!(err, PropertyError::DuplicatedField(id) if id.as_str() == "a"));
    }

    #[test]
    fn test_representative_field_must_exist() {
        let err = SchemaGroup::builder("g")
            .representative_field("missing")
            .build()
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidPropertyField(_)));

        let g = SchemaGroup::builder("g")
            .fields(vec![SchemaField::builder("name", ValueKind::String).must_build()])
            .representative_field("name")
            .must_build();
        assert_eq!(g.representative_field().map(|f| f.id().as_str()), Some("name"));
    }
}

/*
 * pointer.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Addressing items and fields inside a property.
 */

use serde::{Deserialize, Serialize};
use terra_id::{FieldId, ItemId, SchemaGroupId};

/// A partial address inside a property.
///
/// Each component narrows the match; an unset component matches anything. A
/// pointer with a field and a schema group addresses the field of a single
/// group, a pointer with a field and an item id addresses the field of that
/// item (or list row).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pointer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_group: Option<SchemaGroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<FieldId>,
}

impl Pointer {
    pub fn new(
        schema_group: Option<SchemaGroupId>,
        item: Option<ItemId>,
        field: Option<FieldId>,
    ) -> Self {
        Self {
            schema_group,
            item,
            field,
        }
    }

    /// Matches every item and field.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn item(item: ItemId) -> Self {
        Self::new(None, Some(item), None)
    }

    pub fn item_by_schema_group(schema_group: impl Into<SchemaGroupId>) -> Self {
        Self::new(Some(schema_group.into()), None, None)
    }

    pub fn field_only(field: impl Into<FieldId>) -> Self {
        Self::new(None, None, Some(field.into()))
    }

    pub fn field(item: ItemId, field: impl Into<FieldId>) -> Self {
        Self::new(None, Some(item), Some(field.into()))
    }

    pub fn field_by_schema_group(
        schema_group: impl Into<SchemaGroupId>,
        field: impl Into<FieldId>,
    ) -> Self {
        Self::new(Some(schema_group.into()), None, Some(field.into()))
    }

    pub fn schema_group(&self) -> Option<&SchemaGroupId> {
        self.schema_group.as_ref()
    }

    pub fn item_id(&self) -> Option<ItemId> {
        self.item
    }

    pub fn field_id(&self) -> Option<&FieldId> {
        self.field.as_ref()
    }

    /// Whether the pointer matches an item of schema group `sg`.
    pub fn test_schema_group(&self, sg: &SchemaGroupId) -> bool {
        self.schema_group.as_ref().is_none_or(|s| s == sg)
    }

    /// Whether the pointer matches item `id` of schema group `sg`.
    pub fn test_item(&self, sg: &SchemaGroupId, id: ItemId) -> bool {
        self.test_schema_group(sg) && self.item.is_none_or(|i| i == id)
    }

    pub fn test_field(&self, field: &FieldId) -> bool {
        self.field.as_ref().is_none_or(|f| f == field)
    }

    /// The same pointer with the field component replaced.
    pub fn with_field(&self, field: impl Into<FieldId>) -> Self {
        Self {
            field: Some(field.into()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use terra_id::SequentialGenerator;

    use super::*;

    #[test]
    fn test_wildcards() {
        let g = SequentialGenerator::new();
        let item = ItemId::generate(&g);
        let sg = SchemaGroupId::from("default");

        let all = Pointer::everything();
        assert!(all.test_item(&sg, item));
        assert!(all.test_field(&"a".into()));

        let by_sg = Pointer::item_by_schema_group("default");
        assert!(by_sg.test_item(&sg, item));
        assert!(!by_sg.test_schema_group(&"other".into()));

        let by_item = Pointer::field(item, "a");
        assert!(by_item.test_item(&sg, item));
        assert!(!by_item.test_item(&sg, ItemId::generate(&g)));
        assert!(!by_item.test_field(&"b".into()));
    }

    #[test]
    fn test_serialization_skips_unset_components() {
        let p = Pointer::field_by_schema_group("default", "size");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "schemaGroup": "default", "field": "size" })
        );
        let back: Pointer = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}

/*
 * sealed.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Resolving the links of a merged property into concrete values.
 */

use serde_json::{Map as JsonMap, Value as Json};
use terra_dataset::GraphLoader;
use terra_id::{DatasetId, FieldId, ItemId, PropertyId, SchemaGroupId, SchemaId};
use terra_value::Value;

use crate::actual::ValueAndDatasetValue;
use crate::error::Result;
use crate::merged::{Merged, MergedField, MergedGroup, merge};
use crate::pointer::Pointer;
use crate::property::Property;

/// Options for [`seal_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealOptions {
    /// Link chains with more hops than this are not resolved.
    pub max_link_depth: usize,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self { max_link_depth: 8 }
    }
}

/// A merged property with every link resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Sealed {
    pub original: Option<PropertyId>,
    pub parent: Option<PropertyId>,
    pub schema: SchemaId,
    pub linked_dataset: Option<DatasetId>,
    pub items: Vec<SealedItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SealedItem {
    pub original: Option<ItemId>,
    pub parent: Option<ItemId>,
    pub schema_group: SchemaGroupId,
    pub list: bool,
    pub linked_dataset: Option<DatasetId>,
    pub fields: Vec<SealedField>,
    pub groups: Vec<SealedItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SealedField {
    pub id: FieldId,
    pub value: ValueAndDatasetValue,
}

impl Sealed {
    /// The item whose original or parent id is `id`, searching list rows too.
    pub fn item(&self, id: ItemId) -> Option<&SealedItem> {
        self.items
            .iter()
            .find_map(|it| if it.matches(id) { Some(it) } else { it.group(id) })
    }

    pub fn item_by_schema_group(&self, sg: &SchemaGroupId) -> Option<&SealedItem> {
        self.items.iter().find(|it| &it.schema_group == sg)
    }

    /// The item a pointer names by item id or schema group.
    pub fn item_by(&self, ptr: &Pointer) -> Option<&SealedItem> {
        match (ptr.item_id(), ptr.schema_group()) {
            (Some(id), _) => self.item(id).filter(|it| ptr.test_schema_group(&it.schema_group)),
            (None, Some(sg)) => self.item_by_schema_group(sg),
            (None, None) => None,
        }
    }

    /// The field a pointer addresses. A field-only pointer searches every
    /// single group.
    pub fn field_by(&self, ptr: &Pointer) -> Option<&SealedField> {
        let field = ptr.field_id()?;
        if ptr.item_id().is_some() || ptr.schema_group().is_some() {
            return self.item_by(ptr)?.field(field);
        }
        self.items.iter().find_map(|it| it.field(field))
    }

    /// Generic representation keyed by schema group id.
    ///
    /// A single group becomes a map of field id to value, a list an array of
    /// such maps where each row also carries its item id under `"id"`.
    pub fn interface(&self) -> Json {
        let mut map = JsonMap::new();
        for item in &self.items {
            map.insert(item.schema_group.to_string(), item.interface());
        }
        Json::Object(map)
    }
}

impl SealedItem {
    pub fn matches(&self, id: ItemId) -> bool {
        self.original == Some(id) || self.parent == Some(id)
    }

    /// The list row `id`.
    pub fn group(&self, id: ItemId) -> Option<&SealedItem> {
        self.groups.iter().find(|g| g.matches(id))
    }

    pub fn field(&self, id: &FieldId) -> Option<&SealedField> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn interface(&self) -> Json {
        if !self.list {
            return Json::Object(self.fields_interface());
        }
        let rows = self.groups.iter().map(|row| {
            let mut map = row.fields_interface();
            if let Some(id) = row.original.or(row.parent) {
                map.insert("id".to_string(), Json::String(id.to_string()));
            }
            Json::Object(map)
        });
        Json::Array(rows.collect())
    }

    fn fields_interface(&self) -> JsonMap<String, Json> {
        self.fields
            .iter()
            .map(|f| (f.id.to_string(), f.value.interface()))
            .collect()
    }
}

impl SealedField {
    /// The effective value, dataset first.
    pub fn value(&self) -> Option<&Value> {
        self.value.value()
    }

    pub fn property_value(&self) -> Option<&Value> {
        self.value.property_value()
    }

    pub fn dataset_value(&self) -> Option<&Value> {
        self.value.dataset_value()
    }
}

/// Resolve the links of `merged` through `loader` with default options.
///
/// Without a loader only literal values are kept. A loader failure aborts the
/// whole call.
pub async fn seal(merged: &Merged, loader: Option<&dyn GraphLoader>) -> Result<Sealed> {
    seal_with_options(merged, loader, &SealOptions::default()).await
}

pub async fn seal_with_options(
    merged: &Merged,
    loader: Option<&dyn GraphLoader>,
    options: &SealOptions,
) -> Result<Sealed> {
    let mut items = Vec::with_capacity(merged.groups.len());
    for group in &merged.groups {
        items.push(seal_group(group, loader, options).await?);
    }
    Ok(Sealed {
        original: merged.original,
        parent: merged.parent,
        schema: merged.schema.clone(),
        linked_dataset: merged.linked_dataset,
        items,
    })
}

/// Seal a single property without resolving any link.
pub fn seal_property(property: &Property) -> Option<Sealed> {
    let merged = merge(Some(property), None, None)?;
    Some(Sealed {
        original: merged.original,
        parent: merged.parent,
        schema: merged.schema.clone(),
        linked_dataset: merged.linked_dataset,
        items: merged.groups.iter().map(literal_group).collect(),
    })
}

async fn seal_group(
    group: &MergedGroup,
    loader: Option<&dyn GraphLoader>,
    options: &SealOptions,
) -> Result<SealedItem> {
    // rows never nest further
    let mut rows = Vec::with_capacity(group.groups.len());
    for row in &group.groups {
        let fields = seal_fields(&row.fields, loader, options).await?;
        rows.push(sealed_item(row, fields, Vec::new()));
    }
    let fields = seal_fields(&group.fields, loader, options).await?;
    Ok(sealed_item(group, fields, rows))
}

async fn seal_fields(
    fields: &[MergedField],
    loader: Option<&dyn GraphLoader>,
    options: &SealOptions,
) -> Result<Vec<SealedField>> {
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let dataset_value = match (loader, &field.links) {
            (Some(loader), Some(links)) if links.len() <= options.max_link_depth => {
                match links.dataset_value(loader).await {
                    Ok(value) => {
                        tracing::trace!(
                            field = %field.id,
                            hops = links.len(),
                            resolved = value.is_some(),
                            "resolved link chain"
                        );
                        value
                    }
                    Err(err) => {
                        tracing::warn!(field = %field.id, error = %err, "dataset loader failed");
                        return Err(err.into());
                    }
                }
            }
            (Some(_), Some(links)) => {
                tracing::debug!(
                    field = %field.id,
                    hops = links.len(),
                    max = options.max_link_depth,
                    "link chain too long, not resolving"
                );
                None
            }
            _ => None,
        };
        out.push(SealedField {
            id: field.id.clone(),
            value: ValueAndDatasetValue::new(field.kind, dataset_value, field.value.clone()),
        });
    }
    Ok(out)
}

fn literal_group(group: &MergedGroup) -> SealedItem {
    let literal = |fields: &[MergedField]| {
        fields
            .iter()
            .map(|f| SealedField {
                id: f.id.clone(),
                value: ValueAndDatasetValue::new(f.kind, None, f.value.clone()),
            })
            .collect()
    };
    let rows = group
        .groups
        .iter()
        .map(|row| sealed_item(row, literal(&row.fields), Vec::new()))
        .collect();
    sealed_item(group, literal(&group.fields), rows)
}

fn sealed_item(group: &MergedGroup, fields: Vec<SealedField>, groups: Vec<SealedItem>) -> SealedItem {
    SealedItem {
        original: group.original,
        parent: group.parent,
        schema_group: group.schema_group.clone(),
        list: group.list,
        linked_dataset: group.linked_dataset,
        fields,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use terra_dataset::{Dataset, DatasetField, LoadError};
    use terra_id::{DatasetFieldId, DatasetSchemaId, IdGenerator, SceneId, SequentialGenerator};
    use terra_value::OptionalValue;

    use super::*;
    use crate::field::Field;
    use crate::group::Group;
    use crate::link::{Link, Links};

    struct Broken;

    #[async_trait]
    impl GraphLoader for Broken {
        async fn load_graph(
            &self,
            _root: DatasetId,
            _fields: &[DatasetFieldId],
        ) -> std::result::Result<(Vec<Dataset>, Option<DatasetField>), LoadError> {
            Err(LoadError::other("disk on fire"))
        }
    }

    fn linked_property(g: &dyn IdGenerator, links: Links) -> Property {
        let group = Group::builder()
            .new_id(g)
            .schema_group("default")
            .fields(vec![
                Field::new("label", OptionalValue::of(Value::from("literal"))).with_links(links),
                Field::new("size", OptionalValue::of(Value::Number(2.0))),
            ])
            .must_build();
        Property::builder()
            .new_id(g)
            .scene(SceneId::generate(g))
            .schema("p~1.0.0/x")
            .items(vec![group.into()])
            .must_build()
    }

    fn chain(g: &dyn IdGenerator, hops: usize) -> Links {
        let schema = DatasetSchemaId::generate(g);
        Links::new(
            (0..hops)
                .map(|_| Link::new(DatasetId::generate(g), schema, DatasetFieldId::generate(g)))
                .collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_loader_errors_abort() {
        let g = SequentialGenerator::new();
        let p = linked_property(&g, chain(&g, 1));
        let merged = merge(Some(&p), None, None).unwrap();
        let err = seal(&merged, Some(&Broken)).await.unwrap_err();
        assert_eq!(err.to_string(), "dataset loader error: disk on fire");
        assert_eq!(err.error_class(), crate::ErrorClass::Server);
    }

    #[tokio::test]
    async fn test_long_chains_are_not_resolved() {
        let g = SequentialGenerator::new();
        let p = linked_property(&g, chain(&g, 3));
        let merged = merge(Some(&p), None, None).unwrap();
        let options = SealOptions { max_link_depth: 2 };
        // the broken loader is never called
        let sealed = seal_with_options(&merged, Some(&Broken), &options).await.unwrap();
        let label = sealed.field_by(&Pointer::field_only("label")).unwrap();
        assert_eq!(label.value(), Some(&Value::from("literal")));
    }

    #[test]
    fn test_seal_property_keeps_literals() {
        let g = SequentialGenerator::new();
        let p = linked_property(&g, chain(&g, 1));
        let sealed = seal_property(&p).unwrap();
        assert_eq!(sealed.original, Some(p.id()));
        assert_eq!(sealed.parent, None);

        let label = sealed.field_by(&Pointer::field_only("label")).unwrap();
        assert_eq!(label.dataset_value(), None);
        assert_eq!(label.value(), Some(&Value::from("literal")));

        let item = p.items()[0].clone();
        let by_id = sealed.item(crate::PropertyItem::id(&item)).unwrap();
        assert_eq!(by_id.schema_group.as_str(), "default");
        assert!(sealed.item_by(&Pointer::item_by_schema_group("default")).is_some());
        assert!(sealed.item_by(&Pointer::item_by_schema_group("other")).is_none());
        assert_eq!(
            sealed
                .field_by(&Pointer::field_by_schema_group("default", "size"))
                .and_then(SealedField::value),
            Some(&Value::Number(2.0))
        );
        assert_eq!(
            sealed.interface(),
            serde_json::json!({ "default": { "label": "literal", "size": 2 } })
        );
    }

    #[test]
    fn test_default_options() {
        assert_eq!(SealOptions::default().max_link_depth, 8);
    }
}

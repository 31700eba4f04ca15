/*
 * merged.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Combining an overriding property with the property it inherits from.
 */

//! Property merging.
//!
//! [`merge`] lays an *original* property over a *parent* property of the same
//! schema and yields a read-only [`Merged`] tree:
//!
//! - items are matched by schema group, original items first;
//! - a single group merges field by field, the original's field winning when
//!   it exists;
//! - a list is taken whole from the original when the original has it,
//!   otherwise from the parent;
//! - links come from the original field if it has any, else from the parent,
//!   and an unbound first hop is bound to the linked dataset.
//!
//! Every node records which side it came from.

use terra_dataset::{GraphLoader, LoadError};
use terra_id::{DatasetId, FieldId, ItemId, PropertyId, SchemaGroupId, SchemaId};
use terra_value::{Value, ValueKind};

use crate::field::Field;
use crate::group::Group;
use crate::item::{Item, PropertyItem, extend_unique};
use crate::link::Links;
use crate::property::Property;

/// Two properties viewed as one.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub original: Option<PropertyId>,
    pub parent: Option<PropertyId>,
    pub schema: SchemaId,
    pub linked_dataset: Option<DatasetId>,
    pub groups: Vec<MergedGroup>,
}

/// A merged item. List items carry their rows in `groups`, single groups
/// carry `fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedGroup {
    pub original: Option<ItemId>,
    pub parent: Option<ItemId>,
    pub schema_group: SchemaGroupId,
    pub list: bool,
    pub linked_dataset: Option<DatasetId>,
    pub groups: Vec<MergedGroup>,
    pub fields: Vec<MergedField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedField {
    pub id: FieldId,
    pub kind: ValueKind,
    pub value: Option<Value>,
    pub links: Option<Links>,
    /// The original supplies the field and the parent defines it too.
    pub overridden: bool,
}

impl Merged {
    /// Ids of the merged properties, original first.
    pub fn properties(&self) -> Vec<PropertyId> {
        self.original.into_iter().chain(self.parent).collect()
    }

    /// Datasets referenced by the merged links, without duplicates.
    pub fn datasets(&self) -> Vec<DatasetId> {
        let mut ids = Vec::new();
        for g in &self.groups {
            extend_unique(&mut ids, g.datasets());
        }
        ids
    }

    pub fn group_by_schema_group(&self, sg: &SchemaGroupId) -> Option<&MergedGroup> {
        self.groups.iter().find(|g| &g.schema_group == sg)
    }
}

impl MergedGroup {
    pub fn field(&self, id: &FieldId) -> Option<&MergedField> {
        self.fields.iter().find(|f| &f.id == id)
    }

    /// Whether `id` is this group's original or parent item.
    pub fn matches(&self, id: ItemId) -> bool {
        self.original == Some(id) || self.parent == Some(id)
    }

    pub fn datasets(&self) -> Vec<DatasetId> {
        let mut ids = Vec::new();
        for f in &self.fields {
            extend_unique(&mut ids, f.links.iter().flat_map(Links::datasets));
        }
        for g in &self.groups {
            extend_unique(&mut ids, g.datasets());
        }
        ids
    }
}

impl MergedField {
    pub fn is_linked(&self) -> bool {
        self.links.is_some()
    }

    /// Resolve the field's links through `loader`.
    pub async fn dataset_value(
        &self,
        loader: &dyn GraphLoader,
    ) -> Result<Option<Value>, LoadError> {
        match &self.links {
            Some(links) => links.dataset_value(loader).await,
            None => Ok(None),
        }
    }
}

/// Merge `original` over `parent`.
///
/// Returns `None` when both are absent or their schemas differ.
pub fn merge(
    original: Option<&Property>,
    parent: Option<&Property>,
    linked_dataset: Option<DatasetId>,
) -> Option<Merged> {
    let schema = original.or(parent)?.schema().clone();
    if let (Some(o), Some(p)) = (original, parent)
        && o.schema() != p.schema()
    {
        tracing::debug!(
            original = %o.id(),
            parent = %p.id(),
            original_schema = %o.schema(),
            parent_schema = %p.schema(),
            "not merging properties of different schemas"
        );
        return None;
    }

    let groups = merge_items(
        original.map(Property::items).unwrap_or_default(),
        parent.map(Property::items).unwrap_or_default(),
        linked_dataset,
    );
    Some(Merged {
        original: original.map(Property::id),
        parent: parent.map(Property::id),
        schema,
        linked_dataset,
        groups,
    })
}

fn merge_items(original: &[Item], parent: &[Item], linked: Option<DatasetId>) -> Vec<MergedGroup> {
    let mut consumed = vec![false; parent.len()];
    let mut out = Vec::with_capacity(original.len().max(parent.len()));

    for o in original {
        let matched = (0..parent.len())
            .find(|&i| !consumed[i] && parent[i].schema_group() == o.schema_group());
        if let Some(i) = matched {
            consumed[i] = true;
        }
        if let Some(g) = merge_item(Some(o), matched.map(|i| &parent[i]), linked) {
            out.push(g);
        }
    }
    for (p, used) in parent.iter().zip(consumed) {
        if !used && let Some(g) = merge_item(None, Some(p), linked) {
            out.push(g);
        }
    }
    out
}

fn merge_item(
    original: Option<&Item>,
    parent: Option<&Item>,
    linked: Option<DatasetId>,
) -> Option<MergedGroup> {
    let schema_group = original.or(parent)?.schema_group().clone();

    if !original.is_some_and(Item::is_list) && !parent.is_some_and(Item::is_list) {
        return merge_group(
            original.and_then(Item::as_group),
            parent.and_then(Item::as_group),
            linked,
        );
    }

    // rows are never matched across sides
    let groups = match (
        original.and_then(Item::as_group_list),
        parent.and_then(Item::as_group_list),
    ) {
        (Some(list), _) => list
            .groups()
            .iter()
            .filter_map(|g| merge_group(Some(g), None, linked))
            .collect(),
        (None, Some(list)) => list
            .groups()
            .iter()
            .filter_map(|g| merge_group(None, Some(g), linked))
            .collect(),
        (None, None) => Vec::new(),
    };

    Some(MergedGroup {
        original: original.map(PropertyItem::id),
        parent: parent.map(PropertyItem::id),
        schema_group,
        list: true,
        linked_dataset: linked,
        groups,
        fields: Vec::new(),
    })
}

fn merge_group(
    original: Option<&Group>,
    parent: Option<&Group>,
    linked: Option<DatasetId>,
) -> Option<MergedGroup> {
    let schema_group = original.or(parent)?.schema_group().clone();

    let mut ids: Vec<&FieldId> = Vec::new();
    for id in original
        .into_iter()
        .chain(parent)
        .flat_map(|g| g.field_ids())
    {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    let fields = ids
        .into_iter()
        .filter_map(|id| {
            merge_field(
                original.and_then(|g| g.field(id)),
                parent.and_then(|g| g.field(id)),
                linked,
            )
        })
        .collect();

    Some(MergedGroup {
        original: original.map(PropertyItem::id),
        parent: parent.map(PropertyItem::id),
        schema_group,
        list: false,
        linked_dataset: linked,
        groups: Vec::new(),
        fields,
    })
}

fn merge_field(
    original: Option<&Field>,
    parent: Option<&Field>,
    linked: Option<DatasetId>,
) -> Option<MergedField> {
    let base = original.or(parent)?;
    if let (Some(o), Some(p)) = (original, parent)
        && o.kind() != p.kind()
    {
        tracing::debug!(
            field = %o.id(),
            original = %o.kind(),
            parent = %p.kind(),
            "dropping field whose kinds disagree"
        );
        return None;
    }

    let links = original
        .and_then(Field::links)
        .or_else(|| parent.and_then(Field::links))
        .map(|l| l.apply_dataset(linked));

    let value = match original {
        Some(o) => o.value().cloned(),
        None => parent.and_then(Field::value).cloned(),
    };

    Some(MergedField {
        id: base.id().clone(),
        kind: base.kind(),
        value,
        links,
        overridden: original.is_some() && parent.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use terra_id::{DatasetFieldId, DatasetSchemaId, SceneId, SequentialGenerator};
    use terra_value::OptionalValue;

    use super::*;
    use crate::group_list::GroupList;
    use crate::link::Link;

    fn group(g: &SequentialGenerator, sg: &str, fields: Vec<Field>) -> Group {
        Group::builder()
            .new_id(g)
            .schema_group(sg)
            .fields(fields)
            .must_build()
    }

    fn number(id: &str, n: f64) -> Field {
        Field::new(id, OptionalValue::of(Value::Number(n)))
    }

    fn property(g: &SequentialGenerator, schema: &str, items: Vec<Item>) -> Property {
        Property::builder()
            .new_id(g)
            .scene(SceneId::generate(g))
            .schema(schema)
            .items(items)
            .must_build()
    }

    fn values(m: &MergedGroup) -> Vec<(&str, Option<&Value>, bool)> {
        m.fields
            .iter()
            .map(|f| (f.id.as_str(), f.value.as_ref(), f.overridden))
            .collect()
    }

    #[test]
    fn test_nothing_to_merge() {
        assert!(merge(None, None, None).is_none());
    }

    #[test]
    fn test_schema_mismatch() {
        let g = SequentialGenerator::new();
        let a = property(&g, "a~1.0.0/x", vec![]);
        let b = property(&g, "b~1.0.0/x", vec![]);
        assert!(merge(Some(&a), Some(&b), None).is_none());
    }

    #[test]
    fn test_field_precedence() {
        let g = SequentialGenerator::new();
        let o = property(
            &g,
            "p~1.0.0/x",
            vec![
                group(
                    &g,
                    "default",
                    vec![
                        number("a", 1.0),
                        Field::new("c", OptionalValue::empty(ValueKind::Number)),
                    ],
                )
                .into(),
            ],
        );
        let p = property(
            &g,
            "p~1.0.0/x",
            vec![
                group(
                    &g,
                    "default",
                    vec![number("b", 2.0), number("a", 3.0), number("c", 4.0)],
                )
                .into(),
            ],
        );
        let m = merge(Some(&o), Some(&p), None).unwrap();
        assert_eq!(m.properties(), vec![o.id(), p.id()]);
        assert_eq!(m.groups.len(), 1);
        let n = |x: f64| Value::Number(x);
        assert_eq!(
            values(&m.groups[0]),
            vec![
                ("a", Some(&n(1.0)), true),
                // the original's empty field still wins
                ("c", None, true),
                ("b", Some(&n(2.0)), false),
            ]
        );
        assert_eq!(m.groups[0].original, Some(o.items()[0].id()));
        assert_eq!(m.groups[0].parent, Some(p.items()[0].id()));
    }

    #[test]
    fn test_kind_conflicts_are_dropped() {
        let g = SequentialGenerator::new();
        let text = Field::new("a", OptionalValue::of(Value::from("1")));
        let o = property(&g, "p~1.0.0/x", vec![group(&g, "default", vec![number("a", 1.0)]).into()]);
        let p = property(&g, "p~1.0.0/x", vec![group(&g, "default", vec![text]).into()]);
        let m = merge(Some(&o), Some(&p), None).unwrap();
        assert!(m.groups[0].fields.is_empty());
    }

    #[test]
    fn test_item_order_and_provenance() {
        let g = SequentialGenerator::new();
        let o = property(
            &g,
            "p~1.0.0/x",
            vec![
                group(&g, "second", vec![number("x", 1.0)]).into(),
                group(&g, "first", vec![number("y", 1.0)]).into(),
            ],
        );
        let p = property(
            &g,
            "p~1.0.0/x",
            vec![
                group(&g, "first", vec![number("y", 2.0)]).into(),
                group(&g, "third", vec![number("z", 3.0)]).into(),
            ],
        );
        let m = merge(Some(&o), Some(&p), None).unwrap();
        let order: Vec<&str> = m.groups.iter().map(|g| g.schema_group.as_str()).collect();
        assert_eq!(order, ["second", "first", "third"]);
        let sides: Vec<(bool, bool)> = m
            .groups
            .iter()
            .map(|g| (g.original.is_some(), g.parent.is_some()))
            .collect();
        assert_eq!(sides, [(true, false), (true, true), (false, true)]);
    }

    #[test]
    fn test_lists_are_taken_whole() {
        let g = SequentialGenerator::new();
        let list = |rows: Vec<Group>| -> Item {
            GroupList::builder()
                .new_id(&g)
                .schema_group("rows")
                .groups(rows)
                .must_build()
                .into()
        };
        let o_rows = vec![group(&g, "rows", vec![number("v", 1.0)])];
        let p_rows = vec![
            group(&g, "rows", vec![number("v", 2.0)]),
            group(&g, "rows", vec![number("v", 3.0)]),
        ];
        let o = property(&g, "p~1.0.0/x", vec![list(o_rows)]);
        let p = property(&g, "p~1.0.0/x", vec![list(p_rows)]);

        let m = merge(Some(&o), Some(&p), None).unwrap();
        let rows = &m.groups[0].groups;
        assert!(m.groups[0].list);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields[0].value, Some(Value::Number(1.0)));
        assert!(!rows[0].fields[0].overridden);
        assert!(rows[0].parent.is_none());

        // without an original list the parent's rows are used
        let empty = property(&g, "p~1.0.0/x", vec![]);
        let m = merge(Some(&empty), Some(&p), None).unwrap();
        assert_eq!(m.groups[0].groups.len(), 2);
        assert!(m.groups[0].groups.iter().all(|r| r.original.is_none()));
    }

    #[test]
    fn test_links() {
        let g = SequentialGenerator::new();
        let (schema, field) = (DatasetSchemaId::generate(&g), DatasetFieldId::generate(&g));
        let linked = DatasetId::generate(&g);
        let template = Links::single(Link::schema_only(schema, field));
        let bound = Links::single(Link::new(DatasetId::generate(&g), schema, field));

        let empty = || Field::new("a", OptionalValue::empty(ValueKind::String));
        let o = property(&g, "p~1.0.0/x", vec![group(&g, "default", vec![empty()]).into()]);
        let p = property(
            &g,
            "p~1.0.0/x",
            vec![group(&g, "default", vec![empty().with_links(template)]).into()],
        );

        // the parent's template is bound to the linked dataset
        let m = merge(Some(&o), Some(&p), Some(linked)).unwrap();
        let f = &m.groups[0].fields[0];
        assert_eq!(f.links.as_ref().map(Links::datasets), Some(vec![linked]));
        assert_eq!(m.datasets(), vec![linked]);

        // the original's own links take precedence and keep their dataset
        let o2 = property(
            &g,
            "p~1.0.0/x",
            vec![group(&g, "default", vec![empty().with_links(bound.clone())]).into()],
        );
        let m = merge(Some(&o2), Some(&p), Some(linked)).unwrap();
        assert_eq!(m.groups[0].fields[0].links, Some(bound));
    }
}

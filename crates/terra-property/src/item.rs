/*
 * item.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Top-level items of a property.
 */

use terra_dataset::Loader;
use terra_id::{DatasetId, DatasetSchemaId, IdGenerator, ItemId, SchemaGroupId};

use crate::error::Result;
use crate::group::Group;
use crate::group_list::GroupList;
use crate::schema::SchemaGroup;

/// Behaviour shared by [`Group`], [`GroupList`] and [`Item`].
pub trait PropertyItem {
    fn id(&self) -> ItemId;

    fn schema_group(&self) -> &SchemaGroupId;

    /// Whether the item holds nothing worth keeping.
    fn is_empty(&self) -> bool;

    /// Drop empty fields. Returns whether anything was removed.
    fn prune(&mut self) -> bool;

    fn has_linked_field(&self) -> bool;

    /// Datasets referenced by the item's links, without duplicates.
    fn datasets(&self) -> Vec<DatasetId>;

    fn is_dataset_linked(&self, schema: DatasetSchemaId, dataset: DatasetId) -> bool;

    /// Unlink every field whose chain passes through `dataset` of `schema`.
    fn unlink_all_by_dataset(&mut self, schema: DatasetSchemaId, dataset: DatasetId) -> bool;

    /// Check the item against its schema group.
    fn validate_schema(&self, schema_group: &SchemaGroup) -> Result<()>;
}

/// An instance of a schema group: a single [`Group`] or a repeatable
/// [`GroupList`].
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Group(Group),
    GroupList(GroupList),
}

impl Item {
    /// An empty item of the shape `schema_group` declares.
    pub fn init(schema_group: &SchemaGroup, generator: &dyn IdGenerator) -> Item {
        let id = ItemId::generate(generator);
        if schema_group.is_list() {
            Item::GroupList(GroupList::new(id, schema_group.id().clone()))
        } else {
            Item::Group(Group::new(id, schema_group.id().clone()))
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Item::GroupList(_))
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Item::Group(g) => Some(g),
            Item::GroupList(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Item::Group(g) => Some(g),
            Item::GroupList(_) => None,
        }
    }

    pub fn as_group_list(&self) -> Option<&GroupList> {
        match self {
            Item::GroupList(l) => Some(l),
            Item::Group(_) => None,
        }
    }

    pub fn as_group_list_mut(&mut self) -> Option<&mut GroupList> {
        match self {
            Item::GroupList(l) => Some(l),
            Item::Group(_) => None,
        }
    }

    pub async fn migrate_schema(
        &mut self,
        schema_group: &SchemaGroup,
        loader: &dyn Loader,
    ) -> Result<()> {
        match self {
            Item::Group(g) => g.migrate_schema(schema_group, loader).await,
            Item::GroupList(l) => l.migrate_schema(schema_group, loader).await,
        }
    }

    /// Whether the item has no structure left: a group without fields or a
    /// list without rows.
    pub(crate) fn is_hollow(&self) -> bool {
        match self {
            Item::Group(g) => g.fields().is_empty(),
            Item::GroupList(l) => l.groups().is_empty(),
        }
    }
}

impl From<Group> for Item {
    fn from(g: Group) -> Self {
        Item::Group(g)
    }
}

impl From<GroupList> for Item {
    fn from(l: GroupList) -> Self {
        Item::GroupList(l)
    }
}

impl PropertyItem for Item {
    fn id(&self) -> ItemId {
        match self {
            Item::Group(g) => g.id(),
            Item::GroupList(l) => l.id(),
        }
    }

    fn schema_group(&self) -> &SchemaGroupId {
        match self {
            Item::Group(g) => g.schema_group(),
            Item::GroupList(l) => l.schema_group(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Item::Group(g) => g.is_empty(),
            Item::GroupList(l) => l.is_empty(),
        }
    }

    fn prune(&mut self) -> bool {
        match self {
            Item::Group(g) => g.prune(),
            Item::GroupList(l) => l.prune(),
        }
    }

    fn has_linked_field(&self) -> bool {
        match self {
            Item::Group(g) => g.has_linked_field(),
            Item::GroupList(l) => l.has_linked_field(),
        }
    }

    fn datasets(&self) -> Vec<DatasetId> {
        match self {
            Item::Group(g) => g.datasets(),
            Item::GroupList(l) => l.datasets(),
        }
    }

    fn is_dataset_linked(&self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        match self {
            Item::Group(g) => g.is_dataset_linked(schema, dataset),
            Item::GroupList(l) => l.is_dataset_linked(schema, dataset),
        }
    }

    fn unlink_all_by_dataset(&mut self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        match self {
            Item::Group(g) => g.unlink_all_by_dataset(schema, dataset),
            Item::GroupList(l) => l.unlink_all_by_dataset(schema, dataset),
        }
    }

    fn validate_schema(&self, schema_group: &SchemaGroup) -> Result<()> {
        match self {
            Item::Group(g) => g.validate_schema(schema_group),
            Item::GroupList(l) => l.validate_schema(schema_group),
        }
    }
}

/// Append the ids of `from` to `into`, skipping ids already present.
pub(crate) fn extend_unique(into: &mut Vec<DatasetId>, from: impl IntoIterator<Item = DatasetId>) {
    for id in from {
        if !into.contains(&id) {
            into.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use terra_id::SequentialGenerator;
    use terra_value::ValueKind;

    use super::*;
    use crate::schema::SchemaField;

    #[test]
    fn test_init_follows_schema_shape() {
        let g = SequentialGenerator::new();
        let single = SchemaGroup::builder("default")
            .fields(vec![SchemaField::builder("a", ValueKind::Bool).must_build()])
            .must_build();
        let list = SchemaGroup::builder("rows").list(true).must_build();

        let item = Item::init(&single, &g);
        assert!(!item.is_list());
        assert_eq!(item.schema_group().as_str(), "default");
        assert!(item.is_empty());

        let item = Item::init(&list, &g);
        assert!(item.is_list());
        assert!(item.as_group().is_none());
        assert!(item.as_group_list().is_some_and(|l| l.groups().is_empty()));
    }
}

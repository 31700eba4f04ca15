/*
 * group_list.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Repeatable instances of a schema group.
 */

use std::collections::HashSet;

use terra_dataset::Loader;
use terra_id::{DatasetId, DatasetSchemaId, IdGenerator, ItemId, SchemaGroupId};

use crate::error::{PropertyError, Result};
use crate::group::Group;
use crate::item::{PropertyItem, extend_unique};
use crate::schema::SchemaGroup;

/// An ordered list of groups sharing one schema group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupList {
    id: ItemId,
    schema_group: SchemaGroupId,
    groups: Vec<Group>,
}

impl GroupList {
    /// An empty list.
    pub fn new(id: ItemId, schema_group: SchemaGroupId) -> Self {
        Self {
            id,
            schema_group,
            groups: Vec::new(),
        }
    }

    pub fn builder() -> GroupListBuilder {
        GroupListBuilder::default()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: ItemId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id() == id)
    }

    pub fn group_mut(&mut self, id: ItemId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id() == id)
    }

    pub fn group_at(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    pub fn has(&self, id: ItemId) -> bool {
        self.group(id).is_some()
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.groups.iter().position(|g| g.id() == id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Insert `group` at `index`, or append it when `index` is `None` or past
    /// the end.
    ///
    /// The group must belong to the list's schema group and must not already
    /// be in the list.
    pub fn add(&mut self, group: Group, index: Option<usize>) -> Result<()> {
        if group.schema_group() != &self.schema_group {
            return Err(PropertyError::InvalidItem(format!(
                "group of '{}' cannot join a list of '{}'",
                group.schema_group(),
                self.schema_group
            )));
        }
        if self.has(group.id()) {
            return Err(PropertyError::InvalidItem(format!(
                "group {} is already in the list",
                group.id()
            )));
        }
        match index {
            Some(i) if i < self.groups.len() => self.groups.insert(i, group),
            _ => self.groups.push(group),
        }
        Ok(())
    }

    /// Move the group at `from` to `to`. `to` is clamped to the list bounds;
    /// an out-of-range `from` does nothing.
    pub fn move_at(&mut self, from: usize, to: usize) {
        if from >= self.groups.len() {
            return;
        }
        let group = self.groups.remove(from);
        let to = to.min(self.groups.len());
        self.groups.insert(to, group);
    }

    /// Move group `id` to `to`, clamped.
    pub fn move_group(&mut self, id: ItemId, to: usize) -> bool {
        match self.index_of(id) {
            Some(from) => {
                self.move_at(from, to);
                true
            }
            None => false,
        }
    }

    /// Remove the group at `index`; out of range does nothing.
    pub fn remove_at(&mut self, index: usize) -> Option<Group> {
        (index < self.groups.len()).then(|| self.groups.remove(index))
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Group> {
        let index = self.index_of(id)?;
        self.remove_at(index)
    }

    /// Migrate every row to `schema_group` of a new schema.
    pub async fn migrate_schema(
        &mut self,
        schema_group: &SchemaGroup,
        loader: &dyn Loader,
    ) -> Result<()> {
        for group in &mut self.groups {
            group.migrate_schema(schema_group, loader).await?;
        }
        Ok(())
    }

    pub(crate) fn groups_mut(&mut self) -> &mut Vec<Group> {
        &mut self.groups
    }
}

impl PropertyItem for GroupList {
    fn id(&self) -> ItemId {
        self.id
    }

    fn schema_group(&self) -> &SchemaGroupId {
        &self.schema_group
    }

    /// A list is empty when it has no rows; empty rows still count.
    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn prune(&mut self) -> bool {
        let mut changed = false;
        for g in &mut self.groups {
            changed |= g.prune();
        }
        changed
    }

    fn has_linked_field(&self) -> bool {
        self.groups.iter().any(Group::has_linked_field)
    }

    fn datasets(&self) -> Vec<DatasetId> {
        let mut ids = Vec::new();
        for g in &self.groups {
            extend_unique(&mut ids, g.datasets());
        }
        ids
    }

    fn is_dataset_linked(&self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        self.groups.iter().any(|g| g.is_dataset_linked(schema, dataset))
    }

    fn unlink_all_by_dataset(&mut self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        let mut changed = false;
        for g in &mut self.groups {
            changed |= g.unlink_all_by_dataset(schema, dataset);
        }
        changed
    }

    fn validate_schema(&self, schema_group: &SchemaGroup) -> Result<()> {
        if schema_group.id() != &self.schema_group || !schema_group.is_list() {
            return Err(PropertyError::InvalidSchemaGroup(self.schema_group.clone()));
        }
        self.groups
            .iter()
            .try_for_each(|g| g.validate_schema(schema_group))
    }
}

/// Builder for [`GroupList`].
#[derive(Debug, Clone, Default)]
pub struct GroupListBuilder {
    id: Option<ItemId>,
    schema_group: SchemaGroupId,
    groups: Vec<Group>,
}

impl GroupListBuilder {
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

    pub fn groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = groups;
        self
    }

    pub fn build(self) -> Result<GroupList> {
        let id = self.id.ok_or(PropertyError::InvalidId)?;
        if self.schema_group.is_empty() {
            return Err(PropertyError::InvalidSchemaGroup(self.schema_group));
        }
        let mut seen = HashSet::new();
        for g in &self.groups {
            if g.schema_group() != &self.schema_group {
                return Err(PropertyError::InvalidItem(format!(
                    "group of '{}' in a list of '{}'",
                    g.schema_group(),
                    self.schema_group
                )));
            }
            if !seen.insert(g.id()) {
                return Err(PropertyError::InvalidItem(format!(
                    "group {} appears twice",
                    g.id()
                )));
            }
        }
        Ok(GroupList {
            id,
            schema_group: self.schema_group,
            groups: self.groups,
        })
    }

    pub fn must_build(self) -> GroupList {
        match self.build() {
            Ok(l) => l,
            Err(e) => panic!("invalid group list: {e}"),
        }
    }
}

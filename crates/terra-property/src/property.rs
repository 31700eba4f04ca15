/*
 * property.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Property instances and their mutation surface.
 */

use std::collections::HashSet;

use terra_dataset::{DatasetSchema, Loader};
use terra_id::{
    DatasetId, DatasetSchemaId, IdGenerator, ItemId, PropertyId, SceneId, SchemaGroupId, SchemaId,
};
use terra_value::{Value, ValueKind};

use crate::error::{PropertyError, Result};
use crate::field::Field;
use crate::group::Group;
use crate::group_list::GroupList;
use crate::item::{Item, PropertyItem, extend_unique};
use crate::link::Links;
use crate::pointer::Pointer;
use crate::schema::{Schema, SchemaField, SchemaGroup};

/// Position of a group: the top-level item and, for lists, the row.
#[derive(Debug, Clone, Copy)]
struct GroupPos {
    item: usize,
    row: Option<usize>,
}

/// A schema-validated set of values attached to a scene element.
///
/// Holds at most one item per schema group. Mutators that may need to create
/// items take the [`IdGenerator`] that mints their ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    id: PropertyId,
    scene: SceneId,
    schema: SchemaId,
    items: Vec<Item>,
}

impl Property {
    pub fn builder() -> PropertyBuilder {
        PropertyBuilder::default()
    }

    pub fn id(&self) -> PropertyId {
        self.id
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn schema(&self) -> &SchemaId {
        &self.schema
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The top-level item `id`.
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|it| it.id() == id)
    }

    pub fn item_by_schema_group(&self, sg: &SchemaGroupId) -> Option<&Item> {
        self.items.iter().find(|it| it.schema_group() == sg)
    }

    pub fn group_by_schema_group(&self, sg: &SchemaGroupId) -> Option<&Group> {
        self.item_by_schema_group(sg).and_then(Item::as_group)
    }

    pub fn group_list_by_schema_group(&self, sg: &SchemaGroupId) -> Option<&GroupList> {
        self.item_by_schema_group(sg).and_then(Item::as_group_list)
    }

    /// The top-level item a pointer names, by item id or by schema group.
    pub fn item_by_pointer(&self, ptr: &Pointer) -> Option<&Item> {
        match ptr.item_id() {
            Some(id) => self
                .item(id)
                .filter(|it| ptr.test_schema_group(it.schema_group())),
            None => self.item_by_schema_group(ptr.schema_group()?),
        }
    }

    /// The group a pointer addresses, with its enclosing list if it is a row.
    pub fn group_and_list(&self, ptr: &Pointer) -> (Option<&Group>, Option<&GroupList>) {
        match self.locate_group(ptr) {
            Some(pos) => (self.group_at(pos), self.list_at(pos)),
            None => (None, None),
        }
    }

    /// Resolve a pointer to an existing field, its enclosing list (for rows)
    /// and its group.
    pub fn field(&self, ptr: &Pointer) -> Option<(&Field, Option<&GroupList>, &Group)> {
        let pos = self.locate_group(ptr)?;
        let group = self.group_at(pos)?;
        let field = group.field(ptr.field_id()?)?;
        Some((field, self.list_at(pos), group))
    }

    /// Every field matching `ptr`, with unset pointer components acting as
    /// wildcards. List rows match by their own id or by the list's.
    pub fn fields(&self, ptr: &Pointer) -> Vec<&Field> {
        let mut out = Vec::new();
        for item in &self.items {
            let sg = item.schema_group();
            let groups: Vec<&Group> = match item {
                Item::Group(g) if ptr.test_item(sg, g.id()) => vec![g],
                Item::GroupList(l) => {
                    let whole = ptr.test_item(sg, l.id());
                    l.groups()
                        .iter()
                        .filter(|g| whole || ptr.test_item(sg, g.id()))
                        .collect()
                }
                Item::Group(_) => continue,
            };
            for g in groups {
                out.extend(g.fields().iter().filter(|f| ptr.test_field(f.id())));
            }
        }
        out
    }

    /// Resolve the schema group and schema field a pointer addresses.
    pub fn schema_field<'s>(
        &self,
        schema: &'s Schema,
        ptr: &Pointer,
    ) -> Option<(&'s SchemaGroup, &'s SchemaField)> {
        let sg = self.schema_group_for(schema, ptr)?;
        Some((sg, sg.field(ptr.field_id()?)?))
    }

    /// The top-level item for the pointer's schema group, created empty if
    /// missing. A pointer naming an item id never creates.
    pub fn get_or_create_item(
        &mut self,
        schema: &Schema,
        ptr: &Pointer,
        generator: &dyn IdGenerator,
    ) -> Option<(&mut Item, bool)> {
        if schema.id() != &self.schema {
            return None;
        }
        if let Some(id) = ptr.item_id() {
            let i = self.items.iter().position(|it| it.id() == id)?;
            return Some((&mut self.items[i], false));
        }
        let sg = match ptr.schema_group() {
            Some(sg) => schema.group(sg)?,
            None => schema.group_by_field(ptr.field_id()?)?,
        };
        if let Some(i) = self.items.iter().position(|it| it.schema_group() == sg.id()) {
            return Some((&mut self.items[i], false));
        }
        self.items.push(Item::init(sg, generator));
        self.items.last_mut().map(|it| (it, true))
    }

    /// The group a pointer addresses, creating the top-level group if the
    /// schema group is not a list. List rows are only created through
    /// [`add_list_item`](Self::add_list_item).
    pub fn get_or_create_group(
        &mut self,
        schema: &Schema,
        ptr: &Pointer,
        generator: &dyn IdGenerator,
    ) -> Option<(&mut Group, bool)> {
        if schema.id() != &self.schema {
            return None;
        }
        if let Some(pos) = self.locate_group(ptr) {
            return self.group_at_mut(pos).map(|g| (g, false));
        }
        if ptr.item_id().is_some() {
            return None;
        }
        let sg = match ptr.schema_group() {
            Some(sg) => schema.group(sg)?,
            None => schema.group_by_field(ptr.field_id()?)?,
        };
        if sg.is_list() {
            return None;
        }
        let by_group = Pointer::item_by_schema_group(sg.id().clone());
        let (item, created) = self.get_or_create_item(schema, &by_group, generator)?;
        item.as_group_mut().map(|g| (g, created))
    }

    /// The field a pointer addresses, creating it (and its group) empty when
    /// the schema declares it. Calling it again returns the same field with
    /// `false`.
    pub fn get_or_create_field(
        &mut self,
        schema: &Schema,
        ptr: &Pointer,
        generator: &dyn IdGenerator,
    ) -> Option<(&mut Field, bool)> {
        let field_id = ptr.field_id()?;
        let (sg, _) = self.schema_field(schema, ptr)?;
        let (group, _) = self.get_or_create_group(schema, ptr, generator)?;
        group.get_or_create_field(sg, field_id)
    }

    /// Set the value of the field a pointer addresses.
    ///
    /// The schema field must accept the value, otherwise nothing changes.
    /// Clearing a field that does not exist does nothing; clearing an existing
    /// one prunes it (and its group) if nothing is left. Returns the field
    /// when it still exists.
    pub fn update_value(
        &mut self,
        schema: &Schema,
        ptr: &Pointer,
        value: Option<Value>,
        generator: &dyn IdGenerator,
    ) -> Result<Option<&Field>> {
        self.check_schema(schema)?;
        let (_, schema_field) = self.resolve_schema_field(schema, ptr)?;
        if !schema_field.validate(value.as_ref()) {
            return Err(PropertyError::InvalidPropertyValue {
                field: schema_field.id().clone(),
            });
        }
        let clearing = value.is_none();
        if clearing && self.field(ptr).is_none() {
            return Ok(None);
        }
        let Some((field, _)) = self.get_or_create_field(schema, ptr, generator) else {
            return Ok(None);
        };
        field.update(value, schema_field)?;
        if clearing {
            self.prune();
        }
        Ok(self.field(ptr).map(|(f, _, _)| f))
    }

    /// Write a location or URL into the field the schema marks as linkable
    /// for that kind. Other kinds, or schemas without such a field, do
    /// nothing.
    pub fn update_linkable_value(
        &mut self,
        schema: &Schema,
        value: Value,
        generator: &dyn IdGenerator,
    ) -> Result<Option<&Field>> {
        let linkable = schema.linkable_fields();
        let target = match value.kind() {
            ValueKind::LatLng => linkable.latlng.as_ref(),
            ValueKind::Url => linkable.url.as_ref(),
            _ => None,
        };
        let Some(target) = target else {
            return Ok(None);
        };
        self.update_value(schema, &target.pointer(), Some(value), generator)
    }

    /// Link the field a pointer addresses.
    ///
    /// With `dataset_schema`, the chain's last hop must be a field of that
    /// schema whose kind matches the property field, otherwise
    /// [`PropertyError::CannotLinkDataset`] is returned.
    pub fn link_value(
        &mut self,
        schema: &Schema,
        ptr: &Pointer,
        links: Links,
        dataset_schema: Option<&DatasetSchema>,
        generator: &dyn IdGenerator,
    ) -> Result<&Field> {
        self.check_schema(schema)?;
        let (_, schema_field) = self.resolve_schema_field(schema, ptr)?;
        let cannot_link = || PropertyError::CannotLinkDataset {
            field: schema_field.id().clone(),
        };

        let last = links.last().ok_or_else(cannot_link)?;
        if let Some(ds) = dataset_schema {
            let compatible = last.schema() == ds.id()
                && ds
                    .field(last.field())
                    .is_some_and(|f| f.kind() == schema_field.kind());
            if !compatible {
                return Err(cannot_link());
            }
        }

        let (field, _) = self
            .get_or_create_field(schema, ptr, generator)
            .ok_or_else(|| PropertyError::InvalidPropertyField(schema_field.id().clone()))?;
        field.link(links);
        Ok(&*field)
    }

    /// Remove the links of the field a pointer addresses. Returns whether the
    /// field was linked.
    pub fn unlink_value(&mut self, ptr: &Pointer) -> bool {
        let Some(field) = self.field_mut(ptr) else {
            return false;
        };
        let linked = field.is_linked();
        field.unlink();
        linked
    }

    /// Unlink every field whose chain passes through `dataset`.
    pub fn unlink_all_by_dataset(&mut self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        let mut changed = false;
        for item in &mut self.items {
            changed |= item.unlink_all_by_dataset(schema, dataset);
        }
        changed
    }

    /// Insert a new empty row into the list a pointer addresses (by schema
    /// group or list id), creating the list if needed.
    pub fn add_list_item(
        &mut self,
        schema: &Schema,
        ptr: &Pointer,
        index: Option<usize>,
        generator: &dyn IdGenerator,
    ) -> Option<&Group> {
        let sg = match (ptr.schema_group(), ptr.item_id()) {
            (Some(sg), _) => schema.group(sg)?,
            (None, Some(id)) => schema.group(self.item(id)?.schema_group())?,
            (None, None) => return None,
        };
        if !sg.is_list() {
            return None;
        }
        let row = Group::new(ItemId::generate(generator), sg.id().clone());
        let row_id = row.id();
        let (item, _) = self.get_or_create_item(schema, ptr, generator)?;
        let list = item.as_group_list_mut()?;
        list.add(row, index).ok()?;
        list.group(row_id)
    }

    /// Move the row a pointer names to `to`, clamped to the list bounds.
    pub fn move_list_item(&mut self, ptr: &Pointer, to: usize) -> Option<&Group> {
        let row_id = ptr.item_id()?;
        let pos = self.locate_group(ptr)?;
        let list = self.items[pos.item].as_group_list_mut()?;
        list.move_group(row_id, to);
        list.group(row_id)
    }

    /// Remove the row a pointer names.
    pub fn remove_list_item(&mut self, ptr: &Pointer) -> bool {
        let Some(row_id) = ptr.item_id() else {
            return false;
        };
        let Some(pos) = self.locate_group(ptr).filter(|p| p.row.is_some()) else {
            return false;
        };
        self.items[pos.item]
            .as_group_list_mut()
            .and_then(|l| l.remove(row_id))
            .is_some()
    }

    /// Remove the top-level item a pointer names.
    pub fn remove_item(&mut self, ptr: &Pointer) -> bool {
        let Some(id) = self.item_by_pointer(ptr).map(|it| it.id()) else {
            return false;
        };
        self.items.retain(|it| it.id() != id);
        true
    }

    /// Remove the field a pointer addresses.
    pub fn remove_field(&mut self, ptr: &Pointer) -> bool {
        let Some(field_id) = ptr.field_id() else {
            return false;
        };
        let Some(pos) = self.locate_group(ptr) else {
            return false;
        };
        self.group_at_mut(pos)
            .is_some_and(|g| g.remove_field(field_id))
    }

    /// Drop empty fields, then empty items.
    pub fn prune(&mut self) -> bool {
        let mut changed = false;
        for item in &mut self.items {
            changed |= item.prune();
        }
        let before = self.items.len();
        self.items.retain(|it| !it.is_empty());
        changed || self.items.len() != before
    }

    pub fn has_linked_field(&self) -> bool {
        self.items.iter().any(Item::has_linked_field)
    }

    /// Datasets referenced anywhere in the property, without duplicates.
    pub fn datasets(&self) -> Vec<DatasetId> {
        let mut ids = Vec::new();
        for item in &self.items {
            extend_unique(&mut ids, item.datasets());
        }
        ids
    }

    pub fn is_dataset_linked(&self, schema: DatasetSchemaId, dataset: DatasetId) -> bool {
        self.items
            .iter()
            .any(|it| it.is_dataset_linked(schema, dataset))
    }

    /// Check every item and field against `schema`.
    pub fn validate_schema(&self, schema: &Schema) -> Result<()> {
        self.check_schema(schema)?;
        for item in &self.items {
            let sg = schema
                .group(item.schema_group())
                .ok_or_else(|| PropertyError::InvalidSchemaGroup(item.schema_group().clone()))?;
            if sg.is_list() != item.is_list() {
                return Err(PropertyError::InvalidItem(format!(
                    "item {} does not match the shape of schema group '{}'",
                    item.id(),
                    sg.id()
                )));
            }
            item.validate_schema(sg)?;
        }
        Ok(())
    }

    /// Retarget the property at `schema`.
    ///
    /// Items of schema groups that no longer exist (or changed between single
    /// and list) are dropped, as are fields the new schema group does not
    /// declare. Values that no longer validate are cleared, and fully linked
    /// fields whose dataset field kind no longer matches are unlinked, using
    /// `loader` to fetch the last hop's dataset. Items left without fields
    /// are removed.
    ///
    /// A loader failure aborts the migration and leaves the property as it
    /// was.
    pub async fn migrate_schema(&mut self, schema: &Schema, loader: &dyn Loader) -> Result<()> {
        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let Some(sg) = schema.group(item.schema_group()) else {
                tracing::debug!(
                    item = %item.id(),
                    schema_group = %item.schema_group(),
                    "dropping item of a schema group the new schema lacks"
                );
                continue;
            };
            if sg.is_list() != item.is_list() {
                tracing::debug!(
                    item = %item.id(),
                    schema_group = %sg.id(),
                    "dropping item whose shape changed"
                );
                continue;
            }
            let mut item = item.clone();
            item.migrate_schema(sg, loader).await?;
            if !item.is_hollow() {
                items.push(item);
            }
        }
        self.schema = schema.id().clone();
        self.items = items;
        Ok(())
    }

    fn check_schema(&self, schema: &Schema) -> Result<()> {
        if schema.id() != &self.schema {
            return Err(PropertyError::InvalidPropertySchemaId(schema.id().clone()));
        }
        Ok(())
    }

    fn resolve_schema_field<'s>(
        &self,
        schema: &'s Schema,
        ptr: &Pointer,
    ) -> Result<(&'s SchemaGroup, &'s SchemaField)> {
        self.schema_field(schema, ptr).ok_or_else(|| {
            PropertyError::InvalidPropertyField(ptr.field_id().cloned().unwrap_or_default())
        })
    }

    fn schema_group_for<'s>(&self, schema: &'s Schema, ptr: &Pointer) -> Option<&'s SchemaGroup> {
        if let Some(sg) = ptr.schema_group() {
            return schema.group(sg);
        }
        if let Some(id) = ptr.item_id() {
            let sg = self.items.iter().find_map(|it| match it {
                Item::Group(g) if g.id() == id => Some(g.schema_group()),
                Item::GroupList(l) if l.id() == id || l.has(id) => Some(l.schema_group()),
                _ => None,
            })?;
            return schema.group(sg);
        }
        schema.group_by_field(ptr.field_id()?)
    }

    fn locate_group(&self, ptr: &Pointer) -> Option<GroupPos> {
        if let Some(id) = ptr.item_id() {
            return self.items.iter().enumerate().find_map(|(i, item)| {
                if !ptr.test_schema_group(item.schema_group()) {
                    return None;
                }
                match item {
                    Item::Group(g) if g.id() == id => Some(GroupPos { item: i, row: None }),
                    Item::GroupList(l) => l.index_of(id).map(|r| GroupPos {
                        item: i,
                        row: Some(r),
                    }),
                    Item::Group(_) => None,
                }
            });
        }
        if let Some(sg) = ptr.schema_group() {
            let i = self.items.iter().position(|it| it.schema_group() == sg)?;
            return self.items[i]
                .as_group()
                .map(|_| GroupPos { item: i, row: None });
        }
        let field = ptr.field_id()?;
        self.items
            .iter()
            .position(|it| it.as_group().is_some_and(|g| g.has_field(field)))
            .map(|i| GroupPos { item: i, row: None })
    }

    fn group_at(&self, pos: GroupPos) -> Option<&Group> {
        match (&self.items[pos.item], pos.row) {
            (Item::Group(g), None) => Some(g),
            (Item::GroupList(l), Some(r)) => l.group_at(r),
            _ => None,
        }
    }

    fn group_at_mut(&mut self, pos: GroupPos) -> Option<&mut Group> {
        match (&mut self.items[pos.item], pos.row) {
            (Item::Group(g), None) => Some(g),
            (Item::GroupList(l), Some(r)) => l.groups_mut().get_mut(r),
            _ => None,
        }
    }

    fn list_at(&self, pos: GroupPos) -> Option<&GroupList> {
        pos.row.and_then(|_| self.items[pos.item].as_group_list())
    }

    fn field_mut(&mut self, ptr: &Pointer) -> Option<&mut Field> {
        let field_id = ptr.field_id()?;
        let pos = self.locate_group(ptr)?;
        self.group_at_mut(pos)?.field_mut(field_id)
    }
}

/// Builder for [`Property`].
#[derive(Debug, Clone, Default)]
pub struct PropertyBuilder {
    id: Option<PropertyId>,
    scene: Option<SceneId>,
    schema: SchemaId,
    items: Vec<Item>,
}

impl PropertyBuilder {
    pub fn id(mut self, id: PropertyId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn new_id(mut self, generator: &dyn IdGenerator) -> Self {
        self.id = Some(PropertyId::generate(generator));
        self
    }

    pub fn scene(mut self, scene: SceneId) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn schema(mut self, schema: impl Into<SchemaId>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    /// Finish the property. Item ids and item schema groups must be unique.
    pub fn build(self) -> Result<Property> {
        let id = self.id.ok_or(PropertyError::InvalidId)?;
        let scene = self.scene.ok_or(PropertyError::InvalidSceneId)?;
        if self.schema.is_empty() {
            return Err(PropertyError::InvalidPropertySchemaId(self.schema));
        }
        let mut ids = HashSet::new();
        let mut groups = HashSet::new();
        for item in &self.items {
            if !ids.insert(item.id()) {
                return Err(PropertyError::InvalidItem(format!(
                    "item {} appears twice",
                    item.id()
                )));
            }
            if !groups.insert(item.schema_group()) {
                return Err(PropertyError::InvalidItem(format!(
                    "schema group '{}' has more than one item",
                    item.schema_group()
                )));
            }
        }
        Ok(Property {
            id,
            scene,
            schema: self.schema,
            items: self.items,
        })
    }

    pub fn must_build(self) -> Property {
        match self.build() {
            Ok(p) => p,
            Err(e) => panic!("invalid property: {e}"),
        }
    }
}

/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Schema-validated scene properties.
 */

//! Scene properties: typed, schema-validated settings owned by scene
//! entities.
//!
//! A plugin declares a [`Schema`] made of [`SchemaGroup`]s, each a single
//! group or a repeatable list, holding typed [`SchemaField`]s. A [`Property`]
//! is an instance of a schema. It stores only what the user has touched:
//! items and fields are created lazily when written and pruned when emptied.
//!
//! Any field can be bound to external data through a chain of [`Link`]s into
//! the dataset graph of [`terra_dataset`].
//!
//! # Inheritance
//!
//! A property can inherit from a parent property of the same schema.
//! [`merge`] produces a [`Merged`] view where the original wins field by
//! field, and [`seal`] resolves every link of that view through a
//! [`GraphLoader`](terra_dataset::GraphLoader) into a [`Sealed`] property of
//! concrete values.
//!
//! # Migration
//!
//! [`Property::migrate_schema`] rebinds a property to a new schema version,
//! clearing values the new schema rejects and dropping links whose dataset
//! field no longer matches.

mod actual;
mod error;
mod field;
mod group;
mod group_list;
mod item;
mod link;
mod merged;
mod pointer;
mod property;
pub mod schema;
mod sealed;

pub use actual::ValueAndDatasetValue;
pub use error::{ErrorClass, PropertyError, Result};
pub use field::Field;
pub use group::{Group, GroupBuilder};
pub use group_list::{GroupList, GroupListBuilder};
pub use item::{Item, PropertyItem};
pub use link::{Link, Links};
pub use merged::{Merged, MergedField, MergedGroup, merge};
pub use pointer::Pointer;
pub use property::{Property, PropertyBuilder};
pub use schema::{
    Choice, Condition, Linkable, LinkableFields, Schema, SchemaBuilder, SchemaField,
    SchemaFieldBuilder, SchemaFieldPointer, SchemaFieldUi, SchemaGroup, SchemaGroupBuilder,
};
pub use sealed::{SealOptions, Sealed, SealedField, SealedItem, seal, seal_property, seal_with_options};

/*
 * entity.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Time-ordered entity identifiers.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::IdError;
use crate::generator::IdGenerator;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh id from the given generator.
            pub fn generate(generator: &dyn IdGenerator) -> Self {
                Self(generator.next_uuid())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Whether this is the all-zero id.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| IdError::Invalid {
                        kind: $kind,
                        input: s.to_string(),
                    })
            }
        }
    };
}

entity_id!(
    /// Identifies a property instance.
    PropertyId,
    "property"
);
entity_id!(
    /// Identifies an item (group or group list) inside a property.
    ItemId,
    "item"
);
entity_id!(
    /// Identifies the scene that owns properties and datasets.
    SceneId,
    "scene"
);
entity_id!(
    /// Identifies a dataset row.
    DatasetId,
    "dataset"
);
entity_id!(
    /// Identifies a dataset schema.
    DatasetSchemaId,
    "dataset schema"
);
entity_id!(
    /// Identifies a field declared by a dataset schema.
    DatasetFieldId,
    "dataset field"
);

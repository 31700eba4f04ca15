/*
 * name.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Declarative identifiers chosen by plugin authors.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! name_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an id from any string-like value.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// The id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the id is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

name_id!(
    /// Identifies a property schema, conventionally `plugin~version/extension`.
    SchemaId
);
name_id!(
    /// Identifies a group declared by a property schema.
    SchemaGroupId
);
name_id!(
    /// Identifies a field declared by a schema group.
    FieldId
);

impl SchemaId {
    /// The plugin part (before the last `/`), if any.
    pub fn plugin(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(plugin, _)| plugin)
    }

    /// The extension part (after the last `/`), or the whole id.
    pub fn extension(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, ext)| ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_id_parts() {
        let id = SchemaId::from("marker~1.0.0/default");
        assert_eq!(id.plugin(), Some("marker~1.0.0"));
        assert_eq!(id.extension(), "default");

        let bare = SchemaId::from("default");
        assert_eq!(bare.plugin(), None);
        assert_eq!(bare.extension(), "default");
    }

    #[test]
    fn test_empty() {
        assert!(FieldId::default().is_empty());
        assert!(!FieldId::from("a").is_empty());
    }
}

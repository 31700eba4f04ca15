/*
 * manifest.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Loading property schemas from plugin manifests.
 */

use serde::Deserialize;
use serde_json::Value as Json;
use terra_id::SchemaId;
use terra_value::ValueKind;

use super::{
    Choice, Condition, LinkableFields, Schema, SchemaField, SchemaFieldPointer, SchemaFieldUi,
    SchemaGroup,
};
use crate::error::{PropertyError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SchemaManifest {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    groups: Vec<GroupManifest>,
    #[serde(default)]
    linkable: Option<LinkableManifest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupManifest {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    list: bool,
    #[serde(default)]
    representative_field: Option<String>,
    #[serde(default)]
    available_if: Option<ConditionManifest>,
    #[serde(default)]
    fields: Vec<FieldManifest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldManifest {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    default_value: Option<Json>,
    #[serde(default)]
    ui: Option<String>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    choices: Vec<ChoiceManifest>,
    #[serde(default)]
    available_if: Option<ConditionManifest>,
}

#[derive(Debug, Deserialize)]
struct ChoiceManifest {
    key: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConditionManifest {
    field: String,
    #[serde(rename = "type")]
    kind: String,
    value: Json,
}

#[derive(Debug, Deserialize)]
struct LinkableManifest {
    #[serde(default)]
    latlng: Option<PointerManifest>,
    #[serde(default)]
    url: Option<PointerManifest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointerManifest {
    schema_group_id: String,
    field_id: String,
}

impl Schema {
    /// Parse the property-schema section of a plugin manifest.
    ///
    /// ```yaml
    /// groups:
    ///   - id: default
    ///     fields:
    ///       - id: size
    ///         type: number
    ///         max: 10
    /// linkable:
    ///   latlng: { schemaGroupId: default, fieldId: location }
    /// ```
    ///
    /// Unknown kinds, defaults that do not decode, duplicated ids and
    /// linkable pointers that do not resolve are rejected.
    pub fn from_manifest_yaml(id: impl Into<SchemaId>, yaml: &str) -> Result<Schema> {
        let manifest: SchemaManifest = serde_yaml::from_str(yaml)
            .map_err(|e| PropertyError::InvalidManifest(e.to_string()))?;

        let groups = manifest
            .groups
            .into_iter()
            .map(GroupManifest::into_schema_group)
            .collect::<Result<Vec<_>>>()?;

        let linkable = manifest.linkable.map_or_else(LinkableFields::default, |l| {
            LinkableFields {
                latlng: l.latlng.map(PointerManifest::into_pointer),
                url: l.url.map(PointerManifest::into_pointer),
            }
        });

        Schema::builder(id)
            .version(manifest.version)
            .groups(groups)
            .linkable(linkable)
            .build()
    }
}

impl GroupManifest {
    fn into_schema_group(self) -> Result<SchemaGroup> {
        let fields = self
            .fields
            .into_iter()
            .map(FieldManifest::into_schema_field)
            .collect::<Result<Vec<_>>>()?;

        let mut b = SchemaGroup::builder(self.id)
            .list(self.list)
            .fields(fields);
        if let Some(title) = self.title {
            b = b.title(title);
        }
        if let Some(rep) = self.representative_field {
            b = b.representative_field(rep);
        }
        if let Some(cond) = self.available_if {
            b = b.condition(cond.into_condition()?);
        }
        b.build()
    }
}

impl FieldManifest {
    fn into_schema_field(self) -> Result<SchemaField> {
        let kind = parse_kind(&self.kind)?;
        let mut b = SchemaField::builder(self.id.as_str(), kind);

        if let Some(raw) = &self.default_value {
            let value = kind.value_from(raw).ok_or_else(|| {
                PropertyError::InvalidManifest(format!(
                    "default value of field '{}' is not a valid {kind}",
                    self.id
                ))
            })?;
            b = b.default_value(value);
        }
        if let Some(ui) = &self.ui {
            let ui = ui
                .parse::<SchemaFieldUi>()
                .map_err(PropertyError::InvalidManifest)?;
            b = b.ui(ui);
        }
        if let Some(min) = self.min {
            b = b.min(min);
        }
        if let Some(max) = self.max {
            b = b.max(max);
        }
        if !self.choices.is_empty() {
            b = b.choices(
                self.choices
                    .into_iter()
                    .map(|c| Choice {
                        label: c.label.unwrap_or_else(|| c.key.clone()),
                        icon: c.icon.unwrap_or_default(),
                        key: c.key,
                    })
                    .collect(),
            );
        }
        if let Some(cond) = self.available_if {
            b = b.condition(cond.into_condition()?);
        }
        if let Some(s) = self.title {
            b = b.title(s);
        }
        if let Some(s) = self.description {
            b = b.description(s);
        }
        if let Some(s) = self.prefix {
            b = b.prefix(s);
        }
        if let Some(s) = self.suffix {
            b = b.suffix(s);
        }
        b.build()
    }
}

impl ConditionManifest {
    fn into_condition(self) -> Result<Condition> {
        let kind = parse_kind(&self.kind)?;
        let value = kind.value_from(&self.value).ok_or_else(|| {
            PropertyError::InvalidManifest(format!(
                "condition value for field '{}' is not a valid {kind}",
                self.field
            ))
        })?;
        Ok(Condition::new(self.field, value))
    }
}

impl PointerManifest {
    fn into_pointer(self) -> SchemaFieldPointer {
        SchemaFieldPointer::new(self.schema_group_id, self.field_id)
    }
}

fn parse_kind(s: &str) -> Result<ValueKind> {
    s.parse::<ValueKind>()
        .map_err(|_| PropertyError::InvalidManifest(format!("unknown value type '{s}'")))
}

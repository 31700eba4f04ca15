/*
 * field.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Schema field declarations and value validation.
 */

use std::fmt;
use std::str::FromStr;

use terra_id::FieldId;
use terra_value::{Value, ValueKind};

use super::condition::Condition;
use crate::error::{PropertyError, Result};
use crate::group::Group;

/// Editor widget hint for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFieldUi {
    Layer,
    Multiline,
    Selection,
    Color,
    Range,
    Slider,
    Image,
    Video,
    File,
    CameraPose,
    Datetime,
    Padding,
    Margin,
}

impl SchemaFieldUi {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFieldUi::Layer => "layer",
            SchemaFieldUi::Multiline => "multiline",
            SchemaFieldUi::Selection => "selection",
            SchemaFieldUi::Color => "color",
            SchemaFieldUi::Range => "range",
            SchemaFieldUi::Slider => "slider",
            SchemaFieldUi::Image => "image",
            SchemaFieldUi::Video => "video",
            SchemaFieldUi::File => "file",
            SchemaFieldUi::CameraPose => "camera_pose",
            SchemaFieldUi::Datetime => "datetime",
            SchemaFieldUi::Padding => "padding",
            SchemaFieldUi::Margin => "margin",
        }
    }
}

impl fmt::Display for SchemaFieldUi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaFieldUi {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "layer" => SchemaFieldUi::Layer,
            "multiline" => SchemaFieldUi::Multiline,
            "selection" => SchemaFieldUi::Selection,
            "color" => SchemaFieldUi::Color,
            "range" => SchemaFieldUi::Range,
            "slider" => SchemaFieldUi::Slider,
            "image" => SchemaFieldUi::Image,
            "video" => SchemaFieldUi::Video,
            "file" => SchemaFieldUi::File,
            "camera_pose" | "cameraPose" => SchemaFieldUi::CameraPose,
            "datetime" => SchemaFieldUi::Datetime,
            "padding" => SchemaFieldUi::Padding,
            "margin" => SchemaFieldUi::Margin,
            other => return Err(format!("unknown field ui '{other}'")),
        })
    }
}

/// Role a field can play for dataset-driven placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkable {
    LatLng,
    Url,
}

/// One allowed value of a string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub key: String,
    pub label: String,
    pub icon: String,
}

impl Choice {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            icon: String::new(),
        }
    }
}

/// A field declared by a schema group.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    id: FieldId,
    kind: ValueKind,
    title: String,
    description: String,
    prefix: String,
    suffix: String,
    default_value: Option<Value>,
    ui: Option<SchemaFieldUi>,
    min: Option<f64>,
    max: Option<f64>,
    choices: Vec<Choice>,
    condition: Option<Condition>,
    linkable_as: Option<Linkable>,
}

impl SchemaField {
    pub fn builder(id: impl Into<FieldId>, kind: ValueKind) -> SchemaFieldBuilder {
        SchemaFieldBuilder {
            field: SchemaField {
                id: id.into(),
                kind,
                title: String::new(),
                description: String::new(),
                prefix: String::new(),
                suffix: String::new(),
                default_value: None,
                ui: None,
                min: None,
                max: None,
                choices: Vec::new(),
                condition: None,
                linkable_as: None,
            },
        }
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn ui(&self) -> Option<SchemaFieldUi> {
        self.ui
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn choice(&self, key: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.key == key)
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn linkable_as(&self) -> Option<Linkable> {
        self.linkable_as
    }

    /// Whether the field should be shown for `group`.
    pub fn is_available(&self, group: &Group) -> bool {
        self.condition.as_ref().is_none_or(|c| c.matches(group))
    }

    /// Whether `value` may be stored in this field.
    ///
    /// An absent value is always accepted. Otherwise the kind must match,
    /// numbers must lie within the declared bounds (NaN never satisfies a
    /// bound), and strings must be one of the choice keys when choices exist.
    pub fn validate(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return true;
        };
        if value.kind() != self.kind {
            return false;
        }
        match value {
            Value::Number(n) => {
                // comparisons with NaN are false, so NaN fails both bounds
                self.min.is_none_or(|min| *n >= min) && self.max.is_none_or(|max| *n <= max)
            }
            Value::String(s) if !self.choices.is_empty() => self.choice(s).is_some(),
            _ => true,
        }
    }
}

/// Builder for [`SchemaField`].
#[derive(Debug, Clone)]
pub struct SchemaFieldBuilder {
    field: SchemaField,
}

impl SchemaFieldBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.field.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.field.description = description.into();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.field.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.field.suffix = suffix.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.field.default_value = Some(value.into());
        self
    }

    pub fn ui(mut self, ui: SchemaFieldUi) -> Self {
        self.field.ui = Some(ui);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.field.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.field.max = Some(max);
        self
    }

    pub fn choices(mut self, choices: Vec<Choice>) -> Self {
        self.field.choices = choices;
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.field.condition = Some(condition);
        self
    }

    pub fn linkable_as(mut self, linkable: Linkable) -> Self {
        self.field.linkable_as = Some(linkable);
        self
    }

    /// Finish the field. The id must be non-empty and the default value, if
    /// any, must pass the field's own validation.
    pub fn build(self) -> Result<SchemaField> {
        let field = self.field;
        if field.id.is_empty() {
            return Err(PropertyError::InvalidPropertyField(field.id));
        }
        if !field.validate(field.default_value.as_ref()) {
            return Err(PropertyError::InvalidPropertyValue { field: field.id });
        }
        Ok(field)
    }

    /// Like [`build`](Self::build), panicking on error.
    pub fn must_build(self) -> SchemaField {
        match self.build() {
            Ok(f) => f,
            Err(e) => panic!("invalid schema field: {e}"),
        }
    }
}

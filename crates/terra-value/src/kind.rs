/*
 * kind.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The closed set of value kinds.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValueError;

/// The kind of a [`Value`](crate::Value).
///
/// The serialized form is the lowercase wire name (`latlngheight`, not
/// `lat_lng_height`), which is also what plugin manifests use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Number,
    String,
    /// Reference to another entity by id (e.g. a dataset).
    Ref,
    Url,
    LatLng,
    LatLngHeight,
    Camera,
    Typography,
    Coordinates,
    Polygon,
    Rect,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [ValueKind; 12] = [
        ValueKind::Bool,
        ValueKind::Number,
        ValueKind::String,
        ValueKind::Ref,
        ValueKind::Url,
        ValueKind::LatLng,
        ValueKind::LatLngHeight,
        ValueKind::Camera,
        ValueKind::Typography,
        ValueKind::Coordinates,
        ValueKind::Polygon,
        ValueKind::Rect,
    ];

    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Ref => "ref",
            ValueKind::Url => "url",
            ValueKind::LatLng => "latlng",
            ValueKind::LatLngHeight => "latlngheight",
            ValueKind::Camera => "camera",
            ValueKind::Typography => "typography",
            ValueKind::Coordinates => "coordinates",
            ValueKind::Polygon => "polygon",
            ValueKind::Rect => "rect",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ValueError::UnknownKind(s.to_string()))
    }
}

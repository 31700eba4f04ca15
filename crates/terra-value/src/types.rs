/*
 * types.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Composite value payloads.
 */

use serde::{Deserialize, Serialize};

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A geographic position with height in meters.
///
/// `height` defaults to `0` when decoding a map that only has `lat`/`lng`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLngHeight {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub height: f64,
}

impl From<LatLng> for LatLngHeight {
    fn from(l: LatLng) -> Self {
        LatLngHeight {
            lat: l.lat,
            lng: l.lng,
            height: 0.0,
        }
    }
}

impl From<LatLngHeight> for LatLng {
    fn from(l: LatLngHeight) -> Self {
        LatLng {
            lat: l.lat,
            lng: l.lng,
        }
    }
}

/// A camera pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
    pub fov: f64,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
    JustifyAll,
}

/// Text styling. Every attribute is optional; unset attributes are omitted
/// from the generic representation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
}

/// An ordered list of positions (a line string or a polygon ring).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinates(pub Vec<LatLngHeight>);

impl Coordinates {
    /// Build from a flat `[lng, lat, height, lng, lat, height, ...]` list.
    ///
    /// A trailing partial triple is ignored.
    pub fn from_flat(flat: &[f64]) -> Self {
        Coordinates(
            flat.chunks_exact(3)
                .map(|c| LatLngHeight {
                    lng: c[0],
                    lat: c[1],
                    height: c[2],
                })
                .collect(),
        )
    }

    /// The positions.
    pub fn points(&self) -> &[LatLngHeight] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A polygon: the outer ring followed by any holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<Coordinates>);

impl Polygon {
    /// The rings of this polygon.
    pub fn rings(&self) -> &[Coordinates] {
        &self.0
    }
}

/// A bounding rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

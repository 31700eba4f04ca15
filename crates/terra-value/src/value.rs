/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The tagged value union.
 */

use serde_json::Value as Json;
use url::Url;

use crate::kind::ValueKind;
use crate::types::{Camera, Coordinates, LatLng, LatLngHeight, Polygon, Rect, Typography};

/// A typed value.
///
/// Values are immutable; `clone()` deep-copies composite payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// 64-bit float. NaN and infinities pass through construction unchanged.
    Number(f64),
    String(String),
    /// Id of another entity, kept as its string form.
    Ref(String),
    Url(Url),
    LatLng(LatLng),
    LatLngHeight(LatLngHeight),
    Camera(Camera),
    Typography(Typography),
    Coordinates(Coordinates),
    Polygon(Polygon),
    Rect(Rect),
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Ref(_) => ValueKind::Ref,
            Value::Url(_) => ValueKind::Url,
            Value::LatLng(_) => ValueKind::LatLng,
            Value::LatLngHeight(_) => ValueKind::LatLngHeight,
            Value::Camera(_) => ValueKind::Camera,
            Value::Typography(_) => ValueKind::Typography,
            Value::Coordinates(_) => ValueKind::Coordinates,
            Value::Polygon(_) => ValueKind::Polygon,
            Value::Rect(_) => ValueKind::Rect,
        }
    }

    /// A reference to the entity with the given id.
    pub fn reference(id: impl ToString) -> Self {
        Value::Ref(id.to_string())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The referenced id, if this is a `Ref`.
    pub fn as_ref_id(&self) -> Option<&str> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Value::Url(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_latlng(&self) -> Option<&LatLng> {
        match self {
            Value::LatLng(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_latlng_height(&self) -> Option<&LatLngHeight> {
        match self {
            Value::LatLngHeight(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_camera(&self) -> Option<&Camera> {
        match self {
            Value::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_typography(&self) -> Option<&Typography> {
        match self {
            Value::Typography(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_coordinates(&self) -> Option<&Coordinates> {
        match self {
            Value::Coordinates(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Value::Polygon(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<&Rect> {
        match self {
            Value::Rect(r) => Some(r),
            _ => None,
        }
    }

    /// Project to the generic representation.
    ///
    /// Composite kinds become maps (or lists of maps) keyed the same way
    /// [`ValueKind::value_from`] expects. Integral numbers within the exact
    /// integer range of `f64` become JSON integers, here and inside
    /// composites. Non-finite numbers have no JSON form and become `null`.
    pub fn interface(&self) -> Json {
        match self {
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_json(*n),
            Value::String(s) | Value::Ref(s) => Json::String(s.clone()),
            Value::Url(u) => Json::String(u.to_string()),
            Value::LatLng(v) => to_json(v),
            Value::LatLngHeight(v) => to_json(v),
            Value::Camera(v) => to_json(v),
            Value::Typography(v) => to_json(v),
            Value::Coordinates(v) => to_json(v),
            Value::Polygon(v) => to_json(v),
            Value::Rect(v) => to_json(v),
        }
    }

    /// Convert to another kind through the generic representation.
    ///
    /// Succeeds for compatible pairs such as number/string, latlng/latlngheight
    /// and url/string; returns `None` otherwise.
    pub fn cast(&self, kind: ValueKind) -> Option<Value> {
        if self.kind() == kind {
            return Some(self.clone());
        }
        kind.value_from(&self.interface())
    }
}

/// Largest magnitude below which every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_991.0;

fn number_json(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        return Json::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(Json::Null, Json::Number)
}

fn to_json<T: serde::Serialize>(v: &T) -> Json {
    serde_json::to_value(v).map_or(Json::Null, integral_numbers)
}

fn integral_numbers(json: Json) -> Json {
    match json {
        Json::Number(n) if n.is_f64() => n.as_f64().map_or(Json::Null, number_json),
        Json::Array(items) => Json::Array(items.into_iter().map(integral_numbers).collect()),
        Json::Object(map) => Json::Object(
            map.into_iter()
                .map(|(k, v)| (k, integral_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Url> for Value {
    fn from(u: Url) -> Self {
        Value::Url(u)
    }
}

impl From<LatLng> for Value {
    fn from(l: LatLng) -> Self {
        Value::LatLng(l)
    }
}

impl From<LatLngHeight> for Value {
    fn from(l: LatLngHeight) -> Self {
        Value::LatLngHeight(l)
    }
}

impl From<Camera> for Value {
    fn from(c: Camera) -> Self {
        Value::Camera(c)
    }
}

impl From<Typography> for Value {
    fn from(t: Typography) -> Self {
        Value::Typography(t)
    }
}

impl From<Coordinates> for Value {
    fn from(c: Coordinates) -> Self {
        Value::Coordinates(c)
    }
}

impl From<Polygon> for Value {
    fn from(p: Polygon) -> Self {
        Value::Polygon(p)
    }
}

impl From<Rect> for Value {
    fn from(r: Rect) -> Self {
        Value::Rect(r)
    }
}

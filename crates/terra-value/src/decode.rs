/*
 * decode.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Coercion of untyped input into typed values.
 */

use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use url::Url;

use crate::kind::ValueKind;
use crate::types::{Camera, Coordinates, LatLng, LatLngHeight, Polygon, Rect, Typography};
use crate::value::Value;

impl ValueKind {
    /// Coerce untyped input into a value of exactly this kind.
    ///
    /// Accepted inputs per kind:
    ///
    /// - `bool`: booleans, and the strings `1 t T TRUE true True 0 f F FALSE false False`
    /// - `number`: numbers, and strings parsing as `f64` (including `NaN`/`inf`)
    /// - `string`: strings, numbers (shortest form) and booleans
    /// - `ref`: non-empty strings
    /// - `url`: strings parsing as an absolute URL
    /// - composites: maps with the field names of the payload type;
    ///   `coordinates` also accepts a flat `[lng, lat, height, ...]` list
    ///
    /// Returns `None` for anything else. `null` never coerces.
    pub fn value_from(&self, raw: &Json) -> Option<Value> {
        if raw.is_null() {
            return None;
        }
        match self {
            ValueKind::Bool => bool_from(raw).map(Value::Bool),
            ValueKind::Number => number_from(raw).map(Value::Number),
            ValueKind::String => string_from(raw).map(Value::String),
            ValueKind::Ref => raw
                .as_str()
                .filter(|s| !s.is_empty())
                .map(|s| Value::Ref(s.to_string())),
            ValueKind::Url => raw
                .as_str()
                .and_then(|s| Url::parse(s).ok())
                .map(Value::Url),
            ValueKind::LatLng => decode_map::<LatLng>(raw).map(Value::LatLng),
            ValueKind::LatLngHeight => decode_map::<LatLngHeight>(raw).map(Value::LatLngHeight),
            ValueKind::Camera => decode_map::<Camera>(raw).map(Value::Camera),
            ValueKind::Typography => decode_map::<Typography>(raw).map(Value::Typography),
            ValueKind::Coordinates => coordinates_from(raw).map(Value::Coordinates),
            ValueKind::Polygon => polygon_from(raw).map(Value::Polygon),
            ValueKind::Rect => decode_map::<Rect>(raw).map(Value::Rect),
        }
    }
}

fn bool_from(raw: &Json) -> Option<bool> {
    match raw {
        Json::Bool(b) => Some(*b),
        Json::String(s) => match s.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn number_from(raw: &Json) -> Option<f64> {
    match raw {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn string_from(raw: &Json) -> Option<String> {
    match raw {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => n.as_f64().map(|f| f.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Decode a map into a payload struct. Only maps are accepted, so a bare
/// number never turns into a zeroed struct.
fn decode_map<T: DeserializeOwned>(raw: &Json) -> Option<T> {
    if !raw.is_object() {
        return None;
    }
    serde_json::from_value(raw.clone()).ok()
}

fn coordinates_from(raw: &Json) -> Option<Coordinates> {
    let items = raw.as_array()?;
    if !items.is_empty() && items.iter().all(Json::is_number) {
        let flat: Vec<f64> = items.iter().filter_map(Json::as_f64).collect();
        return Some(Coordinates::from_flat(&flat));
    }
    items
        .iter()
        .map(decode_map::<LatLngHeight>)
        .collect::<Option<Vec<_>>>()
        .map(Coordinates)
}

fn polygon_from(raw: &Json) -> Option<Polygon> {
    raw.as_array()?
        .iter()
        .map(coordinates_from)
        .collect::<Option<Vec<_>>>()
        .map(Polygon)
}

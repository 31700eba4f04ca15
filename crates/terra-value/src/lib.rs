/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Typed values for scene properties and datasets.
 */

//! Typed values for scene properties and datasets.
//!
//! A [`Value`] is a closed union over a fixed set of kinds. The payload always
//! matches the kind: the only way to build a `Value` from untyped input is
//! [`ValueKind::value_from`], which either coerces the input to exactly that
//! kind or returns `None`.
//!
//! [`OptionalValue`] binds a kind to a value that may be absent, and refuses
//! to hold a value of any other kind.
//!
//! # Generic representation
//!
//! `serde_json::Value` is used as the untyped ("interface") representation.
//! For every value `v`, `v.kind().value_from(&v.interface())` yields a value
//! equal to `v` (non-finite numbers excepted, see [`Value::interface`]).
//!
//! # Example
//!
//! ```rust
//! use terra_value::{OptionalValue, Value, ValueKind};
//! use serde_json::json;
//!
//! let v = ValueKind::LatLng.value_from(&json!({"lat": 35.0, "lng": 139.0})).unwrap();
//! assert_eq!(v.kind(), ValueKind::LatLng);
//!
//! let mut ov = OptionalValue::empty(ValueKind::Number);
//! assert!(ov.set_value(Some(Value::from("oops"))).is_err());
//! assert!(ov.value().is_none());
//! ```

mod decode;
mod kind;
mod optional;
mod types;
mod value;

pub use kind::ValueKind;
pub use optional::OptionalValue;
pub use types::{Camera, Coordinates, LatLng, LatLngHeight, Polygon, Rect, TextAlign, Typography};
pub use value::Value;

pub use url::Url;

use thiserror::Error;

/// Errors produced by value operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A value of one kind was offered where another kind is bound.
    #[error("expected a {expected} value, got {got}")]
    KindMismatch {
        /// The bound kind
        expected: ValueKind,
        /// The kind that was offered
        got: ValueKind,
    },

    /// The name does not denote a value kind.
    #[error("unknown value kind: '{0}'")]
    UnknownKind(String),
}

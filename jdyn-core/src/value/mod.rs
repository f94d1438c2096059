//! Dynamic JSON values
//!
//! `params`, `result` and error `data` may hold JSON of any shape. Instead of
//! handing those fields out as opaque text, jdyn models them as
//! [`DynamicValue`], a closed tagged union over the seven JSON kinds. Every
//! consumer matches all seven variants, so nothing falls through silently.
//!
//! # Integers and doubles
//!
//! Integral numbers decode as [`DynamicValue::Int`]; only numbers written with
//! a fraction or exponent (or integers too large for `i64`) become
//! [`DynamicValue::Double`]. The distinction survives a round trip: `2` stays
//! `Int(2)` and `2.0` stays `Double(2.0)`.
//!
//! # Ordering
//!
//! Objects keep their members in document order, arrays keep every element in
//! place, including `null` elements.

mod de;
mod ser;

pub(crate) use de::{DecodeState, DEFAULT_MAX_DEPTH};
pub(crate) use ser::{check_encodable, ensure_depth};

use crate::error::{DecodeError, EncodeError};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Insertion-ordered map used for JSON objects
pub type Map = IndexMap<String, DynamicValue>;

/// Any JSON value
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{DynamicValue, Map};
///
/// let mut point = Map::new();
/// point.insert("x".to_string(), DynamicValue::Int(3));
/// point.insert("y".to_string(), DynamicValue::Double(4.5));
///
/// let value = DynamicValue::Object(point);
/// assert_eq!(value.get("x"), Some(&DynamicValue::Int(3)));
/// assert_eq!(value.to_string(), r#"{"x":3,"y":4.5}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<DynamicValue>),
    Object(Map),
}

impl DynamicValue {
    /// Name of the active variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            DynamicValue::Null => "null",
            DynamicValue::Bool(_) => "bool",
            DynamicValue::Int(_) => "integer",
            DynamicValue::Double(_) => "double",
            DynamicValue::String(_) => "string",
            DynamicValue::Array(_) => "array",
            DynamicValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynamicValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as `f64`; integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynamicValue::Int(i) => Some(*i as f64),
            DynamicValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            DynamicValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up an object member; `None` for missing keys and non-objects
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl fmt::Display for DynamicValue {
    /// Compact JSON text
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            // Non-finite doubles have no JSON spelling
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        DynamicValue::Bool(value)
    }
}

impl From<i32> for DynamicValue {
    fn from(value: i32) -> Self {
        DynamicValue::Int(value.into())
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        DynamicValue::Int(value)
    }
}

impl From<u32> for DynamicValue {
    fn from(value: u32) -> Self {
        DynamicValue::Int(value.into())
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        DynamicValue::Double(value)
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        DynamicValue::String(value.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        DynamicValue::String(value)
    }
}

impl From<Vec<DynamicValue>> for DynamicValue {
    fn from(items: Vec<DynamicValue>) -> Self {
        DynamicValue::Array(items)
    }
}

impl From<Map> for DynamicValue {
    fn from(map: Map) -> Self {
        DynamicValue::Object(map)
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DynamicValue::Null, Into::into)
    }
}

impl FromIterator<DynamicValue> for DynamicValue {
    fn from_iter<I: IntoIterator<Item = DynamicValue>>(iter: I) -> Self {
        DynamicValue::Array(iter.into_iter().collect())
    }
}

impl From<serde_json::Value> for DynamicValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DynamicValue::Null,
            serde_json::Value::Bool(b) => DynamicValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => DynamicValue::Int(i),
                // u64 beyond i64::MAX or a float
                None => DynamicValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => DynamicValue::String(s),
            serde_json::Value::Array(items) => {
                DynamicValue::Array(items.into_iter().map(DynamicValue::from).collect())
            }
            serde_json::Value::Object(map) => DynamicValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, DynamicValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<DynamicValue> for serde_json::Value {
    type Error = EncodeError;

    fn try_from(value: DynamicValue) -> Result<Self, EncodeError> {
        Ok(match value {
            DynamicValue::Null => serde_json::Value::Null,
            DynamicValue::Bool(b) => serde_json::Value::Bool(b),
            DynamicValue::Int(i) => serde_json::Value::from(i),
            DynamicValue::Double(d) => serde_json::Number::from_f64(d)
                .map(serde_json::Value::Number)
                .ok_or_else(|| EncodeError::UnsupportedHostType(format!("non-finite double {}", d)))?,
            DynamicValue::String(s) => serde_json::Value::String(s),
            DynamicValue::Array(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(serde_json::Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            DynamicValue::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(key, value)| serde_json::Value::try_from(value).map(|value| (key, value)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// Convert any serializable application value into a [`DynamicValue`]
///
/// Fails with [`EncodeError::UnsupportedHostType`] when the value has no JSON
/// representation, such as a map keyed by compound values.
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{to_dynamic, DynamicValue};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Transfer { from: String, amount: i64 }
///
/// let value = to_dynamic(&Transfer { from: "alice".into(), amount: 10 }).unwrap();
/// assert_eq!(value.get("amount"), Some(&DynamicValue::Int(10)));
/// ```
pub fn to_dynamic<T: Serialize + ?Sized>(value: &T) -> Result<DynamicValue, EncodeError> {
    serde_json::to_value(value)
        .map(DynamicValue::from)
        .map_err(|e| EncodeError::UnsupportedHostType(e.to_string()))
}

/// Convert a [`DynamicValue`] into a typed application value
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{from_dynamic, DynamicValue};
///
/// let pair: (i64, String) = from_dynamic(&DynamicValue::Array(vec![
///     DynamicValue::Int(7),
///     DynamicValue::from("seven"),
/// ])).unwrap();
/// assert_eq!(pair, (7, "seven".to_string()));
/// ```
pub fn from_dynamic<T: DeserializeOwned>(value: &DynamicValue) -> Result<T, DecodeError> {
    let json = serde_json::Value::try_from(value.clone())
        .map_err(|e| DecodeError::InvalidPayload(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| DecodeError::InvalidPayload(e.to_string()))
}

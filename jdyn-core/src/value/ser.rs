//! Encoding dynamic values onto any serde `Serializer`

use super::DynamicValue;
use crate::error::EncodeError;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DynamicValue::Null => serializer.serialize_unit(),
            DynamicValue::Bool(b) => serializer.serialize_bool(*b),
            DynamicValue::Int(i) => serializer.serialize_i64(*i),
            DynamicValue::Double(d) if d.is_finite() => serializer.serialize_f64(*d),
            DynamicValue::Double(d) => Err(S::Error::custom(non_finite(*d))),
            DynamicValue::String(s) => serializer.serialize_str(s),
            DynamicValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DynamicValue::Object(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
        }
    }
}

fn non_finite(d: f64) -> EncodeError {
    EncodeError::UnsupportedHostType(format!("non-finite double {}", d))
}

/// Fail if a container opened inside `open` containers would exceed `max_depth`
pub(crate) fn ensure_depth(open: usize, max_depth: usize) -> Result<(), EncodeError> {
    if open >= max_depth {
        return Err(EncodeError::DepthLimitExceeded { limit: max_depth });
    }
    Ok(())
}

/// Check that `value` can be written without error
///
/// Walks the tree with an explicit stack, so arbitrarily deep application
/// values are rejected without recursing. `open` is the number of containers
/// already enclosing `value` in the document being written.
pub(crate) fn check_encodable(
    value: &DynamicValue,
    open: usize,
    max_depth: usize,
) -> Result<(), EncodeError> {
    let mut pending = vec![(value, open)];

    while let Some((value, open)) = pending.pop() {
        match value {
            DynamicValue::Double(d) if !d.is_finite() => return Err(non_finite(*d)),
            DynamicValue::Array(items) => {
                ensure_depth(open, max_depth)?;
                pending.extend(items.iter().map(|item| (item, open + 1)));
            }
            DynamicValue::Object(map) => {
                ensure_depth(open, max_depth)?;
                pending.extend(map.values().map(|item| (item, open + 1)));
            }
            _ => {}
        }
    }

    Ok(())
}

//! Decoding dynamic values from any serde `Deserializer`
//!
//! The deserializer plays the role of a document cursor: it hands out one
//! scalar or container at a time and the visitor below decides which
//! [`DynamicValue`] variant it becomes. The order in which the scalar kinds
//! are tried is fixed:
//!
//! 1. bool
//! 2. string
//! 3. integer (unsigned integers above `i64::MAX` fall through to double)
//! 4. double
//! 5. null
//!
//! followed by object, then array. Anything else (byte strings, enums) is
//! rejected with [`DecodeError::UnsupportedType`].
//!
//! Typed failures cannot travel through a generic `D::Error`, so the visitor
//! records them in a per-call [`DecodeState`] before returning a serde error;
//! the codec entry points prefer the recorded failure.

use super::{DynamicValue, Map};
use crate::error::DecodeError;
use serde::de::{self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::cell::RefCell;
use std::fmt;

/// Nesting limit used by the plain `Deserialize` impl
pub(crate) const DEFAULT_MAX_DEPTH: usize = 64;

// Upper bound for pre-allocation from untrusted size hints
const MAX_PREALLOC: usize = 4096;

/// State shared by every seed of a single decode call
pub(crate) struct DecodeState {
    max_depth: usize,
    failure: RefCell<Option<DecodeError>>,
}

impl DecodeState {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            failure: RefCell::new(None),
        }
    }

    /// Record a typed failure and turn it into the deserializer's error type
    pub(crate) fn fail<E: de::Error>(&self, error: DecodeError) -> E {
        let serde_error = E::custom(&error);
        self.failure.borrow_mut().get_or_insert(error);
        serde_error
    }

    /// The first typed failure recorded during this call, if any
    pub(crate) fn take_failure(&self) -> Option<DecodeError> {
        self.failure.borrow_mut().take()
    }

    /// A seed for a value sitting inside `open` containers
    pub(crate) fn seed(&self, open: usize) -> ValueSeed<'_> {
        ValueSeed { state: self, open }
    }

    /// Account for entering one more container
    pub(crate) fn enter<E: de::Error>(&self, open: usize) -> Result<usize, E> {
        if open >= self.max_depth {
            return Err(self.fail(DecodeError::DepthLimitExceeded {
                limit: self.max_depth,
            }));
        }
        Ok(open + 1)
    }
}

/// Decodes one [`DynamicValue`] at a known nesting depth
#[derive(Clone, Copy)]
pub(crate) struct ValueSeed<'a> {
    state: &'a DecodeState,
    open: usize,
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_> {
    type Value = DynamicValue;

    fn deserialize<D>(self, deserializer: D) -> Result<DynamicValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor(self))
    }
}

struct ValueVisitor<'a>(ValueSeed<'a>);

impl ValueVisitor<'_> {
    fn unsupported<E: de::Error>(&self, what: &str) -> E {
        self.0
            .state
            .fail(DecodeError::UnsupportedType(format!("{} is not a JSON value", what)))
    }
}

impl<'de> Visitor<'de> for ValueVisitor<'_> {
    type Value = DynamicValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Bool(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DynamicValue, E> {
        Ok(DynamicValue::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<DynamicValue, E> {
        Ok(DynamicValue::String(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DynamicValue, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => DynamicValue::Int(i),
            Err(_) => DynamicValue::Double(v as f64),
        })
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<DynamicValue, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => DynamicValue::Int(i),
            Err(_) => DynamicValue::Double(v as f64),
        })
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<DynamicValue, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => DynamicValue::Int(i),
            Err(_) => DynamicValue::Double(v as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Double(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<DynamicValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.0.deserialize(deserializer)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<DynamicValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.0.deserialize(deserializer)
    }

    fn visit_map<A>(self, mut access: A) -> Result<DynamicValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        let state = self.0.state;
        let open = state.enter(self.0.open)?;

        let mut map = Map::with_capacity(access.size_hint().unwrap_or(0).min(MAX_PREALLOC));
        while let Some(key) = access.next_key::<String>()? {
            let value = access.next_value_seed(state.seed(open))?;
            // Repeated keys: last value wins, first position is kept
            map.insert(key, value);
        }
        Ok(DynamicValue::Object(map))
    }

    fn visit_seq<A>(self, mut access: A) -> Result<DynamicValue, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let state = self.0.state;
        let open = state.enter(self.0.open)?;

        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0).min(MAX_PREALLOC));
        while let Some(item) = access.next_element_seed(state.seed(open))? {
            items.push(item);
        }
        Ok(DynamicValue::Array(items))
    }

    fn visit_bytes<E: de::Error>(self, _v: &[u8]) -> Result<DynamicValue, E> {
        Err(self.unsupported("a byte string"))
    }

    fn visit_enum<A>(self, _data: A) -> Result<DynamicValue, A::Error>
    where
        A: EnumAccess<'de>,
    {
        Err(self.unsupported("an enum"))
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let state = DecodeState::new(DEFAULT_MAX_DEPTH);
        state.seed(0).deserialize(deserializer)
    }
}

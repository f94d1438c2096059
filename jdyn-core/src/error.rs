//! Error types for jdyn
//!
//! This module holds two different kinds of errors, which is easy to mix up:
//!
//! - **DecodeError / EncodeError**: failures of this crate while turning bytes
//!   into messages or messages into bytes (uses thiserror)
//! - **ErrorObject**: the JSON-RPC 2.0 `error` member that travels on the wire
//!   inside a [`Response`](crate::Response)
//!
//! # Spec-Compliant Error Codes
//!
//! JSON-RPC 2.0 defines standard error codes:
//! - `-32700`: Parse error (invalid JSON)
//! - `-32600`: Invalid request (missing required fields)
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32000 to -32099`: Server error (implementation-defined)
//!
//! Any other code is rejected, both when decoding and when encoding.
//!
//! # Examples
//!
//! ```rust
//! use jdyn_core::ErrorObject;
//!
//! let error = ErrorObject::method_not_found();
//! assert_eq!(error.code(), -32601);
//!
//! // Implementation-defined codes go through the validating constructor
//! assert!(ErrorObject::raw(-32000, "Database unavailable", None).is_some());
//! assert!(ErrorObject::raw(-1, "Nope", None).is_none());
//! ```

use crate::value::{DynamicValue, Map};
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Result type for jdyn operations
pub type Result<T> = std::result::Result<T, Error>;

/// Umbrella error for callers that do not care which direction failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Bytes could not be turned into a message
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A message could not be turned into bytes
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A well-formed error response received from a peer
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] ErrorObject),
}

/// Failure while decoding a message or a dynamic value
///
/// There is no partial success: a message either decodes completely or the
/// first problem found is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The input is not well-formed JSON (or has trailing characters)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The document is JSON but not an object, so it cannot be a message
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// A value did not match any of the seven dynamic value variants
    #[error("Unsupported value type: {0}")]
    UnsupportedType(String),

    /// `jsonrpc` was missing or not exactly "2.0"
    #[error("Unsupported JSON-RPC version: {0}")]
    UnsupportedVersion(String),

    /// The `method` member was missing, empty or not a string
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The `id` member was neither an integer nor a string
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// The `params` member was neither an array nor an object
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The error `code` was missing, not an integer, or outside the allowed codes
    #[error("Invalid error code: {0}")]
    InvalidCode(String),

    /// A response carried both `result` and `error`
    #[error("Response contains both `result` and `error`")]
    ConflictingResultAndError,

    /// A response carried neither `result` nor `error`
    #[error("Response contains neither `result` nor `error`")]
    MissingResultAndError,

    /// Containers were nested deeper than the configured limit
    #[error("Nesting depth limit exceeded: limit={limit}")]
    DepthLimitExceeded {
        /// The configured maximum nesting depth
        limit: usize,
    },

    /// An envelope member appeared more than once
    #[error("Duplicate member: {0}")]
    DuplicateMember(String),

    /// A dynamic value could not be converted into the requested Rust type
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl DecodeError {
    /// Map a decode failure to the error object a server would answer with
    ///
    /// Malformed JSON becomes a parse error, bad parameters become invalid
    /// params, and every other structural problem is an invalid request.
    pub fn to_error_object(&self) -> ErrorObject {
        let message = self.to_string();
        match self {
            DecodeError::Parse(_) => ErrorObject::parse_error().with_message(message),
            DecodeError::InvalidParameters(_) => ErrorObject::invalid_params().with_message(message),
            _ => ErrorObject::invalid_request().with_message(message),
        }
    }
}

/// Failure while encoding a message or a dynamic value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// The value cannot be represented as JSON (e.g. NaN or infinity)
    #[error("Unsupported host type: {0}")]
    UnsupportedHostType(String),

    /// The request cannot be written as a valid message (empty method)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A raw error code outside -32099..=-32000 slipped past construction
    #[error("Invalid error code: {0} is not inside the range between -32099 and -32000")]
    InvalidCode(i32),

    /// Containers were nested deeper than the configured limit
    #[error("Nesting depth limit exceeded: limit={limit}")]
    DepthLimitExceeded {
        /// The configured maximum nesting depth
        limit: usize,
    },

    /// The underlying writer failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Additional information attached to an [`ErrorObject`]
///
/// The `data` member may hold any JSON value. An object is kept as
/// [`ErrorData::Structured`] so its members can be looked up directly; every
/// other value (including arrays) is [`ErrorData::Primitive`].
///
/// `Primitive(DynamicValue::Null)` is not a canonical form: it is written as
/// `"data": null`, which decodes as no data at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorData {
    /// Any non-object value
    Primitive(DynamicValue),
    /// A keyed object
    Structured(Map),
}

impl ErrorData {
    /// Look up a member of structured data
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        match self {
            ErrorData::Structured(map) => map.get(key),
            ErrorData::Primitive(_) => None,
        }
    }
}

impl From<DynamicValue> for ErrorData {
    fn from(value: DynamicValue) -> Self {
        match value {
            DynamicValue::Object(map) => ErrorData::Structured(map),
            other => ErrorData::Primitive(other),
        }
    }
}

impl From<ErrorData> for DynamicValue {
    fn from(data: ErrorData) -> Self {
        match data {
            ErrorData::Primitive(value) => value,
            ErrorData::Structured(map) => DynamicValue::Object(map),
        }
    }
}

impl Serialize for ErrorData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ErrorData::Primitive(value) => value.serialize(serializer),
            ErrorData::Structured(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
        }
    }
}

/// JSON-RPC 2.0 error object
///
/// A closed set of variants: the five predefined protocol errors plus `Raw`
/// for implementation-defined server errors. `code`, `message` and `data` are
/// computed from the active variant.
///
/// # Raw codes
///
/// `Raw` may only carry a code in `-32099..=-32000`. [`ErrorObject::raw`] is
/// the checked way to build one; since the variant can also be written out by
/// hand, the code is checked again whenever the object is encoded.
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{DynamicValue, ErrorData, ErrorObject};
///
/// let error = ErrorObject::invalid_params()
///     .with_data(ErrorData::Primitive(DynamicValue::from("missing 'amount'")));
/// assert_eq!(error.code(), -32602);
/// assert_eq!(error.message(), "Invalid params");
/// assert!(error.data().is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorObject {
    /// Invalid JSON was received by the server
    ParseError {
        message: String,
        data: Option<ErrorData>,
    },
    /// The JSON sent is not a valid Request object
    InvalidRequest {
        message: String,
        data: Option<ErrorData>,
    },
    /// The method does not exist / is not available
    MethodNotFound {
        message: String,
        data: Option<ErrorData>,
    },
    /// Invalid method parameter(s)
    InvalidParams {
        message: String,
        data: Option<ErrorData>,
    },
    /// Internal JSON-RPC error
    InternalError {
        message: String,
        data: Option<ErrorData>,
    },
    /// Reserved for implementation-defined server errors
    Raw {
        code: i32,
        message: String,
        data: Option<ErrorData>,
    },
}

impl ErrorObject {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Codes available for implementation-defined server errors
    pub const SERVER_ERROR_RANGE: RangeInclusive<i32> = -32099..=-32000;

    /// Create a parse error (-32700)
    pub fn parse_error() -> Self {
        ErrorObject::ParseError {
            message: "Parse error".to_string(),
            data: None,
        }
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request() -> Self {
        ErrorObject::InvalidRequest {
            message: "Invalid Request".to_string(),
            data: None,
        }
    }

    /// Create a method not found error (-32601)
    pub fn method_not_found() -> Self {
        ErrorObject::MethodNotFound {
            message: "Method not found".to_string(),
            data: None,
        }
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params() -> Self {
        ErrorObject::InvalidParams {
            message: "Invalid params".to_string(),
            data: None,
        }
    }

    /// Create an internal error (-32603)
    pub fn internal_error() -> Self {
        ErrorObject::InternalError {
            message: "Internal error".to_string(),
            data: None,
        }
    }

    /// Create an implementation-defined server error
    ///
    /// Returns `None` unless `code` lies in `-32099..=-32000`. This is the
    /// application-facing way to build a `Raw` error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jdyn_core::ErrorObject;
    ///
    /// let error = ErrorObject::raw(-32050, "Quota exhausted", None).unwrap();
    /// assert_eq!(error.code(), -32050);
    /// assert!(ErrorObject::raw(-32100, "Out of range", None).is_none());
    /// ```
    pub fn raw(code: i32, message: impl Into<String>, data: Option<ErrorData>) -> Option<Self> {
        if !Self::is_valid_implementation_defined_code(code) {
            return None;
        }
        Some(ErrorObject::Raw {
            code,
            message: message.into(),
            data,
        })
    }

    /// Create a server error with the default "Server Error" message
    pub fn server_error(code: i32) -> Option<Self> {
        Self::raw(code, "Server Error", None)
    }

    /// Returns `true` if `code` is reserved for implementation-defined errors
    pub fn is_valid_implementation_defined_code(code: i32) -> bool {
        Self::SERVER_ERROR_RANGE.contains(&code)
    }

    /// Map a wire code onto its variant
    ///
    /// The five predefined codes get their own variant, codes in the
    /// server-error range become `Raw`, anything else is `InvalidCode`.
    pub fn from_code(
        code: i64,
        message: impl Into<String>,
        data: Option<ErrorData>,
    ) -> std::result::Result<Self, DecodeError> {
        let code = i32::try_from(code)
            .map_err(|_| DecodeError::InvalidCode(format!("the code {} is not allowed", code)))?;
        let message = message.into();

        let error = match code {
            Self::PARSE_ERROR => ErrorObject::ParseError { message, data },
            Self::INVALID_REQUEST => ErrorObject::InvalidRequest { message, data },
            Self::METHOD_NOT_FOUND => ErrorObject::MethodNotFound { message, data },
            Self::INVALID_PARAMS => ErrorObject::InvalidParams { message, data },
            Self::INTERNAL_ERROR => ErrorObject::InternalError { message, data },
            code if Self::is_valid_implementation_defined_code(code) => {
                ErrorObject::Raw { code, message, data }
            }
            code => {
                return Err(DecodeError::InvalidCode(format!(
                    "the code {} is not allowed",
                    code
                )))
            }
        };
        Ok(error)
    }

    /// A number that indicates the error type that occurred
    pub fn code(&self) -> i32 {
        match self {
            ErrorObject::ParseError { .. } => Self::PARSE_ERROR,
            ErrorObject::InvalidRequest { .. } => Self::INVALID_REQUEST,
            ErrorObject::MethodNotFound { .. } => Self::METHOD_NOT_FOUND,
            ErrorObject::InvalidParams { .. } => Self::INVALID_PARAMS,
            ErrorObject::InternalError { .. } => Self::INTERNAL_ERROR,
            ErrorObject::Raw { code, .. } => *code,
        }
    }

    /// A short description of the error
    pub fn message(&self) -> &str {
        match self {
            ErrorObject::ParseError { message, .. }
            | ErrorObject::InvalidRequest { message, .. }
            | ErrorObject::MethodNotFound { message, .. }
            | ErrorObject::InvalidParams { message, .. }
            | ErrorObject::InternalError { message, .. }
            | ErrorObject::Raw { message, .. } => message,
        }
    }

    /// Additional information about the error, if any
    pub fn data(&self) -> Option<&ErrorData> {
        match self {
            ErrorObject::ParseError { data, .. }
            | ErrorObject::InvalidRequest { data, .. }
            | ErrorObject::MethodNotFound { data, .. }
            | ErrorObject::InvalidParams { data, .. }
            | ErrorObject::InternalError { data, .. }
            | ErrorObject::Raw { data, .. } => data.as_ref(),
        }
    }

    /// Replace the message, keeping code and data
    pub fn with_message(mut self, new_message: impl Into<String>) -> Self {
        *self.message_mut() = new_message.into();
        self
    }

    /// Attach additional data, keeping code and message
    pub fn with_data(mut self, new_data: ErrorData) -> Self {
        *self.data_mut() = Some(new_data);
        self
    }

    fn message_mut(&mut self) -> &mut String {
        match self {
            ErrorObject::ParseError { message, .. }
            | ErrorObject::InvalidRequest { message, .. }
            | ErrorObject::MethodNotFound { message, .. }
            | ErrorObject::InvalidParams { message, .. }
            | ErrorObject::InternalError { message, .. }
            | ErrorObject::Raw { message, .. } => message,
        }
    }

    fn data_mut(&mut self) -> &mut Option<ErrorData> {
        match self {
            ErrorObject::ParseError { data, .. }
            | ErrorObject::InvalidRequest { data, .. }
            | ErrorObject::MethodNotFound { data, .. }
            | ErrorObject::InvalidParams { data, .. }
            | ErrorObject::InternalError { data, .. }
            | ErrorObject::Raw { data, .. } => data,
        }
    }

    /// Check the invariants that construction alone cannot guarantee
    pub fn validate(&self) -> std::result::Result<(), EncodeError> {
        match self {
            ErrorObject::Raw { code, .. } if !Self::is_valid_implementation_defined_code(*code) => {
                Err(EncodeError::InvalidCode(*code))
            }
            _ => Ok(()),
        }
    }
}

impl TryFrom<DynamicValue> for ErrorObject {
    type Error = DecodeError;

    /// Read an error object out of the value of the `error` member
    ///
    /// `code` must be an integer, a missing or non-string `message` becomes
    /// the empty string, and a missing or null `data` means no data.
    fn try_from(value: DynamicValue) -> std::result::Result<Self, DecodeError> {
        let mut members = match value {
            DynamicValue::Object(map) => map,
            other => {
                return Err(DecodeError::InvalidCode(format!(
                    "the error member must be an object, got {}",
                    other.type_name()
                )))
            }
        };

        let code = match members.get("code") {
            Some(DynamicValue::Int(code)) => *code,
            Some(other) => {
                return Err(DecodeError::InvalidCode(format!(
                    "the key 'code' must be an integer, got {}",
                    other.type_name()
                )))
            }
            None => return Err(DecodeError::InvalidCode("the key 'code' is missing".to_string())),
        };

        let message = match members.shift_remove("message") {
            Some(DynamicValue::String(message)) => message,
            _ => String::new(),
        };

        let data = match members.shift_remove("data") {
            None | Some(DynamicValue::Null) => None,
            Some(value) => Some(ErrorData::from(value)),
        };

        ErrorObject::from_code(code, message, data)
    }
}

impl Serialize for ErrorObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.validate().map_err(S::Error::custom)?;

        let data = self.data();
        let mut state = serializer.serialize_map(Some(if data.is_some() { 3 } else { 2 }))?;
        state.serialize_entry("code", &self.code())?;
        state.serialize_entry("message", self.message())?;
        if let Some(data) = data {
            state.serialize_entry("data", data)?;
        }
        state.end()
    }
}

impl fmt::Display for ErrorObject {
    /// Formats as "[code] message", e.g. "[-32601] Method not found"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for ErrorObject {}

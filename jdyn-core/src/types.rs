//! JSON-RPC 2.0 message types
//!
//! This module implements the message envelope of the JSON-RPC 2.0
//! specification (https://www.jsonrpc.org/specification) on top of
//! [`DynamicValue`]:
//!
//! - **Id**: a number or a string, used to correlate responses with requests
//! - **Parameters**: positional (array) or named (object) method arguments
//! - **Request**: a method call; without an id it is a notification
//! - **Response**: either a result or an error, never both
//!
//! All of them implement serde's `Serialize` and `Deserialize`, so they can be
//! used with any serde format. The [`codec`](crate::codec) functions add typed
//! errors and a configurable nesting limit on top.
//!
//! # Request IDs
//!
//! Numbers and strings are different ids: `1` and `"1"` do not match. Null
//! ids are not modelled; a response whose id could not be determined simply
//! has no id.

use crate::envelope::read_envelope;
use crate::error::{DecodeError, EncodeError, ErrorObject};
use crate::value::{
    check_encodable, ensure_depth, from_dynamic, DecodeState, DynamicValue, Map,
    DEFAULT_MAX_DEPTH,
};
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The only protocol version understood here
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request ID
///
/// # Examples
///
/// ```rust
/// use jdyn_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// assert_ne!(Id::Number(1), Id::String("1".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    /// Numeric identifier - efficient for sequential request counters
    Number(i64),
    /// String identifier - useful for UUIDs or correlation tokens
    String(String),
}

impl fmt::Display for Id {
    /// Strings are quoted, numbers are displayed as-is
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{}", n),
            Id::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl TryFrom<DynamicValue> for Id {
    type Error = DecodeError;

    /// Integer first, then string; nothing else is an id
    fn try_from(value: DynamicValue) -> Result<Self, DecodeError> {
        match value {
            DynamicValue::Int(n) => Ok(Id::Number(n)),
            DynamicValue::String(s) => Ok(Id::String(s)),
            other => Err(DecodeError::InvalidId(format!(
                "expected an integer or a string, got {}",
                other.type_name()
            ))),
        }
    }
}

impl From<Id> for DynamicValue {
    fn from(id: Id) -> Self {
        match id {
            Id::Number(n) => DynamicValue::Int(n),
            Id::String(s) => DynamicValue::String(s),
        }
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Id::Number(n) => serializer.serialize_i64(*n),
            Id::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = DynamicValue::deserialize(deserializer)?;
        Id::try_from(value).map_err(D::Error::custom)
    }
}

/// Method parameters
///
/// Positional parameters keep every element in place; a `null` element is
/// `None` so that the remaining elements do not shift. `Some(DynamicValue::Null)`
/// is not a canonical element: it is written as `null` and decodes as `None`.
/// [`Parameters::positional`] normalizes it away.
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{DynamicValue, Parameters};
///
/// let params = Parameters::positional([DynamicValue::Int(42), DynamicValue::Null]);
/// assert_eq!(params.len(), 2);
/// assert_eq!(params.get_positional(0), Some(&DynamicValue::Int(42)));
/// assert_eq!(params.get_positional(1), None);
///
/// let params = Parameters::named([("minuend", 42), ("subtrahend", 23)]);
/// assert_eq!(params.get_named("subtrahend"), Some(&DynamicValue::Int(23)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Parameters {
    /// Arguments by position
    Positional(Vec<Option<DynamicValue>>),
    /// Arguments by name
    Named(Map),
}

impl Parameters {
    /// Build positional parameters; `Null` values become `None`
    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<DynamicValue>,
    {
        Parameters::Positional(
            values
                .into_iter()
                .map(|value| match value.into() {
                    DynamicValue::Null => None,
                    value => Some(value),
                })
                .collect(),
        )
    }

    /// Build named parameters
    pub fn named<I, K, V>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DynamicValue>,
    {
        Parameters::Named(
            members
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        match self {
            Parameters::Positional(items) => items.len(),
            Parameters::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Argument at `index`; `None` when out of range, null, or not positional
    pub fn get_positional(&self, index: usize) -> Option<&DynamicValue> {
        match self {
            Parameters::Positional(items) => items.get(index).and_then(Option::as_ref),
            Parameters::Named(_) => None,
        }
    }

    /// Argument called `key`; `None` when missing or not named
    pub fn get_named(&self, key: &str) -> Option<&DynamicValue> {
        match self {
            Parameters::Named(map) => map.get(key),
            Parameters::Positional(_) => None,
        }
    }

    /// Convert the parameters into a typed value
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jdyn_core::Parameters;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Subtract { minuend: i64, subtrahend: i64 }
    ///
    /// let params = Parameters::named([("minuend", 42), ("subtrahend", 23)]);
    /// let args: Subtract = params.parse().unwrap();
    /// assert_eq!(args.minuend - args.subtrahend, 19);
    /// ```
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        from_dynamic(&DynamicValue::from(self.clone()))
    }

    /// Check that the params can be written as a member of the envelope
    fn check_encodable(&self, max_depth: usize) -> Result<(), EncodeError> {
        ensure_depth(1, max_depth)?;
        match self {
            Parameters::Positional(items) => items
                .iter()
                .flatten()
                .try_for_each(|value| check_encodable(value, 2, max_depth)),
            Parameters::Named(map) => map
                .values()
                .try_for_each(|value| check_encodable(value, 2, max_depth)),
        }
    }
}

impl TryFrom<DynamicValue> for Parameters {
    type Error = DecodeError;

    /// Array first, then object; scalars are not parameters
    fn try_from(value: DynamicValue) -> Result<Self, DecodeError> {
        match value {
            DynamicValue::Array(items) => Ok(Parameters::positional(items)),
            DynamicValue::Object(map) => Ok(Parameters::Named(map)),
            other => Err(DecodeError::InvalidParameters(format!(
                "expected an array or an object, got {}",
                other.type_name()
            ))),
        }
    }
}

impl From<Parameters> for DynamicValue {
    fn from(params: Parameters) -> Self {
        match params {
            Parameters::Positional(items) => items.into_iter().map(DynamicValue::from).collect(),
            Parameters::Named(map) => DynamicValue::Object(map),
        }
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Parameters::Positional(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    // None is written as null to keep positions stable
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Parameters::Named(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = DynamicValue::deserialize(deserializer)?;
        Parameters::try_from(value).map_err(D::Error::custom)
    }
}

/// JSON-RPC 2.0 request message
///
/// A request without an `id` is a notification: the server must not reply
/// to it.
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{Id, Parameters, Request};
///
/// let request = Request::new("subtract", Some(Parameters::positional([42, 23])), Id::Number(1));
/// assert!(!request.is_notification());
///
/// let notification = Request::notification("update", None);
/// assert!(notification.is_notification());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Name of the remote method to invoke
    pub method: String,
    /// Correlation id; absent for notifications
    pub id: Option<Id>,
    /// Optional arguments
    pub params: Option<Parameters>,
}

impl Request {
    /// Create a request that expects a response
    pub fn new(method: impl Into<String>, params: Option<Parameters>, id: Id) -> Self {
        Self {
            method: method.into(),
            id: Some(id),
            params,
        }
    }

    /// Create a notification (no id, no response)
    pub fn notification(method: impl Into<String>, params: Option<Parameters>) -> Self {
        Self {
            method: method.into(),
            id: None,
            params,
        }
    }

    /// Returns true if this request has no id
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub(crate) fn check_encodable(&self, max_depth: usize) -> Result<(), EncodeError> {
        if self.method.is_empty() {
            return Err(EncodeError::InvalidRequest("method must not be empty".to_string()));
        }
        ensure_depth(0, max_depth)?;
        match &self.params {
            Some(params) => params.check_encodable(max_depth),
            None => Ok(()),
        }
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 2 + usize::from(self.params.is_some()) + usize::from(self.id.is_some());
        let mut state = serializer.serialize_map(Some(len))?;
        state.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
        state.serialize_entry("method", &self.method)?;
        if let Some(params) = &self.params {
            state.serialize_entry("params", params)?;
        }
        // Never write a null id: a missing id is what makes a notification
        if let Some(id) = &self.id {
            state.serialize_entry("id", id)?;
        }
        state.end()
    }
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = DecodeState::new(DEFAULT_MAX_DEPTH);
        read_envelope(deserializer, &state)?
            .into_request()
            .map_err(D::Error::custom)
    }
}

/// JSON-RPC 2.0 response message
///
/// A response carries either a result or an error, which the enum makes
/// impossible to get wrong once decoded.
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{DynamicValue, ErrorObject, Id, Response};
///
/// let success = Response::success(Id::Number(4), DynamicValue::Int(19));
/// assert!(success.is_success());
///
/// let failure = Response::error(Some(Id::from("1")), ErrorObject::method_not_found());
/// assert_eq!(failure.as_error().map(|e| e.code()), Some(-32601));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The method ran and produced `result`
    Success { id: Id, result: DynamicValue },
    /// The call failed; `id` is absent if the request id could not be determined
    Error { id: Option<Id>, error: ErrorObject },
}

impl Response {
    /// Create a successful response
    pub fn success(id: Id, result: impl Into<DynamicValue>) -> Self {
        Response::Success {
            id,
            result: result.into(),
        }
    }

    /// Create an error response
    pub fn error(id: Option<Id>, error: ErrorObject) -> Self {
        Response::Error { id, error }
    }

    /// The protocol version, always "2.0"
    pub fn jsonrpc(&self) -> &'static str {
        JSONRPC_VERSION
    }

    /// The id of the request this response answers, if known
    pub fn id(&self) -> Option<&Id> {
        match self {
            Response::Success { id, .. } => Some(id),
            Response::Error { id, .. } => id.as_ref(),
        }
    }

    /// The result on success
    pub fn result(&self) -> Option<&DynamicValue> {
        match self {
            Response::Success { result, .. } => Some(result),
            Response::Error { .. } => None,
        }
    }

    /// The error on failure
    pub fn as_error(&self) -> Option<&ErrorObject> {
        match self {
            Response::Success { .. } => None,
            Response::Error { error, .. } => Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Turn the response into the outcome of the call
    pub fn into_result(self) -> Result<DynamicValue, ErrorObject> {
        match self {
            Response::Success { result, .. } => Ok(result),
            Response::Error { error, .. } => Err(error),
        }
    }

    pub(crate) fn check_encodable(&self, max_depth: usize) -> Result<(), EncodeError> {
        ensure_depth(0, max_depth)?;
        match self {
            Response::Success { result, .. } => check_encodable(result, 1, max_depth),
            Response::Error { error, .. } => {
                error.validate()?;
                ensure_depth(1, max_depth)?;
                match error.data() {
                    Some(data) => check_encodable(&DynamicValue::from(data.clone()), 2, max_depth),
                    None => Ok(()),
                }
            }
        }
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Response::Success { id, result } => {
                let mut state = serializer.serialize_map(Some(3))?;
                state.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
                state.serialize_entry("id", id)?;
                state.serialize_entry("result", result)?;
                state.end()
            }
            Response::Error { id, error } => {
                error.validate().map_err(S::Error::custom)?;
                let mut state = serializer.serialize_map(Some(2 + usize::from(id.is_some())))?;
                state.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
                if let Some(id) = id {
                    state.serialize_entry("id", id)?;
                }
                state.serialize_entry("error", error)?;
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = DecodeState::new(DEFAULT_MAX_DEPTH);
        read_envelope(deserializer, &state)?
            .into_response()
            .map_err(D::Error::custom)
    }
}

/// Any single JSON-RPC 2.0 message
///
/// When receiving messages you don't know in advance whether a request or a
/// response arrives. A message with a `method` member is a request (or
/// notification); anything else is read as a response.
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{codec, Message};
///
/// let message = codec::decode(r#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
/// match message {
///     Message::Request(req) => assert!(req.is_notification()),
///     Message::Response(_) => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    pub fn is_request(&self) -> bool {
        matches!(self, Message::Request(_))
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Message::Response(_))
    }

    pub(crate) fn check_encodable(&self, max_depth: usize) -> Result<(), EncodeError> {
        match self {
            Message::Request(request) => request.check_encodable(max_depth),
            Message::Response(response) => response.check_encodable(max_depth),
        }
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Message::Request(request) => request.serialize(serializer),
            Message::Response(response) => response.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = DecodeState::new(DEFAULT_MAX_DEPTH);
        let envelope = read_envelope(deserializer, &state)?;
        let message = if envelope.is_request() {
            envelope.into_request().map(Message::Request)
        } else {
            envelope.into_response().map(Message::Response)
        };
        message.map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("test".to_string()).to_string(), "\"test\"");
        assert_eq!(Id::Number(42).to_string(), "42");
    }

    #[test]
    fn test_id_discrimination() {
        let number: Id = serde_json::from_str("4").unwrap();
        let string: Id = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(number, Id::Number(4));
        assert_eq!(string, Id::String("4".to_string()));
        assert_ne!(number, string);
    }

    #[test]
    fn test_id_rejects_other_shapes() {
        assert!(serde_json::from_str::<Id>("1.5").is_err());
        assert!(serde_json::from_str::<Id>("null").is_err());
        assert!(serde_json::from_str::<Id>("[1]").is_err());
    }

    #[test]
    fn test_id_serializes_bare() {
        assert_eq!(serde_json::to_string(&Id::Number(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Id::from("abc")).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_parameters_null_positions() {
        let params: Parameters = serde_json::from_str("[1, null, 3]").unwrap();
        assert_eq!(
            params,
            Parameters::Positional(vec![Some(DynamicValue::Int(1)), None, Some(DynamicValue::Int(3))])
        );
        assert_eq!(serde_json::to_string(&params).unwrap(), "[1,null,3]");
    }

    #[test]
    fn test_parameters_some_null_decodes_as_none() {
        let params = Parameters::Positional(vec![Some(DynamicValue::Null), Some(DynamicValue::Int(2))]);
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, "[null,2]");

        let decoded: Parameters = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, Parameters::Positional(vec![None, Some(DynamicValue::Int(2))]));
        assert_eq!(decoded, Parameters::positional([DynamicValue::Null, DynamicValue::Int(2)]));
    }

    #[test]
    fn test_parameters_reject_scalars() {
        assert!(serde_json::from_str::<Parameters>("42").is_err());
        assert!(serde_json::from_str::<Parameters>("\"x\"").is_err());
    }

    #[test]
    fn test_parameters_named_order() {
        let params: Parameters = serde_json::from_str(r#"{"subtrahend": 23, "minuend": 42}"#).unwrap();
        assert_eq!(serde_json::to_string(&params).unwrap(), r#"{"subtrahend":23,"minuend":42}"#);
        assert_eq!(params.len(), 2);
        assert_eq!(params.get_positional(0), None);
    }

    #[test]
    fn test_request_serialization() {
        let req = Request::new("test", None, Id::Number(1));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, json!({"jsonrpc": "2.0", "method": "test", "id": 1}));
    }

    #[test]
    fn test_notification_serialization() {
        let notif = Request::notification("notify", Some(Parameters::named([("status", "online")])));
        let json = serde_json::to_string(&notif).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"notify\""));
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_request_deserialize_via_serde() {
        let req: Request =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":"a"}"#).unwrap();
        assert_eq!(req.method, "sum");
        assert_eq!(req.id, Some(Id::from("a")));
        assert_eq!(req.params, Some(Parameters::positional([1, 2])));
    }

    #[test]
    fn test_request_null_id_is_notification() {
        let req: Request = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"m","id":null}"#).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_response_accessors() {
        let resp = Response::success(Id::Number(1), DynamicValue::from("ok"));
        assert!(resp.is_success());
        assert!(!resp.is_error());
        assert_eq!(resp.jsonrpc(), "2.0");
        assert_eq!(resp.id(), Some(&Id::Number(1)));
        assert_eq!(resp.result(), Some(&DynamicValue::from("ok")));
        assert!(resp.as_error().is_none());
        assert_eq!(resp.into_result(), Ok(DynamicValue::from("ok")));
    }

    #[test]
    fn test_response_error_serialization() {
        let resp = Response::error(Some(Id::Number(1)), ErrorObject::internal_error());
        assert!(!resp.is_success());
        assert!(resp.is_error());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32603, "message": "Internal error"}})
        );
    }

    #[test]
    fn test_response_error_without_id_omits_it() {
        let resp = Response::error(None, ErrorObject::parse_error());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"jsonrpc": "2.0", "error": {"code": -32700, "message": "Parse error"}}));
    }

    #[test]
    fn test_response_null_result_is_success() {
        let resp: Response = serde_json::from_str(r#"{"jsonrpc":"2.0","result":null,"id":3}"#).unwrap();
        assert_eq!(resp, Response::success(Id::Number(3), DynamicValue::Null));
    }

    #[test]
    fn test_message_selects_by_method() {
        let msg: Message = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"m","id":1}"#).unwrap();
        assert!(msg.is_request());

        let msg: Message = serde_json::from_str(r#"{"jsonrpc":"2.0","result":42,"id":1}"#).unwrap();
        assert!(msg.is_response());
    }

    #[test]
    fn test_request_check_rejects_empty_method() {
        let req = Request::notification("", None);
        assert!(matches!(req.check_encodable(8), Err(EncodeError::InvalidRequest(_))));
    }
}

//! Codec for JSON-RPC message serialization and deserialization
//!
//! The types in this crate implement serde's traits and can be used with
//! `serde_json` directly. The functions here add what plain serde cannot
//! express:
//!
//! - **Typed errors**: every failure is a [`DecodeError`] or [`EncodeError`]
//!   variant instead of a formatted serde message
//! - **Depth limit**: nested containers beyond [`CodecConfig::max_depth`] are
//!   rejected on both sides
//! - **Re-validation**: invariants that construction cannot guarantee (raw
//!   error codes, finite doubles) are checked again before writing
//!
//! # Error mapping
//!
//! - Malformed JSON, truncated input and trailing characters → `Parse`
//! - Well-formed JSON that is not a message object → `InvalidMessage`
//! - Everything else is reported by the check that failed
//!
//! # Examples
//!
//! ```rust
//! use jdyn_core::{codec, Id, Request};
//!
//! // Encode a request
//! let request = Request::new("ping", None, Id::Number(1));
//! let bytes = codec::encode_request(&request).unwrap();
//!
//! // Decode it back
//! let decoded = codec::decode(&bytes).unwrap();
//! assert!(decoded.is_request());
//! ```

use crate::envelope::read_envelope;
use crate::error::{DecodeError, EncodeError};
use crate::types::{Message, Request, Response};
use crate::value::{check_encodable, DecodeState, DynamicValue, DEFAULT_MAX_DEPTH};
use serde::de::DeserializeSeed;
use serde::Serialize;
use serde_json::de::SliceRead;
use serde_json::error::Category;

/// Limits applied by the codec functions
///
/// Depth counts nested containers from the document root: the envelope
/// object of a message is depth 1, so a `params` array sits at depth 2.
///
/// The limit covers the whole document, including envelope members that are
/// otherwise ignored.
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{codec, CodecConfig, DecodeError};
///
/// let config = CodecConfig::default().with_max_depth(2);
/// let result = codec::decode_value_with("[[[]]]", &config);
/// assert_eq!(result, Err(DecodeError::DepthLimitExceeded { limit: 2 }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum number of nested containers
    ///
    /// `serde_json` refuses documents nested deeper than 128 on its own and
    /// reports them as a parse error, so limits above that have no effect
    /// on decoding.
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Decode a request or notification with the default configuration
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{codec, Id};
///
/// let json = r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#;
/// let request = codec::decode_request(json).unwrap();
/// assert_eq!(request.method, "subtract");
/// assert_eq!(request.id, Some(Id::Number(1)));
/// ```
pub fn decode_request(data: impl AsRef<[u8]>) -> Result<Request, DecodeError> {
    decode_request_with(data, &CodecConfig::default())
}

pub fn decode_request_with(data: impl AsRef<[u8]>, config: &CodecConfig) -> Result<Request, DecodeError> {
    let data = data.as_ref();
    tracing::trace!(len = data.len(), "Decoding request");
    logged(
        "request",
        read(data, config, |de, state| read_envelope(de, state))
            .and_then(|envelope| envelope.into_request()),
    )
}

/// Decode a response with the default configuration
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{codec, DynamicValue};
///
/// let response = codec::decode_response(r#"{"jsonrpc":"2.0","result":19,"id":4}"#).unwrap();
/// assert_eq!(response.result(), Some(&DynamicValue::Int(19)));
/// ```
pub fn decode_response(data: impl AsRef<[u8]>) -> Result<Response, DecodeError> {
    decode_response_with(data, &CodecConfig::default())
}

pub fn decode_response_with(data: impl AsRef<[u8]>, config: &CodecConfig) -> Result<Response, DecodeError> {
    let data = data.as_ref();
    tracing::trace!(len = data.len(), "Decoding response");
    logged(
        "response",
        read(data, config, |de, state| read_envelope(de, state))
            .and_then(|envelope| envelope.into_response()),
    )
}

/// Decode any message with the default configuration
///
/// A message with a `method` member is decoded as a request, anything else
/// as a response.
///
/// # Examples
///
/// ```rust
/// use jdyn_core::codec;
///
/// let msg = codec::decode(r#"{"jsonrpc":"2.0","method":"test","id":1}"#).unwrap();
/// assert!(msg.is_request());
///
/// let msg = codec::decode(r#"{"jsonrpc":"2.0","result":"ok","id":1}"#).unwrap();
/// assert!(msg.is_response());
/// ```
pub fn decode(data: impl AsRef<[u8]>) -> Result<Message, DecodeError> {
    decode_with(data, &CodecConfig::default())
}

pub fn decode_with(data: impl AsRef<[u8]>, config: &CodecConfig) -> Result<Message, DecodeError> {
    let data = data.as_ref();
    tracing::trace!(len = data.len(), "Decoding message");
    let message = read(data, config, |de, state| read_envelope(de, state)).and_then(|envelope| {
        if envelope.is_request() {
            envelope.into_request().map(Message::Request)
        } else {
            envelope.into_response().map(Message::Response)
        }
    });
    logged("message", message)
}

/// Decode a standalone JSON value with the default configuration
pub fn decode_value(data: impl AsRef<[u8]>) -> Result<DynamicValue, DecodeError> {
    decode_value_with(data, &CodecConfig::default())
}

pub fn decode_value_with(data: impl AsRef<[u8]>, config: &CodecConfig) -> Result<DynamicValue, DecodeError> {
    let data = data.as_ref();
    tracing::trace!(len = data.len(), "Decoding value");
    logged("value", read(data, config, |de, state| state.seed(0).deserialize(de)))
}

/// Encode a request or notification with the default configuration
///
/// # Errors
///
/// - `InvalidRequest` if the method is empty
/// - `UnsupportedHostType` if the params contain a non-finite double
/// - `DepthLimitExceeded` if the params are nested too deeply
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{codec, Parameters, Request};
///
/// let notif = Request::notification("update", Some(Parameters::positional([1, 2, 3])));
/// let bytes = codec::encode_request(&notif).unwrap();
/// assert_eq!(bytes, br#"{"jsonrpc":"2.0","method":"update","params":[1,2,3]}"#);
/// ```
pub fn encode_request(request: &Request) -> Result<Vec<u8>, EncodeError> {
    encode_request_with(request, &CodecConfig::default())
}

pub fn encode_request_with(request: &Request, config: &CodecConfig) -> Result<Vec<u8>, EncodeError> {
    tracing::trace!(method = %request.method, "Encoding request");
    logged(
        "request",
        request.check_encodable(config.max_depth).and_then(|()| write(request)),
    )
}

/// Encode a response with the default configuration
///
/// # Errors
///
/// - `InvalidCode` if a raw error code is outside the reserved range
/// - `UnsupportedHostType` if the result or error data holds a non-finite double
/// - `DepthLimitExceeded` if the result or error data is nested too deeply
///
/// # Examples
///
/// ```rust
/// use jdyn_core::{codec, DynamicValue, Id, Response};
///
/// let response = Response::success(Id::Number(0), DynamicValue::from(vec![1i64.into(), 2i64.into()]));
/// let bytes = codec::encode_response(&response).unwrap();
/// assert_eq!(bytes, br#"{"jsonrpc":"2.0","id":0,"result":[1,2]}"#);
/// ```
pub fn encode_response(response: &Response) -> Result<Vec<u8>, EncodeError> {
    encode_response_with(response, &CodecConfig::default())
}

pub fn encode_response_with(response: &Response, config: &CodecConfig) -> Result<Vec<u8>, EncodeError> {
    tracing::trace!(id = ?response.id(), "Encoding response");
    logged(
        "response",
        response.check_encodable(config.max_depth).and_then(|()| write(response)),
    )
}

/// Encode any message with the default configuration
pub fn encode(message: &Message) -> Result<Vec<u8>, EncodeError> {
    encode_with(message, &CodecConfig::default())
}

pub fn encode_with(message: &Message, config: &CodecConfig) -> Result<Vec<u8>, EncodeError> {
    tracing::trace!(request = message.is_request(), "Encoding message");
    logged(
        "message",
        message.check_encodable(config.max_depth).and_then(|()| write(message)),
    )
}

/// Encode a standalone JSON value with the default configuration
pub fn encode_value(value: &DynamicValue) -> Result<Vec<u8>, EncodeError> {
    encode_value_with(value, &CodecConfig::default())
}

pub fn encode_value_with(value: &DynamicValue, config: &CodecConfig) -> Result<Vec<u8>, EncodeError> {
    tracing::trace!(kind = value.type_name(), "Encoding value");
    logged(
        "value",
        check_encodable(value, 0, config.max_depth).and_then(|()| write(value)),
    )
}

/// Run `f` over a fresh deserializer and require the input to end after it
fn read<'de, T, F>(data: &'de [u8], config: &CodecConfig, f: F) -> Result<T, DecodeError>
where
    F: FnOnce(&mut serde_json::Deserializer<SliceRead<'de>>, &DecodeState) -> Result<T, serde_json::Error>,
{
    let state = DecodeState::new(config.max_depth);
    let mut de = serde_json::Deserializer::from_slice(data);

    let result = f(&mut de, &state).and_then(|value| de.end().map(|()| value));
    result.map_err(|e| state.take_failure().unwrap_or_else(|| classify(e)))
}

fn classify(error: serde_json::Error) -> DecodeError {
    match error.classify() {
        Category::Data => DecodeError::InvalidMessage(error.to_string()),
        Category::Syntax | Category::Eof | Category::Io => DecodeError::Parse(error.to_string()),
    }
}

fn write<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec(value).map_err(|e| EncodeError::Serialization(e.to_string()))
}

fn logged<T, E: std::fmt::Display>(what: &'static str, result: Result<T, E>) -> Result<T, E> {
    if let Err(e) = &result {
        tracing::debug!(kind = what, error = %e, "Codec call failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorObject;
    use crate::types::{Id, Parameters};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn to_json(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_decode_positional_request() {
        let req = decode_request(r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#).unwrap();
        assert_eq!(
            req,
            Request::new("subtract", Some(Parameters::positional([42, 23])), Id::Number(1))
        );
    }

    #[test]
    fn test_decode_notification() {
        let req = decode_request(r#"{"jsonrpc":"2.0","method":"update","params":[1,2,3,4,5]}"#).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_decode_method_not_found_response() {
        let resp = decode_response(
            r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":"1"}"#,
        )
        .unwrap();
        assert_eq!(
            resp,
            Response::error(Some(Id::from("1")), ErrorObject::method_not_found())
        );
    }

    #[test]
    fn test_decode_wrong_version() {
        assert_matches!(
            decode_request(r#"{"jsonrpc":"1.0","method":"m","id":1}"#),
            Err(DecodeError::UnsupportedVersion(_))
        );
        assert_matches!(
            decode_response(r#"{"jsonrpc":"1.0","result":1,"id":1}"#),
            Err(DecodeError::UnsupportedVersion(_))
        );
    }

    #[test]
    fn test_decode_conflicting_and_missing_result() {
        assert_eq!(
            decode_response(r#"{"jsonrpc":"2.0","result":1,"error":{"code":-32603,"message":"x"},"id":1}"#),
            Err(DecodeError::ConflictingResultAndError)
        );
        assert_eq!(
            decode_response(r#"{"jsonrpc":"2.0","id":1}"#),
            Err(DecodeError::MissingResultAndError)
        );
    }

    #[test]
    fn test_decode_invalid_json() {
        assert_matches!(decode(r#"{"jsonrpc":"2.0","method""#), Err(DecodeError::Parse(_)));
        assert_matches!(decode(""), Err(DecodeError::Parse(_)));
        assert_matches!(decode(b"\xff\xfe"), Err(DecodeError::Parse(_)));
    }

    #[test]
    fn test_decode_trailing_characters() {
        assert_matches!(
            decode(r#"{"jsonrpc":"2.0","method":"m"} {}"#),
            Err(DecodeError::Parse(_))
        );
    }

    #[test]
    fn test_decode_non_object() {
        assert_matches!(decode("[1,2]"), Err(DecodeError::InvalidMessage(_)));
        assert_matches!(decode("\"hello\""), Err(DecodeError::InvalidMessage(_)));
    }

    #[test]
    fn test_decode_duplicate_member() {
        assert_eq!(
            decode(r#"{"jsonrpc":"2.0","id":1,"id":2,"result":0}"#),
            Err(DecodeError::DuplicateMember("id".to_string()))
        );
    }

    #[test]
    fn test_decode_depth_limit() {
        let config = CodecConfig::default().with_max_depth(3);
        assert!(decode_request_with(r#"{"jsonrpc":"2.0","method":"m","params":[[1]]}"#, &config).is_ok());
        assert_eq!(
            decode_request_with(r#"{"jsonrpc":"2.0","method":"m","params":[[[1]]]}"#, &config),
            Err(DecodeError::DepthLimitExceeded { limit: 3 })
        );
    }

    #[test]
    fn test_unknown_members_obey_depth_limit() {
        let config = CodecConfig::default().with_max_depth(3);
        let shallow = r#"{"jsonrpc":"2.0","method":"m","extra":[[1]]}"#;
        assert!(decode_request_with(shallow, &config).is_ok());

        let deep = r#"{"jsonrpc":"2.0","method":"m","extra":[[[[1]]]]}"#;
        assert_eq!(
            decode_request_with(deep, &config),
            Err(DecodeError::DepthLimitExceeded { limit: 3 })
        );

        let very_deep = format!(
            r#"{{"jsonrpc":"2.0","result":0,"id":1,"extra":{}1{}}}"#,
            "[".repeat(200),
            "]".repeat(200)
        );
        assert_eq!(
            decode_response(very_deep),
            Err(DecodeError::DepthLimitExceeded { limit: 64 })
        );
    }

    #[test]
    fn test_decode_invalid_error_code() {
        assert_matches!(
            decode_response(r#"{"jsonrpc":"2.0","error":{"code":-1,"message":"x"},"id":1}"#),
            Err(DecodeError::InvalidCode(_))
        );
    }

    #[test]
    fn test_decode_value_keeps_number_kinds() {
        let value = decode_value("[2, 2.0]").unwrap();
        assert_eq!(
            value,
            DynamicValue::Array(vec![DynamicValue::Int(2), DynamicValue::Double(2.0)])
        );
        assert_eq!(encode_value(&value).unwrap(), b"[2,2.0]");
    }

    #[test]
    fn test_encode_success_response() {
        let resp = Response::success(
            Id::Number(0),
            DynamicValue::Array(vec![1i64.into(), 2i64.into(), 3i64.into()]),
        );
        let bytes = encode_response(&resp).unwrap();
        assert_eq!(to_json(&bytes), json!({"jsonrpc": "2.0", "id": 0, "result": [1, 2, 3]}));
    }

    #[test]
    fn test_encode_notification_omits_id() {
        let bytes = encode_request(&Request::notification("ping", None)).unwrap();
        assert_eq!(to_json(&bytes), json!({"jsonrpc": "2.0", "method": "ping"}));
    }

    #[test]
    fn test_encode_rejects_forced_raw_code() {
        let resp = Response::error(
            Some(Id::Number(1)),
            ErrorObject::Raw {
                code: -1,
                message: "nope".to_string(),
                data: None,
            },
        );
        assert_eq!(encode_response(&resp), Err(EncodeError::InvalidCode(-1)));
    }

    #[test]
    fn test_encode_rejects_non_finite() {
        let resp = Response::success(Id::Number(1), DynamicValue::Double(f64::INFINITY));
        assert_matches!(encode_response(&resp), Err(EncodeError::UnsupportedHostType(_)));
    }

    #[test]
    fn test_encode_depth_limit() {
        let config = CodecConfig::default().with_max_depth(2);
        let params = Parameters::positional([DynamicValue::from(vec![DynamicValue::Int(1)])]);
        let req = Request::new("m", Some(params), Id::Number(1));
        assert_eq!(
            encode_request_with(&req, &config),
            Err(EncodeError::DepthLimitExceeded { limit: 2 })
        );

        let flat = Request::new("m", Some(Parameters::positional([1])), Id::Number(1));
        assert!(encode_request_with(&flat, &config).is_ok());
    }

    #[test]
    fn test_encode_empty_method() {
        assert_matches!(
            encode(&Message::Request(Request::notification("", None))),
            Err(EncodeError::InvalidRequest(_))
        );
    }

    #[test]
    fn test_round_trip_message() {
        let original = Message::Response(Response::error(
            None,
            ErrorObject::parse_error().with_data(DynamicValue::from("unexpected end").into()),
        ));
        let bytes = encode(&original).unwrap();
        assert_eq!(decode(&bytes).unwrap(), original);
    }
}

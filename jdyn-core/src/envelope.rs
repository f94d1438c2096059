//! Reading the JSON-RPC envelope
//!
//! The top-level object is read member by member. Known members are decoded
//! into [`DynamicValue`]s (payloads one level below the envelope), unknown
//! members are decoded under the same depth limit and dropped, and a repeated
//! member is an error. Turning the raw
//! members into a [`Request`] or [`Response`] happens afterwards in plain
//! Rust, which keeps every validation failure typed.

use crate::error::{DecodeError, ErrorObject};
use crate::types::{Id, Parameters, Request, Response, JSONRPC_VERSION};
use crate::value::{DecodeState, DynamicValue};
use serde::de::{DeserializeSeed, Deserializer, MapAccess, Visitor};
use std::fmt;

/// The envelope members, undecoded beyond their dynamic shape
#[derive(Debug, Default)]
pub(crate) struct RawEnvelope {
    jsonrpc: Option<DynamicValue>,
    method: Option<DynamicValue>,
    id: Option<DynamicValue>,
    params: Option<DynamicValue>,
    result: Option<DynamicValue>,
    error: Option<DynamicValue>,
}

/// Read one envelope object from `deserializer`
pub(crate) fn read_envelope<'de, D>(deserializer: D, state: &DecodeState) -> Result<RawEnvelope, D::Error>
where
    D: Deserializer<'de>,
{
    EnvelopeSeed { state }.deserialize(deserializer)
}

struct EnvelopeSeed<'a> {
    state: &'a DecodeState,
}

impl<'de> DeserializeSeed<'de> for EnvelopeSeed<'_> {
    type Value = RawEnvelope;

    fn deserialize<D>(self, deserializer: D) -> Result<RawEnvelope, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for EnvelopeSeed<'_> {
    type Value = RawEnvelope;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON-RPC 2.0 message object")
    }

    fn visit_map<A>(self, mut access: A) -> Result<RawEnvelope, A::Error>
    where
        A: MapAccess<'de>,
    {
        let state = self.state;
        let open = state.enter(0)?;
        let mut envelope = RawEnvelope::default();

        while let Some(key) = access.next_key::<String>()? {
            let slot = match key.as_str() {
                "jsonrpc" => &mut envelope.jsonrpc,
                "method" => &mut envelope.method,
                "id" => &mut envelope.id,
                "params" => &mut envelope.params,
                "result" => &mut envelope.result,
                "error" => &mut envelope.error,
                _ => {
                    // Dropped, but still bound by the depth limit
                    access.next_value_seed(state.seed(open))?;
                    continue;
                }
            };
            if slot.is_some() {
                return Err(state.fail(DecodeError::DuplicateMember(key)));
            }
            *slot = Some(access.next_value_seed(state.seed(open))?);
        }

        Ok(envelope)
    }
}

impl RawEnvelope {
    /// Requests and notifications are the messages carrying a `method`
    pub(crate) fn is_request(&self) -> bool {
        self.method.is_some()
    }

    fn check_version(&self) -> Result<(), DecodeError> {
        match &self.jsonrpc {
            Some(DynamicValue::String(version)) if version == JSONRPC_VERSION => Ok(()),
            Some(other) => Err(DecodeError::UnsupportedVersion(other.to_string())),
            None => Err(DecodeError::UnsupportedVersion(
                "the key 'jsonrpc' is missing".to_string(),
            )),
        }
    }

    pub(crate) fn into_request(self) -> Result<Request, DecodeError> {
        self.check_version()?;

        let method = match self.method {
            Some(DynamicValue::String(method)) if !method.is_empty() => method,
            Some(DynamicValue::String(_)) => {
                return Err(DecodeError::InvalidRequest("method must not be empty".to_string()))
            }
            Some(other) => {
                return Err(DecodeError::InvalidRequest(format!(
                    "method must be a string, got {}",
                    other.type_name()
                )))
            }
            None => return Err(DecodeError::InvalidRequest("the key 'method' is missing".to_string())),
        };

        // id and params are optional: a member that does not fit is dropped
        let id = match self.id.map(Id::try_from) {
            Some(Ok(id)) => Some(id),
            Some(Err(e)) => {
                tracing::debug!(method = %method, error = %e, "Ignoring request id");
                None
            }
            None => None,
        };
        let params = match self.params.map(Parameters::try_from) {
            Some(Ok(params)) => Some(params),
            Some(Err(e)) => {
                tracing::debug!(method = %method, error = %e, "Ignoring request params");
                None
            }
            None => None,
        };

        Ok(Request { method, id, params })
    }

    pub(crate) fn into_response(self) -> Result<Response, DecodeError> {
        self.check_version()?;

        // Null means the server could not determine the request id
        let id = match self.id {
            None | Some(DynamicValue::Null) => None,
            Some(value) => Some(Id::try_from(value)?),
        };

        match (self.result, self.error) {
            (Some(_), Some(_)) => Err(DecodeError::ConflictingResultAndError),
            (None, None) => Err(DecodeError::MissingResultAndError),
            (Some(result), None) => {
                let id = id.ok_or_else(|| {
                    DecodeError::InvalidId("a successful response requires an id".to_string())
                })?;
                Ok(Response::Success { id, result })
            }
            (None, Some(error)) => Ok(Response::Error {
                id,
                error: ErrorObject::try_from(error)?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn read(json: &str) -> Result<RawEnvelope, DecodeError> {
        let state = DecodeState::new(8);
        let mut de = serde_json::Deserializer::from_str(json);
        read_envelope(&mut de, &state)
            .map_err(|e| state.take_failure().unwrap_or(DecodeError::Parse(e.to_string())))
    }

    #[test]
    fn test_unknown_members_are_skipped() {
        let envelope = read(r#"{"jsonrpc":"2.0","method":"m","extra":{"deep":[1,2]}}"#).unwrap();
        assert!(envelope.is_request());
        assert_eq!(envelope.method, Some(DynamicValue::from("m")));
    }

    #[test]
    fn test_unknown_members_obey_depth_limit() {
        let too_deep = r#"{"jsonrpc":"2.0","method":"m","extra":[[[[[[[[1]]]]]]]]}"#;
        assert_eq!(
            read(too_deep).unwrap_err(),
            DecodeError::DepthLimitExceeded { limit: 8 }
        );
    }

    #[test]
    fn test_duplicate_member() {
        let result = read(r#"{"jsonrpc":"2.0","method":"a","method":"b"}"#);
        assert_eq!(result.unwrap_err(), DecodeError::DuplicateMember("method".to_string()));
    }

    #[test]
    fn test_missing_version() {
        let envelope = read(r#"{"method":"m"}"#).unwrap();
        assert_matches!(envelope.into_request(), Err(DecodeError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_numeric_version_rejected() {
        let envelope = read(r#"{"jsonrpc":2.0,"method":"m"}"#).unwrap();
        assert_matches!(envelope.into_request(), Err(DecodeError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_non_string_method() {
        let envelope = read(r#"{"jsonrpc":"2.0","method":7}"#).unwrap();
        assert_matches!(envelope.into_request(), Err(DecodeError::InvalidRequest(_)));
    }

    #[test]
    fn test_undecodable_id_and_params_are_dropped() {
        let envelope = read(r#"{"jsonrpc":"2.0","method":"m","id":true,"params":"flat"}"#).unwrap();
        let request = envelope.into_request().unwrap();
        assert_eq!(request.id, None);
        assert_eq!(request.params, None);
    }

    #[test]
    fn test_response_error_with_null_id() {
        let envelope = read(
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#,
        )
        .unwrap();
        let response = envelope.into_response().unwrap();
        assert_eq!(response.id(), None);
        assert_eq!(response.as_error().map(ErrorObject::code), Some(-32700));
    }

    #[test]
    fn test_response_success_requires_id() {
        let envelope = read(r#"{"jsonrpc":"2.0","result":1}"#).unwrap();
        assert_matches!(envelope.into_response(), Err(DecodeError::InvalidId(_)));

        let envelope = read(r#"{"jsonrpc":"2.0","result":1,"id":null}"#).unwrap();
        assert_matches!(envelope.into_response(), Err(DecodeError::InvalidId(_)));
    }

    #[test]
    fn test_response_bad_id_shape() {
        let envelope = read(r#"{"jsonrpc":"2.0","result":1,"id":[1]}"#).unwrap();
        assert_matches!(envelope.into_response(), Err(DecodeError::InvalidId(_)));
    }

    #[test]
    fn test_payload_depth_counts_envelope() {
        // envelope (1) + params (2) + ... limit is 8
        let ok = r#"{"jsonrpc":"2.0","method":"m","params":[[[[[[[1]]]]]]]}"#;
        assert!(read(ok).is_ok());

        let too_deep = r#"{"jsonrpc":"2.0","method":"m","params":[[[[[[[[1]]]]]]]]}"#;
        assert_eq!(
            read(too_deep).unwrap_err(),
            DecodeError::DepthLimitExceeded { limit: 8 }
        );
    }
}

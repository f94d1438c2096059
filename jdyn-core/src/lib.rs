//! JSON-RPC 2.0 messages over dynamic JSON values
//!
//! This crate models the JSON-RPC 2.0 message envelope with strong types while
//! leaving the payloads (`params`, `result` and error `data`) as JSON of any
//! shape. It includes:
//!
//! - **Value**: [`DynamicValue`], a closed union over the seven JSON kinds
//! - **Types**: requests, notifications, responses and their ids and params
//! - **Error handling**: protocol error objects and typed codec errors
//! - **Codec**: decoding and encoding with depth limits and re-validation
//! - **Observability**: `tracing` subscriber setup
//!
//! # Architecture
//!
//! The crate is transport-agnostic: it turns bytes into messages and back,
//! nothing more. Reading and writing go through serde, so every type here
//! also works with formats other than JSON; the [`codec`] functions are the
//! JSON entry points with typed errors.
//!
//! # Example
//!
//! ```rust
//! use jdyn_core::{codec, DynamicValue, Id, Parameters, Request, Response};
//!
//! // Create a request
//! let request = Request::new("add", Some(Parameters::named([("a", 5), ("b", 3)])), Id::Number(1));
//!
//! // Encode it to JSON
//! let bytes = codec::encode_request(&request).unwrap();
//!
//! // Decode it back
//! let decoded = codec::decode_request(&bytes).unwrap();
//! assert_eq!(decoded, request);
//!
//! // Answer it
//! let params = decoded.params.unwrap();
//! let sum = params.get_named("a").and_then(DynamicValue::as_i64).unwrap()
//!     + params.get_named("b").and_then(DynamicValue::as_i64).unwrap();
//! let response = Response::success(decoded.id.unwrap(), sum);
//! assert_eq!(codec::encode_response(&response).unwrap(), br#"{"jsonrpc":"2.0","id":1,"result":8}"#);
//! ```

pub mod codec;
mod envelope;
pub mod error;
pub mod observability;
pub mod types;
pub mod value;

// Re-export the most commonly used types for convenience
pub use codec::CodecConfig;
pub use error::{DecodeError, EncodeError, Error, ErrorData, ErrorObject, Result};
pub use observability::{init_observability, ObservabilityConfig};
pub use types::{Id, Message, Parameters, Request, Response, JSONRPC_VERSION};
pub use value::{from_dynamic, to_dynamic, DynamicValue, Map};

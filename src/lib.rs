//! JDYN - JSON-RPC 2.0 messages over dynamic JSON values
//!
//! This is the convenience crate that re-exports the jdyn sub-crates. Use it
//! if you want a single dependency.
//!
//! # Architecture
//!
//! - **jdyn-core**: dynamic values, message types, codec, error handling,
//!   observability
//!
//! # Quick Start
//!
//! ```rust
//! use jdyn::{codec, ErrorObject, Message, Response};
//!
//! let incoming = br#"{"jsonrpc":"2.0","method":"frobnicate","id":"7"}"#;
//!
//! let reply = match codec::decode(incoming) {
//!     Ok(Message::Request(req)) if !req.is_notification() => {
//!         Response::error(req.id, ErrorObject::method_not_found())
//!     }
//!     Ok(_) => return,
//!     Err(e) => Response::error(None, e.to_error_object()),
//! };
//!
//! let bytes = codec::encode_response(&reply).unwrap();
//! assert_eq!(
//!     bytes,
//!     br#"{"jsonrpc":"2.0","id":"7","error":{"code":-32601,"message":"Method not found"}}"#
//! );
//! ```
//!
//! The core crate is also reachable under its own path, and any serializable
//! application value converts into params with [`to_dynamic`]:
//!
//! ```rust
//! use jdyn::{codec, Id, Parameters, Request};
//!
//! let value = jdyn::to_dynamic(&("alice", 10)).unwrap();
//! let params = Parameters::try_from(value).unwrap();
//! let request: jdyn::core::Request = Request::new("transfer", Some(params), Id::Number(1));
//!
//! let bytes = codec::encode_request(&request).unwrap();
//! assert_eq!(
//!     bytes,
//!     br#"{"jsonrpc":"2.0","method":"transfer","params":["alice",10],"id":1}"#
//! );
//! ```

pub use jdyn_core as core;

// Convenience re-exports so that `jdyn::Request` works without the `core` prefix
pub use jdyn_core::*;

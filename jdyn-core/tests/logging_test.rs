//! Codec logging through tracing

use jdyn_core::{codec, DecodeError, DynamicValue};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(captured.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, captured.contents())
}

#[test]
fn test_failed_decode_is_logged() {
    let (result, logs) = with_logs(|| codec::decode("{\"jsonrpc\""));
    assert!(matches!(result, Err(DecodeError::Parse(_))));
    assert!(logs.contains("Codec call failed"), "logs: {}", logs);
}

#[test]
fn test_dropped_request_id_is_logged() {
    let (result, logs) = with_logs(|| codec::decode_request(r#"{"jsonrpc":"2.0","method":"m","id":[1]}"#));
    assert_eq!(result.unwrap().id, None);
    assert!(logs.contains("Ignoring request id"), "logs: {}", logs);
}

#[test]
fn test_success_is_quiet_above_trace() {
    let (result, logs) = with_logs(|| codec::decode_value("[1, 2.5]"));
    assert_eq!(
        result.unwrap(),
        DynamicValue::Array(vec![DynamicValue::Int(1), DynamicValue::Double(2.5)])
    );
    assert!(logs.is_empty(), "logs: {}", logs);
}

//! Shared test fixtures: tokens captured from the issuing application and
//! builders for hostile streams.

use std::io;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use crate::stream::writer::{ClassSpec, StreamWriter};
use crate::typed::codec::TokenCodec;
use crate::typed::task::{FieldSpec, FieldValue};

/// Allowlisted type, serialVersionUID 1, 2019-09-30T06:33:08.204281,
/// action "echo hello", name "sayHello".
pub(crate) const VERSION_ONE_TOKEN: &str = "rO0ABXNyADFvcmcuZHVtbXkuaW5zZWN1cmUuZnJhbWV3b3JrLlZ1bG5lcmFibGVUYXNrSG9sZGVyAAAAAAAAAAECAANMABZyZXF1ZXN0ZWRFeGVjdXRpb25UaW1ldAAZTGphdmEvdGltZS9Mb2NhbERhdGVUaW1lO0wACnRhc2tBY3Rpb250ABJMamF2YS9sYW5nL1N0cmluZztMAAh0YXNrTmFtZXEAfgACeHBzcgANamF2YS50aW1lLlNlcpVdhLobIkiyDAAAeHB3DgUAAAfjCR4GIQgMLRSoeHQACmVjaG8gaGVsbG90AAhzYXlIZWxsbw";

/// Allowlisted type, serialVersionUID 2, 2019-09-30T08:12:45.410973,
/// action "echo hello", name "sayHello".
pub(crate) const EXPIRED_TOKEN: &str = "rO0ABXNyADFvcmcuZHVtbXkuaW5zZWN1cmUuZnJhbWV3b3JrLlZ1bG5lcmFibGVUYXNrSG9sZGVyAAAAAAAAAAICAANMABZyZXF1ZXN0ZWRFeGVjdXRpb25UaW1ldAAZTGphdmEvdGltZS9Mb2NhbERhdGVUaW1lO0wACnRhc2tBY3Rpb250ABJMamF2YS9sYW5nL1N0cmluZztMAAh0YXNrTmFtZXEAfgACeHBzcgANamF2YS50aW1lLlNlcpVdhLobIkiyDAAAeHB3DgUAAAfjCR4IDC0YfvNIeHQACmVjaG8gaGVsbG90AAhzYXlIZWxsbw";

/// A plain string object instead of a task.
pub(crate) const STRING_TOKEN: &str = "rO0ABXQAVklmIHlvdSBkZXNlcmlhbGl6ZSBtZSBkb3duLCBJIHNoYWxsIGJlY29tZSBtb3JlIHBvd2VyZnVsIHRoYW4geW91IGNhbiBwb3NzaWJseSBpbWFnaW5l";

pub(crate) const GADGET_CLASS: &str = "org.apache.commons.collections.functors.InvokerTransformer";

pub(crate) fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, n: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_nano_opt(h, mi, s, n)
        .unwrap()
}

pub(crate) fn bytes_of(token: &str) -> Vec<u8> {
    TokenCodec::decode_text(token).unwrap()
}

pub(crate) fn token_of(bytes: &[u8]) -> String {
    TokenCodec::encode_bytes(bytes)
}

/// An unrelated class with arbitrary fields.
pub(crate) fn gadget_stream() -> Vec<u8> {
    const FIELDS: &[FieldSpec] = &[FieldSpec::text("iMethodName"), FieldSpec::text("command")];
    let mut w = StreamWriter::new();
    w.write_object(
        &ClassSpec::new(GADGET_CLASS, -8_653_385_846_894_047_688, FIELDS),
        &[
            FieldValue::Text("exec".into()),
            FieldValue::Text("rm -rf /".into()),
        ],
    );
    w.finish()
}

/// Replaces the first occurrence of `from` with `to` (same length).
pub(crate) fn patch(bytes: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    assert_eq!(from.len(), to.len());
    let idx = bytes
        .windows(from.len())
        .position(|w| w == from)
        .expect("pattern present");
    let mut out = bytes.to_vec();
    out[idx..idx + to.len()].copy_from_slice(to);
    out
}

/// Replaces the trailing `tail` with `replacement` (any length).
pub(crate) fn replace_tail(bytes: &[u8], tail: &[u8], replacement: &[u8]) -> Vec<u8> {
    assert!(bytes.ends_with(tail));
    let mut out = bytes[..bytes.len() - tail.len()].to_vec();
    out.extend_from_slice(replacement);
    out
}

/// Runs `f` under a plain-text subscriber and returns what it logged.
pub(crate) fn captured_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buf);
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || LogSink(Arc::clone(&sink)))
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
    (out, logs)
}

struct LogSink(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogSink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

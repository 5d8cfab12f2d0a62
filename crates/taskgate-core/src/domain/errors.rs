//! Errors - デコード失敗の分類
//!
//! `DecodeError` はストリーム読み取り・型ゲート・型確認の失敗を表します。
//! 各 variant は `reason()` で `ReasonCode` に対応付けられ、
//! 最終的に `PolicyVerdict` に変換されます。

use thiserror::Error;

use super::verdict::{PolicyVerdict, ReasonCode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    // ── malformed-token ────────────────────────────────────────────────────
    #[error("token is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("token of {length} bytes exceeds limit {limit}")]
    TokenTooLarge { length: usize, limit: usize },

    #[error("unexpected end of stream at offset {offset}")]
    Truncated { offset: usize },

    #[error("bad stream magic {found:#06x}")]
    BadMagic { found: u16 },

    #[error("unsupported stream version {found}")]
    BadStreamVersion { found: u16 },

    #[error("unexpected tag {tag:#04x} at offset {offset}")]
    UnexpectedTag { tag: u8, offset: usize },

    #[error("invalid field type code {code:#04x} at offset {offset}")]
    InvalidFieldType { code: u8, offset: usize },

    #[error("invalid back-reference handle {handle:#x}")]
    InvalidHandle { handle: u32 },

    #[error("handle table exceeds {limit} entries")]
    TooManyHandles { limit: usize },

    #[error("string of {length} bytes exceeds limit {limit}")]
    StringTooLong { length: u64, limit: usize },

    #[error("invalid modified UTF-8 at offset {offset}")]
    InvalidUtf { offset: usize },

    #[error("class annotations are not accepted")]
    ClassAnnotation,

    #[error("invalid date-time: {0}")]
    InvalidDateTime(String),

    #[error("{count} trailing bytes after top-level object")]
    TrailingBytes { count: usize },

    // ── unauthorized-type ──────────────────────────────────────────────────
    #[error("type `{class_name}` is not allowlisted")]
    UnauthorizedType { class_name: String },

    #[error("materialized value is not a `{expected}`")]
    TypeConfirmation { expected: &'static str },

    // ── version-mismatch ───────────────────────────────────────────────────
    #[error("`{class_name}` version {found} is not supported (expected {expected})")]
    VersionMismatch {
        class_name: String,
        expected: i64,
        found: i64,
    },

    // ── wrong-payload-shape ────────────────────────────────────────────────
    #[error("top-level value is {found}, not an object")]
    ScalarPayload { found: &'static str },

    #[error("`{class_name}` does not match its schema: {detail}")]
    SchemaMismatch { class_name: String, detail: String },

    #[error("field `{field}` is null")]
    NullField { field: &'static str },
}

impl DecodeError {
    pub fn reason(&self) -> ReasonCode {
        match self {
            DecodeError::UnauthorizedType { .. } | DecodeError::TypeConfirmation { .. } => {
                ReasonCode::UnauthorizedType
            }
            DecodeError::VersionMismatch { .. } => ReasonCode::VersionMismatch,
            DecodeError::ScalarPayload { .. }
            | DecodeError::SchemaMismatch { .. }
            | DecodeError::NullField { .. } => ReasonCode::WrongPayloadShape,
            _ => ReasonCode::MalformedToken,
        }
    }

    /// Offending class name, for security logging.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            DecodeError::UnauthorizedType { class_name }
            | DecodeError::VersionMismatch { class_name, .. }
            | DecodeError::SchemaMismatch { class_name, .. } => Some(class_name.as_str()),
            DecodeError::TypeConfirmation { expected } => Some(*expected),
            _ => None,
        }
    }
}

impl From<DecodeError> for PolicyVerdict {
    fn from(err: DecodeError) -> Self {
        PolicyVerdict::rejected(err.reason(), err.to_string())
    }
}

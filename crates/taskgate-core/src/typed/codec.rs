//! TokenCodec - トークン文字列とバイト列の相互変換
//!
//! # デコードフロー
//! 1. 前後の ASCII 空白を除去
//! 2. 標準アルファベットの base64 として復号（パディングは有無どちらも可）
//! 3. バイト列は信頼せず、そのまま GatedReader に渡す

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine as _, alphabet};

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("token is empty")]
    Empty,

    #[error("{0}")]
    Base64(#[from] base64::DecodeError),
}

pub struct TokenCodec;

impl TokenCodec {
    pub fn decode_text(token: &str) -> Result<Vec<u8>, CodecError> {
        let token = token.trim_ascii();
        if token.is_empty() {
            return Err(CodecError::Empty);
        }
        Ok(TOKEN_ENGINE.decode(token)?)
    }

    pub fn encode_bytes(bytes: &[u8]) -> String {
        TOKEN_ENGINE.encode(bytes)
    }
}

//! taskgate-core
//!
//! 信頼できないトークンを、許可された 1 つの型にだけデコードするゲート。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（DecodedTask, PolicyVerdict, DecodeError, 業務ルール）
//! - **ports**: 抽象化レイヤー（Clock）
//! - **typed**: 型付き API（StreamClass trait, DynMaterializer, TypeAllowlist, TokenCodec）
//! - **stream**: オブジェクトストリームの読み書き（GatedReader, StreamWriter）
//! - **decoder**: SafeDecoder（4 ステップのデコードフロー）
//! - **encoder**: TokenEncoder（トークン発行）
//! - **config**: DecoderConfig

pub mod config;
pub mod decoder;
pub mod domain;
pub mod encoder;
pub mod ports;
pub mod stream;
pub mod typed;

#[cfg(test)]
mod fixtures;

pub use config::{ConfigError, DecoderConfig};
pub use decoder::SafeDecoder;
pub use domain::{DecodedTask, PolicyVerdict, ReasonCode};
pub use encoder::TokenEncoder;

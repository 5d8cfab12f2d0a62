//! Typed - 許可型の API
//!
//! このモジュールはクラス名と Rust の型の対応を静的に宣言し、
//! ゲートが参照する許可リストを型から組み立てます。
//!
//! # 二層構造
//! - **表層（Typed）**: `StreamClass` trait - 型安全
//! - **内部（Dyn）**: `DynMaterializer` trait - object-safe, type erasure

pub mod codec;
pub mod materializer;
pub mod registry;
pub mod task;

// 主要な trait/型 を再エクスポート
pub use self::codec::{CodecError, TokenCodec};
pub use self::materializer::{DynMaterializer, TypedMaterializer};
pub use self::registry::{RegistryError, TypeAllowlist};
pub use self::task::{FieldKind, FieldSpec, FieldValue, FieldValues, StreamClass};

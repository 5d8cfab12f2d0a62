//! Materializer - スキーマ検証済みのフィールド値から型を組み立てる
//!
//! # 学習ポイント
//! - Object-safe trait (DynMaterializer)
//! - Type erasure パターン (TypedMaterializer<T> → DynMaterializer)
//! - `Box<dyn Any + Send>` と `downcast` による型の再確認

use std::any::Any;
use std::marker::PhantomData;

use super::task::{FieldSpec, FieldValues, StreamClass};
use crate::domain::errors::DecodeError;

/// DynMaterializer は object-safe な StreamClass の抽象化
///
/// TypedMaterializer<T> を DynMaterializer に変換することで、
/// HashMap<String, Arc<dyn DynMaterializer>> に格納可能にします。
pub trait DynMaterializer: Send + Sync {
    fn class_name(&self) -> &'static str;

    /// このエントリが受け付けるスキーマバージョン
    fn serial_version(&self) -> i64;

    fn fields(&self) -> &'static [FieldSpec];

    fn materialize_dyn(&self, fields: FieldValues) -> Result<Box<dyn Any + Send>, DecodeError>;
}

pub struct TypedMaterializer<T: StreamClass> {
    serial_version: i64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: StreamClass> TypedMaterializer<T> {
    pub fn new(serial_version: i64) -> Self {
        Self {
            serial_version,
            _marker: PhantomData,
        }
    }
}

impl<T: StreamClass> DynMaterializer for TypedMaterializer<T> {
    fn class_name(&self) -> &'static str {
        T::CLASS_NAME
    }

    fn serial_version(&self) -> i64 {
        self.serial_version
    }

    fn fields(&self) -> &'static [FieldSpec] {
        T::FIELDS
    }

    fn materialize_dyn(&self, fields: FieldValues) -> Result<Box<dyn Any + Send>, DecodeError> {
        let value = T::materialize(fields)?;
        Ok(Box::new(value))
    }
}

//! TypeAllowlist - 実体化を許可する型の登録と管理
//!
//! # 学習ポイント
//! - HashMap での型消去された trait object の管理
//! - Generic methods での登録と型安全性
//! - Arc による共有所有権
//!
//! ゲートはストリーム上のクラス名でこの表を引きます。
//! 見つからなければ、そのクラスのフィールドは 1 バイトも読みません。

use std::collections::HashMap;
use std::sync::Arc;

use super::materializer::{DynMaterializer, TypedMaterializer};
use super::task::StreamClass;
use crate::domain::task_type::{TaskType, TaskTypeError};

/// TypeAllowlist は許可型の Materializer を管理
///
/// # 使用例
/// ```ignore
/// let mut allowlist = TypeAllowlist::new();
/// allowlist.register::<DecodedTask>()?;
///
/// // クラス名で DynMaterializer を取得
/// let entry = allowlist.get("org.dummy.insecure.framework.VulnerableTaskHolder");
/// ```
#[derive(Default, Clone)]
pub struct TypeAllowlist {
    entries: HashMap<String, Arc<dyn DynMaterializer>>,
}

/// RegistryError は TypeAllowlist の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("type '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error(transparent)]
    InvalidTypeName(#[from] TaskTypeError),
}

impl TypeAllowlist {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// `T` だけを許可する表
    pub fn only<T: StreamClass>(serial_version: i64) -> Result<Self, RegistryError> {
        let mut allowlist = Self::new();
        allowlist.register_with_version::<T>(serial_version)?;
        Ok(allowlist)
    }

    pub fn register<T: StreamClass>(&mut self) -> Result<(), RegistryError> {
        self.register_with_version::<T>(T::SERIAL_VERSION)
    }

    pub fn register_with_version<T: StreamClass>(
        &mut self,
        serial_version: i64,
    ) -> Result<(), RegistryError> {
        let task_type = TaskType::parse(T::CLASS_NAME)?;
        let key = task_type.as_str().to_string();
        if self.entries.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered(key));
        }
        self.entries
            .insert(key, Arc::new(TypedMaterializer::<T>::new(serial_version)));
        Ok(())
    }

    /// 完全一致のみ。大文字小文字や空白の違いも別の型として扱う
    pub fn get(&self, class_name: &str) -> Option<Arc<dyn DynMaterializer>> {
        self.entries.get(class_name).cloned()
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.entries.contains_key(class_name)
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for TypeAllowlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeAllowlist")
            .field("types", &self.registered_types())
            .finish()
    }
}

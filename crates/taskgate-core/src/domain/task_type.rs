//! TaskType - ストリーム上のクラス名（完全修飾名）
//!
//! # 命名規約
//! - `{package}.{SimpleName}` 形式のドット区切り
//! - 各セグメントは英字 / `_` / `$` で始まり、英数字 / `_` / `$` が続く
//! - 例: `org.dummy.insecure.framework.VulnerableTaskHolder`
//!
//! 許可リストへの登録時にこの規約で検証します。
//! ゲートでの照合は生の文字列の完全一致で行い、正規化はしません。

use std::fmt;

/// TaskTypeError は命名規約違反
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskTypeError {
    #[error("type name is empty")]
    Empty,

    #[error("invalid segment '{segment}' in type name '{value}'")]
    InvalidSegment { segment: String, value: String },
}

/// TaskType は検証済みの完全修飾クラス名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskType {
    value: String,
}

impl TaskType {
    pub fn parse(value: &str) -> Result<Self, TaskTypeError> {
        if value.is_empty() {
            return Err(TaskTypeError::Empty);
        }
        for segment in value.split('.') {
            if !is_valid_segment(segment) {
                return Err(TaskTypeError::InvalidSegment {
                    segment: segment.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(Self {
            value: value.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// 最後のドットより前（デフォルトパッケージなら空文字）
    pub fn package(&self) -> &str {
        self.value.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }

    pub fn simple_name(&self) -> &str {
        self.value
            .rsplit_once('.')
            .map(|(_, name)| name)
            .unwrap_or(&self.value)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

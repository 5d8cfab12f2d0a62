//! StreamClass trait - 許可リストに載せられる型の定義
//!
//! # 学習ポイント
//! - Associated Constants (`CLASS_NAME`, `SERIAL_VERSION`, `FIELDS`)
//! - スキーマを定数で宣言し、リーダーは宣言と一致するものだけを受け付ける
//! - フィールドの値は組み込みの値エンコーディング（文字列・日時）でしか作られない

use std::any::Any;

use chrono::NaiveDateTime;

use crate::domain::errors::DecodeError;

/// StreamClass はストリーム上のクラス名と Rust の型を対応付ける
///
/// # 使用例
/// ```ignore
/// struct Reminder { text: String }
///
/// impl StreamClass for Reminder {
///     const CLASS_NAME: &'static str = "com.example.Reminder";
///     const SERIAL_VERSION: i64 = 1;
///     const FIELDS: &'static [FieldSpec] = &[FieldSpec::text("text")];
///
///     fn materialize(mut fields: FieldValues) -> Result<Self, DecodeError> {
///         Ok(Self { text: fields.take_text("text")? })
///     }
///
///     fn field_values(&self) -> Vec<FieldValue> {
///         vec![FieldValue::Text(self.text.clone())]
///     }
/// }
/// ```
///
/// # Trait Bounds
/// - `Any`: 型消去後に `downcast` で型を再確認するため
/// - `Send + Sync + 'static`: Arc に格納し、複数スレッドから使うため
pub trait StreamClass: Any + Send + Sync + Sized + 'static {
    /// 完全修飾クラス名。ゲートはこの文字列との完全一致のみを許可する
    const CLASS_NAME: &'static str;

    /// 既定のスキーマバージョン（serialVersionUID）
    const SERIAL_VERSION: i64;

    /// ストリーム上のフィールド順（名前順）
    const FIELDS: &'static [FieldSpec];

    fn materialize(fields: FieldValues) -> Result<Self, DecodeError>;

    /// `FIELDS` と同じ順序の値
    fn field_values(&self) -> Vec<FieldValue>;
}

/// Built-in value encodings a schema field can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LocalDateTime,
}

impl FieldKind {
    /// Field type signature as it appears in a class descriptor.
    pub fn signature(&self) -> &'static str {
        match self {
            FieldKind::Text => "Ljava/lang/String;",
            FieldKind::LocalDateTime => "Ljava/time/LocalDateTime;",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn local_date_time(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::LocalDateTime,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    LocalDateTime(NaiveDateTime),
}

/// Field values read from a stream, keyed by schema field name.
#[derive(Debug, Default)]
pub struct FieldValues {
    entries: Vec<(&'static str, FieldValue)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, value: FieldValue) {
        self.entries.push((name, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take(&mut self, name: &'static str) -> FieldValue {
        match self.entries.iter().position(|(n, _)| *n == name) {
            Some(idx) => self.entries.swap_remove(idx).1,
            None => FieldValue::Null,
        }
    }

    pub fn take_text(&mut self, name: &'static str) -> Result<String, DecodeError> {
        match self.take(name) {
            FieldValue::Text(s) => Ok(s),
            _ => Err(DecodeError::NullField { field: name }),
        }
    }

    pub fn take_local_date_time(
        &mut self,
        name: &'static str,
    ) -> Result<NaiveDateTime, DecodeError> {
        match self.take(name) {
            FieldValue::LocalDateTime(t) => Ok(t),
            _ => Err(DecodeError::NullField { field: name }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn take_returns_values_by_name() {
        let when = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let mut fields = FieldValues::new();
        fields.push("at", FieldValue::LocalDateTime(when));
        fields.push("name", FieldValue::Text("n".into()));

        assert_eq!(fields.take_text("name").unwrap(), "n");
        assert_eq!(fields.take_local_date_time("at").unwrap(), when);
        assert!(fields.is_empty());
    }

    #[test]
    fn null_or_missing_field_is_rejected() {
        let mut fields = FieldValues::new();
        fields.push("name", FieldValue::Null);

        assert_eq!(
            fields.take_text("name"),
            Err(DecodeError::NullField { field: "name" })
        );
        assert_eq!(
            fields.take_text("other"),
            Err(DecodeError::NullField { field: "other" })
        );
    }

    #[test]
    fn signatures_match_descriptor_format() {
        assert_eq!(FieldKind::Text.signature(), "Ljava/lang/String;");
        assert_eq!(FieldKind::LocalDateTime.signature(), "Ljava/time/LocalDateTime;");
    }
}

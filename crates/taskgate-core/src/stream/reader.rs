//! GatedReader - 型ゲート付きのオブジェクトストリーム読み取り
//!
//! 汎用のデシリアライザではありません。受け付ける文法は
//! 「許可型のオブジェクト 1 個（フィールドは文字列か日時）」だけです。
//!
//! # ゲートの順序
//! 1. クラス記述子の名前を読む
//! 2. 許可リストと完全一致で照合（不一致なら即中断、それ以降は読まない）
//! 3. serialVersionUID を照合
//! 4. フラグとフィールド一覧をスキーマと照合
//! 5. スキーマが宣言した値エンコーディングでフィールド値を読む
//!
//! 日時の値を運ぶ `java.time.Ser` は、スキーマが日時を宣言した位置でのみ
//! 組み込みデコーダで読みます。許可リストは引きません。

use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::trace;

use super::constants::*;
use super::datetime::{self, CARRIER_CLASS, CARRIER_VERSION};
use super::mutf8;
use crate::domain::errors::DecodeError;
use crate::typed::materializer::DynMaterializer;
use crate::typed::registry::TypeAllowlist;
use crate::typed::task::{FieldKind, FieldSpec, FieldValue, FieldValues};

/// Per-call resource bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimits {
    pub max_string_bytes: usize,
    pub max_handles: usize,
}

impl Default for StreamLimits {
    fn default() -> Self {
        Self {
            max_string_bytes: 64 * 1024,
            max_handles: 64,
        }
    }
}

#[derive(Clone)]
enum DescKind {
    Allowlisted(Arc<dyn DynMaterializer>),
    DateTimeCarrier,
}

struct ClassDesc {
    name: String,
    kind: DescKind,
}

#[derive(Clone)]
enum Handle {
    /// Assigned but not yet complete (descriptor or object being read).
    Reserved,
    ClassDesc(Rc<ClassDesc>),
    Text(String),
    Object,
    DateTime(NaiveDateTime),
}

pub struct GatedReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    allowlist: &'a TypeAllowlist,
    limits: StreamLimits,
    handles: Vec<Handle>,
}

impl<'a> GatedReader<'a> {
    pub fn new(bytes: &'a [u8], allowlist: &'a TypeAllowlist, limits: StreamLimits) -> Self {
        Self {
            bytes,
            pos: 0,
            allowlist,
            limits,
            handles: Vec::new(),
        }
    }

    /// Reads exactly one top-level allowlisted object and nothing after it.
    pub fn read_top_level(mut self) -> Result<Box<dyn Any + Send>, DecodeError> {
        self.read_header()?;

        let offset = self.pos;
        let tag = self.u8()?;
        let value = match tag {
            TC_OBJECT => self.read_allowlisted_object()?,
            TC_STRING | TC_LONGSTRING => {
                return Err(DecodeError::ScalarPayload { found: "a string" });
            }
            TC_NULL => return Err(DecodeError::ScalarPayload { found: "null" }),
            TC_BLOCKDATA | TC_BLOCKDATALONG => {
                return Err(DecodeError::ScalarPayload {
                    found: "primitive block data",
                });
            }
            TC_REFERENCE => {
                // nothing has been assigned yet, so this cannot resolve
                self.resolve()?;
                return Err(DecodeError::UnexpectedTag { tag, offset });
            }
            other => return Err(self.reject_tag(other, offset)),
        };

        let rest = self.bytes.len() - self.pos;
        if rest != 0 {
            return Err(DecodeError::TrailingBytes { count: rest });
        }
        Ok(value)
    }

    fn read_header(&mut self) -> Result<(), DecodeError> {
        let magic = self.u16()?;
        if magic != STREAM_MAGIC {
            return Err(DecodeError::BadMagic { found: magic });
        }
        let version = self.u16()?;
        if version != STREAM_VERSION {
            return Err(DecodeError::BadStreamVersion { found: version });
        }
        Ok(())
    }

    // ── objects ─────────────────────────────────────────────────────────────

    fn read_allowlisted_object(&mut self) -> Result<Box<dyn Any + Send>, DecodeError> {
        let desc = self.read_class_desc(false)?;
        let entry = match &desc.kind {
            DescKind::Allowlisted(entry) => Arc::clone(entry),
            DescKind::DateTimeCarrier => {
                return Err(DecodeError::UnauthorizedType {
                    class_name: desc.name.clone(),
                });
            }
        };

        let handle = self.assign(Handle::Reserved)?;
        let mut fields = FieldValues::new();
        for spec in entry.fields() {
            let value = match spec.kind {
                FieldKind::Text => self.read_text_value(&desc.name)?,
                FieldKind::LocalDateTime => self.read_date_time_value(&desc.name)?,
            };
            fields.push(spec.name, value);
        }
        self.handles[handle] = Handle::Object;

        entry.materialize_dyn(fields)
    }

    fn read_text_value(&mut self, owner: &str) -> Result<FieldValue, DecodeError> {
        let offset = self.pos;
        let tag = self.u8()?;
        match tag {
            TC_NULL => Ok(FieldValue::Null),
            TC_STRING | TC_LONGSTRING => {
                let s = self.read_string_body(tag)?;
                self.assign(Handle::Text(s.clone()))?;
                Ok(FieldValue::Text(s))
            }
            TC_REFERENCE => match self.resolve()? {
                Handle::Text(s) => Ok(FieldValue::Text(s)),
                _ => Err(shape(owner, "text field refers to a non-text handle")),
            },
            TC_OBJECT => {
                let desc = self.read_class_desc(false)?;
                Err(shape(
                    owner,
                    format!("text field holds an object of `{}`", desc.name),
                ))
            }
            other => Err(self.reject_tag(other, offset)),
        }
    }

    fn read_date_time_value(&mut self, owner: &str) -> Result<FieldValue, DecodeError> {
        let offset = self.pos;
        let tag = self.u8()?;
        match tag {
            TC_NULL => Ok(FieldValue::Null),
            TC_REFERENCE => match self.resolve()? {
                Handle::DateTime(t) => Ok(FieldValue::LocalDateTime(t)),
                _ => Err(shape(owner, "date-time field refers to a non-date-time handle")),
            },
            TC_OBJECT => {
                self.read_class_desc(true)?;
                let handle = self.assign(Handle::Reserved)?;
                let block = self.read_block_data()?;
                let value = datetime::read_local_date_time(block)?;
                self.expect_tag(TC_ENDBLOCKDATA)?;
                self.handles[handle] = Handle::DateTime(value);
                Ok(FieldValue::LocalDateTime(value))
            }
            TC_STRING | TC_LONGSTRING => Err(shape(owner, "date-time field holds a string")),
            other => Err(self.reject_tag(other, offset)),
        }
    }

    fn read_block_data(&mut self) -> Result<&'a [u8], DecodeError> {
        let offset = self.pos;
        let len = match self.u8()? {
            TC_BLOCKDATA => usize::from(self.u8()?),
            TC_BLOCKDATALONG => {
                let len = self.i32()?;
                usize::try_from(len).map_err(|_| DecodeError::Truncated { offset })?
            }
            tag => return Err(DecodeError::UnexpectedTag { tag, offset }),
        };
        self.take(len)
    }

    // ── class descriptors ───────────────────────────────────────────────────

    /// Reads a class descriptor in object position.
    ///
    /// `carrier_position` is true where the schema declared a date-time.
    fn read_class_desc(&mut self, carrier_position: bool) -> Result<Rc<ClassDesc>, DecodeError> {
        let offset = self.pos;
        match self.u8()? {
            TC_CLASSDESC => self.read_new_class_desc(carrier_position),
            TC_REFERENCE => match self.resolve()? {
                Handle::ClassDesc(desc) => {
                    let is_carrier = matches!(desc.kind, DescKind::DateTimeCarrier);
                    if is_carrier != carrier_position {
                        return Err(self.misplaced(&desc.name, carrier_position));
                    }
                    Ok(desc)
                }
                _ => Err(DecodeError::InvalidHandle {
                    handle: self.last_handle(),
                }),
            },
            TC_PROXYCLASSDESC => Err(DecodeError::UnauthorizedType {
                class_name: "<dynamic proxy>".to_string(),
            }),
            tag => Err(DecodeError::UnexpectedTag { tag, offset }),
        }
    }

    fn read_new_class_desc(&mut self, carrier_position: bool) -> Result<Rc<ClassDesc>, DecodeError> {
        let handle = self.assign(Handle::Reserved)?;
        let name = self.read_utf()?;
        trace!(class_name = %name, "class descriptor");

        // the gate: nothing past the name is read for a type outside the allowlist
        let kind = self.gate(&name, carrier_position)?;

        let version = self.i64()?;
        let (expected_flags, fields): (u8, &'static [FieldSpec]) = match &kind {
            DescKind::Allowlisted(entry) => {
                if version != entry.serial_version() {
                    return Err(DecodeError::VersionMismatch {
                        class_name: name,
                        expected: entry.serial_version(),
                        found: version,
                    });
                }
                (SC_SERIALIZABLE, entry.fields())
            }
            DescKind::DateTimeCarrier => {
                if version != CARRIER_VERSION {
                    return Err(shape(&name, format!("unknown serialVersionUID {version:#x}")));
                }
                (SC_EXTERNALIZABLE | SC_BLOCK_DATA, &[])
            }
        };

        let flags = self.u8()?;
        if flags != expected_flags {
            return Err(shape(
                &name,
                format!("class flags {flags:#04x}, expected {expected_flags:#04x}"),
            ));
        }

        let count = self.u16()?;
        if usize::from(count) != fields.len() {
            return Err(shape(
                &name,
                format!("{count} fields declared, expected {}", fields.len()),
            ));
        }
        for spec in fields {
            self.read_field_desc(&name, spec)?;
        }

        if self.u8()? != TC_ENDBLOCKDATA {
            return Err(DecodeError::ClassAnnotation);
        }
        self.read_super_desc()?;

        let desc = Rc::new(ClassDesc { name, kind });
        self.handles[handle] = Handle::ClassDesc(Rc::clone(&desc));
        Ok(desc)
    }

    fn gate(&self, name: &str, carrier_position: bool) -> Result<DescKind, DecodeError> {
        if carrier_position {
            if name == CARRIER_CLASS {
                return Ok(DescKind::DateTimeCarrier);
            }
        } else if let Some(entry) = self.allowlist.get(name) {
            return Ok(DescKind::Allowlisted(entry));
        }
        Err(self.misplaced(name, carrier_position))
    }

    /// An allowlisted type in the wrong position is a shape problem;
    /// anything else is unauthorized.
    fn misplaced(&self, name: &str, carrier_position: bool) -> DecodeError {
        if carrier_position && self.allowlist.contains(name) {
            shape(name, "object where a date-time was declared")
        } else {
            DecodeError::UnauthorizedType {
                class_name: name.to_string(),
            }
        }
    }

    fn read_field_desc(&mut self, owner: &str, spec: &FieldSpec) -> Result<(), DecodeError> {
        let offset = self.pos;
        let code = self.u8()?;
        let has_signature = code == FIELD_OBJECT || code == FIELD_ARRAY;
        if !has_signature && !is_primitive_field_code(code) {
            return Err(DecodeError::InvalidFieldType { code, offset });
        }
        let name = self.read_utf()?;
        if name != spec.name {
            return Err(shape(
                owner,
                format!("field `{name}` found where `{}` was declared", spec.name),
            ));
        }
        if code != FIELD_OBJECT {
            return Err(shape(
                owner,
                format!("field `{name}` has type code `{}`", char::from(code)),
            ));
        }
        let signature = self.read_signature()?;
        if signature != spec.kind.signature() {
            return Err(shape(
                owner,
                format!("field `{name}` has type {signature}"),
            ));
        }
        Ok(())
    }

    /// Field signatures are string objects, usually shared by back-reference.
    fn read_signature(&mut self) -> Result<String, DecodeError> {
        let offset = self.pos;
        match self.u8()? {
            tag @ (TC_STRING | TC_LONGSTRING) => {
                let s = self.read_string_body(tag)?;
                self.assign(Handle::Text(s.clone()))?;
                Ok(s)
            }
            TC_REFERENCE => match self.resolve()? {
                Handle::Text(s) => Ok(s),
                _ => Err(DecodeError::InvalidHandle {
                    handle: self.last_handle(),
                }),
            },
            tag => Err(DecodeError::UnexpectedTag { tag, offset }),
        }
    }

    /// Allowlisted types have no serializable superclass, so any superclass
    /// descriptor names a type outside the allowlist.
    fn read_super_desc(&mut self) -> Result<(), DecodeError> {
        let offset = self.pos;
        match self.u8()? {
            TC_NULL => Ok(()),
            TC_CLASSDESC => Err(DecodeError::UnauthorizedType {
                class_name: self.read_utf()?,
            }),
            TC_REFERENCE => match self.resolve()? {
                Handle::ClassDesc(desc) => Err(DecodeError::UnauthorizedType {
                    class_name: desc.name.clone(),
                }),
                _ => Err(DecodeError::InvalidHandle {
                    handle: self.last_handle(),
                }),
            },
            TC_PROXYCLASSDESC => Err(DecodeError::UnauthorizedType {
                class_name: "<dynamic proxy>".to_string(),
            }),
            tag => Err(DecodeError::UnexpectedTag { tag, offset }),
        }
    }

    /// Rejects a tag that cannot appear where it was found. Tags that
    /// introduce a type are unauthorized; the declared name is reported
    /// when it can be read without reading anything else.
    fn reject_tag(&mut self, tag: u8, offset: usize) -> DecodeError {
        let what = match tag {
            TC_OBJECT => "object",
            TC_ARRAY => "array",
            TC_CLASS => "class literal",
            TC_ENUM => "enum constant",
            TC_CLASSDESC => "class descriptor",
            TC_PROXYCLASSDESC => "<dynamic proxy>",
            _ => return DecodeError::UnexpectedTag { tag, offset },
        };
        let declared = match tag {
            TC_CLASSDESC => self.read_utf().ok(),
            TC_PROXYCLASSDESC => None,
            _ => self.declared_name(),
        };
        DecodeError::UnauthorizedType {
            class_name: declared.unwrap_or_else(|| what.to_string()),
        }
    }

    fn declared_name(&mut self) -> Option<String> {
        match self.u8().ok()? {
            TC_CLASSDESC => self.read_utf().ok(),
            TC_REFERENCE => match self.resolve().ok()? {
                Handle::ClassDesc(desc) => Some(desc.name.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    // ── handles ─────────────────────────────────────────────────────────────

    fn assign(&mut self, handle: Handle) -> Result<usize, DecodeError> {
        if self.handles.len() >= self.limits.max_handles {
            return Err(DecodeError::TooManyHandles {
                limit: self.limits.max_handles,
            });
        }
        self.handles.push(handle);
        Ok(self.handles.len() - 1)
    }

    fn resolve(&mut self) -> Result<Handle, DecodeError> {
        let handle = self.u32()?;
        let found = handle
            .checked_sub(BASE_WIRE_HANDLE)
            .and_then(|idx| self.handles.get(idx as usize));
        match found {
            Some(Handle::Reserved) | None => Err(DecodeError::InvalidHandle { handle }),
            Some(h) => Ok(h.clone()),
        }
    }

    /// The handle value just read by `resolve`, for error reporting.
    fn last_handle(&self) -> u32 {
        self.bytes
            .get(self.pos.saturating_sub(4)..self.pos)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .unwrap_or(0)
    }

    // ── primitives ──────────────────────────────────────────────────────────

    fn read_string_body(&mut self, tag: u8) -> Result<String, DecodeError> {
        let len = if tag == TC_LONGSTRING {
            self.i64()? as u64
        } else {
            u64::from(self.u16()?)
        };
        self.read_mutf8(len)
    }

    fn read_utf(&mut self) -> Result<String, DecodeError> {
        let len = self.u16()?;
        self.read_mutf8(u64::from(len))
    }

    fn read_mutf8(&mut self, len: u64) -> Result<String, DecodeError> {
        if len > self.limits.max_string_bytes as u64 {
            return Err(DecodeError::StringTooLong {
                length: len,
                limit: self.limits.max_string_bytes,
            });
        }
        let start = self.pos;
        let bytes = self.take(len as usize)?;
        mutf8::decode(bytes).map_err(|at| DecodeError::InvalidUtf { offset: start + at })
    }

    fn expect_tag(&mut self, expected: u8) -> Result<(), DecodeError> {
        let offset = self.pos;
        let tag = self.u8()?;
        if tag != expected {
            return Err(DecodeError::UnexpectedTag { tag, offset });
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let bytes: &'a [u8] = self.bytes;
        let slice = self
            .pos
            .checked_add(n)
            .and_then(|end| bytes.get(self.pos..end))
            .ok_or(DecodeError::Truncated {
                offset: self.bytes.len(),
            })?;
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.take(N)?);
        Ok(arr)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.array()?))
    }
}

fn shape(class_name: &str, detail: impl Into<String>) -> DecodeError {
    DecodeError::SchemaMismatch {
        class_name: class_name.to_string(),
        detail: detail.into(),
    }
}

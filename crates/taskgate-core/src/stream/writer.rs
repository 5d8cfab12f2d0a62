//! StreamWriter - オブジェクトストリームの書き出し
//!
//! トークン発行（TokenEncoder）とテストで使います。書けるのは
//! 「文字列・日時フィールドだけを持つオブジェクト」と「文字列」だけです。
//! フィールドの型シグネチャは同じ文字列を後方参照で共有します。

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::constants::*;
use super::datetime::{self, CARRIER_CLASS, CARRIER_VERSION};
use super::mutf8;
use crate::typed::task::{FieldSpec, FieldValue};

/// A class to write: name, version tag and field layout.
#[derive(Debug, Clone, Copy)]
pub struct ClassSpec<'a> {
    pub name: &'a str,
    pub version: i64,
    pub fields: &'a [FieldSpec],
    /// Optional field-less serializable superclass.
    pub super_class: Option<&'a str>,
}

impl<'a> ClassSpec<'a> {
    pub fn new(name: &'a str, version: i64, fields: &'a [FieldSpec]) -> Self {
        Self {
            name,
            version,
            fields,
            super_class: None,
        }
    }

    pub fn with_super_class(mut self, name: &'a str) -> Self {
        self.super_class = Some(name);
        self
    }
}

pub struct StreamWriter {
    buf: Vec<u8>,
    next_handle: u32,
    shared: HashMap<String, u32>,
}

impl Default for StreamWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamWriter {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(&STREAM_MAGIC.to_be_bytes());
        buf.extend_from_slice(&STREAM_VERSION.to_be_bytes());
        Self {
            buf,
            next_handle: BASE_WIRE_HANDLE,
            shared: HashMap::new(),
        }
    }

    /// Writes an object. `values` must follow `class.fields` in order.
    pub fn write_object(&mut self, class: &ClassSpec<'_>, values: &[FieldValue]) {
        self.buf.push(TC_OBJECT);
        self.write_class_desc(class);
        self.assign();
        for value in values {
            self.write_value(value);
        }
    }

    /// Writes a top-level string object.
    pub fn write_string(&mut self, s: &str) {
        let bytes = mutf8::encode(s);
        if bytes.len() <= usize::from(u16::MAX) {
            self.buf.push(TC_STRING);
            self.buf.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        } else {
            self.buf.push(TC_LONGSTRING);
            self.buf.extend_from_slice(&(bytes.len() as i64).to_be_bytes());
        }
        self.buf.extend_from_slice(&bytes);
        self.assign();
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn write_class_desc(&mut self, class: &ClassSpec<'_>) {
        let key = format!("desc:{}", class.name);
        if let Some(handle) = self.shared.get(&key).copied() {
            self.write_reference(handle);
            return;
        }

        self.buf.push(TC_CLASSDESC);
        let handle = self.assign();
        self.shared.insert(key, handle);
        self.write_utf(class.name);
        self.buf.extend_from_slice(&class.version.to_be_bytes());
        self.buf.push(SC_SERIALIZABLE);
        self.buf
            .extend_from_slice(&(class.fields.len() as u16).to_be_bytes());
        for field in class.fields {
            self.buf.push(FIELD_OBJECT);
            self.write_utf(field.name);
            self.write_shared_string(field.kind.signature());
        }
        self.buf.push(TC_ENDBLOCKDATA);

        match class.super_class {
            Some(name) => {
                let super_spec = ClassSpec::new(name, 1, &[]);
                self.write_class_desc(&super_spec);
            }
            None => self.buf.push(TC_NULL),
        }
    }

    fn write_value(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Null => self.buf.push(TC_NULL),
            FieldValue::Text(s) => self.write_string(s),
            FieldValue::LocalDateTime(t) => self.write_local_date_time(t),
        }
    }

    fn write_local_date_time(&mut self, value: &NaiveDateTime) {
        self.buf.push(TC_OBJECT);
        let key = format!("desc:{CARRIER_CLASS}");
        match self.shared.get(&key).copied() {
            Some(handle) => self.write_reference(handle),
            None => {
                self.buf.push(TC_CLASSDESC);
                let handle = self.assign();
                self.shared.insert(key, handle);
                self.write_utf(CARRIER_CLASS);
                self.buf.extend_from_slice(&CARRIER_VERSION.to_be_bytes());
                self.buf.push(SC_EXTERNALIZABLE | SC_BLOCK_DATA);
                self.buf.extend_from_slice(&0u16.to_be_bytes());
                self.buf.push(TC_ENDBLOCKDATA);
                self.buf.push(TC_NULL);
            }
        }
        self.assign();

        let mut block = Vec::with_capacity(14);
        datetime::write_local_date_time(&mut block, value);
        self.buf.push(TC_BLOCKDATA);
        self.buf.push(block.len() as u8);
        self.buf.extend_from_slice(&block);
        self.buf.push(TC_ENDBLOCKDATA);
    }

    fn write_shared_string(&mut self, s: &str) {
        if let Some(handle) = self.shared.get(s).copied() {
            self.write_reference(handle);
            return;
        }
        self.buf.push(TC_STRING);
        self.write_utf(s);
        let handle = self.assign();
        self.shared.insert(s.to_string(), handle);
    }

    fn write_reference(&mut self, handle: u32) {
        self.buf.push(TC_REFERENCE);
        self.buf.extend_from_slice(&handle.to_be_bytes());
    }

    fn write_utf(&mut self, s: &str) {
        let bytes = mutf8::encode(s);
        self.buf.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(&bytes);
    }

    fn assign(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

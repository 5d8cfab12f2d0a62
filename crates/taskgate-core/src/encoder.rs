//! Token minting: the inverse of [`crate::SafeDecoder`].

use crate::stream::writer::{ClassSpec, StreamWriter};
use crate::typed::StreamClass;
use crate::typed::codec::TokenCodec;

/// Mints tokens. Date-time fields are written without leap seconds; see
/// [`crate::stream::datetime::without_leap_second`].
pub struct TokenEncoder;

impl TokenEncoder {
    /// Encodes `value` under its current schema version.
    pub fn encode<T: StreamClass>(value: &T) -> String {
        Self::encode_with_version(value, T::SERIAL_VERSION)
    }

    /// Encodes `value` tagged with an arbitrary schema version.
    pub fn encode_with_version<T: StreamClass>(value: &T, version: i64) -> String {
        TokenCodec::encode_bytes(&Self::to_stream(value, version))
    }

    pub fn to_stream<T: StreamClass>(value: &T, version: i64) -> Vec<u8> {
        let mut writer = StreamWriter::new();
        let class = ClassSpec::new(T::CLASS_NAME, version, T::FIELDS);
        writer.write_object(&class, &value.field_values());
        writer.finish()
    }
}

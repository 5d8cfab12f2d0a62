//! Modified UTF-8, the string encoding of object streams.
//!
//! Differs from UTF-8 in two ways: U+0000 is written as `C0 80`, and
//! characters outside the BMP are written as two 3-byte surrogates.

/// Decodes modified UTF-8. Returns the byte offset of the first invalid
/// sequence on failure.
pub fn decode(bytes: &[u8]) -> Result<String, usize> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 >> 4 {
            0x0..=0x7 => {
                units.push(u16::from(b0));
                i += 1;
            }
            0xC | 0xD => {
                let b1 = continuation(bytes, i + 1).ok_or(i)?;
                units.push((u16::from(b0 & 0x1F) << 6) | u16::from(b1 & 0x3F));
                i += 2;
            }
            0xE => {
                let b1 = continuation(bytes, i + 1).ok_or(i)?;
                let b2 = continuation(bytes, i + 2).ok_or(i)?;
                units.push(
                    (u16::from(b0 & 0x0F) << 12)
                        | (u16::from(b1 & 0x3F) << 6)
                        | u16::from(b2 & 0x3F),
                );
                i += 3;
            }
            _ => return Err(i),
        }
    }
    // lone surrogates
    String::from_utf16(&units).map_err(|_| bytes.len())
}

fn continuation(bytes: &[u8], idx: usize) -> Option<u8> {
    bytes.get(idx).copied().filter(|b| b & 0xC0 == 0x80)
}

pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

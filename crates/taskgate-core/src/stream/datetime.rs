//! Local date-time value encoding.
//!
//! A `LocalDateTime` field is written as an externalizable `java.time.Ser`
//! object whose block data is a type byte followed by the date and a
//! variable-length time: trailing zero components are dropped and the last
//! written component is stored bit-inverted.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::domain::errors::DecodeError;

pub const CARRIER_CLASS: &str = "java.time.Ser";
pub const CARRIER_VERSION: i64 = 0x955D_84BA_1B22_48B2_u64 as i64;

const LOCAL_DATE_TIME_TYPE: u8 = 5;

/// Decodes one block-data payload. The whole block must be consumed.
pub fn read_local_date_time(block: &[u8]) -> Result<NaiveDateTime, DecodeError> {
    let mut cur = Cursor { block, pos: 0 };

    let kind = cur.u8()?;
    if kind != LOCAL_DATE_TIME_TYPE {
        return Err(DecodeError::InvalidDateTime(format!(
            "unsupported value type {kind}"
        )));
    }

    let year = cur.i32()?;
    let month = cur.u8()?;
    let day = cur.u8()?;
    let date = NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day)).ok_or_else(|| {
        DecodeError::InvalidDateTime(format!("{year}-{month}-{day} is not a date"))
    })?;

    let (mut hour, mut minute, mut second, mut nano) = (cur.i8()?, 0i8, 0i8, 0i32);
    if hour < 0 {
        hour = !hour;
    } else {
        minute = cur.i8()?;
        if minute < 0 {
            minute = !minute;
        } else {
            second = cur.i8()?;
            if second < 0 {
                second = !second;
            } else {
                nano = cur.i32()?;
            }
        }
    }

    if cur.pos != block.len() {
        return Err(DecodeError::InvalidDateTime(format!(
            "{} unread bytes in date-time block",
            block.len() - cur.pos
        )));
    }
    if !(0..1_000_000_000).contains(&nano) {
        return Err(DecodeError::InvalidDateTime(format!("nanosecond {nano} out of range")));
    }
    let time = NaiveTime::from_hms_nano_opt(hour as u32, minute as u32, second as u32, nano as u32)
        .ok_or_else(|| {
            DecodeError::InvalidDateTime(format!("{hour}:{minute}:{second} is not a time"))
        })?;

    Ok(NaiveDateTime::new(date, time))
}

/// The block format has no leap second. chrono keeps one as a nanosecond
/// value of at least one second; it is folded into the second before it.
pub fn without_leap_second(value: NaiveDateTime) -> NaiveDateTime {
    let nano = value.nanosecond();
    if nano < 1_000_000_000 {
        return value;
    }
    value.with_nanosecond(nano - 1_000_000_000).unwrap_or(value)
}

pub fn write_local_date_time(out: &mut Vec<u8>, value: &NaiveDateTime) {
    let value = without_leap_second(*value);
    out.push(LOCAL_DATE_TIME_TYPE);
    out.extend_from_slice(&value.year().to_be_bytes());
    out.push(value.month() as u8);
    out.push(value.day() as u8);

    let hour = value.hour() as u8;
    let minute = value.minute() as u8;
    let second = value.second() as u8;
    let nano = value.nanosecond();
    if nano == 0 {
        if second == 0 {
            if minute == 0 {
                out.push(!hour);
            } else {
                out.push(hour);
                out.push(!minute);
            }
        } else {
            out.push(hour);
            out.push(minute);
            out.push(!second);
        }
    } else {
        out.push(hour);
        out.push(minute);
        out.push(second);
        out.extend_from_slice(&(nano as i32).to_be_bytes());
    }
}

struct Cursor<'a> {
    block: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos + N;
        let bytes = self
            .block
            .get(self.pos..end)
            .ok_or_else(|| DecodeError::InvalidDateTime("date-time block is truncated".into()))?;
        self.pos = end;
        let mut arr = [0u8; N];
        arr.copy_from_slice(bytes);
        Ok(arr)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    fn i8(&mut self) -> Result<i8, DecodeError> {
        Ok(i8::from_be_bytes(self.take::<1>()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.take::<4>()?))
    }
}

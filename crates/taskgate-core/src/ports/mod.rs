//! Ports - 抽象化レイヤー
//!
//! デコーダが外部から受け取るものは「現在時刻」だけです。

pub mod clock;

pub use self::clock::{Clock, FixedClock, SystemClock};

//! Object stream grammar: a gated reader and a writer for the one shape the
//! gate accepts.

pub mod constants;
pub mod datetime;
pub mod mutf8;
pub mod reader;
pub mod writer;

pub use reader::{GatedReader, StreamLimits};
pub use writer::{ClassSpec, StreamWriter};

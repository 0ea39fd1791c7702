//! Per-frame pixel decoding.
//!
//! - `bit_reader`: LSB-first variable-width code reader
//! - `lzw`: dictionary decoder producing color indexes
//! - `interlace`: four-pass row reordering
//! - `error`: recoverable payload errors
//!
//! Each frame owns its own reader and dictionary, so frames decode
//! independently of one another.

pub mod bit_reader;
pub mod error;
pub mod interlace;
pub mod lzw;

pub use error::LzwError;
pub use interlace::deinterlace;
pub use lzw::{LzwOutput, decode};

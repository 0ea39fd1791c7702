//! GIF89a container parsing.
//!
//! The block grammar is walked in a single forward pass:
//! - `layout`: signatures, introducers, labels and bit masks
//! - `reader`: bounds-checked cursor, sub-block and color table reads
//! - `blocks`: grammar alternatives as tagged enums
//! - `parser`: recursive descent plus frame assembly
//! - `error`: fatal container errors
//!
//! Parsing allocates owned frames; nothing borrows the input afterwards.

pub mod blocks;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::ContainerError;
pub use parser::parse_gif;

use thiserror::Error;

/// Errors raised while expanding an LZW payload.
///
/// Frame decoding recovers from these by zero-padding the missing pixels;
/// the error is kept on the decoded frame for reporting.
///
/// # Examples
/// ```text
/// use gifscope_core::codec::error::LzwError;
///
/// let err = LzwError::CorruptLzwStream { code: 9, next_key: 7 };
/// assert!(err.to_string().contains("corrupt LZW stream"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LzwError {
    #[error("LZW payload exhausted after {consumed} bytes while reading a {code_size}-bit code")]
    EndOfData { consumed: usize, code_size: u8 },
    #[error("corrupt LZW stream: code {code} exceeds next dictionary slot {next_key}")]
    CorruptLzwStream { code: u16, next_key: u16 },
}

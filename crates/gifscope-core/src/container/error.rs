use thiserror::Error;

/// Errors returned while walking the GIF block grammar.
///
/// Container errors are fatal for the whole document: parsing stops at the
/// first one and no partial document is produced.
///
/// # Examples
/// ```text
/// use gifscope_core::container::error::ContainerError;
///
/// let err = ContainerError::InvalidFormat { found: b"GIF87a".to_vec() };
/// assert!(err.to_string().contains("invalid signature"));
/// ```
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("invalid signature or version: expected GIF89a, got {found:02x?}")]
    InvalidFormat { found: Vec<u8> },
    #[error("malformed block at offset {offset}: {reason}")]
    MalformedBlock { offset: usize, reason: String },
    #[error("unexpected end of data at offset {offset}: need {needed} bytes, got {actual}")]
    EndOfData {
        offset: usize,
        needed: usize,
        actual: usize,
    },
}

//! SM-LZ error types

use core::fmt;

/// Errors that can occur while decompressing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LzError {
    /// The input ended before the `0xFF` terminator (offset into the input)
    UnexpectedEnd { offset: usize },
    /// A back-reference pointed at output that has not been written yet
    InvalidBackReference { offset: usize, len: usize },
    /// Decompressed output would grow past the configured ceiling
    OutputLimit { limit: usize },
}

impl fmt::Display for LzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LzError::UnexpectedEnd { offset } => {
                write!(f, "compressed stream ended without terminator at byte {}", offset)
            }
            LzError::InvalidBackReference { offset, len } => write!(
                f,
                "back-reference to output offset 0x{:X} but only 0x{:X} bytes were decoded",
                offset, len
            ),
            LzError::OutputLimit { limit } => {
                write!(f, "decompressed output exceeds limit of 0x{:X} bytes", limit)
            }
        }
    }
}

impl std::error::Error for LzError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            LzError::UnexpectedEnd { offset: 12 }.to_string(),
            "compressed stream ended without terminator at byte 12"
        );
        assert_eq!(
            LzError::InvalidBackReference { offset: 0x20, len: 0x10 }.to_string(),
            "back-reference to output offset 0x20 but only 0x10 bytes were decoded"
        );
        assert_eq!(
            LzError::OutputLimit { limit: 0x100 }.to_string(),
            "decompressed output exceeds limit of 0x100 bytes"
        );
    }
}

//! 842-specific error types.

use oxiarc_core::OxiArcError;
use thiserror::Error;

/// 842 compression/decompression errors.
///
/// Every error is terminal for the block being processed; no partial output
/// is ever returned alongside one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Sw842Error {
    /// Unknown or reserved template code.
    #[error("Invalid template code {code:#04x} at bit position {position}")]
    InvalidTemplate {
        /// The 5-bit code read.
        code: u8,
        /// Bit position where the code starts.
        position: u64,
    },

    /// The bitstream ended before an op or argument was complete.
    #[error("Truncated input at bit position {position}")]
    TruncatedInput {
        /// Bit position where the missing field starts.
        position: u64,
    },

    /// Well-formed bits describing an impossible operation.
    #[error("Corrupt stream at bit position {position}: {message}")]
    CorruptStream {
        /// Bit position just after the offending field.
        position: u64,
        /// Description of the problem.
        message: String,
    },

    /// Input length incompatible with the block options.
    #[error("Unsupported input length {length}: short data template disabled")]
    UnsupportedLength {
        /// Length of the rejected input.
        length: usize,
    },

    /// The block trailer disagrees with the decoded data.
    #[error("Checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the trailer.
        expected: u32,
        /// Checksum of the decoded bytes.
        computed: u32,
    },

    /// Alignment other than 8, 16 or 32 bytes.
    #[error("Unsupported alignment: {0} bytes (must be 8, 16 or 32)")]
    UnsupportedAlignment(usize),

    /// Malformed multi-block frame container.
    #[error("Invalid frame: {message}")]
    InvalidFrame {
        /// Description of the problem.
        message: String,
    },
}

/// Result type for 842 operations.
pub type Result<T> = std::result::Result<T, Sw842Error>;

impl Sw842Error {
    /// Create a corrupt stream error.
    pub fn corrupt(position: u64, message: impl Into<String>) -> Self {
        Self::CorruptStream {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid frame error.
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            message: message.into(),
        }
    }
}

impl From<Sw842Error> for OxiArcError {
    fn from(err: Sw842Error) -> Self {
        match err {
            Sw842Error::InvalidTemplate { position, .. } => {
                OxiArcError::corrupted(position / 8, err.to_string())
            }
            Sw842Error::TruncatedInput { position } => OxiArcError::unexpected_eof(position / 8),
            Sw842Error::CorruptStream { position, message } => {
                OxiArcError::corrupted(position / 8, message)
            }
            Sw842Error::UnsupportedLength { .. } | Sw842Error::UnsupportedAlignment(_) => {
                OxiArcError::unsupported_method(err.to_string())
            }
            Sw842Error::ChecksumMismatch { expected, computed } => {
                OxiArcError::crc_mismatch(expected, computed)
            }
            Sw842Error::InvalidFrame { message } => OxiArcError::invalid_header(message),
        }
    }
}

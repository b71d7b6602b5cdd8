//! Block options shared by the 842 encoder and decoder.
//!
//! Neither side can discover these from the stream: padding length is not
//! self-delimiting and the trailer is not flagged, so both ends must be
//! configured alike.

use crate::error::{Result, Sw842Error};
use oxiarc_core::crc::Crc32Be;

/// Checksum applied to the uncompressed bytes of a block.
pub type ChecksumFn = fn(&[u8]) -> u32;

/// Padding boundary following the END template, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Pad to a multiple of 8 bytes.
    #[default]
    Bytes8,
    /// Pad to a multiple of 16 bytes.
    Bytes16,
    /// Pad to a multiple of 32 bytes.
    Bytes32,
}

impl Alignment {
    /// Parse an alignment given in bytes.
    pub fn from_bytes(bytes: usize) -> Result<Self> {
        match bytes {
            8 => Ok(Self::Bytes8),
            16 => Ok(Self::Bytes16),
            32 => Ok(Self::Bytes32),
            other => Err(Sw842Error::UnsupportedAlignment(other)),
        }
    }

    /// The alignment in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Self::Bytes8 => 8,
            Self::Bytes16 => 16,
            Self::Bytes32 => 32,
        }
    }

    pub(crate) const fn to_bits(self) -> u8 {
        match self {
            Self::Bytes8 => 0,
            Self::Bytes16 => 1,
            Self::Bytes32 => 2,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(Self::Bytes8),
            1 => Ok(Self::Bytes16),
            2 => Ok(Self::Bytes32),
            other => Err(Sw842Error::invalid_frame(format!(
                "unknown alignment selector {}",
                other
            ))),
        }
    }
}

/// Per-block configuration.
///
/// `crc` means "append a trailer" when compressing and "verify the trailer"
/// when decompressing.
#[derive(Debug, Clone, Copy)]
pub struct BlockOptions {
    /// Allow the software-only SHORT_DATA template (0x1D).
    pub allow_short_data: bool,
    /// Padding boundary after END.
    pub alignment: Alignment,
    /// Append or verify the 32-bit checksum trailer.
    pub crc: bool,
    /// Checksum over the uncompressed bytes.
    pub checksum: ChecksumFn,
}

impl BlockOptions {
    /// Software 842: short data allowed, 8-byte alignment, CRC trailer.
    pub const SOFTWARE: Self = Self {
        allow_short_data: true,
        alignment: Alignment::Bytes8,
        crc: true,
        checksum: Crc32Be::compute,
    };

    /// Streams an nx842 engine will accept: no SHORT_DATA template.
    pub const HARDWARE: Self = Self {
        allow_short_data: false,
        ..Self::SOFTWARE
    };

    /// Create the default (software) options.
    pub fn new() -> Self {
        Self::SOFTWARE
    }

    /// Set whether SHORT_DATA may be used.
    pub fn with_short_data(mut self, allow: bool) -> Self {
        self.allow_short_data = allow;
        self
    }

    /// Set the padding boundary.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Enable or disable the checksum trailer.
    pub fn with_crc(mut self, crc: bool) -> Self {
        self.crc = crc;
        self
    }

    /// Replace the checksum function.
    pub fn with_checksum(mut self, checksum: ChecksumFn) -> Self {
        self.checksum = checksum;
        self
    }
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self::new()
    }
}

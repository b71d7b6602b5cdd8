//! # OxiARC-842: Pure Rust 842 Compression
//!
//! This crate provides 842 compression and decompression using the template
//! table and ring indexing of the Linux kernel `sw842` implementation and
//! the IBM nx842 hardware engines. The block trailer is this crate's own:
//! END, padding, then an optional CRC. Blocks are not byte-interchangeable
//! with `sw842` output.
//!
//! ## Features
//!
//! - **Pure Rust**: No C dependencies, 100% safe Rust
//! - **Kernel templates**: Same template table and ring indexing as `sw842`
//! - **Deterministic**: Identical input and options give identical output
//! - **Frames**: Multi-block container with raw-block fallback
//! - **Parallel**: Optional rayon-based frame compression (`parallel` feature)
//!
//! ## Block Format
//!
//! A block is a sequence of 5-bit template codes, each followed by its
//! arguments, most-significant bit first:
//!
//! - **Table templates (0x00-0x19)**: four ops producing 8 bytes, each op a
//!   literal (D2/D4/D8) or a ring index (I2/I4/I8)
//! - **REPEAT (0x1B)**: re-append the previous 8 bytes N+1 times
//! - **ZEROS (0x1C)**: 8 zero bytes
//! - **SHORT_DATA (0x1D)**: final 1-7 bytes (software only)
//! - **END (0x1E)**: end of block, then zero padding and an optional
//!   big-endian CRC-32 of the uncompressed data
//!
//! Index ops address three fixed-modulo rings laid over the output itself
//! (see [`ring`]). There is no separate dictionary and no state carries over
//! between blocks.
//!
//! ## Example
//!
//! ```rust
//! use oxiarc_842::{compress, decompress, BlockOptions};
//!
//! let original = b"842 842 842 842 842 842 842 842 compression";
//! let options = BlockOptions::default();
//!
//! let compressed = compress(original, &options).unwrap();
//! let decompressed = decompress(&compressed, &options).unwrap();
//!
//! assert_eq!(decompressed, original);
//! ```
//!
//! ## Hardware-Compatible Streams
//!
//! nx842 engines reject SHORT_DATA, so inputs must be a multiple of 8
//! bytes:
//!
//! ```rust
//! use oxiarc_842::{compress, BlockOptions, Sw842Error};
//!
//! let options = BlockOptions::HARDWARE;
//! assert!(compress(&[0u8; 64], &options).is_ok());
//! assert_eq!(
//!     compress(&[0u8; 63], &options),
//!     Err(Sw842Error::UnsupportedLength { length: 63 })
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod bitstream;
mod config;
mod decoder;
mod encoder;
mod error;
pub mod frame;
pub mod ring;
pub mod template;

pub use config::{Alignment, BlockOptions, ChecksumFn};
pub use decoder::{BlockStats, Decoder};
pub use encoder::{Encoder, max_compressed_len};
pub use error::{Result, Sw842Error};
pub use frame::{
    BlockLayout, FrameHeader, FrameOptions, compress_frame, compress_frame_with,
    decompress_frame,
};

#[cfg(feature = "parallel")]
pub use frame::{compress_frame_parallel, decompress_frame_parallel};

/// Decompress one 842 block.
///
/// # Parameters
///
/// - `data`: Compressed block, possibly followed by unrelated bytes
/// - `options`: Must match the options the block was compressed with
///
/// # Returns
///
/// Decompressed byte sequence.
///
/// # Example
///
/// ```rust
/// use oxiarc_842::{compress, decompress, BlockOptions};
///
/// let options = BlockOptions::default().with_crc(false);
/// let compressed = compress(b"Hello, World!", &options).unwrap();
/// let decompressed = decompress(&compressed, &options).unwrap();
/// assert_eq!(decompressed, b"Hello, World!");
/// ```
pub fn decompress(data: &[u8], options: &BlockOptions) -> Result<Vec<u8>> {
    Decoder::new(*options).decode_block(data)
}

/// Compress data into one 842 block.
///
/// # Parameters
///
/// - `data`: Uncompressed input
/// - `options`: Short data, alignment and checksum settings
///
/// # Returns
///
/// 842-compressed block including padding and trailer.
///
/// # Example
///
/// ```rust
/// use oxiarc_842::{compress, BlockOptions};
///
/// let data = [0u8; 4096];
/// let compressed = compress(&data, &BlockOptions::default()).unwrap();
/// assert!(compressed.len() < 32);
/// ```
pub fn compress(data: &[u8], options: &BlockOptions) -> Result<Vec<u8>> {
    Encoder::new(*options).encode_block(data)
}

//! # OxiArc Core
//!
//! Core components shared by the OxiArc 842 crates.
//!
//! - [`crc`]: the big-endian CRC-32 carried by 842 block trailers
//! - [`error`]: the workspace error type
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Tools                                               │
//! │     oxiarc842 CLI                                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     842 templates, ring indices, block framer, frames   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     CRC, errors                                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiarc_core::crc::Crc32Be;
//!
//! let crc = Crc32Be::compute(b"123456789");
//! assert_eq!(crc, 0x89A1897F);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod crc;
pub mod error;

pub use crc::Crc32Be;
pub use error::{OxiArcError, Result};

//! Template codes and the static template table.
//!
//! Every block entry starts with a 5-bit template code. Codes `0x00..=0x19`
//! select a row of [`TEMPLATES`]; each row holds four ops that together
//! produce exactly 8 output bytes. The remaining codes are special:
//!
//! | Code   | Name       | Argument                 |
//! |--------|------------|--------------------------|
//! | `0x1B` | REPEAT     | 6-bit count N            |
//! | `0x1C` | ZEROS      | none                     |
//! | `0x1D` | SHORT_DATA | 3-bit length N, N bytes  |
//! | `0x1E` | END        | none                     |
//!
//! `0x1A` and `0x1F` are reserved. SHORT_DATA is a software extension that
//! hardware engines reject.

/// Bits in a template code.
pub const OP_BITS: u8 = 5;
/// Bits in the REPEAT count.
pub const REPEAT_BITS: u8 = 6;
/// Bits in the SHORT_DATA length.
pub const SHORT_DATA_BITS: u8 = 3;
/// Bits in the checksum trailer.
pub const CRC_BITS: u8 = 32;

/// Largest REPEAT argument; a run covers at most `REPEAT_BITS_MAX + 1` groups.
pub const REPEAT_BITS_MAX: u64 = 0x3F;
/// Largest SHORT_DATA length.
pub const SHORT_DATA_BITS_MAX: u64 = 0x07;

/// Bytes produced by one template row, REPEAT copy or ZEROS.
pub const GROUP_BYTES: usize = 8;

/// REPEAT template code.
pub const OP_REPEAT: u8 = 0x1B;
/// ZEROS template code.
pub const OP_ZEROS: u8 = 0x1C;
/// SHORT_DATA template code (software only).
pub const OP_SHORT_DATA: u8 = 0x1D;
/// END template code.
pub const OP_END: u8 = 0x1E;

/// Number of table-driven templates.
pub const OPS_MAX: u8 = 0x1A;

/// Element width of a Data or Index op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// 2 bytes; indices are 8 bits.
    W2,
    /// 4 bytes; indices are 9 bits.
    W4,
    /// 8 bytes; indices are 8 bits.
    W8,
}

impl Width {
    /// All widths, narrowest first.
    pub const ALL: [Width; 3] = [Width::W2, Width::W4, Width::W8];

    /// Element size in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Self::W2 => 2,
            Self::W4 => 4,
            Self::W8 => 8,
        }
    }

    /// Bits in an index argument for this width.
    pub const fn index_bits(self) -> u8 {
        match self {
            Self::W2 => 8,
            Self::W4 => 9,
            Self::W8 => 8,
        }
    }
}

/// One slot of a template row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Literal bytes copied from the stream.
    Data(Width),
    /// Ring index resolved against the output written so far.
    Index(Width),
    /// No argument, no output.
    Noop,
}

impl Op {
    /// Output bytes produced by this op.
    pub const fn bytes(self) -> usize {
        match self {
            Self::Data(w) | Self::Index(w) => w.bytes(),
            Self::Noop => 0,
        }
    }

    /// Argument bits this op consumes from the stream.
    pub const fn arg_bits(self) -> u32 {
        match self {
            Self::Data(w) => w.bytes() as u32 * 8,
            Self::Index(w) => w.index_bits() as u32,
            Self::Noop => 0,
        }
    }
}

/// A template row.
pub type Row = [Op; 4];

const D2: Op = Op::Data(Width::W2);
const D4: Op = Op::Data(Width::W4);
const D8: Op = Op::Data(Width::W8);
const I2: Op = Op::Index(Width::W2);
const I4: Op = Op::Index(Width::W4);
const I8: Op = Op::Index(Width::W8);
const N0: Op = Op::Noop;

/// The template table, indexed by template code.
pub const TEMPLATES: [Row; OPS_MAX as usize] = [
    [D8, N0, N0, N0], // 0x00
    [D4, D2, I2, N0], // 0x01
    [D4, I2, D2, N0], // 0x02
    [D4, I2, I2, N0], // 0x03
    [D4, I4, N0, N0], // 0x04
    [D2, I2, D4, N0], // 0x05
    [D2, I2, D2, I2], // 0x06
    [D2, I2, I2, D2], // 0x07
    [D2, I2, I2, I2], // 0x08
    [D2, I2, I4, N0], // 0x09
    [I2, D2, D4, N0], // 0x0a
    [I2, D4, I2, N0], // 0x0b
    [I2, D2, I2, D2], // 0x0c
    [I2, D2, I2, I2], // 0x0d
    [I2, D2, I4, N0], // 0x0e
    [I2, I2, D4, N0], // 0x0f
    [I2, I2, D2, I2], // 0x10
    [I2, I2, I2, D2], // 0x11
    [I2, I2, I2, I2], // 0x12
    [I2, I2, I4, N0], // 0x13
    [I4, D4, N0, N0], // 0x14
    [I4, D2, I2, N0], // 0x15
    [I4, I2, D2, N0], // 0x16
    [I4, I2, I2, N0], // 0x17
    [I4, I4, N0, N0], // 0x18
    [I8, N0, N0, N0], // 0x19
];

/// Look up the row for a table template code.
///
/// Special codes (REPEAT, ZEROS, SHORT_DATA, END) and the reserved codes
/// are not table rows and give `None`.
pub fn row(code: u8) -> Option<&'static Row> {
    TEMPLATES.get(usize::from(code))
}

/// Argument bits a row consumes after its template code.
pub fn row_arg_bits(row: &Row) -> u32 {
    row.iter().map(|op| op.arg_bits()).sum()
}

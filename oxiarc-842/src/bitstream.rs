//! MSB-first bit stream operations for 842.
//!
//! 842 packs every field most-significant bit first: the first bit of a
//! block is bit 7 of byte 0, and a 64-bit data argument lands in the stream
//! in the same byte order as the input it came from.

use crate::error::{Result, Sw842Error};

/// MSB-first bit reader over a borrowed block.
#[derive(Debug)]
pub struct MsbBitReader<'a> {
    /// Input data.
    data: &'a [u8],
    /// Absolute bit position of the next bit to read.
    bit_pos: u64,
}

impl<'a> MsbBitReader<'a> {
    /// Create a new MSB bit reader.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Number of bits left in the input.
    pub fn remaining_bits(&self) -> u64 {
        (self.data.len() as u64 * 8).saturating_sub(self.bit_pos)
    }

    /// Read up to 64 bits (MSB-first).
    ///
    /// Fails with `TruncatedInput` without consuming anything if fewer than
    /// `count` bits remain.
    pub fn read_bits(&mut self, count: u8) -> Result<u64> {
        debug_assert!(count <= 64, "Cannot read more than 64 bits at once");

        if self.remaining_bits() < u64::from(count) {
            return Err(Sw842Error::TruncatedInput {
                position: self.bit_pos,
            });
        }

        let mut value = 0u64;
        let mut left = count;
        while left > 0 {
            let byte = self.data[(self.bit_pos / 8) as usize];
            let used = (self.bit_pos % 8) as u8;
            let available = 8 - used;
            let take = available.min(left);

            let bits = (byte >> (available - take)) & (0xFFu8 >> (8 - take));
            value = (value << take) | u64::from(bits);

            self.bit_pos += u64::from(take);
            left -= take;
        }

        Ok(value)
    }

    /// Read `N` whole bytes, which need not start on a byte boundary.
    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        debug_assert!(N <= 8);
        let value = self.read_bits((N * 8) as u8)?;
        let be = value.to_be_bytes();
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&be[8 - N..]);
        Ok(bytes)
    }

    /// Skip the padding up to the next multiple of `byte_multiple` bytes,
    /// measured from the start of the input.
    pub fn skip_padding(&mut self, byte_multiple: usize) -> Result<()> {
        let boundary = byte_multiple as u64 * 8;
        let target = self.bit_pos.div_ceil(boundary) * boundary;

        if target > self.data.len() as u64 * 8 {
            return Err(Sw842Error::TruncatedInput {
                position: self.bit_pos,
            });
        }

        self.bit_pos = target;
        Ok(())
    }

    /// Get total bits read.
    pub fn bits_read(&self) -> u64 {
        self.bit_pos
    }

    /// Number of input bytes touched so far (a partial byte counts).
    pub fn bytes_consumed(&self) -> usize {
        self.bit_pos.div_ceil(8) as usize
    }
}

/// MSB-first bit writer for 842 compression.
#[derive(Debug)]
pub struct MsbBitWriter {
    /// Output buffer.
    output: Vec<u8>,
    /// Pending bits, right-aligned.
    buffer: u64,
    /// Number of pending bits (always below 8 between calls).
    bits_in_buffer: u8,
}

impl MsbBitWriter {
    /// Create a new MSB bit writer.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a writer with room for `capacity` output bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            buffer: 0,
            bits_in_buffer: 0,
        }
    }

    /// Write the low `count` bits of `value` (MSB-first), `count <= 64`.
    pub fn write_bits(&mut self, value: u64, count: u8) {
        debug_assert!(count <= 64, "Cannot write more than 64 bits at once");

        if count > 32 {
            self.push_bits(value >> 32, count - 32);
            self.push_bits(value & 0xFFFF_FFFF, 32);
        } else {
            self.push_bits(value, count);
        }
    }

    /// Write whole bytes in order.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bits_in_buffer == 0 {
            self.output.extend_from_slice(bytes);
            return;
        }
        for &byte in bytes {
            self.push_bits(u64::from(byte), 8);
        }
    }

    #[inline]
    fn push_bits(&mut self, value: u64, count: u8) {
        if count == 0 {
            return;
        }

        let mask = (1u64 << count) - 1;
        self.buffer = (self.buffer << count) | (value & mask);
        self.bits_in_buffer += count;

        while self.bits_in_buffer >= 8 {
            let byte = (self.buffer >> (self.bits_in_buffer - 8)) as u8;
            self.output.push(byte);
            self.bits_in_buffer -= 8;
        }
        self.buffer &= (1u64 << self.bits_in_buffer) - 1;
    }

    /// Zero-pad until the output length is a multiple of `byte_multiple`.
    pub fn align_to(&mut self, byte_multiple: usize) {
        if self.bits_in_buffer > 0 {
            let remaining = 8 - self.bits_in_buffer;
            self.push_bits(0, remaining);
        }

        let padded = self.output.len().div_ceil(byte_multiple) * byte_multiple;
        self.output.resize(padded, 0);
    }

    /// Total bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.output.len() as u64 * 8 + u64::from(self.bits_in_buffer)
    }

    /// Get the output data, zero-filling a trailing partial byte.
    pub fn into_vec(mut self) -> Vec<u8> {
        if self.bits_in_buffer > 0 {
            let remaining = 8 - self.bits_in_buffer;
            self.push_bits(0, remaining);
        }
        self.output
    }
}

impl Default for MsbBitWriter {
    fn default() -> Self {
        Self::new()
    }
}

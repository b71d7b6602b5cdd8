//! Ring-buffer indexing over the output buffer.
//!
//! An Index op does not carry a distance. It names a slot in one of three
//! fixed rings laid over the output, one per element width:
//!
//! | Width | Index bits | Slots | Window     |
//! |-------|------------|-------|------------|
//! | 2     | 8          | 256   | 512 bytes  |
//! | 4     | 9          | 512   | 2048 bytes |
//! | 8     | 8          | 256   | 2048 bytes |
//!
//! Output position `p` belongs to slot `(p / W) mod slots`, so slot `k`
//! always means "the most recent `W`-byte element at a position congruent
//! to `k·W` modulo the window", not "`k` elements back". The output buffer
//! is the only storage: resolving an index yields an offset into it.

use crate::template::{GROUP_BYTES, Width};
use std::collections::HashMap;

/// Fixed-modulo addressing for one element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingIndex {
    width: Width,
}

impl RingIndex {
    /// 2-byte ring (I2).
    pub const I2: Self = Self::for_width(Width::W2);
    /// 4-byte ring (I4).
    pub const I4: Self = Self::for_width(Width::W4);
    /// 8-byte ring (I8).
    pub const I8: Self = Self::for_width(Width::W8);

    /// Ring for a given element width.
    pub const fn for_width(width: Width) -> Self {
        Self { width }
    }

    /// Element width.
    pub const fn width(&self) -> Width {
        self.width
    }

    /// Number of slots (`2^index_bits`).
    pub const fn slots(&self) -> usize {
        1 << self.width.index_bits()
    }

    /// Window size in bytes.
    pub const fn window_bytes(&self) -> usize {
        self.slots() * self.width.bytes()
    }

    /// Slot occupied by the element starting at output `position`.
    pub const fn slot_for(&self, position: usize) -> usize {
        (position / self.width.bytes()) % self.slots()
    }

    /// Resolve `index` to an output offset for an op executing when
    /// `output_len` bytes have been written.
    ///
    /// Only output before the start of the current 8-byte group is
    /// addressable. Returns `None` when the slot has not been written yet.
    pub fn resolve(&self, index: usize, output_len: usize) -> Option<usize> {
        let size = self.width.bytes();
        let window = self.window_bytes();
        let total = output_len - output_len % GROUP_BYTES;
        let mut offset = index * size;

        if total > window {
            let mut section = total - total % window;
            let pos = total - section;
            if offset >= pos {
                section -= window;
            }
            offset += section;
        }

        (offset + size <= total).then_some(offset)
    }
}

/// Encoder-side view of one ring: what value each slot currently holds and
/// which slot most recently received a given value.
#[derive(Debug, Clone)]
struct RingTable {
    ring: RingIndex,
    slots: Vec<Option<u64>>,
    lookup: HashMap<u64, u16>,
}

impl RingTable {
    fn new(ring: RingIndex) -> Self {
        Self {
            ring,
            slots: vec![None; ring.slots()],
            lookup: HashMap::with_capacity(ring.slots()),
        }
    }

    fn find(&self, value: u64) -> Option<u16> {
        self.lookup.get(&value).copied()
    }

    fn store(&mut self, position: usize, value: u64) {
        let slot = self.ring.slot_for(position);
        let slot_id = slot as u16;

        if let Some(old) = self.slots[slot].replace(value)
            && self.lookup.get(&old) == Some(&slot_id)
        {
            self.lookup.remove(&old);
        }
        self.lookup.insert(value, slot_id);
    }
}

/// Per-width ring tables tracking the encoder's already-emitted groups.
///
/// The tables mirror exactly what a decoder can resolve, so every index the
/// encoder finds here is valid on the decoding side.
#[derive(Debug, Clone)]
pub struct RingHistory {
    i2: RingTable,
    i4: RingTable,
    i8: RingTable,
}

impl RingHistory {
    /// Create empty history for a new block.
    pub fn new() -> Self {
        Self {
            i2: RingTable::new(RingIndex::I2),
            i4: RingTable::new(RingIndex::I4),
            i8: RingTable::new(RingIndex::I8),
        }
    }

    fn table(&self, width: Width) -> &RingTable {
        match width {
            Width::W2 => &self.i2,
            Width::W4 => &self.i4,
            Width::W8 => &self.i8,
        }
    }

    fn table_mut(&mut self, width: Width) -> &mut RingTable {
        match width {
            Width::W2 => &mut self.i2,
            Width::W4 => &mut self.i4,
            Width::W8 => &mut self.i8,
        }
    }

    /// Slot currently holding `value` for the given width, if any.
    pub fn find(&self, width: Width, value: u64) -> Option<u16> {
        self.table(width).find(value)
    }

    /// Record the 8-byte group written at output `position`.
    pub fn record_group(&mut self, position: usize, group: &[u8; GROUP_BYTES]) {
        for width in Width::ALL {
            let size = width.bytes();
            for (i, element) in group.chunks_exact(size).enumerate() {
                let value = element_value(element);
                self.table_mut(width).store(position + i * size, value);
            }
        }
    }
}

impl Default for RingHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Big-endian value of a 1..=8 byte element.
pub(crate) fn element_value(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
}

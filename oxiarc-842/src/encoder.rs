//! 842 block encoder (compression).

use crate::bitstream::MsbBitWriter;
use crate::config::BlockOptions;
use crate::error::{Result, Sw842Error};
use crate::ring::{RingHistory, element_value};
use crate::template::{
    CRC_BITS, GROUP_BYTES, OP_BITS, OP_END, OP_REPEAT, OP_SHORT_DATA, OP_ZEROS, Op,
    REPEAT_BITS, REPEAT_BITS_MAX, SHORT_DATA_BITS, TEMPLATES, Width, row_arg_bits,
};

/// Longest run of identical groups one REPEAT template can cover.
const MAX_REPEAT_RUN: usize = REPEAT_BITS_MAX as usize + 1;

/// Zero runs up to this length are cheaper as ZEROS templates than as one REPEAT.
const ZEROS_OVER_REPEAT_RUN: usize = 2;

/// Upper bound on the compressed size of `input_len` bytes.
///
/// A group never costs more than a D8 template, the tail never more than a
/// SHORT_DATA template with 7 bytes.
pub fn max_compressed_len(input_len: usize, options: &BlockOptions) -> usize {
    let groups = input_len / GROUP_BYTES;
    let tail = input_len % GROUP_BYTES;

    let mut bits = groups * (OP_BITS as usize + GROUP_BYTES * 8);
    if tail > 0 {
        bits += OP_BITS as usize + SHORT_DATA_BITS as usize + tail * 8;
    }
    bits += OP_BITS as usize;

    let alignment = options.alignment.bytes();
    let mut bytes = bits.div_ceil(8).div_ceil(alignment) * alignment;
    if options.crc {
        bytes += CRC_BITS as usize / 8;
    }
    bytes
}

/// A pending run of groups identical to the group before them.
#[derive(Debug, Clone, Copy)]
struct RepeatRun {
    group: u64,
    count: usize,
}

/// 842 encoder for compression.
///
/// Encoding is deterministic: the same input and options always produce
/// the same bytes.
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    options: BlockOptions,
}

impl Encoder {
    /// Create a new encoder with the given options.
    pub fn new(options: BlockOptions) -> Self {
        Self { options }
    }

    /// Options used by this encoder.
    pub fn options(&self) -> &BlockOptions {
        &self.options
    }

    /// Encode one block.
    ///
    /// # Algorithm
    ///
    /// Input is consumed in 8-byte groups:
    /// 1. A group equal to its predecessor extends a repeat run (at most 64
    ///    groups per REPEAT template)
    /// 2. An all-zero group becomes ZEROS
    /// 3. Anything else becomes the table template with the fewest argument
    ///    bits whose Index ops all hit the ring history
    ///
    /// After every group the ring history learns the group's 2, 4 and
    /// 8-byte elements. A final partial group becomes SHORT_DATA, then END,
    /// padding and the optional checksum trailer follow.
    pub fn encode_block(&self, input: &[u8]) -> Result<Vec<u8>> {
        let groups = input.chunks_exact(GROUP_BYTES);
        let tail = groups.remainder();

        if !tail.is_empty() && !self.options.allow_short_data {
            return Err(Sw842Error::UnsupportedLength {
                length: input.len(),
            });
        }

        let mut writer = MsbBitWriter::with_capacity(max_compressed_len(input.len(), &self.options));
        let mut history = RingHistory::new();
        let mut last: Option<u64> = None;
        let mut run: Option<RepeatRun> = None;

        for (i, chunk) in groups.enumerate() {
            let mut group = [0u8; GROUP_BYTES];
            group.copy_from_slice(chunk);
            let value = u64::from_be_bytes(group);

            if last == Some(value) {
                match run.as_mut() {
                    Some(pending) if pending.count < MAX_REPEAT_RUN => pending.count += 1,
                    _ => {
                        let next = RepeatRun {
                            group: value,
                            count: 1,
                        };
                        if let Some(full) = run.replace(next) {
                            write_run(&mut writer, full);
                        }
                    }
                }
            } else {
                if let Some(pending) = run.take() {
                    write_run(&mut writer, pending);
                }
                if value == 0 {
                    writer.write_bits(u64::from(OP_ZEROS), OP_BITS);
                } else {
                    write_template(&mut writer, &history, &group);
                }
            }

            history.record_group(i * GROUP_BYTES, &group);
            last = Some(value);
        }

        if let Some(pending) = run.take() {
            write_run(&mut writer, pending);
        }

        if !tail.is_empty() {
            writer.write_bits(u64::from(OP_SHORT_DATA), OP_BITS);
            writer.write_bits(tail.len() as u64, SHORT_DATA_BITS);
            writer.write_bytes(tail);
        }

        writer.write_bits(u64::from(OP_END), OP_BITS);
        writer.align_to(self.options.alignment.bytes());

        if self.options.crc {
            let crc = (self.options.checksum)(input);
            writer.write_bits(u64::from(crc), CRC_BITS);
        }

        Ok(writer.into_vec())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(BlockOptions::default())
    }
}

/// Emit a finished repeat run.
fn write_run(writer: &mut MsbBitWriter, run: RepeatRun) {
    if run.group == 0 && run.count <= ZEROS_OVER_REPEAT_RUN {
        for _ in 0..run.count {
            writer.write_bits(u64::from(OP_ZEROS), OP_BITS);
        }
    } else {
        writer.write_bits(u64::from(OP_REPEAT), OP_BITS);
        writer.write_bits((run.count - 1) as u64, REPEAT_BITS);
    }
}

/// A row op bound to the group being encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundOp {
    Noop,
    /// Literal bytes at this offset of the group.
    Data(Width),
    /// Ring slot holding the same bytes.
    Index(Width, u16),
}

/// Row 0x00: the whole group as one literal.
const LITERAL_ROW: [BoundOp; 4] = [
    BoundOp::Data(Width::W8),
    BoundOp::Noop,
    BoundOp::Noop,
    BoundOp::Noop,
];

/// Bind each op of a row to `group`, or `None` if some Index op misses.
fn match_row(
    history: &RingHistory,
    ops: &[Op; 4],
    group: &[u8; GROUP_BYTES],
) -> Option<[BoundOp; 4]> {
    let mut bound = [BoundOp::Noop; 4];
    let mut offset = 0;

    for (slot, op) in bound.iter_mut().zip(ops) {
        *slot = match *op {
            Op::Noop => BoundOp::Noop,
            Op::Data(width) => BoundOp::Data(width),
            Op::Index(width) => {
                let element = &group[offset..offset + width.bytes()];
                BoundOp::Index(width, history.find(width, element_value(element))?)
            }
        };
        offset += op.bytes();
    }

    Some(bound)
}

/// Emit the cheapest table template that can express `group`.
fn write_template(writer: &mut MsbBitWriter, history: &RingHistory, group: &[u8; GROUP_BYTES]) {
    let mut best: (u8, u32, [BoundOp; 4]) = (0, row_arg_bits(&TEMPLATES[0]), LITERAL_ROW);

    for (code, ops) in TEMPLATES.iter().enumerate().skip(1) {
        let cost = row_arg_bits(ops);
        if cost >= best.1 {
            continue;
        }
        if let Some(bound) = match_row(history, ops, group) {
            best = (code as u8, cost, bound);
        }
    }

    let (code, _, bound) = best;
    writer.write_bits(u64::from(code), OP_BITS);

    let mut offset = 0;
    for op in bound {
        match op {
            BoundOp::Noop => {}
            BoundOp::Data(width) => {
                writer.write_bytes(&group[offset..offset + width.bytes()]);
                offset += width.bytes();
            }
            BoundOp::Index(width, index) => {
                writer.write_bits(u64::from(index), width.index_bits());
                offset += width.bytes();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;

    fn plain() -> BlockOptions {
        BlockOptions::new().with_crc(false)
    }

    fn template_codes(stream: &[u8]) -> Vec<u8> {
        use crate::bitstream::MsbBitReader;
        use crate::template::row;

        let mut reader = MsbBitReader::new(stream);
        let mut codes = Vec::new();
        loop {
            let code = reader.read_bits(OP_BITS).unwrap() as u8;
            codes.push(code);
            match code {
                OP_END => return codes,
                OP_ZEROS => {}
                OP_REPEAT => {
                    reader.read_bits(REPEAT_BITS).unwrap();
                }
                OP_SHORT_DATA => {
                    let n = reader.read_bits(SHORT_DATA_BITS).unwrap() as u8;
                    reader.read_bits(n * 8).unwrap();
                }
                c => {
                    for op in row(c).unwrap() {
                        reader.read_bits(op.arg_bits() as u8).unwrap();
                    }
                }
            }
        }
    }

    #[test]
    fn test_encode_zero_groups() {
        let compressed = Encoder::new(plain()).encode_block(&[0u8; 16]).unwrap();
        assert_eq!(template_codes(&compressed), vec![OP_ZEROS, OP_ZEROS, OP_END]);
        assert_eq!(compressed.len(), 8);
    }

    #[test]
    fn test_match_row_binds_index_slots() {
        let mut history = RingHistory::new();
        history.record_group(0, b"ABCDEFGH");

        assert_eq!(
            match_row(&history, &TEMPLATES[0], b"ABCDEFGH"),
            Some(LITERAL_ROW)
        );
        assert_eq!(
            match_row(&history, &TEMPLATES[0x19], b"ABCDEFGH"),
            Some([
                BoundOp::Index(Width::W8, 0),
                BoundOp::Noop,
                BoundOp::Noop,
                BoundOp::Noop
            ])
        );
        assert_eq!(match_row(&history, &TEMPLATES[0x19], b"ABCDxxxx"), None);
    }

    #[test]
    fn test_encode_long_zero_run_uses_repeat() {
        let compressed = Encoder::new(plain()).encode_block(&[0u8; 64]).unwrap();
        assert_eq!(template_codes(&compressed), vec![OP_ZEROS, OP_REPEAT, OP_END]);
    }

    #[test]
    fn test_encode_repeat() {
        let original: Vec<u8> = [1u8, 2, 3, 4, 5, 6, 7, 8].repeat(4);
        let compressed = Encoder::new(plain()).encode_block(&original).unwrap();

        // D8 (5 + 64 bits), REPEAT N=2 (5 + 6 bits), END
        assert_eq!(template_codes(&compressed), vec![0x00, OP_REPEAT, OP_END]);
        let mut reader = crate::bitstream::MsbBitReader::new(&compressed);
        reader.read_bits(OP_BITS + 64).unwrap();
        assert_eq!(reader.read_bits(OP_BITS).unwrap(), u64::from(OP_REPEAT));
        assert_eq!(reader.read_bits(REPEAT_BITS).unwrap(), 2);

        let decoded = Decoder::new(plain()).decode_block(&compressed).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_repeat_run_overflow() {
        // 1 literal group + 100 repeats: REPEAT(63) then REPEAT(35).
        let original: Vec<u8> = b"overflow".repeat(101);
        let compressed = Encoder::new(plain()).encode_block(&original).unwrap();
        assert_eq!(
            template_codes(&compressed),
            vec![0x00, OP_REPEAT, OP_REPEAT, OP_END]
        );

        let decoded = Decoder::new(plain()).decode_block(&compressed).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_prefers_i8() {
        let mut original = b"ABCDEFGH".to_vec();
        original.extend_from_slice(b"12345678");
        original.extend_from_slice(b"ABCDEFGH");
        let compressed = Encoder::new(plain()).encode_block(&original).unwrap();
        assert_eq!(template_codes(&compressed), vec![0x00, 0x00, 0x19, OP_END]);

        let decoded = Decoder::new(plain()).decode_block(&compressed).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_partial_matches() {
        // Second group shares its first word with the first group.
        let original = b"wxyz1234wxyzabcd".to_vec();
        let compressed = Encoder::new(plain()).encode_block(&original).unwrap();
        // I4 D4 (0x14) costs 41 bits; D4 I4 would not match.
        assert_eq!(template_codes(&compressed), vec![0x00, 0x14, OP_END]);

        let decoded = Decoder::new(plain()).decode_block(&compressed).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_short_data() {
        let original = b"0123456789";
        let compressed = Encoder::new(plain()).encode_block(original).unwrap();
        assert_eq!(
            template_codes(&compressed),
            vec![0x00, OP_SHORT_DATA, OP_END]
        );

        let decoded = Decoder::new(plain()).decode_block(&compressed).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_rejects_partial_group_without_short_data() {
        let encoder = Encoder::new(BlockOptions::HARDWARE);
        assert_eq!(
            encoder.encode_block(b"0123456789"),
            Err(Sw842Error::UnsupportedLength { length: 10 })
        );
        assert!(encoder.encode_block(b"01234567").is_ok());
    }

    #[test]
    fn test_encode_empty() {
        let compressed = Encoder::new(plain()).encode_block(&[]).unwrap();
        assert_eq!(template_codes(&compressed), vec![OP_END]);
        assert_eq!(compressed.len(), 8);

        let decoded = Decoder::new(plain()).decode_block(&compressed).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_encode_deterministic() {
        let original: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2654435761) >> 13) as u8).collect();
        let encoder = Encoder::default();
        assert_eq!(
            encoder.encode_block(&original).unwrap(),
            encoder.encode_block(&original).unwrap()
        );
    }

    #[test]
    fn test_max_compressed_len_bounds_output() {
        let options = BlockOptions::default();
        for len in [0usize, 1, 7, 8, 9, 63, 64, 1000, 4096] {
            let original: Vec<u8> = (0..len).map(|i| (i * 131 + 7) as u8).collect();
            let compressed = Encoder::new(options).encode_block(&original).unwrap();
            assert!(compressed.len() <= max_compressed_len(len, &options));
        }
    }
}

//! 842 block decoder (decompression).

use crate::bitstream::MsbBitReader;
use crate::config::BlockOptions;
use crate::error::{Result, Sw842Error};
use crate::ring::RingIndex;
use crate::template::{
    CRC_BITS, GROUP_BYTES, OP_BITS, OP_END, OP_REPEAT, OP_SHORT_DATA, OP_ZEROS, Op,
    REPEAT_BITS, Row, SHORT_DATA_BITS, Width, row,
};

/// Counters collected while decoding a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStats {
    /// Table template rows executed.
    pub templates: usize,
    /// Index ops resolved.
    pub index_ops: usize,
    /// REPEAT templates.
    pub repeats: usize,
    /// Groups produced by REPEAT templates.
    pub repeated_groups: usize,
    /// ZEROS templates.
    pub zeros: usize,
    /// Whether a SHORT_DATA template was present.
    pub short_data: bool,
    /// Compressed bytes consumed, trailer included.
    pub consumed: usize,
}

/// 842 decoder for decompression.
///
/// The decoder keeps no state between blocks; one instance can decode any
/// number of blocks, from any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    options: BlockOptions,
}

impl Decoder {
    /// Create a new decoder with the given options.
    pub fn new(options: BlockOptions) -> Self {
        Self { options }
    }

    /// Options used by this decoder.
    pub fn options(&self) -> &BlockOptions {
        &self.options
    }

    /// Decode one compressed block.
    ///
    /// Bytes following the padding and optional trailer are ignored.
    pub fn decode_block(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.decode_block_with_stats(input).map(|(output, _)| output)
    }

    /// Decode one compressed block and report what it contained.
    pub fn decode_block_with_stats(&self, input: &[u8]) -> Result<(Vec<u8>, BlockStats)> {
        let mut reader = MsbBitReader::new(input);
        let mut output = Vec::with_capacity(input.len().saturating_mul(2));
        let mut stats = BlockStats::default();

        let result = self.decode_entries(&mut reader, &mut output, &mut stats);
        if let Err(err) = result {
            tracing::debug!(
                bit_position = reader.bits_read(),
                decoded = output.len(),
                "842 block decode failed: {}",
                err
            );
            return Err(err);
        }

        reader.skip_padding(self.options.alignment.bytes())?;

        if self.options.crc {
            let expected = reader.read_bits(CRC_BITS)? as u32;
            let computed = (self.options.checksum)(&output);
            if expected != computed {
                tracing::debug!(expected, computed, "842 block checksum mismatch");
                return Err(Sw842Error::ChecksumMismatch { expected, computed });
            }
        }

        stats.consumed = reader.bytes_consumed();
        Ok((output, stats))
    }

    /// Run template dispatch until END.
    fn decode_entries(
        &self,
        reader: &mut MsbBitReader<'_>,
        output: &mut Vec<u8>,
        stats: &mut BlockStats,
    ) -> Result<()> {
        loop {
            let position = reader.bits_read();
            let code = reader.read_bits(OP_BITS)? as u8;

            match code {
                OP_REPEAT => {
                    let count = reader.read_bits(REPEAT_BITS)? as usize + 1;
                    if output.len() < GROUP_BYTES {
                        return Err(Sw842Error::corrupt(
                            reader.bits_read(),
                            format!("repeat with only {} bytes of output", output.len()),
                        ));
                    }
                    let start = output.len() - GROUP_BYTES;
                    output.reserve(count * GROUP_BYTES);
                    for _ in 0..count {
                        output.extend_from_within(start..start + GROUP_BYTES);
                    }
                    stats.repeats += 1;
                    stats.repeated_groups += count;
                }
                OP_ZEROS => {
                    output.extend_from_slice(&[0u8; GROUP_BYTES]);
                    stats.zeros += 1;
                }
                OP_SHORT_DATA if self.options.allow_short_data => {
                    let len = reader.read_bits(SHORT_DATA_BITS)? as usize;
                    for _ in 0..len {
                        output.push(reader.read_bits(8)? as u8);
                    }
                    stats.short_data = true;
                }
                OP_END => return Ok(()),
                _ => {
                    let Some(ops) = row(code) else {
                        tracing::trace!(code, bit_position = position, "bad template");
                        return Err(Sw842Error::InvalidTemplate { code, position });
                    };
                    stats.templates += 1;
                    self.execute_row(reader, output, ops, stats)?;
                }
            }
        }
    }

    /// Execute the four ops of a template row in order.
    fn execute_row(
        &self,
        reader: &mut MsbBitReader<'_>,
        output: &mut Vec<u8>,
        ops: &Row,
        stats: &mut BlockStats,
    ) -> Result<()> {
        for op in ops {
            match *op {
                Op::Noop => {}
                Op::Data(Width::W2) => output.extend_from_slice(&reader.read_bytes::<2>()?),
                Op::Data(Width::W4) => output.extend_from_slice(&reader.read_bytes::<4>()?),
                Op::Data(Width::W8) => output.extend_from_slice(&reader.read_bytes::<8>()?),
                Op::Index(width) => {
                    let index = reader.read_bits(width.index_bits())? as usize;
                    let ring = RingIndex::for_width(width);
                    let Some(offset) = ring.resolve(index, output.len()) else {
                        return Err(Sw842Error::corrupt(
                            reader.bits_read(),
                            format!(
                                "I{} index {} points past {} bytes of output",
                                width.bytes(),
                                index,
                                output.len()
                            ),
                        ));
                    };
                    output.extend_from_within(offset..offset + width.bytes());
                    stats.index_ops += 1;
                }
            }
        }
        Ok(())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(BlockOptions::default())
    }
}

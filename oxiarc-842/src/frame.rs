//! Multi-block frame container.
//!
//! A single 842 block has no length field and no way to say "stored
//! uncompressed". The frame adds both so arbitrary input can be split into
//! fixed-size blocks and restored without out-of-band configuration.
//!
//! ```text
//! magic        4 bytes  "842F"
//! version      1 byte   1
//! flags        1 byte   bit0 short data, bit1 crc, bits 2..3 alignment
//! block_log2   1 byte   9..=24
//! reserved     1 byte   0
//! content_size 8 bytes  u64 LE
//! blocks       [len: u32 LE][payload]*   bit 31 of len: stored raw
//! end marker   u32 0
//! ```
//!
//! Blocks are independent, so with the `parallel` feature they are
//! compressed and decompressed on the rayon thread pool. Output is
//! byte-identical to the sequential path.

use crate::config::{Alignment, BlockOptions};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Result, Sw842Error};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Frame magic bytes.
pub const FRAME_MAGIC: [u8; 4] = *b"842F";

/// Current frame format version.
pub const FRAME_VERSION: u8 = 1;

/// Size of the fixed frame header.
pub const FRAME_HEADER_SIZE: usize = 16;

/// Default block size: one 4 KiB page.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Smallest allowed block size, as a power of two.
pub const MIN_BLOCK_LOG2: u8 = 9;

/// Largest allowed block size, as a power of two.
pub const MAX_BLOCK_LOG2: u8 = 24;

const FLAG_SHORT_DATA: u8 = 0x01;
const FLAG_CRC: u8 = 0x02;
const FLAG_ALIGNMENT_SHIFT: u8 = 2;
const FLAG_ALIGNMENT_MASK: u8 = 0x0C;
const FLAG_RESERVED_MASK: u8 = 0xF0;

const RAW_BLOCK_FLAG: u32 = 0x8000_0000;
const BLOCK_LEN_MASK: u32 = 0x7FFF_FFFF;

/// Frame compression options.
#[derive(Debug, Clone, Copy)]
pub struct FrameOptions {
    /// Options applied to every block.
    pub block: BlockOptions,
    /// Uncompressed bytes per block (power of two, 512 B to 16 MiB).
    pub block_size: usize,
}

impl FrameOptions {
    /// Default options: software blocks of 4 KiB.
    pub fn new() -> Self {
        Self {
            block: BlockOptions::default(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Set the per-block options.
    pub fn with_block_options(mut self, block: BlockOptions) -> Self {
        self.block = block;
        self
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    fn block_log2(&self) -> Result<u8> {
        let size = self.block_size;
        let log2 = size.trailing_zeros();
        if !size.is_power_of_two()
            || log2 < u32::from(MIN_BLOCK_LOG2)
            || log2 > u32::from(MAX_BLOCK_LOG2)
        {
            return Err(Sw842Error::invalid_frame(format!(
                "block size {} is not a power of two between {} and {}",
                size,
                1usize << MIN_BLOCK_LOG2,
                1usize << MAX_BLOCK_LOG2
            )));
        }
        Ok(log2 as u8)
    }
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Blocks may end with a SHORT_DATA template.
    pub short_data: bool,
    /// Blocks carry a checksum trailer.
    pub crc: bool,
    /// Block padding boundary.
    pub alignment: Alignment,
    /// Uncompressed bytes per block.
    pub block_size: usize,
    /// Total uncompressed size.
    pub content_size: u64,
}

impl FrameHeader {
    fn for_input(options: &FrameOptions, content_size: u64) -> Result<(Self, u8)> {
        let log2 = options.block_log2()?;
        let header = Self {
            short_data: options.block.allow_short_data,
            crc: options.block.crc,
            alignment: options.block.alignment,
            block_size: options.block_size,
            content_size,
        };
        Ok((header, log2))
    }

    /// Parse the header at the start of `input`.
    pub fn parse(input: &[u8]) -> Result<Self> {
        let Some(header) = input.get(..FRAME_HEADER_SIZE) else {
            return Err(Sw842Error::invalid_frame(format!(
                "header needs {} bytes, got {}",
                FRAME_HEADER_SIZE,
                input.len()
            )));
        };

        if header[0..4] != FRAME_MAGIC {
            return Err(Sw842Error::invalid_frame("bad magic"));
        }
        if header[4] != FRAME_VERSION {
            return Err(Sw842Error::invalid_frame(format!(
                "unsupported version {}",
                header[4]
            )));
        }

        let flags = header[5];
        if flags & FLAG_RESERVED_MASK != 0 {
            return Err(Sw842Error::invalid_frame(format!(
                "reserved flag bits set: {:#04x}",
                flags
            )));
        }
        let alignment =
            Alignment::from_bits((flags & FLAG_ALIGNMENT_MASK) >> FLAG_ALIGNMENT_SHIFT)?;

        let log2 = header[6];
        if !(MIN_BLOCK_LOG2..=MAX_BLOCK_LOG2).contains(&log2) {
            return Err(Sw842Error::invalid_frame(format!(
                "block size exponent {} out of range",
                log2
            )));
        }
        if header[7] != 0 {
            return Err(Sw842Error::invalid_frame("reserved header byte is not zero"));
        }

        let mut size = [0u8; 8];
        size.copy_from_slice(&header[8..16]);

        Ok(Self {
            short_data: flags & FLAG_SHORT_DATA != 0,
            crc: flags & FLAG_CRC != 0,
            alignment,
            block_size: 1usize << log2,
            content_size: u64::from_le_bytes(size),
        })
    }

    fn write(&self, log2: u8, output: &mut Vec<u8>) {
        let mut flags = self.alignment.to_bits() << FLAG_ALIGNMENT_SHIFT;
        if self.short_data {
            flags |= FLAG_SHORT_DATA;
        }
        if self.crc {
            flags |= FLAG_CRC;
        }

        output.extend_from_slice(&FRAME_MAGIC);
        output.push(FRAME_VERSION);
        output.push(flags);
        output.push(log2);
        output.push(0);
        output.extend_from_slice(&self.content_size.to_le_bytes());
    }

    /// Block options recorded in this header, with the default checksum.
    pub fn block_options(&self) -> BlockOptions {
        BlockOptions::default()
            .with_short_data(self.short_data)
            .with_crc(self.crc)
            .with_alignment(self.alignment)
    }
}

/// One block as stored in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBlock<'a> {
    /// Payload is the uncompressed input.
    pub raw: bool,
    /// Stored bytes.
    pub payload: &'a [u8],
}

/// Parse a frame into its header and block list without decoding blocks.
pub fn frame_blocks(input: &[u8]) -> Result<(FrameHeader, Vec<FrameBlock<'_>>)> {
    let header = FrameHeader::parse(input)?;
    let mut blocks = Vec::new();
    let mut pos = FRAME_HEADER_SIZE;

    loop {
        let Some(len_bytes) = input.get(pos..pos + 4) else {
            return Err(Sw842Error::invalid_frame("missing end marker"));
        };
        let mut word = [0u8; 4];
        word.copy_from_slice(len_bytes);
        let word = u32::from_le_bytes(word);
        pos += 4;

        if word == 0 {
            break;
        }

        let raw = word & RAW_BLOCK_FLAG != 0;
        let len = (word & BLOCK_LEN_MASK) as usize;
        if len == 0 {
            return Err(Sw842Error::invalid_frame(format!(
                "empty block at offset {}",
                pos - 4
            )));
        }
        if raw && len > header.block_size {
            return Err(Sw842Error::invalid_frame(format!(
                "raw block of {} bytes exceeds block size {}",
                len, header.block_size
            )));
        }

        let Some(payload) = input.get(pos..pos + len) else {
            return Err(Sw842Error::invalid_frame(format!(
                "block at offset {} needs {} bytes, {} left",
                pos - 4,
                len,
                input.len() - pos
            )));
        };
        blocks.push(FrameBlock { raw, payload });
        pos += len;
    }

    if pos != input.len() {
        return Err(Sw842Error::invalid_frame(format!(
            "{} trailing bytes after end marker",
            input.len() - pos
        )));
    }

    Ok((header, blocks))
}

/// Compress one block, falling back to raw storage when it does not shrink.
fn compress_block(chunk: &[u8], options: &BlockOptions) -> Result<(bool, Vec<u8>)> {
    let compressed = Encoder::new(*options).encode_block(chunk)?;
    if compressed.len() >= chunk.len() {
        tracing::debug!(
            input = chunk.len(),
            compressed = compressed.len(),
            "block does not shrink, storing raw"
        );
        return Ok((true, chunk.to_vec()));
    }
    Ok((false, compressed))
}

fn write_block(output: &mut Vec<u8>, raw: bool, payload: &[u8]) {
    let mut word = payload.len() as u32;
    if raw {
        word |= RAW_BLOCK_FLAG;
    }
    output.extend_from_slice(&word.to_le_bytes());
    output.extend_from_slice(payload);
}

fn decompress_block(block: &FrameBlock<'_>, decoder: &Decoder) -> Result<Vec<u8>> {
    if block.raw {
        Ok(block.payload.to_vec())
    } else {
        decoder.decode_block(block.payload)
    }
}

/// Block lengths a frame header implies.
///
/// Every block but the last decodes to `block_size` bytes and the last one
/// to the remainder of `content_size`. The layout is checked against the
/// block count before anything is decoded, so a header cannot claim more
/// content than its blocks can hold.
#[derive(Debug, Clone)]
pub struct BlockLayout {
    block_size: usize,
    content_size: usize,
    covered: usize,
    next: usize,
}

impl BlockLayout {
    /// Layout for a frame with `block_count` blocks.
    pub fn new(header: &FrameHeader, block_count: usize) -> Result<Self> {
        let capacity = block_count.saturating_mul(header.block_size);
        let content_size = usize::try_from(header.content_size)
            .ok()
            .filter(|&size| size <= capacity)
            .ok_or_else(|| {
                Sw842Error::invalid_frame(format!(
                    "header says {} bytes, {} blocks of {} hold at most {}",
                    header.content_size, block_count, header.block_size, capacity
                ))
            })?;

        Ok(Self {
            block_size: header.block_size,
            content_size,
            covered: 0,
            next: 0,
        })
    }

    /// Total uncompressed size.
    pub fn content_size(&self) -> usize {
        self.content_size
    }

    /// Length the next block must decode to.
    pub fn expected(&self) -> usize {
        self.block_size.min(self.content_size - self.covered)
    }

    /// Check the next block's decoded length and move past it.
    pub fn accept(&mut self, len: usize) -> Result<()> {
        let expected = self.skip();
        if len != expected {
            return Err(Sw842Error::invalid_frame(format!(
                "block {} decoded to {} bytes, expected {}",
                self.next - 1,
                len,
                expected
            )));
        }
        Ok(())
    }

    /// Move past a block that could not be decoded. Returns its expected length.
    pub fn skip(&mut self) -> usize {
        let expected = self.expected();
        self.covered += expected;
        self.next += 1;
        expected
    }

    /// Check that the blocks seen so far cover the whole content.
    pub fn finish(&self) -> Result<()> {
        if self.covered != self.content_size {
            return Err(Sw842Error::invalid_frame(format!(
                "blocks cover {} bytes, header says {}",
                self.covered, self.content_size
            )));
        }
        Ok(())
    }
}

/// Append decoded blocks, checking each against the layout.
fn assemble(
    mut layout: BlockLayout,
    decoded: impl IntoIterator<Item = Result<Vec<u8>>>,
) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(layout.content_size());
    for block in decoded {
        let block = block?;
        layout.accept(block.len())?;
        output.extend_from_slice(&block);
    }

    layout.finish()?;
    Ok(output)
}

/// Compress `input` into a frame.
///
/// Each block is compressed with `options.block`. A block that does not
/// shrink is stored raw. With short data disabled, input whose length is
/// not a multiple of 8 fails with `UnsupportedLength`.
pub fn compress_frame(input: &[u8], options: &FrameOptions) -> Result<Vec<u8>> {
    compress_frame_with(input, options, |_| {})
}

/// Compress `input` into a frame, calling `on_block` with the uncompressed
/// length of each block once it has been written.
pub fn compress_frame_with<F>(
    input: &[u8],
    options: &FrameOptions,
    mut on_block: F,
) -> Result<Vec<u8>>
where
    F: FnMut(usize),
{
    let (header, log2) = FrameHeader::for_input(options, input.len() as u64)?;

    let mut output = Vec::with_capacity(FRAME_HEADER_SIZE + input.len() + 4);
    header.write(log2, &mut output);

    for chunk in input.chunks(options.block_size) {
        let (raw, payload) = compress_block(chunk, &options.block)?;
        write_block(&mut output, raw, &payload);
        on_block(chunk.len());
    }

    output.extend_from_slice(&0u32.to_le_bytes());
    Ok(output)
}

/// Compress `input` into a frame, compressing blocks in parallel.
///
/// Produces the same bytes as [`compress_frame`].
#[cfg(feature = "parallel")]
pub fn compress_frame_parallel(input: &[u8], options: &FrameOptions) -> Result<Vec<u8>> {
    let (header, log2) = FrameHeader::for_input(options, input.len() as u64)?;

    let chunks: Vec<&[u8]> = input.chunks(options.block_size).collect();
    let compressed: Vec<Result<(bool, Vec<u8>)>> = chunks
        .par_iter()
        .map(|chunk| compress_block(chunk, &options.block))
        .collect();

    let mut output = Vec::with_capacity(FRAME_HEADER_SIZE + input.len() + 4);
    header.write(log2, &mut output);
    for result in compressed {
        let (raw, payload) = result?;
        write_block(&mut output, raw, &payload);
    }

    output.extend_from_slice(&0u32.to_le_bytes());
    Ok(output)
}

/// Decompress a frame.
///
/// Blocks are verified with the default checksum when the header says they
/// carry one.
pub fn decompress_frame(input: &[u8]) -> Result<Vec<u8>> {
    let (header, blocks) = frame_blocks(input)?;
    let layout = BlockLayout::new(&header, blocks.len())?;
    let decoder = Decoder::new(header.block_options());
    assemble(
        layout,
        blocks.iter().map(|block| decompress_block(block, &decoder)),
    )
}

/// Decompress a frame, decoding blocks in parallel.
#[cfg(feature = "parallel")]
pub fn decompress_frame_parallel(input: &[u8]) -> Result<Vec<u8>> {
    let (header, blocks) = frame_blocks(input)?;
    let layout = BlockLayout::new(&header, blocks.len())?;
    let decoder = Decoder::new(header.block_options());
    let decoded: Vec<Result<Vec<u8>>> = blocks
        .par_iter()
        .map(|block| decompress_block(block, &decoder))
        .collect();
    assemble(layout, decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        b"The quick brown fox jumps over the lazy dog. "
            .iter()
            .cycle()
            .take(len)
            .copied()
            .collect()
    }

    #[test]
    fn test_frame_roundtrip() {
        let original = sample(10_000);
        let frame = compress_frame(&original, &FrameOptions::default()).unwrap();
        assert!(frame.len() < original.len());
        assert_eq!(decompress_frame(&frame).unwrap(), original);
    }

    #[test]
    fn test_progress_callback_sees_every_block() {
        let original = sample(5000);
        let mut seen = Vec::new();
        let frame = compress_frame_with(&original, &FrameOptions::default(), |len| seen.push(len))
            .unwrap();
        assert_eq!(seen, vec![4096, 904]);
        assert_eq!(frame, compress_frame(&original, &FrameOptions::default()).unwrap());
    }

    #[test]
    fn test_frame_empty() {
        let frame = compress_frame(&[], &FrameOptions::default()).unwrap();
        assert_eq!(frame.len(), FRAME_HEADER_SIZE + 4);
        assert!(decompress_frame(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_frame_header_fields() {
        let options = FrameOptions::new()
            .with_block_size(1024)
            .with_block_options(
                BlockOptions::HARDWARE
                    .with_crc(false)
                    .with_alignment(Alignment::Bytes32),
            );
        let frame = compress_frame(&sample(2048), &options).unwrap();
        let header = FrameHeader::parse(&frame).unwrap();

        assert_eq!(&frame[..4], b"842F");
        assert!(!header.short_data);
        assert!(!header.crc);
        assert_eq!(header.alignment, Alignment::Bytes32);
        assert_eq!(header.block_size, 1024);
        assert_eq!(header.content_size, 2048);
        assert_eq!(frame[6], 10);
    }

    #[test]
    fn test_incompressible_block_stored_raw() {
        let mut state = 0x1234_5678u32;
        let original: Vec<u8> = (0..600)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();

        let options = FrameOptions::new().with_block_size(512);
        let frame = compress_frame(&original, &options).unwrap();
        let (_, blocks) = frame_blocks(&frame).unwrap();

        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].raw);
        assert_eq!(blocks[0].payload, &original[..512]);
        assert_eq!(decompress_frame(&frame).unwrap(), original);
    }

    #[test]
    fn test_invalid_block_size() {
        for size in [0, 100, 256, 1000, 1 << 25] {
            let options = FrameOptions::new().with_block_size(size);
            assert!(matches!(
                compress_frame(b"data", &options),
                Err(Sw842Error::InvalidFrame { .. })
            ));
        }
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut frame = compress_frame(&sample(100), &FrameOptions::default()).unwrap();
        frame[0] = b'X';
        assert!(matches!(
            decompress_frame(&frame),
            Err(Sw842Error::InvalidFrame { .. })
        ));

        let mut frame = compress_frame(&sample(100), &FrameOptions::default()).unwrap();
        frame[4] = 2;
        assert!(matches!(
            decompress_frame(&frame),
            Err(Sw842Error::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_truncated_frame() {
        let frame = compress_frame(&sample(5000), &FrameOptions::default()).unwrap();
        for cut in [0, 8, FRAME_HEADER_SIZE, FRAME_HEADER_SIZE + 2, frame.len() - 1] {
            assert!(matches!(
                decompress_frame(&frame[..cut]),
                Err(Sw842Error::InvalidFrame { .. })
            ));
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut frame = compress_frame(&sample(100), &FrameOptions::default()).unwrap();
        frame.push(0);
        assert!(matches!(
            decompress_frame(&frame),
            Err(Sw842Error::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_content_size_mismatch() {
        let mut frame = compress_frame(&sample(100), &FrameOptions::default()).unwrap();
        frame[8] = 99;
        assert!(matches!(
            decompress_frame(&frame),
            Err(Sw842Error::InvalidFrame { .. })
        ));
    }

    /// Frame with the default header for `content_size` and the given blocks.
    fn frame_with_blocks(content_size: u64, blocks: &[&[u8]]) -> Vec<u8> {
        let (header, log2) =
            FrameHeader::for_input(&FrameOptions::default(), content_size).unwrap();
        let mut frame = Vec::new();
        header.write(log2, &mut frame);
        let encoder = Encoder::new(BlockOptions::default());
        for block in blocks {
            write_block(&mut frame, false, &encoder.encode_block(block).unwrap());
        }
        frame.extend_from_slice(&0u32.to_le_bytes());
        frame
    }

    #[test]
    fn test_content_size_beyond_blocks_rejected() {
        let frame = frame_with_blocks(1 << 40, &[]);
        assert_eq!(frame.len(), FRAME_HEADER_SIZE + 4);
        assert!(matches!(
            decompress_frame(&frame),
            Err(Sw842Error::InvalidFrame { .. })
        ));

        let frame = frame_with_blocks(4097, &[&sample(4096)]);
        let (header, blocks) = frame_blocks(&frame).unwrap();
        assert!(BlockLayout::new(&header, blocks.len()).is_err());
        assert!(matches!(
            decompress_frame(&frame),
            Err(Sw842Error::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_short_leading_block_rejected() {
        let data = sample(4096);
        let frame = frame_with_blocks(4096, &[&data[..100], &data[100..]]);
        let (header, blocks) = frame_blocks(&frame).unwrap();
        assert_eq!(blocks.len(), 2);

        let mut layout = BlockLayout::new(&header, blocks.len()).unwrap();
        assert_eq!(layout.expected(), 4096);
        assert!(layout.accept(100).is_err());
        assert_eq!(layout.expected(), 0);
        assert!(matches!(
            decompress_frame(&frame),
            Err(Sw842Error::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_block_layout_tracks_remainder() {
        let header = FrameHeader::parse(
            &compress_frame(&sample(5000), &FrameOptions::default()).unwrap(),
        )
        .unwrap();
        let mut layout = BlockLayout::new(&header, 2).unwrap();
        assert_eq!(layout.content_size(), 5000);
        assert!(layout.finish().is_err());

        assert_eq!(layout.skip(), 4096);
        assert_eq!(layout.expected(), 904);
        layout.accept(904).unwrap();
        layout.finish().unwrap();
        assert!(layout.accept(1).is_err());
    }

    #[test]
    fn test_corrupt_block_propagates() {
        let original = sample(4096);
        let mut frame = compress_frame(&original, &FrameOptions::default()).unwrap();
        // First byte of the first payload: the D8 literal of group 0.
        frame[FRAME_HEADER_SIZE + 4 + 1] ^= 0x01;
        assert!(matches!(
            decompress_frame(&frame),
            Err(Sw842Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_unsupported_length_without_short_data() {
        let options = FrameOptions::new().with_block_options(BlockOptions::HARDWARE);
        assert_eq!(
            compress_frame(&sample(4100), &options),
            Err(Sw842Error::UnsupportedLength { length: 4 })
        );
        assert!(compress_frame(&sample(4104), &options).is_ok());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let original = sample(50_000);
        let options = FrameOptions::new().with_block_size(1024);
        let sequential = compress_frame(&original, &options).unwrap();
        let parallel = compress_frame_parallel(&original, &options).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(decompress_frame_parallel(&parallel).unwrap(), original);
    }
}

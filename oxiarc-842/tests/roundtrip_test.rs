//! 842 round-trip integration tests.

use oxiarc_842::{
    Alignment, BlockOptions, FrameOptions, Sw842Error, compress, compress_frame, decompress,
    decompress_frame, max_compressed_len,
};

/// Deterministic pseudo-random bytes (xorshift32).
fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

/// Text-like data with plenty of 2, 4 and 8 byte repeats.
fn text(len: usize) -> Vec<u8> {
    b"Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod. "
        .iter()
        .cycle()
        .take(len)
        .copied()
        .collect()
}

fn roundtrip(original: &[u8], options: &BlockOptions) -> Vec<u8> {
    let compressed = compress(original, options).expect("compression failed");
    let decompressed = decompress(&compressed, options).expect("decompression failed");
    assert_eq!(decompressed, original, "round trip of {} bytes", original.len());
    compressed
}

#[test]
fn test_roundtrip_edge_lengths() {
    let options = BlockOptions::default();
    for len in [0usize, 1, 7, 8, 9, 15, 16, 17, 63, 64, 65] {
        roundtrip(&noise(len, 0x9E37_79B9), &options);
        roundtrip(&text(len), &options);
    }
}

#[test]
fn test_roundtrip_every_remainder() {
    let options = BlockOptions::default();
    for k in [0usize, 1, 5, 100] {
        for r in 0..8 {
            roundtrip(&text(k * 8 + r), &options);
        }
    }
}

#[test]
fn test_roundtrip_all_options() {
    let original = text(3000);
    for alignment in [Alignment::Bytes8, Alignment::Bytes16, Alignment::Bytes32] {
        for crc in [false, true] {
            let options = BlockOptions::default()
                .with_alignment(alignment)
                .with_crc(crc);
            let compressed = roundtrip(&original, &options);
            let trailer = if crc { 4 } else { 0 };
            assert_eq!((compressed.len() - trailer) % alignment.bytes(), 0);
        }
    }
}

#[test]
fn test_roundtrip_hardware_options() {
    let options = BlockOptions::HARDWARE;
    roundtrip(&text(4096), &options);
    roundtrip(&noise(4096, 7), &options);
    roundtrip(&[], &options);
}

#[test]
fn test_unsupported_length_without_short_data() {
    let options = BlockOptions::default().with_short_data(false);
    for len in [1usize, 7, 9, 4095] {
        assert_eq!(
            compress(&text(len), &options),
            Err(Sw842Error::UnsupportedLength { length: len })
        );
    }
}

#[test]
fn test_deterministic_output() {
    let original = text(8192);
    let options = BlockOptions::default().with_alignment(Alignment::Bytes16);
    let first = compress(&original, &options).expect("compression failed");
    let second = compress(&original, &options).expect("compression failed");
    assert_eq!(first, second);
}

#[test]
fn test_zeros_and_runs() {
    let mut original = vec![0u8; 4096];
    original.extend_from_slice(&[0xAB; 1024]);
    original.extend_from_slice(&text(512));
    original.extend_from_slice(&[0u8; 8]);

    let compressed = roundtrip(&original, &BlockOptions::default());
    assert!(compressed.len() < original.len() / 10);
}

#[test]
fn test_noise_stays_within_bound() {
    let options = BlockOptions::default();
    for len in [8usize, 100, 4096, 65536] {
        let original = noise(len, len as u32 | 1);
        let compressed = roundtrip(&original, &options);
        assert!(compressed.len() <= max_compressed_len(len, &options));
    }
}

#[test]
fn test_large_block_with_ring_wraparound() {
    // Several times the widest ring window, mixing repeats and fresh data.
    let mut original = Vec::new();
    for i in 0..64u32 {
        original.extend_from_slice(&text(700));
        original.extend_from_slice(&noise(300, i + 1));
    }

    let compressed = roundtrip(&original, &BlockOptions::default());
    println!(
        "Mixed data: {} -> {} bytes ({:.2}%)",
        original.len(),
        compressed.len(),
        compressed.len() as f64 / original.len() as f64 * 100.0
    );
    assert!(compressed.len() < original.len());
}

#[test]
fn test_structured_records() {
    // Fixed-width records whose fields repeat at 2, 4 and 8 byte granularity.
    let mut original = Vec::new();
    for i in 0..2048u32 {
        original.extend_from_slice(&(i % 17).to_be_bytes());
        original.extend_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
        original.extend_from_slice(&((i % 5) as u16).to_be_bytes());
        original.extend_from_slice(&[0x42; 6]);
    }

    let compressed = roundtrip(&original, &BlockOptions::default());
    assert!(compressed.len() < original.len() / 3);
}

#[test]
fn test_frame_roundtrip_sizes() {
    let options = FrameOptions::default();
    for len in [0usize, 1, 4095, 4096, 4097, 100_000] {
        let original = text(len);
        let frame = compress_frame(&original, &options).expect("compression failed");
        let decompressed = decompress_frame(&frame).expect("decompression failed");
        assert_eq!(decompressed, original);
    }
}

#[test]
fn test_frame_roundtrip_noise() {
    let original = noise(20_000, 42);
    let options = FrameOptions::new().with_block_size(1024);
    let frame = compress_frame(&original, &options).expect("compression failed");

    // Raw fallback bounds the expansion to the per-block length words.
    let blocks = original.len().div_ceil(1024);
    assert!(frame.len() <= 16 + original.len() + 4 * blocks + 4);
    assert_eq!(decompress_frame(&frame).expect("decompression failed"), original);
}

#[test]
fn test_frame_options_travel_in_header() {
    let original = text(10_000);
    let options = FrameOptions::new().with_block_options(
        BlockOptions::default()
            .with_crc(false)
            .with_alignment(Alignment::Bytes32),
    );
    let frame = compress_frame(&original, &options).expect("compression failed");
    assert_eq!(decompress_frame(&frame).expect("decompression failed"), original);
}

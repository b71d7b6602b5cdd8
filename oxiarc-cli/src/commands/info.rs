//! Info command implementation.

use crate::utils::space_savings;
use oxiarc_842::frame::{FrameBlock, FrameHeader, frame_blocks};
use oxiarc_842::{BlockStats, Decoder};
use serde::Serialize;
use std::path::Path;

/// JSON serializable per-block statistics.
#[derive(Debug, Serialize)]
struct BlockJson {
    index: usize,
    raw: bool,
    stored_size: usize,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    templates: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_ops: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeats: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    zeros: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_data: Option<bool>,
}

impl BlockJson {
    fn new(index: usize, block: &FrameBlock<'_>, size: usize, stats: Option<BlockStats>) -> Self {
        Self {
            index,
            raw: block.raw,
            stored_size: block.payload.len(),
            size,
            templates: stats.map(|s| s.templates),
            index_ops: stats.map(|s| s.index_ops),
            repeats: stats.map(|s| s.repeats),
            zeros: stats.map(|s| s.zeros),
            short_data: stats.map(|s| s.short_data),
        }
    }
}

/// JSON output for frame information.
#[derive(Debug, Serialize)]
struct FrameJson {
    file: String,
    file_size: u64,
    content_size: u64,
    block_size: usize,
    alignment: usize,
    crc: bool,
    short_data: bool,
    ratio: f64,
    blocks: Vec<BlockJson>,
}

fn describe_blocks(
    header: &FrameHeader,
    blocks: &[FrameBlock<'_>],
) -> Result<Vec<BlockJson>, Box<dyn std::error::Error>> {
    let decoder = Decoder::new(header.block_options());
    let mut described = Vec::with_capacity(blocks.len());

    for (i, block) in blocks.iter().enumerate() {
        if block.raw {
            described.push(BlockJson::new(i, block, block.payload.len(), None));
            continue;
        }
        let (data, stats) = decoder
            .decode_block_with_stats(block.payload)
            .map_err(|e| format!("block {}: {}", i, e))?;
        described.push(BlockJson::new(i, block, data.len(), Some(stats)));
    }

    Ok(described)
}

pub fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let frame = std::fs::read(input)?;
    let (header, blocks) = frame_blocks(&frame)?;
    let described = describe_blocks(&header, &blocks)?;
    let ratio = space_savings(header.content_size, frame.len() as u64);

    if json {
        let output = FrameJson {
            file: input.display().to_string(),
            file_size: frame.len() as u64,
            content_size: header.content_size,
            block_size: header.block_size,
            alignment: header.alignment.bytes(),
            crc: header.crc,
            short_data: header.short_data,
            ratio,
            blocks: described,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("842 Frame Information");
    println!("=====================");
    println!("File: {}", input.display());
    println!("Size: {} bytes", frame.len());
    println!("Content size: {} bytes", header.content_size);
    println!("Block size: {} bytes", header.block_size);
    println!("Alignment: {} bytes", header.alignment.bytes());
    println!("CRC: {}", if header.crc { "yes" } else { "no" });
    println!("Short data: {}", if header.short_data { "yes" } else { "no" });
    println!("Space savings: {:.1}%", ratio);
    println!();

    println!(
        "{:>6} {:>4} {:>10} {:>10} {:>9} {:>7} {:>7} {:>6}",
        "Block", "Raw", "Stored", "Size", "Templates", "Index", "Repeat", "Zeros"
    );
    println!("{}", "-".repeat(66));
    for block in &described {
        println!(
            "{:>6} {:>4} {:>10} {:>10} {:>9} {:>7} {:>7} {:>6}",
            block.index,
            if block.raw { "yes" } else { "" },
            block.stored_size,
            block.size,
            block.templates.map_or("-".to_string(), |n| n.to_string()),
            block.index_ops.map_or("-".to_string(), |n| n.to_string()),
            block.repeats.map_or("-".to_string(), |n| n.to_string()),
            block.zeros.map_or("-".to_string(), |n| n.to_string()),
        );
    }

    let raw = described.iter().filter(|b| b.raw).count();
    println!("{}", "-".repeat(66));
    println!("{} blocks, {} stored raw", described.len(), raw);
    Ok(())
}

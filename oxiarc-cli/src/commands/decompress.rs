//! Decompress command implementation.

use crate::utils::{confirm_overwrite, decompressed_path, preserve_mtime};
use oxiarc_842::{decompress_frame, decompress_frame_parallel};
use std::path::Path;

pub fn cmd_decompress(
    input: &Path,
    output: Option<&Path>,
    parallel: bool,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.map_or_else(|| decompressed_path(input), Path::to_path_buf);
    confirm_overwrite(&output, force)?;

    let frame = std::fs::read(input)?;
    let data = if parallel {
        decompress_frame_parallel(&frame)?
    } else {
        decompress_frame(&frame)?
    };

    std::fs::write(&output, &data)?;
    preserve_mtime(input, &output)?;

    println!(
        "{} -> {} ({} -> {} bytes)",
        input.display(),
        output.display(),
        frame.len(),
        data.len()
    );
    Ok(())
}

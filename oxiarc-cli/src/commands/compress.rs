//! Compress command implementation.

use crate::utils::{
    compressed_path, confirm_overwrite, create_progress_bar, preserve_mtime, space_savings,
};
use oxiarc_842::{
    Alignment, BlockOptions, FrameOptions, compress_frame_parallel, compress_frame_with,
};
use std::path::Path;

/// Options for the compress command.
pub struct CompressOptions {
    pub block_size: usize,
    pub alignment: Alignment,
    pub crc: bool,
    pub short_data: bool,
    pub parallel: bool,
    pub progress: bool,
    pub force: bool,
}

impl CompressOptions {
    fn frame_options(&self) -> FrameOptions {
        let block = BlockOptions::default()
            .with_alignment(self.alignment)
            .with_crc(self.crc)
            .with_short_data(self.short_data);
        FrameOptions::new()
            .with_block_options(block)
            .with_block_size(self.block_size)
    }
}

pub fn cmd_compress(
    input: &Path,
    output: Option<&Path>,
    options: &CompressOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.map_or_else(|| compressed_path(input), Path::to_path_buf);
    confirm_overwrite(&output, options.force)?;

    let data = std::fs::read(input)?;
    let frame_options = options.frame_options();
    tracing::debug!(
        input = %input.display(),
        bytes = data.len(),
        block_size = options.block_size,
        parallel = options.parallel,
        "compressing"
    );

    let pb = create_progress_bar(data.len() as u64, options.progress);
    let frame = if options.parallel {
        let frame = compress_frame_parallel(&data, &frame_options)?;
        pb.inc(data.len() as u64);
        frame
    } else {
        compress_frame_with(&data, &frame_options, |len| pb.inc(len as u64))?
    };
    pb.finish_and_clear();

    std::fs::write(&output, &frame)?;
    preserve_mtime(input, &output)?;

    println!(
        "{} -> {} ({} -> {} bytes, {:.1}% saved)",
        input.display(),
        output.display(),
        data.len(),
        frame.len(),
        space_savings(data.len() as u64, frame.len() as u64)
    );
    Ok(())
}

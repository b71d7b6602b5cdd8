//! Utility functions for the CLI.

use dialoguer::Confirm;
use filetime::FileTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Extension used for 842 frame files.
pub const FRAME_EXTENSION: &str = "842";

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
    {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb
}

/// `<input>.842`
pub fn compressed_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(FRAME_EXTENSION);
    PathBuf::from(name)
}

/// `<input>` without `.842`, or `<input>.out` if it has another extension.
pub fn decompressed_path(input: &Path) -> PathBuf {
    if input.extension().is_some_and(|ext| ext == FRAME_EXTENSION) {
        return input.with_extension("");
    }
    let mut name = OsString::from(input.as_os_str());
    name.push(".out");
    PathBuf::from(name)
}

/// Decide whether `output` may be written.
///
/// Existing files are only replaced with `--force` or after an interactive
/// confirmation.
pub fn confirm_overwrite(output: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if force || !output.exists() {
        return Ok(());
    }

    if !std::io::stdin().is_terminal() {
        return Err(format!("{} already exists (use --force)", output.display()).into());
    }

    let overwrite = Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", output.display()))
        .default(false)
        .interact()?;
    if overwrite {
        Ok(())
    } else {
        Err("aborted".into())
    }
}

/// Copy the modification time of `source` onto `target`.
pub fn preserve_mtime(source: &Path, target: &Path) -> std::io::Result<()> {
    let metadata = std::fs::metadata(source)?;
    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(target, mtime)
}

/// Space saved, as a percentage of `original`.
pub fn space_savings(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / original as f64) * 100.0
}

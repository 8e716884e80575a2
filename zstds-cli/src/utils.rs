//! Utility functions for the CLI.

use dialoguer::Confirm;
use filetime::FileTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use zstds_engine::Dictionary;

/// Suffix appended by `compress` and stripped by `decompress`.
pub const ZST_SUFFIX: &str = "zst";

/// Install the global tracing subscriber. `RUST_LOG` overrides the flags.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// `<file>.zst`
pub fn compressed_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(ZST_SUFFIX);
    PathBuf::from(name)
}

/// Input path without its `.zst` suffix, if it has one.
pub fn decompressed_path(input: &Path) -> Option<PathBuf> {
    match input.extension() {
        Some(ext) if ext == ZST_SUFFIX => Some(input.with_extension("")),
        _ => None,
    }
}

/// Decide whether `path` may be written.
///
/// Missing paths and `force` always pass. Otherwise the user is asked on an
/// interactive terminal; without one the file is skipped.
pub fn confirm_overwrite(path: &Path, force: bool) -> Result<bool, Box<dyn std::error::Error>> {
    if force || !path.exists() {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        warn!(path = %path.display(), "output exists, skipping (use --force to overwrite)");
        return Ok(false);
    }
    let answer = Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", path.display()))
        .default(false)
        .interact()?;
    Ok(answer)
}

/// Copy the modification time of `source` onto `destination`.
pub fn preserve_mtime(source: &Path, destination: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(destination, mtime)
}

/// Load a dictionary file for the option structs.
pub fn load_dictionary(
    path: Option<&Path>,
) -> Result<Option<Arc<Dictionary>>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let bytes = fs::read(path)?;
            Ok(Some(Arc::new(Dictionary::new(bytes)?)))
        }
        None => Ok(None),
    }
}

/// Format a byte count for human display.
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.1}G", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1}M", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1}K", size as f64 / KB as f64)
    } else {
        format!("{}", size)
    }
}

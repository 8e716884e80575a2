//! Train command implementation.

use crate::utils::{confirm_overwrite, format_size};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use zstds_engine::{Dictionary, TrainOptions};

pub fn cmd_train(
    samples: &[PathBuf],
    output: &Path,
    capacity: usize,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !confirm_overwrite(output, force)? {
        return Ok(());
    }

    let payloads = samples
        .iter()
        .map(fs::read)
        .collect::<Result<Vec<_>, _>>()?;
    let total: u64 = payloads.iter().map(|p| p.len() as u64).sum();
    info!(samples = payloads.len(), bytes = total, "training dictionary");

    let dictionary = Dictionary::train(&payloads, &TrainOptions { capacity })?;
    fs::write(output, dictionary.as_bytes())?;

    println!(
        "Trained {} ({}) from {} samples ({})",
        output.display(),
        format_size(dictionary.len() as u64),
        payloads.len(),
        format_size(total)
    );
    if let Some(id) = dictionary.id() {
        println!("Dictionary id: {}", id);
    }
    Ok(())
}

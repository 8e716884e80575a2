//! Compress command implementation.

use super::{FileJob, plan_jobs, run_jobs};
use crate::utils::{compressed_path, load_dictionary};
use std::fs;
use std::path::PathBuf;
use zstds_engine::CompressorOptions;
use zstds_stream::compress_file;

/// Arguments of `zstds compress`.
pub struct CompressRequest {
    pub files: Vec<PathBuf>,
    pub level: Option<i32>,
    pub long: bool,
    pub workers: Option<u32>,
    pub checksum: bool,
    pub dict: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub force: bool,
    pub progress: bool,
}

impl CompressRequest {
    /// Options from `--config`, overridden by explicit flags.
    pub fn options(&self) -> Result<CompressorOptions, Box<dyn std::error::Error>> {
        let mut options = match &self.config {
            Some(path) => serde_json::from_str::<CompressorOptions>(&fs::read_to_string(path)?)?,
            None => CompressorOptions::new(),
        };
        if let Some(level) = self.level {
            options.compression_level = Some(level);
        }
        if self.long {
            options.enable_long_distance_matching = Some(true);
        }
        if let Some(workers) = self.workers {
            options.nb_workers = Some(workers);
        }
        if self.checksum {
            options.checksum_flag = Some(true);
        }
        if let Some(dictionary) = load_dictionary(self.dict.as_deref())? {
            options.dictionary = Some(dictionary);
        }
        // Each file pledges its own size.
        options.pledged_size = None;
        options.validate()?;
        Ok(options)
    }
}

pub fn cmd_compress(request: &CompressRequest) -> Result<(), Box<dyn std::error::Error>> {
    let options = request.options()?;
    let jobs = plan_jobs(
        &request.files,
        request.output.as_deref(),
        request.force,
        |input| Some(compressed_path(input)),
    )?;

    run_jobs(&jobs, request.progress, "compressed", |job: &FileJob| {
        compress_file(&job.input, &job.output, &options)
    })
}

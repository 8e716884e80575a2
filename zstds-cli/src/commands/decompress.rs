//! Decompress command implementation.

use super::{FileJob, plan_jobs, run_jobs};
use crate::utils::{decompressed_path, load_dictionary};
use std::path::PathBuf;
use zstds_engine::DecompressorOptions;
use zstds_stream::decompress_file;

/// Arguments of `zstds decompress`.
pub struct DecompressRequest {
    pub files: Vec<PathBuf>,
    pub dict: Option<PathBuf>,
    pub window_log_max: Option<u32>,
    pub output: Option<PathBuf>,
    pub force: bool,
    pub progress: bool,
}

impl DecompressRequest {
    pub fn options(&self) -> Result<DecompressorOptions, Box<dyn std::error::Error>> {
        let options = DecompressorOptions {
            window_log_max: self.window_log_max,
            dictionary: load_dictionary(self.dict.as_deref())?,
            ..DecompressorOptions::default()
        };
        options.validate()?;
        Ok(options)
    }
}

pub fn cmd_decompress(request: &DecompressRequest) -> Result<(), Box<dyn std::error::Error>> {
    let options = request.options()?;
    let jobs = plan_jobs(
        &request.files,
        request.output.as_deref(),
        request.force,
        decompressed_path,
    )?;

    run_jobs(&jobs, request.progress, "decompressed", |job: &FileJob| {
        decompress_file(&job.input, &job.output, &options)
    })
}

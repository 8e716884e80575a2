//! Command implementations for zstds CLI.

pub mod completions;
pub mod compress;
pub mod decompress;
pub mod info;
pub mod train;

pub use completions::cmd_completions;
pub use compress::{CompressRequest, cmd_compress};
pub use decompress::{DecompressRequest, cmd_decompress};
pub use info::cmd_info;
pub use train::cmd_train;

use crate::utils::{confirm_overwrite, create_progress_bar, format_size, preserve_mtime};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One input file and where its result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Resolve output paths and ask about overwrites before any work starts.
///
/// Prompts happen here, on the main thread, so the parallel phase never
/// needs the terminal.
pub fn plan_jobs<F>(
    files: &[PathBuf],
    output: Option<&Path>,
    force: bool,
    derive_output: F,
) -> Result<Vec<FileJob>, Box<dyn std::error::Error>>
where
    F: Fn(&Path) -> Option<PathBuf>,
{
    if output.is_some() && files.len() > 1 {
        return Err("--output requires a single input file".into());
    }

    let mut jobs = Vec::with_capacity(files.len());
    for input in files {
        if !input.is_file() {
            return Err(format!("{}: not a regular file", input.display()).into());
        }
        let target = match output {
            Some(path) => path.to_path_buf(),
            None => derive_output(input).ok_or_else(|| {
                format!(
                    "{}: unknown suffix, use --output to name the result",
                    input.display()
                )
            })?,
        };
        if confirm_overwrite(&target, force)? {
            jobs.push(FileJob {
                input: input.clone(),
                output: target,
            });
        }
    }
    Ok(jobs)
}

/// Run `work` over every job in parallel.
///
/// Successful outputs inherit the input's modification time; failed
/// outputs are removed. Every failure is reported before returning.
pub fn run_jobs<F>(
    jobs: &[FileJob],
    progress: bool,
    verb: &str,
    work: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Fn(&FileJob) -> zstds_core::Result<u64> + Sync,
{
    let pb = create_progress_bar(jobs.len() as u64, progress);
    pb.set_message("files");

    let failures: Vec<String> = jobs
        .par_iter()
        .filter_map(|job| {
            let result = work(job).and_then(|bytes| {
                preserve_mtime(&job.input, &job.output)?;
                Ok(bytes)
            });
            pb.inc(1);
            match result {
                Ok(bytes) => {
                    let written = fs::metadata(&job.output).map(|m| m.len()).unwrap_or(0);
                    info!(
                        input = %job.input.display(),
                        output = %job.output.display(),
                        "{verb} {} -> {}",
                        format_size(bytes),
                        format_size(written)
                    );
                    None
                }
                Err(e) => {
                    if let Err(remove) = fs::remove_file(&job.output) {
                        debug!(output = %job.output.display(), %remove, "no partial output removed");
                    }
                    Some(format!("{}: {}", job.input.display(), e))
                }
            }
        })
        .collect();
    pb.finish_with_message("Done");

    if failures.is_empty() {
        return Ok(());
    }
    for failure in &failures {
        eprintln!("{}", failure);
    }
    Err(format!("{} of {} files failed", failures.len(), jobs.len()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::compressed_path;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("zstds-cli-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    #[test]
    fn test_output_requires_single_input() {
        let files = [PathBuf::from("a"), PathBuf::from("b")];
        let err = plan_jobs(&files, Some(Path::new("out")), true, |p| {
            Some(compressed_path(p))
        })
        .expect_err("rejected");
        assert!(err.to_string().contains("single input"));
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let dir = scratch("missing");
        let files = [dir.join("absent.txt")];
        assert!(plan_jobs(&files, None, true, |p| Some(compressed_path(p))).is_err());
    }

    #[test]
    fn test_parallel_jobs_round_trip() {
        let dir = scratch("jobs");
        let inputs: Vec<PathBuf> = (0..4)
            .map(|i| {
                let path = dir.join(format!("input{i}.txt"));
                fs::write(&path, format!("file {i} ").repeat(500)).expect("write input");
                path
            })
            .collect();

        let jobs = plan_jobs(&inputs, None, true, |p| Some(compressed_path(p))).expect("plan");
        assert_eq!(jobs.len(), 4);
        let options = zstds_engine::CompressorOptions::default();
        run_jobs(&jobs, false, "compressed", |job| {
            zstds_stream::compress_file(&job.input, &job.output, &options)
        })
        .expect("compress");

        for (i, job) in jobs.iter().enumerate() {
            let compressed = fs::read(&job.output).expect("read output");
            let decoded = zstds_stream::decompress(&compressed, &Default::default())
                .expect("decompress");
            assert_eq!(decoded, format!("file {i} ").repeat(500).into_bytes());
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failed_job_output_is_removed() {
        let dir = scratch("failed");
        let input = dir.join("not-zstd.zst");
        fs::write(&input, b"definitely not a frame").expect("write input");
        let jobs = [FileJob {
            input: input.clone(),
            output: dir.join("not-zstd"),
        }];
        let err = run_jobs(&jobs, false, "decompressed", |job| {
            zstds_stream::decompress_file(&job.input, &job.output, &Default::default())
        })
        .expect_err("corrupt input");
        assert!(err.to_string().contains("1 of 1"));
        assert!(!jobs[0].output.exists());
        fs::remove_dir_all(&dir).ok();
    }
}

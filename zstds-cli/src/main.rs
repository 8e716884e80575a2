//! zstds CLI - streaming Zstandard from the command line
//!
//! Compresses and decompresses files through the zstds buffered streams,
//! trains dictionaries, and inspects frame headers.

mod commands;
mod utils;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    CompressRequest, DecompressRequest, cmd_completions, cmd_compress, cmd_decompress, cmd_info,
    cmd_train,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zstds")]
#[command(
    author,
    version,
    about = "Streaming Zstandard compression on top of libzstd"
)]
#[command(long_about = "
zstds compresses and decompresses files with Zstandard, one buffered
stream per file. Multiple inputs are processed in parallel.

Examples:
  zstds compress access.log
  zstds compress -l 19 --checksum a.txt b.txt c.txt
  zstds compress -D logs.dict -o small.zst small.log
  zstds decompress access.log.zst
  zstds decompress --window-log-max 27 big.tar.zst
  zstds train samples/*.json -o json.dict
  zstds info access.log.zst --json
  zstds completions bash
")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress files into <file>.zst
    #[command(alias = "c")]
    Compress {
        /// Files to compress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Compression level
        #[arg(short, long, allow_negative_numbers = true)]
        level: Option<i32>,

        /// Enable long distance matching
        #[arg(long)]
        long: bool,

        /// Worker threads per file (0 compresses on the calling thread)
        #[arg(long)]
        workers: Option<u32>,

        /// Append a content checksum to each frame
        #[arg(long)]
        checksum: bool,

        /// Dictionary file
        #[arg(short = 'D', long)]
        dict: Option<PathBuf>,

        /// Compressor options as JSON; flags given here take precedence
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing outputs without asking
        #[arg(short, long)]
        force: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Decompress .zst files
    #[command(alias = "d", alias = "x")]
    Decompress {
        /// Files to decompress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Dictionary file
        #[arg(short = 'D', long)]
        dict: Option<PathBuf>,

        /// Largest window size log accepted from a frame
        #[arg(long)]
        window_log_max: Option<u32>,

        /// Output file (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing outputs without asking
        #[arg(short, long)]
        force: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Train a dictionary from sample files
    Train {
        /// Sample files, one sample each
        #[arg(required = true)]
        samples: Vec<PathBuf>,

        /// Dictionary output file
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum dictionary size in bytes
        #[arg(long, default_value_t = zstds_engine::dictionary::DEFAULT_DICTIONARY_CAPACITY)]
        capacity: usize,

        /// Overwrite an existing dictionary without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Show the frame header of a compressed file
    #[command(alias = "i")]
    Info {
        /// Compressed file to inspect
        file: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    utils::init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Compress {
            files,
            level,
            long,
            workers,
            checksum,
            dict,
            config,
            output,
            force,
            progress,
        } => cmd_compress(&CompressRequest {
            files,
            level,
            long,
            workers,
            checksum,
            dict,
            config,
            output,
            force,
            progress,
        }),
        Commands::Decompress {
            files,
            dict,
            window_log_max,
            output,
            force,
            progress,
        } => cmd_decompress(&DecompressRequest {
            files,
            dict,
            window_log_max,
            output,
            force,
            progress,
        }),
        Commands::Train {
            samples,
            output,
            capacity,
            force,
        } => cmd_train(&samples, &output, capacity, force),
        Commands::Info { file, json } => cmd_info(&file, json),
        Commands::Completions { shell } => cmd_completions(shell, &mut Cli::command()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

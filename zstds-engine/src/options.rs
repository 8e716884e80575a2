//! Compressor and decompressor configuration.
//!
//! Every tuning field is an `Option`: `None` leaves the libzstd default in
//! place, `Some` sets the parameter explicitly. Values outside the ranges in
//! [`bounds`] are rejected by `validate`, never clamped.

use crate::dictionary::Dictionary;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;
use zstd::stream::raw::{CParameter, DParameter};
use zstds_core::error::{Result, ZstdsError};

/// Valid ranges for numeric parameters.
///
/// Several upper bounds are smaller on 32-bit targets, mirroring libzstd.
pub mod bounds {
    use std::ops::RangeInclusive;

    /// Window size log.
    #[cfg(target_pointer_width = "64")]
    pub const WINDOW_LOG: RangeInclusive<u32> = 10..=31;
    /// Window size log.
    #[cfg(not(target_pointer_width = "64"))]
    pub const WINDOW_LOG: RangeInclusive<u32> = 10..=30;

    /// Hash table log.
    pub const HASH_LOG: RangeInclusive<u32> = 6..=30;

    /// Chain table log.
    #[cfg(target_pointer_width = "64")]
    pub const CHAIN_LOG: RangeInclusive<u32> = 6..=30;
    /// Chain table log.
    #[cfg(not(target_pointer_width = "64"))]
    pub const CHAIN_LOG: RangeInclusive<u32> = 6..=29;

    /// Search depth log.
    #[cfg(target_pointer_width = "64")]
    pub const SEARCH_LOG: RangeInclusive<u32> = 1..=30;
    /// Search depth log.
    #[cfg(not(target_pointer_width = "64"))]
    pub const SEARCH_LOG: RangeInclusive<u32> = 1..=29;

    /// Minimum match length.
    pub const MIN_MATCH: RangeInclusive<u32> = 3..=7;

    /// Target match length.
    pub const TARGET_LENGTH: RangeInclusive<u32> = 0..=131_072;

    /// Long distance matching hash log.
    pub const LDM_HASH_LOG: RangeInclusive<u32> = 6..=30;

    /// Long distance matching minimum match.
    pub const LDM_MIN_MATCH: RangeInclusive<u32> = 4..=4096;

    /// Long distance matching bucket size log.
    pub const LDM_BUCKET_SIZE_LOG: RangeInclusive<u32> = 1..=8;

    /// Long distance matching hash rate log.
    #[cfg(target_pointer_width = "64")]
    pub const LDM_HASH_RATE_LOG: RangeInclusive<u32> = 0..=25;
    /// Long distance matching hash rate log.
    #[cfg(not(target_pointer_width = "64"))]
    pub const LDM_HASH_RATE_LOG: RangeInclusive<u32> = 0..=24;

    /// Worker threads.
    #[cfg(target_pointer_width = "64")]
    pub const NB_WORKERS: RangeInclusive<u32> = 0..=200;
    /// Worker threads.
    #[cfg(not(target_pointer_width = "64"))]
    pub const NB_WORKERS: RangeInclusive<u32> = 0..=64;

    /// Job size in bytes for multi-threaded compression.
    #[cfg(target_pointer_width = "64")]
    pub const JOB_SIZE: RangeInclusive<u32> = 0..=(1 << 30);
    /// Job size in bytes for multi-threaded compression.
    #[cfg(not(target_pointer_width = "64"))]
    pub const JOB_SIZE: RangeInclusive<u32> = 0..=(1 << 29);

    /// Overlap between jobs.
    pub const OVERLAP_LOG: RangeInclusive<u32> = 0..=9;

    /// Maximum window log accepted by the decompressor.
    pub const WINDOW_LOG_MAX: RangeInclusive<u32> = WINDOW_LOG;
}

/// Match finder strategy, from fastest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// `ZSTD_fast`
    Fast,
    /// `ZSTD_dfast`
    Dfast,
    /// `ZSTD_greedy`
    Greedy,
    /// `ZSTD_lazy`
    Lazy,
    /// `ZSTD_lazy2`
    Lazy2,
    /// `ZSTD_btlazy2`
    Btlazy2,
    /// `ZSTD_btopt`
    Btopt,
    /// `ZSTD_btultra`
    Btultra,
    /// `ZSTD_btultra2`
    Btultra2,
}

impl Strategy {
    /// All strategies, fastest first.
    pub const ALL: [Strategy; 9] = [
        Strategy::Fast,
        Strategy::Dfast,
        Strategy::Greedy,
        Strategy::Lazy,
        Strategy::Lazy2,
        Strategy::Btlazy2,
        Strategy::Btopt,
        Strategy::Btultra,
        Strategy::Btultra2,
    ];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Fast => "fast",
            Strategy::Dfast => "dfast",
            Strategy::Greedy => "greedy",
            Strategy::Lazy => "lazy",
            Strategy::Lazy2 => "lazy2",
            Strategy::Btlazy2 => "btlazy2",
            Strategy::Btopt => "btopt",
            Strategy::Btultra => "btultra",
            Strategy::Btultra2 => "btultra2",
        }
    }

    fn to_zstd(self) -> zstd::zstd_safe::Strategy {
        use zstd::zstd_safe::Strategy as Z;
        match self {
            Strategy::Fast => Z::ZSTD_fast,
            Strategy::Dfast => Z::ZSTD_dfast,
            Strategy::Greedy => Z::ZSTD_greedy,
            Strategy::Lazy => Z::ZSTD_lazy,
            Strategy::Lazy2 => Z::ZSTD_lazy2,
            Strategy::Btlazy2 => Z::ZSTD_btlazy2,
            Strategy::Btopt => Z::ZSTD_btopt,
            Strategy::Btultra => Z::ZSTD_btultra,
            Strategy::Btultra2 => Z::ZSTD_btultra2,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ZstdsError;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ZstdsError::invalid_argument(format!("unknown strategy: {s}")))
    }
}

/// Supported compression level range.
pub fn compression_level_range() -> RangeInclusive<i32> {
    zstd::compression_level_range()
}

fn check_range<T>(name: &str, value: Option<T>, range: &RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + fmt::Display + Copy,
{
    match value {
        Some(value) if !range.contains(&value) => Err(ZstdsError::invalid_argument(format!(
            "{name} {value} out of range {}..={}",
            range.start(),
            range.end()
        ))),
        _ => Ok(()),
    }
}

macro_rules! setters {
    ($( $(#[$doc:meta])* $method:ident => $field:ident : $ty:ty ),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(mut self, value: $ty) -> Self {
                self.$field = Some(value);
                self
            }
        )*
    };
}

/// Options for a compressing session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorOptions {
    /// Bytes read from a source per portion (0 selects libzstd's input size).
    pub source_buffer_length: usize,
    /// Size of the engine result slot (0 selects libzstd's output size).
    pub destination_buffer_length: usize,
    /// Compression level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<i32>,
    /// Window size log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_log: Option<u32>,
    /// Hash table log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_log: Option<u32>,
    /// Chain table log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_log: Option<u32>,
    /// Search depth log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_log: Option<u32>,
    /// Minimum match length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_match: Option<u32>,
    /// Target match length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_length: Option<u32>,
    /// Match finder strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    /// Long distance matching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_long_distance_matching: Option<bool>,
    /// Long distance matching hash log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldm_hash_log: Option<u32>,
    /// Long distance matching minimum match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldm_min_match: Option<u32>,
    /// Long distance matching bucket size log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldm_bucket_size_log: Option<u32>,
    /// Long distance matching hash rate log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldm_hash_rate_log: Option<u32>,
    /// Write the content size into the frame header when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_size_flag: Option<bool>,
    /// Append an XXH64 checksum to each frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_flag: Option<bool>,
    /// Write the dictionary id into the frame header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dict_id_flag: Option<bool>,
    /// Worker threads (0 keeps compression on the calling thread).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_workers: Option<u32>,
    /// Job size for multi-threaded compression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_size: Option<u32>,
    /// Overlap between jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap_log: Option<u32>,
    /// Declared total input size, recorded in the frame header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pledged_size: Option<u64>,
    /// Shared dictionary.
    #[serde(skip)]
    pub dictionary: Option<Arc<Dictionary>>,
}

impl CompressorOptions {
    /// Options with every parameter left at the libzstd default.
    pub fn new() -> Self {
        Self::default()
    }

    setters! {
        /// Set the compression level.
        with_compression_level => compression_level: i32,
        /// Set the window size log.
        with_window_log => window_log: u32,
        /// Set the hash table log.
        with_hash_log => hash_log: u32,
        /// Set the chain table log.
        with_chain_log => chain_log: u32,
        /// Set the search depth log.
        with_search_log => search_log: u32,
        /// Set the minimum match length.
        with_min_match => min_match: u32,
        /// Set the target match length.
        with_target_length => target_length: u32,
        /// Set the match finder strategy.
        with_strategy => strategy: Strategy,
        /// Enable or disable long distance matching.
        with_long_distance_matching => enable_long_distance_matching: bool,
        /// Set the long distance matching hash log.
        with_ldm_hash_log => ldm_hash_log: u32,
        /// Set the long distance matching minimum match.
        with_ldm_min_match => ldm_min_match: u32,
        /// Set the long distance matching bucket size log.
        with_ldm_bucket_size_log => ldm_bucket_size_log: u32,
        /// Set the long distance matching hash rate log.
        with_ldm_hash_rate_log => ldm_hash_rate_log: u32,
        /// Record the content size in frame headers.
        with_content_size_flag => content_size_flag: bool,
        /// Append frame checksums.
        with_checksum_flag => checksum_flag: bool,
        /// Record the dictionary id in frame headers.
        with_dict_id_flag => dict_id_flag: bool,
        /// Set the number of worker threads.
        with_nb_workers => nb_workers: u32,
        /// Set the job size.
        with_job_size => job_size: u32,
        /// Set the overlap log.
        with_overlap_log => overlap_log: u32,
        /// Declare the total input size.
        with_pledged_size => pledged_size: u64,
        /// Use a shared dictionary.
        with_dictionary => dictionary: Arc<Dictionary>,
    }

    /// Set the source portion length (0 selects the default).
    pub fn with_source_buffer_length(mut self, length: usize) -> Self {
        self.source_buffer_length = length;
        self
    }

    /// Set the engine result slot length (0 selects the default).
    pub fn with_destination_buffer_length(mut self, length: usize) -> Self {
        self.destination_buffer_length = length;
        self
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "compression_level",
            self.compression_level,
            &compression_level_range(),
        )?;
        check_range("window_log", self.window_log, &bounds::WINDOW_LOG)?;
        check_range("hash_log", self.hash_log, &bounds::HASH_LOG)?;
        check_range("chain_log", self.chain_log, &bounds::CHAIN_LOG)?;
        check_range("search_log", self.search_log, &bounds::SEARCH_LOG)?;
        check_range("min_match", self.min_match, &bounds::MIN_MATCH)?;
        check_range("target_length", self.target_length, &bounds::TARGET_LENGTH)?;
        check_range("ldm_hash_log", self.ldm_hash_log, &bounds::LDM_HASH_LOG)?;
        check_range("ldm_min_match", self.ldm_min_match, &bounds::LDM_MIN_MATCH)?;
        check_range(
            "ldm_bucket_size_log",
            self.ldm_bucket_size_log,
            &bounds::LDM_BUCKET_SIZE_LOG,
        )?;
        check_range(
            "ldm_hash_rate_log",
            self.ldm_hash_rate_log,
            &bounds::LDM_HASH_RATE_LOG,
        )?;
        check_range("nb_workers", self.nb_workers, &bounds::NB_WORKERS)?;
        check_range("job_size", self.job_size, &bounds::JOB_SIZE)?;
        check_range("overlap_log", self.overlap_log, &bounds::OVERLAP_LOG)?;
        Ok(())
    }

    /// Source portion length with the zero default resolved.
    pub fn effective_source_buffer_length(&self) -> usize {
        resolve_length(self.source_buffer_length, zstd::zstd_safe::CCtx::in_size())
    }

    /// Explicit engine parameters, excluding the compression level.
    ///
    /// Multi-threading parameters come first: libzstd resets job settings
    /// when the worker count changes.
    pub(crate) fn parameters(&self) -> Vec<CParameter> {
        let mut parameters = Vec::new();
        let mut push = |parameter: Option<CParameter>| {
            if let Some(parameter) = parameter {
                parameters.push(parameter);
            }
        };

        push(self.nb_workers.map(CParameter::NbWorkers));
        push(self.job_size.map(CParameter::JobSize));
        push(self.overlap_log.map(CParameter::OverlapSizeLog));
        push(self.window_log.map(CParameter::WindowLog));
        push(self.hash_log.map(CParameter::HashLog));
        push(self.chain_log.map(CParameter::ChainLog));
        push(self.search_log.map(CParameter::SearchLog));
        push(self.min_match.map(CParameter::MinMatch));
        push(self.target_length.map(CParameter::TargetLength));
        push(
            self.strategy
                .map(|strategy| CParameter::Strategy(strategy.to_zstd())),
        );
        push(
            self.enable_long_distance_matching
                .map(CParameter::EnableLongDistanceMatching),
        );
        push(self.ldm_hash_log.map(CParameter::LdmHashLog));
        push(self.ldm_min_match.map(CParameter::LdmMinMatch));
        push(self.ldm_bucket_size_log.map(CParameter::LdmBucketSizeLog));
        push(self.ldm_hash_rate_log.map(CParameter::LdmHashRateLog));
        push(self.content_size_flag.map(CParameter::ContentSizeFlag));
        push(self.checksum_flag.map(CParameter::ChecksumFlag));
        push(self.dict_id_flag.map(CParameter::DictIdFlag));
        parameters
    }
}

/// Options for a decompressing session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompressorOptions {
    /// Bytes read from a source per portion (0 selects libzstd's input size).
    pub source_buffer_length: usize,
    /// Size of the engine result slot (0 selects libzstd's output size).
    pub destination_buffer_length: usize,
    /// Largest window the decompressor will allocate, as a log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_log_max: Option<u32>,
    /// Shared dictionary.
    #[serde(skip)]
    pub dictionary: Option<Arc<Dictionary>>,
}

impl DecompressorOptions {
    /// Options with every parameter left at the libzstd default.
    pub fn new() -> Self {
        Self::default()
    }

    setters! {
        /// Limit the window size.
        with_window_log_max => window_log_max: u32,
        /// Use a shared dictionary.
        with_dictionary => dictionary: Arc<Dictionary>,
    }

    /// Set the source portion length (0 selects the default).
    pub fn with_source_buffer_length(mut self, length: usize) -> Self {
        self.source_buffer_length = length;
        self
    }

    /// Set the engine result slot length (0 selects the default).
    pub fn with_destination_buffer_length(mut self, length: usize) -> Self {
        self.destination_buffer_length = length;
        self
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "window_log_max",
            self.window_log_max,
            &bounds::WINDOW_LOG_MAX,
        )
    }

    /// Source portion length with the zero default resolved.
    pub fn effective_source_buffer_length(&self) -> usize {
        resolve_length(self.source_buffer_length, zstd::zstd_safe::DCtx::in_size())
    }

    pub(crate) fn parameters(&self) -> Vec<DParameter> {
        self.window_log_max
            .map(DParameter::WindowLogMax)
            .into_iter()
            .collect()
    }
}

fn resolve_length(length: usize, default_length: usize) -> usize {
    if length == 0 { default_length } else { length }
}

//! Mapping of libzstd failures onto the zstds error taxonomy.
//!
//! libzstd reports failures through `io::Error` values whose message is the
//! error name from `ZSTD_getErrorName`.

use std::io;
use zstds_core::ZstdsError;

/// Which engine produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Compress,
    Decompress,
}

/// `ZSTD_getErrorName` strings for `ZSTD_error_memory_allocation`.
const RESOURCE_ERRORS: &[&str] = &["Allocation error : not enough memory"];

/// `ZSTD_error_dictionary_corrupted`, `ZSTD_error_dictionary_wrong` and
/// `ZSTD_error_dictionaryCreation_failed`.
const DICTIONARY_ERRORS: &[&str] = &[
    "Dictionary is corrupted",
    "Dictionary mismatch",
    "Cannot create Dictionary from provided samples",
];

/// `ZSTD_error_parameter_unsupported`, `parameter_combination_unsupported`,
/// `parameter_outOfBound`, `srcSize_wrong`, `stage_wrong` and
/// `init_missing`.
const CONFIGURATION_ERRORS: &[&str] = &[
    "Unsupported parameter",
    "Unsupported combination of parameters",
    "Parameter is out of bound",
    "Src size is incorrect",
    "Operation not authorized at current processing stage",
    "Context should be init first",
];

/// Classify a libzstd failure.
///
/// Names outside the tables are corrupted input when decompressing and
/// unexpected when compressing.
pub(crate) fn engine_error(error: io::Error, side: Side) -> ZstdsError {
    let message = error.to_string();
    let name = message.trim();

    if RESOURCE_ERRORS.contains(&name) {
        return ZstdsError::resource_exhaustion(message);
    }
    if DICTIONARY_ERRORS.contains(&name) {
        return ZstdsError::corrupted_dictionary(message);
    }
    if CONFIGURATION_ERRORS.contains(&name) {
        return ZstdsError::invalid_configuration(message);
    }

    match side {
        Side::Decompress => ZstdsError::corrupted_input(message),
        Side::Compress => ZstdsError::unexpected(message),
    }
}

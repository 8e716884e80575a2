//! Zstandard dictionaries.
//!
//! A [`Dictionary`] is an immutable byte blob. Option sets hold it through an
//! `Arc`, so one trained dictionary can serve any number of sessions.

use crate::error::{Side, engine_error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::num::NonZeroU32;
use tracing::debug;
use zstd::zstd_safe::zstd_sys;
use zstds_core::error::{Result, ZstdsError};

/// Default dictionary capacity used by training (110 KiB).
pub const DEFAULT_DICTIONARY_CAPACITY: usize = 112_640;

/// Smallest capacity libzstd finalizes into (`ZDICT_DICTSIZE_MIN`).
pub const MIN_DICTIONARY_CAPACITY: usize = 256;

/// Options for [`Dictionary::train`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    /// Maximum dictionary size in bytes (0 selects the default).
    pub capacity: usize,
}

impl TrainOptions {
    /// Capacity with the zero default resolved.
    pub fn effective_capacity(&self) -> usize {
        if self.capacity == 0 {
            DEFAULT_DICTIONARY_CAPACITY
        } else {
            self.capacity
        }
    }
}

/// A Zstandard dictionary.
#[derive(Clone, PartialEq, Eq)]
pub struct Dictionary {
    buffer: Vec<u8>,
}

impl Dictionary {
    /// Wrap an existing dictionary buffer.
    pub fn new(buffer: impl Into<Vec<u8>>) -> Result<Self> {
        let buffer = buffer.into();
        if buffer.is_empty() {
            return Err(ZstdsError::invalid_argument("dictionary buffer is empty"));
        }
        Ok(Self { buffer })
    }

    /// Train a dictionary from sample payloads.
    pub fn train<S: AsRef<[u8]>>(samples: &[S], options: &TrainOptions) -> Result<Self> {
        if samples.is_empty() {
            return Err(ZstdsError::invalid_argument("no training samples given"));
        }

        let capacity = options.effective_capacity();
        let buffer = zstd::dict::from_samples(samples, capacity)
            .map_err(|e| engine_error(e, Side::Compress))?;
        debug!(
            samples = samples.len(),
            capacity,
            size = buffer.len(),
            "trained dictionary"
        );
        Self::new(buffer)
    }

    /// Train a dictionary, then pass the trained buffer through `decorate`.
    ///
    /// `decorate` can rewrite or replace the buffer, e.g. to prepend shared
    /// content or to re-finalize it with other tooling.
    pub fn train_with<S, F>(samples: &[S], options: &TrainOptions, decorate: F) -> Result<Self>
    where
        S: AsRef<[u8]>,
        F: FnOnce(Vec<u8>) -> Result<Vec<u8>>,
    {
        let trained = Self::train(samples, options)?;
        Self::new(decorate(trained.buffer)?)
    }

    /// Turn raw `content` into a full dictionary with entropy tables built
    /// from `samples`.
    ///
    /// The result holds at most `max_size` bytes; when header and content do
    /// not fit, the start of `content` is cut. `compression_level` 0 tunes
    /// for libzstd's default level, `notification_level` above 0 lets
    /// libzstd report progress on stderr, and `dictionary_id` 0 derives an
    /// id from the content.
    pub fn finalize<S: AsRef<[u8]>>(
        content: &[u8],
        samples: &[S],
        max_size: usize,
        compression_level: i32,
        notification_level: u32,
        dictionary_id: u32,
    ) -> Result<Self> {
        if content.is_empty() {
            return Err(ZstdsError::invalid_argument("dictionary content is empty"));
        }
        if samples.is_empty() {
            return Err(ZstdsError::invalid_argument("no finalization samples given"));
        }
        if max_size < content.len().max(MIN_DICTIONARY_CAPACITY) {
            return Err(ZstdsError::invalid_argument(format!(
                "dictionary capacity {max_size} is below max(content length {}, {MIN_DICTIONARY_CAPACITY})",
                content.len()
            )));
        }
        let count = u32::try_from(samples.len())
            .map_err(|_| ZstdsError::invalid_argument("too many finalization samples"))?;

        let sizes: Vec<usize> = samples.iter().map(|sample| sample.as_ref().len()).collect();
        let flat: Vec<u8> = samples.iter().flat_map(|sample| sample.as_ref()).copied().collect();
        let parameters = zstd_sys::ZDICT_params_t {
            compressionLevel: compression_level,
            notificationLevel: notification_level,
            dictID: dictionary_id,
        };

        let mut buffer = vec![0u8; max_size];
        // SAFETY: every pointer/length pair describes a live buffer of that
        // length, `sizes` holds `count` entries summing to `flat.len()`, and
        // `buffer` does not overlap `content`.
        let code = unsafe {
            zstd_sys::ZDICT_finalizeDictionary(
                buffer.as_mut_ptr().cast(),
                buffer.len(),
                content.as_ptr().cast(),
                content.len(),
                flat.as_ptr().cast(),
                sizes.as_ptr(),
                count,
                parameters,
            )
        };
        buffer.truncate(zdict_result(code)?);
        debug!(
            samples = samples.len(),
            content = content.len(),
            size = buffer.len(),
            "finalized dictionary"
        );
        Self::new(buffer)
    }

    /// Length of the header (magic, id and entropy tables) in front of the
    /// content.
    ///
    /// Raw content dictionaries have no header and fail with
    /// [`ZstdsError::CorruptedDictionary`].
    pub fn header_size(&self) -> Result<usize> {
        // SAFETY: the pointer and length describe `self.buffer`.
        let code = unsafe {
            zstd_sys::ZDICT_getDictHeaderSize(self.buffer.as_ptr().cast(), self.buffer.len())
        };
        zdict_result(code)
    }

    /// Dictionary bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always false; empty dictionaries are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Dictionary id, or `None` for raw content dictionaries.
    pub fn id(&self) -> Option<u32> {
        zstd::zstd_safe::get_dict_id_from_dict(&self.buffer).map(NonZeroU32::get)
    }

    /// Consume the dictionary, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Split a `ZDICT_*` return value into a size or a classified error.
fn zdict_result(code: usize) -> Result<usize> {
    // SAFETY: only inspects the value.
    if unsafe { zstd_sys::ZDICT_isError(code) } != 0 {
        let name = zstd::zstd_safe::get_error_name(code);
        return Err(engine_error(io::Error::other(name), Side::Compress));
    }
    Ok(code)
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("len", &self.buffer.len())
            .field("id", &self.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_rejected() {
        assert!(matches!(
            Dictionary::new(Vec::new()),
            Err(ZstdsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_raw_content_has_no_id() {
        let dictionary = Dictionary::new(b"plain shared content".to_vec()).expect("dictionary");
        assert_eq!(dictionary.id(), None);
        assert_eq!(dictionary.len(), 20);
        assert!(!dictionary.is_empty());
    }

    #[test]
    fn test_empty_samples_rejected() {
        let samples: Vec<Vec<u8>> = Vec::new();
        assert!(matches!(
            Dictionary::train(&samples, &TrainOptions::default()),
            Err(ZstdsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_finalize_argument_checks() {
        let samples = [b"sample".to_vec()];
        let none: [Vec<u8>; 0] = [];
        for result in [
            Dictionary::finalize(b"", &samples, 1024, 0, 0, 0),
            Dictionary::finalize(b"content", &none, 1024, 0, 0, 0),
            Dictionary::finalize(b"content", &samples, 100, 0, 0, 0),
            Dictionary::finalize(&[7u8; 2000], &samples, 1024, 0, 0, 0),
        ] {
            assert!(matches!(result, Err(ZstdsError::InvalidArgument { .. })));
        }
    }

    #[test]
    fn test_raw_content_has_no_header() {
        let dictionary = Dictionary::new(b"plain shared content".to_vec()).expect("dictionary");
        assert!(matches!(
            dictionary.header_size(),
            Err(ZstdsError::CorruptedDictionary { .. })
        ));
    }

    #[test]
    fn test_effective_capacity() {
        assert_eq!(
            TrainOptions::default().effective_capacity(),
            DEFAULT_DICTIONARY_CAPACITY
        );
        assert_eq!(TrainOptions { capacity: 4096 }.effective_capacity(), 4096);
    }
}

//! Codec engine contract.
//!
//! An engine is an incremental compressor or decompressor that owns a fixed
//! result slot. Each call writes as much output as fits into that slot and
//! reports through [`EngineStatus`] whether the slot must be drained before
//! the engine can make further progress.
//!
//! ```text
//!   submit(input) ──► (consumed, status)
//!        │                      │
//!        │        NeedsOutput ──┴──► drain() ──► sink
//!        ▼
//!   flush()/finish() ──► status
//! ```
//!
//! The result of [`CodecEngine::drain`] borrows the slot, so the borrow
//! checker guarantees the output is taken before the next engine call can
//! overwrite it.

use crate::error::Result;

/// Output state reported by an engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// The call completed; no further output is pending for it.
    Done,
    /// The result slot is exhausted; drain it and call again.
    NeedsOutput,
}

impl EngineStatus {
    /// Build a status from a "needs more output" flag.
    pub fn from_needs_output(needs_output: bool) -> Self {
        if needs_output {
            Self::NeedsOutput
        } else {
            Self::Done
        }
    }

    /// Whether the result slot must be drained before calling again.
    pub fn needs_output(self) -> bool {
        self == Self::NeedsOutput
    }
}

/// Operations shared by compressor and decompressor engines.
///
/// A failed call is fatal to the engine. Callers must discard it instead of
/// issuing further calls.
pub trait CodecEngine {
    /// Consume a prefix of `input`, writing output into the result slot.
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, status)
    fn submit(&mut self, input: &[u8]) -> Result<(usize, EngineStatus)>;

    /// Take everything the previous calls placed in the result slot.
    ///
    /// The slot is empty again once the returned borrow ends.
    fn drain(&mut self) -> &[u8];

    /// Emit buffered output without ending the current frame.
    ///
    /// Decompressors have nothing to flush and report [`EngineStatus::Done`].
    fn flush(&mut self) -> Result<EngineStatus>;
}

/// An engine producing compressed frames.
pub trait CompressEngine: CodecEngine {
    /// End the current frame, emitting its trailer.
    fn finish(&mut self) -> Result<EngineStatus>;
}

/// An engine decoding compressed frames.
///
/// `submit` may consume less than the whole input, for example when it
/// stops at a frame boundary; the caller keeps the remainder.
pub trait DecompressEngine: CodecEngine {
    /// Whether input of an unfinished frame has been consumed.
    ///
    /// Input that ends while this is true was truncated.
    fn is_mid_frame(&self) -> bool;
}

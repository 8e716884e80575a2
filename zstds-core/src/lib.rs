//! # zstds Core
//!
//! Core components for the zstds streaming adapter.
//!
//! - [`engine`]: The incremental codec engine contract
//! - [`lifecycle`]: Open/closed state machine and scoped close helper
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Tools                                               │
//! │     zstds CLI, file and string helpers                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Buffered Stream + Text Adapter                      │
//! │     Reader/Writer, non-blocking variants, transcoding   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Raw Transform                                       │
//! │     Backpressure loop over one codec session            │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Engine contract (this crate) + libzstd engine       │
//! └─────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod error;
pub mod lifecycle;

// Re-exports for convenience
pub use engine::{CodecEngine, CompressEngine, DecompressEngine, EngineStatus};
pub use error::{Result, ZstdsError};
pub use lifecycle::{Close, Lifecycle, StreamState, scoped};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::engine::{CodecEngine, CompressEngine, DecompressEngine, EngineStatus};
    pub use crate::error::{Result, ZstdsError};
    pub use crate::lifecycle::{Close, scoped};
}

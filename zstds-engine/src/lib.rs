//! # zstds Engine
//!
//! libzstd-backed implementation of the zstds codec engine contract.
//!
//! - [`ZstdCompressor`] / [`ZstdDecompressor`]: incremental engines owning a
//!   fixed result slot
//! - [`options`]: typed, validated session configuration
//! - [`Dictionary`]: shared read-only dictionaries and training
//! - [`frame`]: frame header inspection
//!
//! ## Example
//!
//! ```rust
//! use zstds_core::engine::{CodecEngine, CompressEngine};
//! use zstds_engine::{CompressorOptions, ZstdCompressor};
//!
//! let options = CompressorOptions::new().with_compression_level(19);
//! let mut engine = ZstdCompressor::new(&options).unwrap();
//!
//! let mut frame = Vec::new();
//! let (consumed, _) = engine.submit(b"Hello, Zstandard!").unwrap();
//! assert_eq!(consumed, 17);
//! frame.extend_from_slice(engine.drain());
//! while engine.finish().unwrap().needs_output() {
//!     frame.extend_from_slice(engine.drain());
//! }
//! frame.extend_from_slice(engine.drain());
//!
//! assert_eq!(zstd::decode_all(&frame[..]).unwrap(), b"Hello, Zstandard!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod compressor;
mod decompressor;
pub mod dictionary;
mod error;
pub mod frame;
pub mod options;
mod slot;

pub use compressor::ZstdCompressor;
pub use decompressor::ZstdDecompressor;
pub use dictionary::{Dictionary, MIN_DICTIONARY_CAPACITY, TrainOptions};
pub use frame::{FrameHeader, parse_frame_header};
pub use options::{CompressorOptions, DecompressorOptions, Strategy, compression_level_range};

//! # zstds Stream
//!
//! Buffered Zstandard streams over any [`std::io::Read`] or
//! [`std::io::Write`].
//!
//! - [`raw`]: one codec session driven against a sink callback
//! - [`Writer`] / [`Reader`]: buffered streams with blocking and
//!   non-blocking operations, position tracking, and rewind
//! - [`text`]: character and line access with external encodings
//! - [`compress`] / [`decompress`]: one-shot helpers for byte slices
//! - [`compress_file`] / [`decompress_file`]: file-to-file helpers
//! - `async_io`: Tokio pumps (feature `async-io`)
//!
//! ## Example
//!
//! ```rust
//! use zstds_engine::{CompressorOptions, DecompressorOptions};
//! use zstds_stream::{Reader, Writer};
//!
//! let options = CompressorOptions::new().with_compression_level(19);
//! let mut writer = Writer::new(Vec::new(), options).unwrap();
//! writer.puts(["first line", "second line"]).unwrap();
//! let compressed = writer.into_inner().unwrap();
//!
//! let mut reader = Reader::new(&compressed[..], DecompressorOptions::default()).unwrap();
//! let lines = reader.readlines().unwrap();
//! assert_eq!(lines, ["first line\n", "second line\n"]);
//! assert_eq!(reader.lineno(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "async-io")]
pub mod async_io;
mod bulk;
mod file;
pub mod raw;
mod reader;
pub mod text;
mod writer;

pub use bulk::{compress, decompress};
pub use file::{compress_file, decompress_file};
pub use raw::{RawCompressor, RawDecompressor};
pub use reader::Reader;
pub use text::{EncodingContext, InvalidPolicy, TranscodeOptions};
pub use writer::Writer;

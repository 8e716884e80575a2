//! One-shot compression of in-memory buffers.

use crate::raw::RawCompressor;
use crate::reader::Reader;
use std::io;
use zstds_core::error::Result;
use zstds_engine::{CompressorOptions, DecompressorOptions};

/// Compress `source` into a single frame.
///
/// The input length is recorded in the frame header unless
/// `options.pledged_size` is already set.
pub fn compress(source: &[u8], options: &CompressorOptions) -> Result<Vec<u8>> {
    let mut options = options.clone();
    options.pledged_size.get_or_insert(source.len() as u64);

    let mut raw = RawCompressor::new(&options)?;
    let mut output = Vec::with_capacity(source.len() / 2 + 64);
    let mut sink = |chunk: &[u8]| -> io::Result<()> {
        output.extend_from_slice(chunk);
        Ok(())
    };
    raw.write(source, &mut sink)?;
    raw.close(&mut sink)?;
    Ok(output)
}

/// Decompress every frame in `source`.
///
/// Undecodable bytes after the last complete frame are ignored.
pub fn decompress(source: &[u8], options: &DecompressorOptions) -> Result<Vec<u8>> {
    Reader::new(source, options.clone())?.read_all()
}

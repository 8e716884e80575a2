//! Async pumps over Tokio readers and writers.
//!
//! The raw transform is synchronous. Each portion read from the
//! [`AsyncRead`] is run through it into a staging buffer, which is then
//! written to the [`AsyncWrite`] before the next portion is read.
//!
//! # Feature Flag
//!
//! This module is only available when the `async-io` feature is enabled:
//!
//! ```toml
//! [dependencies]
//! zstds-stream = { version = "0.3.0", features = ["async-io"] }
//! ```

use crate::raw::{RawCompressor, RawDecompressor};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;
use zstds_core::error::{Result, ZstdsError};
use zstds_engine::{CompressorOptions, DecompressorOptions};

/// Byte counts reported by the async pumps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Bytes read from the input.
    pub bytes_read: u64,
    /// Bytes written to the output.
    pub bytes_written: u64,
}

fn stage(staged: &mut Vec<u8>) -> impl FnMut(&[u8]) -> io::Result<()> + '_ {
    |chunk| {
        staged.extend_from_slice(chunk);
        Ok(())
    }
}

async fn emit<W>(output: &mut W, staged: &mut Vec<u8>, stats: &mut PumpStats) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if !staged.is_empty() {
        output.write_all(staged).await?;
        stats.bytes_written += staged.len() as u64;
        staged.clear();
    }
    Ok(())
}

/// Compress everything from `input` into one frame written to `output`.
///
/// # Example
///
/// ```rust
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut compressed = Vec::new();
/// let stats = zstds_stream::async_io::compress_async(
///     &mut &b"async payload"[..],
///     &mut compressed,
///     &Default::default(),
/// )
/// .await
/// .unwrap();
/// assert_eq!(stats.bytes_read, 13);
/// assert_eq!(stats.bytes_written, compressed.len() as u64);
/// # });
/// ```
pub async fn compress_async<R, W>(
    input: &mut R,
    output: &mut W,
    options: &CompressorOptions,
) -> Result<PumpStats>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = RawCompressor::new(options)?;
    let mut buffer = vec![0u8; options.effective_source_buffer_length()];
    let mut staged = Vec::new();
    let mut stats = PumpStats::default();

    loop {
        let read = input.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        stats.bytes_read += read as u64;
        raw.write(&buffer[..read], stage(&mut staged))?;
        emit(output, &mut staged, &mut stats).await?;
    }

    raw.close(stage(&mut staged))?;
    emit(output, &mut staged, &mut stats).await?;
    output.flush().await?;
    debug!(
        read = stats.bytes_read,
        written = stats.bytes_written,
        "async compression finished"
    );
    Ok(stats)
}

/// Decompress every frame from `input` into `output`.
///
/// Unlike [`Reader`](crate::Reader), undecodable data after the last
/// frame is reported as an error, as is input that ends inside a frame.
pub async fn decompress_async<R, W>(
    input: &mut R,
    output: &mut W,
    options: &DecompressorOptions,
) -> Result<PumpStats>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = RawDecompressor::new(options)?;
    let mut buffer = vec![0u8; options.effective_source_buffer_length()];
    let mut remainder = Vec::new();
    let mut staged = Vec::new();
    let mut stats = PumpStats::default();

    loop {
        let read = input.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        stats.bytes_read += read as u64;
        remainder.extend_from_slice(&buffer[..read]);

        let mut offset = 0;
        while offset < remainder.len() {
            let consumed = raw.read(&remainder[offset..], stage(&mut staged))?;
            raw.flush(stage(&mut staged))?;
            if consumed == 0 {
                break;
            }
            offset += consumed;
        }
        remainder.drain(..offset);
        emit(output, &mut staged, &mut stats).await?;
    }

    if raw.is_mid_frame() || !remainder.is_empty() {
        return Err(ZstdsError::corrupted_input("truncated frame"));
    }
    raw.close(stage(&mut staged))?;
    emit(output, &mut staged, &mut stats).await?;
    output.flush().await?;
    debug!(
        read = stats.bytes_read,
        written = stats.bytes_written,
        "async decompression finished"
    );
    Ok(stats)
}

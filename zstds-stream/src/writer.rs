//! Compressing writer.
//!
//! [`Writer`] wraps a [`RawCompressor`] and a byte sink. Blocking methods
//! hand compressed output straight to the sink. The `_nonblock` methods
//! park it in a pending queue instead and drain that queue without
//! blocking, reporting whether they finished.
//!
//! Bytes accepted by the engine can never be handed back, so the
//! non-blocking path never calls the engine while the pending queue still
//! holds output from an earlier call. The frame trailer is always queued
//! before it is written, so a close that fails on the sink can be retried.

use crate::raw::RawCompressor;
use crate::text::EncodingContext;
use std::io::{self, Seek, Write};
use tracing::debug;
use zstds_core::error::{Result, ZstdsError};
use zstds_core::lifecycle::Close;
use zstds_engine::CompressorOptions;

struct WriterState {
    raw: RawCompressor,
    options: CompressorOptions,
    pending: Vec<u8>,
    pos: u64,
    encoding: EncodingContext,
    finished: bool,
    closed: bool,
}

/// Streaming compressor writing a Zstandard stream into `W`.
///
/// Dropping an unclosed writer closes it and ignores any error; call
/// [`close`](Writer::close) to observe failures.
///
/// # Example
///
/// ```rust
/// use zstds_engine::CompressorOptions;
/// use zstds_stream::Writer;
///
/// let mut writer = Writer::new(Vec::new(), CompressorOptions::default()).unwrap();
/// writer.write(b"hello ").unwrap();
/// writer.write(b"world").unwrap();
/// assert_eq!(writer.pos(), 11);
///
/// let compressed = writer.into_inner().unwrap();
/// let decompressed = zstds_stream::decompress(&compressed, &Default::default()).unwrap();
/// assert_eq!(decompressed, b"hello world");
/// ```
pub struct Writer<W: Write> {
    sink: W,
    state: WriterState,
}

impl<W: Write> Writer<W> {
    /// Open a compressing session writing into `sink`.
    pub fn new(sink: W, options: CompressorOptions) -> Result<Self> {
        let raw = RawCompressor::new(&options)?;
        Ok(Self {
            sink,
            state: WriterState {
                raw,
                options,
                pending: Vec::new(),
                pos: 0,
                encoding: EncodingContext::default(),
                finished: false,
                closed: false,
            },
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.closed {
            Err(ZstdsError::UsedAfterClose)
        } else {
            Ok(())
        }
    }

    /// Compress `source`. Returns the number of bytes accepted.
    pub fn write(&mut self, source: &[u8]) -> Result<usize> {
        self.write_encoded(source, source.len())
    }

    /// Write already transcoded bytes, advancing the position by `logical`.
    pub(crate) fn write_encoded(&mut self, encoded: &[u8], logical: usize) -> Result<usize> {
        self.ensure_open()?;
        self.drain_pending()?;

        let sink = &mut self.sink;
        self.state
            .raw
            .write(encoded, |chunk| sink.write_all(chunk))?;
        self.state.pos += logical as u64;
        Ok(logical)
    }

    /// Emit all compressed output so far without ending the frame.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.drain_pending()?;

        let sink = &mut self.sink;
        self.state.raw.flush(|chunk| sink.write_all(chunk))?;
        self.sink.flush()?;
        Ok(())
    }

    /// Finish the frame and flush the sink. Closing again is a no-op.
    ///
    /// A close that failed on the sink can be retried; output not yet
    /// written stays queued.
    pub fn close(&mut self) -> Result<()> {
        if self.state.closed {
            return Ok(());
        }
        self.drain_pending()?;
        self.finish_frame()?;
        self.drain_pending()?;
        self.sink.flush()?;
        self.state.closed = true;
        debug!(pos = self.state.pos, "writer closed");
        Ok(())
    }

    /// Compress `source` without blocking on the sink.
    ///
    /// Returns `Ok(0)` without touching the engine while output from an
    /// earlier call is still waiting for the sink. Output the sink refuses
    /// stays queued until a later call drains it.
    pub fn write_nonblock(&mut self, source: &[u8]) -> Result<usize> {
        self.write_encoded_nonblock(source, source.len())
    }

    pub(crate) fn write_encoded_nonblock(
        &mut self,
        encoded: &[u8],
        logical: usize,
    ) -> Result<usize> {
        self.ensure_open()?;
        if !self.drain_pending_nonblock()? {
            return Ok(0);
        }
        debug_assert!(
            self.state.pending.is_empty(),
            "engine called with undelivered output queued"
        );

        let pending = &mut self.state.pending;
        self.state.raw.write(encoded, |chunk| {
            pending.extend_from_slice(chunk);
            Ok(())
        })?;
        self.state.pos += logical as u64;
        self.drain_pending_nonblock()?;
        Ok(logical)
    }

    /// Non-blocking [`flush`](Self::flush). Returns `true` once complete.
    pub fn flush_nonblock(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if !self.drain_pending_nonblock()? {
            return Ok(false);
        }
        debug_assert!(self.state.pending.is_empty());

        let pending = &mut self.state.pending;
        self.state.raw.flush(|chunk| {
            pending.extend_from_slice(chunk);
            Ok(())
        })?;
        if !self.drain_pending_nonblock()? {
            return Ok(false);
        }
        self.flush_sink_nonblock()
    }

    /// Non-blocking [`close`](Self::close). Returns `true` once closed.
    ///
    /// The frame is finished on the first call; later calls only keep
    /// draining its output.
    pub fn close_nonblock(&mut self) -> Result<bool> {
        if self.state.closed {
            return Ok(true);
        }
        if !self.drain_pending_nonblock()? {
            return Ok(false);
        }
        self.finish_frame()?;
        if !self.drain_pending_nonblock()? || !self.flush_sink_nonblock()? {
            return Ok(false);
        }

        self.state.closed = true;
        debug!(pos = self.state.pos, "writer closed");
        Ok(true)
    }

    /// End the frame once, queueing its output.
    ///
    /// A session released by an engine failure never finished its frame,
    /// so closing it again fails.
    fn finish_frame(&mut self) -> Result<()> {
        if self.state.finished {
            return Ok(());
        }
        if self.state.raw.is_closed() {
            return Err(ZstdsError::unexpected(
                "compressor session failed before the frame was finished",
            ));
        }
        debug_assert!(self.state.pending.is_empty());
        let pending = &mut self.state.pending;
        self.state.raw.close(|chunk| {
            pending.extend_from_slice(chunk);
            Ok(())
        })?;
        self.state.finished = true;
        Ok(())
    }

    /// Write queued output with blocking writes.
    ///
    /// Bytes the sink accepted leave the queue even when a later write
    /// fails.
    fn drain_pending(&mut self) -> Result<()> {
        while !self.state.pending.is_empty() {
            match self.sink.write(&self.state.pending) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(written) => {
                    self.state.pending.drain(..written);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Try to empty the pending queue. `false` means the sink would block.
    fn drain_pending_nonblock(&mut self) -> Result<bool> {
        while !self.state.pending.is_empty() {
            match self.sink.write(&self.state.pending) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(written) => {
                    self.state.pending.drain(..written);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }

    fn flush_sink_nonblock(&mut self) -> Result<bool> {
        match self.sink.flush() {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Bytes accepted since creation or the last rewind.
    pub fn pos(&self) -> u64 {
        self.state.pos
    }

    /// Number of compressed bytes waiting for a non-blocking sink.
    pub fn pending_len(&self) -> usize {
        self.state.pending.len()
    }

    /// Whether [`close`](Self::close) has completed.
    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    /// Options the session was created with.
    pub fn options(&self) -> &CompressorOptions {
        &self.state.options
    }

    /// Text encoding settings.
    pub fn encoding(&self) -> &EncodingContext {
        &self.state.encoding
    }

    pub(crate) fn encoding_mut(&mut self) -> &mut EncodingContext {
        &mut self.state.encoding
    }

    /// Borrow the sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Mutably borrow the sink. Writing to it directly corrupts the stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Close the writer and return the sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        let mut this = std::mem::ManuallyDrop::new(self);
        // SAFETY: `this` is never used again and its destructor never runs;
        // the sink is moved out and the remaining state dropped exactly once.
        unsafe {
            std::ptr::drop_in_place(&mut this.state);
            Ok(std::ptr::read(&this.sink))
        }
    }
}

impl<W: Write + Seek> Writer<W> {
    /// Finish the current frame, seek the sink back to its start, and
    /// begin a fresh session. Returns the new position, always 0.
    pub fn rewind(&mut self) -> Result<u64> {
        self.ensure_open()?;
        self.drain_pending()?;
        self.finish_frame()?;
        self.drain_pending()?;
        self.restart()?;
        Ok(0)
    }

    /// Non-blocking [`rewind`](Self::rewind). Returns `true` once rewound.
    pub fn rewind_nonblock(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if !self.drain_pending_nonblock()? {
            return Ok(false);
        }
        self.finish_frame()?;
        if !self.drain_pending_nonblock()? {
            return Ok(false);
        }
        self.restart()?;
        Ok(true)
    }

    fn restart(&mut self) -> Result<()> {
        self.state.raw = RawCompressor::new(&self.state.options)?;
        self.sink.rewind()?;
        self.state.pending.clear();
        self.state.pos = 0;
        self.state.finished = false;
        debug!("writer rewound");
        Ok(())
    }
}

impl<W: Write> Close for Writer<W> {
    fn close(&mut self) -> Result<()> {
        Writer::close(self)
    }

    fn is_closed(&self) -> bool {
        Writer::is_closed(self)
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Writer::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Writer::flush(self).map_err(io::Error::from)
    }
}

impl<W: Write> Drop for Writer<W> {
    fn drop(&mut self) {
        if !self.state.closed {
            if let Err(e) = self.close() {
                debug!(error = %e, "close on drop failed");
            }
        }
    }
}

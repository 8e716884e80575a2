//! Raw transform: drives one codec session against a sink callback.
//!
//! The engine writes into a fixed result slot. Whenever the slot fills
//! before the input is used up, the transform drains it into the sink and
//! calls the engine again. This backpressure loop is the only retry the
//! crate performs.
//!
//! A transform moves `Open -> Closing -> Closed` exactly once. Engine
//! failures poison the session: it is dropped immediately and every later
//! call reports [`ZstdsError::UsedAfterClose`].

use std::io;
use tracing::{debug, trace};
use zstds_core::engine::{CodecEngine, CompressEngine, DecompressEngine, EngineStatus};
use zstds_core::error::{Result, ZstdsError};
use zstds_core::lifecycle::Lifecycle;
use zstds_engine::{CompressorOptions, DecompressorOptions, ZstdCompressor, ZstdDecompressor};

/// Hand the drained slot to the sink. An empty slot means no progress.
fn deliver<E, F>(engine: &mut E, sink: &mut F) -> Result<()>
where
    E: CodecEngine,
    F: FnMut(&[u8]) -> io::Result<()>,
{
    let chunk = engine.drain();
    if chunk.is_empty() {
        return Err(ZstdsError::NotEnoughDestination);
    }
    trace!(bytes = chunk.len(), "backpressure drain");
    sink(chunk)?;
    Ok(())
}

/// Deliver whatever is left in the slot, if anything.
fn deliver_residue<E, F>(engine: &mut E, sink: &mut F) -> Result<()>
where
    E: CodecEngine,
    F: FnMut(&[u8]) -> io::Result<()>,
{
    let chunk = engine.drain();
    if !chunk.is_empty() {
        sink(chunk)?;
    }
    Ok(())
}

/// Repeat `op` until the engine stops asking for output space.
fn drive<E, F, O>(engine: &mut E, sink: &mut F, mut op: O) -> Result<()>
where
    E: CodecEngine,
    F: FnMut(&[u8]) -> io::Result<()>,
    O: FnMut(&mut E) -> Result<EngineStatus>,
{
    while op(engine)?.needs_output() {
        deliver(engine, sink)?;
    }
    deliver_residue(engine, sink)
}

/// Session slot shared by both transform directions.
struct Session<E> {
    engine: Option<E>,
    lifecycle: Lifecycle,
}

impl<E> Session<E> {
    fn new(engine: E) -> Self {
        Self {
            engine: Some(engine),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Run `f` against the open engine, dropping the engine if it fails.
    fn with_engine<T>(&mut self, f: impl FnOnce(&mut E) -> Result<T>) -> Result<T> {
        self.lifecycle.ensure_open()?;
        let engine = self.engine.as_mut().ok_or(ZstdsError::UsedAfterClose)?;
        let result = f(engine);
        if let Err(err) = &result {
            if err.is_engine_failure() {
                debug!(error = %err, "engine failed, discarding session");
                self.engine = None;
                self.lifecycle.finish_close();
            }
        }
        result
    }

    /// Run the final `f` and release the engine whatever the outcome.
    fn close_with(&mut self, f: impl FnOnce(&mut E) -> Result<()>) -> Result<()> {
        self.lifecycle.begin_close()?;
        let result = match self.engine.as_mut() {
            Some(engine) => f(engine),
            None => Err(ZstdsError::UsedAfterClose),
        };
        self.engine = None;
        self.lifecycle.finish_close();
        result
    }

    fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }
}

/// Compressing raw transform.
pub struct RawCompressor<E = ZstdCompressor> {
    session: Session<E>,
}

impl RawCompressor<ZstdCompressor> {
    /// Open a libzstd compressing session.
    pub fn new(options: &CompressorOptions) -> Result<Self> {
        Ok(Self::with_engine(ZstdCompressor::new(options)?))
    }
}

impl<E: CompressEngine> RawCompressor<E> {
    /// Drive an arbitrary compressing engine.
    pub fn with_engine(engine: E) -> Self {
        Self {
            session: Session::new(engine),
        }
    }

    /// Feed all of `source` to the engine, handing drained output to `sink`.
    ///
    /// Returns the number of bytes accepted, which is always `source.len()`
    /// on success. Output for accepted bytes may stay buffered in the engine
    /// until [`flush`](Self::flush) or [`close`](Self::close).
    pub fn write<F>(&mut self, source: &[u8], mut sink: F) -> Result<usize>
    where
        F: FnMut(&[u8]) -> io::Result<()>,
    {
        self.session.with_engine(|engine| {
            let mut accepted = 0;
            loop {
                let (consumed, status) = engine.submit(&source[accepted..])?;
                accepted += consumed;
                if status.needs_output() {
                    deliver(engine, &mut sink)?;
                    continue;
                }
                if accepted == source.len() {
                    return Ok(accepted);
                }
            }
        })
    }

    /// Emit everything buffered so far without ending the frame.
    pub fn flush<F>(&mut self, mut sink: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> io::Result<()>,
    {
        self.session
            .with_engine(|engine| drive(engine, &mut sink, |engine| engine.flush()))
    }

    /// End the frame, deliver its trailer, and release the session.
    ///
    /// Closing an already closed transform fails with
    /// [`ZstdsError::UsedAfterClose`].
    pub fn close<F>(&mut self, mut sink: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> io::Result<()>,
    {
        debug!("closing compressor session");
        self.session
            .close_with(|engine| drive(engine, &mut sink, |engine| engine.finish()))
    }

    /// Whether the session has been released.
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}

/// Decompressing raw transform.
pub struct RawDecompressor<E = ZstdDecompressor> {
    session: Session<E>,
}

impl RawDecompressor<ZstdDecompressor> {
    /// Open a libzstd decompressing session.
    pub fn new(options: &DecompressorOptions) -> Result<Self> {
        Ok(Self::with_engine(ZstdDecompressor::new(options)?))
    }
}

impl<E: DecompressEngine> RawDecompressor<E> {
    /// Drive an arbitrary decompressing engine.
    pub fn with_engine(engine: E) -> Self {
        Self {
            session: Session::new(engine),
        }
    }

    /// Decode a prefix of `source`, handing drained output to `sink`.
    ///
    /// Returns the number of bytes consumed. This can be less than
    /// `source.len()` when a frame ends inside `source`; the caller keeps
    /// the remainder. Decoded bytes that fit in the result slot stay there
    /// until the next [`flush`](Self::flush).
    pub fn read<F>(&mut self, source: &[u8], mut sink: F) -> Result<usize>
    where
        F: FnMut(&[u8]) -> io::Result<()>,
    {
        self.session.with_engine(|engine| {
            let mut consumed_total = 0;
            loop {
                let (consumed, status) = engine.submit(&source[consumed_total..])?;
                consumed_total += consumed;
                if !status.needs_output() {
                    return Ok(consumed_total);
                }
                deliver(engine, &mut sink)?;
            }
        })
    }

    /// Deliver decoded bytes still held in the result slot.
    pub fn flush<F>(&mut self, mut sink: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> io::Result<()>,
    {
        self.session
            .with_engine(|engine| drive(engine, &mut sink, |engine| engine.flush()))
    }

    /// Deliver residue and release the session.
    pub fn close<F>(&mut self, mut sink: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> io::Result<()>,
    {
        debug!("closing decompressor session");
        self.session
            .close_with(|engine| deliver_residue(engine, &mut sink))
    }

    /// Whether the session has been released.
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// Whether the engine holds part of an unfinished frame.
    ///
    /// A released session is never mid-frame.
    pub fn is_mid_frame(&self) -> bool {
        self.session
            .engine
            .as_ref()
            .is_some_and(|engine| engine.is_mid_frame())
    }
}

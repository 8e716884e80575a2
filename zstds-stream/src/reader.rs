//! Decompressing reader.
//!
//! [`Reader`] pulls compressed portions from a source, pushes them through a
//! [`RawDecompressor`] and serves decoded bytes from an internal buffer.
//! Input the engine has not consumed yet is kept and resubmitted with the
//! next portion. Concatenated frames decode as one stream.
//!
//! Data that fails to decode right after a complete frame is treated as
//! trailing garbage: it and everything after it is dropped, and the stream
//! ends with the last complete frame. A source that ends inside a frame
//! fails with [`ZstdsError::CorruptedInput`].

use crate::raw::RawDecompressor;
use crate::text::EncodingContext;
use std::io::{self, Read, Seek};
use tracing::{debug, trace};
use zstds_core::error::{Result, ZstdsError};
use zstds_core::lifecycle::Close;
use zstds_engine::DecompressorOptions;

/// Streaming decompressor reading a Zstandard stream from `R`.
///
/// # Example
///
/// ```rust
/// use zstds_engine::DecompressorOptions;
/// use zstds_stream::Reader;
///
/// let compressed = zstds_stream::compress(b"hello world", &Default::default()).unwrap();
/// let mut reader = Reader::new(&compressed[..], DecompressorOptions::default()).unwrap();
///
/// assert_eq!(reader.read_chunk(5).unwrap().as_deref(), Some(&b"hello"[..]));
/// assert_eq!(reader.read_all().unwrap(), b" world");
/// assert_eq!(reader.read_chunk(1).unwrap(), None);
/// ```
pub struct Reader<R> {
    source: R,
    raw: RawDecompressor,
    options: DecompressorOptions,
    portion: usize,
    remainder: Vec<u8>,
    buffer: Vec<u8>,
    source_eof: bool,
    after_frame: bool,
    trailing: Option<ZstdsError>,
    pos: u64,
    lineno: u64,
    encoding: EncodingContext,
    closed: bool,
}

impl<R: Read> Reader<R> {
    /// Open a decompressing session reading from `source`.
    pub fn new(source: R, options: DecompressorOptions) -> Result<Self> {
        let raw = RawDecompressor::new(&options)?;
        let portion = options.effective_source_buffer_length();
        Ok(Self {
            source,
            raw,
            options,
            portion,
            remainder: Vec::new(),
            buffer: Vec::new(),
            source_eof: false,
            after_frame: false,
            trailing: None,
            pos: 0,
            lineno: 0,
            encoding: EncodingContext::default(),
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(ZstdsError::UsedAfterClose)
        } else {
            Ok(())
        }
    }

    /// Read up to `n` decoded bytes, blocking until `n` are available or
    /// the stream ends.
    ///
    /// Returns `None` at end of stream and an empty vector when `n` is 0.
    pub fn read_chunk(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        if n == 0 {
            return Ok(Some(Vec::new()));
        }
        while self.buffer.len() < n && !self.source_eof {
            self.fill()?;
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.consume(n)))
    }

    /// Read everything up to the end of the stream.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        while !self.source_eof {
            self.fill()?;
        }
        Ok(self.consume(self.buffer.len()))
    }

    /// Replace the contents of `out` with up to `n` decoded bytes.
    ///
    /// Returns `false` at end of stream, leaving `out` empty.
    pub fn read_into(&mut self, n: usize, out: &mut Vec<u8>) -> Result<bool> {
        out.clear();
        match self.read_chunk(n)? {
            Some(chunk) => {
                out.extend_from_slice(&chunk);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Read up to `n` bytes, blocking only while nothing is buffered.
    ///
    /// Returns `None` once the stream is exhausted.
    pub fn readpartial(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        if n == 0 {
            return Ok(Some(Vec::new()));
        }
        if !self.fill_some()? {
            return Ok(None);
        }
        Ok(Some(self.consume(n)))
    }

    /// Read up to `n` bytes with at most one non-blocking source read.
    ///
    /// A `WouldBlock` from the source is returned as
    /// [`ZstdsError::Io`] only when nothing is buffered; otherwise the
    /// buffered bytes are served.
    pub fn read_nonblock(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        if n == 0 {
            return Ok(Some(Vec::new()));
        }
        if self.buffer.len() < n && !self.source_eof {
            match self.fill() {
                Ok(()) => {}
                Err(e) if e.is_would_block() && !self.buffer.is_empty() => {}
                Err(e) => return Err(e),
            }
        }
        if self.buffer.is_empty() {
            if self.source_eof {
                return Ok(None);
            }
            return Err(io::Error::from(io::ErrorKind::WouldBlock).into());
        }
        Ok(Some(self.consume(n)))
    }

    /// Whether the stream is exhausted. Blocks until that is known.
    pub fn is_eof(&mut self) -> Result<bool> {
        self.ensure_open()?;
        Ok(!self.fill_some()?)
    }

    /// Release the session and drop buffered data. Closing again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if !self.raw.is_closed() {
            self.raw.close(|_| Ok(()))?;
        }
        self.buffer.clear();
        self.remainder.clear();
        self.closed = true;
        debug!(pos = self.pos, "reader closed");
        Ok(())
    }

    /// Whether [`close`](Self::close) has completed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Decoded bytes handed out since creation or the last rewind.
    ///
    /// Bytes pushed back with `ungetbyte` and friends do not move the
    /// position. Bytes [`getc`](Self::getc) reads ahead and returns after an
    /// invalid sequence are not counted.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Lines read by [`gets`](Self::gets) and friends.
    pub fn lineno(&self) -> u64 {
        self.lineno
    }

    /// Overwrite the line counter.
    pub fn set_lineno(&mut self, lineno: u64) {
        self.lineno = lineno;
    }

    /// Options the session was created with.
    pub fn options(&self) -> &DecompressorOptions {
        &self.options
    }

    /// Text encoding settings.
    pub fn encoding(&self) -> &EncodingContext {
        &self.encoding
    }

    pub(crate) fn encoding_mut(&mut self) -> &mut EncodingContext {
        &mut self.encoding
    }

    /// Borrow the source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Mutably borrow the source. Reading from it directly desynchronizes
    /// the stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Return the source, discarding buffered data.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Fill until at least one decoded byte is buffered.
    ///
    /// Returns `false` when the stream is exhausted.
    fn fill_some(&mut self) -> Result<bool> {
        while self.buffer.is_empty() && !self.source_eof {
            self.fill()?;
        }
        Ok(!self.buffer.is_empty())
    }

    /// Hand out up to `n` buffered bytes.
    fn consume(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.buffer.len());
        self.pos += n as u64;
        self.buffer.drain(..n).collect()
    }

    /// Push bytes back in front of the buffer.
    pub(crate) fn unread(&mut self, bytes: &[u8]) {
        self.buffer.splice(0..0, bytes.iter().copied());
    }

    /// Return bytes read ahead, taking them off the position again.
    pub(crate) fn unread_consumed(&mut self, bytes: &[u8]) {
        self.unread(bytes);
        self.pos = self.pos.saturating_sub(bytes.len() as u64);
    }

    pub(crate) fn decrement_lineno(&mut self) {
        self.lineno = self.lineno.saturating_sub(1);
    }

    pub(crate) fn increment_lineno(&mut self) {
        self.lineno += 1;
    }

    /// Read one portion from the source and decode it.
    fn fill(&mut self) -> Result<()> {
        let start = self.remainder.len();
        self.remainder.resize(start + self.portion, 0);
        let read = loop {
            match self.source.read(&mut self.remainder[start..]) {
                Ok(read) => break read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.remainder.truncate(start);
                    return Err(e.into());
                }
            }
        };
        self.remainder.truncate(start + read);

        if read == 0 {
            return self.finish_source();
        }
        if self.trailing.is_some() {
            trace!(bytes = read, "dropping trailing data");
            self.remainder.clear();
            return Ok(());
        }
        trace!(bytes = read, "source portion");
        self.decode_remainder()
    }

    /// Decode as much of the remainder as the engine accepts.
    fn decode_remainder(&mut self) -> Result<()> {
        let mut offset = 0;
        while offset < self.remainder.len() {
            let buffer = &mut self.buffer;
            let result = self.raw.read(&self.remainder[offset..], |chunk| {
                buffer.extend_from_slice(chunk);
                Ok(())
            });
            match result {
                Ok(0) => break,
                Ok(consumed) => {
                    offset += consumed;
                    self.after_frame = !self.raw.is_mid_frame();
                    let buffer = &mut self.buffer;
                    self.raw.flush(|chunk| {
                        buffer.extend_from_slice(chunk);
                        Ok(())
                    })?;
                }
                Err(err) if self.after_frame && err.is_engine_failure() => {
                    debug!(error = %err, "undecodable data after a complete frame");
                    self.trailing = Some(err);
                    offset = self.remainder.len();
                }
                Err(err) => return Err(err),
            }
        }
        self.remainder.drain(..offset);
        Ok(())
    }

    fn finish_source(&mut self) -> Result<()> {
        if self.raw.is_mid_frame() {
            return Err(ZstdsError::corrupted_input("truncated frame"));
        }
        self.source_eof = true;
        if let Some(err) = self.trailing.take() {
            debug!(error = %err, "ignored trailing data");
        }
        if !self.remainder.is_empty() {
            debug!(bytes = self.remainder.len(), "discarding undecoded remainder");
            self.remainder.clear();
        }
        Ok(())
    }
}

impl<R: Read + Seek> Reader<R> {
    /// Start over from the beginning of the source with a fresh session.
    /// Returns the new position, always 0.
    pub fn rewind(&mut self) -> Result<u64> {
        self.ensure_open()?;
        self.raw = RawDecompressor::new(&self.options)?;
        self.source.rewind()?;
        self.remainder.clear();
        self.buffer.clear();
        self.source_eof = false;
        self.after_frame = false;
        self.trailing = None;
        self.pos = 0;
        self.lineno = 0;
        debug!("reader rewound");
        Ok(0)
    }
}

impl<R: Read> Close for Reader<R> {
    fn close(&mut self) -> Result<()> {
        Reader::close(self)
    }

    fn is_closed(&self) -> bool {
        Reader::is_closed(self)
    }
}

impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.ensure_open()?;
        if !self.fill_some()? {
            return Ok(0);
        }
        let n = buf.len().min(self.buffer.len());
        buf[..n].copy_from_slice(&self.buffer[..n]);
        self.buffer.drain(..n);
        self.pos += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::compress;
    use std::io::Cursor;
    use zstds_engine::CompressorOptions;

    fn frame(data: &[u8]) -> Vec<u8> {
        compress(data, &CompressorOptions::default()).expect("compress")
    }

    fn small_portions() -> DecompressorOptions {
        DecompressorOptions::new()
            .with_source_buffer_length(7)
            .with_destination_buffer_length(5)
    }

    #[test]
    fn test_read_chunk_sequence() {
        let data: Vec<u8> = (0..500u32).map(|i| (i % 13) as u8).collect();
        let compressed = frame(&data);
        let mut reader = Reader::new(&compressed[..], small_portions()).expect("reader");

        let mut decoded = Vec::new();
        while let Some(chunk) = reader.read_chunk(33).expect("read") {
            assert!(chunk.len() <= 33);
            decoded.extend(chunk);
        }
        assert_eq!(decoded, data);
        assert_eq!(reader.pos(), 500);
        assert!(reader.is_eof().expect("eof"));
        assert_eq!(reader.read_all().expect("read_all"), b"");
    }

    #[test]
    fn test_concatenated_frames() {
        let mut compressed = frame(b"first frame, ");
        compressed.extend(frame(b"second frame"));
        let mut reader = Reader::new(&compressed[..], small_portions()).expect("reader");
        assert_eq!(reader.read_all().expect("read"), b"first frame, second frame");
    }

    #[test]
    fn test_trailing_garbage_is_ignored() {
        let mut compressed = frame(b"payload");
        compressed.extend_from_slice(b"trailing garbage");
        let mut reader =
            Reader::new(&compressed[..], DecompressorOptions::default()).expect("reader");
        assert_eq!(reader.read_all().expect("read"), b"payload");
    }

    #[test]
    fn test_trailing_garbage_on_portion_boundary() {
        let mut compressed = frame(b"payload");
        let frame_len = compressed.len();
        compressed.extend_from_slice(&b"trailing garbage ".repeat(10));

        for portion in [1, frame_len, frame_len + 3, 1024] {
            let options = DecompressorOptions::new().with_source_buffer_length(portion);
            let mut reader = Reader::new(&compressed[..], options).expect("reader");
            assert_eq!(
                reader.read_all().expect("read"),
                b"payload",
                "portion {portion}"
            );
        }
    }

    #[test]
    fn test_garbage_before_any_frame_fails() {
        let mut compressed = b"garbage".to_vec();
        compressed.extend(frame(b"payload"));
        let mut reader = Reader::new(&compressed[..], small_portions()).expect("reader");
        let err = reader.read_all().expect_err("garbage first");
        assert!(matches!(err, ZstdsError::CorruptedInput { .. }), "{err}");
    }

    #[test]
    fn test_truncated_frame_fails() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 17 % 251) as u8).collect();
        let compressed = frame(&data);

        for cut in [1, 4, compressed.len() - 1] {
            let truncated = &compressed[..compressed.len() - cut];
            for options in [DecompressorOptions::default(), small_portions()] {
                let mut reader = Reader::new(truncated, options).expect("reader");
                let err = reader.read_all().expect_err("truncated");
                assert!(matches!(err, ZstdsError::CorruptedInput { .. }), "{err}");
            }
        }

        let mut complete_then_cut = frame(b"whole");
        complete_then_cut.extend_from_slice(&compressed[..compressed.len() / 2]);
        let mut reader =
            Reader::new(&complete_then_cut[..], DecompressorOptions::default()).expect("reader");
        assert_eq!(reader.read_chunk(5).expect("first frame").as_deref(), Some(&b"whole"[..]));
        assert!(reader.read_all().is_err());
    }

    #[test]
    fn test_corrupted_stream_fails() {
        let mut compressed = frame(&[7u8; 256]);
        compressed.reverse();
        let mut reader =
            Reader::new(&compressed[..], DecompressorOptions::default()).expect("reader");
        let err = reader.read_all().expect_err("corrupted");
        assert!(matches!(err, ZstdsError::CorruptedInput { .. }), "{err}");
    }

    #[test]
    fn test_read_into_replaces_contents() {
        let compressed = frame(b"abcdef");
        let mut reader =
            Reader::new(&compressed[..], DecompressorOptions::default()).expect("reader");
        let mut out = b"stale".to_vec();
        assert!(reader.read_into(4, &mut out).expect("read"));
        assert_eq!(out, b"abcd");
        assert!(reader.read_into(4, &mut out).expect("read"));
        assert_eq!(out, b"ef");
        assert!(!reader.read_into(4, &mut out).expect("read"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_readpartial_returns_what_is_buffered() {
        let compressed = frame(b"partial");
        let mut reader =
            Reader::new(&compressed[..], DecompressorOptions::default()).expect("reader");
        assert_eq!(
            reader.readpartial(1024).expect("read").as_deref(),
            Some(&b"partial"[..])
        );
        assert_eq!(reader.readpartial(1024).expect("read"), None);
    }

    #[test]
    fn test_close_and_rewind() {
        let compressed = frame(b"rewindable");
        let mut reader =
            Reader::new(Cursor::new(compressed), DecompressorOptions::default()).expect("reader");
        assert_eq!(reader.read_chunk(6).expect("read").as_deref(), Some(&b"rewind"[..]));
        assert_eq!(reader.rewind().expect("rewind"), 0);
        assert_eq!(reader.pos(), 0);
        assert_eq!(reader.read_all().expect("read"), b"rewindable");

        reader.close().expect("close");
        reader.close().expect("close again");
        assert!(matches!(reader.read_chunk(1), Err(ZstdsError::UsedAfterClose)));
        assert!(matches!(reader.rewind(), Err(ZstdsError::UsedAfterClose)));
    }

    #[test]
    fn test_io_read_interop() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 256) as u8).collect();
        let compressed = frame(&data);
        let mut reader = Reader::new(&compressed[..], small_portions()).expect("reader");
        let mut decoded = Vec::new();
        reader.read_to_end(&mut decoded).expect("read_to_end");
        assert_eq!(decoded, data);
    }
}

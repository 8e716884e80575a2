//! Byte, character, and line access on [`Reader`].

use super::{InvalidPolicy, TranscodeOptions};
use crate::reader::Reader;
use encoding_rs::Encoding;
use std::io::Read;
use zstds_core::error::{Result, ZstdsError};

/// Longest byte sequence tried before a character is declared invalid.
const MAX_CHAR_BYTES: usize = 8;

/// Separator used by [`Reader::each_line`] and [`Reader::readlines`].
pub const DEFAULT_SEPARATOR: &str = "\n";

impl<R: Read> Reader<R> {
    /// Set the encoding characters are decoded from.
    ///
    /// `internal` may only be UTF-8 or `None`.
    pub fn set_encoding(
        &mut self,
        external: Option<&'static Encoding>,
        internal: Option<&'static Encoding>,
        options: TranscodeOptions,
    ) -> Result<()> {
        self.encoding_mut().set_encoding(external, internal, options)
    }

    /// Next decoded byte, `None` at end of stream.
    pub fn getbyte(&mut self) -> Result<Option<u8>> {
        Ok(self.read_chunk(1)?.and_then(|bytes| bytes.first().copied()))
    }

    /// Next decoded byte, failing with [`ZstdsError::UnexpectedEof`] at end
    /// of stream.
    pub fn readbyte(&mut self) -> Result<u8> {
        self.getbyte()?.ok_or(ZstdsError::UnexpectedEof)
    }

    /// Iterate over the remaining bytes.
    pub fn each_byte(&mut self) -> ByteIter<'_, R> {
        ByteIter {
            reader: self,
            done: false,
        }
    }

    /// Push `bytes` back so the next read returns them first.
    pub fn ungetbyte(&mut self, bytes: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(ZstdsError::UsedAfterClose);
        }
        self.unread(bytes);
        Ok(())
    }

    /// Next character, decoded from the external encoding.
    ///
    /// Bytes are taken one at a time until they form a valid character.
    /// A sequence that never does is replaced or rejected according to the
    /// transcoding options; the bytes after its first one are pushed back.
    pub fn getc(&mut self) -> Result<Option<String>> {
        let mut raw = Vec::new();
        loop {
            let Some(byte) = self.getbyte()? else {
                if raw.is_empty() {
                    return Ok(None);
                }
                return self.invalid_char(raw).map(Some);
            };
            raw.push(byte);

            if let Some(text) = self.encoding().decode_char(&raw) {
                // Stateful encodings decode escape sequences to nothing.
                if !text.is_empty() {
                    return Ok(Some(text.into_owned()));
                }
            }
            if raw.len() >= MAX_CHAR_BYTES || (self.encoding().is_utf8() && !utf8_prefix(&raw)) {
                return self.invalid_char(raw).map(Some);
            }
        }
    }

    fn invalid_char(&mut self, raw: Vec<u8>) -> Result<String> {
        self.unread_consumed(&raw[1..]);
        let options = self.encoding().options();
        match options.invalid {
            InvalidPolicy::Replace => Ok(options
                .replace
                .clone()
                .unwrap_or_else(|| "\u{FFFD}".to_owned())),
            InvalidPolicy::Error => Err(ZstdsError::encoding(format!(
                "invalid byte sequence {:02x?} in {}",
                &raw[..1],
                self.encoding()
                    .external_encoding()
                    .unwrap_or(encoding_rs::UTF_8)
                    .name()
            ))),
        }
    }

    /// Next character, failing with [`ZstdsError::UnexpectedEof`] at end of
    /// stream.
    pub fn readchar(&mut self) -> Result<String> {
        self.getc()?.ok_or(ZstdsError::UnexpectedEof)
    }

    /// Iterate over the remaining characters.
    pub fn each_char(&mut self) -> CharIter<'_, R> {
        CharIter {
            reader: self,
            done: false,
        }
    }

    /// Push `text` back, re-encoded into the external encoding.
    pub fn ungetc(&mut self, text: &str) -> Result<()> {
        let bytes = self.encoding().encode(text)?.into_owned();
        self.ungetbyte(&bytes)
    }

    /// Read a line ending with `separator`, or everything left when
    /// `separator` is `None`.
    ///
    /// `limit` caps the line length in characters. Each line read bumps
    /// [`lineno`](Self::lineno).
    pub fn gets(&mut self, separator: Option<&str>, limit: Option<usize>) -> Result<Option<String>> {
        if limit == Some(0) {
            return Err(ZstdsError::invalid_argument("line limit must be positive"));
        }

        let mut line = String::new();
        let mut chars = 0;
        loop {
            let Some(c) = self.getc()? else {
                if line.is_empty() {
                    return Ok(None);
                }
                break;
            };
            line.push_str(&c);
            chars += 1;

            if separator.is_some_and(|separator| line.ends_with(separator))
                || limit.is_some_and(|limit| chars >= limit)
            {
                break;
            }
        }

        self.increment_lineno();
        Ok(Some(line))
    }

    /// [`gets`](Self::gets), failing with [`ZstdsError::UnexpectedEof`] at
    /// end of stream.
    pub fn readline(&mut self, separator: Option<&str>, limit: Option<usize>) -> Result<String> {
        self.gets(separator, limit)?
            .ok_or(ZstdsError::UnexpectedEof)
    }

    /// Read all remaining newline-terminated lines.
    pub fn readlines(&mut self) -> Result<Vec<String>> {
        self.each_line().collect()
    }

    /// Iterate over the remaining newline-terminated lines.
    pub fn each_line(&mut self) -> LineIter<'_, R> {
        LineIter {
            reader: self,
            done: false,
        }
    }

    /// Read everything left and decode it in one pass.
    pub fn read_text(&mut self) -> Result<String> {
        let bytes = self.read_all()?;
        self.encoding().decode(&bytes)
    }

    /// Push a line back and decrement [`lineno`](Self::lineno).
    pub fn ungetline(&mut self, line: &str) -> Result<()> {
        self.ungetc(line)?;
        self.decrement_lineno();
        Ok(())
    }
}

/// Whether `bytes` can still grow into a valid UTF-8 character.
fn utf8_prefix(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

macro_rules! stream_iter {
    ($(#[$doc:meta])* $name:ident, $item:ty, |$reader:ident| $next:expr) => {
        $(#[$doc])*
        pub struct $name<'a, R> {
            reader: &'a mut Reader<R>,
            done: bool,
        }

        impl<R: Read> Iterator for $name<'_, R> {
            type Item = Result<$item>;

            fn next(&mut self) -> Option<Self::Item> {
                if self.done {
                    return None;
                }
                let $reader = &mut *self.reader;
                match $next {
                    Ok(Some(item)) => Some(Ok(item)),
                    Ok(None) => {
                        self.done = true;
                        None
                    }
                    Err(e) => {
                        self.done = true;
                        Some(Err(e))
                    }
                }
            }
        }
    };
}

stream_iter!(
    /// Iterator returned by [`Reader::each_byte`].
    ByteIter, u8, |reader| reader.getbyte()
);
stream_iter!(
    /// Iterator returned by [`Reader::each_char`].
    CharIter, String, |reader| reader.getc()
);
stream_iter!(
    /// Iterator returned by [`Reader::each_line`].
    LineIter, String, |reader| reader.gets(Some(DEFAULT_SEPARATOR), None)
);

#[cfg(test)]
mod tests {
    use crate::bulk::compress;
    use crate::reader::Reader;
    use crate::text::TranscodeOptions;
    use encoding_rs::SHIFT_JIS;
    use zstds_core::ZstdsError;
    use zstds_engine::{CompressorOptions, DecompressorOptions};

    fn reader_over(data: &[u8]) -> Reader<std::io::Cursor<Vec<u8>>> {
        let compressed = compress(data, &CompressorOptions::default()).expect("compress");
        Reader::new(
            std::io::Cursor::new(compressed),
            DecompressorOptions::new().with_source_buffer_length(3),
        )
        .expect("reader")
    }

    #[test]
    fn test_bytes_and_unget() {
        let mut reader = reader_over(b"xyz");
        assert_eq!(reader.getbyte().expect("byte"), Some(b'x'));
        reader.ungetbyte(b"ab").expect("unget");
        let rest: Vec<u8> = reader.each_byte().collect::<Result<_, _>>().expect("bytes");
        assert_eq!(rest, b"abyz");
        assert!(matches!(reader.readbyte(), Err(ZstdsError::UnexpectedEof)));
    }

    #[test]
    fn test_utf8_chars() {
        let mut reader = reader_over("añ€😀".as_bytes());
        let chars: Vec<String> = reader.each_char().collect::<Result<_, _>>().expect("chars");
        assert_eq!(chars, ["a", "ñ", "€", "😀"]);
        assert_eq!(reader.pos(), "añ€😀".len() as u64);
    }

    #[test]
    fn test_invalid_utf8_policy() {
        let mut reader = reader_over(b"a\xffb");
        assert_eq!(reader.getc().expect("a").as_deref(), Some("a"));
        assert!(matches!(reader.getc(), Err(ZstdsError::Encoding { .. })));
        assert_eq!(reader.getc().expect("b").as_deref(), Some("b"));

        let mut reader = reader_over(b"\xffb");
        reader
            .set_encoding(None, None, TranscodeOptions::replacing())
            .expect("set_encoding");
        assert_eq!(reader.readchar().expect("replaced"), "\u{FFFD}");
        assert_eq!(reader.readchar().expect("b"), "b");
    }

    #[test]
    fn test_invalid_sequence_position() {
        let mut reader = reader_over(b"\xe2\x82x\xe2y");
        reader
            .set_encoding(None, None, TranscodeOptions::replacing())
            .expect("set_encoding");

        assert_eq!(reader.readchar().expect("replaced"), "\u{FFFD}");
        assert_eq!(reader.pos(), 1);
        assert_eq!(reader.readchar().expect("replaced"), "\u{FFFD}");
        assert_eq!(reader.pos(), 2);
        assert_eq!(reader.readchar().expect("x"), "x");
        assert_eq!(reader.pos(), 3);
        assert_eq!(reader.readchar().expect("replaced"), "\u{FFFD}");
        assert_eq!(reader.readchar().expect("y"), "y");
        assert_eq!(reader.pos(), 5);

        reader.ungetbyte(b"zz").expect("unget");
        assert_eq!(reader.pos(), 5);
    }

    #[test]
    fn test_shift_jis_chars_and_ungetc() {
        let (encoded, _, _) = SHIFT_JIS.encode("日本");
        let mut reader = reader_over(&encoded);
        reader
            .set_encoding(Some(SHIFT_JIS), None, TranscodeOptions::default())
            .expect("set_encoding");

        assert_eq!(reader.readchar().expect("char"), "日");
        reader.ungetc("日").expect("ungetc");
        assert_eq!(reader.readchar().expect("char"), "日");
        assert_eq!(reader.readchar().expect("char"), "本");
        assert_eq!(reader.getc().expect("eof"), None);
    }

    #[test]
    fn test_read_text_decodes_the_rest() {
        let (encoded, _, _) = SHIFT_JIS.encode("札幌と函館");
        let mut reader = reader_over(&encoded);
        reader
            .set_encoding(Some(SHIFT_JIS), None, TranscodeOptions::default())
            .expect("set_encoding");
        assert_eq!(reader.readchar().expect("char"), "札");
        assert_eq!(reader.read_text().expect("text"), "幌と函館");
    }

    #[test]
    fn test_lines() {
        let mut reader = reader_over(b"one\ntwo\nthree");
        assert_eq!(reader.gets(Some("\n"), None).expect("line").as_deref(), Some("one\n"));
        assert_eq!(reader.lineno(), 1);

        reader.ungetline("one\n").expect("ungetline");
        assert_eq!(reader.lineno(), 0);

        let lines = reader.readlines().expect("lines");
        assert_eq!(lines, ["one\n", "two\n", "three"]);
        assert_eq!(reader.lineno(), 3);
        assert!(matches!(
            reader.readline(Some("\n"), None),
            Err(ZstdsError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_gets_separator_and_limit() {
        let mut reader = reader_over("ab||cd€ef".as_bytes());
        assert_eq!(reader.gets(Some("||"), None).expect("sep").as_deref(), Some("ab||"));
        assert_eq!(reader.gets(None, Some(3)).expect("limit").as_deref(), Some("cd€"));
        assert_eq!(reader.gets(None, None).expect("rest").as_deref(), Some("ef"));
        assert_eq!(reader.gets(None, None).expect("eof"), None);
        assert!(matches!(
            reader.gets(None, Some(0)),
            Err(ZstdsError::InvalidArgument { .. })
        ));
    }
}

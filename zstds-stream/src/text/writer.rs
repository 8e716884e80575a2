//! Text output on [`Writer`].
//!
//! Strings are converted into the external encoding before compression.
//! The writer position counts the UTF-8 bytes handed in, not the
//! converted ones.

use super::{EncodingContext, TranscodeOptions};
use crate::writer::Writer;
use encoding_rs::Encoding;
use std::fmt::{self, Display};
use std::io::Write;
use zstds_core::error::Result;

impl<W: Write> Writer<W> {
    /// Set the encoding text is converted into.
    ///
    /// `internal` may only be UTF-8 or `None`. Encodings `encoding_rs`
    /// cannot produce, such as UTF-16, are rejected.
    pub fn set_encoding(
        &mut self,
        external: Option<&'static Encoding>,
        internal: Option<&'static Encoding>,
        options: TranscodeOptions,
    ) -> Result<()> {
        if let Some(external) = external {
            EncodingContext::check_encodable(external)?;
        }
        self.encoding_mut().set_encoding(external, internal, options)
    }

    /// Write `text` converted into the external encoding.
    pub fn write_str(&mut self, text: &str) -> Result<usize> {
        let encoded = self.encoding().encode(text)?.into_owned();
        self.write_encoded(&encoded, text.len())
    }

    /// Non-blocking [`write_str`](Self::write_str).
    pub fn write_str_nonblock(&mut self, text: &str) -> Result<usize> {
        let encoded = self.encoding().encode(text)?.into_owned();
        self.write_encoded_nonblock(&encoded, text.len())
    }

    /// Write `object` and return the writer for chaining.
    ///
    /// ```rust
    /// # use zstds_stream::Writer;
    /// let mut writer = Writer::new(Vec::new(), Default::default()).unwrap();
    /// writer.append("a")?.append(1)?.append('\n')?;
    /// assert_eq!(writer.pos(), 3);
    /// # Ok::<(), zstds_core::ZstdsError>(())
    /// ```
    pub fn append(&mut self, object: impl Display) -> Result<&mut Self> {
        self.write_str(&object.to_string())?;
        Ok(self)
    }

    /// Write each object followed by `field_separator`, then
    /// `record_separator`.
    pub fn print<I>(
        &mut self,
        objects: I,
        field_separator: Option<&str>,
        record_separator: Option<&str>,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Display,
    {
        for object in objects {
            self.write_str(&object.to_string())?;
            if let Some(separator) = field_separator {
                self.write_str(separator)?;
            }
        }
        if let Some(separator) = record_separator {
            self.write_str(separator)?;
        }
        Ok(())
    }

    /// Write formatted text, as built by [`format_args!`].
    pub fn printf(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        match args.as_str() {
            Some(text) => self.write_str(text)?,
            None => self.write_str(&args.to_string())?,
        };
        Ok(())
    }

    /// Write a single character.
    pub fn putc(&mut self, c: char) -> Result<char> {
        let mut buffer = [0; 4];
        self.write_str(c.encode_utf8(&mut buffer))?;
        Ok(c)
    }

    /// Write each object on its own line.
    ///
    /// A newline is appended unless the text already ends with one.
    pub fn puts<I>(&mut self, objects: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Display,
    {
        for object in objects {
            let mut text = object.to_string();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            self.write_str(&text)?;
        }
        Ok(())
    }
}

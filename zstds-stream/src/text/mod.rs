//! Text layer over the byte streams.
//!
//! Text is always UTF-8 inside the program. The external encoding is what
//! the compressed payload holds; [`EncodingContext`] converts between the
//! two with [`encoding_rs`]. Without an external encoding the payload is
//! treated as UTF-8 as well.

mod reader;
mod writer;

pub use reader::{ByteIter, CharIter, DEFAULT_SEPARATOR, LineIter};

use encoding_rs::{DecoderResult, Encoding, EncoderResult, UTF_8};
use std::borrow::Cow;
use zstds_core::error::{Result, ZstdsError};

/// What to do with bytes or characters that cannot be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidPolicy {
    /// Fail with [`ZstdsError::Encoding`].
    #[default]
    Error,
    /// Substitute the replacement string.
    Replace,
}

/// Conversion options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranscodeOptions {
    /// Malformed byte sequences in the external encoding.
    pub invalid: InvalidPolicy,
    /// Characters the external encoding cannot represent.
    pub undefined: InvalidPolicy,
    /// Replacement text. Defaults to U+FFFD when decoding and `?` when encoding.
    pub replace: Option<String>,
}

impl TranscodeOptions {
    /// Replace both malformed and unmappable input.
    pub fn replacing() -> Self {
        Self {
            invalid: InvalidPolicy::Replace,
            undefined: InvalidPolicy::Replace,
            replace: None,
        }
    }
}

/// Encoding settings of one stream.
#[derive(Debug, Clone, Default)]
pub struct EncodingContext {
    external: Option<&'static Encoding>,
    options: TranscodeOptions,
}

impl EncodingContext {
    /// Resolve an encoding label such as `"Shift_JIS"` or `"utf-8"`.
    pub fn lookup(label: &str) -> Result<&'static Encoding> {
        Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ZstdsError::invalid_argument(format!("unknown encoding: {label}")))
    }

    /// Set the external and internal encodings.
    ///
    /// The internal encoding can only be UTF-8 (or left unset).
    pub fn set_encoding(
        &mut self,
        external: Option<&'static Encoding>,
        internal: Option<&'static Encoding>,
        options: TranscodeOptions,
    ) -> Result<()> {
        if let Some(internal) = internal {
            if internal != UTF_8 {
                return Err(ZstdsError::invalid_argument(format!(
                    "internal encoding must be UTF-8, got {}",
                    internal.name()
                )));
            }
        }
        self.external = external;
        self.options = options;
        Ok(())
    }

    /// Set encodings from an `"external"` or `"external:internal"` label.
    pub fn set_encoding_label(&mut self, label: &str, options: TranscodeOptions) -> Result<()> {
        let (external, internal) = match label.split_once(':') {
            Some((external, internal)) => (external, Some(internal)),
            None => (label, None),
        };
        let external = Self::lookup(external)?;
        let internal = internal.map(Self::lookup).transpose()?;
        self.set_encoding(Some(external), internal, options)
    }

    /// External encoding, `None` when unset.
    pub fn external_encoding(&self) -> Option<&'static Encoding> {
        self.external
    }

    /// Internal encoding.
    pub fn internal_encoding(&self) -> &'static Encoding {
        UTF_8
    }

    /// Conversion options.
    pub fn options(&self) -> &TranscodeOptions {
        &self.options
    }

    fn payload_encoding(&self) -> &'static Encoding {
        self.external.unwrap_or(UTF_8)
    }

    pub(crate) fn is_utf8(&self) -> bool {
        self.payload_encoding() == UTF_8
    }

    /// Fail unless `encoding_rs` can encode into `encoding`.
    pub(crate) fn check_encodable(encoding: &'static Encoding) -> Result<()> {
        if encoding.output_encoding() != encoding {
            return Err(ZstdsError::encoding(format!(
                "cannot encode into {}",
                encoding.name()
            )));
        }
        Ok(())
    }

    /// Decode one complete character, `None` if `bytes` is not exactly one.
    ///
    /// Stateful encodings can yield an empty string for escape sequences.
    pub(crate) fn decode_char<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        self.payload_encoding()
            .decode_without_bom_handling_and_without_replacement(bytes)
    }

    /// Decode external bytes into a `String`.
    pub(crate) fn decode(&self, bytes: &[u8]) -> Result<String> {
        let encoding = self.payload_encoding();
        let mut decoder = encoding.new_decoder_without_bom_handling();
        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes;
        loop {
            let (result, read) = decoder.decode_to_string_without_replacement(rest, &mut text, true);
            rest = &rest[read..];
            match result {
                DecoderResult::InputEmpty => return Ok(text),
                DecoderResult::OutputFull => {
                    let needed = decoder
                        .max_utf8_buffer_length_without_replacement(rest.len())
                        .unwrap_or(rest.len() * 3 + 16);
                    text.reserve(needed);
                }
                DecoderResult::Malformed(..) => match self.options.invalid {
                    InvalidPolicy::Replace => {
                        text.push_str(self.options.replace.as_deref().unwrap_or("\u{FFFD}"));
                    }
                    InvalidPolicy::Error => {
                        return Err(ZstdsError::encoding(format!(
                            "invalid byte sequence in {}",
                            encoding.name()
                        )));
                    }
                },
            }
        }
    }

    /// Encode `text` into the external encoding.
    pub(crate) fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        let encoding = self.payload_encoding();
        if encoding == UTF_8 {
            return Ok(Cow::Borrowed(text.as_bytes()));
        }
        Self::check_encodable(encoding)?;

        let mut encoder = encoding.new_encoder();
        let mut bytes = Vec::with_capacity(text.len());
        let mut rest = text;
        loop {
            let (result, read) =
                encoder.encode_from_utf8_to_vec_without_replacement(rest, &mut bytes, true);
            rest = &rest[read..];
            match result {
                EncoderResult::InputEmpty => return Ok(Cow::Owned(bytes)),
                EncoderResult::OutputFull => {
                    let needed = encoder
                        .max_buffer_length_from_utf8_without_replacement(rest.len())
                        .unwrap_or(rest.len() * 4 + 16);
                    bytes.reserve(needed);
                }
                EncoderResult::Unmappable(c) => match self.options.undefined {
                    InvalidPolicy::Replace => {
                        let replace = self.options.replace.as_deref().unwrap_or("?");
                        bytes.extend_from_slice(&encoding.encode(replace).0);
                    }
                    InvalidPolicy::Error => {
                        return Err(ZstdsError::encoding(format!(
                            "U+{:04X} has no mapping in {}",
                            c as u32,
                            encoding.name()
                        )));
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_16LE, WINDOWS_1252};

    fn context(encoding: &'static Encoding, options: TranscodeOptions) -> EncodingContext {
        let mut context = EncodingContext::default();
        context
            .set_encoding(Some(encoding), None, options)
            .expect("set_encoding");
        context
    }

    #[test]
    fn test_internal_must_be_utf8() {
        let mut context = EncodingContext::default();
        let err = context
            .set_encoding(Some(SHIFT_JIS), Some(SHIFT_JIS), TranscodeOptions::default())
            .expect_err("rejected");
        assert!(matches!(err, ZstdsError::InvalidArgument { .. }));

        context
            .set_encoding_label("Shift_JIS:UTF-8", TranscodeOptions::default())
            .expect("label");
        assert_eq!(context.external_encoding(), Some(SHIFT_JIS));
        assert!(context.set_encoding_label("klingon", TranscodeOptions::default()).is_err());
    }

    #[test]
    fn test_shift_jis_both_ways() {
        let context = context(SHIFT_JIS, TranscodeOptions::default());
        let bytes = context.encode("日本語").expect("encode");
        assert_eq!(bytes.len(), 6);
        assert_eq!(context.decode(&bytes).expect("decode"), "日本語");
    }

    #[test]
    fn test_invalid_bytes() {
        let strict = context(SHIFT_JIS, TranscodeOptions::default());
        assert!(matches!(
            strict.decode(&[0x82]),
            Err(ZstdsError::Encoding { .. })
        ));

        let lenient = context(SHIFT_JIS, TranscodeOptions::replacing());
        assert_eq!(lenient.decode(b"a\x82").expect("decode"), "a\u{FFFD}");
    }

    #[test]
    fn test_unmappable_characters() {
        let strict = context(WINDOWS_1252, TranscodeOptions::default());
        assert!(matches!(strict.encode("日"), Err(ZstdsError::Encoding { .. })));

        let lenient = context(WINDOWS_1252, TranscodeOptions::replacing());
        assert_eq!(lenient.encode("a日b").expect("encode").as_ref(), b"a?b");
    }

    #[test]
    fn test_utf16_cannot_be_encoded() {
        let context = context(UTF_16LE, TranscodeOptions::default());
        assert!(context.encode("x").is_err());
        assert_eq!(context.decode(&[b'x', 0]).expect("decode"), "x");
    }
}

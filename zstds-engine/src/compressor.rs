//! libzstd compressing engine.

use crate::error::{Side, engine_error};
use crate::options::CompressorOptions;
use crate::slot::ResultSlot;
use tracing::debug;
use zstd::stream::raw::{Encoder, InBuffer, Operation, OutBuffer};
use zstds_core::engine::{CodecEngine, CompressEngine, EngineStatus};
use zstds_core::error::Result;

/// Streaming compressor over a libzstd compression context.
pub struct ZstdCompressor {
    encoder: Encoder<'static>,
    slot: ResultSlot,
}

impl ZstdCompressor {
    /// Create a session configured by `options`.
    ///
    /// Options are validated first; parameters the engine rejects surface
    /// as [`ZstdsError::InvalidConfiguration`](zstds_core::ZstdsError).
    pub fn new(options: &CompressorOptions) -> Result<Self> {
        options.validate()?;

        let level = options
            .compression_level
            .unwrap_or(zstd::DEFAULT_COMPRESSION_LEVEL);
        let mut encoder = match options.dictionary.as_deref() {
            Some(dictionary) => Encoder::with_dictionary(level, dictionary.as_bytes()),
            None => Encoder::new(level),
        }
        .map_err(|e| engine_error(e, Side::Compress))?;

        for parameter in options.parameters() {
            encoder
                .set_parameter(parameter)
                .map_err(|e| engine_error(e, Side::Compress))?;
        }
        if let Some(size) = options.pledged_size {
            encoder
                .set_pledged_src_size(Some(size))
                .map_err(|e| engine_error(e, Side::Compress))?;
        }

        let slot = ResultSlot::new(
            options.destination_buffer_length,
            zstd::zstd_safe::CCtx::out_size(),
        );
        debug!(
            level,
            destination = slot.capacity(),
            dictionary = options.dictionary.is_some(),
            "compressor session created"
        );

        Ok(Self { encoder, slot })
    }

    /// Length of the result slot.
    pub fn destination_capacity(&self) -> usize {
        self.slot.capacity()
    }
}

impl CodecEngine for ZstdCompressor {
    fn submit(&mut self, input: &[u8]) -> Result<(usize, EngineStatus)> {
        let mut source = InBuffer::around(input);
        let mut output = OutBuffer::around(self.slot.spare_mut());
        self.encoder
            .run(&mut source, &mut output)
            .map_err(|e| engine_error(e, Side::Compress))?;
        let written = output.pos();
        self.slot.advance(written);

        Ok((
            source.pos(),
            EngineStatus::from_needs_output(self.slot.is_full()),
        ))
    }

    fn drain(&mut self) -> &[u8] {
        self.slot.take()
    }

    fn flush(&mut self) -> Result<EngineStatus> {
        let mut output = OutBuffer::around(self.slot.spare_mut());
        let remaining = self
            .encoder
            .flush(&mut output)
            .map_err(|e| engine_error(e, Side::Compress))?;
        let written = output.pos();
        self.slot.advance(written);

        Ok(EngineStatus::from_needs_output(remaining != 0))
    }
}

impl CompressEngine for ZstdCompressor {
    fn finish(&mut self) -> Result<EngineStatus> {
        let mut output = OutBuffer::around(self.slot.spare_mut());
        let remaining = self
            .encoder
            .finish(&mut output, true)
            .map_err(|e| engine_error(e, Side::Compress))?;
        let written = output.pos();
        self.slot.advance(written);

        Ok(EngineStatus::from_needs_output(remaining != 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish_all(engine: &mut ZstdCompressor, out: &mut Vec<u8>) {
        loop {
            let status = engine.finish().expect("finish");
            out.extend_from_slice(engine.drain());
            if !status.needs_output() {
                break;
            }
        }
    }

    #[test]
    fn test_small_input_fits_slot() {
        let mut engine = ZstdCompressor::new(&CompressorOptions::default()).expect("engine");
        let (consumed, status) = engine.submit(b"hello world").expect("submit");
        assert_eq!(consumed, 11);
        assert_eq!(status, EngineStatus::Done);

        let mut frame = Vec::new();
        frame.extend_from_slice(engine.drain());
        finish_all(&mut engine, &mut frame);

        assert_eq!(zstd::decode_all(&frame[..]).expect("decode"), b"hello world");
    }

    #[test]
    fn test_one_byte_slot_reports_backpressure() {
        let options = CompressorOptions::new().with_destination_buffer_length(1);
        let mut engine = ZstdCompressor::new(&options).expect("engine");
        assert_eq!(engine.destination_capacity(), 1);

        engine.submit(b"abc").expect("submit");
        let status = engine.finish().expect("finish");
        assert_eq!(status, EngineStatus::NeedsOutput);
        assert_eq!(engine.drain().len(), 1);
    }

    #[test]
    fn test_pledged_size_mismatch_is_configuration_error() {
        let options = CompressorOptions::new().with_pledged_size(100);
        let mut engine = ZstdCompressor::new(&options).expect("engine");
        engine.submit(b"short").expect("submit");
        let err = engine.finish().expect_err("pledged size not met");
        assert!(matches!(
            err,
            zstds_core::ZstdsError::InvalidConfiguration { .. }
        ));
    }
}

//! libzstd decompressing engine.

use crate::error::{Side, engine_error};
use crate::options::DecompressorOptions;
use crate::slot::ResultSlot;
use tracing::debug;
use zstd::stream::raw::{Decoder, InBuffer, Operation, OutBuffer};
use zstds_core::engine::{CodecEngine, DecompressEngine, EngineStatus};
use zstds_core::error::Result;

/// Streaming decompressor over a libzstd decompression context.
pub struct ZstdDecompressor {
    decoder: Decoder<'static>,
    slot: ResultSlot,
    mid_frame: bool,
}

impl ZstdDecompressor {
    /// Create a session configured by `options`.
    pub fn new(options: &DecompressorOptions) -> Result<Self> {
        options.validate()?;

        let mut decoder = match options.dictionary.as_deref() {
            Some(dictionary) => Decoder::with_dictionary(dictionary.as_bytes()),
            None => Decoder::new(),
        }
        .map_err(|e| engine_error(e, Side::Decompress))?;

        for parameter in options.parameters() {
            decoder
                .set_parameter(parameter)
                .map_err(|e| engine_error(e, Side::Decompress))?;
        }

        let slot = ResultSlot::new(
            options.destination_buffer_length,
            zstd::zstd_safe::DCtx::out_size(),
        );
        debug!(
            destination = slot.capacity(),
            window_log_max = ?options.window_log_max,
            dictionary = options.dictionary.is_some(),
            "decompressor session created"
        );

        Ok(Self {
            decoder,
            slot,
            mid_frame: false,
        })
    }

    /// Length of the result slot.
    pub fn destination_capacity(&self) -> usize {
        self.slot.capacity()
    }
}

impl CodecEngine for ZstdDecompressor {
    fn submit(&mut self, input: &[u8]) -> Result<(usize, EngineStatus)> {
        let mut source = InBuffer::around(input);
        let mut output = OutBuffer::around(self.slot.spare_mut());
        let hint = self
            .decoder
            .run(&mut source, &mut output)
            .map_err(|e| engine_error(e, Side::Decompress))?;
        // libzstd hints 0 once a frame is decoded and flushed. Between frames
        // an empty call restarts the header stage and hints a header size, so
        // only a call that saw input or was already inside a frame counts.
        self.mid_frame = hint != 0 && (self.mid_frame || !input.is_empty());
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
        Ok(EngineStatus::Done)
    }
}

impl DecompressEngine for ZstdDecompressor {
    fn is_mid_frame(&self) -> bool {
        self.mid_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zstds_core::ZstdsError;

    #[test]
    fn test_decodes_whole_frame() {
        let frame = zstd::encode_all(&b"engine level round trip"[..], 3).expect("encode");
        let mut engine = ZstdDecompressor::new(&DecompressorOptions::default()).expect("engine");

        let (consumed, status) = engine.submit(&frame).expect("submit");
        assert_eq!(consumed, frame.len());
        assert_eq!(status, EngineStatus::Done);
        assert_eq!(engine.drain(), b"engine level round trip");
    }

    #[test]
    fn test_stops_at_frame_boundary() {
        let mut input = zstd::encode_all(&b"first"[..], 3).expect("encode");
        let first_len = input.len();
        input.extend(zstd::encode_all(&b"second"[..], 3).expect("encode"));

        let mut engine = ZstdDecompressor::new(&DecompressorOptions::default()).expect("engine");
        let (consumed, _) = engine.submit(&input).expect("submit");
        assert_eq!(consumed, first_len);
        assert_eq!(engine.drain(), b"first");
    }

    #[test]
    fn test_truncated_frame_is_mid_frame() {
        let frame = zstd::encode_all(&[42u8; 5000][..], 3).expect("encode");
        let mut engine = ZstdDecompressor::new(&DecompressorOptions::default()).expect("engine");
        assert!(!engine.is_mid_frame());

        let (consumed, _) = engine.submit(&frame[..frame.len() - 4]).expect("submit");
        assert_eq!(consumed, frame.len() - 4);
        assert!(engine.is_mid_frame());

        engine.submit(&frame[frame.len() - 4..]).expect("submit");
        assert!(!engine.is_mid_frame());
    }

    #[test]
    fn test_one_byte_slot_ends_at_frame_boundary() {
        let data = b"every byte drained separately";
        let frame = zstd::encode_all(&data[..], 3).expect("encode");
        let options = DecompressorOptions::new().with_destination_buffer_length(1);
        let mut engine = ZstdDecompressor::new(&options).expect("engine");

        let mut offset = 0;
        let mut decoded = Vec::new();
        loop {
            let (consumed, status) = engine.submit(&frame[offset..]).expect("submit");
            offset += consumed;
            decoded.extend_from_slice(engine.drain());
            if !status.needs_output() && offset == frame.len() {
                break;
            }
        }
        assert_eq!(decoded, data);
        assert!(!engine.is_mid_frame());
    }

    #[test]
    fn test_garbage_is_corrupted_input() {
        let mut engine = ZstdDecompressor::new(&DecompressorOptions::default()).expect("engine");
        let err = engine
            .submit(b"definitely not a zstd frame")
            .expect_err("garbage");
        assert!(matches!(err, ZstdsError::CorruptedInput { .. }));
    }

    #[test]
    fn test_flush_is_noop() {
        let mut engine = ZstdDecompressor::new(&DecompressorOptions::default()).expect("engine");
        assert_eq!(engine.flush().expect("flush"), EngineStatus::Done);
        assert!(engine.drain().is_empty());
    }
}

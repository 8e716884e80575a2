//! Dictionary training and dictionary-bound sessions.

use std::sync::Arc;
use zstds_core::ZstdsError;
use zstds_core::engine::{CodecEngine, CompressEngine};
use zstds_engine::{
    CompressorOptions, DecompressorOptions, Dictionary, TrainOptions, ZstdCompressor,
    ZstdDecompressor,
};

fn samples() -> Vec<Vec<u8>> {
    (0..2000)
        .map(|i| {
            format!(
                "{{\"id\":{i},\"kind\":\"sensor\",\"status\":\"ok\",\"reading\":{},\"unit\":\"celsius\"}}",
                i * 7 % 113
            )
            .into_bytes()
        })
        .collect()
}

fn compress(engine: &mut ZstdCompressor, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let (consumed, _) = engine.submit(rest).expect("submit");
        out.extend_from_slice(engine.drain());
        rest = &rest[consumed..];
    }
    loop {
        let status = engine.finish().expect("finish");
        out.extend_from_slice(engine.drain());
        if !status.needs_output() {
            break;
        }
    }
    out
}

fn decompress(engine: &mut ZstdDecompressor, data: &[u8]) -> zstds_core::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut rest = data;
    loop {
        let (consumed, status) = engine.submit(rest)?;
        out.extend_from_slice(engine.drain());
        rest = &rest[consumed..];
        if rest.is_empty() && !status.needs_output() {
            return Ok(out);
        }
    }
}

#[test]
fn test_train_and_round_trip() {
    let dictionary = Arc::new(
        Dictionary::train(&samples(), &TrainOptions { capacity: 4096 }).expect("train"),
    );
    assert!(dictionary.len() <= 4096);
    assert!(dictionary.id().is_some());

    let payload = br#"{"id":9999,"kind":"sensor","status":"ok","reading":12,"unit":"celsius"}"#;

    let mut compressor = ZstdCompressor::new(
        &CompressorOptions::new().with_dictionary(Arc::clone(&dictionary)),
    )
    .expect("compressor");
    let frame = compress(&mut compressor, payload);

    let mut decompressor =
        ZstdDecompressor::new(&DecompressorOptions::new().with_dictionary(dictionary))
            .expect("decompressor");
    assert_eq!(decompress(&mut decompressor, &frame).expect("decode"), payload);
}

#[test]
fn test_missing_dictionary_is_reported() {
    let dictionary = Arc::new(
        Dictionary::train(&samples(), &TrainOptions { capacity: 4096 }).expect("train"),
    );
    let mut compressor =
        ZstdCompressor::new(&CompressorOptions::new().with_dictionary(dictionary))
            .expect("compressor");
    let frame = compress(&mut compressor, b"{\"id\":1,\"kind\":\"sensor\"}");

    let mut decompressor =
        ZstdDecompressor::new(&DecompressorOptions::default()).expect("decompressor");
    let err = decompress(&mut decompressor, &frame).expect_err("dictionary required");
    assert!(matches!(err, ZstdsError::CorruptedDictionary { .. }), "{err}");
}

#[test]
fn test_train_with_decorator() {
    let decorated = Dictionary::train_with(
        &samples(),
        &TrainOptions { capacity: 4096 },
        |mut buffer| {
            buffer.truncate(buffer.len() / 2);
            Ok(buffer)
        },
    )
    .expect("train");
    assert!(decorated.len() <= 2048);

    let err = Dictionary::train_with(&samples(), &TrainOptions { capacity: 4096 }, |_| {
        Ok(Vec::new())
    })
    .expect_err("empty result");
    assert!(matches!(err, ZstdsError::InvalidArgument { .. }));
}

#[test]
fn test_raw_content_dictionary() {
    let dictionary = Arc::new(
        Dictionary::new(b"shared prefix shared prefix shared prefix".to_vec()).expect("raw"),
    );
    let mut compressor =
        ZstdCompressor::new(&CompressorOptions::new().with_dictionary(Arc::clone(&dictionary)))
            .expect("compressor");
    let frame = compress(&mut compressor, b"shared prefix and more");

    let mut decompressor =
        ZstdDecompressor::new(&DecompressorOptions::new().with_dictionary(dictionary))
            .expect("decompressor");
    assert_eq!(
        decompress(&mut decompressor, &frame).expect("decode"),
        b"shared prefix and more"
    );
}

#[test]
fn test_finalize_raw_content() {
    let content: Vec<u8> = samples()[..40].concat();
    let dictionary = Arc::new(
        Dictionary::finalize(&content, &samples(), 8192, 3, 0, 40_000).expect("finalize"),
    );
    assert_eq!(dictionary.id(), Some(40_000));
    assert!(dictionary.as_bytes().ends_with(&content));

    let header = dictionary.header_size().expect("header size");
    assert!(header > 8);
    assert_eq!(header + content.len(), dictionary.len());

    let payload = br#"{"id":4242,"kind":"sensor","status":"ok","reading":77,"unit":"celsius"}"#;
    let mut compressor = ZstdCompressor::new(
        &CompressorOptions::new().with_dictionary(Arc::clone(&dictionary)),
    )
    .expect("compressor");
    let frame = compress(&mut compressor, payload);
    let header = zstds_engine::parse_frame_header(&frame).expect("frame header");
    assert_eq!(header.dict_id, Some(40_000));

    let mut decompressor =
        ZstdDecompressor::new(&DecompressorOptions::new().with_dictionary(dictionary))
            .expect("decompressor");
    assert_eq!(decompress(&mut decompressor, &frame).expect("decode"), payload);
}

#[test]
fn test_finalize_cuts_content_to_capacity() {
    let content: Vec<u8> = samples()[..200].concat();
    assert!(content.len() > 4096);
    let dictionary =
        Dictionary::finalize(&content, &samples(), 4096, 0, 0, 0).expect("finalize");
    assert_eq!(dictionary.len(), 4096);
    assert!(dictionary.id().is_some());

    let header = dictionary.header_size().expect("header size");
    assert!(content.ends_with(&dictionary.as_bytes()[header..]));
}

#[test]
fn test_trained_dictionary_header_size() {
    let dictionary =
        Dictionary::train(&samples(), &TrainOptions { capacity: 4096 }).expect("train");
    let header = dictionary.header_size().expect("header size");
    assert!(header > 8 && header < dictionary.len());
}

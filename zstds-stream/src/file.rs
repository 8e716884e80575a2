//! File helpers.
//!
//! The scoped constructors open a file, hand the stream to a closure, and
//! close it whatever the closure returns.

use crate::reader::Reader;
use crate::writer::Writer;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;
use zstds_core::error::Result;
use zstds_core::lifecycle::scoped;
use zstds_engine::{CompressorOptions, DecompressorOptions};

impl Writer<File> {
    /// Create `path`, run `f` with a writer into it, then close the writer.
    ///
    /// An error from `f` takes precedence over an error while closing.
    pub fn create<P, T, F>(path: P, options: CompressorOptions, f: F) -> Result<T>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut Writer<File>) -> Result<T>,
    {
        let file = File::create(path.as_ref())?;
        scoped(Writer::new(file, options)?, f)
    }
}

impl Reader<File> {
    /// Open `path`, run `f` with a reader over it, then close the reader.
    ///
    /// An error from `f` takes precedence over an error while closing.
    pub fn open<P, T, F>(path: P, options: DecompressorOptions, f: F) -> Result<T>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut Reader<File>) -> Result<T>,
    {
        let file = File::open(path.as_ref())?;
        scoped(Reader::new(file, options)?, f)
    }
}

/// Compress the file at `source` into `destination`.
///
/// The source size is pledged in the frame header unless
/// `options.pledged_size` is already set. Returns the number of
/// uncompressed bytes.
pub fn compress_file<P, Q>(source: P, destination: Q, options: &CompressorOptions) -> Result<u64>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut input = File::open(source.as_ref())?;
    let mut options = options.clone();
    if options.pledged_size.is_none() {
        options.pledged_size = Some(input.metadata()?.len());
    }
    let portion = options.effective_source_buffer_length();

    let total = Writer::create(destination.as_ref(), options, |writer| {
        let mut buffer = vec![0u8; portion];
        loop {
            let read = input.read(&mut buffer)?;
            if read == 0 {
                return Ok(writer.pos());
            }
            writer.write(&buffer[..read])?;
        }
    })?;
    debug!(
        source = %source.as_ref().display(),
        destination = %destination.as_ref().display(),
        bytes = total,
        "compressed file"
    );
    Ok(total)
}

/// Decompress the file at `source` into `destination`.
///
/// Returns the number of decompressed bytes.
pub fn decompress_file<P, Q>(
    source: P,
    destination: Q,
    options: &DecompressorOptions,
) -> Result<u64>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut output = File::create(destination.as_ref())?;
    let portion = options.effective_source_buffer_length();

    let total = Reader::open(source.as_ref(), options.clone(), |reader| {
        while let Some(chunk) = reader.read_chunk(portion)? {
            output.write_all(&chunk)?;
        }
        Ok(reader.pos())
    })?;
    output.flush()?;
    debug!(
        source = %source.as_ref().display(),
        destination = %destination.as_ref().display(),
        bytes = total,
        "decompressed file"
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use zstds_core::ZstdsError;
    use zstds_engine::parse_frame_header;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("zstds-file-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        dir.join(name)
    }

    #[test]
    fn test_file_round_trip_pledges_size() {
        let source = scratch("plain.txt");
        let compressed = scratch("plain.txt.zst");
        let restored = scratch("plain.out");
        let data = b"file helpers stream in portions\n".repeat(500);
        fs::write(&source, &data).expect("write source");

        let options = CompressorOptions::new().with_source_buffer_length(1000);
        assert_eq!(
            compress_file(&source, &compressed, &options).expect("compress"),
            data.len() as u64
        );
        let header = parse_frame_header(&fs::read(&compressed).expect("read")).expect("header");
        assert_eq!(header.content_size, Some(data.len() as u64));

        let total = decompress_file(&compressed, &restored, &DecompressorOptions::default())
            .expect("decompress");
        assert_eq!(total, data.len() as u64);
        assert_eq!(fs::read(&restored).expect("read"), data);
    }

    #[test]
    fn test_scoped_writer_closes_on_error() {
        let path = scratch("scoped.zst");
        let err = Writer::create(&path, CompressorOptions::default(), |writer| {
            writer.write(b"written before the failure")?;
            Err::<(), _>(ZstdsError::invalid_argument("closure failed"))
        })
        .expect_err("closure error wins");
        assert!(matches!(err, ZstdsError::InvalidArgument { .. }));

        let text = Reader::open(&path, DecompressorOptions::default(), |reader| {
            reader.read_all()
        })
        .expect("frame was finished");
        assert_eq!(text, b"written before the failure");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Reader::open(
            scratch("does-not-exist.zst"),
            DecompressorOptions::default(),
            |reader| reader.read_all(),
        )
        .expect_err("missing");
        assert!(matches!(err, ZstdsError::Io(_)));
    }
}

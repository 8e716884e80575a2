//! Zstandard frame header inspection.
//!
//! Reads the fixed part of a frame header without decoding any block, so
//! tools can report what a compressed stream declares about itself.

use zstds_core::error::{Result, ZstdsError};

/// Zstandard magic number (0xFD2FB528 little-endian).
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Largest possible frame header, magic included.
pub const MAX_FRAME_HEADER_SIZE: usize = 18;

const FHD_SINGLE_SEGMENT: u8 = 0x20;
const FHD_CONTENT_CHECKSUM: u8 = 0x04;
const FHD_DICT_ID_FLAG_MASK: u8 = 0x03;
const FHD_CONTENT_SIZE_FLAG_MASK: u8 = 0xC0;

/// Facts declared by a frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Window size the decoder must provide.
    pub window_size: u64,
    /// Uncompressed content size, when recorded.
    pub content_size: Option<u64>,
    /// Dictionary id, when recorded.
    pub dict_id: Option<u32>,
    /// Whether an XXH64 checksum trails the frame.
    pub has_checksum: bool,
    /// Header size in bytes, magic included.
    pub header_size: usize,
}

fn field(data: &[u8], pos: usize, width: usize, what: &str) -> Result<u64> {
    let bytes = data
        .get(pos..pos + width)
        .ok_or_else(|| ZstdsError::corrupted_input(format!("truncated {what}")))?;
    Ok(bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte)))
}

/// Parse the header at the start of `data`.
pub fn parse_frame_header(data: &[u8]) -> Result<FrameHeader> {
    if data.len() < 5 {
        return Err(ZstdsError::corrupted_input("truncated frame header"));
    }
    if data[0..4] != ZSTD_MAGIC {
        return Err(ZstdsError::corrupted_input(format!(
            "unknown frame magic {:02x?}",
            &data[0..4]
        )));
    }

    let descriptor = data[4];
    let single_segment = descriptor & FHD_SINGLE_SEGMENT != 0;
    let has_checksum = descriptor & FHD_CONTENT_CHECKSUM != 0;
    let dict_id_flag = descriptor & FHD_DICT_ID_FLAG_MASK;
    let content_size_flag = (descriptor & FHD_CONTENT_SIZE_FLAG_MASK) >> 6;

    let mut pos = 5;

    let window_size = if single_segment {
        None
    } else {
        let wd = field(data, pos, 1, "window descriptor")?;
        pos += 1;
        let exponent = wd >> 3;
        let mantissa = wd & 0x07;
        let base = 1u64 << (10 + exponent);
        Some(base + (base >> 3) * mantissa)
    };

    let dict_id_width = [0, 1, 2, 4][usize::from(dict_id_flag)];
    let dict_id = if dict_id_width == 0 {
        None
    } else {
        let id = field(data, pos, dict_id_width, "dictionary id")? as u32;
        pos += dict_id_width;
        Some(id).filter(|&id| id != 0)
    };

    let content_size = if single_segment || content_size_flag != 0 {
        let width = [1, 2, 4, 8][usize::from(content_size_flag)];
        let mut size = field(data, pos, width, "content size")?;
        if width == 2 {
            size += 256;
        }
        pos += width;
        Some(size)
    } else {
        None
    };

    Ok(FrameHeader {
        window_size: window_size.or(content_size).unwrap_or(0),
        content_size,
        dict_id,
        has_checksum,
        header_size: pos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_magic() {
        let err = parse_frame_header(b"PK\x03\x04\x00").expect_err("not zstd");
        assert!(matches!(err, ZstdsError::CorruptedInput { .. }));
    }

    #[test]
    fn test_rejects_truncated() {
        assert!(parse_frame_header(&ZSTD_MAGIC).is_err());
    }

    #[test]
    fn test_single_segment_with_content_size() {
        // single segment, 1-byte content size of 42, checksum present
        let data = [0x28, 0xB5, 0x2F, 0xFD, 0x24, 42];
        let header = parse_frame_header(&data).expect("header");
        assert_eq!(header.content_size, Some(42));
        assert_eq!(header.window_size, 42);
        assert!(header.has_checksum);
        assert_eq!(header.dict_id, None);
        assert_eq!(header.header_size, 6);
    }

    #[test]
    fn test_window_descriptor_and_dict_id() {
        // window descriptor 0x58 => 2^(10+11) = 2 MiB, 4-byte dictionary id
        let data = [0x28, 0xB5, 0x2F, 0xFD, 0x03, 0x58, 0x78, 0x56, 0x34, 0x12];
        let header = parse_frame_header(&data).expect("header");
        assert_eq!(header.window_size, 2 * 1024 * 1024);
        assert_eq!(header.dict_id, Some(0x1234_5678));
        assert_eq!(header.content_size, None);
        assert!(!header.has_checksum);
    }

    #[test]
    fn test_header_of_real_frame() {
        let frame = zstd::bulk::compress(b"header facts", 3).expect("compress");
        let header = parse_frame_header(&frame).expect("header");
        assert_eq!(header.content_size, Some(12));
        assert!(header.header_size <= MAX_FRAME_HEADER_SIZE);
    }
}

//! Info command implementation.

use crate::utils::format_size;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zstds_engine::frame::MAX_FRAME_HEADER_SIZE;
use zstds_engine::{FrameHeader, parse_frame_header};

/// JSON view of a frame header.
#[derive(Debug, Serialize)]
struct FrameInfo<'a> {
    file: &'a str,
    size: u64,
    window_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dict_id: Option<u32>,
    checksum: bool,
    header_size: usize,
}

fn read_header(path: &Path) -> Result<(FrameHeader, u64), Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut prefix = Vec::with_capacity(MAX_FRAME_HEADER_SIZE);
    file.take(MAX_FRAME_HEADER_SIZE as u64).read_to_end(&mut prefix)?;
    Ok((parse_frame_header(&prefix)?, size))
}

pub fn cmd_info(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (header, size) = read_header(file)?;

    if json {
        let name = file.display().to_string();
        let info = FrameInfo {
            file: &name,
            size,
            window_size: header.window_size,
            content_size: header.content_size,
            dict_id: header.dict_id,
            checksum: header.has_checksum,
            header_size: header.header_size,
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Frame Information");
    println!("=================");
    println!("File: {}", file.display());
    println!("Size: {} bytes", size);
    println!("Window size: {}", format_size(header.window_size));
    match header.content_size {
        Some(content) => {
            println!("Content size: {} bytes", content);
            if content > 0 {
                println!(
                    "Compression ratio: {:.1}%",
                    (1.0 - size as f64 / content as f64) * 100.0
                );
            }
        }
        None => println!("Content size: unknown"),
    }
    match header.dict_id {
        Some(id) => println!("Dictionary id: {}", id),
        None => println!("Dictionary id: none"),
    }
    println!("Checksum: {}", if header.has_checksum { "yes" } else { "no" });
    println!("Header size: {} bytes", header.header_size);
    Ok(())
}

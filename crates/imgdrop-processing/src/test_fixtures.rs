//! In-memory image fixtures for validator tests.

use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use img_parts::{jpeg::Jpeg, ImageEXIF};
use std::io::Cursor;

pub fn encode_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([0, 128, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .unwrap();
    buffer
}

pub fn encode_gif(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 255, 0, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif)
        .unwrap();
    buffer
}

/// Small JPEG whose SOF0 header declares the given dimensions.
pub fn jpeg_declaring(width: u16, height: u16) -> Vec<u8> {
    let mut data = encode_jpeg(16, 16);
    let sof = data
        .windows(2)
        .position(|w| w == [0xFF, 0xC0])
        .expect("baseline JPEG has a SOF0 marker");
    // marker(2) length(2) precision(1) height(2) width(2)
    data[sof + 5..sof + 7].copy_from_slice(&height.to_be_bytes());
    data[sof + 7..sof + 9].copy_from_slice(&width.to_be_bytes());
    data
}

/// Small PNG whose IHDR declares the given dimensions (CRC recomputed).
pub fn png_declaring(width: u32, height: u32) -> Vec<u8> {
    let mut data = encode_png(16, 16);
    // signature(8) length(4) "IHDR"(4) width(4) height(4)
    data[16..20].copy_from_slice(&width.to_be_bytes());
    data[20..24].copy_from_slice(&height.to_be_bytes());
    let crc = crc32(&data[12..29]);
    data[29..33].copy_from_slice(&crc.to_be_bytes());
    data
}

/// Small GIF whose logical screen descriptor declares the given dimensions.
pub fn gif_declaring(width: u16, height: u16) -> Vec<u8> {
    let mut data = encode_gif(16, 16);
    data[6..8].copy_from_slice(&width.to_le_bytes());
    data[8..10].copy_from_slice(&height.to_le_bytes());
    data
}

/// JPEG carrying an EXIF block with the given ASCII tags in IFD0.
pub fn jpeg_with_exif(tags: &[(u16, &str)]) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(encode_jpeg(8, 8))).unwrap();
    jpeg.set_exif(Some(Bytes::from(tiff_with_ascii_tags(tags))));
    jpeg.encoder().bytes().to_vec()
}

fn tiff_with_ascii_tags(tags: &[(u16, &str)]) -> Vec<u8> {
    const ASCII: u16 = 2;

    let mut out = b"II*\0".to_vec();
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&(tags.len() as u16).to_le_bytes());

    let mut data_offset = 8 + 2 + tags.len() * 12 + 4;
    let mut data = Vec::new();
    for (tag, value) in tags {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);

        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&ASCII.to_le_bytes());
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        if bytes.len() <= 4 {
            bytes.resize(4, 0);
            out.extend_from_slice(&bytes);
        } else {
            out.extend_from_slice(&(data_offset as u32).to_le_bytes());
            data_offset += bytes.len();
            data.extend_from_slice(&bytes);
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data);
    out
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in bytes {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (!(crc & 1)).wrapping_add(1);
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

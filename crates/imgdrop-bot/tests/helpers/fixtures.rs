//! Image payloads and inbound update builders.

use image::{ImageFormat, Rgb, RgbImage};
use imgdrop_bot::transport::{Incoming, MessageRef, UpdateKind};
use imgdrop_core::{CallerIdentity, FileRef};
use std::io::Cursor;
use std::sync::atomic::{AtomicI64, Ordering};

pub const CHAT_ID: i64 = 500;

static NEXT_UPDATE_ID: AtomicI64 = AtomicI64::new(1);

pub fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([10, 200, 30]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
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
    data[sof + 5..sof + 7].copy_from_slice(&height.to_be_bytes());
    data[sof + 7..sof + 9].copy_from_slice(&width.to_be_bytes());
    data
}

pub fn caller(id: i64) -> CallerIdentity {
    CallerIdentity::new(id, format!("user{}", id))
}

fn incoming(caller_id: i64, kind: UpdateKind) -> Incoming {
    Incoming {
        update_id: NEXT_UPDATE_ID.fetch_add(1, Ordering::SeqCst),
        chat_id: CHAT_ID,
        caller: caller(caller_id),
        kind,
    }
}

pub fn photo(caller_id: i64, file_id: &str) -> Incoming {
    incoming(
        caller_id,
        UpdateKind::Photo {
            file: FileRef::from(file_id),
        },
    )
}

pub fn document(caller_id: i64, file_id: &str, mime_type: &str) -> Incoming {
    incoming(
        caller_id,
        UpdateKind::Document {
            file: FileRef::from(file_id),
            mime_type: Some(mime_type.to_string()),
            file_name: Some(format!("{}.bin", file_id)),
        },
    )
}

pub fn text(caller_id: i64, text: &str) -> Incoming {
    incoming(caller_id, UpdateKind::from_text(text))
}

pub fn callback(caller_id: i64, data: &str, message: Option<MessageRef>) -> Incoming {
    incoming(
        caller_id,
        UpdateKind::Callback {
            id: format!("cb-{}", data),
            data: data.to_string(),
            message,
        },
    )
}

//! Best-effort EXIF field extraction for JPEG uploads.

use exif::{In, Reader, Tag, Value};
use std::io::Cursor;

/// EXIF fields forwarded as upload metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifFields {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub date_time: Option<String>,
}

impl ExifFields {
    fn is_empty(&self) -> bool {
        self.camera_make.is_none() && self.camera_model.is_none() && self.date_time.is_none()
    }
}

/// Read make, model and capture time from the primary IFD.
///
/// Returns `None` when the container carries no EXIF block, it cannot be parsed, or
/// none of the fields are present.
/// Missing EXIF is normal for screenshots and re-encoded images.
pub fn read_exif_fields(data: &[u8]) -> Option<ExifFields> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "No readable EXIF data");
            return None;
        }
    };

    let fields = ExifFields {
        camera_make: ascii_field(&exif, Tag::Make),
        camera_model: ascii_field(&exif, Tag::Model),
        date_time: ascii_field(&exif, Tag::DateTime),
    };
    (!fields.is_empty()).then_some(fields)
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|raw| {
                String::from_utf8_lossy(raw)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

use image::{ImageFormat, ImageReader};
use imgdrop_core::constants::{
    MAX_ANIMATED_AREA, MAX_FILE_SIZE_BYTES, MAX_IMAGE_AREA, MAX_IMAGE_DIMENSION,
    MAX_METADATA_BYTES,
};
use imgdrop_core::{MetadataMap, ValidationError, ValidationResult};
use std::io::Cursor;

use crate::exif_fields::read_exif_fields;

/// Ceilings enforced by [`ImageValidator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_file_size: usize,
    pub max_dimension: u32,
    pub max_area: u64,
    pub max_animated_area: u64,
    pub max_metadata_bytes: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE_BYTES,
            max_dimension: MAX_IMAGE_DIMENSION,
            max_area: MAX_IMAGE_AREA,
            max_animated_area: MAX_ANIMATED_AREA,
            max_metadata_bytes: MAX_METADATA_BYTES,
        }
    }
}

/// Image validator
///
/// Checks, in order: byte length, container header, dimensions, pixel area. Only the
/// container header is parsed; the raster is never decoded. The first failing check
/// wins and no partial result is produced.
#[derive(Debug, Clone, Default)]
pub struct ImageValidator {
    limits: ValidationLimits,
}

impl ImageValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn validate(&self, data: &[u8]) -> Result<ValidationResult, ValidationError> {
        let size = data.len();
        tracing::debug!(size_bytes = size, "Validating image");

        if size > self.limits.max_file_size {
            tracing::warn!(
                size_bytes = size,
                max_bytes = self.limits.max_file_size,
                "Image exceeds size limit"
            );
            return Err(ValidationError::TooLarge {
                size,
                max: self.limits.max_file_size,
            });
        }

        let (format, width, height) = read_container_header(data)?;
        let format_name = format_name(format);
        tracing::debug!(format = format_name, width, height, "Image header decoded");

        if width > self.limits.max_dimension || height > self.limits.max_dimension {
            return Err(ValidationError::DimensionsTooBig {
                width,
                height,
                max: self.limits.max_dimension,
            });
        }

        let area = u64::from(width) * u64::from(height);
        let max_area = if is_animated_format(format) {
            self.limits.max_animated_area
        } else {
            self.limits.max_area
        };
        if area > max_area {
            return Err(ValidationError::AreaTooBig { area, max: max_area });
        }

        let mut metadata = base_metadata(format_name, width, height, size);
        if format == ImageFormat::Jpeg {
            if let Some(fields) = read_exif_fields(data) {
                if let Some(make) = fields.camera_make {
                    metadata.insert("camera_make", make);
                }
                if let Some(model) = fields.camera_model {
                    metadata.insert("camera_model", model);
                }
                if let Some(date_time) = fields.date_time {
                    metadata.insert("date_time", date_time);
                }
            }
        }

        let metadata_len = metadata.serialized_len();
        if metadata_len > self.limits.max_metadata_bytes {
            tracing::warn!(
                metadata_bytes = metadata_len,
                max_bytes = self.limits.max_metadata_bytes,
                "Metadata too large, using simplified version"
            );
            metadata = base_metadata(format_name, width, height, size);
        }

        tracing::info!(
            format = format_name,
            width,
            height,
            size_bytes = size,
            "Image validation passed"
        );

        Ok(ValidationResult::new(
            format_name,
            width,
            height,
            size,
            metadata,
        ))
    }
}

/// Detect the format and read the declared dimensions without decoding pixels.
fn read_container_header(data: &[u8]) -> Result<(ImageFormat, u32, u32), ValidationError> {
    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| ValidationError::InvalidFormat("unrecognized image format".to_string()))?;

    // Dimension ceilings are enforced by the validator itself, after the header is read.
    reader.no_limits();

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ValidationError::InvalidFormat(e.to_string()))?;

    Ok((format, width, height))
}

fn is_animated_format(format: ImageFormat) -> bool {
    format == ImageFormat::Gif
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        other => other.extensions_str().first().copied().unwrap_or("unknown"),
    }
}

fn base_metadata(format: &str, width: u32, height: u32, size: usize) -> MetadataMap {
    let mut metadata = MetadataMap::new();
    metadata.insert("format", format);
    metadata.insert("width", width);
    metadata.insert("height", height);
    metadata.insert("file_size", size);
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{
        encode_gif, encode_jpeg, encode_png, gif_declaring, jpeg_declaring, jpeg_with_exif,
        png_declaring,
    };
    use imgdrop_core::MetadataValue;

    #[test]
    fn test_valid_png() {
        let data = encode_png(100, 50);
        let result = ImageValidator::default().validate(&data).unwrap();

        assert!(result.is_valid());
        assert_eq!(result.format(), "png");
        assert_eq!((result.width(), result.height()), (100, 50));
        assert_eq!(result.size_bytes(), data.len());
        assert_eq!(
            result.metadata().get("file_size"),
            Some(&MetadataValue::Integer(data.len() as i64))
        );
    }

    #[test]
    fn test_valid_jpeg() {
        let data = encode_jpeg(64, 48);
        let result = ImageValidator::default().validate(&data).unwrap();

        assert_eq!(result.format(), "jpeg");
        assert_eq!((result.width(), result.height()), (64, 48));
        assert!(!result.metadata().contains_key("camera_make"));
    }

    #[test]
    fn test_valid_gif() {
        let result = ImageValidator::default().validate(&encode_gif(20, 10)).unwrap();
        assert_eq!(result.format(), "gif");
        assert_eq!((result.width(), result.height()), (20, 10));
    }

    #[test]
    fn test_too_large_checked_before_decoding() {
        // Not an image at all: the size gate must fire before any header parsing.
        let data = vec![0u8; MAX_FILE_SIZE_BYTES + 1];

        match ImageValidator::default().validate(&data) {
            Err(ValidationError::TooLarge { size, max }) => {
                assert_eq!(size, MAX_FILE_SIZE_BYTES + 1);
                assert_eq!(max, MAX_FILE_SIZE_BYTES);
            }
            other => panic!("Expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_exactly_at_size_limit_is_not_too_large() {
        let limits = ValidationLimits {
            max_file_size: 64,
            ..ValidationLimits::default()
        };
        let data = vec![0u8; 64];

        assert!(matches!(
            ImageValidator::new(limits).validate(&data),
            Err(ValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_invalid_format() {
        assert!(matches!(
            ImageValidator::default().validate(b"not an image"),
            Err(ValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            ImageValidator::default().validate(&[]),
            Err(ValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_truncated_png_is_invalid() {
        let data = encode_png(10, 10);
        assert!(matches!(
            ImageValidator::default().validate(&data[..20]),
            Err(ValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_dimension_limit() {
        let data = jpeg_declaring(15000, 8000);

        match ImageValidator::default().validate(&data) {
            Err(ValidationError::DimensionsTooBig { width, height, max }) => {
                assert_eq!((width, height), (15000, 8000));
                assert_eq!(max, MAX_IMAGE_DIMENSION);
            }
            other => panic!("Expected DimensionsTooBig, got {:?}", other),
        }
    }

    #[test]
    fn test_dimension_limit_is_inclusive() {
        let result = ImageValidator::default()
            .validate(&png_declaring(12000, 100))
            .unwrap();
        assert_eq!(result.width(), 12000);
    }

    #[test]
    fn test_static_area_limit() {
        // 11000 x 10000 = 110M pixels, each side within 12000.
        let err = ImageValidator::default()
            .validate(&png_declaring(11000, 10000))
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::AreaTooBig {
                area: 110_000_000,
                max: MAX_IMAGE_AREA
            }
        );
        assert!(err.is_too_big());
    }

    #[test]
    fn test_animated_area_limit() {
        // 8000 x 7000 = 56M pixels: fine for a PNG, too many for a GIF.
        assert!(ImageValidator::default()
            .validate(&png_declaring(8000, 7000))
            .is_ok());

        assert_eq!(
            ImageValidator::default()
                .validate(&gif_declaring(8000, 7000))
                .unwrap_err(),
            ValidationError::AreaTooBig {
                area: 56_000_000,
                max: MAX_ANIMATED_AREA
            }
        );
    }

    #[test]
    fn test_exif_metadata_extracted_for_jpeg() {
        let data = jpeg_with_exif(&[
            (0x010F, "FUJIFILM"),
            (0x0110, "X100V"),
            (0x0132, "2023:06:01 12:00:00"),
        ]);

        let result = ImageValidator::default().validate(&data).unwrap();
        let metadata = result.metadata();

        assert_eq!(metadata.get("camera_make"), Some(&MetadataValue::from("FUJIFILM")));
        assert_eq!(metadata.get("camera_model"), Some(&MetadataValue::from("X100V")));
        assert_eq!(
            metadata.get("date_time"),
            Some(&MetadataValue::from("2023:06:01 12:00:00"))
        );
        assert_eq!(metadata.get("format"), Some(&MetadataValue::from("jpeg")));
    }

    #[test]
    fn test_oversized_metadata_falls_back_to_minimal_map() {
        let long_make = "M".repeat(2000);
        let data = jpeg_with_exif(&[(0x010F, long_make.as_str()), (0x0110, "X100V")]);

        let result = ImageValidator::default().validate(&data).unwrap();
        let metadata = result.metadata();

        let mut keys: Vec<&str> = metadata.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["file_size", "format", "height", "width"]);
        assert!(metadata.serialized_len() <= MAX_METADATA_BYTES);
    }

    #[test]
    fn test_custom_limits() {
        let limits = ValidationLimits {
            max_dimension: 50,
            ..ValidationLimits::default()
        };
        assert!(matches!(
            ImageValidator::new(limits).validate(&encode_png(51, 10)),
            Err(ValidationError::DimensionsTooBig { .. })
        ));
    }
}

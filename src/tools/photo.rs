//! Image upload inspection and the resize + JPEG recompression used by the
//! optimizer view.

use crate::error::ImageError;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat};
use std::io::Cursor;

pub const MIN_QUALITY: u8 = 10;
pub const MAX_QUALITY: u8 = 95;
pub const DEFAULT_QUALITY: u8 = 85;
pub const MIN_MAX_WIDTH: u32 = 100;
pub const DEFAULT_MAX_WIDTH: u32 = 1000;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// An uploaded file, held only for the request that carried it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn size_mb(&self) -> f64 {
        megabytes(self.bytes.len())
    }
}

pub fn megabytes(len: usize) -> f64 {
    len as f64 / (1024.0 * 1024.0)
}

/// A decoded upload.
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

impl DecodedImage {
    pub fn mime_type(&self) -> &'static str {
        mime_type(self.format)
    }
}

fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        _ => "image/jpeg",
    }
}

/// MIME type from the leading magic bytes only, without decoding.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(mime_type)
        .unwrap_or("application/octet-stream")
}

/// Decode a JPG/JPEG/PNG upload.
///
/// The file name must carry one of the allowed extensions and the content
/// must decode as PNG or JPEG.
pub fn decode_upload(upload: &Upload) -> Result<DecodedImage, ImageError> {
    if upload.bytes.is_empty() && upload.file_name.is_empty() {
        return Err(ImageError::Missing);
    }

    let extension = upload
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImageError::UnsupportedType(upload.file_name.clone()));
    }

    let format = image::guess_format(&upload.bytes).map_err(ImageError::Decode)?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(ImageError::UnsupportedType(upload.file_name.clone()));
    }

    let image =
        image::load_from_memory_with_format(&upload.bytes, format).map_err(ImageError::Decode)?;
    Ok(DecodedImage { image, format })
}

/// Validated optimizer inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeSettings {
    quality: u8,
    max_width: u32,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_width: DEFAULT_MAX_WIDTH,
        }
    }
}

impl OptimizeSettings {
    pub fn new(quality: u8, max_width: u32) -> Result<Self, ImageError> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(ImageError::Quality(quality.to_string()));
        }
        if max_width < MIN_MAX_WIDTH {
            return Err(ImageError::MaxWidth(max_width.to_string()));
        }
        Ok(Self { quality, max_width })
    }

    /// Parse raw form values. Blank fields fall back to the defaults.
    pub fn parse(quality: Option<&str>, max_width: Option<&str>) -> Result<Self, ImageError> {
        let quality = match quality.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse::<u8>()
                .map_err(|_| ImageError::Quality(raw.to_string()))?,
            None => DEFAULT_QUALITY,
        };
        let max_width = match max_width.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ImageError::MaxWidth(raw.to_string()))?,
            None => DEFAULT_MAX_WIDTH,
        };
        Self::new(quality, max_width)
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }
}

/// Output size for an image of `width` x `height` capped at `max_width`.
///
/// Wider images are scaled down to exactly `max_width`, keeping the aspect
/// ratio with the height rounded to the nearest pixel. Anything else is
/// returned unchanged.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round() as u32;
    (max_width, scaled.max(1))
}

/// Result of one optimization pass.
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub original_width: u32,
    pub original_height: u32,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl OptimizedImage {
    pub fn size_mb(&self) -> f64 {
        megabytes(self.bytes.len())
    }
}

pub fn optimized_file_name(original: &str) -> String {
    format!("optimized_{}", original)
}

/// Resize `upload` to the configured max width and re-encode it as JPEG.
///
/// # Arguments
/// * `upload` - The submitted JPG/JPEG/PNG file
/// * `settings` - Validated quality and max width
///
/// # Returns
/// * `Ok(OptimizedImage)` - Both sizes, the download name and the JPEG bytes
/// * `Err(ImageError)` - The upload could not be decoded or encoded
pub fn optimize(upload: &Upload, settings: OptimizeSettings) -> Result<OptimizedImage, ImageError> {
    let decoded = decode_upload(upload)?;
    let (original_width, original_height) = decoded.image.dimensions();
    let (width, height) = target_dimensions(original_width, original_height, settings.max_width);

    let resized = if (width, height) == (original_width, original_height) {
        decoded.image
    } else {
        decoded
            .image
            .resize_exact(width, height, FilterType::CatmullRom)
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut bytes = Vec::new();
    rgb.write_to(
        &mut Cursor::new(&mut bytes),
        ImageOutputFormat::Jpeg(settings.quality),
    )
    .map_err(ImageError::Encode)?;

    log::debug!(
        "optimized {} from {}x{} to {}x{} ({} bytes)",
        upload.file_name,
        original_width,
        original_height,
        width,
        height,
        bytes.len()
    );

    Ok(OptimizedImage {
        original_width,
        original_height,
        width,
        height,
        file_name: optimized_file_name(&upload.file_name),
        bytes,
    })
}

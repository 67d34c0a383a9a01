use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{DynamicImage, ImageError, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// ERRORS
// ============================================================================

/// Error type for payload and file operations
#[derive(Debug)]
pub enum IoError {
    Io(std::io::Error),
    Image(ImageError),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::Io(e) => write!(f, "I/O error: {}", e),
            IoError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io(e)
    }
}

impl From<ImageError> for IoError {
    fn from(e: ImageError) -> Self {
        IoError::Image(e)
    }
}

// ============================================================================
// IMAGE PAYLOADS
// ============================================================================

/// An encoded image plus its file name — the unit every edit produces and the
/// history stores.  The bytes are opaque to everything except decode points;
/// clones are cheap (shared bytes).
#[derive(Clone, Debug)]
pub struct ImagePayload {
    bytes: Arc<[u8]>,
    name: String,
}

impl ImagePayload {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::from(bytes),
            name: name.into(),
        }
    }

    /// Read an image file from disk without re-encoding it.
    pub fn from_file(path: &Path) -> Result<Self, IoError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image.png")
            .to_string();
        Ok(Self::from_bytes(name, bytes))
    }

    /// Encode a raster surface as PNG and wrap it as a payload.
    pub fn from_rgba(name: impl Into<String>, image: &RgbaImage) -> Result<Self, IoError> {
        Ok(Self::from_bytes(name, encode_png(image)?))
    }

    /// Decode the payload back into an RGBA surface.
    pub fn decode(&self) -> Result<RgbaImage, IoError> {
        Ok(image::load_from_memory(&self.bytes)?.to_rgba8())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode an RGBA surface as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, IoError> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    #[allow(deprecated)]
    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(out)
}

/// `prefix-<unix millis>.png` — the naming scheme every committed version uses.
pub fn timestamped_name(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}-{}.png", prefix, millis)
}

// ============================================================================
// SAVE FORMATS (headless output)
// ============================================================================

/// Raster output formats the headless saver supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tga,
    Tiff,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Tiff => "tiff",
        }
    }

    /// Map a user-supplied format name or file extension; `None` for
    /// anything unrecognised.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "webp" => Some(SaveFormat::Webp),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            "tiff" | "tif" => Some(SaveFormat::Tiff),
            _ => None,
        }
    }
}

/// Encode `image` into `path` in the requested format.  `quality` applies to
/// JPEG only (1-100).
pub fn encode_and_write(
    image: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel; flatten first
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Webp => {
            let dyn_img = DynamicImage::ImageRgba8(image.clone());
            dyn_img.save(path)?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Tga => {
            let encoder = TgaEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Tiff => {
            let dyn_img = DynamicImage::ImageRgba8(image.clone());
            dyn_img.write_to(&mut writer, image::ImageOutputFormat::Tiff)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_payload_round_trip() {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let payload = ImagePayload::from_rgba("tiny.png", &img).unwrap();
        assert_eq!(payload.name(), "tiny.png");
        assert!(!payload.is_empty());

        let decoded = payload.decode().unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(1, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_save_format_from_extension() {
        assert_eq!(SaveFormat::from_extension("PNG"), Some(SaveFormat::Png));
        assert_eq!(SaveFormat::from_extension("jpeg"), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_extension("jpg"), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_extension("tif"), Some(SaveFormat::Tiff));
        assert_eq!(SaveFormat::from_extension("pfe"), None);
    }

    #[test]
    fn test_timestamped_name_shape() {
        let name = timestamped_name("adjusted");
        assert!(name.starts_with("adjusted-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let payload = ImagePayload::from_bytes("junk.bin", vec![1, 2, 3, 4]);
        assert!(payload.decode().is_err());
    }
}

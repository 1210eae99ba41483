use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};

use crate::error::Result;

const FILE_STEM: &str = "cropped-image";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    #[default]
    Jpeg,
    WebP,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::WebP];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// Whether the quality slider changes the output.
    pub fn is_lossy(self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }

    pub fn default_file_name(self) -> String {
        format!("{}.{}", FILE_STEM, self.extension())
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::WebP => "WebP",
        };
        write!(f, "{}", s)
    }
}

/// Encoder quality in `[0.1, 1.0]`; every constructor clamps.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Quality(f32);

impl Quality {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 1.0;
    pub const DEFAULT: Quality = Quality(0.92);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::DEFAULT;
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Quality on the 1-100 scale used by the JPEG encoder.
    pub fn as_percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<f32> for Quality {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for f32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Encode `image` into an in-memory file of the given format.
pub fn encode(image: &DynamicImage, format: OutputFormat, quality: Quality) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality.as_percent()).encode_image(&rgb)?;
        }
        OutputFormat::Png => {
            image.write_to(&mut buf, image::ImageFormat::Png)?;
        }
        OutputFormat::WebP => {
            // Lossless only in the image crate.
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_to(&mut buf, image::ImageFormat::WebP)?;
        }
    }
    Ok(buf.into_inner())
}

pub fn save(bytes: &[u8], path: &Path) -> Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Human-readable byte count for the preview dialog.
pub fn format_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{} B", bytes)
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.2} MiB", b / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn gradient(w: u32, h: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 255 / w) as u8, (y * 255 / h) as u8, 128, 200])
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(Quality::new(0.0).get(), Quality::MIN);
        assert_eq!(Quality::new(4.0).get(), Quality::MAX);
        assert_eq!(Quality::new(f32::NAN), Quality::DEFAULT);
        assert_eq!(Quality::new(0.5).as_percent(), 50);
    }

    #[test]
    fn quality_deserialization_clamps() {
        let q: Quality = serde_json::from_str("7.0").unwrap();
        assert_eq!(q.get(), 1.0);
    }

    #[test]
    fn file_names_follow_format() {
        assert_eq!(OutputFormat::Jpeg.default_file_name(), "cropped-image.jpg");
        assert_eq!(OutputFormat::Png.default_file_name(), "cropped-image.png");
        assert_eq!(OutputFormat::WebP.default_file_name(), "cropped-image.webp");
        assert_eq!(OutputFormat::WebP.mime_type(), "image/webp");
    }

    #[test]
    fn encodes_each_format_with_its_signature() {
        let img = gradient(16, 8);

        let png = encode(&img, OutputFormat::Png, Quality::DEFAULT).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let jpeg = encode(&img, OutputFormat::Jpeg, Quality::DEFAULT).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8, 0xFF]));

        let webp = encode(&img, OutputFormat::WebP, Quality::DEFAULT).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn encoded_output_keeps_dimensions() {
        let img = gradient(21, 13);
        let jpeg = encode(&img, OutputFormat::Jpeg, Quality::new(0.5)).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (21, 13));
    }

    #[test]
    fn lower_jpeg_quality_is_smaller() {
        let img = gradient(64, 64);
        let high = encode(&img, OutputFormat::Jpeg, Quality::MAX.into()).unwrap();
        let low = encode(&img, OutputFormat::Jpeg, Quality::MIN.into()).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn size_labels() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MiB");
    }
}

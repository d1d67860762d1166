use chrono::{DateTime, Local};
use exif::{In, Reader, Tag};
use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

pub const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub processed_at: DateTime<Local>,
    pub dimensions: Option<(u32, u32)>,
}

impl FileSummary {
    pub fn describe(name: &str, mime_type: &str, payload: &[u8]) -> Self {
        let dimensions = if mime_type.starts_with("image/") {
            read_dimensions(payload)
        } else {
            None
        };

        Self {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes: payload.len() as u64,
            processed_at: Local::now(),
            dimensions,
        }
    }

    pub fn size_kb(&self) -> String {
        format!("{:.2} KB", self.size_bytes as f64 / 1024.0)
    }
}

/// MIME type for a file name, by extension.
pub fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

// Decoded header size first; EXIF covers formats the decoder set lacks.
fn read_dimensions(payload: &[u8]) -> Option<(u32, u32)> {
    header_dimensions(payload).or_else(|| exif_dimensions(payload))
}

fn header_dimensions(payload: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(payload))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn exif_dimensions(payload: &[u8]) -> Option<(u32, u32)> {
    let mut cursor = Cursor::new(payload);
    let exif = Reader::new().read_from_container(&mut cursor).ok()?;
    let width = exif
        .get_field(Tag::PixelXDimension, In::PRIMARY)?
        .value
        .get_uint(0)?;
    let height = exif
        .get_field(Tag::PixelYDimension, In::PRIMARY)?
        .value
        .get_uint(0)?;
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_size_in_kb() {
        let summary = FileSummary::describe("a.bin", FALLBACK_MIME, &[0u8; 1536]);
        assert_eq!(summary.size_bytes, 1536);
        assert_eq!(summary.size_kb(), "1.50 KB");
        assert!(summary.dimensions.is_none());
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn png_dimensions_come_from_the_header() {
        let summary = FileSummary::describe("a.png", "image/png", &png_bytes(3, 2));
        assert_eq!(summary.dimensions, Some((3, 2)));
    }

    #[test]
    fn non_image_mime_skips_decoding() {
        let summary = FileSummary::describe("a.bin", FALLBACK_MIME, &png_bytes(1, 1));
        assert!(summary.dimensions.is_none());
    }

    #[test]
    fn image_without_exif_has_no_dimensions() {
        let summary = FileSummary::describe("a.jpg", "image/jpeg", b"not really a jpeg");
        assert!(summary.dimensions.is_none());
    }

    #[test]
    fn guesses_mime_from_name() {
        assert_eq!(guess_mime("photo.PNG"), "image/png");
        assert_eq!(guess_mime("notes.txt"), "text/plain");
        assert_eq!(guess_mime("mystery"), FALLBACK_MIME);
    }
}

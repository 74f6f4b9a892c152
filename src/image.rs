//! Images for worksheets: format sniffing, pixel size and DPI extraction,
//! and the content hash used to store each distinct picture once.

use std::io::Cursor;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::drawing::ObjectMovement;
use crate::error::{Result, WriteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageType {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpeg => "jpeg",
            ImageType::Gif => "gif",
            ImageType::Bmp => "bmp",
        }
    }
}

/// A picture to insert into a worksheet or embed in a cell.
#[derive(Debug, Clone)]
pub struct Image {
    pub(crate) data: Vec<u8>,
    pub(crate) image_type: ImageType,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) x_dpi: f64,
    pub(crate) y_dpi: f64,
    pub(crate) hash: String,
    pub(crate) scale_width: f64,
    pub(crate) scale_height: f64,
    pub(crate) alt_text: String,
    pub(crate) decorative: bool,
    pub(crate) movement: ObjectMovement,
    pub(crate) name: String,
}

impl Image {
    /// Load an image from disk.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Image> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mut image = Self::new_from_buffer(&data).map_err(|e| match e {
            WriteError::ImageFormat(_) => WriteError::ImageFormat(path.display().to_string()),
            other => other,
        })?;
        image.name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(image)
    }

    /// Build an image from encoded PNG/JPEG/GIF/BMP bytes.
    pub fn new_from_buffer(bytes: &[u8]) -> Result<Image> {
        let image_type = match image::guess_format(bytes) {
            Ok(image::ImageFormat::Png) => ImageType::Png,
            Ok(image::ImageFormat::Jpeg) => ImageType::Jpeg,
            Ok(image::ImageFormat::Gif) => ImageType::Gif,
            Ok(image::ImageFormat::Bmp) => ImageType::Bmp,
            _ => return Err(WriteError::ImageFormat("<buffer>".to_string())),
        };

        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|_| WriteError::ImageFormat("<buffer>".to_string()))?
            .into_dimensions()
            .map_err(|_| WriteError::ImageFormat("<buffer>".to_string()))?;

        let (x_dpi, y_dpi) = match image_type {
            ImageType::Png => png_dpi(bytes),
            ImageType::Jpeg => jpeg_dpi(bytes),
            ImageType::Bmp => bmp_dpi(bytes),
            ImageType::Gif => None,
        }
        .filter(|(x, y)| *x > 0.0 && *y > 0.0)
        .unwrap_or((96.0, 96.0));

        let hash = format!("{:x}", Sha256::digest(bytes));
        log::debug!(
            "decoded {} image {}x{} at {}x{} dpi",
            image_type.extension(),
            width,
            height,
            x_dpi,
            y_dpi
        );

        Ok(Image {
            data: bytes.to_vec(),
            image_type,
            width: width as f64,
            height: height as f64,
            x_dpi,
            y_dpi,
            hash,
            scale_width: 1.0,
            scale_height: 1.0,
            alt_text: String::new(),
            decorative: false,
            movement: ObjectMovement::MoveButDontSizeWithCells,
            name: String::new(),
        })
    }

    pub fn set_scale_width(mut self, scale: f64) -> Self {
        if scale > 0.0 {
            self.scale_width = scale;
        }
        self
    }

    pub fn set_scale_height(mut self, scale: f64) -> Self {
        if scale > 0.0 {
            self.scale_height = scale;
        }
        self
    }

    /// Scale so the image fits a `width` x `height` pixel box.
    pub fn set_scale_to_size(mut self, width: f64, height: f64, keep_aspect_ratio: bool) -> Self {
        if width <= 0.0 || height <= 0.0 {
            return self;
        }
        let native_w = self.width * 96.0 / self.x_dpi;
        let native_h = self.height * 96.0 / self.y_dpi;
        let mut sw = width / native_w;
        let mut sh = height / native_h;
        if keep_aspect_ratio {
            let s = sw.min(sh);
            sw = s;
            sh = s;
        }
        self.scale_width = sw;
        self.scale_height = sh;
        self
    }

    pub fn set_alt_text(mut self, alt_text: &str) -> Self {
        self.alt_text = alt_text.to_string();
        self
    }

    pub fn set_decorative(mut self, decorative: bool) -> Self {
        self.decorative = decorative;
        self
    }

    pub fn set_object_movement(mut self, movement: ObjectMovement) -> Self {
        self.movement = movement;
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn x_dpi(&self) -> f64 {
        self.x_dpi
    }

    pub fn y_dpi(&self) -> f64 {
        self.y_dpi
    }

    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Displayed size in pixels after DPI normalization and scaling.
    pub(crate) fn display_size(&self) -> (f64, f64) {
        (
            self.width * self.scale_width * 96.0 / self.x_dpi,
            self.height * self.scale_height * 96.0 / self.y_dpi,
        )
    }
}

fn be_u16(b: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes(b.get(at..at + 2)?.try_into().ok()?))
}

fn be_u32(b: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(b.get(at..at + 4)?.try_into().ok()?))
}

fn le_i32(b: &[u8], at: usize) -> Option<i32> {
    Some(i32::from_le_bytes(b.get(at..at + 4)?.try_into().ok()?))
}

/// DPI from the PNG `pHYs` chunk (unit 1 = pixels per metre).
fn png_dpi(bytes: &[u8]) -> Option<(f64, f64)> {
    let mut offset = 8;
    while offset + 8 <= bytes.len() {
        let length = be_u32(bytes, offset)? as usize;
        let chunk = bytes.get(offset + 4..offset + 8)?;
        match chunk {
            b"pHYs" => {
                let data = offset + 8;
                let x = be_u32(bytes, data)? as f64;
                let y = be_u32(bytes, data + 4)? as f64;
                let unit = *bytes.get(data + 8)?;
                if unit == 1 {
                    return Some(((x * 0.0254).round(), (y * 0.0254).round()));
                }
                return None;
            }
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }
        offset += 12 + length;
    }
    None
}

/// DPI from a JFIF APP0 segment (units 1 = dpi, 2 = dots per cm).
fn jpeg_dpi(bytes: &[u8]) -> Option<(f64, f64)> {
    let mut offset = 2;
    while offset + 4 <= bytes.len() {
        if bytes[offset] != 0xFF {
            return None;
        }
        let marker = bytes[offset + 1];
        let length = be_u16(bytes, offset + 2)? as usize;
        if marker == 0xE0 && bytes.get(offset + 4..offset + 9) == Some(b"JFIF\0") {
            let units = *bytes.get(offset + 11)?;
            let x = be_u16(bytes, offset + 12)? as f64;
            let y = be_u16(bytes, offset + 14)? as f64;
            return match units {
                1 => Some((x, y)),
                2 => Some(((x * 2.54).round(), (y * 2.54).round())),
                _ => None,
            };
        }
        // Start of scan: no more metadata segments.
        if marker == 0xDA {
            return None;
        }
        offset += 2 + length;
    }
    None
}

/// DPI from the BITMAPINFOHEADER resolution fields (pixels per metre).
fn bmp_dpi(bytes: &[u8]) -> Option<(f64, f64)> {
    let x = le_i32(bytes, 38)? as f64;
    let y = le_i32(bytes, 42)? as f64;
    Some(((x * 0.0254).round(), (y * 0.0254).round()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A valid 2x3 RGB PNG, optionally with a pHYs chunk.
    pub(crate) fn tiny_png(ppm: Option<u32>) -> Vec<u8> {
        let mut buf = Vec::new();
        let img = image::RgbImage::from_pixel(2, 3, image::Rgb([255, 0, 0]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        if let Some(ppm) = ppm {
            // Insert pHYs right after IHDR (8 byte signature + 25 byte IHDR).
            let mut chunk = Vec::new();
            chunk.extend_from_slice(&9u32.to_be_bytes());
            chunk.extend_from_slice(b"pHYs");
            chunk.extend_from_slice(&ppm.to_be_bytes());
            chunk.extend_from_slice(&ppm.to_be_bytes());
            chunk.push(1);
            chunk.extend_from_slice(&[0, 0, 0, 0]);
            buf.splice(33..33, chunk);
        }
        buf
    }

    #[test]
    fn test_png_dimensions_and_default_dpi() {
        let image = Image::new_from_buffer(&tiny_png(None)).unwrap();
        assert_eq!(image.image_type(), ImageType::Png);
        assert_eq!((image.width(), image.height()), (2.0, 3.0));
        assert_eq!((image.x_dpi(), image.y_dpi()), (96.0, 96.0));
        assert_eq!(image.hash().len(), 64);
    }

    #[test]
    fn test_png_phys_dpi() {
        assert_eq!(png_dpi(&tiny_png(Some(5906))), Some((150.0, 150.0)));
    }

    #[test]
    fn test_jfif_dpi() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        jpeg.extend_from_slice(b"JFIF\0");
        jpeg.extend_from_slice(&[1, 1, 1, 0x00, 0x48, 0x00, 0x48, 0, 0]);
        assert_eq!(jpeg_dpi(&jpeg), Some((72.0, 72.0)));
    }

    #[test]
    fn test_same_bytes_same_hash() {
        let a = Image::new_from_buffer(&tiny_png(None)).unwrap();
        let b = Image::new_from_buffer(&tiny_png(None)).unwrap();
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_rejects_unknown_format() {
        let err = Image::new_from_buffer(b"definitely not an image").unwrap_err();
        assert!(matches!(err, WriteError::ImageFormat(_)));
    }

    #[test]
    fn test_display_size_scales_by_dpi() {
        let image = Image::new_from_buffer(&tiny_png(None))
            .unwrap()
            .set_scale_width(2.0);
        assert_eq!(image.display_size(), (4.0, 3.0));
    }
}

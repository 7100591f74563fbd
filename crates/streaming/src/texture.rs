use foundation::Handle;

use crate::source::TextureError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
}

/// Non-owning reference to a decoded texture held by the
/// [`TextureCache`](crate::TextureCache).
///
/// Only valid while the cache that issued it has not been torn down; look the
/// pixels up through the cache rather than holding on to them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureHandle {
    pub id: Handle,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub width: u32,
    pub height: u32,
}

/// RGBA8 pixels, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    pub fn byte_len(&self) -> usize {
        self.rgba.len()
    }
}

/// Decode PNG/JPEG bytes into RGBA8.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, TextureError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty);
    }
    Ok(DecodedImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
pub(crate) fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

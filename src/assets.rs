use std::sync::Arc;

pub mod decode;
pub mod source;

/// Largest accepted source edge; the CPU rasterizer addresses pixmaps with `u16`.
pub const MAX_SOURCE_EDGE: u32 = u16::MAX as u32;

/// An immutable decoded upload.
///
/// Cloning is cheap; every clone shares the same pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl SourceImage {
    /// Wrap premultiplied RGBA8 pixels (row-major, tightly packed).
    pub fn from_premul_rgba8(
        width: u32,
        height: u32,
        rgba8_premul: Vec<u8>,
    ) -> crate::BackdropResult<Self> {
        if width == 0 || height == 0 {
            return Err(crate::BackdropError::decode("image has zero width or height"));
        }
        if width > MAX_SOURCE_EDGE || height > MAX_SOURCE_EDGE {
            return Err(crate::BackdropError::decode(format!(
                "image {width}x{height} exceeds {MAX_SOURCE_EDGE} px per edge"
            )));
        }
        if rgba8_premul.len() as u64 != u64::from(width) * u64::from(height) * 4 {
            return Err(crate::BackdropError::decode(
                "pixel buffer length does not match width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Natural width in pixels, always > 0.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels, always > 0.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba8_premul(&self) -> &[u8] {
        self.rgba8_premul.as_slice()
    }
}

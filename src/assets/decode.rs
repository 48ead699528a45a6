use anyhow::Context;

use crate::{
    BackdropError, BackdropResult,
    assets::{MAX_SOURCE_EDGE, SourceImage},
};

/// Decode an uploaded file into a [`SourceImage`].
///
/// Bytes that do not sniff as a known raster format are refused before decoding, the same way a
/// file picker refuses anything that is not `image/*`.
pub fn decode_image(bytes: &[u8]) -> BackdropResult<SourceImage> {
    let format = image::guess_format(bytes)
        .map_err(|_| BackdropError::validation("upload is not a recognized image file"))?;

    let dyn_img = image::load_from_memory_with_format(bytes, format)
        .with_context(|| format!("decode {format:?} image from memory"))
        .map_err(|e| BackdropError::decode(format!("{e:#}")))?;
    if dyn_img.width() > MAX_SOURCE_EDGE || dyn_img.height() > MAX_SOURCE_EDGE {
        return Err(BackdropError::decode(format!(
            "image {}x{} exceeds {MAX_SOURCE_EDGE} px per edge",
            dyn_img.width(),
            dyn_img.height()
        )));
    }

    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    tracing::debug!(?format, width, height, "decoded source image");
    SourceImage::from_premul_rgba8(width, height, rgba8_premul)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

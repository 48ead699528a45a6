//! Pure placement math shared by every surface the pipeline draws on.
//!
//! All rounding goes through [`f64::round`] (half away from zero) so preview and export agree on
//! every pixel edge.

use crate::foundation::{
    core::Rect,
    error::{BackdropError, BackdropResult},
};

/// Size of the source after applying a percentage scale.
pub fn scaled_dimensions(natural_w: u32, natural_h: u32, scale_percent: u32) -> (u32, u32) {
    let factor = f64::from(scale_percent) / 100.0;
    (scale_axis(natural_w, factor), scale_axis(natural_h, factor))
}

/// Top-left corner that centers `content` on `surface`.
///
/// Negative when the content is larger than the surface; the draw is then clipped.
pub fn centered_position(
    surface_w: u32,
    surface_h: u32,
    content_w: u32,
    content_h: u32,
) -> (i64, i64) {
    (
        center_axis(surface_w, content_w),
        center_axis(surface_h, content_h),
    )
}

/// Smallest uniform scale at which `content` covers `surface` on both axes.
pub fn cover_scale(
    content_w: u32,
    content_h: u32,
    surface_w: u32,
    surface_h: u32,
) -> BackdropResult<f64> {
    if content_w == 0 || content_h == 0 {
        return Err(BackdropError::validation(
            "cover scale requires non-zero content dimensions",
        ));
    }
    let sx = f64::from(surface_w) / f64::from(content_w);
    let sy = f64::from(surface_h) / f64::from(content_h);
    Ok(sx.max(sy))
}

/// Destination rectangle for a cover-fit draw of `content` onto `surface`.
pub fn cover_rect(
    content_w: u32,
    content_h: u32,
    surface_w: u32,
    surface_h: u32,
) -> BackdropResult<Rect> {
    let scale = cover_scale(content_w, content_h, surface_w, surface_h)?;
    let w = scale_axis(content_w, scale);
    let h = scale_axis(content_h, scale);
    let (x, y) = centered_position(surface_w, surface_h, w, h);
    Ok(placed_rect(x, y, w, h))
}

/// Stroke rectangle for a border straddling the edge of `image`.
pub fn border_rect(image: Rect, border_width: u32) -> Rect {
    image.inflate(f64::from(border_width) / 2.0, f64::from(border_width) / 2.0)
}

pub fn placed_rect(x: i64, y: i64, w: u32, h: u32) -> Rect {
    Rect::from_origin_size((x as f64, y as f64), (f64::from(w), f64::from(h)))
}

fn scale_axis(v: u32, factor: f64) -> u32 {
    (f64::from(v) * factor).round().max(0.0) as u32
}

fn center_axis(surface: u32, content: u32) -> i64 {
    ((i64::from(surface) - i64::from(content)) as f64 / 2.0).round() as i64
}

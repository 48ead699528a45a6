use crate::{
    BackdropResult,
    assets::SourceImage,
    foundation::core::{Rect, Rgb8},
};

/// Gaussian blur applied to every draw while set on a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Blur {
    /// Kernel radius in pixels.
    pub radius_px: u32,
}

impl Blur {
    /// Standard deviation used with [`Blur::radius_px`].
    pub fn sigma(self) -> f32 {
        self.radius_px as f32 / 2.0
    }
}

/// A 2D raster target the composition pipeline can draw on.
///
/// Mirrors the small subset of a canvas context the pipeline needs. Coordinates are in pixels
/// with the origin at the top-left; anything outside `[0, 0, width, height]` is clipped.
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Set the pixel size. Always discards the current contents and resets the blur.
    fn resize(&mut self, width: u32, height: u32) -> BackdropResult<()>;

    /// Set every pixel in `rect` to transparent.
    fn clear_rect(&mut self, rect: Rect) -> BackdropResult<()>;

    fn fill_rect(&mut self, rect: Rect, color: Rgb8) -> BackdropResult<()>;

    /// Stroke the outline of `rect`, centered on its edges, `line_width` pixels thick.
    fn stroke_rect(&mut self, rect: Rect, color: Rgb8, line_width: f64) -> BackdropResult<()>;

    /// Draw `image` resampled to exactly fill `dest`.
    fn draw_image(&mut self, image: &SourceImage, dest: Rect) -> BackdropResult<()>;

    /// Blur applied to every following draw until cleared with `None`.
    fn set_blur(&mut self, blur: Option<Blur>) -> BackdropResult<()>;

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width()), f64::from(self.height()))
    }
}

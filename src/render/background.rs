use crate::{
    BackdropResult,
    assets::SourceImage,
    foundation::core::Rgb8,
    geometry::cover_rect,
    render::surface::{Blur, Surface},
    settings::{BackgroundType, RenderSettings},
};

/// Blur applied to the image background. A presentation constant, not a setting.
pub const BACKGROUND_BLUR: Blur = Blur { radius_px: 10 };

/// What fills the canvas before the foreground is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Background<'a> {
    Color(Rgb8),
    /// Blurred, cover-fitted copy of the source.
    Image(&'a SourceImage),
}

impl<'a> Background<'a> {
    /// Pick the variant for `settings`.
    ///
    /// An image background with nothing uploaded falls back to the configured color.
    pub fn select(settings: &RenderSettings, source: Option<&'a SourceImage>) -> Self {
        match (settings.background_type, source) {
            (BackgroundType::Image, Some(image)) => Self::Image(image),
            (BackgroundType::Image, None) => {
                tracing::debug!("image background requested without a source; using color");
                Self::Color(settings.background_color)
            }
            (BackgroundType::Color, _) => Self::Color(settings.background_color),
        }
    }
}

/// Fill the whole surface with `background`.
pub fn draw_background<S: Surface + ?Sized>(
    surface: &mut S,
    background: Background<'_>,
) -> BackdropResult<()> {
    let full = surface.bounds();
    surface.clear_rect(full)?;
    match background {
        Background::Color(color) => surface.fill_rect(full, color),
        Background::Image(image) => {
            let dest = cover_rect(
                image.width(),
                image.height(),
                surface.width(),
                surface.height(),
            )?;
            surface.set_blur(Some(BACKGROUND_BLUR))?;
            let drawn = surface.draw_image(image, dest);
            surface.set_blur(None)?;
            drawn
        }
    }
}

use crate::{
    BackdropResult,
    assets::SourceImage,
    render::{
        background::{Background, draw_background},
        foreground::{ForegroundPlacement, draw_foreground},
        surface::Surface,
    },
    settings::RenderSettings,
};

/// Run one full composition pass on `surface`.
///
/// Pipeline:
/// 1. resize to `settings.output_width` x `settings.output_height`
/// 2. background ([`Background::select`])
/// 3. foreground image and border, only when a source is present
///
/// Nothing carries over between calls: identical inputs always produce identical pixels, whatever
/// the surface held before.
#[tracing::instrument(
    skip_all,
    fields(
        width = settings.output_width,
        height = settings.output_height,
        background = ?settings.background_type,
        has_source = source.is_some(),
    )
)]
pub fn compose<S: Surface + ?Sized>(
    surface: &mut S,
    source: Option<&SourceImage>,
    settings: &RenderSettings,
) -> BackdropResult<Option<ForegroundPlacement>> {
    surface.resize(settings.output_width, settings.output_height)?;
    draw_background(surface, Background::select(settings, source))?;

    let Some(image) = source else {
        tracing::debug!("no source loaded; background only");
        return Ok(None);
    };
    let placed = draw_foreground(surface, image, settings)?;
    tracing::debug!(image = ?placed.image, border = ?placed.border, "composed");
    Ok(Some(placed))
}

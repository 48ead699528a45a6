use std::path::Path;

use anyhow::Context as _;

use crate::{
    BackdropResult,
    assets::source::SourceSlot,
    render::{CpuSurface, Surface, compose},
    settings::RenderSettings,
};

/// The always-visible canvas.
///
/// Owns one long-lived surface that is resized in place and fully redrawn on every
/// [`Preview::refresh`].
#[derive(Debug)]
pub struct Preview {
    surface: CpuSurface,
    renders: u64,
}

impl Preview {
    pub fn new(settings: &RenderSettings) -> BackdropResult<Self> {
        Ok(Self {
            surface: CpuSurface::new(settings.output_width, settings.output_height)?,
            renders: 0,
        })
    }

    /// Redraw after a settings change or a new upload.
    pub fn refresh(
        &mut self,
        settings: &RenderSettings,
        source: &SourceSlot,
    ) -> BackdropResult<()> {
        compose(&mut self.surface, source.current_image(), settings)?;
        self.renders += 1;
        tracing::debug!(
            renders = self.renders,
            width = self.surface.width(),
            height = self.surface.height(),
            "preview refreshed"
        );
        Ok(())
    }

    pub fn surface(&self) -> &CpuSurface {
        &self.surface
    }

    /// Number of completed refreshes.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Write what the preview currently shows to `path` as PNG.
    pub fn snapshot_png(&self, path: &Path) -> BackdropResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create preview dir '{}'", parent.display()))?;
        }
        self.surface
            .to_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write preview png '{}'", path.display()))?;
        Ok(())
    }
}

use std::{
    fs::{File, OpenOptions},
    io::{Cursor, ErrorKind, Write as _},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    BackdropError, BackdropResult,
    assets::source::SourceSlot,
    render::{CpuSurface, Surface, compose},
    settings::RenderSettings,
};

pub const EXPORT_FILE_PREFIX: &str = "image-with-bg-";
pub const EXPORT_FILE_EXTENSION: &str = "png";

/// Later timestamps tried when the requested name is already taken.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// One written download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exported {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// `image-with-bg-<ms since epoch, 13 digits>.png`
pub fn export_file_name(epoch_ms: u64) -> String {
    format!("{EXPORT_FILE_PREFIX}{epoch_ms:013}.{EXPORT_FILE_EXTENSION}")
}

pub fn now_epoch_ms() -> BackdropResult<u64> {
    let since = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BackdropError::export(format!("system clock before unix epoch: {e}")))?;
    u64::try_from(since.as_millis())
        .map_err(|_| BackdropError::export("timestamp does not fit in u64"))
}

/// Compose onto a freshly allocated surface sized by `settings`.
///
/// Requires an upload; the export surface is never shared with the preview.
pub fn render_export(
    settings: &RenderSettings,
    source: &SourceSlot,
) -> BackdropResult<CpuSurface> {
    if source.current_image_data().is_none() {
        return Err(BackdropError::validation(
            "nothing to export: upload an image first",
        ));
    }
    let mut surface = CpuSurface::new(settings.output_width, settings.output_height)?;
    compose(&mut surface, source.current_image(), settings)?;
    Ok(surface)
}

pub fn encode_png(surface: &CpuSurface) -> BackdropResult<Vec<u8>> {
    let img = surface.to_image()?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| BackdropError::export(format!("encode png: {e}")))?;
    Ok(buf)
}

/// Render, encode and write one PNG into `dir`, named from the current time.
///
/// Never overwrites: if the name for `epoch_ms` exists, the next free millisecond is used.
pub fn export_to_dir(
    dir: &Path,
    settings: &RenderSettings,
    source: &SourceSlot,
) -> BackdropResult<Exported> {
    export_to_dir_at(dir, settings, source, now_epoch_ms()?)
}

pub fn export_to_dir_at(
    dir: &Path,
    settings: &RenderSettings,
    source: &SourceSlot,
    epoch_ms: u64,
) -> BackdropResult<Exported> {
    let surface = render_export(settings, source)?;
    let png = encode_png(&surface)?;

    std::fs::create_dir_all(dir).map_err(|e| {
        BackdropError::export(format!("create output dir '{}': {e}", dir.display()))
    })?;
    let (path, mut f) = create_unique(dir, epoch_ms)?;
    f.write_all(&png)
        .map_err(|e| BackdropError::export(format!("write png '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), bytes = png.len(), "exported");
    Ok(Exported {
        path,
        width: surface.width(),
        height: surface.height(),
        bytes: png.len(),
    })
}

fn create_unique(dir: &Path, epoch_ms: u64) -> BackdropResult<(PathBuf, File)> {
    for ms in (epoch_ms..).take(MAX_NAME_ATTEMPTS) {
        let path = dir.join(export_file_name(ms));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => return Ok((path, f)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(path = %path.display(), "export name taken; trying next");
            }
            Err(e) => {
                return Err(BackdropError::export(format!(
                    "create '{}': {e}",
                    path.display()
                )));
            }
        }
    }
    Err(BackdropError::export(format!(
        "no free file name in '{}' after {MAX_NAME_ATTEMPTS} attempts",
        dir.display()
    )))
}

//! Backdrop places one image on a sized canvas over a solid color or a blurred, cover-fitted copy
//! of itself, optionally frames it with a border, and exports the result as PNG.
//!
//! The same [`compose`] pass drives both the live [`Preview`] surface and every export, so the
//! two always agree pixel for pixel.
#![forbid(unsafe_code)]

pub mod assets;
pub mod blur_cpu;
pub mod composite_cpu;
pub mod export;
pub mod foundation;
pub mod geometry;
pub mod preview;
pub mod render;
pub mod settings;

pub use assets::{SourceImage, decode::decode_image, source::SourceSlot};
pub use export::{Exported, export_file_name, export_to_dir, render_export};
pub use foundation::core::{Point, Rect, Rgb8, Size};
pub use foundation::error::{BackdropError, BackdropResult};
pub use preview::Preview;
pub use render::{
    BACKGROUND_BLUR, Background, Blur, CpuSurface, DrawCall, RecordingSurface, Surface, compose,
};
pub use settings::{
    BackgroundType, RenderSettings,
    form::{FieldUpdate, Rejections, SettingField, SettingsForm},
};

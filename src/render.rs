//! Surfaces and the composition pipeline that draws on them.

pub mod background;
pub mod compose;
pub mod cpu;
pub mod foreground;
pub mod recording;
pub mod surface;

pub use background::{BACKGROUND_BLUR, Background, draw_background};
pub use compose::compose;
pub use cpu::CpuSurface;
pub use foreground::{ForegroundPlacement, draw_foreground};
pub use recording::{DrawCall, RecordingSurface};
pub use surface::{Blur, Surface};

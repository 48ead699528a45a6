use std::fmt;

use crate::{
    BackdropError, BackdropResult,
    assets::SourceImage,
    foundation::core::{Rect, Rgb8},
    render::surface::{Blur, Surface},
};

/// One call made against a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Resize {
        width: u32,
        height: u32,
    },
    ClearRect(Rect),
    FillRect {
        rect: Rect,
        color: Rgb8,
    },
    StrokeRect {
        rect: Rect,
        color: Rgb8,
        line_width: f64,
    },
    DrawImage {
        /// Natural size of the drawn image.
        image: (u32, u32),
        dest: Rect,
        /// Blur in effect when the image was drawn.
        blur: Option<Blur>,
    },
    SetBlur(Option<Blur>),
}

impl fmt::Display for DrawCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn r(rect: &Rect) -> String {
            format!(
                "({}, {}, {}, {})",
                rect.x0,
                rect.y0,
                rect.width(),
                rect.height()
            )
        }
        match self {
            Self::Resize { width, height } => write!(f, "resize {width}x{height}"),
            Self::ClearRect(rect) => write!(f, "clear_rect {}", r(rect)),
            Self::FillRect { rect, color } => write!(f, "fill_rect {} {color}", r(rect)),
            Self::StrokeRect {
                rect,
                color,
                line_width,
            } => write!(f, "stroke_rect {} {color} width={line_width}", r(rect)),
            Self::DrawImage { image, dest, blur } => {
                write!(f, "draw_image {}x{} -> {}", image.0, image.1, r(dest))?;
                if let Some(b) = blur {
                    write!(f, " blur={}px", b.radius_px)?;
                }
                Ok(())
            }
            Self::SetBlur(Some(b)) => write!(f, "set_blur {}px", b.radius_px),
            Self::SetBlur(None) => write!(f, "set_blur none"),
        }
    }
}

/// A surface that draws nothing and remembers every call.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    blur: Option<Blur>,
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn blur(&self) -> Option<Blur> {
        self.blur
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) -> BackdropResult<()> {
        if width == 0 || height == 0 {
            return Err(BackdropError::render("surface size must be non-zero"));
        }
        self.width = width;
        self.height = height;
        self.blur = None;
        self.calls.push(DrawCall::Resize { width, height });
        Ok(())
    }

    fn clear_rect(&mut self, rect: Rect) -> BackdropResult<()> {
        self.calls.push(DrawCall::ClearRect(rect));
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb8) -> BackdropResult<()> {
        self.calls.push(DrawCall::FillRect { rect, color });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb8, line_width: f64) -> BackdropResult<()> {
        self.calls.push(DrawCall::StrokeRect {
            rect,
            color,
            line_width,
        });
        Ok(())
    }

    fn draw_image(&mut self, image: &SourceImage, dest: Rect) -> BackdropResult<()> {
        self.calls.push(DrawCall::DrawImage {
            image: (image.width(), image.height()),
            dest,
            blur: self.blur,
        });
        Ok(())
    }

    fn set_blur(&mut self, blur: Option<Blur>) -> BackdropResult<()> {
        self.blur = blur;
        self.calls.push(DrawCall::SetBlur(blur));
        Ok(())
    }
}

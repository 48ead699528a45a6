use std::sync::Arc;

use crate::{
    BackdropError, BackdropResult,
    assets::{SourceImage, decode::unpremultiply_rgba8_in_place},
    blur_cpu::GaussianBlur,
    composite_cpu::over_in_place,
    foundation::core::{Rect, Rgb8},
    render::surface::{Blur, Surface},
};

/// Premultiplied RGBA8 raster surface rasterized with `vello_cpu`.
///
/// Each draw call is rendered into a transparent scratch layer, optionally blurred, then
/// composited source-over onto the surface.
pub struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    blur: Option<(Blur, GaussianBlur)>,
    // Last kernel built; survives `set_blur(None)` and resizes.
    kernel_cache: Option<(Blur, GaussianBlur)>,
    image_cache: Option<(SourceImage, vello_cpu::Image)>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("blur", &self.blur.as_ref().map(|(b, _)| *b))
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> BackdropResult<Self> {
        let (w, h) = surface_dims(width, height)?;
        Ok(Self {
            width: w,
            height: h,
            pixmap: vello_cpu::Pixmap::new(w, h),
            blur: None,
            kernel_cache: None,
            image_cache: None,
        })
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Straight-alpha RGBA8 bytes, ready for encoding.
    pub fn to_rgba8_straight(&self) -> Vec<u8> {
        let mut out = self.data().to_vec();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    pub fn to_image(&self) -> BackdropResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width(), self.height(), self.to_rgba8_straight())
            .ok_or_else(|| BackdropError::render("surface buffer does not match its size"))
    }

    fn paint_layer(
        &mut self,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) -> BackdropResult<()> {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        draw(&mut ctx);
        ctx.flush();

        let mut layer = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut layer);

        match &self.blur {
            Some((_, kernel)) => {
                let blurred = kernel.apply(
                    layer.data_as_u8_slice(),
                    u32::from(self.width),
                    u32::from(self.height),
                )?;
                over_in_place(self.pixmap.data_as_u8_slice_mut(), &blurred)
            }
            None => over_in_place(self.pixmap.data_as_u8_slice_mut(), layer.data_as_u8_slice()),
        }
    }

    fn image_paint_for(&mut self, image: &SourceImage) -> BackdropResult<vello_cpu::Image> {
        if let Some((cached, paint)) = &self.image_cache
            && cached == image
        {
            return Ok(paint.clone());
        }

        let pixmap =
            image_premul_bytes_to_pixmap(image.rgba8_premul(), image.width(), image.height())?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache = Some((image.clone(), paint.clone()));
        Ok(paint)
    }
}

impl Surface for CpuSurface {
    fn width(&self) -> u32 {
        u32::from(self.width)
    }

    fn height(&self) -> u32 {
        u32::from(self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> BackdropResult<()> {
        let (w, h) = surface_dims(width, height)?;
        self.width = w;
        self.height = h;
        self.pixmap = vello_cpu::Pixmap::new(w, h);
        self.blur = None;
        Ok(())
    }

    fn clear_rect(&mut self, rect: Rect) -> BackdropResult<()> {
        let r = rect.intersect(self.bounds()).round();
        if r.is_zero_area() {
            return Ok(());
        }
        let stride = usize::from(self.width) * 4;
        let (x0, x1) = (r.x0 as usize * 4, r.x1 as usize * 4);
        let data = self.pixmap.data_as_u8_slice_mut();
        for row in data
            .chunks_exact_mut(stride)
            .skip(r.y0 as usize)
            .take((r.y1 - r.y0) as usize)
        {
            row[x0..x1].fill(0);
        }
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb8) -> BackdropResult<()> {
        self.paint_layer(|ctx| {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, 255));
            ctx.fill_rect(&rect_to_cpu(rect));
        })
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb8, line_width: f64) -> BackdropResult<()> {
        if !line_width.is_finite() || line_width <= 0.0 {
            return Err(BackdropError::render("stroke width must be > 0"));
        }
        let ring = stroke_ring(rect, line_width);
        self.paint_layer(|ctx| {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, 255));
            ctx.fill_path(&ring);
        })
    }

    fn draw_image(&mut self, image: &SourceImage, dest: Rect) -> BackdropResult<()> {
        if dest.is_zero_area() {
            return Ok(());
        }
        let paint = self.image_paint_for(image)?;
        let (w, h) = (f64::from(image.width()), f64::from(image.height()));
        let transform = vello_cpu::kurbo::Affine::translate((dest.x0, dest.y0))
            * vello_cpu::kurbo::Affine::scale_non_uniform(dest.width() / w, dest.height() / h);

        self.paint_layer(|ctx| {
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(transform);
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        })
    }

    fn set_blur(&mut self, blur: Option<Blur>) -> BackdropResult<()> {
        let Some(b) = blur.filter(|b| b.radius_px > 0) else {
            self.blur = None;
            return Ok(());
        };
        let kernel = match &self.kernel_cache {
            Some((cached, kernel)) if *cached == b => kernel.clone(),
            _ => {
                let kernel = GaussianBlur::new(b.radius_px, b.sigma()).map_err(|e| {
                    BackdropError::render(format!("blur {}px: {e}", b.radius_px))
                })?;
                self.kernel_cache = Some((b, kernel.clone()));
                kernel
            }
        };
        self.blur = Some((b, kernel));
        Ok(())
    }
}

fn surface_dims(width: u32, height: u32) -> BackdropResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| BackdropError::render("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| BackdropError::render("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(BackdropError::render("surface size must be non-zero"));
    }
    Ok((w, h))
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// Area covered by a mitered stroke of `rect`: the outer outline minus the inner one.
fn stroke_ring(rect: Rect, line_width: f64) -> vello_cpu::kurbo::BezPath {
    let half = line_width / 2.0;
    let outer = rect.inflate(half, half);
    let inner = rect.inflate(-half, -half);

    let mut path = vello_cpu::kurbo::BezPath::new();
    path.move_to((outer.x0, outer.y0));
    path.line_to((outer.x1, outer.y0));
    path.line_to((outer.x1, outer.y1));
    path.line_to((outer.x0, outer.y1));
    path.close_path();
    if inner.width() > 0.0 && inner.height() > 0.0 {
        // Opposite winding punches the hole under the non-zero rule.
        path.move_to((inner.x0, inner.y0));
        path.line_to((inner.x0, inner.y1));
        path.line_to((inner.x1, inner.y1));
        path.line_to((inner.x1, inner.y0));
        path.close_path();
    }
    path
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> BackdropResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| BackdropError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| BackdropError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(BackdropError::render("source image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

use crate::{
    BackdropResult,
    assets::SourceImage,
    foundation::core::Rect,
    geometry::{border_rect, centered_position, placed_rect, scaled_dimensions},
    render::surface::Surface,
    settings::RenderSettings,
};

/// Where the foreground landed on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForegroundPlacement {
    pub image: Rect,
    /// Stroked rectangle, when a border was drawn.
    pub border: Option<Rect>,
}

/// Draw `image` scaled and centered, then its border.
pub fn draw_foreground<S: Surface + ?Sized>(
    surface: &mut S,
    image: &SourceImage,
    settings: &RenderSettings,
) -> BackdropResult<ForegroundPlacement> {
    let (w, h) = scaled_dimensions(image.width(), image.height(), settings.scale_percent);
    let (x, y) = centered_position(surface.width(), surface.height(), w, h);
    let dest = placed_rect(x, y, w, h);
    surface.draw_image(image, dest)?;

    if settings.border_width == 0 {
        return Ok(ForegroundPlacement {
            image: dest,
            border: None,
        });
    }

    let border = border_rect(dest, settings.border_width);
    surface.stroke_rect(border, settings.border_color, f64::from(settings.border_width))?;
    Ok(ForegroundPlacement {
        image: dest,
        border: Some(border),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        foundation::core::Rgb8,
        render::recording::{DrawCall, RecordingSurface},
    };

    fn image(w: u32, h: u32) -> SourceImage {
        SourceImage::from_premul_rgba8(w, h, vec![0; (w * h * 4) as usize]).unwrap()
    }

    fn surface(w: u32, h: u32) -> RecordingSurface {
        let mut s = RecordingSurface::new();
        s.resize(w, h).unwrap();
        s.take_calls();
        s
    }

    #[test]
    fn border_is_outset_by_half_its_width() {
        // 400x250 surface puts a 200x150 image at (100, 50).
        let mut s = surface(400, 250);
        let settings = RenderSettings {
            border_width: 10,
            border_color: Rgb8::new(200, 0, 0),
            ..RenderSettings::default()
        };
        let placed = draw_foreground(&mut s, &image(200, 150), &settings).unwrap();

        let dest = Rect::from_origin_size((100.0, 50.0), (200.0, 150.0));
        let border = Rect::from_origin_size((95.0, 45.0), (210.0, 160.0));
        assert_eq!(placed.image, dest);
        assert_eq!(placed.border, Some(border));
        assert_eq!(
            s.calls(),
            &[
                DrawCall::DrawImage {
                    image: (200, 150),
                    dest,
                    blur: None
                },
                DrawCall::StrokeRect {
                    rect: border,
                    color: Rgb8::new(200, 0, 0),
                    line_width: 10.0
                },
            ]
        );
    }

    #[test]
    fn zero_border_makes_no_stroke_call() {
        let mut s = surface(400, 250);
        let placed = draw_foreground(&mut s, &image(200, 150), &RenderSettings::default()).unwrap();
        assert_eq!(placed.border, None);
        assert_eq!(s.count(|c| matches!(c, DrawCall::StrokeRect { .. })), 0);
        assert_eq!(s.calls().len(), 1);
    }

    #[test]
    fn scale_is_applied_before_centering() {
        let mut s = surface(800, 600);
        let settings = RenderSettings {
            scale_percent: 50,
            ..RenderSettings::default()
        };
        let placed = draw_foreground(&mut s, &image(401, 300), &settings).unwrap();
        // 200.5 rounds up to 201; (800 - 201) / 2 = 299.5 rounds up to 300.
        assert_eq!(
            placed.image,
            Rect::from_origin_size((300.0, 225.0), (201.0, 150.0))
        );
    }

    #[test]
    fn oversized_image_gets_negative_origin() {
        let mut s = surface(100, 100);
        let settings = RenderSettings {
            scale_percent: 200,
            ..RenderSettings::default()
        };
        let placed = draw_foreground(&mut s, &image(100, 60), &settings).unwrap();
        assert_eq!(
            placed.image,
            Rect::from_origin_size((-50.0, -10.0), (200.0, 120.0))
        );
    }
}

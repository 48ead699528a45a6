use std::io::Cursor;

use backdrop::{
    BackgroundType, Preview, RenderSettings, Rgb8, SourceSlot, Surface, render_export,
};

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn loaded(w: u32, h: u32, px: [u8; 4]) -> SourceSlot {
    let mut slot = SourceSlot::new();
    slot.load_bytes(png_bytes(w, h, px)).unwrap();
    slot
}

fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [data[i], data[i + 1], data[i + 2], data[i + 3]]
}

fn assert_close(actual: [u8; 4], expected: [u8; 4]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!(a.abs_diff(e) <= 1, "got {actual:?}, expected {expected:?}");
    }
}

fn settings_grid() -> Vec<RenderSettings> {
    vec![
        RenderSettings {
            output_width: 320,
            output_height: 240,
            ..RenderSettings::default()
        },
        RenderSettings {
            output_width: 300,
            output_height: 200,
            scale_percent: 150,
            background_type: BackgroundType::Image,
            border_width: 6,
            border_color: Rgb8::new(200, 0, 0),
            ..RenderSettings::default()
        },
        RenderSettings {
            output_width: 150,
            output_height: 400,
            scale_percent: 25,
            background_color: Rgb8::new(12, 34, 56),
            border_width: 50,
            ..RenderSettings::default()
        },
    ]
}

#[test]
fn preview_and_export_are_pixel_identical() {
    let slot = loaded(96, 64, [40, 160, 220, 255]);
    let first = settings_grid()[0].clone();
    let mut preview = Preview::new(&first).unwrap();

    for settings in settings_grid() {
        preview.refresh(&settings, &slot).unwrap();
        let exported = render_export(&settings, &slot).unwrap();

        assert_eq!(preview.surface().width(), settings.output_width);
        assert_eq!(preview.surface().height(), settings.output_height);
        assert_eq!(exported.width(), settings.output_width);
        assert_eq!(exported.height(), settings.output_height);
        assert!(
            preview.surface().data() == exported.data(),
            "preview and export differ for {settings:?}"
        );
    }
    assert_eq!(preview.renders(), 3);
}

#[test]
fn repeated_refresh_is_idempotent() {
    let slot = loaded(50, 40, [250, 200, 10, 255]);
    let settings = RenderSettings {
        output_width: 200,
        output_height: 160,
        background_type: BackgroundType::Image,
        border_width: 3,
        ..RenderSettings::default()
    };
    let mut preview = Preview::new(&settings).unwrap();
    preview.refresh(&settings, &slot).unwrap();
    let once = preview.surface().data().to_vec();
    preview.refresh(&settings, &slot).unwrap();
    assert!(preview.surface().data() == once.as_slice());
}

#[test]
fn shrinking_the_preview_matches_a_fresh_render() {
    let slot = loaded(60, 60, [0, 0, 0, 255]);
    let big = RenderSettings {
        output_width: 640,
        output_height: 480,
        background_type: BackgroundType::Image,
        ..RenderSettings::default()
    };
    let small = RenderSettings {
        output_width: 120,
        output_height: 100,
        ..RenderSettings::default()
    };

    let mut preview = Preview::new(&big).unwrap();
    preview.refresh(&big, &slot).unwrap();
    preview.refresh(&small, &slot).unwrap();

    let fresh = render_export(&small, &slot).unwrap();
    assert_eq!(preview.surface().width(), 120);
    assert!(preview.surface().data() == fresh.data());
}

#[test]
fn color_scene_pixels() {
    let slot = loaded(100, 50, [20, 40, 60, 255]);
    let settings = RenderSettings {
        output_width: 200,
        output_height: 150,
        background_color: Rgb8::new(255, 255, 255),
        border_width: 10,
        border_color: Rgb8::new(0, 0, 0),
        ..RenderSettings::default()
    };
    let surface = render_export(&settings, &slot).unwrap();
    let data = surface.data();

    // image spans (50,50)-(150,100); border straddles its edge by 5px each way
    assert_close(pixel(data, 200, 0, 0), [255, 255, 255, 255]);
    assert_close(pixel(data, 200, 100, 75), [20, 40, 60, 255]);
    assert_close(pixel(data, 200, 47, 75), [0, 0, 0, 255]);
    assert_close(pixel(data, 200, 52, 75), [0, 0, 0, 255]);
    assert_close(pixel(data, 200, 40, 75), [255, 255, 255, 255]);
}

#[test]
fn background_only_when_nothing_is_loaded() {
    let settings = RenderSettings {
        output_width: 120,
        output_height: 100,
        background_type: BackgroundType::Image,
        background_color: Rgb8::new(0, 0, 255),
        ..RenderSettings::default()
    };
    let mut preview = Preview::new(&settings).unwrap();
    preview.refresh(&settings, &SourceSlot::new()).unwrap();
    let data = preview.surface().data();
    assert_close(pixel(data, 120, 0, 0), [0, 0, 255, 255]);
    assert_close(pixel(data, 120, 60, 50), [0, 0, 255, 255]);
}

use std::f64::consts::FRAC_PI_2;

use super::*;
use crate::render::surface::{StateGuard, TextAlign, TextBaseline};
use crate::text::FontSpec;

const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

fn empty_fonts() -> Arc<FontBook> {
    Arc::new(FontBook::new())
}

fn local_fonts() -> Option<Arc<FontBook>> {
    let bytes = std::fs::read(SYSTEM_FONT).ok()?;
    let mut book = FontBook::new();
    book.register_bytes(bytes).ok()?;
    Some(Arc::new(book))
}

/// Centroid of pixels with non-zero alpha.
fn ink_centroid(frame: &FrameRGBA) -> Option<(f64, f64, u32, u32)> {
    let (mut sx, mut sy, mut n) = (0.0, 0.0, 0.0);
    let (mut min_x, mut max_x) = (u32::MAX, 0);
    for y in 0..frame.height {
        for x in 0..frame.width {
            if frame.pixel(x, y).is_some_and(|p| p[3] > 0) {
                sx += f64::from(x) + 0.5;
                sy += f64::from(y) + 0.5;
                n += 1.0;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
            }
        }
    }
    (n > 0.0).then(|| (sx / n, sy / n, min_x, max_x))
}

#[test]
fn surface_dimensions_must_fit_u16_and_be_non_zero() {
    for (w, h) in [(0, 10), (10, 0), (65_536, 1), (1, 70_000)] {
        let err = CpuSurface::new(w, h, empty_fonts()).err().unwrap();
        assert!(matches!(err, TextBehindError::SurfaceUnavailable(_)), "{w}x{h}");
    }
    let s = CpuSurface::new(65_535, 1, empty_fonts()).unwrap();
    assert_eq!((s.width(), s.height()), (65_535, 1));
}

#[test]
fn new_surface_is_transparent() {
    let mut s = CpuSurface::new(4, 3, empty_fonts()).unwrap();
    let frame = s.snapshot().unwrap();
    assert_eq!((frame.width, frame.height), (4, 3));
    assert!(frame.premultiplied);
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn draw_image_at_origin_copies_pixels() {
    let mut s = CpuSurface::new(2, 2, empty_fonts()).unwrap();
    let img = RasterImage::from_straight(
        2,
        2,
        vec![
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ],
    )
    .unwrap();
    s.draw_image(&img, 0.0, 0.0).unwrap();
    let frame = s.snapshot().unwrap();
    assert_eq!(frame.data, *img.rgba8_premul);
}

#[test]
fn later_opaque_image_covers_earlier_one() {
    let mut s = CpuSurface::new(4, 4, empty_fonts()).unwrap();
    s.draw_image(&RasterImage::solid(4, 4, [255, 0, 0, 255]), 0.0, 0.0)
        .unwrap();
    s.draw_image(&RasterImage::solid(4, 4, [0, 0, 255, 255]), 0.0, 0.0)
        .unwrap();
    let frame = s.snapshot().unwrap();
    assert_eq!(frame.pixel(2, 2), Some([0, 0, 255, 255]));
}

#[test]
fn transparent_image_pixels_let_lower_layers_through() {
    let mut s = CpuSurface::new(2, 1, empty_fonts()).unwrap();
    s.draw_image(&RasterImage::solid(2, 1, [255, 0, 0, 255]), 0.0, 0.0)
        .unwrap();
    let top = RasterImage::from_straight(2, 1, vec![0, 0, 0, 0, 0, 255, 0, 255]).unwrap();
    s.draw_image(&top, 0.0, 0.0).unwrap();
    let frame = s.snapshot().unwrap();
    assert_eq!(frame.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(1, 0), Some([0, 255, 0, 255]));
}

#[test]
fn empty_text_is_a_noop_even_without_fonts() {
    let mut s = CpuSurface::new(8, 8, empty_fonts()).unwrap();
    s.fill_text("", 4.0, 4.0).unwrap();
    assert!(s.snapshot().unwrap().data.iter().all(|&b| b == 0));
}

#[test]
fn text_without_fonts_is_a_validation_error() {
    let mut s = CpuSurface::new(8, 8, empty_fonts()).unwrap();
    s.set_font(&FontSpec {
        size_px: 12.0,
        family: "Arial".into(),
    });
    let err = s.fill_text("A", 4.0, 4.0).unwrap_err();
    assert!(matches!(err, TextBehindError::Validation(ref m) if m.contains("12px Arial")));
}

#[test]
fn centered_text_ink_sits_on_anchor_with_local_font_if_present() {
    let Some(fonts) = local_fonts() else {
        return;
    };
    let mut s = CpuSurface::new(200, 100, fonts).unwrap();
    s.set_font(&FontSpec {
        size_px: 32.0,
        family: "DejaVu Sans".into(),
    });
    s.set_fill_color("black");
    s.set_text_align(TextAlign::Center);
    s.set_text_baseline(TextBaseline::Middle);
    s.fill_text("HOH", 100.0, 50.0).unwrap();

    let frame = s.snapshot().unwrap();
    let (cx, cy, min_x, max_x) = ink_centroid(&frame).unwrap();
    assert!((cx - 100.0).abs() < 3.0, "cx={cx}");
    assert!((cy - 50.0).abs() < 5.0, "cy={cy}");
    // Horizontal text is wider than tall.
    assert!(max_x - min_x > 32);
}

#[test]
fn rotated_text_ink_runs_vertically_with_local_font_if_present() {
    let Some(fonts) = local_fonts() else {
        return;
    };
    let mut s = CpuSurface::new(100, 200, fonts).unwrap();
    s.set_font(&FontSpec {
        size_px: 32.0,
        family: "DejaVu Sans".into(),
    });
    s.set_text_align(TextAlign::Center);
    s.set_text_baseline(TextBaseline::Middle);
    {
        let mut g = StateGuard::new(&mut s);
        g.rotate(-FRAC_PI_2);
        g.fill_text("HOH", -100.0, 50.0).unwrap();
    }
    assert_eq!(s.transform(), Affine::IDENTITY);

    let frame = s.snapshot().unwrap();
    let (cx, cy, min_x, max_x) = ink_centroid(&frame).unwrap();
    assert!((cx - 50.0).abs() < 5.0, "cx={cx}");
    assert!((cy - 100.0).abs() < 3.0, "cy={cy}");
    // Rotated text is narrower than a horizontal run of the same string.
    assert!(max_x - min_x < 40);
}

use super::*;
use crate::foundation::core::Rgba8;

#[test]
fn records_calls_in_order() {
    let mut s = RecordingSurface::new(4, 4);
    s.save();
    s.set_font(&FontSpec {
        size_px: 20.0,
        family: "Arial".into(),
    });
    s.set_fill_color("black");
    s.fill_text("", 1.0, 2.0).unwrap();
    s.restore();

    assert_eq!(s.ops()[0], SurfaceOp::Save);
    assert_eq!(s.ops()[1], SurfaceOp::SetFont("20px Arial".to_string()));
    assert_eq!(s.ops()[2], SurfaceOp::SetFillColor("black".to_string()));
    assert!(matches!(s.ops()[3], SurfaceOp::FillText(ref t) if t.text.is_empty()));
    assert_eq!(s.ops()[4], SurfaceOp::Restore);
    assert_eq!(s.text_draws().count(), 1);
}

#[test]
fn draw_image_composites_at_offset_and_clips() {
    let mut s = RecordingSurface::new(4, 4);
    let img = RasterImage::solid(2, 2, [255, 0, 0, 255]);
    s.draw_image(&img, 3.0, 1.0).unwrap();
    let frame = s.snapshot().unwrap();
    assert_eq!(frame.pixel(3, 1), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(3, 2), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(2, 1), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(3, 3), Some([0, 0, 0, 0]));
}

#[test]
fn draw_image_rejects_rotations() {
    let mut s = RecordingSurface::new(4, 4);
    s.rotate(0.5);
    let img = RasterImage::solid(1, 1, [0, 0, 0, 255]);
    assert!(s.draw_image(&img, 0.0, 0.0).is_err());
}

#[test]
fn empty_text_leaves_pixels_untouched() {
    let mut s = RecordingSurface::new(8, 8);
    s.set_font(&FontSpec {
        size_px: 8.0,
        family: "Arial".into(),
    });
    s.fill_text("", 4.0, 4.0).unwrap();
    assert!(s.snapshot().unwrap().data.iter().all(|&b| b == 0));
}

#[test]
fn text_block_is_centered_on_anchor() {
    let mut s = RecordingSurface::new(40, 40);
    s.set_font(&FontSpec {
        size_px: 10.0,
        family: "Arial".into(),
    });
    s.set_fill_color("#0000ff");
    s.set_text_align(TextAlign::Center);
    s.set_text_baseline(TextBaseline::Middle);
    // Two chars at 10px: a 12x10 block centered at (20, 20).
    s.fill_text("HI", 20.0, 20.0).unwrap();
    let frame = s.snapshot().unwrap();
    let blue = Rgba8::opaque(0, 0, 255).premultiplied().to_array();
    assert_eq!(frame.pixel(14, 15), Some(blue));
    assert_eq!(frame.pixel(25, 24), Some(blue));
    assert_eq!(frame.pixel(13, 20), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(26, 20), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(20, 14), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(20, 25), Some([0, 0, 0, 0]));
}

#[test]
fn text_draw_reports_device_anchor_and_angle() {
    let mut s = RecordingSurface::new(10, 10);
    s.rotate(-std::f64::consts::FRAC_PI_2);
    s.fill_text("x", -7.0, 3.0).unwrap();
    let draw = s.text_draws().next().unwrap();
    let p = draw.device_anchor();
    assert!((p.x - 3.0).abs() < 1e-9);
    assert!((p.y - 7.0).abs() < 1e-9);
    assert!((draw.device_angle() + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn provider_rejects_empty_surfaces() {
    let provider = RecordingSurfaceProvider;
    assert!(matches!(
        provider.create_surface(0, 5),
        Err(TextBehindError::SurfaceUnavailable(_))
    ));
    let s = provider.create_surface(3, 2).unwrap();
    assert_eq!((s.width(), s.height()), (3, 2));
}

use std::f64::consts::FRAC_PI_2;

use super::*;
use crate::foundation::error::TextBehindError;
use crate::render::recording::RecordingSurface;

fn approx(a: crate::foundation::core::Point, x: f64, y: f64) -> bool {
    (a.x - x).abs() < 1e-9 && (a.y - y).abs() < 1e-9
}

#[test]
fn restore_on_empty_stack_is_noop() {
    let mut stack = StateStack::default();
    stack.current_mut().text_align = TextAlign::End;
    stack.restore();
    assert_eq!(stack.current().text_align, TextAlign::End);
    assert_eq!(stack.depth(), 0);
}

#[test]
fn save_restore_round_trips_every_field() {
    let mut s = RecordingSurface::new(8, 8);
    let before = s.state().clone();
    s.save();
    s.rotate(0.3);
    s.set_font(&FontSpec {
        size_px: 40.0,
        family: "Impact".into(),
    });
    s.set_fill_color("red");
    s.set_text_align(TextAlign::Center);
    s.set_text_baseline(TextBaseline::Middle);
    assert_ne!(s.state(), &before);
    s.restore();
    assert_eq!(s.state(), &before);
}

#[test]
fn rotate_post_multiplies_about_origin() {
    let mut s = RecordingSurface::new(8, 8);
    s.translate(10.0, 0.0);
    s.rotate(-FRAC_PI_2);
    let p = s.transform() * crate::foundation::core::Point::new(0.0, 5.0);
    // (0, 5) rotated by -90 degrees is (5, 0), then translated.
    assert!(approx(p, 15.0, 0.0));
}

#[test]
fn unparseable_fill_keeps_previous_color() {
    let mut s = RecordingSurface::new(4, 4);
    s.set_fill_color("#00ff00");
    s.set_fill_color("not-a-color");
    assert_eq!(s.state().fill, Rgba8::opaque(0, 255, 0));
}

#[test]
fn guard_restores_on_drop_and_nests() {
    let mut s = RecordingSurface::new(8, 8);
    let before = s.state().clone();
    {
        let mut outer = StateGuard::new(&mut s);
        outer.rotate(1.0);
        let after_outer = outer.state().clone();
        {
            let mut inner = StateGuard::new(&mut *outer);
            inner.set_fill_color("blue");
            inner.translate(3.0, 4.0);
        }
        assert_eq!(outer.state(), &after_outer);
    }
    assert_eq!(s.state(), &before);
    assert_eq!(s.states().depth(), 0);
}

#[test]
fn guard_restores_on_early_error_return() {
    fn failing_draw(surface: &mut RecordingSurface) -> TextBehindResult<()> {
        let mut guard = StateGuard::new(surface);
        guard.rotate(-FRAC_PI_2);
        guard.set_fill_color("white");
        if guard.transform() != crate::foundation::core::Affine::IDENTITY {
            return Err(TextBehindError::validation("draw failed"));
        }
        guard.fill_text("never drawn", 0.0, 0.0)
    }

    let mut s = RecordingSurface::new(8, 8);
    let before = s.state().clone();
    assert!(failing_draw(&mut s).is_err());
    assert_eq!(s.state(), &before);
}

#[test]
fn anchor_offset_centers_on_both_axes() {
    // 100 wide, ascent 16, descent 4, baseline 16 from the top of the line box.
    let off = text_anchor_offset(100.0, 16.0, 4.0, 16.0, TextAlign::Center, TextBaseline::Middle);
    assert_eq!(off, Vec2::new(-50.0, -10.0));

    let off = text_anchor_offset(
        100.0,
        16.0,
        4.0,
        16.0,
        TextAlign::Start,
        TextBaseline::Alphabetic,
    );
    assert_eq!(off, Vec2::new(0.0, -16.0));

    let off = text_anchor_offset(100.0, 16.0, 4.0, 16.0, TextAlign::End, TextBaseline::Top);
    assert_eq!(off, Vec2::new(-100.0, 0.0));

    let off = text_anchor_offset(100.0, 16.0, 4.0, 16.0, TextAlign::End, TextBaseline::Bottom);
    assert_eq!(off, Vec2::new(-100.0, -20.0));
}

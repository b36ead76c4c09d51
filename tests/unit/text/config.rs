use super::*;

#[test]
fn missing_settings_resolve_to_default_table() {
    let cfg = TextSettings::default().resolve().unwrap();
    assert_eq!(cfg.font, "Arial");
    assert_eq!(cfg.font_size, 20.0);
    assert_eq!(cfg.color, "black");
    assert_eq!(cfg.orientation, Orientation::Horizontal);
    assert_eq!(cfg.content, "");
    assert_eq!(cfg.position, Position::new(0.0, 0.0));
    assert_eq!(cfg, TextConfig::default());
}

#[test]
fn partial_settings_keep_given_fields() {
    let settings: TextSettings = serde_json::from_str(
        r#"{ "content": "HELLO", "fontSize": 64, "orientation": "vertical" }"#,
    )
    .unwrap();
    let cfg = settings.resolve().unwrap();
    assert_eq!(cfg.content, "HELLO");
    assert_eq!(cfg.font_size, 64.0);
    assert_eq!(cfg.orientation, Orientation::Vertical);
    assert_eq!(cfg.font, "Arial");
    assert_eq!(cfg.color, "black");
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(serde_json::from_str::<TextSettings>(r#"{ "fontsize": 3 }"#).is_err());
}

#[test]
fn merged_with_prefers_the_overlay() {
    let base = TextSettings {
        content: Some("base".into()),
        color: Some("red".into()),
        ..Default::default()
    };
    let overlay = TextSettings {
        content: Some("top".into()),
        ..Default::default()
    };
    let merged = base.merged_with(overlay);
    assert_eq!(merged.content.as_deref(), Some("top"));
    assert_eq!(merged.color.as_deref(), Some("red"));
}

#[test]
fn invalid_sizes_and_positions_are_rejected() {
    for size in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let err = TextSettings {
            font_size: Some(size),
            ..Default::default()
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, TextBehindError::Validation(_)));
    }
    let err = TextSettings {
        position: Some(Position::new(f64::NAN, 0.0)),
        ..Default::default()
    }
    .resolve()
    .unwrap_err();
    assert!(matches!(err, TextBehindError::Validation(_)));
}

#[test]
fn font_spec_formats_css_shorthand() {
    let cfg = TextConfig {
        font: "Impact".into(),
        font_size: 20.0,
        ..Default::default()
    };
    assert_eq!(cfg.font_spec().to_string(), "20px Impact");
    let spec = FontSpec {
        size_px: 12.5,
        family: "DejaVu Sans".into(),
    };
    assert_eq!(spec.to_string(), "12.5px DejaVu Sans");
}

#[test]
fn font_spec_parses_back() {
    let spec: FontSpec = "48px 'Open Sans', serif".parse().unwrap();
    assert_eq!(spec.size_px, 48.0);
    assert_eq!(spec.family, "'Open Sans', serif");
    assert_eq!(spec.to_string().parse::<FontSpec>().unwrap(), spec);

    assert!("48 Arial".parse::<FontSpec>().is_err());
    assert!("0px Arial".parse::<FontSpec>().is_err());
    assert!("12px".parse::<FontSpec>().is_err());
}

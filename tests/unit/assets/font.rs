use super::*;

const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

#[test]
fn primary_family_takes_first_unquoted_entry() {
    assert_eq!(primary_family("Arial"), "Arial");
    assert_eq!(primary_family("'Open Sans', sans-serif"), "Open Sans");
    assert_eq!(primary_family("\"DejaVu Sans\""), "DejaVu Sans");
    assert_eq!(primary_family("  Inter ,Arial"), "Inter");
}

#[test]
fn empty_book_resolves_nothing() {
    let book = FontBook::new();
    assert!(book.is_empty());
    assert!(book.resolve("Arial").is_none());
}

#[test]
fn register_garbage_bytes_is_rejected() {
    let mut book = FontBook::new();
    assert!(book.register_bytes(b"not a font".to_vec()).is_err());
    assert!(book.is_empty());
}

#[test]
fn register_missing_file_is_an_error() {
    let mut book = FontBook::new();
    let err = book
        .register_file("/nonexistent/dir/font.ttf")
        .unwrap_err();
    assert!(err.to_string().contains("read font"));
}

#[test]
fn register_and_resolve_with_local_font_if_present() {
    let Ok(bytes) = std::fs::read(SYSTEM_FONT) else {
        return;
    };

    let mut book = FontBook::new();
    let family = book.register_bytes(bytes).unwrap();
    assert_eq!(family, "DejaVu Sans");
    assert_eq!(book.families().collect::<Vec<_>>(), vec!["DejaVu Sans"]);

    assert_eq!(book.resolve("dejavu sans").unwrap().family(), "DejaVu Sans");
    // Unknown families fall back to the first registered face.
    assert_eq!(book.resolve("Arial").unwrap().family(), "DejaVu Sans");
}

#[test]
fn layout_line_smoke_with_local_font_if_present() {
    let Ok(bytes) = std::fs::read(SYSTEM_FONT) else {
        return;
    };
    let mut book = FontBook::new();
    book.register_bytes(bytes).unwrap();
    let face = book.resolve("DejaVu Sans").unwrap().clone();

    let mut engine = TextLayoutEngine::new();
    let layout = engine
        .layout_line(
            "hello",
            &face,
            48.0,
            TextBrushRgba8 {
                r: 255,
                g: 255,
                b: 255,
                a: 255,
            },
        )
        .unwrap();

    assert!(layout.lines().next().is_some());
    assert!(layout.width() > 0.0);

    assert!(engine
        .layout_line("hello", &face, 0.0, TextBrushRgba8::default())
        .is_err());
}

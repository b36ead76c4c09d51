use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let buf = png_bytes(1, 1, vec![100u8, 50u8, 200u8, 128u8]);

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width, 1);
    assert_eq!(decoded.height, 1);
    assert_eq!(
        decoded.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_keeps_natural_size() {
    let buf = png_bytes(7, 3, vec![9u8; 7 * 3 * 4]);
    let decoded = decode_image(&buf).unwrap();
    assert_eq!((decoded.width, decoded.height), (7, 3));
    assert_eq!(decoded.rgba8_premul.len(), 7 * 3 * 4);
}

#[test]
fn decode_garbage_is_an_error() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(err.to_string().contains("decode image from memory"));
}

use super::*;

fn gradient(width: u32, height: u32) -> RasterImage {
    let mut data = Vec::new();
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 40) as u8, (y * 40) as u8, 200, 255]);
        }
    }
    RasterImage::from_straight(width, height, data).unwrap()
}

#[tokio::test]
async fn precomputed_foreground_is_returned_as_is() {
    let source = gradient(3, 2);
    let cutout = RasterImage::solid(3, 2, [0, 0, 0, 0]);
    let remover = PrecomputedForeground::new(cutout.clone());
    assert_eq!(remover.remove_background(&source).await.unwrap(), cutout);
}

#[tokio::test]
async fn precomputed_foreground_must_match_source_size() {
    let remover = PrecomputedForeground::new(RasterImage::solid(2, 2, [0, 0, 0, 0]));
    let err = remover
        .remove_background(&gradient(3, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, TextBehindError::Extraction(ref m) if m.contains("2x2")));
}

#[tokio::test]
async fn white_mask_keeps_everything_and_black_mask_removes_everything() {
    let source = gradient(4, 3);

    let keep = MaskRemover::new(RasterImage::solid(4, 3, [255, 255, 255, 255]));
    assert_eq!(keep.remove_background(&source).await.unwrap(), source);

    for mask in [[0, 0, 0, 255], [255, 255, 255, 0]] {
        let drop = MaskRemover::new(RasterImage::solid(4, 3, mask));
        let out = drop.remove_background(&source).await.unwrap();
        assert!(out.rgba8_premul.iter().all(|&b| b == 0), "{mask:?}");
    }
}

#[tokio::test]
async fn mask_selects_pixels_per_position() {
    let source = RasterImage::solid(2, 1, [255, 0, 0, 255]);
    let mask = RasterImage::from_straight(2, 1, vec![255, 255, 255, 255, 0, 0, 0, 255]).unwrap();
    let out = MaskRemover::new(mask)
        .remove_background(&source)
        .await
        .unwrap();
    assert_eq!(out.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(1, 0), Some([0, 0, 0, 0]));
}

#[tokio::test]
async fn gray_mask_scales_premultiplied_pixels() {
    let source = RasterImage::solid(1, 1, [200, 100, 50, 255]);
    let out = MaskRemover::new(RasterImage::solid(1, 1, [128, 128, 128, 255]))
        .remove_background(&source)
        .await
        .unwrap();
    // 128/255 of each channel, rounded.
    assert_eq!(out.pixel(0, 0), Some([100, 50, 25, 128]));
}

#[tokio::test]
async fn mask_size_mismatch_is_an_extraction_error() {
    let remover = MaskRemover::new(RasterImage::solid(1, 1, [255, 255, 255, 255]));
    let err = remover
        .remove_background(&gradient(2, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, TextBehindError::Extraction(_)));
}

async fn extract_with<R: BackgroundRemover>(
    remover: R,
    image: &RasterImage,
) -> TextBehindResult<RasterImage> {
    remover.remove_background(image).await
}

#[tokio::test]
async fn removers_work_through_references() {
    let source = gradient(2, 2);
    let remover = MaskRemover::new(RasterImage::solid(2, 2, [255, 255, 255, 255]));
    assert_eq!(extract_with(&remover, &source).await.unwrap(), source);
    assert_eq!(extract_with(remover, &source).await.unwrap(), source);
}

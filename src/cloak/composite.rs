use super::types::{BgrImage, Mask, BACKGROUND};
use crate::error::{CloakError, Result};
use image::Rgb;

/// Select every pixel from `live` or `background` according to `mask`.
///
/// Background-classified pixels keep the live value, cloak-classified pixels
/// take the stored background. There is no blending at mask edges.
pub fn composite(live: &BgrImage, background: &BgrImage, mask: &Mask) -> Result<BgrImage> {
    let _span = tracing::debug_span!("composite").entered();

    let (width, height) = live.dimensions();
    for other in [background.dimensions(), mask.dimensions()] {
        if other != (width, height) {
            return Err(CloakError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                actual_width: other.0,
                actual_height: other.1,
            });
        }
    }

    let mut output = live.clone();
    for ((out, bg), m) in output
        .pixels_mut()
        .zip(background.pixels())
        .zip(mask.pixels())
    {
        if m.0[0] != BACKGROUND {
            *out = *bg;
        }
    }

    Ok(output)
}

/// Render a mask as a grayscale frame for previewing the segmentation
pub fn mask_to_frame(mask: &Mask) -> BgrImage {
    let (width, height) = mask.dimensions();
    BgrImage::from_fn(width, height, |x, y| {
        let value = mask.get_pixel(x, y).0[0];
        Rgb([value, value, value])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloak::types::CLOAK;
    use image::Luma;

    fn gradient(width: u32, height: u32) -> BgrImage {
        BgrImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 7]))
    }

    #[test]
    fn test_background_mask_keeps_live_frame() {
        let live = gradient(4, 3);
        let background = BgrImage::from_pixel(4, 3, Rgb([1, 2, 3]));
        let mask = Mask::new(4, 3);

        assert_eq!(composite(&live, &background, &mask).unwrap(), live);
    }

    #[test]
    fn test_cloak_mask_takes_background() {
        let live = gradient(4, 3);
        let background = BgrImage::from_pixel(4, 3, Rgb([1, 2, 3]));
        let mask = Mask::from_pixel(4, 3, Luma([CLOAK]));

        assert_eq!(composite(&live, &background, &mask).unwrap(), background);
    }

    #[test]
    fn test_mixed_mask_selects_per_pixel() {
        let live = gradient(3, 3);
        let background = BgrImage::from_pixel(3, 3, Rgb([9, 9, 9]));
        let mut mask = Mask::new(3, 3);
        mask.put_pixel(1, 2, Luma([CLOAK]));

        let output = composite(&live, &background, &mask).unwrap();

        for (x, y, pixel) in output.enumerate_pixels() {
            if (x, y) == (1, 2) {
                assert_eq!(pixel.0, [9, 9, 9]);
            } else {
                assert_eq!(pixel, live.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let live = gradient(4, 3);
        let background = gradient(3, 4);
        let mask = Mask::new(4, 3);

        assert!(matches!(
            composite(&live, &background, &mask),
            Err(CloakError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_mask_to_frame() {
        let mut mask = Mask::new(2, 1);
        mask.put_pixel(1, 0, Luma([CLOAK]));

        let frame = mask_to_frame(&mask);

        assert_eq!(frame.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(frame.get_pixel(1, 0).0, [255, 255, 255]);
    }
}

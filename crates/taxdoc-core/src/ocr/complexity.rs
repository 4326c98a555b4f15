//! Image complexity as the variance of a Laplacian edge filter.

use std::path::Path;

use image::GrayImage;

use crate::error::OcrError;

/// Laplacian variance of the grayscale version of the image at `path`.
pub fn image_complexity(path: &Path) -> Result<f64, OcrError> {
    let image = image::open(path).map_err(|e| OcrError::InvalidImage(e.to_string()))?;
    laplacian_variance(&image.to_luma8())
        .ok_or_else(|| OcrError::InvalidImage(format!("{} has no pixels", path.display())))
}

/// Population variance of the 3x3 Laplacian response.
///
/// Kernel `[0,1,0; 1,-4,1; 0,1,0]` with reflect-101 borders. `None` for an
/// empty image.
pub fn laplacian_variance(image: &GrayImage) -> Option<f64> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let (w, h) = (width as i64, height as i64);
    let at = |x: i64, y: i64| image.get_pixel(reflect(x, w), reflect(y, h))[0] as f64;

    let count = (width as u64 * height as u64) as f64;
    let mut sum = 0f64;
    let mut sum_sq = 0f64;

    for y in 0..h {
        for x in 0..w {
            let response =
                at(x, y - 1) + at(x - 1, y) + at(x + 1, y) + at(x, y + 1) - 4.0 * at(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count;
    Some((sum_sq / count - mean * mean).max(0.0))
}

fn reflect(i: i64, n: i64) -> u32 {
    if n == 1 {
        return 0;
    }
    let r = if i < 0 {
        -i
    } else if i >= n {
        2 * n - 2 - i
    } else {
        i
    };
    r.clamp(0, n - 1) as u32
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn test_flat_image_has_zero_variance() {
        let image = GrayImage::from_pixel(8, 8, Luma([128]));
        assert_eq!(laplacian_variance(&image), Some(0.0));
    }

    #[test]
    fn test_checkerboard_is_complex() {
        let image = GrayImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 { Luma([255]) } else { Luma([0]) }
        });
        let variance = laplacian_variance(&image).unwrap();
        assert!((variance - 1020.0 * 1020.0).abs() < 1e-6);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(2, 5), 2);
        assert_eq!(reflect(-1, 1), 0);
    }

    #[test]
    fn test_single_pixel() {
        let image = GrayImage::from_pixel(1, 1, Luma([10]));
        assert_eq!(laplacian_variance(&image), Some(0.0));
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(image_complexity(&path).is_err());
    }
}

//! Image preprocessing for the command-line OCR engines.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

/// Grayscale, Otsu binarisation and median denoising.
pub struct ImagePreprocessor {
    /// Apply Otsu binarisation.
    binarize: bool,
    /// Median filter window (odd; 1 disables the filter).
    median_window: u32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            binarize: true,
            median_window: 3,
        }
    }

    /// Enable or disable binarisation.
    pub fn with_binarize(mut self, binarize: bool) -> Self {
        self.binarize = binarize;
        self
    }

    /// Set the median filter window.
    pub fn with_median_window(mut self, window: u32) -> Self {
        self.median_window = window.max(1) | 1;
        self
    }

    /// Prepare an image for recognition.
    pub fn prepare(&self, image: &DynamicImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut gray = image.to_luma8();

        if self.binarize {
            let threshold = otsu_threshold(&gray);
            debug!("Otsu threshold {} for {}x{} image", threshold, width, height);
            gray = binarize(&gray, threshold);
        }

        if self.median_window > 1 {
            gray = median_filter(&gray, self.median_window);
        }

        gray
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Threshold maximising the between-class variance of the histogram.
pub fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }

    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, count)| value as f64 * *count as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut best_threshold = 0u8;
    let mut best_variance = -1f64;

    for (value, count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += value as f64 * *count as f64;
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight as f64;

        let diff = background_mean - foreground_mean;
        let variance = background_weight as f64 * foreground_weight as f64 * diff * diff;
        if variance > best_variance {
            best_variance = variance;
            best_threshold = value as u8;
        }
    }

    best_threshold
}

/// Pixels above `threshold` become white, the rest black.
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let output = if pixel[0] > threshold { 255 } else { 0 };
        result.put_pixel(x, y, Luma([output]));
    }

    result
}

/// Median filter with a square window; edges replicate the border pixel.
pub fn median_filter(image: &GrayImage, window: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return result;
    }

    let half = (window / 2) as i64;
    let mut values = Vec::with_capacity((window * window) as usize);

    for y in 0..height {
        for x in 0..width {
            values.clear();
            for dy in -half..=half {
                for dx in -half..=half {
                    let sx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
                    let sy = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
                    values.push(image.get_pixel(sx, sy)[0]);
                }
            }
            values.sort_unstable();
            result.put_pixel(x, y, Luma([values[values.len() / 2]]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([40]) } else { Luma([200]) })
    }

    #[test]
    fn test_otsu_splits_two_tones() {
        let threshold = otsu_threshold(&two_tone());
        assert!((40..200).contains(&threshold));

        let binary = binarize(&two_tone(), threshold);
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(9, 9)[0], 255);
    }

    #[test]
    fn test_median_removes_speck() {
        let mut image = GrayImage::from_pixel(5, 5, Luma([255]));
        image.put_pixel(2, 2, Luma([0]));

        let filtered = median_filter(&image, 3);
        assert_eq!(filtered.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_prepare_keeps_dimensions() {
        let image = DynamicImage::ImageLuma8(two_tone());
        let prepared = ImagePreprocessor::new().prepare(&image);
        assert_eq!(prepared.dimensions(), (10, 10));
    }
}

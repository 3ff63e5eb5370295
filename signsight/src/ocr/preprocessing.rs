use image::{GrayImage, ImageFormat, ImageReader, Luma};

use crate::error::{Result, SignsightError};

/// Single-channel, binarized image ready for the offline engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedImage {
    pixels: GrayImage,
    threshold: u8,
}

impl PreprocessedImage {
    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    /// Threshold picked by Otsu's method on the inverted grayscale image.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Encode as PNG for engines that take encoded images from memory.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.pixels
            .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| SignsightError::Internal(format!("Failed to encode image: {e}")))?;
        Ok(output)
    }
}

/// Prepare a photographed sign for text extraction.
///
/// Runs the same three steps on every image:
/// 1. Convert to grayscale
/// 2. Invert, so bright lettering on a dark panel becomes dark on bright
/// 3. Binarize with a global Otsu threshold
///
/// Assumes one illumination region and a single dominant text block.
pub fn preprocess_image(bytes: &[u8]) -> Result<PreprocessedImage> {
    let img = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| SignsightError::InvalidInput(format!("Failed to read image: {e}")))?
        .decode()
        .map_err(|_| SignsightError::InvalidInput("Invalid image format".to_string()))?;

    let mut gray = img.to_luma8();
    image::imageops::invert(&mut gray);

    let threshold = otsu_threshold(&gray);
    let pixels = binarize(&gray, threshold);

    Ok(PreprocessedImage { pixels, threshold })
}

/// Global threshold maximizing between-class variance, which is the same as
/// minimizing the weighted intra-class variance of the two pixel classes.
///
/// Ties resolve to the lowest threshold. A single-valued image yields 0.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }

    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut best_threshold = 0u8;
    let mut best_variance = -1f64;

    for (level, &count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }

        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * count as f64;

        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight as f64;
        let mean_gap = background_mean - foreground_mean;
        let variance =
            background_weight as f64 * foreground_weight as f64 * mean_gap * mean_gap;

        if variance > best_variance {
            best_variance = variance;
            best_threshold = level as u8;
        }
    }

    best_threshold
}

/// Pixels strictly above `threshold` become white, the rest black.
fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

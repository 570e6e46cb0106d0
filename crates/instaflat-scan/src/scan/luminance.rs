// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Luminance map, adaptive bright/dark threshold, and the brightness mask
// derived from them.

use image::RgbaImage;
use instaflat_core::DetectionConfig;
use tracing::debug;

/// `0.299 R + 0.587 G + 0.114 B`, truncated toward zero. Alpha is ignored.
///
/// Computed in integer per-mille so pure white maps to exactly 255.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// One brightness value per pixel, row-major.
#[derive(Debug, Clone)]
pub struct LuminanceMap {
    width: u32,
    height: u32,
    values: Vec<u8>,
}

impl LuminanceMap {
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let values = image
            .pixels()
            .map(|p| luminance(p[0], p[1], p[2]))
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            values,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Adaptive threshold for this map. See [`adaptive_threshold`].
    pub fn threshold(&self, config: &DetectionConfig) -> u8 {
        adaptive_threshold(&self.values, config)
    }

    /// Pixels strictly brighter than `threshold`.
    pub fn mask(&self, threshold: u8) -> BrightnessMask {
        BrightnessMask {
            width: self.width,
            height: self.height,
            bits: self.values.iter().map(|&v| v > threshold).collect(),
        }
    }
}

/// Estimate the bright/dark cutoff from a strided sample of `values`.
///
/// The sample is sorted brightest first and the value at the configured
/// percentile becomes the reference; the threshold sits a fixed offset below
/// it, clamped to `[threshold_min, threshold_max]`. An empty sample falls back
/// to `fallback_top_bright`.
pub fn adaptive_threshold(values: &[u8], config: &DetectionConfig) -> u8 {
    let mut samples: Vec<u8> = values
        .iter()
        .step_by(config.sample_stride.max(1))
        .copied()
        .collect();
    samples.sort_unstable_by(|a, b| b.cmp(a));

    let index = (samples.len() as f64 * config.bright_percentile).floor() as usize;
    let top_bright = samples
        .get(index)
        .copied()
        .unwrap_or(config.fallback_top_bright);

    let threshold = (top_bright as i32 - config.threshold_offset as i32)
        .max(config.threshold_min as i32)
        .min(config.threshold_max as i32);

    debug!(samples = samples.len(), top_bright, threshold, "Adaptive threshold");
    threshold.clamp(0, 255) as u8
}

/// One flag per pixel: `true` where the pixel is brighter than the threshold.
#[derive(Debug, Clone)]
pub struct BrightnessMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BrightnessMask {
    /// Build a mask directly from flags (row-major). Returns `None` when the
    /// flag count does not match the dimensions.
    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Option<Self> {
        (bits.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            bits,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }

    /// Number of bright pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

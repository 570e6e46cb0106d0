// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration. Every tunable constant of the detection and
// rectification pipeline lives here so front ends can persist overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::types::PrintFormat;

/// Tunables for automatic quadrilateral detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Downsampling factor applied before detection.
    pub scale: f64,
    /// Take every n-th luminance value when estimating the threshold.
    pub sample_stride: usize,
    /// Percentile (from the bright end) used as the reference brightness.
    pub bright_percentile: f64,
    /// Reference brightness when the sample is empty.
    pub fallback_top_bright: u8,
    /// Subtracted from the reference brightness to get the threshold.
    pub threshold_offset: u8,
    /// Lower bound of the adaptive threshold.
    pub threshold_min: u8,
    /// Upper bound of the adaptive threshold.
    pub threshold_max: u8,
    /// Largest component must be strictly bigger than this to count.
    pub min_component_pixels: usize,
    /// Outward margin (normalized units) added to detected corners so the
    /// white border is kept.
    pub margin: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            scale: 0.2,
            sample_stride: 10,
            bright_percentile: 0.15,
            fallback_top_bright: 200,
            threshold_offset: 20,
            threshold_min: 150,
            threshold_max: 235,
            min_component_pixels: 50,
            margin: 1.5,
        }
    }
}

/// Tunables for the rectified output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output width in pixels; height follows from the format's ratio.
    pub width: u32,
    /// JPEG quality (1-100) used when exporting.
    pub jpeg_quality: u8,
    /// Expand amount for a bare `--expand` (one expand/shrink click).
    pub expand_step: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 800,
            jpeg_quality: 92,
            expand_step: 2.0,
        }
    }
}

/// Complete engine settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub detection: DetectionConfig,
    pub output: OutputConfig,
    /// Format selected when a session starts.
    pub default_format: PrintFormat,
}

impl EngineConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        debug!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Write settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

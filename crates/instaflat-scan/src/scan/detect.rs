// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Automatic print detection — find the dominant bright region of a photo and
// turn its extreme points into a normalized quadrilateral.

use image::RgbaImage;
use instaflat_core::error::{InstaflatError, Result};
use instaflat_core::{DetectionConfig, Quadrilateral, Viewport};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::corners::extreme_corners;
use super::luminance::LuminanceMap;
use super::mapping::{Letterbox, detection_to_source};
use super::region::largest_component;
use crate::image::{downsample, ensure_not_empty};

/// Intermediate results of one detection pass.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    /// Size of the downsampled detection buffer.
    pub detection_size: (u32, u32),
    /// Bright/dark cutoff chosen for this image.
    pub threshold: u8,
    /// Pixel count of the largest bright component.
    pub largest_component: usize,
    /// Extreme corners in full-resolution source pixels, present only when the
    /// largest component is big enough to trust.
    pub corners: Option<Quadrilateral>,
}

/// Result of asking for a detection. Failure is an ordinary outcome: the
/// caller keeps whatever quad it already shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionOutcome {
    /// Corners in normalized display space, margin applied.
    Detected { quad: Quadrilateral },
    /// No bright region large enough was found.
    Failed { largest_component: usize },
}

impl DetectionOutcome {
    pub fn quad(&self) -> Option<&Quadrilateral> {
        match self {
            Self::Detected { quad } => Some(quad),
            Self::Failed { .. } => None,
        }
    }
}

/// Run luminance analysis, region growing, and corner extraction on a
/// downsampled copy of `source`.
#[instrument(skip_all, fields(width = source.width(), height = source.height()))]
pub fn analyze(source: &RgbaImage, config: &DetectionConfig) -> Result<DetectionReport> {
    ensure_not_empty(source)?;
    if !(config.scale > 0.0 && config.scale.is_finite()) {
        return Err(InstaflatError::UnsupportedInput(format!(
            "detection scale must be positive, got {}",
            config.scale
        )));
    }

    let small = downsample(source, config.scale);
    let luma = LuminanceMap::from_rgba(&small);
    let threshold = luma.threshold(config);
    let mask = luma.mask(threshold);
    let component = largest_component(&mask);

    debug!(
        threshold,
        bright = mask.count(),
        largest = component.len(),
        "Brightness mask analysed"
    );

    let corners = if component.len() > config.min_component_pixels {
        extreme_corners(component.pixels())
            .map(|quad| quad.map(|p| detection_to_source(p, config.scale)))
    } else {
        None
    };

    Ok(DetectionReport {
        detection_size: small.dimensions(),
        threshold,
        largest_component: component.len(),
        corners,
    })
}

/// Detect the print in `source` and express its corners in the normalized
/// display space of `viewport`, pushed outward by the configured margin.
#[instrument(skip(source, config), fields(width = source.width(), height = source.height()))]
pub fn detect(
    source: &RgbaImage,
    viewport: Viewport,
    config: &DetectionConfig,
) -> Result<DetectionOutcome> {
    let letterbox = Letterbox::fit(source.width(), source.height(), viewport)?;
    let report = analyze(source, config)?;

    let Some(corners) = report.corners else {
        warn!(
            largest_component = report.largest_component,
            min = config.min_component_pixels,
            "No print found; keeping the current quad"
        );
        return Ok(DetectionOutcome::Failed {
            largest_component: report.largest_component,
        });
    };

    let quad = letterbox
        .quad_to_normalized(&corners)
        .with_margin(config.margin);
    info!(
        top_left = ?quad.top_left,
        top_right = ?quad.top_right,
        bottom_right = ?quad.bottom_right,
        bottom_left = ?quad.bottom_left,
        "Print detected"
    );
    Ok(DetectionOutcome::Detected { quad })
}

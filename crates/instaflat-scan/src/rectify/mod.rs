// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — turn the normalized quad over a (rotated)
// photo into a flat, fixed-aspect output image.

pub mod homography;
pub mod warp;

use image::RgbaImage;
use instaflat_core::error::{InstaflatError, Result};
use instaflat_core::{OutputConfig, PrintFormat, Quadrilateral, Viewport};
use tracing::{debug, info, instrument};

pub use homography::Homography;
pub use warp::warp_perspective;

use crate::image::{ImageProcessor, ensure_not_empty};
use crate::scan::Letterbox;

/// Output size for `format`: the configured width and
/// `max(1, floor(width / aspect_ratio))`.
pub fn output_dimensions(format: PrintFormat, config: &OutputConfig) -> Result<(u32, u32)> {
    format.validate()?;
    if config.width == 0 {
        return Err(InstaflatError::UnsupportedInput(
            "output width must be at least 1 pixel".into(),
        ));
    }
    let height = (config.width as f64 / format.aspect_ratio()).floor();
    Ok((config.width, (height as u32).max(1)))
}

/// Rotate `source` clockwise by `degrees` ahead of detection and rectification.
pub fn rotate_source(source: &RgbaImage, degrees: f32) -> RgbaImage {
    ImageProcessor::from_rgba(source.clone())
        .rotate(degrees)
        .into_rgba()
}

/// Rotate `source`, then rectify the area under `quad`.
///
/// `quad` is in normalized coordinates of the rotated image as drawn inside
/// `viewport`.
#[instrument(skip(source, quad, config), fields(width = source.width(), height = source.height(), %format))]
pub fn rectify(
    source: &RgbaImage,
    quad: &Quadrilateral,
    format: PrintFormat,
    rotation_degrees: f32,
    viewport: Viewport,
    config: &OutputConfig,
) -> Result<RgbaImage> {
    ensure_not_empty(source)?;
    let rotated = rotate_source(source, rotation_degrees);
    rectify_prepared(&rotated, quad, format, viewport, config)
}

/// Rectify an image that is already in its displayed orientation.
#[instrument(skip(source, quad, config), fields(width = source.width(), height = source.height(), %format))]
pub fn rectify_prepared(
    source: &RgbaImage,
    quad: &Quadrilateral,
    format: PrintFormat,
    viewport: Viewport,
    config: &OutputConfig,
) -> Result<RgbaImage> {
    let (out_w, out_h) = output_dimensions(format, config)?;
    let letterbox = Letterbox::fit(source.width(), source.height(), viewport)?;
    let corners = letterbox.quad_to_source(quad);
    debug!(?corners, "Quad in source pixels");

    let homography = Homography::rect_to_quad(out_w as f64, out_h as f64, &corners)?;
    let output = warp_perspective(source, &homography, out_w, out_h);
    info!(out_w, out_h, "Print rectified");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn preset_output_sizes() {
        let config = OutputConfig::default();
        assert_eq!(output_dimensions(PrintFormat::Mini, &config).unwrap(), (800, 1274));
        assert_eq!(output_dimensions(PrintFormat::Square, &config).unwrap(), (800, 800));
        assert_eq!(output_dimensions(PrintFormat::Wide, &config).unwrap(), (800, 501));
    }

    /// Extremely wide custom formats still produce at least one row.
    #[test]
    fn height_never_drops_to_zero() {
        let config = OutputConfig { width: 10, ..OutputConfig::default() };
        let format = PrintFormat::Custom { width_mm: 5000, height_mm: 1 };
        assert_eq!(output_dimensions(format, &config).unwrap(), (10, 1));
    }

    #[test]
    fn invalid_custom_format_is_rejected() {
        let format = PrintFormat::Custom { width_mm: 0, height_mm: 10 };
        assert!(matches!(
            output_dimensions(format, &OutputConfig::default()),
            Err(InstaflatError::InvalidFormat(_))
        ));
    }

    #[test]
    fn empty_source_is_rejected() {
        let err = rectify(
            &RgbaImage::new(0, 0),
            &Quadrilateral::full_frame(),
            PrintFormat::Square,
            0.0,
            Viewport::new(100.0, 100.0),
            &OutputConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, InstaflatError::UnsupportedInput(_)));
    }

    #[test]
    fn collinear_quad_blocks_rectification() {
        let src = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let quad = Quadrilateral::new(
            (10.0, 10.0).into(),
            (20.0, 20.0).into(),
            (30.0, 30.0).into(),
            (40.0, 40.0).into(),
        );
        let err = rectify(
            &src,
            &quad,
            PrintFormat::Square,
            0.0,
            Viewport::matching(100, 100),
            &OutputConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, InstaflatError::DegenerateQuadrilateral(_)));
    }

    /// After a quarter turn the left half of a two-tone image is on top.
    #[test]
    fn rotation_is_applied_before_sampling() {
        let src = RgbaImage::from_fn(200, 100, |x, _| {
            if x < 100 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let config = OutputConfig { width: 100, ..OutputConfig::default() };
        let out = rectify(
            &src,
            &Quadrilateral::full_frame(),
            PrintFormat::Custom { width_mm: 1, height_mm: 2 },
            90.0,
            Viewport::matching(100, 200),
            &config,
        )
        .unwrap();
        assert_eq!(out.dimensions(), (100, 200));
        assert_eq!(out.get_pixel(50, 20), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(50, 180), &Rgba([0, 0, 255, 255]));
    }
}

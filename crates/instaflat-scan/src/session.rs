// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop session — the editable state behind one photo: orientation, film
// format, and the corner quad the user refines before exporting.

use std::sync::Arc;

use image::RgbaImage;
use instaflat_core::error::Result;
use instaflat_core::{Corner, EngineConfig, Point, PrintFormat, Quadrilateral, Viewport};
use tracing::{debug, info, instrument};

use crate::export::{Encoding, RectifiedPrint, export};
use crate::image::ensure_not_empty;
use crate::rectify::{rectify_prepared, rotate_source};
use crate::scan::{DetectionOutcome, detect};

/// One photo being cropped.
///
/// The displayed buffer is the original rotated by `rotation`; the quad is in
/// normalized coordinates of that buffer as drawn inside `viewport`.
pub struct CropSession {
    original: RgbaImage,
    displayed: Arc<RgbaImage>,
    viewport: Viewport,
    format: PrintFormat,
    rotation: f32,
    quad: Quadrilateral,
    config: EngineConfig,
}

impl CropSession {
    /// Start a session showing the guide quad for `format`.
    #[instrument(skip(source, config), fields(width = source.width(), height = source.height(), %format))]
    pub fn new(
        source: RgbaImage,
        viewport: Viewport,
        format: PrintFormat,
        config: EngineConfig,
    ) -> Result<Self> {
        ensure_not_empty(&source)?;
        format.validate()?;
        // Surfaces a bad viewport now rather than at rectify time.
        crate::scan::Letterbox::fit(source.width(), source.height(), viewport)?;

        let displayed = Arc::new(source.clone());
        info!("Crop session started");
        Ok(Self {
            original: source,
            displayed,
            viewport,
            format,
            rotation: 0.0,
            quad: Quadrilateral::guide(format),
            config,
        })
    }

    pub fn quad(&self) -> Quadrilateral {
        self.quad
    }

    pub fn format(&self) -> PrintFormat {
        self.format
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The rotated buffer, shareable with a `DetectionWorker`.
    pub fn shared_image(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.displayed)
    }

    /// Resize the display surface. The quad stays in normalized coordinates.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        crate::scan::Letterbox::fit(self.displayed.width(), self.displayed.height(), viewport)?;
        self.viewport = viewport;
        Ok(())
    }

    /// Switch film format and reset to its guide quad.
    pub fn set_format(&mut self, format: PrintFormat) -> Result<()> {
        format.validate()?;
        self.format = format;
        self.quad = Quadrilateral::guide(format);
        debug!(%format, "Format changed");
        Ok(())
    }

    /// Move one corner. The point is clamped to the image.
    pub fn adjust_corner(&mut self, corner: Corner, point: Point) {
        self.quad = self.quad.with_corner(corner, point);
    }

    /// Replace the whole quad, clamping every corner.
    pub fn set_quad(&mut self, quad: Quadrilateral) {
        self.quad = quad.map(Point::clamped);
    }

    /// Push every corner outward by `amount` (inward when negative).
    pub fn expand(&mut self, amount: f64) {
        self.quad = self.quad.expanded(amount);
    }

    /// Re-render the displayed buffer at `degrees` and reset to the guide quad.
    #[instrument(skip(self))]
    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
        self.displayed = Arc::new(rotate_source(&self.original, degrees));
        self.quad = Quadrilateral::guide(self.format);
        debug!(
            width = self.displayed.width(),
            height = self.displayed.height(),
            "Rotation applied"
        );
    }

    /// Run detection synchronously. A failed detection leaves the quad alone.
    pub fn detect(&mut self) -> Result<DetectionOutcome> {
        let outcome = detect(&self.displayed, self.viewport, &self.config.detection)?;
        self.apply_detection(&outcome);
        Ok(outcome)
    }

    /// Adopt a detection produced elsewhere (e.g. by a `DetectionWorker`).
    pub fn apply_detection(&mut self, outcome: &DetectionOutcome) {
        if let Some(quad) = outcome.quad() {
            self.quad = *quad;
        }
    }

    /// Produce the flattened print for the current quad.
    pub fn rectify(&self) -> Result<RgbaImage> {
        rectify_prepared(
            &self.displayed,
            &self.quad,
            self.format,
            self.viewport,
            &self.config.output,
        )
    }

    /// Rectify and encode.
    pub fn export(&self, encoding: Encoding) -> Result<RectifiedPrint> {
        let output = self.rectify()?;
        export(&output, self.format, encoding)
    }

    /// The configured default encoding (JPEG at the configured quality).
    pub fn default_encoding(&self) -> Encoding {
        Encoding::Jpeg {
            quality: self.config.output.jpeg_quality,
        }
    }
}

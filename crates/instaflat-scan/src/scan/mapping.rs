// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapping between detection pixels, full-resolution source pixels,
// and the normalized (0–100) display space the quad is edited in.

use instaflat_core::error::{InstaflatError, Result};
use instaflat_core::{NORMALIZED_MAX, Point, Quadrilateral, Viewport};

/// Scale and offset of an image drawn "contain"-style inside a viewport.
///
/// Every conversion in both directions goes through the same
/// `(scale, offset_x, offset_y)` triple, so they invert each other exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    viewport: Viewport,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Letterbox {
    /// Fit an `image_width` x `image_height` image into `viewport`.
    pub fn fit(image_width: u32, image_height: u32, viewport: Viewport) -> Result<Self> {
        if image_width == 0 || image_height == 0 {
            return Err(InstaflatError::UnsupportedInput(format!(
                "source image is {image_width}x{image_height}"
            )));
        }
        if viewport.is_empty() {
            return Err(InstaflatError::UnsupportedInput(format!(
                "viewport is {}x{}",
                viewport.width, viewport.height
            )));
        }

        let (iw, ih) = (image_width as f64, image_height as f64);
        let scale = (viewport.width / iw).min(viewport.height / ih);
        Ok(Self {
            viewport,
            scale,
            offset_x: (viewport.width - iw * scale) / 2.0,
            offset_y: (viewport.height - ih * scale) / 2.0,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Horizontal and vertical padding around the drawn image, in viewport
    /// pixels.
    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    /// Source pixel to normalized display coordinates.
    pub fn to_normalized(&self, source: Point) -> Point {
        Point::new(
            (source.x * self.scale + self.offset_x) / self.viewport.width * NORMALIZED_MAX,
            (source.y * self.scale + self.offset_y) / self.viewport.height * NORMALIZED_MAX,
        )
    }

    /// Normalized display coordinates to source pixels.
    pub fn to_source(&self, normalized: Point) -> Point {
        Point::new(
            (normalized.x / NORMALIZED_MAX * self.viewport.width - self.offset_x) / self.scale,
            (normalized.y / NORMALIZED_MAX * self.viewport.height - self.offset_y) / self.scale,
        )
    }

    pub fn quad_to_normalized(&self, quad: &Quadrilateral) -> Quadrilateral {
        quad.map(|p| self.to_normalized(p))
    }

    pub fn quad_to_source(&self, quad: &Quadrilateral) -> Quadrilateral {
        quad.map(|p| self.to_source(p))
    }
}

/// Map a detection-space pixel to full-resolution source coordinates.
///
/// The pixel's centre is used, so a downsampled pixel stands for the middle
/// of the source footprint it averaged rather than its top-left edge.
pub fn detection_to_source(pixel: Point, scale: f64) -> Point {
    Point::new((pixel.x + 0.5) / scale, (pixel.y + 0.5) / scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn wide_image_in_square_viewport_is_letterboxed_vertically() {
        let lb = Letterbox::fit(2000, 1000, Viewport::new(400.0, 400.0)).unwrap();
        assert_eq!(lb.scale(), 0.2);
        assert_eq!(lb.offset(), (0.0, 100.0));
        // Image top-left lands 25% down the viewport.
        assert_close(lb.to_normalized(Point::new(0.0, 0.0)), Point::new(0.0, 25.0));
        assert_close(lb.to_normalized(Point::new(2000.0, 1000.0)), Point::new(100.0, 75.0));
    }

    #[test]
    fn tall_image_is_pillarboxed() {
        let lb = Letterbox::fit(500, 1000, Viewport::new(400.0, 400.0)).unwrap();
        assert_eq!(lb.offset(), (100.0, 0.0));
        assert_close(lb.to_normalized(Point::new(250.0, 500.0)), Point::new(50.0, 50.0));
    }

    #[test]
    fn conversions_invert_each_other() {
        let lb = Letterbox::fit(4032, 3024, Viewport::new(390.0, 380.0)).unwrap();
        for p in [
            Point::new(0.0, 0.0),
            Point::new(1234.5, 987.25),
            Point::new(4032.0, 3024.0),
        ] {
            assert_close(lb.to_source(lb.to_normalized(p)), p);
        }
        let n = Point::new(17.0, 83.0);
        let back = lb.to_normalized(lb.to_source(n));
        assert!((back.x - n.x).abs() < 1e-9 && (back.y - n.y).abs() < 1e-9);
    }

    #[test]
    fn matching_viewport_is_identity_scaled() {
        let lb = Letterbox::fit(640, 480, Viewport::matching(640, 480)).unwrap();
        assert_close(lb.to_source(Point::new(100.0, 100.0)), Point::new(640.0, 480.0));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(matches!(
            Letterbox::fit(0, 10, Viewport::new(10.0, 10.0)),
            Err(InstaflatError::UnsupportedInput(_))
        ));
        assert!(matches!(
            Letterbox::fit(10, 10, Viewport::new(0.0, 10.0)),
            Err(InstaflatError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn detection_pixels_map_to_footprint_centres() {
        assert_close(detection_to_source(Point::new(0.0, 0.0), 0.2), Point::new(2.5, 2.5));
        assert_close(detection_to_source(Point::new(10.0, 4.0), 0.5), Point::new(21.0, 9.0));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inverse perspective warp — fill every output pixel by sampling the source
// through a homography.

use image::RgbaImage;
use tracing::{debug, instrument};

use super::homography::Homography;
use crate::image::TRANSPARENT;

/// Round-off allowance at the top and left edges, so an exact `0.0` that
/// the solver returns as `-1e-17` still samples the first row or column.
const EDGE_EPSILON: f64 = 1e-9;

/// Render a `width` x `height` image whose pixel `(x, y)` is the source pixel
/// at `floor(homography.map(x, y))`.
///
/// Samples that fall outside `0 <= src < dim` (or on the line at infinity)
/// come out transparent.
#[instrument(skip(source, homography), fields(src_w = source.width(), src_h = source.height()))]
pub fn warp_perspective(
    source: &RgbaImage,
    homography: &Homography,
    width: u32,
    height: u32,
) -> RgbaImage {
    let (src_w, src_h) = (source.width() as f64, source.height() as f64);
    let mut outside = 0u64;

    let output = RgbaImage::from_fn(width, height, |x, y| {
        let sample = homography.map(x as f64, y as f64).filter(|p| {
            p.x >= -EDGE_EPSILON && p.x < src_w && p.y >= -EDGE_EPSILON && p.y < src_h
        });
        match sample {
            Some(p) => {
                let (sx, sy) = (p.x.max(0.0).floor() as u32, p.y.max(0.0).floor() as u32);
                *source.get_pixel(sx, sy)
            }
            None => {
                outside += 1;
                TRANSPARENT
            }
        }
    });

    debug!(width, height, outside, "Perspective warp complete");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use instaflat_core::Quadrilateral;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    /// Pure scale-and-shift homography with exact coefficients.
    fn affine(sx: f64, tx: f64, sy: f64, ty: f64) -> Homography {
        Homography::from_coefficients([sx, 0.0, tx, 0.0, sy, ty, 0.0, 0.0])
    }

    /// A quad equal to the source rectangle reproduces the source.
    #[test]
    fn identity_warp_copies_pixels() {
        let src = gradient(64, 48);
        let h = affine(1.0, 0.0, 1.0, 0.0);
        let out = warp_perspective(&src, &h, 64, 48);
        assert_eq!(out, src);
    }

    /// A sub-rectangle quad acts as a crop.
    #[test]
    fn rectangular_quad_crops() {
        let src = gradient(100, 100);
        let h = affine(1.0, 10.0, 1.0, 40.0);
        let out = warp_perspective(&src, &h, 20, 30);
        assert_eq!(out.dimensions(), (20, 30));
        assert_eq!(out.get_pixel(0, 0), &Rgba([10, 40, 0, 255]));
        assert_eq!(out.get_pixel(19, 29), &Rgba([29, 69, 0, 255]));
    }

    /// Samples beyond the source edge are transparent, not clamped.
    #[test]
    fn outside_samples_are_transparent() {
        let src = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let h = affine(1.0, -10.0, 1.0, -10.0);
        let out = warp_perspective(&src, &h, 20, 20);
        assert_eq!(out.get_pixel(0, 0), &TRANSPARENT);
        assert_eq!(out.get_pixel(9, 9), &TRANSPARENT);
        assert_eq!(out.get_pixel(10, 10), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(19, 19), &Rgba([255, 255, 255, 255]));
    }

    /// A solved homography for a tilted quad lands every sample inside it.
    #[test]
    fn tilted_quad_samples_inside_source() {
        let src = RgbaImage::from_pixel(200, 200, Rgba([255, 0, 0, 255]));
        let quad = Quadrilateral::new(
            (20.0, 30.0).into(),
            (180.0, 10.0).into(),
            (170.0, 190.0).into(),
            (10.0, 170.0).into(),
        );
        let h = Homography::rect_to_quad(100.0, 100.0, &quad).unwrap();
        let out = warp_perspective(&src, &h, 100, 100);
        assert!(out.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn zero_sized_output_is_empty() {
        let src = gradient(8, 8);
        let h = affine(1.0, 0.0, 1.0, 0.0);
        assert_eq!(warp_perspective(&src, &h, 0, 0).dimensions(), (0, 0));
    }
}

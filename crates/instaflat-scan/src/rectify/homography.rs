// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Homography solver — recover the projective map from an output rectangle to
// an arbitrary source quadrilateral from four point correspondences.

use instaflat_core::error::{InstaflatError, Result};
use instaflat_core::{Point, Quadrilateral};
use tracing::{debug, warn};

/// Pivots smaller than this fraction of the largest matrix entry are treated
/// as zero.
const PIVOT_EPSILON: f64 = 1e-12;

/// Divisors closer to zero than this map to infinity.
const DIVISOR_EPSILON: f64 = 1e-12;

/// Eight coefficients `a..h` of the map from destination `(x, y)` to source:
///
/// ```text
/// srcX = (a·x + b·y + c) / (g·x + h·y + 1)
/// srcY = (d·x + e·y + f) / (g·x + h·y + 1)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    coeffs: [f64; 8],
}

impl Homography {
    /// Solve for the map taking `(0,0), (W,0), (W,H), (0,H)` onto the corners
    /// of `quad` (source pixels, in top-left/top-right/bottom-right/bottom-left
    /// roles).
    ///
    /// Fails with `DegenerateQuadrilateral` when corners coincide or three are
    /// collinear, or when elimination meets a vanishing pivot.
    pub fn rect_to_quad(width: f64, height: f64, quad: &Quadrilateral) -> Result<Self> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(InstaflatError::UnsupportedInput(format!(
                "target size must be positive, got {width}x{height}"
            )));
        }
        if let Some(reason) = quad.degeneracy() {
            warn!(%reason, "Rejecting degenerate quadrilateral");
            return Err(InstaflatError::DegenerateQuadrilateral(reason));
        }

        let dest = [(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)];
        let src = quad.corners();

        let mut a = [[0.0f64; 8]; 8];
        let mut b = [0.0f64; 8];
        for (i, (&(x, y), p)) in dest.iter().zip(src).enumerate() {
            a[i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * p.x, -y * p.x];
            b[i] = p.x;
            a[i + 4] = [0.0, 0.0, 0.0, x, y, 1.0, -x * p.y, -y * p.y];
            b[i + 4] = p.y;
        }

        let coeffs = solve(a, b).ok_or_else(|| {
            warn!("Homography system is singular");
            InstaflatError::DegenerateQuadrilateral(
                "corner positions do not define a perspective transform".into(),
            )
        })?;
        debug!(?coeffs, "Homography solved");
        Ok(Self { coeffs })
    }

    /// Build from known coefficients `[a, b, c, d, e, f, g, h]`.
    pub const fn from_coefficients(coeffs: [f64; 8]) -> Self {
        Self { coeffs }
    }

    /// Coefficients `[a, b, c, d, e, f, g, h]`.
    pub fn coefficients(&self) -> [f64; 8] {
        self.coeffs
    }

    /// Map a destination point into source coordinates. `None` when the
    /// point lies on the transform's line at infinity.
    #[inline]
    pub fn map(&self, x: f64, y: f64) -> Option<Point> {
        let [a, b, c, d, e, f, g, h] = self.coeffs;
        let z = g * x + h * y + 1.0;
        if z.abs() < DIVISOR_EPSILON {
            return None;
        }
        Some(Point::new((a * x + b * y + c) / z, (d * x + e * y + f) / z))
    }
}

/// Gaussian elimination with partial pivoting followed by back substitution.
/// Returns `None` for a (numerically) singular system.
fn solve(mut a: [[f64; 8]; 8], mut b: [f64; 8]) -> Option<[f64; 8]> {
    const N: usize = 8;
    let scale = a
        .iter()
        .flatten()
        .fold(0.0f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return None;
    }
    let tolerance = PIVOT_EPSILON * scale;

    for col in 0..N {
        let pivot_row =
            (col..N).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot_row][col].abs() <= tolerance {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..N {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            b[row] -= factor * b[col];
            for k in col..N {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    let mut x = [0.0f64; N];
    for row in (0..N).rev() {
        let tail: f64 = ((row + 1)..N).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::geometric_transformations::Projection;

    fn quad(points: [(f64, f64); 4]) -> Quadrilateral {
        Quadrilateral::new(
            points[0].into(),
            points[1].into(),
            points[2].into(),
            points[3].into(),
        )
    }

    fn assert_maps(h: &Homography, from: (f64, f64), to: (f64, f64)) {
        let p = h.map(from.0, from.1).expect("finite mapping");
        assert!(
            (p.x - to.0).abs() < 1e-6 && (p.y - to.1).abs() < 1e-6,
            "{from:?} -> {p:?}, expected {to:?}"
        );
    }

    #[test]
    fn corners_map_onto_quad() {
        let q = quad([
            (120.0, 80.0),
            (910.0, 140.0),
            (860.0, 1210.0),
            (90.0, 1100.0),
        ]);
        let h = Homography::rect_to_quad(800.0, 1274.0, &q).unwrap();
        assert_maps(&h, (0.0, 0.0), (120.0, 80.0));
        assert_maps(&h, (800.0, 0.0), (910.0, 140.0));
        assert_maps(&h, (800.0, 1274.0), (860.0, 1210.0));
        assert_maps(&h, (0.0, 1274.0), (90.0, 1100.0));
    }

    #[test]
    fn axis_aligned_quad_is_affine_scale() {
        let q = quad([(0.0, 0.0), (400.0, 0.0), (400.0, 200.0), (0.0, 200.0)]);
        let h = Homography::rect_to_quad(800.0, 400.0, &q).unwrap();
        let [a, b, c, d, e, f, g, hh] = h.coefficients();
        let expected = [0.5, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0];
        for (value, expected) in [a, b, c, d, e, f, g, hh].into_iter().zip(expected) {
            assert!((value - expected).abs() < 1e-9, "{:?}", h.coefficients());
        }
    }

    /// Cross-check against imageproc's own four-point solver.
    #[test]
    fn agrees_with_imageproc_projection() {
        let (w, h) = (600.0f32, 600.0f32);
        let corners = [
            (35.0f32, 60.0f32),
            (640.0, 20.0),
            (700.0, 610.0),
            (10.0, 580.0),
        ];
        let projection = Projection::from_control_points(
            [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)],
            corners,
        )
        .expect("control points are in general position");

        let q = quad(corners.map(|(x, y)| (x as f64, y as f64)));
        let ours = Homography::rect_to_quad(w as f64, h as f64, &q).unwrap();

        for point in [(100.0f32, 50.0f32), (300.0, 300.0), (550.0, 420.0)] {
            let (ex, ey) = projection * point;
            let p = ours.map(point.0 as f64, point.1 as f64).unwrap();
            assert!((p.x - ex as f64).abs() < 0.05, "x: {} vs {}", p.x, ex);
            assert!((p.y - ey as f64).abs() < 0.05, "y: {} vs {}", p.y, ey);
        }
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let q = quad([(0.0, 0.0), (100.0, 100.0), (200.0, 200.0), (300.0, 300.0)]);
        let err = Homography::rect_to_quad(800.0, 800.0, &q).unwrap_err();
        assert!(matches!(err, InstaflatError::DegenerateQuadrilateral(_)));
    }

    #[test]
    fn three_collinear_corners_are_degenerate() {
        let q = quad([(0.0, 0.0), (50.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        assert!(matches!(
            Homography::rect_to_quad(100.0, 100.0, &q),
            Err(InstaflatError::DegenerateQuadrilateral(_))
        ));
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let p = (42.0, 42.0);
        let q = quad([p, p, p, p]);
        assert!(matches!(
            Homography::rect_to_quad(100.0, 100.0, &q),
            Err(InstaflatError::DegenerateQuadrilateral(_))
        ));
    }

    #[test]
    fn zero_target_size_is_rejected() {
        let q = quad([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!(Homography::rect_to_quad(0.0, 10.0, &q).is_err());
    }

    #[test]
    fn singular_system_is_detected() {
        let mut a = [[0.0; 8]; 8];
        for (i, row) in a.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        a[7] = a[6];
        assert!(solve(a, [1.0; 8]).is_none());
        assert!(solve([[0.0; 8]; 8], [0.0; 8]).is_none());
    }
}

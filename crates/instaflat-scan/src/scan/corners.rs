// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner extraction — reduce a pixel set to its four extreme points.

use instaflat_core::{Point, Quadrilateral};

/// Pick the four extreme points of a pixel set in one pass.
///
/// With `sum = x + y` and `diff = x - y`:
///
/// | corner       | criterion    |
/// |--------------|--------------|
/// | top-left     | minimum sum  |
/// | bottom-right | maximum sum  |
/// | top-right    | maximum diff |
/// | bottom-left  | minimum diff |
///
/// The first point reaching an extreme keeps it. This closed form holds for
/// convex, roughly axis-aligned blobs with modest rotation. It is not a convex
/// hull: concave, occluded, or strongly rotated shapes produce wrong corners.
///
/// Returns `None` for an empty set.
pub fn extreme_corners(points: &[(u32, u32)]) -> Option<Quadrilateral> {
    let (&first, rest) = points.split_first()?;
    let key = |(x, y): (u32, u32)| (x as i64 + y as i64, x as i64 - y as i64);

    let (sum0, diff0) = key(first);
    let (mut tl, mut br, mut tr, mut bl) = (first, first, first, first);
    let (mut min_sum, mut max_sum, mut max_diff, mut min_diff) = (sum0, sum0, diff0, diff0);

    for &p in rest {
        let (sum, diff) = key(p);
        if sum < min_sum {
            min_sum = sum;
            tl = p;
        }
        if sum > max_sum {
            max_sum = sum;
            br = p;
        }
        if diff > max_diff {
            max_diff = diff;
            tr = p;
        }
        if diff < min_diff {
            min_diff = diff;
            bl = p;
        }
    }

    let to_point = |(x, y): (u32, u32)| Point::new(x as f64, y as f64);
    Some(Quadrilateral::new(
        to_point(tl),
        to_point(tr),
        to_point(br),
        to_point(bl),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_points(x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<(u32, u32)> {
        (y0..y1).flat_map(|y| (x0..x1).map(move |x| (x, y))).collect()
    }

    #[test]
    fn axis_aligned_rectangle() {
        let quad = extreme_corners(&rect_points(10, 20, 50, 40)).unwrap();
        assert_eq!(quad.top_left, Point::new(10.0, 20.0));
        assert_eq!(quad.top_right, Point::new(49.0, 20.0));
        assert_eq!(quad.bottom_right, Point::new(49.0, 39.0));
        assert_eq!(quad.bottom_left, Point::new(10.0, 39.0));
    }

    #[test]
    fn single_point_is_all_corners() {
        let quad = extreme_corners(&[(3, 4)]).unwrap();
        assert!(quad.corners().iter().all(|&p| p == Point::new(3.0, 4.0)));
    }

    #[test]
    fn empty_set_has_no_corners() {
        assert!(extreme_corners(&[]).is_none());
    }

    #[test]
    fn first_extreme_wins() {
        // (0, 2) and (2, 0) share the minimum sum; (0, 2) comes first.
        let quad = extreme_corners(&[(0, 2), (2, 0), (5, 5)]).unwrap();
        assert_eq!(quad.top_left, Point::new(0.0, 2.0));
    }

    #[test]
    fn mildly_rotated_diamond_keeps_roles() {
        // Corners of a square tilted a few degrees clockwise.
        let pts = [(12, 10), (50, 13), (47, 51), (9, 48), (30, 30)];
        let quad = extreme_corners(&pts).unwrap();
        assert_eq!(quad.top_left, Point::new(12.0, 10.0));
        assert_eq!(quad.top_right, Point::new(50.0, 13.0));
        assert_eq!(quad.bottom_right, Point::new(47.0, 51.0));
        assert_eq!(quad.bottom_left, Point::new(9.0, 48.0));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region growing — 4-connected flood fill over the brightness mask, keeping
// the largest component.

use tracing::debug;

use super::luminance::BrightnessMask;

/// A set of 4-connected bright pixels, in detection-space coordinates.
#[derive(Debug, Clone, Default)]
pub struct Component {
    pixels: Vec<(u32, u32)>,
}

impl Component {
    /// Number of pixels in the component.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixel coordinates in fill order.
    pub fn pixels(&self) -> &[(u32, u32)] {
        &self.pixels
    }
}

/// Find the largest 4-connected component of bright pixels.
///
/// Iterative fill on an explicit stack; the visited grid guarantees each pixel
/// is pushed at most once.
/// Seeds are taken in row-major order; on equal sizes the component found
/// first wins. Returns an empty component when the mask has no bright pixels.
pub fn largest_component(mask: &BrightnessMask) -> Component {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let bits = mask.bits();

    let mut visited = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::new();
    let mut best: Vec<(u32, u32)> = Vec::new();
    let mut current: Vec<(u32, u32)> = Vec::new();
    let mut components = 0usize;

    for seed in 0..w * h {
        if !bits[seed] || visited[seed] {
            continue;
        }
        components += 1;
        visited[seed] = true;
        stack.push(seed);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            current.push((x as u32, y as u32));

            let neighbours = [
                (x + 1 < w).then(|| idx + 1),
                (x > 0).then(|| idx - 1),
                (y + 1 < h).then(|| idx + w),
                (y > 0).then(|| idx - w),
            ];
            for n in neighbours.into_iter().flatten() {
                if bits[n] && !visited[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }

        if current.len() > best.len() {
            std::mem::swap(&mut best, &mut current);
        }
        current.clear();
    }

    debug!(components, largest = best.len(), "Region growing complete");
    Component { pixels: best }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Instaflat rectification engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InstaflatError;

/// Upper bound of the normalized display space. Corners live in `[0, 100]`.
pub const NORMALIZED_MAX: f64 = 100.0;

/// Half-extent of the guide rectangle along its longer side, in normalized
/// units.
const GUIDE_BASE_SIZE: f64 = 35.0;

/// Relative tolerance below which corners count as coincident or collinear.
const DEGENERACY_EPSILON: f64 = 1e-6;

/// A 2D point. Depending on context this is in normalized display space
/// (0–100), full-resolution source pixels, or detection pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both axes to the normalized range `[0, 100]`.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, NORMALIZED_MAX),
            y: self.y.clamp(0.0, NORMALIZED_MAX),
        }
    }

    fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// The four named roles of a quadrilateral corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// All corners in solver order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Unit direction pointing away from the quad's interior.
    pub fn outward(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (-1.0, -1.0),
            Self::TopRight => (1.0, -1.0),
            Self::BottomRight => (1.0, 1.0),
            Self::BottomLeft => (-1.0, 1.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four named corners. No ordering invariant is enforced at rest: callers
/// supply the corners in consistent roles, and only the solver rejects
/// degenerate shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quadrilateral {
    pub const fn new(
        top_left: Point,
        top_right: Point,
        bottom_right: Point,
        bottom_left: Point,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// The whole normalized viewport.
    pub const fn full_frame() -> Self {
        Self::new(
            Point::new(0.0, 0.0),
            Point::new(NORMALIZED_MAX, 0.0),
            Point::new(NORMALIZED_MAX, NORMALIZED_MAX),
            Point::new(0.0, NORMALIZED_MAX),
        )
    }

    /// Centred guide rectangle matching the format's aspect ratio. Used until
    /// a detection succeeds and whenever the user switches formats.
    pub fn guide(format: PrintFormat) -> Self {
        let ratio = format.aspect_ratio();
        let (half_w, half_h) = if ratio < 1.0 {
            (GUIDE_BASE_SIZE * ratio, GUIDE_BASE_SIZE)
        } else {
            (GUIDE_BASE_SIZE, GUIDE_BASE_SIZE / ratio)
        };
        let (cx, cy) = (NORMALIZED_MAX / 2.0, NORMALIZED_MAX / 2.0);
        Self::new(
            Point::new(cx - half_w, cy - half_h),
            Point::new(cx + half_w, cy - half_h),
            Point::new(cx + half_w, cy + half_h),
            Point::new(cx - half_w, cy + half_h),
        )
    }

    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomRight => self.bottom_right,
            Corner::BottomLeft => self.bottom_left,
        }
    }

    fn corner_mut(&mut self, corner: Corner) -> &mut Point {
        match corner {
            Corner::TopLeft => &mut self.top_left,
            Corner::TopRight => &mut self.top_right,
            Corner::BottomRight => &mut self.bottom_right,
            Corner::BottomLeft => &mut self.bottom_left,
        }
    }

    /// Corners in `[top_left, top_right, bottom_right, bottom_left]` order.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Apply `f` to every corner, keeping the roles.
    pub fn map(&self, mut f: impl FnMut(Point) -> Point) -> Self {
        Self::new(
            f(self.top_left),
            f(self.top_right),
            f(self.bottom_right),
            f(self.bottom_left),
        )
    }

    /// Manual override of one corner, clamped to the normalized range.
    pub fn with_corner(mut self, corner: Corner, point: Point) -> Self {
        *self.corner_mut(corner) = point.clamped();
        self
    }

    /// Push every corner outward by `margin` on both axes, without clamping.
    pub fn with_margin(mut self, margin: f64) -> Self {
        for corner in Corner::ALL {
            let (dx, dy) = corner.outward();
            let p = self.corner_mut(corner);
            p.x += dx * margin;
            p.y += dy * margin;
        }
        self
    }

    /// Uniform expand (positive) or shrink (negative), clamped to `[0, 100]`.
    pub fn expanded(self, amount: f64) -> Self {
        self.with_margin(amount).map(Point::clamped)
    }

    /// Describe why this quad cannot define a projective transform, if it
    /// cannot. Checks for coincident corners and collinear triples, with a
    /// tolerance relative to the quad's extent.
    pub fn degeneracy(&self) -> Option<String> {
        let corners = self.corners();
        if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Some("corner coordinates are not finite".into());
        }

        let extent = corners
            .iter()
            .flat_map(|a| corners.iter().map(move |b| a.distance(*b)))
            .fold(0.0f64, f64::max);
        if extent <= f64::EPSILON {
            return Some("all corners coincide".into());
        }

        for i in 0..4 {
            for j in (i + 1)..4 {
                if corners[i].distance(corners[j]) <= DEGENERACY_EPSILON * extent {
                    return Some(format!(
                        "{} and {} corners coincide",
                        Corner::ALL[i],
                        Corner::ALL[j]
                    ));
                }
            }
        }

        // Every triple of corners must span a non-zero area.
        const TRIPLES: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];
        for (skip, [i, j, k]) in TRIPLES.into_iter().enumerate() {
            let (a, b, c) = (corners[i], corners[j], corners[k]);
            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            if cross.abs() <= DEGENERACY_EPSILON * extent * extent {
                return Some(format!(
                    "three corners are collinear (all except {})",
                    Corner::ALL[skip]
                ));
            }
        }

        None
    }
}

impl Default for Quadrilateral {
    fn default() -> Self {
        Self::guide(PrintFormat::default())
    }
}

/// Instant-print film formats. The built-in presets carry the physical image
/// size of the film; `Custom` lets callers supply any other ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintFormat {
    #[default]
    Mini,
    Square,
    Wide,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PrintFormat {
    /// Presets offered by default.
    pub const BUILTIN: [PrintFormat; 3] = [PrintFormat::Mini, PrintFormat::Square, PrintFormat::Wide];

    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::Mini => (54, 86),
            Self::Square => (62, 62),
            Self::Wide => (99, 62),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = self.dimensions_mm();
        w as f64 / h as f64
    }

    /// Human-readable name.
    pub fn label(&self) -> String {
        match self {
            Self::Mini => "Instax Mini".into(),
            Self::Square => "Instax Square".into(),
            Self::Wide => "Instax Wide".into(),
            Self::Custom {
                width_mm,
                height_mm,
            } => format!("Custom {width_mm}x{height_mm} mm"),
        }
    }

    /// Stable identifier, accepted back by `FromStr`.
    pub fn id(&self) -> String {
        match self {
            Self::Mini => "mini".into(),
            Self::Square => "square".into(),
            Self::Wide => "wide".into(),
            Self::Custom {
                width_mm,
                height_mm,
            } => format!("{width_mm}x{height_mm}"),
        }
    }

    /// Reject formats whose ratio is not a positive finite number.
    pub fn validate(&self) -> Result<(), InstaflatError> {
        let (w, h) = self.dimensions_mm();
        if w == 0 || h == 0 {
            return Err(InstaflatError::InvalidFormat(format!(
                "{}: width and height must be non-zero",
                self.id()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PrintFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for PrintFormat {
    type Err = InstaflatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let format = match lower.as_str() {
            "mini" => Self::Mini,
            "square" => Self::Square,
            "wide" => Self::Wide,
            other => {
                let (w, h) = parse_pair(other, 'x')
                    .ok_or_else(|| InstaflatError::InvalidFormat(s.to_owned()))?;
                Self::Custom {
                    width_mm: w,
                    height_mm: h,
                }
            }
        };
        format.validate()?;
        Ok(format)
    }
}

/// Size of the display surface the normalized quad is drawn over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A viewport exactly the size of the image, i.e. no letterboxing.
    pub fn matching(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }

    /// Whether the viewport has no usable area.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite())
    }
}

impl FromStr for Viewport {
    type Err = InstaflatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h): (u32, u32) = parse_pair(&s.trim().to_ascii_lowercase(), 'x').ok_or_else(|| {
            InstaflatError::UnsupportedInput(format!("viewport must look like 800x600, got {s}"))
        })?;
        let viewport = Self::matching(w, h);
        if viewport.is_empty() {
            return Err(InstaflatError::UnsupportedInput(format!(
                "viewport {s} has no area"
            )));
        }
        Ok(viewport)
    }
}

fn parse_pair(s: &str, sep: char) -> Option<(u32, u32)> {
    let (a, b) = s.split_once(sep)?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

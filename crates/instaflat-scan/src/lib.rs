// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// instaflat-scan — Flattening engine for photographed instant prints.
//
// Finds the bright print in a photo (luminance threshold, region growing,
// extreme corners), maps its corners through the letterboxed display, solves
// the perspective transform, and resamples a flat fixed-aspect output image.

pub mod export;
pub mod image;
pub mod rectify;
pub mod scan;
pub mod session;

// Re-export the primary entry points so callers can use `instaflat_scan::detect` etc.
pub use export::{Encoding, RectifiedPrint, export};
pub use image::processor::ImageProcessor;
pub use rectify::{Homography, output_dimensions, rectify, rectify_prepared, rotate_source};
pub use scan::{DetectionOutcome, DetectionWorker, Letterbox, WorkerOutcome, analyze, detect};
pub use session::CropSession;

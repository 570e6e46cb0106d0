// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection pipeline — luminance threshold, region growing, corner extraction,
// coordinate mapping, and the background detection worker.

pub mod corners;
pub mod detect;
pub mod luminance;
pub mod mapping;
pub mod region;
pub mod worker;

pub use detect::{DetectionOutcome, DetectionReport, analyze, detect};
pub use mapping::Letterbox;
pub use worker::{DetectionWorker, WorkerOutcome};

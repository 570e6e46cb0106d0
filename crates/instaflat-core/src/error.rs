// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Instaflat.

use thiserror::Error;

/// Top-level error type for all Instaflat operations.
///
/// A failed detection is deliberately absent: it is an ordinary outcome that
/// leaves the current quadrilateral in place, not an error.
#[derive(Debug, Error)]
pub enum InstaflatError {
    // -- Input --
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("unknown or invalid print format: {0}")]
    InvalidFormat(String),

    // -- Geometry --
    #[error("degenerate quadrilateral: {0}")]
    DegenerateQuadrilateral(String),

    // -- Image codec --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Background work --
    #[error("detection task failed: {0}")]
    Task(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, InstaflatError>;

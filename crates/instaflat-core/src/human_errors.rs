// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the crop screen.
//
// Every technical error is mapped to plain English with a clear suggestion.
// A failed rectification blocks the user, so the message must say what to do
// next rather than what went wrong internally.

use crate::error::InstaflatError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Disk hiccup or similar — trying again may work.
    Transient,
    /// User must do something (move a corner, pick another format).
    ActionRequired,
    /// Cannot be fixed by retrying — unreadable or empty image.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert an `InstaflatError` into a `HumanError`.
pub fn humanize_error(err: &InstaflatError) -> HumanError {
    match err {
        InstaflatError::UnsupportedInput(_) => HumanError {
            message: "There's no picture to work with.".into(),
            suggestion: "The photo is empty or didn't load. Take the picture again or choose another file.".into(),
            severity: Severity::Permanent,
        },

        InstaflatError::InvalidFormat(detail) => HumanError {
            message: "That print size isn't available.".into(),
            suggestion: format!("Pick Mini, Square or Wide, or give a size like 54x86. ({detail})"),
            severity: Severity::ActionRequired,
        },

        InstaflatError::DegenerateQuadrilateral(_) => HumanError {
            message: "The corners don't outline a photo.".into(),
            suggestion: "Drag the four corner handles onto the corners of the print so they form a four-sided shape, then try again.".into(),
            severity: Severity::ActionRequired,
        },

        InstaflatError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::Permanent,
        },

        InstaflatError::Task(_) => HumanError {
            message: "Finding the photo's edges stopped unexpectedly.".into(),
            suggestion: "Tap auto-detect again, or place the corners by hand.".into(),
            severity: Severity::Transient,
        },

        InstaflatError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or try a different folder.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    severity: Severity::Transient,
                }
            }
        }

        InstaflatError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Fix or delete the settings file; the defaults will be used instead.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

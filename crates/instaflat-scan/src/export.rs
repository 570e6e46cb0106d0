// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export — encode a rectified print and describe it for whoever persists it.

use std::path::Path;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use instaflat_core::PrintFormat;
use instaflat_core::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use crate::image::{ImageProcessor, ensure_not_empty};

/// Output encoding for an exported print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Encoding {
    /// Lossy, no alpha. Transparent margins come out black.
    Jpeg { quality: u8 },
    Png,
}

impl Encoding {
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }
}

/// An encoded rectified print plus the metadata a caller needs to store it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectifiedPrint {
    pub format: PrintFormat,
    pub width: u32,
    pub height: u32,
    pub media_type: String,
    /// Hex SHA-256 of the encoded bytes.
    pub sha256: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    bytes: Vec<u8>,
}

impl RectifiedPrint {
    /// Encoded image data.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Write the encoded bytes to `path`.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), &self.bytes)?;
        info!(bytes = self.bytes.len(), "Rectified print written");
        Ok(())
    }
}

/// Encode `output` and stamp it with its hash and creation time.
#[instrument(skip(output), fields(width = output.width(), height = output.height(), %format))]
pub fn export(output: &RgbaImage, format: PrintFormat, encoding: Encoding) -> Result<RectifiedPrint> {
    ensure_not_empty(output)?;
    let (width, height) = output.dimensions();
    let processor = ImageProcessor::from_rgba(output.clone());
    let bytes = match encoding {
        Encoding::Jpeg { quality } => processor.to_jpeg_bytes(quality)?,
        Encoding::Png => processor.to_png_bytes()?,
    };
    let sha256 = hex::encode(Sha256::digest(&bytes));

    info!(len = bytes.len(), %sha256, "Print encoded");
    Ok(RectifiedPrint {
        format,
        width,
        height,
        media_type: encoding.media_type().to_owned(),
        sha256,
        created_at: Utc::now(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(40, 30, |x, y| Rgba([x as u8 * 6, y as u8 * 8, 90, 255]))
    }

    #[test]
    fn hash_matches_encoded_bytes() {
        let print = export(&sample(), PrintFormat::Wide, Encoding::Png).unwrap();
        assert_eq!(print.sha256, hex::encode(Sha256::digest(print.bytes())));
        assert_eq!(print.sha256.len(), 64);
        assert_eq!((print.width, print.height), (40, 30));
        assert_eq!(print.media_type, "image/png");
    }

    #[test]
    fn png_round_trips_losslessly() {
        let img = sample();
        let print = export(&img, PrintFormat::Mini, Encoding::Png).unwrap();
        let decoded = image::load_from_memory(print.bytes()).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn jpeg_has_jpeg_signature() {
        let print = export(&sample(), PrintFormat::Square, Encoding::Jpeg { quality: 92 }).unwrap();
        assert_eq!(&print.bytes()[..2], &[0xFF, 0xD8]);
        assert_eq!(print.media_type, "image/jpeg");
    }

    #[test]
    fn write_to_persists_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("print.png");
        let print = export(&sample(), PrintFormat::Mini, Encoding::Png).unwrap();
        print.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), print.bytes());
    }

    /// Metadata serializes without the image payload.
    #[test]
    fn metadata_json_omits_bytes() {
        let print = export(&sample(), PrintFormat::Square, Encoding::Png).unwrap();
        let json = serde_json::to_value(&print).unwrap();
        assert_eq!(json["format"], "square");
        assert!(json.get("bytes").is_none());
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn empty_output_is_rejected() {
        assert!(export(&RgbaImage::new(0, 0), PrintFormat::Mini, Encoding::Png).is_err());
    }
}

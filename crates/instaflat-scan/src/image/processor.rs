// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding, detection downsampling, the rotation pre-pass,
// and encoding of the rectified result. Operates on in-memory images using the
// `image` and `imageproc` crates.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use instaflat_core::error::InstaflatError;
use tracing::{debug, info, instrument};

/// Fill used for pixels that have no source sample.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transforming method consumes `self` and returns a new
/// `ImageProcessor`, enabling method chaining.
///
/// ```ignore
/// let rotated = ImageProcessor::open("scan.jpg")?
///     .rotate(7.5)
///     .into_rgba();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, InstaflatError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            InstaflatError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, InstaflatError> {
        let img = image::load_from_memory(data).map_err(|err| {
            InstaflatError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an RGBA buffer.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return an RGBA buffer.
    pub fn into_rgba(self) -> RgbaImage {
        self.image.into_rgba8()
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Rotate the image by an arbitrary angle in degrees (clockwise).
    ///
    /// Quarter turns are lossless. Any other angle re-renders the image into a
    /// canvas just large enough to hold the rotated content; uncovered pixels
    /// are transparent.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        // Fast-path for exact multiples of 90.
        let normalised = degrees.rem_euclid(360.0);
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }
        info!(degrees, "Rotating image");
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate270(),
            };
        }

        let rgba = self.image.to_rgba8();
        let (w, h) = (rgba.width() as f32, rgba.height() as f32);
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        let out_w = ((w * cos.abs() + h * sin.abs()).ceil() as u32).max(1);
        let out_h = ((w * sin.abs() + h * cos.abs()).ceil() as u32).max(1);

        // Move the centre to the origin, rotate, then re-centre on the
        // enlarged canvas.
        let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
            * Projection::rotate(radians)
            * Projection::translate(-w / 2.0, -h / 2.0);

        let mut rotated = RgbaImage::new(out_w, out_h);
        warp_into(
            &rgba,
            &projection,
            Interpolation::Nearest,
            TRANSPARENT,
            &mut rotated,
        );

        debug!(out_w, out_h, "General rotation applied");
        Self::from_rgba(rotated)
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, InstaflatError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    /// JPEG has no alpha, so transparent pixels come out black.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, InstaflatError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder).map_err(|err| {
            InstaflatError::ImageError(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }
}

/// Reject buffers with no pixels before any work begins.
pub fn ensure_not_empty(image: &RgbaImage) -> Result<(), InstaflatError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(InstaflatError::UnsupportedInput(format!(
            "source image is {}x{}",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Shrink a borrowed buffer by `scale` for detection. Each dimension becomes
/// `max(1, floor(dim * scale))`; a triangle filter averages the pixels that
/// collapse together.
#[instrument(skip(source), fields(from_w = source.width(), from_h = source.height()))]
pub fn downsample(source: &RgbaImage, scale: f64) -> RgbaImage {
    let width = scaled_dimension(source.width(), scale);
    let height = scaled_dimension(source.height(), scale);
    debug!(width, height, "Downsampling for detection");
    image::imageops::resize(source, width, height, FilterType::Triangle)
}

fn scaled_dimension(dim: u32, scale: f64) -> u32 {
    ((dim as f64 * scale).floor() as u32).max(1)
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, InstaflatError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| InstaflatError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}

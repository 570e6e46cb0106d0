// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Results go to stdout as JSON; logs go to
// stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use instaflat_core::error::{InstaflatError, Result};
use instaflat_core::{EngineConfig, Point, PrintFormat, Quadrilateral, Viewport};
use instaflat_scan::{
    CropSession, DetectionOutcome, DetectionWorker, Encoding, ImageProcessor, WorkerOutcome,
    rotate_source,
};
use serde::Serialize;
use tracing::{info, warn};

pub struct DetectArgs {
    pub image: PathBuf,
    pub viewport: Option<Viewport>,
    pub rotate: f32,
    pub format: Option<PrintFormat>,
}

pub struct RectifyArgs {
    pub image: PathBuf,
    pub output: PathBuf,
    pub format: Option<PrintFormat>,
    pub rotate: f32,
    pub viewport: Option<Viewport>,
    pub corners: Option<Quadrilateral>,
    pub expand: Option<f64>,
    pub detect: bool,
    pub png: bool,
}

#[derive(Serialize)]
struct FormatEntry {
    id: String,
    label: String,
    width_mm: u32,
    height_mm: u32,
    aspect_ratio: f64,
}

#[derive(Serialize)]
struct DetectReport {
    detected: bool,
    /// Detected quad, or the format's guide quad when detection failed.
    quad: Quadrilateral,
    outcome: DetectionOutcome,
    viewport: Viewport,
    rotation: f32,
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_image(path: &Path) -> Result<image::RgbaImage> {
    Ok(ImageProcessor::open(path)?.into_rgba())
}

/// `instaflat formats`
pub fn formats() -> Result<()> {
    let entries: Vec<FormatEntry> = PrintFormat::BUILTIN
        .iter()
        .map(|format| {
            let (width_mm, height_mm) = format.dimensions_mm();
            FormatEntry {
                id: format.id(),
                label: format.label(),
                width_mm,
                height_mm,
                aspect_ratio: format.aspect_ratio(),
            }
        })
        .collect();
    print_json(&entries)
}

/// `instaflat detect`: runs on the background worker, the same path an
/// interactive front end uses.
pub async fn detect(config: &EngineConfig, args: DetectArgs) -> Result<()> {
    let original = load_image(&args.image)?;
    let displayed = Arc::new(rotate_source(&original, args.rotate));
    let viewport = args
        .viewport
        .unwrap_or_else(|| Viewport::matching(displayed.width(), displayed.height()));
    let format = args.format.unwrap_or(config.default_format);
    format.validate()?;

    let worker = DetectionWorker::new(config.detection.clone());
    let outcome = completed(worker.submit(displayed, viewport).await?)?;

    let quad = outcome
        .quad()
        .copied()
        .unwrap_or_else(|| Quadrilateral::guide(format));
    print_json(&DetectReport {
        detected: outcome.quad().is_some(),
        quad,
        outcome,
        viewport,
        rotation: args.rotate,
    })
}

/// Unwrap a worker result. Nothing else submits on this worker, so a
/// superseded run means the task was lost.
fn completed(outcome: WorkerOutcome) -> Result<DetectionOutcome> {
    match outcome {
        WorkerOutcome::Completed(outcome) => Ok(outcome),
        WorkerOutcome::Superseded => Err(InstaflatError::Task(
            "detection was superseded with no newer request".into(),
        )),
    }
}

/// `instaflat rectify`
pub fn rectify(config: EngineConfig, args: RectifyArgs) -> Result<()> {
    let original = load_image(&args.image)?;
    let format = args.format.unwrap_or(config.default_format);
    let initial_viewport = args
        .viewport
        .unwrap_or_else(|| Viewport::matching(original.width(), original.height()));

    let mut session = CropSession::new(original, initial_viewport, format, config)?;
    if args.rotate != 0.0 {
        session.set_rotation(args.rotate);
        if args.viewport.is_none() {
            let (w, h) = session.shared_image().dimensions();
            session.set_viewport(Viewport::matching(w, h))?;
        }
    }

    if let Some(corners) = args.corners {
        session.set_quad(corners);
    } else if args.detect {
        match session.detect()? {
            DetectionOutcome::Detected { .. } => info!("Using detected corners"),
            DetectionOutcome::Failed { .. } => warn!("No print found; using the guide quad"),
        }
    }
    if let Some(amount) = args.expand {
        session.expand(amount);
    }

    let encoding = if args.png || has_png_extension(&args.output) {
        Encoding::Png
    } else {
        session.default_encoding()
    };
    let print = session.export(encoding)?;
    print.write_to(&args.output)?;
    info!(path = %args.output.display(), "Saved");
    print_json(&print)
}

/// `--expand` alone means one configured step; `--expand A` means `A`.
pub fn expand_amount(flag: Option<Option<f64>>, step: f64) -> Option<f64> {
    flag.map(|amount| amount.unwrap_or(step))
}

fn has_png_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

/// Parse `"x,y x,y x,y x,y"` (top-left, top-right, bottom-right, bottom-left).
pub fn parse_corners(s: &str) -> std::result::Result<Quadrilateral, String> {
    let points = s
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| format!("expected x,y but got {pair:?}"))?;
            let parse = |v: &str| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|err| format!("{v:?} is not a number: {err}"))
            };
            Ok(Point::new(parse(x)?, parse(y)?))
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;

    match points.as_slice() {
        &[tl, tr, br, bl] => Ok(Quadrilateral::new(tl, tr, br, bl)),
        other => Err(format!("expected 4 corners, got {}", other.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn corners_parse_in_role_order() {
        let quad = parse_corners("10,12 90,11.5 88,95 9,93").unwrap();
        assert_eq!(quad.top_left, Point::new(10.0, 12.0));
        assert_eq!(quad.top_right, Point::new(90.0, 11.5));
        assert_eq!(quad.bottom_right, Point::new(88.0, 95.0));
        assert_eq!(quad.bottom_left, Point::new(9.0, 93.0));
    }

    #[test]
    fn corners_reject_bad_input() {
        assert!(parse_corners("10,12 90,11").is_err());
        assert!(parse_corners("10;12 1,1 2,2 3,3").is_err());
        assert!(parse_corners("a,1 1,1 2,2 3,3").is_err());
    }

    #[test]
    fn bare_expand_uses_configured_step() {
        assert_eq!(expand_amount(Some(None), 2.0), Some(2.0));
        assert_eq!(expand_amount(Some(Some(-3.5)), 2.0), Some(-3.5));
        assert_eq!(expand_amount(None, 2.0), None);
    }

    /// A superseded run on the CLI's private worker is an error, not an
    /// empty detection.
    #[test]
    fn superseded_worker_result_is_task_error() {
        let err = completed(WorkerOutcome::Superseded).unwrap_err();
        assert!(matches!(err, InstaflatError::Task(_)));

        let failed = DetectionOutcome::Failed { largest_component: 7 };
        assert_eq!(
            completed(WorkerOutcome::Completed(failed.clone())).unwrap(),
            failed
        );
    }

    #[test]
    fn png_extension_detection() {
        assert!(has_png_extension(Path::new("out/print.PNG")));
        assert!(!has_png_extension(Path::new("print.jpg")));
        assert!(!has_png_extension(Path::new("print")));
    }

    /// Rectify end to end through files, with explicit corners.
    #[test]
    fn rectify_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        let output = dir.path().join("flat.png");
        RgbaImage::from_pixel(120, 80, Rgba([200, 180, 160, 255]))
            .save(&input)
            .unwrap();

        rectify(
            EngineConfig::default(),
            RectifyArgs {
                image: input,
                output: output.clone(),
                format: Some(PrintFormat::Wide),
                rotate: 0.0,
                viewport: None,
                corners: Some(parse_corners("5,5 95,5 95,95 5,95").unwrap()),
                expand: None,
                detect: true,
                png: false,
            },
        )
        .unwrap();

        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (800, 501));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background detection with latest-wins semantics.
//
// Detection is the most expensive step, so interactive front ends run it on
// tokio's blocking pool. Every submission bumps a shared generation counter;
// a result whose generation is no longer current is reported as superseded
// and must be dropped by the caller. Each run owns its buffers, so nothing
// beyond the counter is shared.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;
use instaflat_core::error::{InstaflatError, Result};
use instaflat_core::{DetectionConfig, Viewport};
use tracing::{debug, instrument};

use super::detect::{DetectionOutcome, detect};

/// What a submitted detection produced.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    /// The run finished and is still the latest request.
    Completed(DetectionOutcome),
    /// A newer request (or a cancel) arrived while this one ran.
    Superseded,
}

/// Runs detections off the calling task and discards stale results.
#[derive(Clone)]
pub struct DetectionWorker {
    generation: Arc<AtomicU64>,
    config: Arc<DetectionConfig>,
}

impl DetectionWorker {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            config: Arc::new(config),
        }
    }

    /// Generation of the most recent submission or cancel.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidate every in-flight detection.
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Detections cancelled");
    }

    /// Start a detection. The generation is claimed immediately, before the
    /// returned future is first polled, so submission order decides which
    /// request is the latest.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn submit(
        &self,
        source: Arc<RgbaImage>,
        viewport: Viewport,
    ) -> impl Future<Output = Result<WorkerOutcome>> + Send + 'static {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let config = Arc::clone(&self.config);
        debug!(ticket, "Detection submitted");

        async move {
            let outcome = tokio::task::spawn_blocking(move || detect(&source, viewport, &config))
                .await
                .map_err(|err| InstaflatError::Task(err.to_string()))??;

            if generation.load(Ordering::SeqCst) == ticket {
                Ok(WorkerOutcome::Completed(outcome))
            } else {
                debug!(ticket, "Detection superseded");
                Ok(WorkerOutcome::Superseded)
            }
        }
    }
}

impl Default for DetectionWorker {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

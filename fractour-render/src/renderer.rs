use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use fractour_core::{Fractal, IterationBudget, Viewport};

use crate::buffer::RenderBuffer;
use crate::color::{colorize, Colorizer};
use crate::error::RenderError;
use crate::iteration_buffer::IterationBuffer;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Tracks the current render generation for cancellation and progress.
///
/// Advancing the generation signals every in-flight row to stop early.
/// The progress counters count finished rows.
#[derive(Debug)]
pub struct RenderCancel {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            progress_done: AtomicUsize::new(0),
            progress_total: AtomicUsize::new(0),
        }
    }

    /// Cancel the current render by advancing the generation.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    fn inc_progress(&self) {
        self.progress_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the current progress as `(rows_done, rows_total)`.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Iteration pass
// ---------------------------------------------------------------------------

/// Raw output of the iteration pass.
pub struct RenderResult {
    pub iterations: IterationBuffer,
    pub elapsed: Duration,
    /// The generation advanced mid-render; `iterations` is incomplete.
    pub cancelled: bool,
    pub rows_rendered: usize,
}

/// Iterate every pixel of `viewport` in parallel, one row per task.
///
/// Rows are independent, so rayon schedules them over the global pool.
/// Each row checks the cancel generation before starting; rows skipped
/// after a cancel keep their placeholder data and the result is flagged
/// `cancelled`.
pub fn render<F: Fractal + Sync>(
    fractal: &F,
    viewport: &Viewport,
    max_iterations: u32,
    cancel: &RenderCancel,
) -> RenderResult {
    let start = Instant::now();
    let gen = cancel.generation();
    let width = viewport.width as usize;
    let rows_rendered = AtomicUsize::new(0);

    debug!(
        width = viewport.width,
        height = viewport.height,
        max_iterations,
        "Starting render"
    );
    cancel.reset_progress(viewport.height as usize);

    let mut iterations = IterationBuffer::new(viewport.width, viewport.height, max_iterations);
    iterations
        .data
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(py, row)| {
            if cancel.generation() != gen {
                return;
            }
            for (px, out) in row.iter_mut().enumerate() {
                let point = viewport.pixel_to_complex(px as u32, py as u32);
                *out = fractal.iterate(point, max_iterations);
            }
            rows_rendered.fetch_add(1, Ordering::Relaxed);
            cancel.inc_progress();
        });

    let cancelled = cancel.generation() != gen;
    let rows_rendered = rows_rendered.into_inner();
    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        rows_rendered, cancelled, "Render complete"
    );

    RenderResult {
        iterations,
        elapsed,
        cancelled,
        rows_rendered,
    }
}

// ---------------------------------------------------------------------------
// Full frame
// ---------------------------------------------------------------------------

/// A completed, colored frame together with the data it was built from.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The viewport snapshot the frame was rendered for.
    pub viewport: Viewport,
    pub iterations: IterationBuffer,
    pub image: RenderBuffer,
    pub elapsed: Duration,
}

impl Frame {
    pub fn max_iterations(&self) -> u32 {
        self.iterations.max_iterations
    }

    /// Re-color the stored iteration data with a different scheme.
    pub fn recolored<C: Colorizer + Sync>(&self, colorizer: &C) -> Self {
        let start = Instant::now();
        let image = colorize(colorizer, &self.iterations);
        Self {
            viewport: self.viewport,
            iterations: self.iterations.clone(),
            image,
            elapsed: start.elapsed(),
        }
    }
}

/// Render `viewport` into a colored frame.
///
/// The iteration budget is derived from the viewport once, then every
/// pixel is converted, iterated, and colored. The frame is built in a
/// private buffer and only returned whole; a cancelled render yields
/// [`RenderError::Cancelled`] and no pixels.
pub fn render_frame<F, C>(
    fractal: &F,
    colorizer: &C,
    viewport: &Viewport,
    budget: &IterationBudget,
    cancel: &RenderCancel,
) -> crate::Result<Frame>
where
    F: Fractal + Sync,
    C: Colorizer + Sync,
{
    viewport.validate()?;
    let max_iterations = budget.for_viewport(viewport);

    let result = render(fractal, viewport, max_iterations, cancel);
    if result.cancelled {
        return Err(RenderError::Cancelled);
    }

    let color_start = Instant::now();
    let image = colorize(colorizer, &result.iterations);
    Ok(Frame {
        viewport: *viewport,
        iterations: result.iterations,
        image,
        elapsed: result.elapsed + color_start.elapsed(),
    })
}

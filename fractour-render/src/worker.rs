use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use fractour_core::{Complex, FractalKind, IterationBudget, Viewport};

use crate::color::ColorKind;
use crate::error::RenderError;
use crate::renderer::{render_frame, Frame, RenderCancel};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything the worker needs to produce one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub viewport: Viewport,
    pub fractal: FractalKind,
    /// Julia parameter; ignored by the other families.
    pub julia_c: Complex,
    pub color: ColorKind,
    pub budget: IterationBudget,
}

impl RenderRequest {
    /// True when `other` differs from `self` only in its color scheme,
    /// so the iteration data of one can be reused for the other.
    fn same_geometry(&self, other: &Self) -> bool {
        self.viewport == other.viewport
            && self.fractal == other.fractal
            && self.budget == other.budget
            && (self.fractal != FractalKind::Julia || self.julia_c == other.julia_c)
    }
}

/// A published frame tagged with the request that produced it.
#[derive(Debug)]
pub struct RenderedFrame {
    /// Monotonic request id; a higher id always supersedes a lower one.
    pub id: u64,
    pub request: RenderRequest,
    pub frame: Frame,
}

/// Receiver of finished frames.
///
/// Called from the worker thread, once per published frame, in id order.
pub trait FrameSink: Send + Sync {
    fn present(&self, frame: Arc<RenderedFrame>);
}

impl<F> FrameSink for F
where
    F: Fn(Arc<RenderedFrame>) + Send + Sync,
{
    fn present(&self, frame: Arc<RenderedFrame>) {
        self(frame)
    }
}

/// Holds the most recently published frame.
///
/// Publication swaps an `Arc` under a short lock, so readers see either
/// the previous frame or the new one, never a mix.
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Option<Arc<RenderedFrame>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `frame` unless a newer one is already present.
    /// Returns whether the frame was stored.
    pub fn publish(&self, frame: Arc<RenderedFrame>) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if latest.as_ref().is_some_and(|cur| cur.id > frame.id) {
            return false;
        }
        *latest = Some(frame);
        true
    }

    pub fn latest(&self) -> Option<Arc<RenderedFrame>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

struct Job {
    id: u64,
    request: RenderRequest,
}

struct Shared {
    cancel: RenderCancel,
    latest_id: AtomicU64,
    slot: FrameSlot,
    sink: Arc<dyn FrameSink>,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// A single background render thread.
///
/// Submitting a request cancels whatever is in flight and queues the new
/// one; queued requests are coalesced so only the newest is rendered.
/// Frames are handed to the [`FrameSink`] only while their id is still the
/// newest submitted one.
pub struct RenderWorker {
    tx: Option<mpsc::Sender<Job>>,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    pub fn spawn(sink: Arc<dyn FrameSink>) -> crate::Result<Self> {
        let shared = Arc::new(Shared {
            cancel: RenderCancel::new(),
            latest_id: AtomicU64::new(0),
            slot: FrameSlot::new(),
            sink,
        });
        let (tx, rx) = mpsc::channel();

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("render-worker".into())
            .spawn(move || worker_loop(&worker_shared, &rx))
            .map_err(RenderError::Spawn)?;

        info!("Render worker started");
        Ok(Self {
            tx: Some(tx),
            shared,
            handle: Some(handle),
        })
    }

    /// Queue `request`, superseding any render in progress.
    /// Returns the id assigned to the request.
    pub fn submit(&self, request: RenderRequest) -> crate::Result<u64> {
        let tx = self.tx.as_ref().ok_or(RenderError::WorkerStopped)?;
        let id = self.shared.latest_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.cancel.cancel();
        debug!(id, fractal = ?request.fractal, color = ?request.color, "Render requested");
        tx.send(Job { id, request })
            .map_err(|_| RenderError::WorkerStopped)?;
        Ok(id)
    }

    /// Abandon the render in progress without queueing a replacement.
    pub fn cancel(&self) {
        self.shared.latest_id.fetch_add(1, Ordering::SeqCst);
        self.shared.cancel.cancel();
    }

    /// Id of the newest submitted request.
    pub fn latest_id(&self) -> u64 {
        self.shared.latest_id.load(Ordering::SeqCst)
    }

    /// The last frame handed to the sink.
    pub fn latest_frame(&self) -> Option<Arc<RenderedFrame>> {
        self.shared.slot.latest()
    }

    /// `(rows_done, rows_total)` of the current render.
    pub fn progress(&self) -> (usize, usize) {
        self.shared.cancel.progress()
    }

    /// Stop the thread and wait for it to exit.
    pub fn shutdown(&mut self) {
        self.tx.take();
        self.shared.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Render worker panicked");
            }
            info!("Render worker stopped");
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drain_latest(initial: Job, rx: &mpsc::Receiver<Job>) -> Job {
    let mut job = initial;
    while let Ok(newer) = rx.try_recv() {
        job = newer;
    }
    job
}

fn worker_loop(shared: &Shared, rx: &mpsc::Receiver<Job>) {
    while let Ok(initial) = rx.recv() {
        let job = drain_latest(initial, rx);
        if job.id != shared.latest_id.load(Ordering::SeqCst) {
            continue;
        }

        let frame = match recolor_previous(shared, &job.request) {
            Some(frame) => {
                debug!(id = job.id, "Re-colored previous frame");
                Ok(frame)
            }
            None => {
                let evaluator = job.request.fractal.evaluator(job.request.julia_c);
                let scheme = job.request.color.scheme();
                render_frame(
                    &evaluator,
                    &scheme,
                    &job.request.viewport,
                    &job.request.budget,
                    &shared.cancel,
                )
            }
        };

        match frame {
            Ok(frame) => publish(shared, job, frame),
            Err(RenderError::Cancelled) => debug!(id = job.id, "Render superseded"),
            Err(e) => warn!(id = job.id, "Render failed: {e}"),
        }
    }
}

fn recolor_previous(shared: &Shared, request: &RenderRequest) -> Option<Frame> {
    let previous = shared.slot.latest()?;
    if !previous.request.same_geometry(request) {
        return None;
    }
    Some(previous.frame.recolored(&request.color.scheme()))
}

fn publish(shared: &Shared, job: Job, frame: Frame) {
    if job.id != shared.latest_id.load(Ordering::SeqCst) {
        debug!(id = job.id, "Discarding stale frame");
        return;
    }
    let rendered = Arc::new(RenderedFrame {
        id: job.id,
        request: job.request,
        frame,
    });
    if shared.slot.publish(Arc::clone(&rendered)) {
        shared.sink.present(rendered);
    }
}

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use fractour_core::PlaneBounds;

use crate::config::TourTiming;
use crate::error::SessionError;

// ---------------------------------------------------------------------------
// Keyframes
// ---------------------------------------------------------------------------

/// Opaque keyframe identifier, unique within one [`KeyframeList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyframeId(u64);

impl KeyframeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named snapshot of the plane bounds used as a tour anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct TourKeyframe {
    pub id: KeyframeId,
    pub name: String,
    pub bounds: PlaneBounds,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

/// Keyframes in insertion order, which is also playback order.
#[derive(Debug, Clone, Default)]
pub struct KeyframeList {
    entries: Vec<TourKeyframe>,
    next_id: u64,
}

impl KeyframeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name given to the next keyframe when the caller supplies none.
    pub fn next_default_name(&self) -> String {
        format!("Frame {}", self.entries.len() + 1)
    }

    pub fn add(&mut self, name: impl Into<String>, bounds: PlaneBounds) -> KeyframeId {
        self.next_id += 1;
        let id = KeyframeId(self.next_id);
        let name = name.into();
        debug!(%id, %name, "Keyframe added");
        self.entries.push(TourKeyframe {
            id,
            name,
            bounds,
            created_at: now_millis(),
        });
        id
    }

    pub fn remove(&mut self, id: KeyframeId) -> Option<TourKeyframe> {
        let index = self.entries.iter().position(|k| k.id == id)?;
        debug!(%id, "Keyframe removed");
        Some(self.entries.remove(index))
    }

    /// Replace the keyframe with a renamed copy. Returns `false` if `id`
    /// is unknown.
    pub fn rename(&mut self, id: KeyframeId, name: impl Into<String>) -> bool {
        let Some(slot) = self.entries.iter_mut().find(|k| k.id == id) else {
            return false;
        };
        *slot = TourKeyframe {
            name: name.into(),
            ..slot.clone()
        };
        true
    }

    pub fn get(&self, id: KeyframeId) -> Option<&TourKeyframe> {
        self.entries.iter().find(|k| k.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TourKeyframe> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[TourKeyframe] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bounds of every keyframe, in playback order.
    pub fn bounds(&self) -> Vec<PlaneBounds> {
        self.entries.iter().map(|k| k.bounds).collect()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ---------------------------------------------------------------------------
// Interpolation
// ---------------------------------------------------------------------------

/// Cubic ease-in-out on `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Bounds shown at tick `frame` of a tour over `keyframes`.
///
/// Ticks at or past the final segment hold the last keyframe, as does
/// every tick when `seconds_per_keyframe` is not finite and positive.
pub fn frame_bounds(
    keyframes: &[PlaneBounds],
    frame: u64,
    timing: &TourTiming,
) -> Option<PlaneBounds> {
    let last = keyframes.last()?;
    let spk = timing.seconds_per_keyframe;
    if !(spk.is_finite() && spk > 0.0) {
        return Some(*last);
    }
    let time = frame as f64 / timing.fps.max(1) as f64;
    // `as usize` saturates, so the comparison below never overflows.
    let index = (time / spk).floor() as usize;
    if index >= keyframes.len() - 1 {
        return Some(*last);
    }
    let segment_progress = (time % spk) / spk;
    Some(PlaneBounds::lerp(
        &keyframes[index],
        &keyframes[index + 1],
        ease_in_out_cubic(segment_progress),
    ))
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Progress snapshot for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TourState {
    pub is_playing: bool,
    pub current_frame: u64,
    pub total_frames: u64,
    /// `current_frame / total_frames`, in `[0, 1]`.
    pub progress: f32,
}

/// Where tour ticks land.
///
/// Called on the tour thread; implementations write the bounds into the
/// shared viewport and request a render without waiting for it.
pub trait TourTarget: Send + Sync {
    fn show(&self, bounds: PlaneBounds);
}

impl<F> TourTarget for F
where
    F: Fn(PlaneBounds) + Send + Sync,
{
    fn show(&self, bounds: PlaneBounds) {
        self(bounds)
    }
}

#[derive(Debug, Default)]
struct Progress {
    playing: AtomicBool,
    current_frame: AtomicU64,
    total_frames: AtomicU64,
}

struct Playback {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Runs at most one tour at a time on a background thread.
#[derive(Default)]
pub struct TourPlayer {
    progress: Arc<Progress>,
    playback: Option<Playback>,
}

impl TourPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play a tour through `keyframes`, replacing any tour in progress.
    ///
    /// Returns `Ok(false)` without touching the current playback when fewer
    /// than two keyframes are given.
    pub fn start(
        &mut self,
        keyframes: Vec<PlaneBounds>,
        timing: TourTiming,
        target: Arc<dyn TourTarget>,
    ) -> Result<bool, SessionError> {
        if keyframes.len() < 2 {
            debug!(keyframes = keyframes.len(), "Tour needs at least two keyframes");
            return Ok(false);
        }
        self.stop();

        let timing = timing.sanitized();
        let total_frames = timing.total_frames(keyframes.len());
        self.progress.current_frame.store(0, Ordering::SeqCst);
        self.progress.total_frames.store(total_frames, Ordering::SeqCst);
        self.progress.playing.store(true, Ordering::SeqCst);

        let (stop_tx, stop_rx) = mpsc::channel();
        let progress = Arc::clone(&self.progress);
        let keyframe_count = keyframes.len();
        let handle = thread::Builder::new()
            .name("tour-player".into())
            .spawn(move || play(&keyframes, timing, &progress, &stop_rx, target.as_ref()))
            .map_err(|e| {
                self.progress.playing.store(false, Ordering::SeqCst);
                SessionError::Spawn(e)
            })?;

        info!(keyframes = keyframe_count, total_frames, fps = timing.fps, "Tour started");
        self.playback = Some(Playback { stop_tx, handle });
        Ok(true)
    }

    /// Stop playback and wait for the tour thread to exit. Idempotent.
    ///
    /// Once this returns no further tick will be shown; the final snap to
    /// the last keyframe has already happened.
    pub fn stop(&mut self) {
        let Some(playback) = self.playback.take() else {
            return;
        };
        self.progress.playing.store(false, Ordering::SeqCst);
        let _ = playback.stop_tx.send(());
        if playback.handle.join().is_err() {
            warn!("Tour thread panicked");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.progress.playing.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> TourState {
        let current_frame = self.progress.current_frame.load(Ordering::SeqCst);
        let total_frames = self.progress.total_frames.load(Ordering::SeqCst);
        let progress = if total_frames == 0 {
            0.0
        } else {
            current_frame as f32 / total_frames as f32
        };
        TourState {
            is_playing: self.is_playing(),
            current_frame,
            total_frames,
            progress,
        }
    }
}

impl Drop for TourPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn play(
    keyframes: &[PlaneBounds],
    timing: TourTiming,
    progress: &Progress,
    stop_rx: &mpsc::Receiver<()>,
    target: &dyn TourTarget,
) {
    let total_frames = timing.total_frames(keyframes.len());
    let interval = timing.frame_interval();
    let mut deadline = Instant::now();
    let mut completed = true;

    for frame in 0..total_frames {
        if !progress.playing.load(Ordering::SeqCst) {
            completed = false;
            break;
        }
        if let Some(bounds) = frame_bounds(keyframes, frame, &timing) {
            target.show(bounds);
        }
        progress.current_frame.store(frame, Ordering::SeqCst);

        deadline += interval;
        let wait = deadline.saturating_duration_since(Instant::now());
        match stop_rx.recv_timeout(wait) {
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                completed = false;
                break;
            }
        }
    }

    if let Some(last) = keyframes.last() {
        target.show(*last);
    }
    if completed {
        progress.current_frame.store(total_frames, Ordering::SeqCst);
    }
    progress.playing.store(false, Ordering::SeqCst);
    if completed {
        info!(total_frames, "Tour finished");
    } else {
        info!(frame = progress.current_frame.load(Ordering::SeqCst), "Tour stopped");
    }
}

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use fractour_core::{Complex, FractalKind, IterationBudget, PlaneBounds, Viewport};
use fractour_render::{ColorKind, FrameSink, RenderRequest, RenderWorker, RenderedFrame};

use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::persistence::{self, SavedView};
use crate::tour::{KeyframeId, KeyframeList, TourKeyframe, TourPlayer, TourState, TourTarget};
use crate::undo::UndoStack;

/// Name of the keyframe every session starts with.
pub const INITIAL_KEYFRAME_NAME: &str = "Initial view";

/// Everything a render depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub viewport: Viewport,
    pub fractal: FractalKind,
    pub color: ColorKind,
    pub julia_c: Complex,
}

/// State shared with the tour thread.
///
/// Every write to the view goes through [`Shared::update`], which submits
/// the render request under the same lock so request order matches write
/// order.
struct Shared {
    view: Mutex<ViewState>,
    worker: RenderWorker,
    budget: IterationBudget,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> ViewState {
        *self.lock()
    }

    fn update(&self, apply: impl FnOnce(&mut ViewState)) -> ViewState {
        let mut view = self.lock();
        apply(&mut view);
        self.submit(&view);
        *view
    }

    fn submit(&self, view: &ViewState) {
        let request = RenderRequest {
            viewport: view.viewport,
            fractal: view.fractal,
            julia_c: view.julia_c,
            color: view.color,
            budget: self.budget,
        };
        if let Err(e) = self.worker.submit(request) {
            warn!("Render request dropped: {e}");
        }
    }
}

impl TourTarget for Shared {
    fn show(&self, bounds: PlaneBounds) {
        self.update(|view| view.viewport.set_bounds(bounds));
    }
}

/// The single controller a host UI drives.
///
/// Owns the viewport, undo history, keyframes and tour playback, and keeps
/// a background render worker fed. Finished frames go to the sink passed
/// to [`Session::new`].
pub struct Session {
    shared: Arc<Shared>,
    undo: UndoStack,
    keyframes: KeyframeList,
    tour: TourPlayer,
    config: EngineConfig,
    panning: bool,
}

impl Session {
    /// Start a session on a `width × height` pixel grid and request the
    /// first frame.
    pub fn new(
        config: EngineConfig,
        width: u32,
        height: u32,
        sink: Arc<dyn FrameSink>,
    ) -> Result<Self, SessionError> {
        let config = config.sanitized();
        let viewport = Viewport::fitted(config.initial_bounds, width, height)?;
        let worker = RenderWorker::spawn(sink)?;
        let shared = Arc::new(Shared {
            view: Mutex::new(ViewState {
                viewport,
                fractal: FractalKind::default(),
                color: ColorKind::default(),
                julia_c: config.julia_c,
            }),
            worker,
            budget: config.budget,
        });

        let mut keyframes = KeyframeList::new();
        keyframes.add(INITIAL_KEYFRAME_NAME, viewport.bounds);

        info!(width, height, "Session started");
        let session = Self {
            shared,
            undo: UndoStack::new(config.undo_capacity),
            keyframes,
            tour: TourPlayer::new(),
            config,
            panning: false,
        };
        session.request_render();
        Ok(session)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn view(&self) -> ViewState {
        self.shared.snapshot()
    }

    pub fn viewport(&self) -> Viewport {
        self.view().viewport
    }

    /// Iteration budget the current viewport renders with.
    pub fn max_iterations(&self) -> u32 {
        self.config.budget.for_viewport(&self.viewport())
    }

    // -- rendering ----------------------------------------------------------

    /// Queue a render of the current view.
    pub fn request_render(&self) {
        let view = self.shared.lock();
        self.shared.submit(&view);
    }

    /// The most recently presented frame.
    pub fn latest_frame(&self) -> Option<Arc<RenderedFrame>> {
        self.shared.worker.latest_frame()
    }

    /// `(rows_done, rows_total)` of the render in progress.
    pub fn render_progress(&self) -> (usize, usize) {
        self.shared.worker.progress()
    }

    // -- gestures -----------------------------------------------------------

    /// Apply new pixel dimensions, widening the short plane axis.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SessionError> {
        let mut result = Ok(());
        self.shared.update(|view| result = view.viewport.resize(width, height));
        result?;
        debug!(width, height, "Viewport resized");
        Ok(())
    }

    /// Zoom into a rectangle dragged on screen.
    ///
    /// Refused while a tour plays or when the drag is too small. On success
    /// the previous viewport goes onto the undo stack.
    pub fn zoom_to_selection(&mut self, origin: (f64, f64), size: (f64, f64)) -> bool {
        if self.tour.is_playing() {
            debug!("Selection ignored while the tour plays");
            return false;
        }
        let mut view = self.shared.lock();
        let before = view.viewport;
        let mut zoomed = before;
        if !zoomed.zoom_to_selection(origin, size) {
            return false;
        }
        view.viewport = zoomed;
        self.shared.submit(&view);
        drop(view);

        self.undo.save(before);
        debug!(bounds = ?zoomed.bounds, "Zoomed to selection");
        true
    }

    /// Start a pan gesture. Takes over from a playing tour and records the
    /// starting viewport for undo.
    pub fn begin_pan(&mut self) {
        self.tour.stop();
        self.undo.save(self.viewport());
        self.panning = true;
    }

    /// Move the view by a pixel drag delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !self.panning {
            self.begin_pan();
        }
        self.shared.update(|view| view.viewport.pan_pixels(dx, dy));
    }

    pub fn end_pan(&mut self) {
        self.panning = false;
    }

    // -- undo ---------------------------------------------------------------

    /// Restore the previous viewport. Returns `false` when the history is
    /// empty.
    pub fn undo(&mut self) -> bool {
        self.tour.stop();
        let Some(previous) = self.undo.undo() else {
            return false;
        };
        self.shared.update(|view| view.viewport.set_bounds(previous.bounds));
        debug!(remaining = self.undo.len(), "Undo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    // -- selection ----------------------------------------------------------

    pub fn set_fractal(&mut self, fractal: FractalKind) {
        self.shared.update(|view| view.fractal = fractal);
        info!(fractal = fractal.tag(), "Fractal changed");
    }

    /// Change the color scheme. The worker re-colors the last frame instead
    /// of iterating again when nothing else changed.
    pub fn set_color(&mut self, color: ColorKind) {
        self.shared.update(|view| view.color = color);
        info!(color = color.tag(), "Color scheme changed");
    }

    pub fn set_julia_c(&mut self, c: Complex) {
        self.shared.update(|view| view.julia_c = c);
    }

    // -- keyframes ----------------------------------------------------------

    pub fn keyframes(&self) -> &[TourKeyframe] {
        self.keyframes.as_slice()
    }

    /// Capture the current view. `None` picks the next `"Frame N"` name.
    pub fn add_current_view_as_keyframe(
        &mut self,
        name: Option<&str>,
    ) -> Result<KeyframeId, SessionError> {
        self.ensure_tour_idle()?;
        let name = match name {
            Some(name) => name.to_owned(),
            None => self.keyframes.next_default_name(),
        };
        Ok(self.keyframes.add(name, self.viewport().bounds))
    }

    pub fn remove_keyframe(&mut self, id: KeyframeId) -> Result<TourKeyframe, SessionError> {
        self.ensure_tour_idle()?;
        self.keyframes
            .remove(id)
            .ok_or(SessionError::UnknownKeyframe(id.get()))
    }

    pub fn rename_keyframe(&mut self, id: KeyframeId, name: &str) -> Result<(), SessionError> {
        self.ensure_tour_idle()?;
        if self.keyframes.rename(id, name) {
            Ok(())
        } else {
            Err(SessionError::UnknownKeyframe(id.get()))
        }
    }

    /// Jump to a keyframe's bounds, stopping any tour. Bounds captured at
    /// another aspect ratio are refitted to the current pixel grid.
    pub fn go_to_keyframe(&mut self, id: KeyframeId) -> Result<(), SessionError> {
        let bounds = self
            .keyframes
            .get(id)
            .map(|k| k.bounds)
            .ok_or(SessionError::UnknownKeyframe(id.get()))?;
        self.tour.stop();
        self.undo.save(self.viewport());
        self.shared.update(|view| view.viewport.set_bounds(bounds));
        Ok(())
    }

    fn ensure_tour_idle(&self) -> Result<(), SessionError> {
        if self.tour.is_playing() {
            return Err(SessionError::TourPlaying);
        }
        Ok(())
    }

    // -- tour ---------------------------------------------------------------

    /// Play the keyframes in order. Returns `Ok(false)` when there are
    /// fewer than two.
    pub fn start_tour(&mut self) -> Result<bool, SessionError> {
        let target: Arc<dyn TourTarget> = self.shared.clone();
        self.tour
            .start(self.keyframes.bounds(), self.config.tour, target)
    }

    /// Stop the tour; the view is left on the last keyframe. Idempotent.
    pub fn stop_tour(&mut self) {
        self.tour.stop();
    }

    pub fn tour_state(&self) -> TourState {
        self.tour.state()
    }

    // -- persistence --------------------------------------------------------

    pub fn save_view(&self, path: &Path) -> Result<(), SessionError> {
        let view = self.view();
        persistence::save(
            path,
            &SavedView::new(view.viewport.bounds, view.fractal, view.color),
        )
    }

    /// Load a saved view, fitting its bounds to the current pixel grid.
    pub fn load_view(&mut self, path: &Path) -> Result<(), SessionError> {
        let saved = persistence::load(path)?;
        self.tour.stop();
        let current = self.viewport();
        let viewport = Viewport::fitted(saved.bounds, current.width, current.height)?;
        self.undo.save(current);
        self.shared.update(|view| {
            view.viewport = viewport;
            view.fractal = saved.fractal;
            view.color = saved.color;
        });
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.tour.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_session(width: u32, height: u32) -> Session {
        let sink: Arc<dyn FrameSink> = Arc::new(|_frame: Arc<RenderedFrame>| {});
        Session::new(EngineConfig::default(), width, height, sink).unwrap()
    }

    #[test]
    fn fresh_session_has_initial_keyframe() {
        let session = quiet_session(300, 200);
        assert_eq!(session.keyframes().len(), 1);
        assert_eq!(session.keyframes()[0].name, INITIAL_KEYFRAME_NAME);
        assert_eq!(session.keyframes()[0].bounds, session.viewport().bounds);
        assert!(!session.can_undo());
        assert_eq!(session.max_iterations(), 200);
    }

    #[test]
    fn selection_zoom_pushes_undo() {
        let mut session = quiet_session(300, 200);
        let before = session.viewport();

        assert!(!session.zoom_to_selection((10.0, 10.0), (5.0, 50.0)));
        assert!(!session.can_undo());

        assert!(session.zoom_to_selection((100.0, 50.0), (60.0, 40.0)));
        assert!(session.viewport().bounds.width() < before.bounds.width());
        assert!(session.max_iterations() > 200);

        assert!(session.undo());
        assert_eq!(session.viewport(), before);
        assert!(!session.undo());
    }

    #[test]
    fn pan_records_one_undo_entry_per_gesture() {
        let mut session = quiet_session(300, 200);
        let before = session.viewport();

        session.begin_pan();
        session.pan(10.0, 0.0);
        session.pan(5.0, -3.0);
        session.end_pan();
        assert_ne!(session.viewport(), before);

        assert!(session.undo());
        assert_eq!(session.viewport(), before);
        assert!(!session.can_undo());
    }

    #[test]
    fn undo_refits_after_resize() {
        let mut session = quiet_session(300, 200);
        assert!(session.zoom_to_selection((0.0, 0.0), (150.0, 100.0)));
        session.resize(200, 200).unwrap();
        assert!(session.undo());
        let vp = session.viewport();
        assert_eq!((vp.width, vp.height), (200, 200));
        assert!((vp.plane_aspect_ratio() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn keyframe_edits() {
        let mut session = quiet_session(300, 200);
        let id = session.add_current_view_as_keyframe(None).unwrap();
        assert_eq!(session.keyframes()[1].name, "Frame 2");

        session.rename_keyframe(id, "Seahorse").unwrap();
        assert_eq!(session.keyframes()[1].name, "Seahorse");

        session.remove_keyframe(id).unwrap();
        assert!(matches!(
            session.remove_keyframe(id),
            Err(SessionError::UnknownKeyframe(_))
        ));
    }

    #[test]
    fn go_to_keyframe_restores_bounds() {
        let mut session = quiet_session(300, 200);
        let home = session.keyframes()[0].id;
        let initial = session.viewport().bounds;
        session.pan(40.0, 40.0);
        session.end_pan();
        assert_ne!(session.viewport().bounds, initial);

        session.go_to_keyframe(home).unwrap();
        assert_eq!(session.viewport().bounds, initial);
    }

    #[test]
    fn go_to_keyframe_refits_after_resize() {
        let mut session = quiet_session(300, 200);
        let home = session.keyframes()[0].id;
        let captured = session.keyframes()[0].bounds;

        session.resize(200, 200).unwrap();
        session.go_to_keyframe(home).unwrap();
        let vp = session.viewport();
        assert!((vp.plane_aspect_ratio() - vp.aspect_ratio()).abs() < 1e-9);
        assert!((vp.bounds.width() - captured.width()).abs() < 1e-12);
        assert!(vp.bounds.height() > captured.height());

        session.resize(300, 200).unwrap();
        session.go_to_keyframe(home).unwrap();
        assert_eq!(session.viewport().bounds, captured);
    }

    #[test]
    fn config_built_in_code_is_sanitized() {
        let mut config = EngineConfig {
            budget: IterationBudget {
                base: 0,
                zoom_factor: 50,
            },
            undo_capacity: 0,
            ..EngineConfig::default()
        };
        config.tour.seconds_per_keyframe = 0.0;
        let sink: Arc<dyn FrameSink> = Arc::new(|_frame: Arc<RenderedFrame>| {});
        let session = Session::new(config, 300, 200, sink).unwrap();

        assert_eq!(session.config().budget, IterationBudget::default());
        assert_eq!(session.config().undo_capacity, 100);
        assert_eq!(session.config().tour.seconds_per_keyframe, 3.0);
        assert_eq!(session.max_iterations(), 200);
    }

    #[test]
    fn resize_rejects_zero_dimensions() {
        let mut session = quiet_session(300, 200);
        assert!(matches!(session.resize(0, 10), Err(SessionError::Core(_))));
        assert_eq!(session.viewport().width, 300);
    }
}

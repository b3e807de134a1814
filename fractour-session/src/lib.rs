pub mod config;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod session;
pub mod tour;
pub mod undo;

pub use config::{EngineConfig, TourTiming};
pub use error::SessionError;
pub use persistence::SavedView;
pub use session::{Session, ViewState, INITIAL_KEYFRAME_NAME};
pub use tour::{
    ease_in_out_cubic, frame_bounds, KeyframeId, KeyframeList, TourKeyframe, TourPlayer,
    TourState, TourTarget,
};
pub use undo::UndoStack;

/// Convenience result type for the session crate.
pub type Result<T> = std::result::Result<T, SessionError>;

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the session controller and the saved-view codec.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed saved view {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported fractal type {0:?}")]
    UnsupportedFractal(String),

    #[error("unsupported color type {0:?}")]
    UnsupportedColor(String),

    #[error("view bounds must be finite")]
    NonFiniteBounds,

    /// Keyframe edits are refused while a tour is playing.
    #[error("a tour is playing")]
    TourPlaying,

    #[error("no keyframe with id {0}")]
    UnknownKeyframe(u64),

    #[error("failed to spawn tour thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Core(#[from] fractour_core::CoreError),

    #[error(transparent)]
    Render(#[from] fractour_render::RenderError),
}

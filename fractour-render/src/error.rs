use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A newer request superseded this render. Expected control flow, not
    /// something to show the user.
    #[error("render cancelled")]
    Cancelled,

    #[error("render worker is not running")]
    WorkerStopped,

    #[error("failed to spawn render worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Core(#[from] fractour_core::CoreError),
}

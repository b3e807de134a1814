use thiserror::Error;

/// Errors originating from the core viewport and evaluator layer.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },

    #[error("invalid iteration budget: base must be >= 1, got {0}")]
    InvalidBudget(u32),
}

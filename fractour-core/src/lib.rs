pub mod budget;
pub mod complex;
pub mod convert;
pub mod error;
pub mod fractal;
pub mod julia;
pub mod mandelbrot;
pub mod newton;
pub mod viewport;

// Re-export primary types for convenience.
pub use budget::{IterationBudget, REFERENCE_WIDTH};
pub use complex::Complex;
pub use error::CoreError;
pub use fractal::{Detail, Evaluator, Fractal, FractalKind, IterationResult};
pub use julia::Julia;
pub use mandelbrot::Mandelbrot;
pub use newton::Newton;
pub use viewport::{PlaneBounds, Viewport, ASPECT_TOLERANCE};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

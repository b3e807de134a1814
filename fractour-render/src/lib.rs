pub mod buffer;
pub mod color;
pub mod error;
pub mod iteration_buffer;
pub mod renderer;
pub mod worker;

pub use buffer::RenderBuffer;
pub use color::{
    colorize, ColorKind, ColorScheme, Colorizer, Gradient, NewtonShading, Rainbow, INTERIOR,
};
pub use error::RenderError;
pub use iteration_buffer::IterationBuffer;
pub use renderer::{render, render_frame, Frame, RenderCancel, RenderResult};
pub use worker::{FrameSink, FrameSlot, RenderRequest, RenderWorker, RenderedFrame};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;

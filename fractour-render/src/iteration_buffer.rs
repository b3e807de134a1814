use fractour_core::IterationResult;

/// Per-pixel [`IterationResult`] data for a full frame.
///
/// This is the raw output of the renderer before coloring. Keeping it
/// separate from colored pixels lets a color-scheme change re-color the
/// last frame without re-iterating.
#[derive(Debug, Clone)]
pub struct IterationBuffer {
    pub width: u32,
    pub height: u32,
    /// The iteration budget every result in `data` was computed against.
    pub max_iterations: u32,
    /// Row-major, `width * height` entries.
    pub data: Vec<IterationResult>,
}

impl IterationBuffer {
    pub fn new(width: u32, height: u32, max_iterations: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            max_iterations,
            data: vec![IterationResult::bounded(max_iterations); size],
        }
    }

    /// Result at pixel `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> IterationResult {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Mutable view of row `y`.
    pub fn row_mut(&mut self, y: u32) -> &mut [IterationResult] {
        let w = self.width as usize;
        let start = y as usize * w;
        &mut self.data[start..start + w]
    }
}

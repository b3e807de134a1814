use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::viewport::Viewport;

/// Plane width of the unzoomed view; zoom depth is measured against it.
pub const REFERENCE_WIDTH: f64 = 3.0;

/// Derives the maximum iteration count from the current zoom depth.
///
/// `budget = max(base, base + ⌊zoom_factor · max(0, log₂(REFERENCE_WIDTH / width))⌋)`
///
/// Every halving of the visible plane width adds `zoom_factor` iterations.
/// Views at or wider than [`REFERENCE_WIDTH`] get exactly `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationBudget {
    #[serde(default = "default_base")]
    pub base: u32,
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: u32,
}

fn default_base() -> u32 {
    IterationBudget::DEFAULT_BASE
}

fn default_zoom_factor() -> u32 {
    IterationBudget::DEFAULT_ZOOM_FACTOR
}

impl IterationBudget {
    pub const DEFAULT_BASE: u32 = 200;
    pub const DEFAULT_ZOOM_FACTOR: u32 = 50;

    pub fn new(base: u32, zoom_factor: u32) -> crate::Result<Self> {
        if base < 1 {
            return Err(CoreError::InvalidBudget(base));
        }
        Ok(Self { base, zoom_factor })
    }

    /// Iteration budget for a plane of the given width.
    pub fn for_width(&self, current_width: f64) -> u32 {
        let zoom_level = (REFERENCE_WIDTH / current_width).log2().max(0.0);
        // `as u32` saturates, so absurd zoom depths clamp instead of wrapping.
        let extra = (self.zoom_factor as f64 * zoom_level).floor() as u32;
        self.base.saturating_add(extra).max(self.base)
    }

    /// Iteration budget for a viewport. Computed once per render.
    pub fn for_viewport(&self, viewport: &Viewport) -> u32 {
        self.for_width(viewport.bounds.width())
    }
}

impl Default for IterationBudget {
    fn default() -> Self {
        Self {
            base: Self::DEFAULT_BASE,
            zoom_factor: Self::DEFAULT_ZOOM_FACTOR,
        }
    }
}

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::complex::Complex;
use crate::convert;
use crate::error::CoreError;

/// Smallest selection side (in pixels) accepted by [`Viewport::zoom_to_selection`].
pub const MIN_SELECTION_PX: f64 = 10.0;

/// Relative plane/pixel aspect mismatch [`Viewport::set_bounds`] lets through
/// unchanged.
pub const ASPECT_TOLERANCE: f64 = 1e-6;

/// Axis-aligned rectangle on the complex plane.
///
/// Serialized with the `xMin`/`xMax`/`yMin`/`yMax` field names used by the
/// saved-view record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PlaneBounds {
    /// The unzoomed view the application opens on.
    pub const INITIAL: Self = Self::new(-2.0, 1.0, -1.0, 1.0);

    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Complex {
        Complex::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Check that all four bounds are finite and strictly ordered.
    pub fn validate(&self) -> crate::Result<()> {
        let all_finite = [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(CoreError::InvalidViewport {
                reason: format!("bounds must be finite, got {self:?}"),
            });
        }
        if self.x_max <= self.x_min || self.y_max <= self.y_min {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "bounds must satisfy x_min < x_max and y_min < y_max, got \
                     x=[{}, {}] y=[{}, {}]",
                    self.x_min, self.x_max, self.y_min, self.y_max
                ),
            });
        }
        Ok(())
    }

    /// Linear interpolation of each bound independently.
    ///
    /// `t == 0.0` returns `from` exactly; `t == 1.0` is only approximately `to`.
    pub fn lerp(from: &Self, to: &Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Self {
            x_min: mix(from.x_min, to.x_min),
            x_max: mix(from.x_max, to.x_max),
            y_min: mix(from.y_min, to.y_min),
            y_max: mix(from.y_max, to.y_max),
        }
    }
}

impl Default for PlaneBounds {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// A rectangular window into the complex plane plus the pixel grid it is
/// rendered onto.
///
/// Invariants: `x_max > x_min`, `y_max > y_min`, `width, height > 0`.
/// After [`resize`](Self::resize) the plane aspect matches the pixel aspect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: PlaneBounds,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Create a viewport with explicit bounds and pixel dimensions.
    ///
    /// The bounds are taken as-is; use [`fitted`](Self::fitted) to also
    /// correct the aspect ratio.
    pub fn new(bounds: PlaneBounds, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidViewport {
                reason: format!("dimensions must be > 0, got {width}×{height}"),
            });
        }
        bounds.validate()?;
        Ok(Self {
            bounds,
            width,
            height,
        })
    }

    /// Create a viewport and widen one plane axis so its aspect ratio
    /// matches the pixel grid.
    pub fn fitted(bounds: PlaneBounds, width: u32, height: u32) -> crate::Result<Self> {
        let mut vp = Self::new(bounds, width, height)?;
        vp.fit_aspect();
        Ok(vp)
    }

    /// The default unzoomed view, `[-2, 1] × [-1, 1]` fitted to the pixel grid.
    pub fn initial(width: u32, height: u32) -> crate::Result<Self> {
        Self::fitted(PlaneBounds::INITIAL, width, height)
    }

    /// Re-check the invariants after fields were edited directly.
    pub fn validate(&self) -> crate::Result<()> {
        Self::new(self.bounds, self.width, self.height).map(|_| ())
    }

    /// Pixel aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Plane aspect ratio ((x_max − x_min) / (y_max − y_min)).
    pub fn plane_aspect_ratio(&self) -> f64 {
        self.bounds.width() / self.bounds.height()
    }

    /// Map an integer pixel to the plane point at its top-left corner.
    #[inline]
    pub fn pixel_to_complex(&self, px: u32, py: u32) -> Complex {
        convert::screen_to_complex(px as f64, py as f64, self)
    }

    /// Change the pixel dimensions and re-fit the plane bounds.
    ///
    /// The plane axis that is too short for the new aspect ratio is widened
    /// around its centre; the other axis is untouched.
    pub fn resize(&mut self, width: u32, height: u32) -> crate::Result<()> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidViewport {
                reason: format!("dimensions must be > 0, got {width}×{height}"),
            });
        }
        self.width = width;
        self.height = height;
        self.fit_aspect();
        debug!(width, height, bounds = ?self.bounds, "Viewport refitted");
        Ok(())
    }

    /// Show `bounds` on the current pixel grid.
    ///
    /// Bounds whose aspect ratio already matches the grid are stored
    /// bit-for-bit; otherwise the short axis is widened as in
    /// [`resize`](Self::resize).
    pub fn set_bounds(&mut self, bounds: PlaneBounds) {
        self.bounds = bounds;
        let pixel_aspect = self.aspect_ratio();
        let mismatch = (self.plane_aspect_ratio() - pixel_aspect).abs() / pixel_aspect;
        if mismatch > ASPECT_TOLERANCE {
            self.fit_aspect();
            trace!(mismatch, bounds = ?self.bounds, "Bounds refitted to pixel grid");
        }
    }

    fn fit_aspect(&mut self) {
        let pixel_aspect = self.aspect_ratio();
        let b = &mut self.bounds;
        if pixel_aspect > b.width() / b.height() {
            let center_x = (b.x_min + b.x_max) / 2.0;
            let half_width = b.height() * pixel_aspect / 2.0;
            b.x_min = center_x - half_width;
            b.x_max = center_x + half_width;
        } else {
            let center_y = (b.y_min + b.y_max) / 2.0;
            let half_height = b.width() / pixel_aspect / 2.0;
            b.y_min = center_y - half_height;
            b.y_max = center_y + half_height;
        }
    }

    /// Zoom into a rectangle dragged on screen.
    ///
    /// `origin` is where the drag started and `size` the accumulated drag
    /// offset (either component may be negative). The rectangle is grown to
    /// the viewport's aspect ratio (the longer side wins) before it replaces
    /// the bounds. Returns `false` without changing anything when either side
    /// of the drag is not larger than [`MIN_SELECTION_PX`].
    pub fn zoom_to_selection(&mut self, origin: (f64, f64), size: (f64, f64)) -> bool {
        let (mut sel_w, mut sel_h) = (size.0.abs(), size.1.abs());
        if sel_w <= MIN_SELECTION_PX || sel_h <= MIN_SELECTION_PX {
            trace!(sel_w, sel_h, "Selection too small to zoom");
            return false;
        }
        let left = origin.0.min(origin.0 + size.0);
        let top = origin.1.min(origin.1 + size.1);

        let aspect = self.aspect_ratio();
        if sel_w / sel_h > aspect {
            sel_h = sel_w / aspect;
        } else {
            sel_w = sel_h * aspect;
        }

        let selected = PlaneBounds {
            x_min: convert::screen_to_complex_x(left, self),
            x_max: convert::screen_to_complex_x(left + sel_w, self),
            y_min: convert::screen_to_complex_y(top + sel_h, self),
            y_max: convert::screen_to_complex_y(top, self),
        };
        if let Err(e) = selected.validate() {
            debug!("Selection rejected: {e}");
            return false;
        }
        self.bounds = selected;
        true
    }

    /// Shift the view by a pixel drag delta.
    ///
    /// Dragging right (`dx > 0`) moves the content right, so the window
    /// onto the plane moves left; dragging down moves it up.
    pub fn pan_pixels(&mut self, dx: f64, dy: f64) {
        let shift_x = dx * self.bounds.width() / self.width as f64;
        let shift_y = dy * self.bounds.height() / self.height as f64;
        self.bounds.x_min -= shift_x;
        self.bounds.x_max -= shift_x;
        self.bounds.y_min += shift_y;
        self.bounds.y_max += shift_y;
    }
}

//! Stateless mapping between pixel coordinates and the complex plane.
//!
//! Pixel row 0 is the top of the image while `y_max` is "up" on the plane,
//! so the vertical mapping is inverted. Every function assumes a validated
//! [`Viewport`] (non-zero pixel dimensions, non-degenerate bounds).

use crate::complex::Complex;
use crate::viewport::Viewport;

#[inline]
pub fn screen_to_complex_x(px: f64, viewport: &Viewport) -> f64 {
    let b = &viewport.bounds;
    b.x_min + px / viewport.width as f64 * (b.x_max - b.x_min)
}

#[inline]
pub fn screen_to_complex_y(py: f64, viewport: &Viewport) -> f64 {
    let b = &viewport.bounds;
    b.y_max - py / viewport.height as f64 * (b.y_max - b.y_min)
}

#[inline]
pub fn complex_to_screen_x(x: f64, viewport: &Viewport) -> f64 {
    let b = &viewport.bounds;
    (x - b.x_min) / (b.x_max - b.x_min) * viewport.width as f64
}

#[inline]
pub fn complex_to_screen_y(y: f64, viewport: &Viewport) -> f64 {
    let b = &viewport.bounds;
    (b.y_max - y) / (b.y_max - b.y_min) * viewport.height as f64
}

/// Map a (possibly fractional) pixel position to a point on the plane.
#[inline]
pub fn screen_to_complex(px: f64, py: f64, viewport: &Viewport) -> Complex {
    Complex::new(
        screen_to_complex_x(px, viewport),
        screen_to_complex_y(py, viewport),
    )
}

/// Inverse of [`screen_to_complex`].
#[inline]
pub fn complex_to_screen(point: Complex, viewport: &Viewport) -> (f64, f64) {
    (
        complex_to_screen_x(point.re, viewport),
        complex_to_screen_y(point.im, viewport),
    )
}

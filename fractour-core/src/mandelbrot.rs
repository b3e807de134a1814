use crate::complex::Complex;
use crate::fractal::{Fractal, IterationResult};

/// Bailout test `|z|² > 4`.
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// The Mandelbrot set: `z_{n+1} = z_n² + c`, starting from `z₀ = 0`,
/// where `c` is the point being evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mandelbrot;

/// Closed-form membership test for the main cardioid.
#[inline]
fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) <= 0.25 * im2
}

/// Closed-form membership test for the period-2 bulb.
#[inline]
fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

impl Fractal for Mandelbrot {
    fn iterate(&self, c: Complex, max_iterations: u32) -> IterationResult {
        if in_cardioid(c.re, c.im) || in_period2_bulb(c.re, c.im) {
            return IterationResult::bounded(max_iterations);
        }

        let mut z = Complex::ZERO;

        // Brent's cycle detection state.
        let mut old_z = z;
        let mut period: u32 = 0;
        let mut check: u32 = 3;

        for n in 1..=max_iterations {
            z = z.square() + c;

            let norm_sq = z.norm_sq();
            if norm_sq > ESCAPE_RADIUS_SQ {
                return IterationResult::escaped(n, norm_sq);
            }

            // Orbits rarely settle early; only probe every 4th step past 32.
            if n >= 32 && n & 3 == 0 {
                if (z.re - old_z.re).abs() < 1e-13 && (z.im - old_z.im).abs() < 1e-13 {
                    return IterationResult::bounded(max_iterations);
                }

                period += 1;
                if period > check {
                    old_z = z;
                    period = 0;
                    check = check.saturating_mul(2);
                }
            }
        }

        IterationResult::bounded(max_iterations)
    }
}

use crate::complex::Complex;
use crate::fractal::{Fractal, IterationResult};
use crate::mandelbrot::ESCAPE_RADIUS_SQ;

/// A Julia set: `z_{n+1} = z_n² + c` with a fixed `c`, starting from
/// `z₀ = point`.
#[derive(Debug, Clone, Copy)]
pub struct Julia {
    c: Complex,
}

impl Julia {
    /// A visually interesting default: `c = -0.7 + 0.27015i`.
    pub const DEFAULT_C: Complex = Complex::new(-0.7, 0.27015);

    pub fn new(c: Complex) -> Self {
        Self { c }
    }

    pub fn c(&self) -> Complex {
        self.c
    }
}

impl Default for Julia {
    fn default() -> Self {
        Self::new(Self::DEFAULT_C)
    }
}

impl Fractal for Julia {
    fn iterate(&self, point: Complex, max_iterations: u32) -> IterationResult {
        let mut z = point;

        let mut old_z = z;
        let mut period: u32 = 0;
        let mut check: u32 = 3;

        for n in 1..=max_iterations {
            z = z.square() + self.c;

            let norm_sq = z.norm_sq();
            if norm_sq > ESCAPE_RADIUS_SQ {
                return IterationResult::escaped(n, norm_sq);
            }

            // Brent's cycle detection.
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

        IterationResult::bounded(max_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_point_escapes_immediately() {
        let r = Julia::default().iterate(Complex::new(10.0, 0.0), 200);
        assert!(r.escaped);
        assert_eq!(r.count, 1);
    }

    #[test]
    fn c_zero_unit_disk_is_bounded() {
        // With c = 0 the map is z → z², so |z| < 1 never escapes.
        let j = Julia::new(Complex::ZERO);
        let r = j.iterate(Complex::new(0.3, -0.4), 500);
        assert_eq!(r, IterationResult::bounded(500));
    }

    #[test]
    fn c_zero_outside_unit_circle_escapes() {
        let j = Julia::new(Complex::ZERO);
        // 1.5 → 2.25 (|z|² = 5.06 > 4).
        let r = j.iterate(Complex::new(1.5, 0.0), 500);
        assert!(r.escaped);
        assert_eq!(r.count, 1);
    }

    #[test]
    fn julia_at_zero_seed_matches_mandelbrot_at_c() {
        // Starting Julia from z₀ = 0 reproduces the Mandelbrot orbit of c,
        // shifted by one step.
        use crate::mandelbrot::Mandelbrot;
        let c = Complex::new(0.5, 0.5);
        let m = Mandelbrot.iterate(c, 300);
        let j = Julia::new(c).iterate(Complex::ZERO, 300);
        assert!(m.escaped && j.escaped);
        assert_eq!(m.count, j.count);
    }
}

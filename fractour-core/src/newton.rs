use crate::complex::Complex;
use crate::fractal::{Detail, Fractal, IterationResult};

const SQRT3_2: f64 = 0.866_025_403_784_438_6;

/// Newton's method on `f(z) = z³ − 1`, starting from `z₀ = point`.
///
/// The orbit stops once a step moves less than `epsilon`; the result
/// records which cube root of unity it landed on.
#[derive(Debug, Clone, Copy)]
pub struct Newton {
    epsilon: f64,
}

impl Newton {
    /// The three roots of `z³ − 1`, in the order reported by [`Detail::Root`].
    pub const ROOTS: [Complex; 3] = [
        Complex::new(1.0, 0.0),
        Complex::new(-0.5, SQRT3_2),
        Complex::new(-0.5, -SQRT3_2),
    ];

    pub const DEFAULT_EPSILON: f64 = 1e-6;

    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Index of the root nearest to `z`.
    pub fn nearest_root(z: Complex) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, root) in Self::ROOTS.iter().enumerate() {
            let d = (z - *root).norm_sq();
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        best
    }
}

impl Default for Newton {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EPSILON)
    }
}

impl Fractal for Newton {
    fn iterate(&self, point: Complex, max_iterations: u32) -> IterationResult {
        let eps_sq = self.epsilon * self.epsilon;
        let mut z = point;

        for n in 1..=max_iterations {
            let z2 = z.square();
            let derivative = z2 * 3.0;
            // f'(z) = 0 only at the origin, where the step is undefined.
            if derivative.norm_sq() < f64::MIN_POSITIVE {
                break;
            }
            let f = z2 * z - Complex::ONE;
            let next = z - f / derivative;
            if !next.is_finite() {
                break;
            }

            if (next - z).norm_sq() < eps_sq {
                return IterationResult {
                    count: n,
                    escaped: true,
                    detail: Detail::Root(Self::nearest_root(next)),
                };
            }
            z = next;
        }

        IterationResult::bounded(max_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots_are_cube_roots_of_unity() {
        for root in Newton::ROOTS {
            let cube = root * root * root;
            assert!((cube - Complex::ONE).norm() < 1e-12, "{root}^3 = {cube}");
        }
    }

    #[test]
    fn seeds_near_each_root_converge_to_it() {
        let newton = Newton::default();
        for (i, root) in Newton::ROOTS.iter().enumerate() {
            let seed = *root + Complex::new(0.05, -0.03);
            let r = newton.iterate(seed, 50);
            assert!(r.escaped, "seed near root {i} did not converge");
            assert_eq!(r.root(), Some(i));
            assert!(r.count < 10, "took {} steps", r.count);
        }
    }

    #[test]
    fn generic_seed_converges_within_bounded_steps() {
        let seed = Complex::new(2.0, 1.5);
        let r = Newton::default().iterate(seed, 100);
        assert!(r.escaped);
        assert!(r.count <= 30);
        let idx = r.root().unwrap();

        // Follow the same orbit by hand, well past convergence.
        let mut z = seed;
        for _ in 0..r.count + 10 {
            z = z - (z * z * z - Complex::ONE) / (z * z * 3.0);
        }
        assert!(
            (z - Newton::ROOTS[idx]).norm() < 1e-6,
            "orbit settled on {z}, reported root {idx}"
        );
        assert_eq!(Newton::nearest_root(z), idx);
    }

    #[test]
    fn positive_real_axis_goes_to_one() {
        let r = Newton::default().iterate(Complex::new(5.0, 0.0), 100);
        assert_eq!(r.root(), Some(0));
    }

    #[test]
    fn origin_never_converges() {
        let r = Newton::default().iterate(Complex::ZERO, 64);
        assert_eq!(r, IterationResult::bounded(64));
    }

    #[test]
    fn nearest_root_classification() {
        assert_eq!(Newton::nearest_root(Complex::new(0.9, 0.1)), 0);
        assert_eq!(Newton::nearest_root(Complex::new(-0.4, 0.8)), 1);
        assert_eq!(Newton::nearest_root(Complex::new(-0.4, -0.8)), 2);
    }
}

use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::julia::Julia;
use crate::mandelbrot::Mandelbrot;
use crate::newton::Newton;

/// Algorithm-specific extra data attached to an [`IterationResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detail {
    None,

    /// `|z|²` at the moment an escape-time orbit left the bailout circle.
    /// The smooth iteration count is derived from it at coloring time.
    Escape { norm_sq: f64 },

    /// Index into the evaluator's root table that a Newton orbit converged to.
    Root(usize),
}

/// The outcome of iterating a single point.
///
/// `count` is in `[0, max_iterations]`. `escaped` is true when the orbit
/// terminated before the budget ran out: it left the bailout circle
/// (Mandelbrot, Julia) or converged on a root (Newton). Points that never
/// terminate report `count == max_iterations` and `escaped == false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationResult {
    pub count: u32,
    pub escaped: bool,
    pub detail: Detail,
}

impl IterationResult {
    /// A point that stayed bounded for the whole budget.
    #[inline]
    pub fn bounded(max_iterations: u32) -> Self {
        Self {
            count: max_iterations,
            escaped: false,
            detail: Detail::None,
        }
    }

    #[inline]
    pub fn escaped(count: u32, norm_sq: f64) -> Self {
        Self {
            count,
            escaped: true,
            detail: Detail::Escape { norm_sq },
        }
    }

    /// Root index for Newton results, `None` otherwise.
    #[inline]
    pub fn root(&self) -> Option<usize> {
        match self.detail {
            Detail::Root(i) => Some(i),
            _ => None,
        }
    }
}

/// Trait implemented by all fractal evaluators.
///
/// Implementations are pure: no interior mutability, no shared mutable
/// state, so one instance can be iterated from every render worker at once.
/// Renderers are generic over `F: Fractal` for static dispatch.
pub trait Fractal {
    /// Iterate `point` for at most `max_iterations` steps.
    fn iterate(&self, point: Complex, max_iterations: u32) -> IterationResult;
}

/// The selectable fractal families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FractalKind {
    #[default]
    Mandelbrot,
    Julia,
    Newton,
}

impl FractalKind {
    pub const ALL: [Self; 3] = [Self::Mandelbrot, Self::Julia, Self::Newton];

    /// The tag written to saved-view records.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Mandelbrot => "mandelbrot",
            Self::Julia => "julia",
            Self::Newton => "newton",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mandelbrot => "Mandelbrot",
            Self::Julia => "Julia",
            Self::Newton => "Newton",
        }
    }

    /// Build the evaluator for this kind. `julia_c` is only used by Julia.
    pub fn evaluator(self, julia_c: Complex) -> Evaluator {
        match self {
            Self::Mandelbrot => Evaluator::Mandelbrot(Mandelbrot),
            Self::Julia => Evaluator::Julia(Julia::new(julia_c)),
            Self::Newton => Evaluator::Newton(Newton::default()),
        }
    }
}

/// A concrete evaluator selected at configuration time.
///
/// Dispatch is a `match` over a closed set, which keeps the per-pixel call
/// inlinable in generic renderers.
#[derive(Debug, Clone)]
pub enum Evaluator {
    Mandelbrot(Mandelbrot),
    Julia(Julia),
    Newton(Newton),
}

impl Evaluator {
    pub fn kind(&self) -> FractalKind {
        match self {
            Self::Mandelbrot(_) => FractalKind::Mandelbrot,
            Self::Julia(_) => FractalKind::Julia,
            Self::Newton(_) => FractalKind::Newton,
        }
    }
}

impl Fractal for Evaluator {
    #[inline]
    fn iterate(&self, point: Complex, max_iterations: u32) -> IterationResult {
        match self {
            Self::Mandelbrot(f) => f.iterate(point, max_iterations),
            Self::Julia(f) => f.iterate(point, max_iterations),
            Self::Newton(f) => f.iterate(point, max_iterations),
        }
    }
}

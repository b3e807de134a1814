use fractour_core::{Detail, IterationResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buffer::RenderBuffer;
use crate::iteration_buffer::IterationBuffer;

const LUT_SIZE: usize = 256;

/// Color of points that never terminate.
pub const INTERIOR: [u8; 4] = [0, 0, 0, 255];

/// Maps one iteration result to an RGBA color.
///
/// Implementations are pure functions of their inputs; a single instance
/// is shared by every colorizing thread.
pub trait Colorizer {
    fn color(&self, result: IterationResult, max_iterations: u32) -> [u8; 4];
}

// ---------------------------------------------------------------------------
// Smooth coloring
// ---------------------------------------------------------------------------

/// Continuous iteration count `ν = n + 1 − log₂(ln|z_n|)`.
///
/// Falls back to the integer count for results without an escape radius.
fn smooth_count(result: &IterationResult) -> f64 {
    let n = result.count as f64;
    match result.detail {
        Detail::Escape { norm_sq } => {
            let log_zn = norm_sq.ln() * 0.5;
            if log_zn <= 0.0 {
                return n;
            }
            n + 1.0 - log_zn.ln() / std::f64::consts::LN_2
        }
        _ => n,
    }
}

/// Position of a terminated result on a `[0, 1]` gradient.
fn gradient_position(result: &IterationResult, max_iterations: u32) -> f64 {
    if max_iterations == 0 {
        return 0.0;
    }
    (smooth_count(result) / max_iterations as f64).clamp(0.0, 1.0)
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> [u8; 4] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = value * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b), 255]
}

// ---------------------------------------------------------------------------
// Rainbow
// ---------------------------------------------------------------------------

/// Sweeps the full hue circle across the iteration budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rainbow;

impl Colorizer for Rainbow {
    fn color(&self, result: IterationResult, max_iterations: u32) -> [u8; 4] {
        if !result.escaped {
            return INTERIOR;
        }
        let t = gradient_position(&result, max_iterations);
        hsv_to_rgb(t * 360.0, 0.8, 0.9)
    }
}

// ---------------------------------------------------------------------------
// Gradient (grayscale, ice)
// ---------------------------------------------------------------------------

/// A color gradient backed by a lookup table.
///
/// The budget-normalized position is scaled onto `LUT_SIZE` entries and the
/// final color is interpolated between adjacent entries.
#[derive(Debug, Clone)]
pub struct Gradient {
    pub name: &'static str,
    lut: Vec<[u8; 4]>,
}

impl Gradient {
    /// Build a gradient from `(position, rgb)` stops sorted by position.
    /// An empty stop list falls back to [`grayscale`](Self::grayscale).
    pub fn from_stops(name: &'static str, stops: &[(f64, [u8; 3])]) -> Self {
        if stops.is_empty() {
            return Self::grayscale();
        }
        Self {
            name,
            lut: gradient_lut(stops),
        }
    }

    pub fn grayscale() -> Self {
        Self::from_stops("Grayscale", &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])])
    }

    pub fn ice() -> Self {
        Self::from_stops(
            "Ice",
            &[
                (0.0, [0, 8, 40]),
                (0.25, [10, 60, 140]),
                (0.5, [60, 160, 220]),
                (0.75, [170, 230, 250]),
                (1.0, [255, 255, 255]),
            ],
        )
    }

    fn sample(&self, t: f64) -> [u8; 4] {
        let last = (self.lut.len() - 1) as f64;
        let idx = (t * last).clamp(0.0, last);
        let lo = idx.floor() as usize;
        let hi = (lo + 1).min(self.lut.len() - 1);
        lerp_color(self.lut[lo], self.lut[hi], idx - idx.floor())
    }
}

impl Colorizer for Gradient {
    fn color(&self, result: IterationResult, max_iterations: u32) -> [u8; 4] {
        if !result.escaped {
            return INTERIOR;
        }
        self.sample(gradient_position(&result, max_iterations))
    }
}

fn gradient_lut(stops: &[(f64, [u8; 3])]) -> Vec<[u8; 4]> {
    (0..LUT_SIZE)
        .map(|i| {
            let t = i as f64 / (LUT_SIZE - 1) as f64;
            let lo = stops.iter().rposition(|&(pos, _)| pos <= t).unwrap_or(0);
            let hi = (lo + 1).min(stops.len() - 1);
            let (lo_t, lo_c) = stops[lo];
            let (hi_t, hi_c) = stops[hi];
            let frac = if (hi_t - lo_t).abs() < 1e-10 {
                0.0
            } else {
                ((t - lo_t) / (hi_t - lo_t)).clamp(0.0, 1.0)
            };
            lerp_color(
                [lo_c[0], lo_c[1], lo_c[2], 255],
                [hi_c[0], hi_c[1], hi_c[2], 255],
                frac,
            )
        })
        .collect()
}

fn lerp_color(a: [u8; 4], b: [u8; 4], t: f64) -> [u8; 4] {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), 255]
}

// ---------------------------------------------------------------------------
// Newton root coloring
// ---------------------------------------------------------------------------

/// One hue per root, darkened by how many steps convergence took.
///
/// Fast-converging basins are bright and slow ones near basin boundaries
/// fall off toward black, which gives the pseudo-3D relief. Results without
/// a root index (escape-time fractals) are shaded in gray.
#[derive(Debug, Clone)]
pub struct NewtonShading {
    root_colors: Vec<[u8; 3]>,
}

impl NewtonShading {
    /// An empty color list falls back to the default palette.
    pub fn new(root_colors: Vec<[u8; 3]>) -> Self {
        if root_colors.is_empty() {
            return Self::default();
        }
        Self { root_colors }
    }

    fn shade(count: u32, max_iterations: u32) -> f64 {
        let scale = (max_iterations.max(1) as f64).ln_1p();
        (1.0 - (count as f64).ln_1p() / scale).clamp(0.15, 1.0)
    }
}

impl Default for NewtonShading {
    fn default() -> Self {
        Self {
            root_colors: vec![[230, 60, 50], [60, 200, 80], [50, 110, 230]],
        }
    }
}

impl Colorizer for NewtonShading {
    fn color(&self, result: IterationResult, max_iterations: u32) -> [u8; 4] {
        if !result.escaped {
            return INTERIOR;
        }
        let shade = Self::shade(result.count, max_iterations);
        let base = match result.root() {
            Some(i) => self.root_colors[i % self.root_colors.len()],
            None => [255, 255, 255],
        };
        let apply = |c: u8| (c as f64 * shade).round() as u8;
        [apply(base[0]), apply(base[1]), apply(base[2]), 255]
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The selectable color schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorKind {
    #[default]
    Rainbow,
    Grayscale,
    Ice,
    NewtonColor,
}

impl ColorKind {
    pub const ALL: [Self; 4] = [Self::Rainbow, Self::Grayscale, Self::Ice, Self::NewtonColor];

    /// The tag written to saved-view records.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Rainbow => "rainbow",
            Self::Grayscale => "grayscale",
            Self::Ice => "ice",
            Self::NewtonColor => "newtonColor",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Rainbow => "Rainbow",
            Self::Grayscale => "Grayscale",
            Self::Ice => "Ice",
            Self::NewtonColor => "Newton Color",
        }
    }

    pub fn scheme(self) -> ColorScheme {
        match self {
            Self::Rainbow => ColorScheme::Rainbow(Rainbow),
            Self::Grayscale => ColorScheme::Gradient(Gradient::grayscale()),
            Self::Ice => ColorScheme::Gradient(Gradient::ice()),
            Self::NewtonColor => ColorScheme::Newton(NewtonShading::default()),
        }
    }
}

/// A concrete colorizer selected at configuration time.
#[derive(Debug, Clone)]
pub enum ColorScheme {
    Rainbow(Rainbow),
    Gradient(Gradient),
    Newton(NewtonShading),
}

impl Colorizer for ColorScheme {
    #[inline]
    fn color(&self, result: IterationResult, max_iterations: u32) -> [u8; 4] {
        match self {
            Self::Rainbow(c) => c.color(result, max_iterations),
            Self::Gradient(c) => c.color(result, max_iterations),
            Self::Newton(c) => c.color(result, max_iterations),
        }
    }
}

/// Colorize an entire iteration buffer into an RGBA pixel buffer.
pub fn colorize<C: Colorizer + Sync>(colorizer: &C, iterations: &IterationBuffer) -> RenderBuffer {
    let max_iterations = iterations.max_iterations;
    let mut pixels = vec![0u8; iterations.data.len() * 4];
    pixels
        .par_chunks_mut(4)
        .zip(iterations.data.par_iter())
        .for_each(|(pixel, &result)| {
            pixel.copy_from_slice(&colorizer.color(result, max_iterations));
        });
    RenderBuffer {
        width: iterations.width,
        height: iterations.height,
        pixels,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(count: u32) -> IterationResult {
        IterationResult::escaped(count, 16.0)
    }

    fn root(count: u32, index: usize) -> IterationResult {
        IterationResult {
            count,
            escaped: true,
            detail: Detail::Root(index),
        }
    }

    #[test]
    fn empty_gradient_falls_back_to_grayscale() {
        let empty = Gradient::from_stops("Empty", &[]);
        let gray = Gradient::grayscale();
        assert_eq!(empty.name, gray.name);
        for count in [1, 50, 199] {
            assert_eq!(empty.color(escaped(count), 200), gray.color(escaped(count), 200));
        }
    }

    #[test]
    fn bounded_points_are_black_in_every_scheme() {
        for kind in ColorKind::ALL {
            let scheme = kind.scheme();
            assert_eq!(
                scheme.color(IterationResult::bounded(200), 200),
                INTERIOR,
                "{} interior",
                kind.label()
            );
        }
    }

    #[test]
    fn escaped_points_are_not_black() {
        for kind in [ColorKind::Rainbow, ColorKind::Ice] {
            let c = kind.scheme().color(escaped(40), 200);
            assert!(c[0] > 0 || c[1] > 0 || c[2] > 0, "{} gave black", kind.label());
            assert_eq!(c[3], 255);
        }
    }

    #[test]
    fn grayscale_brightens_with_count() {
        let g = Gradient::grayscale();
        let low = g.color(escaped(10), 200);
        let high = g.color(escaped(150), 200);
        assert!(high[0] > low[0]);
        assert_eq!(high[0], high[1]);
        assert_eq!(high[1], high[2]);
    }

    #[test]
    fn gradient_endpoints_match_stops() {
        let ice = Gradient::ice();
        assert_eq!(ice.sample(0.0), [0, 8, 40, 255]);
        assert_eq!(ice.sample(1.0), [255, 255, 255, 255]);
    }

    #[test]
    fn rainbow_hue_moves_with_count() {
        let a = Rainbow.color(escaped(20), 200);
        let b = Rainbow.color(escaped(120), 200);
        assert_ne!(a, b);
    }

    #[test]
    fn smooth_count_is_continuous_between_integers() {
        let r = IterationResult::escaped(20, 10.0);
        let nu = smooth_count(&r);
        assert!(nu > 20.0 && nu < 21.0, "ν = {nu}");
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0, 255]);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), [0, 255, 0, 255]);
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), [0, 0, 255, 255]);
        assert_eq!(hsv_to_rgb(360.0, 1.0, 1.0), [255, 0, 0, 255]);
    }

    #[test]
    fn newton_roots_get_distinct_hues() {
        let n = NewtonShading::default();
        let colors: Vec<_> = (0..3).map(|i| n.color(root(3, i), 200)).collect();
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn newton_slow_convergence_is_darker() {
        let n = NewtonShading::default();
        let fast = n.color(root(2, 0), 200);
        let slow = n.color(root(40, 0), 200);
        assert!(fast[0] > slow[0]);
    }

    #[test]
    fn tags_round_trip() {
        for kind in ColorKind::ALL {
            assert_eq!(ColorKind::from_tag(kind.tag()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.tag()));
        }
        assert_eq!(ColorKind::from_tag("fire"), None);
    }
}

use criterion::{criterion_group, criterion_main, Criterion};

use fractour_core::{Complex, FractalKind, IterationBudget, Mandelbrot, PlaneBounds, Viewport};
use fractour_render::{colorize, render, render_frame, ColorKind, RenderCancel};

fn bench_full_frame_render(c: &mut Criterion) {
    let viewport = Viewport::initial(640, 480).unwrap();
    let cancel = RenderCancel::new();

    c.bench_function("full_frame_640x480", |b| {
        b.iter(|| render(&Mandelbrot, &viewport, 200, &cancel));
    });
}

fn bench_iteration_throughput(c: &mut Criterion) {
    let bounds = PlaneBounds::new(-0.75, -0.73, 0.1, 0.12);
    let viewport = Viewport::new(bounds, 256, 256).unwrap();
    let cancel = RenderCancel::new();

    c.bench_function("render_256x256_1000iter", |b| {
        b.iter(|| render(&Mandelbrot, &viewport, 1000, &cancel));
    });
}

fn bench_newton_frame(c: &mut Criterion) {
    let viewport = Viewport::new(PlaneBounds::new(-2.0, 2.0, -1.5, 1.5), 400, 300).unwrap();
    let evaluator = FractalKind::Newton.evaluator(Complex::ZERO);
    let scheme = ColorKind::NewtonColor.scheme();
    let budget = IterationBudget::default();
    let cancel = RenderCancel::new();

    c.bench_function("newton_frame_400x300", |b| {
        b.iter(|| render_frame(&evaluator, &scheme, &viewport, &budget, &cancel));
    });
}

fn bench_colorize(c: &mut Criterion) {
    let viewport = Viewport::initial(640, 480).unwrap();
    let result = render(&Mandelbrot, &viewport, 200, &RenderCancel::new());
    let scheme = ColorKind::Ice.scheme();

    c.bench_function("colorize_640x480", |b| {
        b.iter(|| colorize(&scheme, &result.iterations));
    });
}

criterion_group!(
    benches,
    bench_full_frame_render,
    bench_iteration_throughput,
    bench_newton_frame,
    bench_colorize
);
criterion_main!(benches);

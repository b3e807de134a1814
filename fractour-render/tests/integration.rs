use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use fractour_core::{
    Complex, Fractal, FractalKind, IterationBudget, IterationResult, Julia, Mandelbrot,
    PlaneBounds, Viewport,
};
use fractour_render::{
    render, render_frame, ColorKind, FrameSink, RenderCancel, RenderError, RenderRequest,
    RenderWorker, RenderedFrame, INTERIOR,
};

#[test]
fn end_to_end_mandelbrot_frame() {
    let viewport = Viewport::initial(200, 150).unwrap();
    let frame = render_frame(
        &Mandelbrot,
        &ColorKind::Rainbow.scheme(),
        &viewport,
        &IterationBudget::default(),
        &RenderCancel::new(),
    )
    .unwrap();

    assert_eq!(frame.iterations.data.len(), 200 * 150);
    assert_eq!(frame.image.pixels.len(), 200 * 150 * 4);

    let pixels: Vec<&[u8]> = frame.image.pixels.chunks_exact(4).collect();
    assert!(
        pixels.iter().any(|px| px[0] > 0 || px[1] > 0 || px[2] > 0),
        "rendered image should contain colored pixels"
    );
    assert!(
        pixels.iter().any(|px| **px == INTERIOR),
        "the main cardioid should be visible"
    );
}

#[test]
fn end_to_end_julia_render() {
    let julia = Julia::default();
    let viewport = Viewport::new(PlaneBounds::new(-1.5, 1.5, -1.0, 1.0), 120, 80).unwrap();

    let result = render(&julia, &viewport, 200, &RenderCancel::new());

    assert!(!result.cancelled);
    assert_eq!(result.iterations.data.len(), 120 * 80);
    assert!(result.iterations.data.iter().any(|r| r.escaped));
}

#[test]
fn render_determinism() {
    let viewport = Viewport::initial(128, 96).unwrap();
    let cancel = RenderCancel::new();

    let r1 = render(&Mandelbrot, &viewport, 300, &cancel);
    let r2 = render(&Mandelbrot, &viewport, 300, &cancel);

    assert_eq!(
        r1.iterations.data, r2.iterations.data,
        "renders must be deterministic"
    );
}

#[test]
fn mandelbrot_frame_is_symmetric_about_real_axis() {
    // Rows y and (h - y) sample conjugate points when the view is centred on im = 0.
    // A power-of-two height keeps the row coordinates exact.
    let viewport = Viewport::new(PlaneBounds::new(-2.0, 1.0, -1.0, 1.0), 64, 32).unwrap();
    let result = render(&Mandelbrot, &viewport, 150, &RenderCancel::new());

    for y in 1..16 {
        for x in 0..64 {
            let top = result.iterations.get(x, y);
            let bottom = result.iterations.get(x, 32 - y);
            assert_eq!(top.count, bottom.count, "mismatch at ({x}, {y})");
        }
    }
}

#[test]
fn newton_frame_colors_every_basin() {
    let viewport = Viewport::new(PlaneBounds::new(-2.0, 2.0, -2.0, 2.0), 64, 64).unwrap();
    let evaluator = FractalKind::Newton.evaluator(Complex::ZERO);
    let frame = render_frame(
        &evaluator,
        &ColorKind::NewtonColor.scheme(),
        &viewport,
        &IterationBudget::default(),
        &RenderCancel::new(),
    )
    .unwrap();

    let mut roots = [false; 3];
    for r in &frame.iterations.data {
        if let Some(i) = r.root() {
            roots[i] = true;
        }
    }
    assert_eq!(roots, [true; 3]);
}

/// Wraps an evaluator and cancels the render once `after` points were iterated.
struct CancelAfter<'a, F> {
    inner: F,
    cancel: &'a RenderCancel,
    after: usize,
    seen: AtomicUsize,
}

impl<F: Fractal> Fractal for CancelAfter<'_, F> {
    fn iterate(&self, point: Complex, max_iterations: u32) -> IterationResult {
        if self.seen.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
            self.cancel.cancel();
        }
        self.inner.iterate(point, max_iterations)
    }
}

#[test]
fn cancelled_frame_yields_no_pixels() {
    let viewport = Viewport::initial(64, 2048).unwrap();
    let cancel = RenderCancel::new();
    let fractal = CancelAfter {
        inner: Mandelbrot,
        cancel: &cancel,
        after: 64 * 3,
        seen: AtomicUsize::new(0),
    };

    let outcome = render_frame(
        &fractal,
        &ColorKind::Rainbow.scheme(),
        &viewport,
        &IterationBudget::default(),
        &cancel,
    );
    assert!(matches!(outcome, Err(RenderError::Cancelled)));

    let (done, total) = cancel.progress();
    assert_eq!(total, 2048);
    assert!(done < total);

    // A fresh generation renders the same viewport in full.
    let frame = render_frame(
        &Mandelbrot,
        &ColorKind::Rainbow.scheme(),
        &viewport,
        &IterationBudget::default(),
        &cancel,
    )
    .unwrap();
    assert_eq!(frame.image.pixels.len(), 64 * 2048 * 4);
}

#[test]
fn worker_presents_only_the_latest_viewport() {
    let (tx, rx) = mpsc::channel::<Arc<RenderedFrame>>();
    let tx = Mutex::new(tx);
    let sink: Arc<dyn FrameSink> = Arc::new(move |frame: Arc<RenderedFrame>| {
        let _ = tx.lock().unwrap().send(frame);
    });
    let worker = RenderWorker::spawn(sink).unwrap();

    let mut viewport = Viewport::initial(160, 120).unwrap();
    let mut last = 0;
    for step in 0..8 {
        viewport.pan_pixels(step as f64, 0.0);
        last = worker
            .submit(RenderRequest {
                viewport,
                fractal: FractalKind::Mandelbrot,
                julia_c: Complex::ZERO,
                color: ColorKind::Ice,
                budget: IterationBudget::default(),
            })
            .unwrap();
    }

    let mut final_frame = None;
    while let Ok(frame) = rx.recv_timeout(Duration::from_secs(10)) {
        if frame.id == last {
            final_frame = Some(frame);
            break;
        }
    }
    let final_frame = final_frame.expect("latest request should be presented");
    assert_eq!(final_frame.frame.viewport, viewport);
}

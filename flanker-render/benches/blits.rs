use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use flanker_core::Color;
use flanker_render::blit::{blit_over, copy_to_frame, fill};
use flanker_render::fixation_pixmap;
use std::time::Duration;
use tiny_skia::{Paint, Pixmap, Rect, Transform};

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;

fn canvas() -> Pixmap {
    let mut pm = Pixmap::new(WIDTH, HEIGHT).unwrap();
    fill(&mut pm, [192, 192, 192, 255]);
    pm
}

// Stand-in for a rasterised text line: soft edges, opaque core.
fn text_like(w: u32, h: u32) -> Pixmap {
    let mut pm = Pixmap::new(w, h).unwrap();
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 140);
    pm.fill_rect(
        Rect::from_xywh(0.0, 0.0, w as f32, h as f32).unwrap(),
        &paint,
        Transform::identity(),
        None,
    );
    paint.set_color_rgba8(0, 0, 0, 255);
    pm.fill_rect(
        Rect::from_xywh(2.0, 2.0, w as f32 - 4.0, h as f32 - 4.0).unwrap(),
        &paint,
        Transform::identity(),
        None,
    );
    pm
}

pub fn bench_blits(c: &mut Criterion) {
    let mut group = c.benchmark_group("blit_over");
    group
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));

    let cross = fixation_pixmap(40.0, Color::BLACK).unwrap();
    group.bench_function("fixation_center", |b| {
        let mut dst = canvas();
        b.iter(|| blit_over(&mut dst, black_box(&cross), 940, 520));
    });

    for (w, h) in [(60, 70), (420, 70), (1500, 40)] {
        let src = text_like(w, h);
        group.bench_with_input(BenchmarkId::new("text", format!("{w}x{h}")), &src, |b, src| {
            let mut dst = canvas();
            b.iter(|| blit_over(&mut dst, black_box(src), 200, 500));
        });
    }
    group.finish();
}

pub fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    group.sample_size(40);

    group.bench_function("clear", |b| {
        let mut dst = canvas();
        b.iter(|| fill(&mut dst, black_box([192, 192, 192, 255])));
    });

    group.bench_function("copy_to_frame", |b| {
        let src = canvas();
        let mut frame = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
        b.iter(|| copy_to_frame(black_box(&src), &mut frame));
    });
    group.finish();
}

criterion_group!(benches, bench_blits, bench_frame);
criterion_main!(benches);

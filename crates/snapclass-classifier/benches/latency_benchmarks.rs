//! Latency benchmarks for the classifier's own work
//!
//! Covers preprocessing and arg-max decoding, i.e. everything outside the
//! inference engine.
//!
//! Run with: cargo bench -p snapclass-classifier

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgb, RgbImage};
use snapclass_classifier::postprocess::argmax;
use snapclass_classifier::preprocess::image_to_tensor;

fn benchmark_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("Preprocess");

    for size in [32u32, 128, 224] {
        let image = RgbImage::from_fn(size, size, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        group.bench_with_input(BenchmarkId::new("image_to_tensor", size), &image, |b, image| {
            b.iter(|| image_to_tensor(black_box(image), size).unwrap())
        });
    }

    group.finish();
}

fn benchmark_argmax(c: &mut Criterion) {
    let mut group = c.benchmark_group("Argmax");

    for labels in [10usize, 1000] {
        let scores: Vec<f32> = (0..labels).map(|i| ((i * 7919) % 1000) as f32).collect();
        group.bench_with_input(BenchmarkId::new("argmax", labels), &scores, |b, scores| {
            b.iter(|| argmax(black_box(scores)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_preprocess, benchmark_argmax);
criterion_main!(benches);

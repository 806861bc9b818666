//! Performance benchmarks for the frame scoring path

use bestframe::acceptance::AcceptancePolicy;
use bestframe::constants::NUM_MESH_LANDMARKS;
use bestframe::detector::{mesh_schema, LandmarkSet};
use bestframe::quality::{brightness, contrast, sharpness, ScoreWeights};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use opencv::core::{Mat, Point2f, Scalar, Vec3b, CV_8UC3};
use opencv::prelude::*;

/// A deterministic frame with enough texture to exercise every metric
fn textured_frame(rows: i32, cols: i32) -> Mat {
    let mut frame = Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(0.0))
        .expect("failed to create bench frame");
    for row in 0..rows {
        for col in 0..cols {
            let value = ((row * 7 + col * 13) % 256) as u8;
            *frame.at_2d_mut::<Vec3b>(row, col).unwrap() = Vec3b::from([value, value / 2, value / 3]);
        }
    }
    frame
}

fn well_posed_landmarks() -> LandmarkSet {
    let mut points = vec![Point2f::new(0.5, 0.5); NUM_MESH_LANDMARKS];
    points[159] = Point2f::new(0.32, 0.35);
    points[145] = Point2f::new(0.32, 0.38);
    points[33] = Point2f::new(0.30, 0.36);
    points[133] = Point2f::new(0.40, 0.36);
    points[386] = Point2f::new(0.62, 0.35);
    points[374] = Point2f::new(0.62, 0.38);
    points[362] = Point2f::new(0.60, 0.36);
    points[263] = Point2f::new(0.70, 0.36);
    points[13] = Point2f::new(0.50, 0.56);
    points[14] = Point2f::new(0.50, 0.55);
    LandmarkSet::normalized(points)
}

fn bench_quality_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("quality_metrics");

    for size in [(240, 320), (480, 640)] {
        let frame = textured_frame(size.0, size.1);
        let label = format!("{}x{}", size.1, size.0);

        group.bench_with_input(BenchmarkId::new("brightness", &label), &frame, |b, frame| {
            b.iter(|| brightness(black_box(frame)));
        });
        group.bench_with_input(BenchmarkId::new("contrast", &label), &frame, |b, frame| {
            b.iter(|| contrast(black_box(frame)));
        });
        group.bench_with_input(BenchmarkId::new("sharpness", &label), &frame, |b, frame| {
            b.iter(|| sharpness(black_box(frame)));
        });
        group.bench_with_input(BenchmarkId::new("score", &label), &frame, |b, frame| {
            let weights = ScoreWeights::default();
            b.iter(|| weights.score(black_box(frame)));
        });
    }

    group.finish();
}

fn bench_acceptance_policy(c: &mut Criterion) {
    let policy = AcceptancePolicy::new(mesh_schema());
    let landmarks = well_posed_landmarks();

    c.bench_function("acceptance_policy", |b| {
        b.iter(|| policy.accepts(black_box(&landmarks)));
    });
}

criterion_group!(benches, bench_quality_metrics, bench_acceptance_policy);
criterion_main!(benches);

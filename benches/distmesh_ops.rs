//! Benchmarks for mesh generation.

use criterion::{criterion_group, criterion_main, Criterion};
use distmesh::prelude::*;
use nalgebra::DMatrix;

fn create_grid_triangles(n: usize) -> DMatrix<usize> {
    let mut data = Vec::with_capacity(n * n * 6);

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            data.extend_from_slice(&[v00, v10, v11]);
            data.extend_from_slice(&[v00, v11, v01]);
        }
    }

    DMatrix::from_row_slice(n * n * 2, 3, &data)
}

fn create_grid_points(n: usize) -> DMatrix<f64> {
    // Slight jitter keeps the lattice out of cocircular configurations.
    DMatrix::from_fn((n + 1) * (n + 1), 2, |row, axis| {
        let (i, j) = (row % (n + 1), row / (n + 1));
        let base = (if axis == 0 { i } else { j }) as f64;
        base + 1e-3 * ((row * 7 + axis * 13) % 11) as f64
    })
}

fn bench_edges(c: &mut Criterion) {
    let triangles = create_grid_triangles(50);
    let points = create_grid_points(50);

    c.bench_function("unique_edges_50x50", |b| b.iter(|| unique_edges(&triangles)));

    c.bench_function("boundary_edges_50x50", |b| {
        b.iter(|| boundary_edges(&points, &triangles, None).unwrap())
    });
}

fn bench_triangulate(c: &mut Criterion) {
    let points = create_grid_points(15);

    c.bench_function("bowyer_watson_16x16", |b| {
        b.iter(|| BowyerWatson::default().triangulate(&points).unwrap())
    });
}

fn bench_distmesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("distmesh");
    group.sample_size(10);

    group.bench_function("unit_disk_h0.2", |b| {
        let options = DistmeshOptions::default().with_max_steps(200);
        b.iter(|| {
            distmesh(
                &Sphere::unit(2),
                0.2,
                &Constant(1.0),
                &bounding_box(2),
                &DMatrix::zeros(0, 2),
                &options,
            )
            .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_edges, bench_triangulate, bench_distmesh);
criterion_main!(benches);

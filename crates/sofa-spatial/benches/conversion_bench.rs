//! Benchmarks for coordinate conversion and frame resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array2, ArrayD};
use sofa_format::{Axis, Dataset, Selection};
use sofa_spatial::coordinates::convert;
use sofa_spatial::{AngleUnit, Coordinates, Descriptor, ObjectKind, Query, System};

/// A ring of `count` source positions, 1.2 m away at ear height.
fn ring(count: usize) -> ArrayD<f64> {
    Array2::from_shape_fn((count, 3), |(m, c)| {
        let az = 2.0 * std::f64::consts::PI * m as f64 / count as f64;
        match c {
            0 => 1.2 * az.cos(),
            1 => 1.2 * az.sin(),
            _ => 0.0,
        }
    })
    .into_dyn()
}

/// Dataset with two ears on a listener and `count` source positions.
fn hrtf_layout(count: usize) -> Dataset {
    let mut ds = Dataset::new();
    ds.create_dimension(Axis::I, 1).unwrap();
    ds.create_dimension(Axis::C, 3).unwrap();
    ds.create_dimension(Axis::M, count).unwrap();
    ds.create_dimension(Axis::R, 2).unwrap();

    let ears = Coordinates::new(ObjectKind::Receiver, Descriptor::Position);
    ears.initialize(&mut ds, false).unwrap();
    let offsets = ndarray::arr2(&[[0.0, 0.09, 0.0], [0.0, -0.09, 0.0]]).into_dyn();
    ears.set_values(
        &mut ds,
        offsets.view(),
        &Selection::new(),
        Some(&[Axis::R, Axis::C]),
        &[Axis::I],
        None,
        None,
    )
    .unwrap();

    let source = Coordinates::new(ObjectKind::Source, Descriptor::Position);
    source.initialize(&mut ds, true).unwrap();
    source
        .set_values(
            &mut ds,
            ring(count).view(),
            &Selection::new(),
            None,
            &[],
            None,
            None,
        )
        .unwrap();
    ds
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("cart2sph");
    for count in [64usize, 1024, 16384] {
        let coords = ring(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &coords, |b, coords| {
            b.iter(|| {
                convert(
                    black_box(coords),
                    &[Axis::M, Axis::C],
                    System::Cartesian,
                    System::Spherical,
                    AngleUnit::Radian,
                    AngleUnit::Degree,
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_relative(c: &mut Criterion) {
    let mut group = c.benchmark_group("source_relative_to_receivers");
    for count in [64usize, 1024] {
        let ds = hrtf_layout(count);
        let source = Coordinates::new(ObjectKind::Source, Descriptor::Position);
        let query = Query::new().with_system(System::Spherical);
        group.bench_with_input(BenchmarkId::from_parameter(count), &ds, |b, ds| {
            b.iter(|| {
                source
                    .relative_values(black_box(ds), Some(ObjectKind::Receiver), &query)
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_convert, bench_relative);
criterion_main!(benches);

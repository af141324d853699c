// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fiber intersection benchmarks
//!
//! - voxelization of a long, forked fiber at several resolutions
//! - a full pass between two small populations
//!
//! Fixed inputs and seeds; no I/O.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fibra_connectivity::connectivity::{interpolate_branches, voxelize};
use fibra_connectivity::{
    Aabb3, CancellationToken, CellTypeSelection, Compartment, CompartmentType, FiberIntersection,
    FiberIntersectionParams, FiberMorphology, InMemoryNetwork, MemorySink, Morphology, PlacedCell,
};

/// Parallel fiber: a 2 mm shaft along x with a side branch every 100 um
fn parallel_fiber() -> Vec<Compartment> {
    let kind = CompartmentType::Custom("parallel_fiber".to_string());
    let shaft = 20u64;
    let mut compartments = Vec::new();
    for i in 0..shaft {
        let x = i as f64 * 100.0;
        compartments.push(Compartment::new(
            i,
            kind.clone(),
            [x, 0.0, 0.0],
            [x + 100.0, 0.0, 0.0],
            i.checked_sub(1),
        ));
    }
    for i in 0..shaft {
        let x = i as f64 * 100.0 + 100.0;
        compartments.push(Compartment::new(
            shaft + i,
            kind.clone(),
            [x, 0.0, 0.0],
            [x, 40.0, 10.0],
            Some(i),
        ));
    }
    compartments
}

fn bench_voxelize(c: &mut Criterion) {
    let mut group = c.benchmark_group("voxelize");
    let compartments = parallel_fiber();

    for resolution in [20.0, 5.0, 1.0] {
        group.bench_with_input(
            BenchmarkId::new("parallel_fiber", format!("res_{}", resolution)),
            &resolution,
            |b, &resolution| {
                b.iter(|| {
                    let mut fiber = FiberMorphology::from_compartments(&compartments, [0.0; 3]);
                    interpolate_branches(&mut fiber.root_branches, resolution);
                    let voxels = voxelize(
                        black_box(&fiber.root_branches),
                        [0.0; 3],
                        Aabb3::from_point([0.0; 3]),
                        10.0,
                    );
                    black_box(voxels)
                });
            },
        );
    }
    group.finish();
}

fn bench_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("fiber_intersection_pass");

    for cells in [50usize, 200] {
        let mut net = InMemoryNetwork::new(10.0);
        net.add_morphology(Morphology::new("pf", parallel_fiber()));
        net.add_morphology(Morphology::new(
            "pc",
            (0..50u64)
                .map(|i| {
                    let y = i as f64 * 4.0;
                    Compartment::new(
                        i,
                        CompartmentType::Dendrites,
                        [0.0, y, 0.0],
                        [0.0, y + 4.0, 5.0],
                        None,
                    )
                })
                .collect(),
        ));
        net.place_cells(
            "granule",
            (0..cells as u64)
                .map(|i| PlacedCell::new(i, [0.0, (i % 20) as f64 * 5.0, (i % 7) as f64]))
                .collect(),
            vec!["pf".to_string(); cells],
        )
        .unwrap();
        net.place_cells(
            "purkinje",
            (0..cells as u64 / 5)
                .map(|i| PlacedCell::new(10_000 + i, [i as f64 * 40.0, 0.0, 0.0]))
                .collect(),
            vec!["pc".to_string(); cells / 5],
        )
        .unwrap();

        let connection = FiberIntersection::new(
            "pf_to_pc",
            CellTypeSelection::new("granule", vec![]),
            CellTypeSelection::new("purkinje", vec![CompartmentType::Dendrites]),
        )
        .with_params(FiberIntersectionParams::new(0.8, 10.0, 10.0).unwrap())
        .with_seed(42);

        group.throughput(Throughput::Elements(cells as u64));
        group.bench_with_input(BenchmarkId::new("cells", cells), &cells, |b, _| {
            b.iter(|| {
                let mut sink = MemorySink::new();
                let stats = connection
                    .connect(&net, &mut sink, &CancellationToken::new())
                    .unwrap();
                black_box(stats)
            });
        });
    }
    group.finish();
}

fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2))
        .sample_size(20)
}

criterion_group! {
    name = fiber_benches;
    config = criterion_config();
    targets = bench_voxelize, bench_pass
}
criterion_main!(fiber_benches);

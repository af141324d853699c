// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Fibra Connectivity

Builds synaptic connectivity between populations of placed neuron
reconstructions by intersecting voxelized presynaptic fibers with the voxel
clouds of postsynaptic morphologies.

## Pipeline

- `morphology` - compartments, branch forests, voxel clouds, morphology sets
- `connectivity` - interpolation, transforms, voxelization, candidate search,
  voxel intersection, connection sampling and the assembling strategy
- `spatial` - Morton voxel ids, boxes and the grid box index
- `providers` - placement/morphology sources and connectivity sinks

## Determinism

Each presynaptic cell draws from its own RNG derived from the pass seed and
its cell id, so a seeded pass yields the same table with or without the
`parallel` feature.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cancellation;
pub mod connectivity;
pub mod morphology;
pub mod providers;
pub mod rng;
pub mod spatial;
pub mod types;

pub use cancellation::CancellationToken;

pub use connectivity::{
    BranchTransform, CellTypeSelection, ConnectionRecord, ConnectivityStats, ConnectivityTable,
    FiberIntersection, FiberIntersectionParams, FiberTransform, QuiverTransform,
};

pub use morphology::{
    Branch, Compartment, CompartmentType, FiberMorphology, FilteredMorphology, Morphology,
    MorphologySet, PlacedCell, PlacementSet, VoxelCloud,
};

pub use providers::{
    ConnectivitySink, InMemoryNetwork, MemorySink, MorphologyProvider, PlacementProvider,
};

pub use spatial::{morton_decode_3d, morton_encode_3d, Aabb3, GridIndex, SpatialIndex, VoxelId};

pub use types::{
    CellId, CompartmentId, ConnectivityError, ConnectivityResult, MorphologyIndex, Point3,
};

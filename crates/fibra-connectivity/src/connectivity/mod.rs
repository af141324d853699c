// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Fiber intersection pipeline.

Each stage lives in its own module; `fiber_intersection` drives them per
presynaptic cell and assembles the resulting table.
*/

pub mod candidates;
pub mod fiber_intersection;
pub mod interpolation;
pub mod intersection;
pub mod sampler;
pub mod table;
pub mod transform;
pub mod voxelizer;

pub use candidates::CandidateSearch;
pub use fiber_intersection::{
    CellTypeSelection, FiberIntersection, FiberIntersectionParams, DEFAULT_AFFINITY,
    DEFAULT_RESOLUTION, DEFAULT_VOXEL_SIZE,
};
pub use interpolation::interpolate_branches;
pub use intersection::{intersect_voxel_tree, VoxelOverlap};
pub use sampler::{ConnectionSampler, SampledContact};
pub use table::{ConnectionRecord, ConnectivityStats, ConnectivityTable};
pub use transform::{BranchTransform, FiberTransform, QuiverTransform};
pub use voxelizer::{voxelize, FiberVoxelization};

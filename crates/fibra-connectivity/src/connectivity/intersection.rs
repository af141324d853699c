// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Voxel-level intersection of a fiber with one postsynaptic cell.
*/

use crate::morphology::VoxelCloud;
use crate::spatial::{SpatialIndex, VoxelId};
use crate::types::Point3;

/// Overlapping fiber voxels per postsynaptic voxel (cloud order)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VoxelOverlap {
    pub hits: Vec<Vec<VoxelId>>,
}

impl VoxelOverlap {
    /// No postsynaptic voxel overlaps the fiber
    pub fn is_empty(&self) -> bool {
        self.hits.iter().all(Vec::is_empty)
    }

    /// Postsynaptic voxel indices with at least one overlapping fiber voxel
    pub fn qualifying(&self) -> impl Iterator<Item = (usize, &[VoxelId])> {
        self.hits
            .iter()
            .enumerate()
            .filter(|(_, hits)| !hits.is_empty())
            .map(|(i, hits)| (i, hits.as_slice()))
    }
}

/// Test every voxel of `cloud`, placed at `position`, against the fiber voxel index
pub fn intersect_voxel_tree<I>(fiber: &I, cloud: &VoxelCloud, position: Point3) -> VoxelOverlap
where
    I: SpatialIndex<VoxelId> + ?Sized,
{
    let hits = (0..cloud.len())
        .map(|v| {
            let mut ids = fiber.query(&cloud.voxel_box(v).translated(position));
            ids.sort_unstable();
            ids
        })
        .collect();
    VoxelOverlap { hits }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Fiber voxelization.

Quantizes every compartment of a branch forest by its end point into a grid
of edge `voxel_size` anchored at the morphology's local origin. The result
holds the voxel boxes in absolute coordinates (an index keyed by voxel id),
the compartments per voxel, and a bounding box grown over all voxels.
*/

use std::collections::BTreeMap;

use tracing::trace;

use crate::morphology::{voxel_key, voxel_origin, Branch};
use crate::spatial::{Aabb3, GridIndex, SpatialIndex, VoxelId};
use crate::types::{add, CompartmentId, ConnectivityResult, Point3};

/// Voxelized fiber of one presynaptic cell
#[derive(Debug, Clone)]
pub struct FiberVoxelization {
    bounding_box: Aabb3,
    index: GridIndex<VoxelId>,
    map: BTreeMap<VoxelId, Vec<CompartmentId>>,
    voxel_size: f64,
}

impl FiberVoxelization {
    /// Start an empty voxelization from `initial` bounds
    pub fn new(initial: Aabb3, voxel_size: f64) -> Self {
        Self {
            bounding_box: initial,
            index: GridIndex::new(voxel_size),
            map: BTreeMap::new(),
            voxel_size,
        }
    }

    /// Add one branch's compartments (children are not visited)
    pub fn add_branch(&mut self, branch: &Branch, position: Point3) -> ConnectivityResult<()> {
        for compartment in branch.compartments() {
            let key = voxel_key(compartment.end, self.voxel_size);
            let id = VoxelId::from_key(key)?;
            match self.map.get_mut(&id) {
                Some(ids) => ids.push(compartment.id),
                None => {
                    let origin = add(voxel_origin(key, self.voxel_size), position);
                    let voxel = Aabb3::cube(origin, self.voxel_size);
                    self.index.insert(id, voxel);
                    self.bounding_box.expand(&voxel);
                    self.map.insert(id, vec![compartment.id]);
                }
            }
        }
        Ok(())
    }

    /// Sort every compartment list so the mapping is independent of traversal order
    fn finish(mut self) -> Self {
        for ids in self.map.values_mut() {
            ids.sort_unstable();
        }
        self
    }

    /// Box covering every voxel (and the initial bounds)
    pub fn bounding_box(&self) -> &Aabb3 {
        &self.bounding_box
    }

    /// Voxel boxes in absolute coordinates
    pub fn index(&self) -> &GridIndex<VoxelId> {
        &self.index
    }

    /// Compartments per occupied voxel
    pub fn map(&self) -> &BTreeMap<VoxelId, Vec<CompartmentId>> {
        &self.map
    }

    /// Compartments of voxel `id` (empty when unoccupied)
    pub fn compartments(&self, id: VoxelId) -> &[CompartmentId] {
        self.map.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Voxelize a branch forest placed at `position`, growing `initial`.
pub fn voxelize(
    branches: &[Branch],
    position: Point3,
    initial: Aabb3,
    voxel_size: f64,
) -> ConnectivityResult<FiberVoxelization> {
    let mut voxelization = FiberVoxelization::new(initial, voxel_size);
    let mut stack: Vec<&Branch> = branches.iter().rev().collect();
    while let Some(branch) = stack.pop() {
        voxelization.add_branch(branch, position)?;
        stack.extend(branch.children().iter().rev());
    }

    trace!(
        target: "fibra-connectivity",
        "Voxelized fiber at {:?}: {} voxels",
        position,
        voxelization.len()
    );
    Ok(voxelization.finish())
}

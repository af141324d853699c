// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Voxel clouds - occupancy grids of postsynaptic morphologies.

A cloud lists its occupied voxels by grid coordinate (local to the
morphology) and, per voxel, the compartments that fall inside it. Voxel
indices into a cloud are positions in that list.
*/

use std::collections::BTreeMap;

use super::compartment::Compartment;
use crate::spatial::{Aabb3, VoxelId};
use crate::types::{CompartmentId, ConnectivityError, ConnectivityResult, Point3};

/// Grid coordinates of the voxel containing `point` (grid anchored at the local origin)
#[inline]
pub fn voxel_key(point: Point3, grid_size: f64) -> [i64; 3] {
    [
        (point[0] / grid_size).floor() as i64,
        (point[1] / grid_size).floor() as i64,
        (point[2] / grid_size).floor() as i64,
    ]
}

/// Minimum corner of the voxel with grid coordinates `key`
#[inline]
pub fn voxel_origin(key: [i64; 3], grid_size: f64) -> Point3 {
    [
        key[0] as f64 * grid_size,
        key[1] as f64 * grid_size,
        key[2] as f64 * grid_size,
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoxelCloud {
    grid_size: f64,
    voxels: Vec<[i64; 3]>,
    map: Vec<Vec<CompartmentId>>,
}

impl VoxelCloud {
    /// Wrap a precomputed voxelization.
    ///
    /// `map[i]` lists the compartments of `voxels[i]`.
    pub fn new(
        grid_size: f64,
        voxels: Vec<[i64; 3]>,
        map: Vec<Vec<CompartmentId>>,
    ) -> ConnectivityResult<Self> {
        if !(grid_size.is_finite() && grid_size > 0.0) {
            return Err(ConnectivityError::InvalidVoxelCloud(format!(
                "grid size must be positive, got {}",
                grid_size
            )));
        }
        if voxels.len() != map.len() {
            return Err(ConnectivityError::InvalidVoxelCloud(format!(
                "{} voxels but {} compartment lists",
                voxels.len(),
                map.len()
            )));
        }
        Ok(Self {
            grid_size,
            voxels,
            map,
        })
    }

    /// Voxelize compartments by their end points.
    ///
    /// Voxels are ordered by voxel id and compartment lists by compartment id,
    /// so the result does not depend on input order.
    pub fn from_compartments(
        compartments: &[Compartment],
        grid_size: f64,
    ) -> ConnectivityResult<Self> {
        let mut occupied: BTreeMap<VoxelId, Vec<CompartmentId>> = BTreeMap::new();
        for compartment in compartments {
            let id = VoxelId::from_key(voxel_key(compartment.end, grid_size))?;
            occupied.entry(id).or_default().push(compartment.id);
        }

        let mut voxels = Vec::with_capacity(occupied.len());
        let mut map = Vec::with_capacity(occupied.len());
        for (id, mut ids) in occupied {
            ids.sort_unstable();
            voxels.push(id.key());
            map.push(ids);
        }
        Self::new(grid_size, voxels, map)
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Grid coordinates of the occupied voxels
    pub fn voxels(&self) -> &[[i64; 3]] {
        &self.voxels
    }

    /// Compartments per voxel, parallel to [`voxels`](Self::voxels)
    pub fn map(&self) -> &[Vec<CompartmentId>] {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Box of voxel `index` in local coordinates
    pub fn voxel_box(&self, index: usize) -> Aabb3 {
        Aabb3::cube(voxel_origin(self.voxels[index], self.grid_size), self.grid_size)
    }

    /// Box covering every voxel in local coordinates, `None` for an empty cloud
    pub fn bounding_box(&self) -> Option<Aabb3> {
        let mut boxes = (0..self.voxels.len()).map(|i| self.voxel_box(i));
        let first = boxes.next()?;
        Some(boxes.fold(first, |acc, b| acc.union(&b)))
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Coarse candidate search over postsynaptic cell boxes.
*/

use tracing::debug;

use crate::morphology::MorphologySet;
use crate::spatial::{Aabb3, GridIndex, SpatialIndex};
use crate::types::ConnectivityResult;

/// Index of postsynaptic cell boxes, keyed by position in the morphology set
#[derive(Debug, Clone)]
pub struct CandidateSearch {
    index: GridIndex<usize>,
}

impl CandidateSearch {
    /// Index every cell of `set` by its voxel cloud box translated to the cell position.
    ///
    /// Fails with `IncompleteMorphology` if any cloud has no voxels.
    pub fn build(set: &MorphologySet) -> ConnectivityResult<Self> {
        let mut boxes = Vec::with_capacity(set.len());
        for (i, (cell, morphology, _)) in set.iter().enumerate() {
            let cloud = morphology.assert_voxelization()?;
            let local = cloud.bounding_box().ok_or_else(|| morphology.incomplete())?;
            boxes.push((i, local.translated(cell.position)));
        }
        let search = Self::from_boxes(boxes);
        debug!(
            target: "fibra-connectivity",
            "Indexed {} {} cell boxes (bucket size {:.1})",
            search.len(),
            set.cell_type(),
            search.index.cell_size()
        );
        Ok(search)
    }

    /// Index precomputed absolute boxes
    pub fn from_boxes(boxes: Vec<(usize, Aabb3)>) -> Self {
        let cell_size = boxes
            .iter()
            .map(|(_, aabb)| aabb.max_extent())
            .fold(0.0_f64, f64::max);
        let mut index = GridIndex::new(cell_size);
        for (i, aabb) in boxes {
            index.insert(i, aabb);
        }
        Self { index }
    }

    /// Cells whose box intersects `region`, ascending
    pub fn candidates(&self, region: &Aabb3) -> Vec<usize> {
        let mut hits = self.index.query(region);
        hits.sort_unstable();
        hits
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

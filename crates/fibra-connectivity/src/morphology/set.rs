// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Placement and morphology sets - the per-cell-type inputs of a connectivity pass.
*/

use std::sync::Arc;

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::cloud::VoxelCloud;
use super::compartment::{describe_types, Compartment, CompartmentType};
use crate::types::{CellId, ConnectivityError, ConnectivityResult, MorphologyIndex, Point3};

/// A placed cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedCell {
    pub id: CellId,
    pub position: Point3,
    pub rotation: Point3,
}

impl PlacedCell {
    pub fn new(id: CellId, position: Point3) -> Self {
        Self {
            id,
            position,
            rotation: [0.0; 3],
        }
    }

    pub fn with_rotation(mut self, rotation: Point3) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Ordered placed cells of one cell type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacementSet {
    pub cell_type: String,
    pub cells: Vec<PlacedCell>,
}

impl PlacementSet {
    pub fn new(cell_type: impl Into<String>, cells: Vec<PlacedCell>) -> Self {
        Self {
            cell_type: cell_type.into(),
            cells,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A complete morphological reconstruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morphology {
    pub name: String,
    pub compartments: Vec<Compartment>,
}

impl Morphology {
    pub fn new(name: impl Into<String>, compartments: Vec<Compartment>) -> Self {
        Self {
            name: name.into(),
            compartments,
        }
    }

    /// Compartments matching the type filter (an empty filter keeps everything)
    pub fn compartments_of(&self, types: &[CompartmentType]) -> Vec<Compartment> {
        self.compartments
            .iter()
            .filter(|c| c.matches(types))
            .cloned()
            .collect()
    }
}

/// A morphology restricted to the compartment types a connection uses
#[derive(Debug)]
pub struct FilteredMorphology {
    name: String,
    compartment_types: Vec<CompartmentType>,
    compartments: Vec<Compartment>,
    grid_size: f64,
    cloud: OnceCell<VoxelCloud>,
}

impl FilteredMorphology {
    /// Filter `morphology`; its voxel cloud is computed on first use
    pub fn new(
        morphology: &Morphology,
        compartment_types: &[CompartmentType],
        grid_size: f64,
    ) -> Self {
        Self {
            name: morphology.name.clone(),
            compartment_types: compartment_types.to_vec(),
            compartments: morphology.compartments_of(compartment_types),
            grid_size,
            cloud: OnceCell::new(),
        }
    }

    /// Filter `morphology` and attach a precomputed voxel cloud
    pub fn with_cloud(
        morphology: &Morphology,
        compartment_types: &[CompartmentType],
        cloud: VoxelCloud,
    ) -> Self {
        let grid_size = cloud.grid_size();
        let filtered = Self::new(morphology, compartment_types, grid_size);
        // Freshly created cell, cannot already be set
        let _ = filtered.cloud.set(cloud);
        filtered
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compartment_types(&self) -> &[CompartmentType] {
        &self.compartment_types
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    /// Voxel cloud of the filtered compartments
    pub fn cloud(&self) -> ConnectivityResult<&VoxelCloud> {
        self.cloud
            .get_or_try_init(|| VoxelCloud::from_compartments(&self.compartments, self.grid_size))
    }

    /// Error unless there is something to connect to
    pub fn assert_voxelization(&self) -> ConnectivityResult<&VoxelCloud> {
        let cloud = self.cloud()?;
        if cloud.is_empty() {
            return Err(self.incomplete());
        }
        Ok(cloud)
    }

    pub(crate) fn incomplete(&self) -> ConnectivityError {
        ConnectivityError::IncompleteMorphology {
            morphology: self.name.clone(),
            compartment_types: describe_types(&self.compartment_types),
        }
    }
}

/// Placed cells of one type paired with their (filtered) morphologies.
///
/// Cells sharing a morphology share one [`FilteredMorphology`]; the set index
/// of that morphology is its position in the morphology map.
#[derive(Debug, Clone)]
pub struct MorphologySet {
    cell_type: String,
    cells: Vec<PlacedCell>,
    morphologies: Vec<Arc<FilteredMorphology>>,
    assignment: Vec<MorphologyIndex>,
}

impl MorphologySet {
    /// Pair each placed cell with the morphology named in `assigned`.
    ///
    /// `library` resolves names; morphologies are numbered in order of first use.
    pub fn build(
        placement: &PlacementSet,
        assigned: &[String],
        library: &AHashMap<String, Morphology>,
        compartment_types: &[CompartmentType],
        grid_size: f64,
    ) -> ConnectivityResult<Self> {
        Self::build_with_clouds(
            placement,
            assigned,
            library,
            &AHashMap::new(),
            compartment_types,
            grid_size,
        )
    }

    /// Like [`build`](Self::build), but morphologies found in `clouds` use that
    /// precomputed voxel cloud instead of voxelizing their filtered compartments.
    pub fn build_with_clouds(
        placement: &PlacementSet,
        assigned: &[String],
        library: &AHashMap<String, Morphology>,
        clouds: &AHashMap<String, VoxelCloud>,
        compartment_types: &[CompartmentType],
        grid_size: f64,
    ) -> ConnectivityResult<Self> {
        if assigned.len() != placement.cells.len() {
            return Err(ConnectivityError::MorphologyAssignment {
                cell_type: placement.cell_type.clone(),
                cells: placement.cells.len(),
                assigned: assigned.len(),
            });
        }

        let mut index_of: AHashMap<&str, MorphologyIndex> = AHashMap::new();
        let mut morphologies = Vec::new();
        let mut assignment = Vec::with_capacity(assigned.len());
        for name in assigned {
            let index = match index_of.get(name.as_str()) {
                Some(&index) => index,
                None => {
                    let morphology = library
                        .get(name)
                        .ok_or_else(|| ConnectivityError::UnknownMorphology(name.clone()))?;
                    let filtered = match clouds.get(name) {
                        Some(cloud) => FilteredMorphology::with_cloud(
                            morphology,
                            compartment_types,
                            cloud.clone(),
                        ),
                        None => FilteredMorphology::new(morphology, compartment_types, grid_size),
                    };
                    morphologies.push(Arc::new(filtered));
                    index_of.insert(name.as_str(), morphologies.len() - 1);
                    morphologies.len() - 1
                }
            };
            assignment.push(index);
        }

        Ok(Self {
            cell_type: placement.cell_type.clone(),
            cells: placement.cells.clone(),
            morphologies,
            assignment,
        })
    }

    /// Assemble a set from parts already resolved by a provider
    pub fn from_parts(
        cell_type: impl Into<String>,
        cells: Vec<PlacedCell>,
        morphologies: Vec<Arc<FilteredMorphology>>,
        assignment: Vec<MorphologyIndex>,
    ) -> ConnectivityResult<Self> {
        let cell_type = cell_type.into();
        if assignment.len() != cells.len() || assignment.iter().any(|&i| i >= morphologies.len()) {
            return Err(ConnectivityError::MorphologyAssignment {
                cell_type,
                cells: cells.len(),
                assigned: assignment.len(),
            });
        }
        Ok(Self {
            cell_type,
            cells,
            morphologies,
            assignment,
        })
    }

    pub fn cell_type(&self) -> &str {
        &self.cell_type
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell `index` with its morphology and that morphology's set index
    pub fn get(&self, index: usize) -> (&PlacedCell, &FilteredMorphology, MorphologyIndex) {
        let set_index = self.assignment[index];
        (&self.cells[index], &self.morphologies[set_index], set_index)
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&PlacedCell, &FilteredMorphology, MorphologyIndex)> {
        (0..self.cells.len()).map(move |i| self.get(i))
    }

    /// Distinct morphologies used by this set, by set index
    pub fn morphologies(&self) -> &[Arc<FilteredMorphology>] {
        &self.morphologies
    }

    /// Morphology names by set index
    pub fn morphology_map(&self) -> Vec<String> {
        self.morphologies.iter().map(|m| m.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> AHashMap<String, Morphology> {
        let mut lib = AHashMap::new();
        lib.insert(
            "purkinje".to_string(),
            Morphology::new(
                "purkinje",
                vec![
                    Compartment::new(0, CompartmentType::Soma, [0.0; 3], [1.0, 0.0, 0.0], None),
                    Compartment::new(
                        1,
                        CompartmentType::Dendrites,
                        [1.0, 0.0, 0.0],
                        [1.0, 30.0, 0.0],
                        Some(0),
                    ),
                ],
            ),
        );
        lib.insert(
            "stub".to_string(),
            Morphology::new(
                "stub",
                vec![Compartment::new(0, CompartmentType::Soma, [0.0; 3], [1.0, 0.0, 0.0], None)],
            ),
        );
        lib
    }

    fn placement(n: usize) -> PlacementSet {
        PlacementSet::new(
            "purkinje_cell",
            (0..n).map(|i| PlacedCell::new(100 + i as u64, [i as f64 * 50.0, 0.0, 0.0])).collect(),
        )
    }

    #[test]
    fn test_shared_morphology_index() {
        let names = vec!["purkinje".to_string(), "stub".to_string(), "purkinje".to_string()];
        let set = MorphologySet::build(&placement(3), &names, &library(), &[], 10.0).unwrap();
        assert_eq!(set.morphology_map(), vec!["purkinje".to_string(), "stub".to_string()]);
        let indices: Vec<usize> = set.iter().map(|(_, _, i)| i).collect();
        assert_eq!(indices, vec![0, 1, 0]);
        assert_eq!(set.get(2).0.id, 102);
    }

    #[test]
    fn test_filter_and_lazy_cloud() {
        let names = vec!["purkinje".to_string()];
        let dendrites = [CompartmentType::Dendrites];
        let set =
            MorphologySet::build(&placement(1), &names, &library(), &dendrites, 10.0).unwrap();
        let (_, morphology, _) = set.get(0);
        assert_eq!(morphology.compartments().len(), 1);
        let cloud = morphology.assert_voxelization().unwrap();
        assert_eq!(cloud.voxels(), &[[0, 3, 0]]);
    }

    #[test]
    fn test_missing_compartment_types_is_incomplete() {
        let names = vec!["stub".to_string()];
        let dendrites = [CompartmentType::Dendrites];
        let set =
            MorphologySet::build(&placement(1), &names, &library(), &dendrites, 10.0).unwrap();
        let err = set.get(0).1.assert_voxelization().unwrap_err();
        assert!(matches!(err, ConnectivityError::IncompleteMorphology { .. }));
        assert!(err.to_string().contains("dendrites"));
    }

    #[test]
    fn test_unknown_morphology() {
        let names = vec!["granule".to_string()];
        let err = MorphologySet::build(&placement(1), &names, &library(), &[], 10.0).unwrap_err();
        assert!(matches!(err, ConnectivityError::UnknownMorphology(name) if name == "granule"));
    }

    #[test]
    fn test_assignment_length_mismatch() {
        let names = vec!["stub".to_string()];
        let err = MorphologySet::build(&placement(2), &names, &library(), &[], 10.0).unwrap_err();
        assert!(matches!(
            err,
            ConnectivityError::MorphologyAssignment {
                cells: 2,
                assigned: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_precomputed_cloud_is_used() {
        let lib = library();
        let cloud = VoxelCloud::new(5.0, vec![[9, 9, 9]], vec![vec![42]]).unwrap();
        let filtered = FilteredMorphology::with_cloud(lib.get("stub").unwrap(), &[], cloud.clone());
        assert_eq!(filtered.cloud().unwrap(), &cloud);
    }
}

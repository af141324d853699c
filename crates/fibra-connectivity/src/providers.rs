// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Collaborator interfaces of a connectivity pass, with in-memory implementations.

A pass reads placed cells from a [`PlacementProvider`], resolves their
morphologies through a [`MorphologyProvider`] and hands its table to a
[`ConnectivitySink`]. [`InMemoryNetwork`] and [`MemorySink`] keep everything
in memory.
*/

use ahash::AHashMap;

use crate::connectivity::ConnectivityTable;
use crate::morphology::{
    CompartmentType, Morphology, MorphologySet, PlacedCell, PlacementSet, VoxelCloud,
};
use crate::types::{ConnectivityError, ConnectivityResult};

/// Source of placed cells
pub trait PlacementProvider {
    /// Ordered placed cells of `cell_type`
    fn placement_set(&self, cell_type: &str) -> ConnectivityResult<PlacementSet>;
}

/// Source of per-cell morphologies
pub trait MorphologyProvider {
    /// Morphologies of the cells in `placement`, filtered to `compartment_types`
    fn morphology_set(
        &self,
        placement: &PlacementSet,
        compartment_types: &[CompartmentType],
    ) -> ConnectivityResult<MorphologySet>;
}

/// Consumer of connectivity tables
pub trait ConnectivitySink {
    fn connect_cells(&mut self, name: &str, table: ConnectivityTable) -> ConnectivityResult<()>;
}

/// Cell types, placements and morphologies held in memory
#[derive(Debug, Clone)]
pub struct InMemoryNetwork {
    placements: AHashMap<String, Vec<PlacedCell>>,
    assignments: AHashMap<String, Vec<String>>,
    morphologies: AHashMap<String, Morphology>,
    clouds: AHashMap<String, VoxelCloud>,
    grid_size: f64,
}

impl InMemoryNetwork {
    /// Empty network whose lazily computed clouds use `grid_size`
    pub fn new(grid_size: f64) -> Self {
        Self {
            placements: AHashMap::new(),
            assignments: AHashMap::new(),
            morphologies: AHashMap::new(),
            clouds: AHashMap::new(),
            grid_size,
        }
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Register a morphology in the library
    pub fn add_morphology(&mut self, morphology: Morphology) -> &mut Self {
        self.morphologies.insert(morphology.name.clone(), morphology);
        self
    }

    /// Attach a precomputed voxel cloud to a morphology
    pub fn add_voxel_cloud(
        &mut self,
        morphology: impl Into<String>,
        cloud: VoxelCloud,
    ) -> &mut Self {
        self.clouds.insert(morphology.into(), cloud);
        self
    }

    /// Place cells of `cell_type`, each paired with the morphology name at the same position
    pub fn place_cells(
        &mut self,
        cell_type: impl Into<String>,
        cells: Vec<PlacedCell>,
        morphologies: Vec<String>,
    ) -> ConnectivityResult<&mut Self> {
        let cell_type = cell_type.into();
        if cells.len() != morphologies.len() {
            return Err(ConnectivityError::MorphologyAssignment {
                cell_type,
                cells: cells.len(),
                assigned: morphologies.len(),
            });
        }
        self.placements.insert(cell_type.clone(), cells);
        self.assignments.insert(cell_type, morphologies);
        Ok(self)
    }

    /// Registered cell types, sorted
    pub fn cell_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.placements.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl PlacementProvider for InMemoryNetwork {
    fn placement_set(&self, cell_type: &str) -> ConnectivityResult<PlacementSet> {
        self.placements
            .get(cell_type)
            .map(|cells| PlacementSet::new(cell_type, cells.clone()))
            .ok_or_else(|| ConnectivityError::UnknownCellType(cell_type.to_string()))
    }
}

impl MorphologyProvider for InMemoryNetwork {
    fn morphology_set(
        &self,
        placement: &PlacementSet,
        compartment_types: &[CompartmentType],
    ) -> ConnectivityResult<MorphologySet> {
        let assigned = self
            .assignments
            .get(&placement.cell_type)
            .ok_or_else(|| ConnectivityError::UnknownCellType(placement.cell_type.clone()))?;
        MorphologySet::build_with_clouds(
            placement,
            assigned,
            &self.morphologies,
            &self.clouds,
            compartment_types,
            self.grid_size,
        )
    }
}

/// Sink collecting tables by connection name
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: AHashMap<String, ConnectivityTable>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ConnectivityTable> {
        self.tables.get(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn into_tables(self) -> AHashMap<String, ConnectivityTable> {
        self.tables
    }
}

impl ConnectivitySink for MemorySink {
    fn connect_cells(&mut self, name: &str, table: ConnectivityTable) -> ConnectivityResult<()> {
        if self.tables.contains_key(name) {
            return Err(ConnectivityError::Sink(format!(
                "connection '{}' was already stored",
                name
            )));
        }
        self.tables.insert(name.to_string(), table);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::Compartment;

    fn network() -> InMemoryNetwork {
        let mut net = InMemoryNetwork::new(10.0);
        net.add_morphology(Morphology::new(
            "granule",
            vec![Compartment::new(0, CompartmentType::Soma, [0.0; 3], [1.0, 1.0, 1.0], None)],
        ));
        net.place_cells(
            "granule_cell",
            vec![PlacedCell::new(1, [0.0; 3]), PlacedCell::new(2, [20.0, 0.0, 0.0])],
            vec!["granule".to_string(), "granule".to_string()],
        )
        .unwrap();
        net
    }

    #[test]
    fn test_placement_lookup() {
        let net = network();
        let placement = net.placement_set("granule_cell").unwrap();
        assert_eq!(placement.len(), 2);
        assert!(matches!(
            net.placement_set("golgi_cell"),
            Err(ConnectivityError::UnknownCellType(_))
        ));
        assert_eq!(net.cell_types(), vec!["granule_cell"]);
    }

    #[test]
    fn test_morphology_set_uses_precomputed_cloud() {
        let mut net = network();
        let cloud = VoxelCloud::new(10.0, vec![[4, 4, 4]], vec![vec![0]]).unwrap();
        net.add_voxel_cloud("granule", cloud.clone());
        let placement = net.placement_set("granule_cell").unwrap();
        let set = net.morphology_set(&placement, &[]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).1.cloud().unwrap(), &cloud);
    }

    #[test]
    fn test_mismatched_placement_is_rejected() {
        let mut net = InMemoryNetwork::new(10.0);
        let result = net.place_cells("x", vec![PlacedCell::new(1, [0.0; 3])], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sink_rejects_duplicate_names() {
        let mut sink = MemorySink::new();
        sink.connect_cells("pf_to_pc", ConnectivityTable::default()).unwrap();
        assert!(sink.connect_cells("pf_to_pc", ConnectivityTable::default()).is_err());
        assert_eq!(sink.len(), 1);
        assert!(sink.get("pf_to_pc").unwrap().is_empty());
    }
}

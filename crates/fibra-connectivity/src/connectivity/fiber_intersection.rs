// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Fiber intersection connectivity.

For every presynaptic cell:
1. build the fiber (branch forest) from the selected compartments
2. interpolate to the spatial resolution
3. transform
4. interpolate again
5. voxelize, growing the fiber's bounding box
6. find postsynaptic cells whose box intersects the fiber box
7. per candidate: affinity gate, voxel intersection, sample one contact

All contacts are gathered into one table with the joined morphology map and
handed to the sink under the connection's name.
*/

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use fibra_config::{ConnectionConfig, SystemConfig, TransformConfig};
use tracing::{debug, info};

use super::candidates::CandidateSearch;
use super::intersection::intersect_voxel_tree;
use super::interpolation::interpolate_branches;
use super::sampler::ConnectionSampler;
use super::table::{ConnectionRecord, ConnectivityStats, ConnectivityTable};
use super::transform::{BranchTransform, FiberTransform, QuiverTransform};
use super::voxelizer::voxelize;
use crate::cancellation::CancellationToken;
use crate::morphology::{CompartmentType, FiberMorphology, MorphologySet};
use crate::providers::{ConnectivitySink, MorphologyProvider, PlacementProvider};
use crate::rng::{cell_rng, pass_seed};
use crate::spatial::Aabb3;
use crate::types::{add, ConnectivityError, ConnectivityResult};

/// Default probability that a candidate pair may connect
pub const DEFAULT_AFFINITY: f64 = 1.0;
/// Default maximum compartment length after interpolation
pub const DEFAULT_RESOLUTION: f64 = 20.0;
/// Default fiber voxel edge length
pub const DEFAULT_VOXEL_SIZE: f64 = 20.0;

/// Validated numeric parameters of a fiber intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiberIntersectionParams {
    affinity: f64,
    resolution: f64,
    voxel_size: f64,
}

impl FiberIntersectionParams {
    pub fn new(affinity: f64, resolution: f64, voxel_size: f64) -> ConnectivityResult<Self> {
        if !(0.0..=1.0).contains(&affinity) {
            return Err(ConnectivityError::InvalidParameter(format!(
                "affinity must be within [0, 1], got {}",
                affinity
            )));
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(ConnectivityError::InvalidParameter(format!(
                "resolution must be positive, got {}",
                resolution
            )));
        }
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(ConnectivityError::InvalidParameter(format!(
                "voxel_size must be positive, got {}",
                voxel_size
            )));
        }
        Ok(Self {
            affinity,
            resolution,
            voxel_size,
        })
    }

    pub fn affinity(&self) -> f64 {
        self.affinity
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }
}

impl Default for FiberIntersectionParams {
    fn default() -> Self {
        Self {
            affinity: DEFAULT_AFFINITY,
            resolution: DEFAULT_RESOLUTION,
            voxel_size: DEFAULT_VOXEL_SIZE,
        }
    }
}

/// A cell type and the compartment types a connection uses from it
#[derive(Debug, Clone, PartialEq)]
pub struct CellTypeSelection {
    pub cell_type: String,
    /// Empty selects every compartment
    pub compartments: Vec<CompartmentType>,
}

impl CellTypeSelection {
    pub fn new(cell_type: impl Into<String>, compartments: Vec<CompartmentType>) -> Self {
        Self {
            cell_type: cell_type.into(),
            compartments,
        }
    }
}

/// Contacts of one presynaptic cell
#[derive(Debug, Default)]
struct CellOutcome {
    records: Vec<ConnectionRecord>,
    candidate_pairs: usize,
}

/// Fiber intersection connection between two cell types
#[derive(Debug, Clone)]
pub struct FiberIntersection {
    name: String,
    from: CellTypeSelection,
    to: CellTypeSelection,
    params: FiberIntersectionParams,
    transform: FiberTransform,
    seed: Option<u64>,
    parallel: bool,
}

impl FiberIntersection {
    pub fn new(name: impl Into<String>, from: CellTypeSelection, to: CellTypeSelection) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            params: FiberIntersectionParams::default(),
            transform: FiberTransform::Identity,
            seed: None,
            parallel: true,
        }
    }

    /// Build from validated configuration
    pub fn from_config(
        connection: &ConnectionConfig,
        system: &SystemConfig,
    ) -> ConnectivityResult<Self> {
        let params = FiberIntersectionParams::new(
            connection.affinity,
            connection.resolution,
            connection.voxel_size,
        )?;
        let transform = match &connection.transform {
            TransformConfig::Identity => FiberTransform::Identity,
            TransformConfig::Quiver { vol_res, quivers } => FiberTransform::Quiver(QuiverTransform {
                vol_res: *vol_res,
                quivers: *quivers,
            }),
        };
        let parse = |names: &[String]| -> Vec<CompartmentType> {
            names.iter().map(|n| CompartmentType::from(n.as_str())).collect()
        };

        Ok(Self::new(
            connection.name.clone(),
            CellTypeSelection::new(
                connection.from_cell_type.clone(),
                parse(&connection.from_compartments),
            ),
            CellTypeSelection::new(
                connection.to_cell_type.clone(),
                parse(&connection.to_compartments),
            ),
        )
        .with_params(params)
        .with_transform(transform)
        .with_parallel(system.parallel)
        .with_seed_opt(system.seed))
    }

    pub fn with_params(mut self, params: FiberIntersectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_transform(mut self, transform: FiberTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn with_seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Process presynaptic cells on the rayon pool (ignored without the `parallel` feature)
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn from(&self) -> &CellTypeSelection {
        &self.from
    }

    pub fn to(&self) -> &CellTypeSelection {
        &self.to
    }

    pub fn params(&self) -> &FiberIntersectionParams {
        &self.params
    }

    pub fn transform(&self) -> &FiberTransform {
        &self.transform
    }

    /// Resolve both cell types through `network`, connect them and store the table in `sink`
    pub fn connect<N, S>(
        &self,
        network: &N,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> ConnectivityResult<ConnectivityStats>
    where
        N: PlacementProvider + MorphologyProvider + ?Sized,
        S: ConnectivitySink + ?Sized,
    {
        self.transform.validate()?;
        let from_placement = network.placement_set(&self.from.cell_type)?;
        let to_placement = network.placement_set(&self.to.cell_type)?;
        let from_set = network.morphology_set(&from_placement, &self.from.compartments)?;
        let to_set = network.morphology_set(&to_placement, &self.to.compartments)?;

        let (table, stats) = self.connect_sets(&from_set, &to_set, cancel)?;
        sink.connect_cells(&self.name, table)?;
        Ok(stats)
    }

    /// Connect two resolved morphology sets
    pub fn connect_sets(
        &self,
        from: &MorphologySet,
        to: &MorphologySet,
        cancel: &CancellationToken,
    ) -> ConnectivityResult<(ConnectivityTable, ConnectivityStats)> {
        let start = Instant::now();
        self.transform.validate()?;
        let sampler = ConnectionSampler::new(self.params.affinity)?;
        let seed = pass_seed(self.seed);

        info!(
            target: "fibra-connectivity",
            "Connecting {} ({} {} cells -> {} {} cells, seed {})",
            self.name,
            from.len(),
            from.cell_type(),
            to.len(),
            to.cell_type(),
            seed
        );

        let search = CandidateSearch::build(to)?;
        let outcomes = self.run_cells(from, to, &search, &sampler, seed, cancel)?;

        let candidate_pairs = outcomes.iter().map(|o| o.candidate_pairs).sum();
        let records: Vec<ConnectionRecord> = outcomes.into_iter().flat_map(|o| o.records).collect();
        let table =
            ConnectivityTable::from_records(&records, &from.morphology_map(), &to.morphology_map());

        let stats = ConnectivityStats {
            presynaptic_cells: from.len(),
            candidate_pairs,
            connections: table.len(),
            duration: start.elapsed(),
        };
        info!(
            target: "fibra-connectivity",
            "Connected {}: {} connections from {} candidate pairs in {:?}",
            self.name,
            stats.connections,
            stats.candidate_pairs,
            stats.duration
        );
        Ok((table, stats))
    }

    fn run_cells(
        &self,
        from: &MorphologySet,
        to: &MorphologySet,
        search: &CandidateSearch,
        sampler: &ConnectionSampler,
        seed: u64,
        cancel: &CancellationToken,
    ) -> ConnectivityResult<Vec<CellOutcome>> {
        let total = from.len();
        let processed = AtomicUsize::new(0);
        let process = |index: usize| -> ConnectivityResult<CellOutcome> {
            if cancel.is_cancelled() {
                return Err(ConnectivityError::Cancelled {
                    processed: processed.load(Ordering::Relaxed),
                    total,
                });
            }
            let outcome = self.connect_cell(index, from, to, search, sampler, seed)?;
            processed.fetch_add(1, Ordering::Relaxed);
            Ok(outcome)
        };

        #[cfg(feature = "parallel")]
        if self.parallel {
            use rayon::prelude::*;
            return (0..total).into_par_iter().map(process).collect();
        }

        (0..total).map(process).collect()
    }

    /// Steps 1-7 for presynaptic cell `index`
    fn connect_cell(
        &self,
        index: usize,
        from: &MorphologySet,
        to: &MorphologySet,
        search: &CandidateSearch,
        sampler: &ConnectionSampler,
        seed: u64,
    ) -> ConnectivityResult<CellOutcome> {
        let (cell, morphology, pre_morphology) = from.get(index);

        let mut fiber =
            FiberMorphology::from_compartments(morphology.compartments(), cell.rotation);
        interpolate_branches(&mut fiber.root_branches, self.params.resolution);
        self.transform.transform_branches(&mut fiber.root_branches, cell.position)?;
        interpolate_branches(&mut fiber.root_branches, self.params.resolution);

        let origin = fiber.origin().ok_or_else(|| morphology.incomplete())?;
        let voxels = voxelize(
            &fiber.root_branches,
            cell.position,
            Aabb3::from_point(add(origin, cell.position)),
            self.params.voxel_size,
        )?;

        let partners = search.candidates(voxels.bounding_box());
        let mut rng = cell_rng(seed, cell.id);
        let mut outcome = CellOutcome::default();
        for partner in partners {
            if !sampler.passes_affinity(&mut rng) {
                continue;
            }
            outcome.candidate_pairs += 1;

            let (post_cell, post_morphology, post_index) = to.get(partner);
            let cloud = post_morphology.cloud()?;
            let overlap = intersect_voxel_tree(voxels.index(), cloud, post_cell.position);
            if overlap.is_empty() {
                continue;
            }
            if let Some(contact) = sampler.choose(&overlap, &voxels, cloud, &mut rng) {
                outcome.records.push(ConnectionRecord {
                    pre_cell: cell.id,
                    post_cell: post_cell.id,
                    pre_compartment: contact.pre_compartment,
                    post_compartment: contact.post_compartment,
                    pre_morphology,
                    post_morphology: post_index,
                });
            }
        }

        debug!(
            target: "fibra-connectivity",
            "Cell {}: {} voxels, {} contacts",
            cell.id,
            voxels.len(),
            outcome.records.len()
        );
        Ok(outcome)
    }
}

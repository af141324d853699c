// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connection records and the table handed to a connectivity sink.
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{CellId, CompartmentId, MorphologyIndex};

/// One sampled connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub pre_cell: CellId,
    pub post_cell: CellId,
    pub pre_compartment: CompartmentId,
    pub post_compartment: CompartmentId,
    /// Index into the presynaptic morphology map
    pub pre_morphology: MorphologyIndex,
    /// Index into the postsynaptic morphology map (not yet offset)
    pub post_morphology: MorphologyIndex,
}

/// Columnar connections of one pass.
///
/// Morphology indices refer to `morphology_map`, which lists the presynaptic
/// map followed by the postsynaptic one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectivityTable {
    pub connections: Vec<[CellId; 2]>,
    pub compartments: Vec<[CompartmentId; 2]>,
    pub morphologies: Vec<[MorphologyIndex; 2]>,
    pub morphology_map: Vec<String>,
}

impl ConnectivityTable {
    /// Assemble a table, offsetting postsynaptic morphology indices by the
    /// length of the presynaptic map.
    pub fn from_records(
        records: &[ConnectionRecord],
        pre_map: &[String],
        post_map: &[String],
    ) -> Self {
        let offset = pre_map.len();
        let mut morphology_map = Vec::with_capacity(pre_map.len() + post_map.len());
        morphology_map.extend_from_slice(pre_map);
        morphology_map.extend_from_slice(post_map);

        Self {
            connections: records.iter().map(|r| [r.pre_cell, r.post_cell]).collect(),
            compartments: records
                .iter()
                .map(|r| [r.pre_compartment, r.post_compartment])
                .collect(),
            morphologies: records
                .iter()
                .map(|r| [r.pre_morphology, offset + r.post_morphology])
                .collect(),
            morphology_map,
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Morphology names of connection `i` (pre, post)
    pub fn morphology_names(&self, i: usize) -> Option<(&str, &str)> {
        let [pre, post] = *self.morphologies.get(i)?;
        Some((
            self.morphology_map.get(pre)?.as_str(),
            self.morphology_map.get(post)?.as_str(),
        ))
    }
}

/// Summary of a connectivity pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityStats {
    pub presynaptic_cells: usize,
    /// Candidate pairs that passed the affinity gate and were voxel-tested
    pub candidate_pairs: usize,
    pub connections: usize,
    pub duration: Duration,
}

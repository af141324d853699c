// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Morphology data model: compartments, branch trees, voxel clouds and the
per-cell-type sets a connectivity pass consumes.
*/

pub mod branch;
pub mod cloud;
pub mod compartment;
pub mod fiber;
pub mod set;

pub use branch::Branch;
pub use cloud::{voxel_key, voxel_origin, VoxelCloud};
pub use compartment::{describe_types, Compartment, CompartmentType};
pub use fiber::FiberMorphology;
pub use set::{FilteredMorphology, Morphology, MorphologySet, PlacedCell, PlacementSet};

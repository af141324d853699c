// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Core types for fiber intersection connectivity.
*/

/// Stable identifier of a placed cell
pub type CellId = u64;

/// Stable identifier of a compartment within its morphology
pub type CompartmentId = u64;

/// Index of a morphology within a morphology set's map
pub type MorphologyIndex = usize;

/// 3D point or vector (x, y, z) in micrometers
pub type Point3 = [f64; 3];

/// Result type for connectivity operations
pub type ConnectivityResult<T> = Result<T, ConnectivityError>;

/// Errors that can occur during a connectivity pass
#[derive(Debug, thiserror::Error)]
pub enum ConnectivityError {
    #[error("Can't intersect without any {compartment_types} in the {morphology} morphology")]
    IncompleteMorphology {
        morphology: String,
        compartment_types: String,
    },

    #[error("Transform not supported: {0}")]
    UnsupportedTransform(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown cell type: {0}")]
    UnknownCellType(String),

    #[error("Unknown morphology: {0}")]
    UnknownMorphology(String),

    #[error("Morphology assignment mismatch for {cell_type}: {cells} cells, {assigned} morphologies")]
    MorphologyAssignment {
        cell_type: String,
        cells: usize,
        assigned: usize,
    },

    #[error("Invalid voxel cloud: {0}")]
    InvalidVoxelCloud(String),

    #[error("Out of bounds: voxel {voxel:?} cannot be encoded")]
    OutOfBounds { voxel: [i64; 3] },

    #[error("Connectivity pass cancelled after {processed} of {total} presynaptic cells")]
    Cancelled { processed: usize, total: usize },

    #[error("Connectivity sink error: {0}")]
    Sink(String),
}

impl From<fibra_config::ConfigError> for ConnectivityError {
    fn from(err: fibra_config::ConfigError) -> Self {
        ConnectivityError::InvalidParameter(err.to_string())
    }
}

/// Component-wise `a + b`
#[inline]
pub fn add(a: Point3, b: Point3) -> Point3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Component-wise `a - b`
#[inline]
pub fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Point3, b: Point3) -> f64 {
    let d = sub(b, a);
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

/// Linear interpolation from `a` to `b` at fraction `t`
#[inline]
pub fn lerp(a: Point3, b: Point3, t: f64) -> Point3 {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

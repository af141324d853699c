// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines the configuration structs that map to sections in
//! `fibra.toml`:
//!
//! ```toml
//! [system]
//! seed = 42
//! parallel = true
//!
//! [logging]
//! level = "info"
//!
//! [[connections]]
//! name = "parallel_fiber_to_purkinje"
//! from_cell_type = "granule_cell"
//! to_cell_type = "purkinje_cell"
//! from_compartments = ["parallel_fiber"]
//! to_compartments = ["dendrites"]
//! affinity = 0.1
//! resolution = 20.0
//! transform = { kind = "identity" }
//! ```

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FibraConfig {
    pub system: SystemConfig,
    pub logging: LoggingConfig,
    pub connections: Vec<ConnectionConfig>,
}

impl FibraConfig {
    /// Connection with the given name
    pub fn connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// Mutable connection with the given name
    pub fn connection_mut(&mut self, name: &str) -> Option<&mut ConnectionConfig> {
        self.connections.iter_mut().find(|c| c.name == name)
    }
}

/// System-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Seed of every connectivity pass; a fresh seed is drawn per pass when absent
    pub seed: Option<u64>,
    /// Process presynaptic cells in parallel
    pub parallel: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            seed: None,
            parallel: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level (trace, debug, info, warn, error)
    pub level: String,
    /// Crates logged at debug level, e.g. `["fibra-connectivity"]`
    pub debug_crates: Vec<String>,
    /// Write per-run log files in addition to the console
    pub file_logging: bool,
    /// Base directory of per-run log folders
    pub log_dir: String,
    /// Remove run folders older than this many days
    pub retention_days: u64,
    /// Keep at most this many run folders
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug_crates: Vec::new(),
            file_logging: false,
            log_dir: "./logs".to_string(),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

/// One fiber intersection connection between two cell types
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub name: String,
    pub from_cell_type: String,
    pub to_cell_type: String,
    /// Presynaptic compartment types (empty selects all)
    pub from_compartments: Vec<String>,
    /// Postsynaptic compartment types (empty selects all)
    pub to_compartments: Vec<String>,
    /// Probability that a candidate pair may connect, in [0, 1]
    pub affinity: f64,
    /// Maximum compartment length after interpolation
    pub resolution: f64,
    /// Edge length of fiber voxels
    pub voxel_size: f64,
    pub transform: TransformConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            from_cell_type: String::new(),
            to_cell_type: String::new(),
            from_compartments: Vec::new(),
            to_compartments: Vec::new(),
            affinity: 1.0,
            resolution: 20.0,
            voxel_size: 20.0,
            transform: TransformConfig::Identity,
        }
    }
}

/// Fiber transform selection
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformConfig {
    #[default]
    Identity,
    /// Orientation-field warp for parallel fibers
    Quiver {
        #[serde(default = "default_vol_res")]
        vol_res: f64,
        #[serde(default = "default_quivers")]
        quivers: [f64; 3],
    },
}

fn default_vol_res() -> f64 {
    1.0
}

fn default_quivers() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

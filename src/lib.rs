// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Fibra - fiber intersection connectivity
//!
//! Fibra connects populations of placed neuron reconstructions wherever the
//! voxelized fibers of presynaptic cells overlap the voxel clouds of
//! postsynaptic cells. One synapse is sampled per overlapping cell pair,
//! weighted by local compartment density.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! fibra = "0.1"  # Default: parallel
//! ```
//!
//! ## Feature Flags
//!
//! - **`parallel`** (default): presynaptic cells processed on rayon
//! - **`file-logging`**: per-run JSON log files with retention cleanup
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fibra::prelude::*;
//!
//! let config = load_config(None, None)?;
//! let network = InMemoryNetwork::new(10.0);
//! let mut sink = MemorySink::new();
//!
//! let _logging = fibra::init_logging_from_config(&config.logging)?;
//! for report in run_connections(&config, &network, &mut sink, &CancellationToken::new())? {
//!     println!("{}: {} connections", report.name, report.stats.connections);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: fibra-config                               │
//! │  (fibra.toml, env/CLI overrides, validation)            │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: fibra-connectivity                         │
//! │  (interpolate, voxelize, intersect, sample)             │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Collaborators: providers and sinks                     │
//! │  (placements, morphologies, connectivity storage)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

use tracing::info;

// Re-export member crates
pub use fibra_config as config;
pub use fibra_connectivity as connectivity;
pub use fibra_observability as observability;

use fibra_config::{validate_config, FibraConfig, LoggingConfig};
use fibra_connectivity::{
    CancellationToken, ConnectivityResult, ConnectivitySink, ConnectivityStats, FiberIntersection,
    MorphologyProvider, PlacementProvider,
};
use fibra_observability::CrateDebugFlags;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::{run_connections, ConnectionReport};

    pub use fibra_config::{load_config, validate_config, ConnectionConfig, FibraConfig};
    pub use fibra_connectivity::{
        CancellationToken, CellTypeSelection, Compartment, CompartmentType, ConnectivityError,
        ConnectivityResult, ConnectivitySink, ConnectivityStats, ConnectivityTable,
        FiberIntersection, FiberIntersectionParams, InMemoryNetwork, MemorySink, Morphology,
        MorphologyProvider, PlacedCell, PlacementProvider, VoxelCloud,
    };
}

/// Outcome of one configured connection
#[derive(Debug, Clone)]
pub struct ConnectionReport {
    pub name: String,
    pub stats: ConnectivityStats,
}

/// Validate `config` and run every configured connection in order
///
/// Each table is handed to `sink` under its connection name. Validation
/// problems are reported before any pass runs; a failing pass stops the run.
pub fn run_connections<N, S>(
    config: &FibraConfig,
    network: &N,
    sink: &mut S,
    cancel: &CancellationToken,
) -> ConnectivityResult<Vec<ConnectionReport>>
where
    N: PlacementProvider + MorphologyProvider + ?Sized,
    S: ConnectivitySink + ?Sized,
{
    validate_config(config)?;

    let strategies = config
        .connections
        .iter()
        .map(|connection| FiberIntersection::from_config(connection, &config.system))
        .collect::<ConnectivityResult<Vec<_>>>()?;

    info!(target: "fibra", "Running {} connection(s)", strategies.len());

    let mut reports = Vec::with_capacity(strategies.len());
    for strategy in &strategies {
        let stats = strategy.connect(network, sink, cancel)?;
        reports.push(ConnectionReport {
            name: strategy.name().to_string(),
            stats,
        });
    }
    Ok(reports)
}

/// Debug flags from the logging section, plus `--debug-*` arguments and `FIBRA_DEBUG`
pub fn debug_flags_from_config(logging: &LoggingConfig) -> CrateDebugFlags {
    let mut flags = fibra_observability::parse_debug_flags();
    for crate_name in &logging.debug_crates {
        flags.enable(crate_name);
    }
    flags
}

/// Keeps file writers alive when file logging is active
pub struct LoggingHandle {
    #[cfg(feature = "file-logging")]
    _guard: Option<fibra_observability::LoggingGuard>,
}

/// Install the global subscriber described by the logging section
///
/// Without the `file-logging` feature, `file_logging = true` falls back to
/// console output.
pub fn init_logging_from_config(logging: &LoggingConfig) -> anyhow::Result<LoggingHandle> {
    let flags = debug_flags_from_config(logging);

    #[cfg(feature = "file-logging")]
    if logging.file_logging {
        let guard = fibra_observability::init_logging(
            &flags,
            &logging.level,
            Some(logging.log_dir.clone().into()),
            Some(logging.retention_days),
            Some(logging.retention_runs),
        )?;
        return Ok(LoggingHandle { _guard: Some(guard) });
    }

    fibra_observability::init_console_logging(&flags, &logging.level)?;
    Ok(LoggingHandle {
        #[cfg(feature = "file-logging")]
        _guard: None,
    })
}

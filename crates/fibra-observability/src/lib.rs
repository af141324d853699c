// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # fibra-observability
//!
//! Logging infrastructure for fibra with per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: per-run log folders with per-crate JSON files and retention cleanup

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known fibra log targets for debug flags
pub const KNOWN_CRATES: &[&str] = &["fibra", "fibra-connectivity", "fibra-config"];

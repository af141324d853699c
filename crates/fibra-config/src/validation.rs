// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that connection parameters are within range, required fields are
//! present, names are unique and requested transforms can run. Every problem
//! is collected and reported in a single error.

use std::collections::HashSet;

use crate::{ConfigError, ConfigResult, ConnectionConfig, FibraConfig, TransformConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    DuplicateConnection { name: String },
    UnsupportedTransform { connection: String, transform: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::DuplicateConnection { name } => {
                write!(f, "Connection '{}' is defined more than once", name)
            }
            Self::UnsupportedTransform {
                connection,
                transform,
            } => {
                write!(
                    f,
                    "Connection '{}' uses the {} transform, which is not implemented",
                    connection, transform
                )
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &FibraConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_logging(config, &mut errors);
    validate_unique_names(config, &mut errors);
    for (i, connection) in config.connections.iter().enumerate() {
        validate_connection(i, connection, &mut errors);
    }

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_logging(config: &FibraConfig, errors: &mut Vec<ConfigValidationError>) {
    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                config.logging.level
            ),
        });
    }
}

fn validate_unique_names(config: &FibraConfig, errors: &mut Vec<ConfigValidationError>) {
    let mut seen = HashSet::new();
    for connection in &config.connections {
        if !connection.name.is_empty() && !seen.insert(connection.name.as_str()) {
            errors.push(ConfigValidationError::DuplicateConnection {
                name: connection.name.clone(),
            });
        }
    }
}

fn validate_connection(
    index: usize,
    connection: &ConnectionConfig,
    errors: &mut Vec<ConfigValidationError>,
) {
    let label = if connection.name.is_empty() {
        format!("connections[{}]", index)
    } else {
        connection.name.clone()
    };

    for (field, value) in [
        ("name", &connection.name),
        ("from_cell_type", &connection.from_cell_type),
        ("to_cell_type", &connection.to_cell_type),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: format!("{}.{}", label, field),
            });
        }
    }

    if !(0.0..=1.0).contains(&connection.affinity) {
        errors.push(ConfigValidationError::InvalidValue {
            field: format!("{}.affinity", label),
            reason: format!("must be within [0, 1], got {}", connection.affinity),
        });
    }
    for (field, value) in [
        ("resolution", connection.resolution),
        ("voxel_size", connection.voxel_size),
    ] {
        if !(value.is_finite() && value > 0.0) {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("{}.{}", label, field),
                reason: format!("must be positive, got {}", value),
            });
        }
    }

    if let TransformConfig::Quiver { .. } = connection.transform {
        errors.push(ConfigValidationError::UnsupportedTransform {
            connection: label,
            transform: "quiver".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(name: &str) -> ConnectionConfig {
        ConnectionConfig {
            name: name.to_string(),
            from_cell_type: "granule_cell".to_string(),
            to_cell_type: "purkinje_cell".to_string(),
            ..ConnectionConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&FibraConfig::default()).is_ok());
    }

    #[test]
    fn test_valid_connection() {
        let mut config = FibraConfig::default();
        config.connections.push(connection("pf_to_pc"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_all_errors_are_reported() {
        let mut config = FibraConfig::default();
        let mut bad = connection("pf_to_pc");
        bad.affinity = 1.5;
        bad.resolution = 0.0;
        bad.to_cell_type.clear();
        config.connections.push(bad);

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("pf_to_pc.affinity"));
        assert!(message.contains("pf_to_pc.resolution"));
        assert!(message.contains("pf_to_pc.to_cell_type"));
    }

    #[test]
    fn test_duplicate_names() {
        let mut config = FibraConfig::default();
        config.connections.push(connection("pf_to_pc"));
        config.connections.push(connection("pf_to_pc"));
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("defined more than once"));
    }

    #[test]
    fn test_quiver_is_rejected() {
        let mut config = FibraConfig::default();
        let mut quiver = connection("aa_to_pc");
        quiver.transform = TransformConfig::Quiver {
            vol_res: 1.0,
            quivers: [1.0, 1.0, 1.0],
        };
        config.connections.push(quiver);
        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("quiver transform"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = FibraConfig::default();
        config.logging.level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }
}

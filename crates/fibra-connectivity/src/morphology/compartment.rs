// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Compartments - the segment building blocks of a morphological reconstruction.
*/

use crate::types::{distance, CompartmentId, Point3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anatomical type of a compartment, used to filter morphologies
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompartmentType {
    Soma,
    Axon,
    Dendrites,
    /// Any other labelled type, e.g. `parallel_fiber` or `ascending_axon`
    Custom(String),
}

impl FromStr for CompartmentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CompartmentType::from(s))
    }
}

impl From<&str> for CompartmentType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "soma" => CompartmentType::Soma,
            "axon" => CompartmentType::Axon,
            "dendrites" | "dendrite" => CompartmentType::Dendrites,
            other => CompartmentType::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for CompartmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompartmentType::Soma => write!(f, "soma"),
            CompartmentType::Axon => write!(f, "axon"),
            CompartmentType::Dendrites => write!(f, "dendrites"),
            CompartmentType::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Human-readable list of compartment types for error messages
pub fn describe_types(types: &[CompartmentType]) -> String {
    if types.is_empty() {
        return "compartments".to_string();
    }
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A straight segment of a reconstruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    /// Stable id referenced by connection records
    pub id: CompartmentId,
    /// Anatomical type
    pub kind: CompartmentType,
    /// Segment start in local coordinates
    pub start: Point3,
    /// Segment end in local coordinates; the point used for voxelization
    pub end: Point3,
    /// Parent compartment, `None` for a root
    pub parent: Option<CompartmentId>,
}

impl Compartment {
    pub fn new(
        id: CompartmentId,
        kind: CompartmentType,
        start: Point3,
        end: Point3,
        parent: Option<CompartmentId>,
    ) -> Self {
        Self {
            id,
            kind,
            start,
            end,
            parent,
        }
    }

    /// Segment length
    pub fn length(&self) -> f64 {
        distance(self.start, self.end)
    }

    /// Whether this compartment matches the filter (an empty filter matches all)
    pub fn matches(&self, types: &[CompartmentType]) -> bool {
        types.is_empty() || types.contains(&self.kind)
    }
}

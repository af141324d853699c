// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Fiber transforms - spatial warps applied to every branch of a fiber.

`BranchTransform` is the extension point. `FiberTransform` selects one of the
known transforms: the identity, and the orientation-field (quiver) warp used
for parallel fibers, which is not implemented yet and reports
`UnsupportedTransform` instead of touching the fiber.
*/

use crate::morphology::Branch;
use crate::types::{ConnectivityError, ConnectivityResult, Point3};

/// Capability: warp a branch's compartments given the cell's position offset
pub trait BranchTransform {
    /// Transform one branch in place (children are visited by `transform_branches`)
    fn transform_branch(&self, branch: &mut Branch, offset: Point3) -> ConnectivityResult<()>;

    /// Transform every branch of the forest, preserving topology and order
    fn transform_branches(
        &self,
        branches: &mut [Branch],
        offset: Point3,
    ) -> ConnectivityResult<()> {
        let mut stack: Vec<&mut Branch> = branches.iter_mut().collect();
        while let Some(branch) = stack.pop() {
            self.transform_branch(branch, offset)?;
            stack.extend(branch.children_mut().iter_mut());
        }
        Ok(())
    }
}

/// Orientation-field warp parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QuiverTransform {
    /// Resolution of the orientation field volume
    pub vol_res: f64,
    /// Orientation vector
    pub quivers: Point3,
}

impl Default for QuiverTransform {
    fn default() -> Self {
        Self {
            vol_res: 1.0,
            quivers: [1.0, 1.0, 1.0],
        }
    }
}

impl QuiverTransform {
    pub fn validate(&self) -> ConnectivityResult<()> {
        Err(ConnectivityError::UnsupportedTransform(
            "QuiverTransform not implemented".to_string(),
        ))
    }
}

impl BranchTransform for QuiverTransform {
    fn transform_branch(&self, _branch: &mut Branch, _offset: Point3) -> ConnectivityResult<()> {
        Err(ConnectivityError::UnsupportedTransform(
            "QuiverTransform not implemented".to_string(),
        ))
    }
}

/// Transform selected for a connection
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FiberTransform {
    /// Leave the fiber as it is
    #[default]
    Identity,
    /// Orientation-field warp (unsupported)
    Quiver(QuiverTransform),
}

impl FiberTransform {
    /// Fail fast on transforms that cannot run
    pub fn validate(&self) -> ConnectivityResult<()> {
        match self {
            FiberTransform::Identity => Ok(()),
            FiberTransform::Quiver(quiver) => quiver.validate(),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, FiberTransform::Identity)
    }
}

impl BranchTransform for FiberTransform {
    fn transform_branch(&self, branch: &mut Branch, offset: Point3) -> ConnectivityResult<()> {
        match self {
            FiberTransform::Identity => Ok(()),
            FiberTransform::Quiver(quiver) => quiver.transform_branch(branch, offset),
        }
    }

    fn transform_branches(
        &self,
        branches: &mut [Branch],
        offset: Point3,
    ) -> ConnectivityResult<()> {
        match self {
            FiberTransform::Identity => Ok(()),
            FiberTransform::Quiver(quiver) => quiver.transform_branches(branches, offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::{Compartment, CompartmentType};

    fn forest() -> Vec<Branch> {
        let c = |id, x: f64| {
            Compartment::new(id, CompartmentType::Axon, [x, 0.0, 0.0], [x + 1.0, 0.0, 0.0], None)
        };
        vec![Branch::with_children(vec![c(1, 0.0)], vec![Branch::new(vec![c(2, 1.0)])])]
    }

    /// Shifts every point along x, to exercise the provided traversal
    struct ShiftX(f64);

    impl BranchTransform for ShiftX {
        fn transform_branch(&self, branch: &mut Branch, _offset: Point3) -> ConnectivityResult<()> {
            for c in branch.compartments_mut() {
                c.start[0] += self.0;
                c.end[0] += self.0;
            }
            Ok(())
        }
    }

    #[test]
    fn test_identity_is_noop() {
        let mut branches = forest();
        let before = branches.clone();
        FiberTransform::Identity
            .transform_branches(&mut branches, [5.0, 5.0, 5.0])
            .unwrap();
        assert_eq!(branches, before);
        assert!(FiberTransform::Identity.validate().is_ok());
    }

    #[test]
    fn test_custom_transform_visits_children() {
        let mut branches = forest();
        ShiftX(10.0).transform_branches(&mut branches, [0.0; 3]).unwrap();
        assert_eq!(branches[0].compartments()[0].start, [10.0, 0.0, 0.0]);
        assert_eq!(branches[0].children()[0].compartments()[0].end, [12.0, 0.0, 0.0]);
        assert_eq!(branches[0].children()[0].compartments()[0].id, 2);
    }

    #[test]
    fn test_quiver_fails_fast() {
        let transform = FiberTransform::Quiver(QuiverTransform::default());
        assert!(matches!(
            transform.validate(),
            Err(ConnectivityError::UnsupportedTransform(_))
        ));
        let mut branches = forest();
        let before = branches.clone();
        assert!(transform.transform_branches(&mut branches, [0.0; 3]).is_err());
        assert_eq!(branches, before);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Branch interpolation - densify a branch forest to a spatial resolution.
*/

use crate::morphology::Branch;

/// Interpolate every branch of the forest so that no compartment is longer
/// than `resolution` and consecutive end points within a branch are at most
/// `resolution` apart.
///
/// Idempotent: a forest that already satisfies the bound is left unchanged.
pub fn interpolate_branches(branches: &mut [Branch], resolution: f64) {
    let mut stack: Vec<&mut Branch> = branches.iter_mut().collect();
    while let Some(branch) = stack.pop() {
        branch.interpolate(resolution);
        stack.extend(branch.children_mut().iter_mut());
    }
}

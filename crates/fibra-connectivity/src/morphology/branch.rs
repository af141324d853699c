// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Branches - ordered runs of compartments with exclusively owned child branches.
*/

use super::compartment::Compartment;
use crate::types::{distance, lerp};

/// Relative slack on the resolution bound, absorbs rounding in split pieces
const RESOLUTION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Branch {
    compartments: Vec<Compartment>,
    children: Vec<Branch>,
}

impl Branch {
    pub fn new(compartments: Vec<Compartment>) -> Self {
        Self {
            compartments,
            children: Vec::new(),
        }
    }

    pub fn with_children(compartments: Vec<Compartment>, children: Vec<Branch>) -> Self {
        Self {
            compartments,
            children,
        }
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn compartments_mut(&mut self) -> &mut [Compartment] {
        &mut self.compartments
    }

    pub fn children(&self) -> &[Branch] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Branch> {
        &mut self.children
    }

    /// Densify the branch so that no compartment is longer than `resolution`
    /// and no two consecutive compartment end points are further apart.
    ///
    /// Long compartments are split into equal pieces that inherit their id,
    /// type and parent. Gaps between consecutive end points are filled with
    /// synthetic compartments along the connecting line, inheriting from the
    /// compartment after the gap. Child branches are not visited.
    pub fn interpolate(&mut self, resolution: f64) {
        let limit = resolution * (1.0 + RESOLUTION_TOLERANCE);
        if self.is_dense(limit) {
            return;
        }

        let mut dense: Vec<Compartment> = Vec::with_capacity(self.compartments.len());
        for compartment in self.compartments.drain(..) {
            for piece in split(compartment, resolution, limit) {
                if let Some(previous) = dense.last().map(|c| c.end) {
                    let gap = distance(previous, piece.end);
                    if gap > limit {
                        let steps = (gap / resolution).ceil() as usize;
                        let mut start = previous;
                        for i in 1..steps {
                            let mut filler = piece.clone();
                            filler.start = start;
                            filler.end = lerp(previous, piece.end, i as f64 / steps as f64);
                            start = filler.end;
                            dense.push(filler);
                        }
                    }
                }
                dense.push(piece);
            }
        }
        self.compartments = dense;
    }

    fn is_dense(&self, limit: f64) -> bool {
        self.compartments.iter().all(|c| c.length() <= limit)
            && self
                .compartments
                .windows(2)
                .all(|pair| distance(pair[0].end, pair[1].end) <= limit)
    }

    /// Number of branches in this subtree, including this one
    pub fn branch_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(branch) = stack.pop() {
            count += 1;
            stack.extend(branch.children.iter());
        }
        count
    }
}

/// Equal pieces of `compartment`, each no longer than `resolution`
fn split(compartment: Compartment, resolution: f64, limit: f64) -> Vec<Compartment> {
    let length = compartment.length();
    if length <= limit {
        return vec![compartment];
    }
    let pieces = (length / resolution).ceil() as usize;
    (0..pieces)
        .map(|i| {
            let mut piece = compartment.clone();
            piece.start = lerp(compartment.start, compartment.end, i as f64 / pieces as f64);
            piece.end = if i + 1 == pieces {
                compartment.end
            } else {
                lerp(compartment.start, compartment.end, (i + 1) as f64 / pieces as f64)
            };
            piece
        })
        .collect()
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Fiber morphologies - a presynaptic cell's branch forest.

Branch topology is recovered from the parent links of a flat compartment list:
a compartment whose parent is not part of the list starts a root branch, a
branch continues while its last compartment has exactly one child, and it
forks into one child branch per child otherwise.
*/

use ahash::AHashMap;

use super::branch::Branch;
use super::compartment::Compartment;
use crate::types::{CompartmentId, Point3};

/// Branch forest of one placed presynaptic cell, in local coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct FiberMorphology {
    /// Root branches
    pub root_branches: Vec<Branch>,
    /// Rotation of the placed cell
    pub rotation: Point3,
}

/// A branch under construction: compartment indices plus its parent run
struct Run {
    members: Vec<usize>,
    parent: Option<usize>,
}

impl FiberMorphology {
    /// Build the branch forest from (already filtered) compartments.
    ///
    /// Compartments caught in a parent cycle never reach a root and are left out.
    pub fn from_compartments(compartments: &[Compartment], rotation: Point3) -> Self {
        let index_of: AHashMap<CompartmentId, usize> = compartments
            .iter()
            .enumerate()
            .rev()
            .map(|(i, c)| (c.id, i))
            .collect();

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); compartments.len()];
        let mut roots = Vec::new();
        for (i, compartment) in compartments.iter().enumerate() {
            match compartment.parent.and_then(|p| index_of.get(&p)) {
                Some(&parent) if parent != i => children[parent].push(i),
                _ => roots.push(i),
            }
        }

        // Breadth-first over branch starts; a run's parent always precedes it.
        let mut runs: Vec<Run> = Vec::new();
        let mut pending: std::collections::VecDeque<(usize, Option<usize>)> =
            roots.into_iter().map(|start| (start, None)).collect();
        let mut visited = vec![false; compartments.len()];

        while let Some((start, parent)) = pending.pop_front() {
            let run_index = runs.len();
            let mut members = Vec::new();
            let mut current = start;
            loop {
                if visited[current] {
                    break;
                }
                visited[current] = true;
                members.push(current);
                match children[current].as_slice() {
                    [only] => current = *only,
                    forks => {
                        for &child in forks {
                            pending.push_back((child, Some(run_index)));
                        }
                        break;
                    }
                }
            }
            runs.push(Run { members, parent });
        }

        // Attach children back to front so every run is complete before it moves.
        let mut slots: Vec<Option<Branch>> = runs
            .iter()
            .map(|run| {
                Some(Branch::new(
                    run.members.iter().map(|&i| compartments[i].clone()).collect(),
                ))
            })
            .collect();
        let mut root_branches = Vec::new();
        for index in (0..runs.len()).rev() {
            let Some(mut branch) = slots[index].take() else {
                continue;
            };
            branch.children_mut().reverse();
            match runs[index].parent.and_then(|p| slots[p].as_mut()) {
                Some(parent) => parent.children_mut().push(branch),
                None => root_branches.push(branch),
            }
        }
        root_branches.reverse();

        Self {
            root_branches,
            rotation,
        }
    }

    /// First point of the first root branch, if any
    pub fn origin(&self) -> Option<Point3> {
        self.root_branches
            .first()
            .and_then(|b| b.compartments().first())
            .map(|c| c.start)
    }

    /// Total number of compartments across all branches
    pub fn compartment_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Branch> = self.root_branches.iter().collect();
        while let Some(branch) = stack.pop() {
            count += branch.compartments().len();
            stack.extend(branch.children().iter());
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.root_branches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::CompartmentType;

    fn comp(id: u64, parent: Option<u64>, x: f64) -> Compartment {
        Compartment::new(
            id,
            CompartmentType::Custom("parallel_fiber".to_string()),
            [x - 1.0, 0.0, 0.0],
            [x, 0.0, 0.0],
            parent,
        )
    }

    #[test]
    fn test_single_chain_is_one_branch() {
        let comps = vec![comp(1, None, 1.0), comp(2, Some(1), 2.0), comp(3, Some(2), 3.0)];
        let fiber = FiberMorphology::from_compartments(&comps, [0.0; 3]);
        assert_eq!(fiber.root_branches.len(), 1);
        let ids: Vec<u64> = fiber.root_branches[0].compartments().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(fiber.root_branches[0].children().is_empty());
        assert_eq!(fiber.origin(), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_fork_creates_child_branches() {
        // 1 -> 2 -> {3 -> 4, 5}
        let comps = vec![
            comp(1, None, 1.0),
            comp(2, Some(1), 2.0),
            comp(3, Some(2), 3.0),
            comp(4, Some(3), 4.0),
            comp(5, Some(2), 5.0),
        ];
        let fiber = FiberMorphology::from_compartments(&comps, [0.0; 3]);
        assert_eq!(fiber.root_branches.len(), 1);
        let root = &fiber.root_branches[0];
        assert_eq!(root.compartments().len(), 2);
        assert_eq!(root.children().len(), 2);
        let first: Vec<u64> = root.children()[0].compartments().iter().map(|c| c.id).collect();
        let second: Vec<u64> = root.children()[1].compartments().iter().map(|c| c.id).collect();
        assert_eq!(first, vec![3, 4]);
        assert_eq!(second, vec![5]);
        assert_eq!(fiber.compartment_count(), 5);
    }

    #[test]
    fn test_filtered_parent_starts_new_root() {
        // Parent 10 was filtered out, so 11 becomes a root next to 1
        let comps = vec![comp(1, None, 1.0), comp(11, Some(10), 11.0), comp(12, Some(11), 12.0)];
        let fiber = FiberMorphology::from_compartments(&comps, [0.0, 1.0, 0.0]);
        assert_eq!(fiber.root_branches.len(), 2);
        assert_eq!(fiber.root_branches[1].compartments().len(), 2);
        assert_eq!(fiber.rotation, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_nested_forks_keep_order() {
        // 1 -> {2 -> {4, 5}, 3}
        let comps = vec![
            comp(1, None, 1.0),
            comp(2, Some(1), 2.0),
            comp(3, Some(1), 3.0),
            comp(4, Some(2), 4.0),
            comp(5, Some(2), 5.0),
        ];
        let fiber = FiberMorphology::from_compartments(&comps, [0.0; 3]);
        let root = &fiber.root_branches[0];
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].compartments()[0].id, 2);
        assert_eq!(root.children()[0].children().len(), 2);
        assert_eq!(root.children()[0].children()[0].compartments()[0].id, 4);
        assert_eq!(root.children()[0].children()[1].compartments()[0].id, 5);
        assert_eq!(root.children()[1].compartments()[0].id, 3);
        assert_eq!(root.branch_count(), 5);
    }

    #[test]
    fn test_empty_input() {
        let fiber = FiberMorphology::from_compartments(&[], [0.0; 3]);
        assert!(fiber.is_empty());
        assert_eq!(fiber.origin(), None);
    }
}

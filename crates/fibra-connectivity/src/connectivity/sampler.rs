// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connection sampling - pick one compartment pair per connected cell pair.

A candidate pair first passes a Bernoulli gate with probability `affinity`.
Among the postsynaptic voxels that overlap the fiber, one is drawn with
weight `post compartments in the voxel * pre compartments in its overlapping
fiber voxels`; the pre compartment is then drawn uniformly from those fiber
voxels and the post compartment uniformly from the chosen voxel.
*/

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use super::intersection::VoxelOverlap;
use super::voxelizer::FiberVoxelization;
use crate::morphology::VoxelCloud;
use crate::spatial::VoxelId;
use crate::types::{CompartmentId, ConnectivityError, ConnectivityResult};

/// One sampled contact between a fiber and a postsynaptic cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampledContact {
    /// Index of the chosen voxel in the postsynaptic cloud
    pub post_voxel: usize,
    /// Fiber voxel holding the chosen presynaptic compartment
    pub pre_voxel: VoxelId,
    pub pre_compartment: CompartmentId,
    pub post_compartment: CompartmentId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionSampler {
    affinity: f64,
}

impl ConnectionSampler {
    /// `affinity` must lie in [0, 1]
    pub fn new(affinity: f64) -> ConnectivityResult<Self> {
        if !(0.0..=1.0).contains(&affinity) {
            return Err(ConnectivityError::InvalidParameter(format!(
                "affinity must be within [0, 1], got {}",
                affinity
            )));
        }
        Ok(Self { affinity })
    }

    pub fn affinity(&self) -> f64 {
        self.affinity
    }

    /// Bernoulli gate: whether this candidate pair may connect at all
    pub fn passes_affinity<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_bool(self.affinity)
    }

    /// Draw one contact from the overlap, `None` if no voxel carries any weight
    pub fn choose<R: Rng + ?Sized>(
        &self,
        overlap: &VoxelOverlap,
        fiber: &FiberVoxelization,
        post: &VoxelCloud,
        rng: &mut R,
    ) -> Option<SampledContact> {
        let mut candidates = Vec::new();
        let mut weights: Vec<u64> = Vec::new();
        for (post_voxel, fiber_voxels) in overlap.qualifying() {
            let pre: Vec<(VoxelId, CompartmentId)> = fiber_voxels
                .iter()
                .flat_map(|&id| fiber.compartments(id).iter().map(move |&c| (id, c)))
                .collect();
            let weight = post.map()[post_voxel].len() as u64 * pre.len() as u64;
            if weight > 0 {
                candidates.push((post_voxel, pre));
                weights.push(weight);
            }
        }
        if candidates.is_empty() {
            return None;
        }

        let picked = WeightedIndex::new(&weights).ok()?.sample(rng);
        let (post_voxel, pre) = &candidates[picked];
        let &(pre_voxel, pre_compartment) = pre.choose(rng)?;
        let &post_compartment = post.map()[*post_voxel].choose(rng)?;
        Some(SampledContact {
            post_voxel: *post_voxel,
            pre_voxel,
            pre_compartment,
            post_compartment,
        })
    }

    /// Gate, then choose
    pub fn sample<R: Rng + ?Sized>(
        &self,
        overlap: &VoxelOverlap,
        fiber: &FiberVoxelization,
        post: &VoxelCloud,
        rng: &mut R,
    ) -> Option<SampledContact> {
        if !self.passes_affinity(rng) {
            return None;
        }
        self.choose(overlap, fiber, post, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::intersection::intersect_voxel_tree;
    use crate::connectivity::voxelizer::voxelize;
    use crate::morphology::{Branch, Compartment, CompartmentType};
    use crate::spatial::Aabb3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fiber(points: &[(u64, [f64; 3])]) -> FiberVoxelization {
        let comps = points
            .iter()
            .map(|&(id, p)| Compartment::new(id, CompartmentType::Axon, p, p, None))
            .collect();
        voxelize(&[Branch::new(comps)], [0.0; 3], Aabb3::from_point(points[0].1), 10.0).unwrap()
    }

    #[test]
    fn test_affinity_bounds() {
        assert!(ConnectionSampler::new(-0.1).is_err());
        assert!(ConnectionSampler::new(1.5).is_err());
        assert!(ConnectionSampler::new(f64::NAN).is_err());
        assert!(ConnectionSampler::new(0.0).is_ok());
    }

    #[test]
    fn test_zero_affinity_never_samples() {
        let f = fiber(&[(1, [5.0; 3])]);
        let cloud = VoxelCloud::new(10.0, vec![[0, 0, 0]], vec![vec![10]]).unwrap();
        let overlap = intersect_voxel_tree(f.index(), &cloud, [0.0; 3]);
        let sampler = ConnectionSampler::new(0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..100).all(|_| sampler.sample(&overlap, &f, &cloud, &mut rng).is_none()));
    }

    #[test]
    fn test_contact_comes_from_overlapping_voxels() {
        // Fiber voxels [0,0,0] (ids 1, 2) and [3,0,0] (id 3); post cloud only covers the first
        let f = fiber(&[(1, [5.0; 3]), (2, [6.0; 3]), (3, [35.0, 5.0, 5.0])]);
        let cloud =
            VoxelCloud::new(10.0, vec![[0, 0, 0], [8, 8, 8]], vec![vec![10, 11], vec![12]])
                .unwrap();
        let overlap = intersect_voxel_tree(f.index(), &cloud, [0.0; 3]);
        let sampler = ConnectionSampler::new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let contact = sampler.sample(&overlap, &f, &cloud, &mut rng).unwrap();
            assert_eq!(contact.post_voxel, 0);
            assert!([1, 2].contains(&contact.pre_compartment));
            assert!([10, 11].contains(&contact.post_compartment));
            assert_eq!(contact.pre_voxel, VoxelId::from_key([0, 0, 0]).unwrap());
        }
    }

    #[test]
    fn test_zero_weight_yields_nothing() {
        let f = fiber(&[(1, [5.0; 3])]);
        let cloud = VoxelCloud::new(10.0, vec![[0, 0, 0]], vec![vec![]]).unwrap();
        let overlap = intersect_voxel_tree(f.index(), &cloud, [0.0; 3]);
        let sampler = ConnectionSampler::new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(!overlap.is_empty());
        assert_eq!(sampler.choose(&overlap, &f, &cloud, &mut rng), None);
    }

    #[test]
    fn test_weighting_follows_compartment_density() {
        // Post voxels at x = 0 (1 compartment) and x = 30 (9 compartments), one fiber voxel each
        let f = fiber(&[(1, [5.0; 3]), (2, [35.0, 5.0, 5.0])]);
        let cloud = VoxelCloud::new(
            10.0,
            vec![[0, 0, 0], [3, 0, 0]],
            vec![vec![100], (200..209).collect()],
        )
        .unwrap();
        let overlap = intersect_voxel_tree(f.index(), &cloud, [0.0; 3]);
        let sampler = ConnectionSampler::new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);

        let mut dense = 0u32;
        let draws = 10_000;
        for _ in 0..draws {
            if sampler.choose(&overlap, &f, &cloud, &mut rng).unwrap().post_voxel == 1 {
                dense += 1;
            }
        }
        let ratio = dense as f64 / (draws - dense) as f64;
        assert!((7.0..11.5).contains(&ratio), "ratio was {}", ratio);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Box intersection index.

`GridIndex` buckets entries into a uniform hashed grid. An entry is listed in
every bucket its box touches; a query gathers the buckets its region touches
and keeps the entries whose boxes actually intersect the region.
*/

use ahash::{AHashMap, AHashSet};

use super::aabb::Aabb3;

type CellKey = (i64, i64, i64);

/// Narrow box-intersection interface used by voxelization and candidate search
pub trait SpatialIndex<K> {
    /// Insert an entry
    fn insert(&mut self, key: K, aabb: Aabb3);

    /// Keys whose box intersects `region`, in insertion order
    fn query(&self, region: &Aabb3) -> Vec<K>;

    /// Number of entries
    fn len(&self) -> usize;

    /// Whether the index has no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uniform grid spatial index
#[derive(Debug, Clone)]
pub struct GridIndex<K> {
    cell_size: f64,
    entries: Vec<(K, Aabb3)>,
    cells: AHashMap<CellKey, Vec<usize>>,
}

impl<K> GridIndex<K> {
    /// Create an index with the given bucket edge length.
    ///
    /// Non-positive or non-finite sizes fall back to 1.0.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            entries: Vec::new(),
            cells: AHashMap::new(),
        }
    }

    /// Bucket edge length
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// All entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &(K, Aabb3)> {
        self.entries.iter()
    }

    fn key_for(&self, point: [f64; 3]) -> CellKey {
        (
            (point[0] / self.cell_size).floor() as i64,
            (point[1] / self.cell_size).floor() as i64,
            (point[2] / self.cell_size).floor() as i64,
        )
    }

    fn cell_range(&self, aabb: &Aabb3) -> (CellKey, CellKey) {
        (self.key_for(aabb.min), self.key_for(aabb.max))
    }
}

impl<K: Copy> SpatialIndex<K> for GridIndex<K> {
    fn insert(&mut self, key: K, aabb: Aabb3) {
        let slot = self.entries.len();
        self.entries.push((key, aabb));
        let (lo, hi) = self.cell_range(&aabb);
        for x in lo.0..=hi.0 {
            for y in lo.1..=hi.1 {
                for z in lo.2..=hi.2 {
                    self.cells.entry((x, y, z)).or_default().push(slot);
                }
            }
        }
    }

    fn query(&self, region: &Aabb3) -> Vec<K> {
        if self.entries.is_empty() {
            return Vec::new();
        }

        let (lo, hi) = self.cell_range(region);
        let span =
            (hi.0 - lo.0 + 1) as u128 * (hi.1 - lo.1 + 1) as u128 * (hi.2 - lo.2 + 1) as u128;

        let mut slots: AHashSet<usize> = AHashSet::new();
        if span > self.cells.len() as u128 {
            // Region covers more buckets than are occupied: walk the occupied ones
            for (cell, cell_slots) in &self.cells {
                let inside = (lo.0..=hi.0).contains(&cell.0)
                    && (lo.1..=hi.1).contains(&cell.1)
                    && (lo.2..=hi.2).contains(&cell.2);
                if inside {
                    slots.extend(cell_slots.iter().copied());
                }
            }
        } else {
            for x in lo.0..=hi.0 {
                for y in lo.1..=hi.1 {
                    for z in lo.2..=hi.2 {
                        if let Some(cell_slots) = self.cells.get(&(x, y, z)) {
                            slots.extend(cell_slots.iter().copied());
                        }
                    }
                }
            }
        }

        let mut hits: Vec<usize> = slots
            .into_iter()
            .filter(|&slot| self.entries[slot].1.intersects(region))
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|slot| self.entries[slot].0).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_finds_overlapping_entries() {
        let mut index = GridIndex::new(10.0);
        index.insert(1u32, Aabb3::cube([0.0, 0.0, 0.0], 5.0));
        index.insert(2u32, Aabb3::cube([20.0, 20.0, 20.0], 5.0));
        index.insert(3u32, Aabb3::cube([-8.0, -8.0, -8.0], 5.0));

        assert_eq!(index.query(&Aabb3::cube([2.0, 2.0, 2.0], 1.0)), vec![1]);
        assert_eq!(index.query(&Aabb3::cube([-10.0, -10.0, -10.0], 40.0)), vec![1, 2, 3]);
        assert!(index.query(&Aabb3::cube([100.0, 100.0, 100.0], 1.0)).is_empty());
    }

    #[test]
    fn test_entry_spanning_many_buckets_reported_once() {
        let mut index = GridIndex::new(1.0);
        index.insert(7u32, Aabb3::new([0.0, 0.0, 0.0], [4.5, 4.5, 4.5]));
        assert_eq!(index.query(&Aabb3::new([1.0, 1.0, 1.0], [3.0, 3.0, 3.0])), vec![7]);
    }

    #[test]
    fn test_bucket_neighbour_without_overlap_is_filtered() {
        let mut index = GridIndex::new(10.0);
        index.insert(1u32, Aabb3::cube([0.0, 0.0, 0.0], 1.0));
        // Same bucket, no overlap
        assert!(index.query(&Aabb3::cube([5.0, 5.0, 5.0], 1.0)).is_empty());
    }

    #[test]
    fn test_huge_query_region_walks_occupied_buckets() {
        let mut index = GridIndex::new(0.5);
        index.insert(1u32, Aabb3::cube([0.0, 0.0, 0.0], 1.0));
        index.insert(2u32, Aabb3::cube([1.0e4, 0.0, 0.0], 1.0));
        let all = index.query(&Aabb3::new([-1.0e5, -1.0e5, -1.0e5], [1.0e5, 1.0e5, 1.0e5]));
        assert_eq!(all, vec![1, 2]);
    }

    #[test]
    fn test_invalid_cell_size_falls_back() {
        let index: GridIndex<u32> = GridIndex::new(0.0);
        assert_eq!(index.cell_size(), 1.0);
        assert!(index.is_empty());
    }
}

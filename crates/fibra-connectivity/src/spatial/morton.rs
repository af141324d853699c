// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Morton encoding utilities for voxel ids.

Implements Z-order curve encoding to preserve spatial locality. Voxel
coordinates are signed (morphologies extend on both sides of their origin),
so they are biased by [`VOXEL_KEY_LIMIT`] before interleaving.
*/

use crate::types::{ConnectivityError, ConnectivityResult};
use serde::{Deserialize, Serialize};

/// Voxel coordinates must lie in `-VOXEL_KEY_LIMIT..VOXEL_KEY_LIMIT` on every axis.
pub const VOXEL_KEY_LIMIT: i64 = 1 << 20;

/// Morton encode 3D coordinates into a single u64.
///
/// Interleaves bits of x, y, z coordinates to preserve spatial locality.
/// Each dimension limited to 21 bits (0-2,097,151).
#[inline]
pub fn morton_encode_3d(x: u32, y: u32, z: u32) -> u64 {
    // Limit to 21 bits per dimension (63 bits total)
    debug_assert!(x < (1 << 21), "x coordinate exceeds 21-bit limit");
    debug_assert!(y < (1 << 21), "y coordinate exceeds 21-bit limit");
    debug_assert!(z < (1 << 21), "z coordinate exceeds 21-bit limit");

    let mut result = 0u64;

    // Interleave bits: ...z2y2x2z1y1x1z0y0x0
    for i in 0..21 {
        result |= ((x as u64 & (1 << i)) << (2 * i))
            | ((y as u64 & (1 << i)) << (2 * i + 1))
            | ((z as u64 & (1 << i)) << (2 * i + 2));
    }

    result
}

/// Morton decode a u64 back to 3D coordinates.
#[inline]
pub fn morton_decode_3d(morton_code: u64) -> (u32, u32, u32) {
    let mut x = 0u32;
    let mut y = 0u32;
    let mut z = 0u32;

    // Extract interleaved bits
    for i in 0..21 {
        x |= ((morton_code & (1 << (3 * i))) >> (2 * i)) as u32;
        y |= ((morton_code & (1 << (3 * i + 1))) >> (2 * i + 1)) as u32;
        z |= ((morton_code & (1 << (3 * i + 2))) >> (2 * i + 2)) as u32;
    }

    (x, y, z)
}

/// Identifier of an occupied voxel: the Morton code of its grid coordinates.
///
/// Depends only on the coordinates, so identical geometry always yields
/// identical ids regardless of the order in which voxels are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoxelId(pub u64);

impl VoxelId {
    /// Encode signed voxel grid coordinates
    pub fn from_key(key: [i64; 3]) -> ConnectivityResult<Self> {
        let mut biased = [0u32; 3];
        for (axis, &k) in key.iter().enumerate() {
            if !(-VOXEL_KEY_LIMIT..VOXEL_KEY_LIMIT).contains(&k) {
                return Err(ConnectivityError::OutOfBounds { voxel: key });
            }
            biased[axis] = (k + VOXEL_KEY_LIMIT) as u32;
        }
        Ok(VoxelId(morton_encode_3d(biased[0], biased[1], biased[2])))
    }

    /// Signed voxel grid coordinates of this id
    pub fn key(self) -> [i64; 3] {
        let (x, y, z) = morton_decode_3d(self.0);
        [
            x as i64 - VOXEL_KEY_LIMIT,
            y as i64 - VOXEL_KEY_LIMIT,
            z as i64 - VOXEL_KEY_LIMIT,
        ]
    }
}

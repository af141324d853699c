// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Spatial indexing utilities for voxel and cell box queries.

Implements:
- Morton encoding (Z-order curve) of signed voxel coordinates into voxel ids
- Axis-aligned boxes in 3D
- A hashed uniform grid index answering box intersection queries
*/

pub mod aabb;
pub mod index;
pub mod morton;

pub use aabb::Aabb3;
pub use index::{GridIndex, SpatialIndex};
pub use morton::{morton_decode_3d, morton_encode_3d, VoxelId, VOXEL_KEY_LIMIT};

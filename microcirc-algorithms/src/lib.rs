//! microcirc-algorithms: Spatial indexing over built morphologies.
//!
//! Rasterizes morphology segments into a 3-D voxel map for efficient
//! point-to-segment lookup.
//!
#![warn(missing_docs)]

mod voxel;

pub use voxel::{SegmentRef, VoxelMap};

//! # Core Models Module
//!
//! Data structures shared by the forward and backward passes.
//!
//! ## Key Components
//!
//! - [`atom`] - A point density source with position, channel and radius
//! - [`geometry`] - Voxel lattice placement, extent and index arithmetic
//! - [`grid`] - Dense `(channel, x, y, z)` tensors used for densities and for
//!   upstream gradients
//! - [`error`] - Validation failures raised while constructing the above

pub mod atom;
pub mod error;
pub mod geometry;
pub mod grid;

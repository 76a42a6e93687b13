//! # Core Module
//!
//! The stateless foundation of atomgrid: the data models describing atoms and voxel
//! grids, and the radial density kernel evaluated by both gridding passes.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Atoms, grid geometry, dense grid tensors and
//!   validation errors
//! - **Density Kernel** ([`kernel`]) - The piecewise Gaussian/quadratic radial kernel
//!   and its analytic derivative with respect to distance
//!
//! Nothing in this layer allocates per-call state beyond the grid buffers themselves,
//! and nothing here logs; orchestration belongs to [`crate::engine`].

pub mod kernel;
pub mod models;

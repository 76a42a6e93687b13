//! # Engine Module
//!
//! Orchestrates the two evaluations of the density kernel over a voxel lattice.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Grid geometry and kernel scaling, assembled with a
//!   builder
//! - **Ingestion** ([`context`]) - One-time validation of an atom list against the grid,
//!   with per-channel bucketing
//! - **Passes** (`tasks`) - The forward gridding pass and the backward atom-gradient pass
//! - **Error Handling** ([`error`]) - Engine-level error type wrapping model and
//!   configuration failures
//!
//! ## Parallelism
//!
//! With the `parallel` feature (on by default) the forward pass splits the grid into
//! disjoint `(channel, x)` planes and the backward pass distributes atoms across the
//! rayon pool. Every output element has exactly one writer, and accumulation order is
//! fixed (atom-list order per voxel, row-major order per atom), so results are
//! bit-identical with and without the feature.

pub mod config;
pub mod context;
pub mod error;
pub(crate) mod tasks;

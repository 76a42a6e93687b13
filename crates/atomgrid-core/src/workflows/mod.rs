//! # Workflows Module
//!
//! Top-level entry points of atomgrid. Each workflow validates its inputs through a
//! [`crate::engine::context::GridContext`], runs the engine passes and returns plain
//! values (grids, gradient vectors, reports) to the caller.
//!
//! - **Gridding** ([`grid`]) - Forward pass, backward pass and the inner-product loss
//!   that links them
//! - **Gradient Check** ([`gradcheck`]) - Finite-difference verification of the
//!   backward pass against the forward pass

pub mod gradcheck;
pub mod grid;

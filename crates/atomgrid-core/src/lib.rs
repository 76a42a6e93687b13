//! # atomgrid Core Library
//!
//! Rasterizes atomic coordinates onto dense, multi-channel voxel grids for use as
//! convolutional network input, and back-propagates a loss gradient given per voxel
//! into gradients on the atom positions.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that the numerics stay isolated from
//! orchestration.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Atom`, `GridGeometry`,
//!   `Grid`) and the pure piecewise radial [`core::kernel`] with its derivative.
//!
//! - **[`engine`]: The Logic Core.** Configuration, validated atom ingestion
//!   (`GridContext`) and the forward (gridding) and backward (atom-gradient) passes.
//!
//! - **[`workflows`]: The Public API.** Entry points that tie configuration, ingestion
//!   and the passes together, plus a finite-difference gradient check.
//!
//! ```ignore
//! use atomgrid::core::models::atom::Atom;
//! use atomgrid::engine::config::GridConfigBuilder;
//! use atomgrid::workflows::grid;
//! use nalgebra::Point3;
//!
//! let atoms = vec![Atom::new(Point3::origin(), 0, 1.0)];
//! let config = GridConfigBuilder::new()
//!     .center(Point3::origin())
//!     .resolution(0.5)
//!     .channels(1)
//!     .dimensions([9, 9, 9])
//!     .build()?;
//!
//! let density = grid::forward(&atoms, &config)?;
//! let gradients = grid::backward(&atoms, &config, &upstream)?;
//! ```

pub mod core;
pub mod engine;
pub mod workflows;

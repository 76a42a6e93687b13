use crate::core::models::atom::Atom;
use crate::core::models::grid::Grid;
use crate::engine::config::GridConfig;
use crate::engine::context::GridContext;
use crate::engine::error::EngineError;
use crate::engine::tasks;
use nalgebra::Vector3;
use tracing::instrument;

/// Rasterizes `atoms` onto the lattice described by `config`.
///
/// Every voxel holds the sum of kernel contributions from the atoms of its channel
/// within their cutoff; voxels without such atoms are exactly zero.
///
/// # Errors
///
/// Returns [`EngineError::Model`] when an atom fails ingestion (non-finite position,
/// non-positive radius, channel outside the grid).
#[instrument(skip_all, name = "forward_workflow", fields(atoms = atoms.len()))]
pub fn forward(atoms: &[Atom], config: &GridConfig) -> Result<Grid, EngineError> {
    let context = GridContext::new(atoms, config)?;
    Ok(tasks::forward::run(&context))
}

/// Computes `dloss/datom_position` for every atom, in atom-list order.
///
/// `upstream` is `dloss/dgrid` and must live on exactly the lattice `config`
/// describes.
///
/// # Errors
///
/// Ingestion failures as in [`forward`], plus shape or geometry mismatches between
/// `upstream` and `config`.
#[instrument(skip_all, name = "backward_workflow", fields(atoms = atoms.len()))]
pub fn backward(
    atoms: &[Atom],
    config: &GridConfig,
    upstream: &Grid,
) -> Result<Vec<Vector3<f64>>, EngineError> {
    let context = GridContext::new(atoms, config)?;
    tasks::backward::run(&context, upstream)
}

/// The scalar `sum(upstream * density)` whose gradient [`backward`] computes.
pub fn loss(density: &Grid, upstream: &Grid) -> Result<f64, EngineError> {
    Ok(density.dot(upstream)?)
}

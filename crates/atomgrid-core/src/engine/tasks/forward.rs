use crate::core::kernel;
use crate::core::models::grid::Grid;
use crate::engine::context::GridContext;
use std::ops::RangeInclusive;
use tracing::{info, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

type VoxelBox = [RangeInclusive<usize>; 3];

/// Rasterizes the context's atoms into a fresh density grid.
///
/// The grid is processed as `channels * nx` planes of `ny * nz` voxels. Each plane is
/// owned by exactly one worker and accumulates the atoms of its channel in atom-list
/// order, which fixes the floating-point summation order per voxel.
#[instrument(skip_all, name = "forward_task")]
pub fn run(context: &GridContext) -> Grid {
    let geometry = context.geometry();
    let [nx, ny, nz] = geometry.dims();
    let plane_len = ny * nz;

    info!(
        atoms = context.atoms().len(),
        voxels = geometry.len(),
        "Starting forward gridding pass."
    );

    let supports: Vec<Option<VoxelBox>> = context
        .atoms()
        .iter()
        .map(|atom| context.support(atom))
        .collect();

    let fill_plane = |(plane, values): (usize, &mut [f64])| {
        let channel = plane / nx;
        let i = plane % nx;
        for &atom_idx in context.channel_members(channel) {
            let Some([xs, ys, zs]) = &supports[atom_idx] else {
                continue;
            };
            if !xs.contains(&i) {
                continue;
            }
            let atom = &context.atoms()[atom_idx];
            let radius = context.radius_of(atom);
            let cutoff = kernel::cutoff(radius);
            for j in ys.clone() {
                for k in zs.clone() {
                    let dist = (geometry.voxel_center(i, j, k) - atom.position).norm();
                    if dist < cutoff {
                        values[j * nz + k] += kernel::density(dist, radius);
                    }
                }
            }
        }
    };

    let mut grid = Grid::zeros(geometry.clone());

    #[cfg(not(feature = "parallel"))]
    grid.as_mut_slice()
        .chunks_mut(plane_len)
        .enumerate()
        .for_each(fill_plane);

    #[cfg(feature = "parallel")]
    grid.as_mut_slice()
        .par_chunks_mut(plane_len)
        .enumerate()
        .for_each(fill_plane);

    trace!(
        nonzero = grid.as_slice().iter().filter(|v| **v != 0.0).count(),
        "Forward pass occupancy."
    );
    info!("Forward gridding pass finished.");
    grid
}

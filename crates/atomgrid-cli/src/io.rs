use crate::error::{CliError, Result};
use atomgrid::core::models::atom::Atom;
use atomgrid::core::models::geometry::GridGeometry;
use atomgrid::core::models::grid::Grid;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct AtomRecord {
    x: f64,
    y: f64,
    z: f64,
    channel: usize,
    radius: f64,
}

impl From<AtomRecord> for Atom {
    fn from(r: AtomRecord) -> Self {
        Atom::new(Point3::new(r.x, r.y, r.z), r.channel, r.radius)
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamRecord {
    channel: usize,
    i: usize,
    j: usize,
    k: usize,
    value: f64,
}

#[derive(Debug, Serialize)]
struct VoxelRecord {
    channel: usize,
    i: usize,
    j: usize,
    k: usize,
    x: f64,
    y: f64,
    z: f64,
    value: f64,
}

#[derive(Debug, Serialize)]
struct GradientRecord {
    index: usize,
    channel: usize,
    dx: f64,
    dy: f64,
    dz: f64,
}

fn parsing_error(path: &Path, source: impl Into<anyhow::Error>) -> CliError {
    CliError::FileParsing {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

fn writing_error(path: &Path, source: impl Into<anyhow::Error>) -> CliError {
    CliError::FileWriting {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| parsing_error(path, e))
}

/// Reads an atom table with the header `x,y,z,channel,radius`.
///
/// Values are parsed but not validated; ingestion in the core rejects bad radii,
/// coordinates and channels with the atom's row index.
pub fn read_atoms(path: &Path) -> Result<Vec<Atom>> {
    let atoms = reader(path)?
        .deserialize::<AtomRecord>()
        .map(|record| record.map(Atom::from).map_err(|e| parsing_error(path, e)))
        .collect::<Result<Vec<_>>>()?;
    debug!(path = %path.display(), atoms = atoms.len(), "Atom table loaded.");
    Ok(atoms)
}

/// Reads a sparse upstream gradient (`channel,i,j,k,value`) onto `geometry`.
///
/// Voxels not listed stay zero and repeated voxels accumulate. Extra columns are
/// ignored, so a voxel dump written by [`write_voxels`] is accepted as well.
pub fn read_upstream(path: &Path, geometry: &GridGeometry) -> Result<Grid> {
    let mut upstream = Grid::zeros(geometry.clone());
    let mut entries = 0usize;
    for record in reader(path)?.deserialize::<UpstreamRecord>() {
        let r = record.map_err(|e| parsing_error(path, e))?;
        let current = upstream.get(r.channel, r.i, r.j, r.k).unwrap_or(0.0);
        upstream
            .set(r.channel, r.i, r.j, r.k, current + r.value)
            .map_err(|e| parsing_error(path, e))?;
        entries += 1;
    }
    debug!(path = %path.display(), entries, "Upstream gradient loaded.");
    Ok(upstream)
}

/// Writes every non-zero voxel as `channel,i,j,k,x,y,z,value`.
pub fn write_voxels(path: &Path, grid: &Grid) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| writing_error(path, e))?;
    let geometry = grid.geometry();
    let mut written = 0usize;
    for (channel, i, j, k, value) in grid.nonzero() {
        let center = geometry.voxel_center(i, j, k);
        writer
            .serialize(VoxelRecord {
                channel,
                i,
                j,
                k,
                x: center.x,
                y: center.y,
                z: center.z,
                value,
            })
            .map_err(|e| writing_error(path, e))?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Writes one `index,channel,dx,dy,dz` row per atom.
pub fn write_gradients(path: &Path, atoms: &[Atom], gradients: &[Vector3<f64>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| writing_error(path, e))?;
    for (index, (atom, gradient)) in atoms.iter().zip(gradients).enumerate() {
        writer
            .serialize(GradientRecord {
                index,
                channel: atom.channel,
                dx: gradient.x,
                dy: gradient.y,
                dz: gradient.z,
            })
            .map_err(|e| writing_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

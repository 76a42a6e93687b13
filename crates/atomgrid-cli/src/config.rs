mod defaults;

use crate::cli::InputArgs;
use crate::error::{CliError, Result};
use atomgrid::core::models::atom::Atom;
use atomgrid::engine::config as core_config;
use atomgrid::engine::error::EngineError;
use defaults::DefaultsConfig;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialLatticeConfig {
    resolution: Option<f64>,
    channels: Option<usize>,
    origin: Option<[f64; 3]>,
    center: Option<[f64; 3]>,
    points: Option<[usize; 3]>,
    dimension: Option<f64>,
    #[serde(rename = "radius-scale")]
    radius_scale: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialGridConfig {
    grid: Option<PartialLatticeConfig>,
}

impl PartialGridConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves the final grid configuration.
    ///
    /// Precedence per value: dedicated CLI flag, then `--set`, then the file, then the
    /// built-in default. Placement and channel count fall back to the atoms themselves.
    pub fn merge_with_cli(
        mut self,
        args: &InputArgs,
        atoms: &[Atom],
    ) -> Result<core_config::GridConfig> {
        self.apply_set_values(&args.set_values)?;

        let defaults = DefaultsConfig::default();
        let lattice = self.grid.take().unwrap_or_default();

        let resolution = args
            .resolution
            .or(lattice.resolution)
            .unwrap_or(defaults.resolution);
        let channels = args
            .channels
            .or(lattice.channels)
            .unwrap_or_else(|| Self::channels_from_atoms(atoms));
        let radius_scale = args
            .radius_scale
            .or(lattice.radius_scale)
            .unwrap_or(defaults.radius_scale);

        let mut builder = core_config::GridConfigBuilder::new()
            .resolution(resolution)
            .channels(channels)
            .radius_scale(radius_scale);

        builder = match (lattice.origin, lattice.center) {
            (Some(_), Some(_)) => {
                return Err(CliError::Config(
                    "`grid.origin` and `grid.center` are mutually exclusive.".to_string(),
                ));
            }
            (Some(origin), None) => builder.origin(Point3::from(origin)),
            (None, Some(center)) => builder.center(Point3::from(center)),
            (None, None) => builder.center(Self::centroid(atoms)),
        };

        builder = match (lattice.points, lattice.dimension) {
            (Some(_), Some(_)) => {
                return Err(CliError::Config(
                    "`grid.points` and `grid.dimension` are mutually exclusive.".to_string(),
                ));
            }
            (Some(points), None) => builder.dimensions(points),
            (None, Some(side)) => builder.cube_side(side),
            (None, None) => builder.cube_side(defaults.dimension),
        };

        let config = builder.build().map_err(EngineError::from)?;
        debug!(geometry = %config.geometry, radius_scale = config.radius_scale, "Grid configuration resolved.");
        Ok(config)
    }

    fn channels_from_atoms(atoms: &[Atom]) -> usize {
        atoms.iter().map(|atom| atom.channel + 1).max().unwrap_or(1)
    }

    fn centroid(atoms: &[Atom]) -> Point3<f64> {
        if atoms.is_empty() {
            return Point3::origin();
        }
        let sum = atoms
            .iter()
            .fold(Vector3::zeros(), |acc: Vector3<f64>, atom| acc + atom.position.coords);
        Point3::from(sum / atoms.len() as f64)
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let lattice = self.grid.get_or_insert_with(Default::default);

            match key {
                "grid.resolution" => lattice.resolution = Some(parse_float(key, value_str)?),
                "grid.radius-scale" => lattice.radius_scale = Some(parse_float(key, value_str)?),
                "grid.dimension" => {
                    lattice.dimension = Some(parse_float(key, value_str)?);
                    lattice.points = None;
                }
                "grid.channels" => {
                    lattice.channels = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!(
                            "Invalid integer value for {}: {}",
                            key, value_str
                        ))
                    })?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_float(key: &str, value_str: &str) -> Result<f64> {
    value_str
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid float value for {}: {}", key, value_str)))
}

/// Loads the optional config file named by `args` and merges it with the CLI.
pub fn resolve(args: &InputArgs, atoms: &[Atom]) -> Result<core_config::GridConfig> {
    let partial = match &args.config {
        Some(path) => PartialGridConfig::from_file(path)?,
        None => PartialGridConfig::default(),
    };
    partial.merge_with_cli(args, atoms)
}

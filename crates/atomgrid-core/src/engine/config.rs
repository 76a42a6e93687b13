use crate::core::models::error::ModelError;
use crate::core::models::geometry::GridGeometry;
use nalgebra::Point3;
use thiserror::Error;

pub const DEFAULT_RADIUS_SCALE: f64 = 1.0;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("Invalid grid geometry: {0}")]
    Geometry(#[from] ModelError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub geometry: GridGeometry,
    /// Multiplier applied to every atom radius before the kernel is evaluated.
    pub radius_scale: f64,
}

impl GridConfig {
    pub fn new(geometry: GridGeometry, radius_scale: f64) -> Result<Self, ConfigError> {
        if !(radius_scale.is_finite() && radius_scale > 0.0) {
            return Err(ConfigError::InvalidValue {
                parameter: "radius_scale",
                reason: format!("{radius_scale} is not a positive scale factor"),
            });
        }
        Ok(Self {
            geometry,
            radius_scale,
        })
    }

    #[inline]
    pub fn effective_radius(&self, radius: f64) -> f64 {
        radius * self.radius_scale
    }
}

#[derive(Debug, Clone, Copy)]
enum Extent {
    Points([usize; 3]),
    Cube(f64),
}

#[derive(Default)]
pub struct GridConfigBuilder {
    origin: Option<Point3<f64>>,
    center: Option<Point3<f64>>,
    resolution: Option<f64>,
    channels: Option<usize>,
    dimensions: Option<[usize; 3]>,
    cube_side: Option<f64>,
    radius_scale: Option<f64>,
}

impl GridConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Center of voxel `(0, 0, 0)`. Mutually exclusive with [`Self::center`].
    pub fn origin(mut self, origin: Point3<f64>) -> Self {
        self.origin = Some(origin);
        self
    }
    /// Geometric center of the lattice. Mutually exclusive with [`Self::origin`].
    pub fn center(mut self, center: Point3<f64>) -> Self {
        self.center = Some(center);
        self
    }
    pub fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }
    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }
    /// Voxel counts along x, y and z. Mutually exclusive with [`Self::cube_side`].
    pub fn dimensions(mut self, dims: [usize; 3]) -> Self {
        self.dimensions = Some(dims);
        self
    }
    /// Side length of a cubic lattice, in coordinate units.
    pub fn cube_side(mut self, side_length: f64) -> Self {
        self.cube_side = Some(side_length);
        self
    }
    pub fn radius_scale(mut self, scale: f64) -> Self {
        self.radius_scale = Some(scale);
        self
    }

    pub fn build(self) -> Result<GridConfig, ConfigError> {
        let resolution = self
            .resolution
            .ok_or(ConfigError::MissingParameter("resolution"))?;
        let channels = self
            .channels
            .ok_or(ConfigError::MissingParameter("channels"))?;

        let extent = match (self.dimensions, self.cube_side) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidValue {
                    parameter: "dimensions",
                    reason: "dimensions and cube_side are mutually exclusive".to_string(),
                });
            }
            (Some(dims), None) => Extent::Points(dims),
            (None, Some(side)) => Extent::Cube(side),
            (None, None) => return Err(ConfigError::MissingParameter("dimensions or cube_side")),
        };

        let geometry = match (self.origin, self.center, extent) {
            (Some(_), Some(_), _) => {
                return Err(ConfigError::InvalidValue {
                    parameter: "origin",
                    reason: "origin and center are mutually exclusive".to_string(),
                });
            }
            (Some(origin), None, Extent::Points(dims)) => {
                GridGeometry::new(origin, resolution, channels, dims)?
            }
            (Some(origin), None, Extent::Cube(side)) => {
                let points = GridGeometry::cube_points(side, resolution)?;
                GridGeometry::new(origin, resolution, channels, [points; 3])?
            }
            (None, Some(center), Extent::Points(dims)) => {
                GridGeometry::centered(center, resolution, channels, dims)?
            }
            (None, Some(center), Extent::Cube(side)) => {
                GridGeometry::cube(center, side, resolution, channels)?
            }
            (None, None, _) => return Err(ConfigError::MissingParameter("origin or center")),
        };

        GridConfig::new(
            geometry,
            self.radius_scale.unwrap_or(DEFAULT_RADIUS_SCALE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> GridConfigBuilder {
        GridConfigBuilder::new()
            .center(Point3::origin())
            .resolution(1.0)
            .channels(1)
            .dimensions([5, 5, 5])
    }

    #[test]
    fn build_with_minimal_parameters_uses_default_scale() {
        let config = minimal().build().unwrap();
        assert_eq!(config.radius_scale, DEFAULT_RADIUS_SCALE);
        assert_eq!(config.geometry.dims(), [5, 5, 5]);
        assert_eq!(config.geometry.origin(), Point3::new(-2.0, -2.0, -2.0));
    }

    #[test]
    fn build_reports_missing_parameters() {
        let missing_resolution = GridConfigBuilder::new()
            .origin(Point3::origin())
            .channels(1)
            .dimensions([2, 2, 2])
            .build();
        assert_eq!(
            missing_resolution,
            Err(ConfigError::MissingParameter("resolution"))
        );

        let missing_placement = GridConfigBuilder::new()
            .resolution(1.0)
            .channels(1)
            .dimensions([2, 2, 2])
            .build();
        assert_eq!(
            missing_placement,
            Err(ConfigError::MissingParameter("origin or center"))
        );

        let missing_extent = GridConfigBuilder::new()
            .origin(Point3::origin())
            .resolution(1.0)
            .channels(1)
            .build();
        assert_eq!(
            missing_extent,
            Err(ConfigError::MissingParameter("dimensions or cube_side"))
        );
    }

    #[test]
    fn build_rejects_conflicting_parameters() {
        let both_placements = minimal().origin(Point3::origin()).build();
        assert!(matches!(
            both_placements,
            Err(ConfigError::InvalidValue {
                parameter: "origin",
                ..
            })
        ));

        let both_extents = minimal().cube_side(4.0).build();
        assert!(matches!(
            both_extents,
            Err(ConfigError::InvalidValue {
                parameter: "dimensions",
                ..
            })
        ));
    }

    #[test]
    fn build_with_cube_side_and_origin_keeps_origin() {
        let config = GridConfigBuilder::new()
            .origin(Point3::new(1.0, 2.0, 3.0))
            .resolution(0.5)
            .channels(2)
            .cube_side(2.0)
            .build()
            .unwrap();
        assert_eq!(config.geometry.dims(), [5, 5, 5]);
        assert_eq!(config.geometry.origin(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn build_rejects_cube_too_large_to_address() {
        for placement in [
            GridConfigBuilder::new().center(Point3::origin()),
            GridConfigBuilder::new().origin(Point3::origin()),
        ] {
            let result = placement
                .resolution(1e-300)
                .channels(1)
                .cube_side(1e300)
                .build();
            assert!(matches!(
                result,
                Err(ConfigError::Geometry(ModelError::InvalidParameter {
                    parameter: "side_length",
                    ..
                }))
            ));
        }

        let huge_points = GridConfigBuilder::new()
            .origin(Point3::origin())
            .resolution(1.0)
            .channels(1)
            .dimensions([1 << 21, 1 << 21, 1 << 22])
            .build();
        assert!(matches!(
            huge_points,
            Err(ConfigError::Geometry(ModelError::InvalidParameter {
                parameter: "dims",
                ..
            }))
        ));
    }

    #[test]
    fn build_with_center_and_cube_side_matches_cube_geometry() {
        let config = GridConfigBuilder::new()
            .center(Point3::new(1.0, 0.0, -1.0))
            .resolution(0.5)
            .channels(2)
            .cube_side(3.0)
            .build()
            .unwrap();
        let expected = GridGeometry::cube(Point3::new(1.0, 0.0, -1.0), 3.0, 0.5, 2).unwrap();
        assert_eq!(config.geometry, expected);
        assert_eq!(config.geometry.dims(), [7, 7, 7]);
    }

    #[test]
    fn build_propagates_geometry_errors() {
        let result = minimal().channels(0).build();
        assert!(matches!(
            result,
            Err(ConfigError::Geometry(ModelError::InvalidParameter {
                parameter: "channels",
                ..
            }))
        ));
    }

    #[test]
    fn build_rejects_non_positive_radius_scale() {
        for scale in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                minimal().radius_scale(scale).build(),
                Err(ConfigError::InvalidValue {
                    parameter: "radius_scale",
                    ..
                })
            ));
        }
    }

    #[test]
    fn effective_radius_applies_scale() {
        let config = minimal().radius_scale(1.5).build().unwrap();
        assert_eq!(config.effective_radius(2.0), 3.0);
    }
}

use super::error::ModelError;
use nalgebra::{Point3, Vector3};
use std::fmt;
use std::ops::RangeInclusive;

/// Largest number of `f64` values a single grid buffer can hold.
const MAX_GRID_VALUES: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// Channel count and voxel counts along x, y and z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub channels: usize,
    pub dims: [usize; 3],
}

impl GridShape {
    pub fn new(channels: usize, dims: [usize; 3]) -> Self {
        Self { channels, dims }
    }

    /// Total value count, or `None` if it does not fit in `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(self.channels, |acc, &n| acc.checked_mul(n))
    }

    /// Saturates instead of overflowing; shapes held by a [`GridGeometry`] never do.
    #[inline]
    pub fn voxels_per_channel(&self) -> usize {
        self.dims
            .iter()
            .fold(1usize, |acc, &n| acc.saturating_mul(n))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.channels.saturating_mul(self.voxels_per_channel())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} x {} x {} x {}]",
            self.channels, self.dims[0], self.dims[1], self.dims[2]
        )
    }
}

/// Placement and extent of a cubic-voxel lattice.
///
/// Voxel `(i, j, k)` is realized at the continuous position
/// `origin + resolution * (i, j, k)`; `origin` is therefore the *center* of voxel
/// `(0, 0, 0)`, not its corner. The same geometry is shared by every channel.
///
/// Values are validated on construction, so a `GridGeometry` always has a finite
/// origin, a positive finite resolution, and at least one channel and one voxel per
/// axis.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    origin: Point3<f64>,
    resolution: f64,
    shape: GridShape,
}

impl GridGeometry {
    /// Creates a geometry from the position of the first voxel center.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidInput`] for a non-finite origin and
    /// [`ModelError::InvalidParameter`] for a non-positive resolution, zero channels, an
    /// empty axis, or a lattice too large to allocate.
    pub fn new(
        origin: Point3<f64>,
        resolution: f64,
        channels: usize,
        dims: [usize; 3],
    ) -> Result<Self, ModelError> {
        if !origin.coords.iter().all(|c| c.is_finite()) {
            return Err(ModelError::invalid_input(
                "grid origin",
                format!("non-finite origin ({}, {}, {})", origin.x, origin.y, origin.z),
            ));
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(ModelError::invalid_parameter(
                "resolution",
                format!("{resolution} is not a positive voxel edge length"),
            ));
        }
        if channels == 0 {
            return Err(ModelError::invalid_parameter(
                "channels",
                "a grid needs at least one channel",
            ));
        }
        if dims.contains(&0) {
            return Err(ModelError::invalid_parameter(
                "dims",
                format!("{dims:?} has an empty axis"),
            ));
        }
        let shape = GridShape::new(channels, dims);
        if shape
            .checked_len()
            .is_none_or(|len| len > MAX_GRID_VALUES)
        {
            return Err(ModelError::invalid_parameter(
                "dims",
                format!("{shape} holds more values than a grid buffer can address"),
            ));
        }
        Ok(Self {
            origin,
            resolution,
            shape,
        })
    }

    /// Creates a geometry whose voxel lattice is symmetric about `center`.
    ///
    /// With an odd number of voxels along an axis, `center` coincides with the middle
    /// voxel center; with an even number it falls halfway between the two middle ones.
    pub fn centered(
        center: Point3<f64>,
        resolution: f64,
        channels: usize,
        dims: [usize; 3],
    ) -> Result<Self, ModelError> {
        if !center.coords.iter().all(|c| c.is_finite()) {
            return Err(ModelError::invalid_input(
                "grid center",
                format!("non-finite center ({}, {}, {})", center.x, center.y, center.z),
            ));
        }
        let half_extent = Vector3::new(
            dims[0].saturating_sub(1) as f64,
            dims[1].saturating_sub(1) as f64,
            dims[2].saturating_sub(1) as f64,
        ) * (0.5 * resolution);
        Self::new(center - half_extent, resolution, channels, dims)
    }

    /// Creates a cubic lattice spanning `side_length` along every axis, centered on
    /// `center`, with [`Self::cube_points`] voxels per axis.
    pub fn cube(
        center: Point3<f64>,
        side_length: f64,
        resolution: f64,
        channels: usize,
    ) -> Result<Self, ModelError> {
        let points = Self::cube_points(side_length, resolution)?;
        Self::centered(center, resolution, channels, [points; 3])
    }

    /// Number of voxel centers per axis of a cube: `round(side_length / resolution) + 1`,
    /// so both faces of the cube carry voxel centers.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidParameter`] for a negative or non-finite side, a
    /// non-positive resolution, or a point count that does not fit in `usize`.
    pub fn cube_points(side_length: f64, resolution: f64) -> Result<usize, ModelError> {
        if !(side_length.is_finite() && side_length >= 0.0) {
            return Err(ModelError::invalid_parameter(
                "side_length",
                format!("{side_length} is not a valid cube side length"),
            ));
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(ModelError::invalid_parameter(
                "resolution",
                format!("{resolution} is not a positive voxel edge length"),
            ));
        }
        let intervals = (side_length / resolution).round();
        // `usize::MAX as f64` rounds up to 2^64, so anything below it converts exactly.
        if !(intervals.is_finite() && intervals < usize::MAX as f64) {
            return Err(ModelError::invalid_parameter(
                "side_length",
                format!("{side_length} / {resolution} gives too many voxels per axis"),
            ));
        }
        Ok(intervals as usize + 1)
    }

    #[inline]
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.shape.channels
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.shape.dims
    }

    #[inline]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Total number of values across all channels.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    #[inline]
    pub fn voxel_center(&self, i: usize, j: usize, k: usize) -> Point3<f64> {
        self.origin + Vector3::new(i as f64, j as f64, k as f64) * self.resolution
    }

    /// Row-major offset of `(channel, i, j, k)` in a flat buffer.
    #[inline]
    pub fn flat_index(&self, channel: usize, i: usize, j: usize, k: usize) -> usize {
        let [nx, ny, nz] = self.shape.dims;
        ((channel * nx + i) * ny + j) * nz + k
    }

    /// Inclusive range of voxel indices along `axis` whose centers may lie within
    /// `cutoff` of `coordinate`, clipped to the grid.
    ///
    /// The range is padded by one voxel on each side; callers still apply the exact
    /// distance test. Returns `None` when the interval misses the grid entirely.
    pub fn voxel_range(
        &self,
        axis: usize,
        coordinate: f64,
        cutoff: f64,
    ) -> Option<RangeInclusive<usize>> {
        let last = (self.shape.dims[axis] - 1) as f64;
        let offset = coordinate - self.origin[axis];
        let lo = ((offset - cutoff) / self.resolution).ceil() - 1.0;
        let hi = ((offset + cutoff) / self.resolution).floor() + 1.0;
        if hi < 0.0 || lo > last {
            return None;
        }
        Some(lo.max(0.0) as usize..=hi.min(last) as usize)
    }

    /// Candidate voxel box of a sphere of radius `cutoff` around `position`.
    pub fn voxel_box(
        &self,
        position: &Point3<f64>,
        cutoff: f64,
    ) -> Option<[RangeInclusive<usize>; 3]> {
        Some([
            self.voxel_range(0, position.x, cutoff)?,
            self.voxel_range(1, position.y, cutoff)?,
            self.voxel_range(2, position.z, cutoff)?,
        ])
    }

    /// Checks that `other` describes exactly the same lattice.
    ///
    /// # Errors
    ///
    /// [`ModelError::ShapeMismatch`] when channel count or voxel counts differ, and
    /// [`ModelError::GeometryMismatch`] when only the placement (origin or resolution)
    /// differs.
    pub fn ensure_matches(&self, other: &GridGeometry) -> Result<(), ModelError> {
        if self.shape != other.shape {
            return Err(ModelError::ShapeMismatch {
                expected: self.shape,
                found: other.shape,
            });
        }
        if self.origin != other.origin || self.resolution != other.resolution {
            return Err(ModelError::GeometryMismatch {
                expected: self.to_string(),
                found: other.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for GridGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} grid at ({:.4}, {:.4}, {:.4}) with resolution {:.4}",
            self.shape, self.origin.x, self.origin.y, self.origin.z, self.resolution
        )
    }
}

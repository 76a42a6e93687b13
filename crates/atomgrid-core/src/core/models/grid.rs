use super::error::ModelError;
use super::geometry::GridGeometry;

/// A dense `(channel, x, y, z)` tensor tied to the geometry it was built for.
///
/// The same type carries gridded densities (forward pass output) and upstream
/// gradients `dloss/dgrid` (backward pass input), so the backward pass can verify that
/// both refer to an identical lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    geometry: GridGeometry,
    data: Vec<f64>,
}

/// Aggregate statistics of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelSummary {
    pub sum: f64,
    pub max: f64,
    pub occupied_voxels: usize,
}

impl Grid {
    pub fn zeros(geometry: GridGeometry) -> Self {
        let data = vec![0.0; geometry.len()];
        Self { geometry, data }
    }

    /// Wraps an externally produced buffer, e.g. an upstream gradient.
    ///
    /// # Errors
    ///
    /// * [`ModelError::LengthMismatch`] if `data` does not hold exactly one value per
    ///   voxel and channel.
    /// * [`ModelError::InvalidInput`] if any value is NaN or infinite.
    pub fn from_vec(geometry: GridGeometry, data: Vec<f64>) -> Result<Self, ModelError> {
        if data.len() != geometry.len() {
            return Err(ModelError::LengthMismatch {
                shape: geometry.shape(),
                expected: geometry.len(),
                found: data.len(),
            });
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::invalid_input(
                format!("tensor element {pos}"),
                format!("non-finite value {}", data[pos]),
            ));
        }
        Ok(Self { geometry, data })
    }

    /// Builds a tensor by evaluating `f(channel, i, j, k)` at every voxel.
    pub fn from_fn<F>(geometry: GridGeometry, mut f: F) -> Result<Self, ModelError>
    where
        F: FnMut(usize, usize, usize, usize) -> f64,
    {
        let [nx, ny, nz] = geometry.dims();
        let mut data = Vec::with_capacity(geometry.len());
        for c in 0..geometry.channels() {
            for i in 0..nx {
                for j in 0..ny {
                    for k in 0..nz {
                        data.push(f(c, i, j, k));
                    }
                }
            }
        }
        Self::from_vec(geometry, data)
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    pub fn get(&self, channel: usize, i: usize, j: usize, k: usize) -> Option<f64> {
        let [nx, ny, nz] = self.geometry.dims();
        if channel >= self.geometry.channels() || i >= nx || j >= ny || k >= nz {
            return None;
        }
        Some(self.data[self.geometry.flat_index(channel, i, j, k)])
    }

    /// Sets a single voxel value.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidInput`] if the index lies outside the grid or the value is
    /// not finite.
    pub fn set(
        &mut self,
        channel: usize,
        i: usize,
        j: usize,
        k: usize,
        value: f64,
    ) -> Result<(), ModelError> {
        let location = format!("voxel ({channel}, {i}, {j}, {k})");
        if self.get(channel, i, j, k).is_none() {
            return Err(ModelError::invalid_input(
                location,
                format!("index outside {}", self.geometry.shape()),
            ));
        }
        if !value.is_finite() {
            return Err(ModelError::invalid_input(
                location,
                format!("non-finite value {value}"),
            ));
        }
        let idx = self.geometry.flat_index(channel, i, j, k);
        self.data[idx] = value;
        Ok(())
    }

    /// Values of one channel, in `(x, y, z)` row-major order.
    pub fn channel(&self, channel: usize) -> Option<&[f64]> {
        if channel >= self.geometry.channels() {
            return None;
        }
        let n = self.geometry.shape().voxels_per_channel();
        Some(&self.data[channel * n..(channel + 1) * n])
    }

    pub fn channel_summary(&self, channel: usize) -> Option<ChannelSummary> {
        let values = self.channel(channel)?;
        let mut summary = ChannelSummary {
            max: f64::NEG_INFINITY,
            ..Default::default()
        };
        for &v in values {
            summary.sum += v;
            summary.max = summary.max.max(v);
            if v != 0.0 {
                summary.occupied_voxels += 1;
            }
        }
        Some(summary)
    }

    /// Elementwise inner product `sum(self * other)` over two tensors on the same lattice.
    pub fn dot(&self, other: &Grid) -> Result<f64, ModelError> {
        self.geometry.ensure_matches(&other.geometry)?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a * b)
            .sum())
    }

    /// Iterates over non-zero voxels as `(channel, i, j, k, value)`.
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, usize, usize, usize, f64)> + '_ {
        let [nx, ny, nz] = self.geometry.dims();
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(move |(idx, &v)| {
                let k = idx % nz;
                let j = (idx / nz) % ny;
                let i = (idx / (nz * ny)) % nx;
                let c = idx / (nz * ny * nx);
                (c, i, j, k, v)
            })
    }
}

use super::error::ModelError;
use nalgebra::Point3;

/// A point density source rasterized onto the grid.
///
/// Atoms are plain input records owned by the caller; they are validated when a
/// [`crate::engine::context::GridContext`] is built from them and are never mutated by
/// the gridding passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    /// Cartesian position, in the same frame and units as the grid origin.
    pub position: Point3<f64>,
    /// The grid channel (atom type) this atom contributes density to.
    pub channel: usize,
    /// Van der Waals-like radius setting the width of the density kernel.
    pub radius: f64,
}

impl Atom {
    pub fn new(position: Point3<f64>, channel: usize, radius: f64) -> Self {
        Self {
            position,
            channel,
            radius,
        }
    }

    /// Checks the atom against the ingestion rules.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the atom in its list, used in error messages.
    /// * `num_channels` - Number of channels of the target grid.
    ///
    /// # Errors
    ///
    /// * [`ModelError::InvalidInput`] if any coordinate is NaN or infinite.
    /// * [`ModelError::InvalidParameter`] if the radius is not a positive finite number
    ///   or the channel does not exist in the grid.
    pub fn validate(&self, index: usize, num_channels: usize) -> Result<(), ModelError> {
        if !self.position.coords.iter().all(|c| c.is_finite()) {
            return Err(ModelError::invalid_input(
                format!("atom {index}"),
                format!(
                    "non-finite position ({}, {}, {})",
                    self.position.x, self.position.y, self.position.z
                ),
            ));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ModelError::invalid_parameter(
                "radius",
                format!("atom {index} has radius {}, expected a positive value", self.radius),
            ));
        }
        if self.channel >= num_channels {
            return Err(ModelError::invalid_parameter(
                "channel",
                format!(
                    "atom {index} targets channel {} but the grid has {num_channels} channel(s)",
                    self.channel
                ),
            ));
        }
        Ok(())
    }
}

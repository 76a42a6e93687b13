use super::config::GridConfig;
use super::error::EngineError;
use crate::core::kernel;
use crate::core::models::atom::Atom;
use crate::core::models::error::ModelError;
use crate::core::models::geometry::GridGeometry;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

/// A validated view of an atom list against a grid configuration.
///
/// Building the context is the single ingestion point: every atom is checked once
/// here, after which the passes can evaluate the kernel without re-validating. Atom
/// indices are also bucketed by channel, preserving list order, so the forward pass
/// only visits atoms that can contribute to the plane it owns.
#[derive(Debug)]
pub struct GridContext<'a> {
    atoms: &'a [Atom],
    config: &'a GridConfig,
    channel_members: Vec<Vec<usize>>,
}

impl<'a> GridContext<'a> {
    pub fn new(atoms: &'a [Atom], config: &'a GridConfig) -> Result<Self, EngineError> {
        let num_channels = config.geometry.channels();
        let mut channel_members = vec![Vec::new(); num_channels];

        for (index, atom) in atoms.iter().enumerate() {
            atom.validate(index, num_channels)?;
            let effective = config.effective_radius(atom.radius);
            if !(effective.is_finite() && effective > 0.0) {
                return Err(ModelError::InvalidParameter {
                    parameter: "radius",
                    reason: format!(
                        "atom {index} radius {} scaled by {} gives {effective}, expected a positive finite value",
                        atom.radius, config.radius_scale
                    ),
                }
                .into());
            }
            channel_members[atom.channel].push(index);
        }

        if atoms.is_empty() {
            warn!("Grid context built from an empty atom list; every voxel will be zero.");
        }

        let context = Self {
            atoms,
            config,
            channel_members,
        };

        let outside = atoms
            .iter()
            .filter(|atom| context.support(atom).is_none())
            .count();
        if outside > 0 {
            warn!(
                atoms_outside = outside,
                "Some atoms have no voxel within their cutoff and will not contribute."
            );
        }
        debug!(
            atoms = atoms.len(),
            channels = num_channels,
            voxels = config.geometry.len(),
            "Grid context ready."
        );

        Ok(context)
    }

    #[inline]
    pub fn atoms(&self) -> &'a [Atom] {
        self.atoms
    }

    #[inline]
    pub fn config(&self) -> &'a GridConfig {
        self.config
    }

    #[inline]
    pub fn geometry(&self) -> &'a GridGeometry {
        &self.config.geometry
    }

    /// Indices of the atoms assigned to `channel`, in atom-list order.
    #[inline]
    pub fn channel_members(&self, channel: usize) -> &[usize] {
        self.channel_members
            .get(channel)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[inline]
    pub fn radius_of(&self, atom: &Atom) -> f64 {
        self.config.effective_radius(atom.radius)
    }

    /// Candidate voxel box of an atom: every voxel within its cutoff lies inside it.
    #[inline]
    pub fn support(&self, atom: &Atom) -> Option<[RangeInclusive<usize>; 3]> {
        self.geometry()
            .voxel_box(&atom.position, kernel::cutoff(self.radius_of(atom)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::GridConfigBuilder;
    use nalgebra::Point3;

    fn config(channels: usize) -> GridConfig {
        GridConfigBuilder::new()
            .center(Point3::origin())
            .resolution(0.5)
            .channels(channels)
            .dimensions([9, 9, 9])
            .build()
            .unwrap()
    }

    #[test]
    fn new_buckets_atoms_by_channel_in_list_order() {
        let config = config(3);
        let atoms = vec![
            Atom::new(Point3::origin(), 2, 1.0),
            Atom::new(Point3::new(0.5, 0.0, 0.0), 0, 1.0),
            Atom::new(Point3::new(-0.5, 0.0, 0.0), 2, 1.0),
        ];
        let context = GridContext::new(&atoms, &config).unwrap();
        assert_eq!(context.channel_members(0), &[1]);
        assert!(context.channel_members(1).is_empty());
        assert_eq!(context.channel_members(2), &[0, 2]);
        assert!(context.channel_members(7).is_empty());
    }

    #[test]
    fn new_rejects_invalid_atoms() {
        let config = config(1);

        let bad_radius = vec![Atom::new(Point3::origin(), 0, -1.0)];
        assert!(matches!(
            GridContext::new(&bad_radius, &config),
            Err(EngineError::Model(ModelError::InvalidParameter {
                parameter: "radius",
                ..
            }))
        ));

        let bad_position = vec![
            Atom::new(Point3::origin(), 0, 1.0),
            Atom::new(Point3::new(f64::NAN, 0.0, 0.0), 0, 1.0),
        ];
        assert!(matches!(
            GridContext::new(&bad_position, &config),
            Err(EngineError::Model(ModelError::InvalidInput { .. }))
        ));

        let bad_channel = vec![Atom::new(Point3::origin(), 1, 1.0)];
        assert!(matches!(
            GridContext::new(&bad_channel, &config),
            Err(EngineError::Model(ModelError::InvalidParameter {
                parameter: "channel",
                ..
            }))
        ));
    }

    #[test]
    fn new_rejects_scaled_radius_that_is_not_positive() {
        let underflow = GridConfig::new(config(1).geometry, 1e-200).unwrap();
        let atoms = vec![Atom::new(Point3::origin(), 0, 1e-200)];
        assert!(matches!(
            GridContext::new(&atoms, &underflow),
            Err(EngineError::Model(ModelError::InvalidParameter {
                parameter: "radius",
                ..
            }))
        ));

        let overflow = GridConfig::new(config(1).geometry, 1e300).unwrap();
        let atoms = vec![Atom::new(Point3::origin(), 0, 1e300)];
        assert!(GridContext::new(&atoms, &overflow).is_err());

        let atoms = vec![Atom::new(Point3::origin(), 0, 1.0)];
        for radius_scale in [0.0, -2.0] {
            let bypassed = GridConfig {
                geometry: config(1).geometry,
                radius_scale,
            };
            assert!(matches!(
                GridContext::new(&atoms, &bypassed),
                Err(EngineError::Model(ModelError::InvalidParameter {
                    parameter: "radius",
                    ..
                }))
            ));
        }
    }

    #[test]
    fn new_accepts_empty_atom_list() {
        let config = config(1);
        let context = GridContext::new(&[], &config).unwrap();
        assert!(context.atoms().is_empty());
    }

    #[test]
    fn radius_and_support_follow_radius_scale() {
        let config = GridConfigBuilder::new()
            .origin(Point3::origin())
            .resolution(1.0)
            .channels(1)
            .dimensions([20, 20, 20])
            .radius_scale(2.0)
            .build()
            .unwrap();
        let atoms = vec![Atom::new(Point3::new(10.0, 10.0, 10.0), 0, 1.0)];
        let context = GridContext::new(&atoms, &config).unwrap();

        assert_eq!(context.radius_of(&atoms[0]), 2.0);
        let [xs, _, _] = context.support(&atoms[0]).unwrap();
        // cutoff 3.0 around x = 10 covers voxels 7..=13, padded by one on each side.
        assert_eq!(xs, 6..=14);
    }

    #[test]
    fn support_is_none_for_atoms_far_outside_the_grid() {
        let config = config(1);
        let atoms = vec![Atom::new(Point3::new(100.0, 0.0, 0.0), 0, 1.0)];
        let context = GridContext::new(&atoms, &config).unwrap();
        assert!(context.support(&atoms[0]).is_none());
    }
}

use crate::core::kernel;
use crate::core::models::atom::Atom;
use crate::core::models::grid::Grid;
use crate::engine::context::GridContext;
use crate::engine::error::EngineError;
use itertools::iproduct;
use nalgebra::Vector3;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Back-propagates `upstream = dloss/dgrid` onto the atom positions.
///
/// For every atom, sums `upstream[g] * K'(d, r) * (a - g) / d` over the voxels `g` of
/// its channel with `d = |a - g|` inside the cutoff. A voxel coinciding with the atom
/// (`d == 0`) has no defined direction and contributes nothing.
///
/// # Errors
///
/// Fails with a shape or geometry mismatch when `upstream` was not built on the
/// context's lattice.
#[instrument(skip_all, name = "backward_task")]
pub fn run(context: &GridContext, upstream: &Grid) -> Result<Vec<Vector3<f64>>, EngineError> {
    context.geometry().ensure_matches(upstream.geometry())?;

    info!(
        atoms = context.atoms().len(),
        "Starting backward atom-gradient pass."
    );

    #[cfg(not(feature = "parallel"))]
    let iterator = context.atoms().iter();

    #[cfg(feature = "parallel")]
    let iterator = context.atoms().par_iter();

    let gradients: Vec<Vector3<f64>> = iterator
        .map(|atom| atom_gradient(context, atom, upstream.as_slice()))
        .collect();

    info!("Backward atom-gradient pass finished.");
    Ok(gradients)
}

fn atom_gradient(context: &GridContext, atom: &Atom, upstream: &[f64]) -> Vector3<f64> {
    let Some([xs, ys, zs]) = context.support(atom) else {
        return Vector3::zeros();
    };
    let geometry = context.geometry();
    let radius = context.radius_of(atom);
    let cutoff = kernel::cutoff(radius);

    let mut gradient = Vector3::<f64>::zeros();
    for (i, j, k) in iproduct!(xs, ys, zs) {
        let offset = atom.position - geometry.voxel_center(i, j, k);
        let dist = offset.norm();
        if dist >= cutoff || dist == 0.0 {
            continue;
        }
        let weight = upstream[geometry.flat_index(atom.channel, i, j, k)];
        gradient += offset * (weight * kernel::density_derivative(dist, radius) / dist);
    }
    gradient
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::error::ModelError;
    use crate::core::models::geometry::GridGeometry;
    use crate::engine::config::{GridConfig, GridConfigBuilder};
    use crate::engine::tasks::forward;
    use nalgebra::Point3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn config(channels: usize) -> GridConfig {
        GridConfigBuilder::new()
            .center(Point3::origin())
            .resolution(0.5)
            .channels(channels)
            .dimensions([11, 11, 11])
            .build()
            .unwrap()
    }

    fn random_upstream(geometry: &GridGeometry, seed: u64) -> Grid {
        let mut rng = StdRng::seed_from_u64(seed);
        Grid::from_fn(geometry.clone(), |_, _, _, _| rng.gen_range(-1.0..1.0)).unwrap()
    }

    fn loss(atoms: &[Atom], config: &GridConfig, upstream: &Grid) -> f64 {
        let context = GridContext::new(atoms, config).unwrap();
        forward::run(&context).dot(upstream).unwrap()
    }

    #[test]
    fn gradient_matches_central_differences() {
        let config = config(2);
        let atoms = vec![
            Atom::new(Point3::new(0.13, -0.27, 0.41), 0, 1.1),
            Atom::new(Point3::new(-0.62, 0.35, -0.18), 1, 0.8),
            Atom::new(Point3::new(0.91, 0.44, -0.71), 0, 1.6),
        ];
        let upstream = random_upstream(&config.geometry, 7);

        let context = GridContext::new(&atoms, &config).unwrap();
        let analytic = run(&context, &upstream).unwrap();

        let h = 1e-5;
        for (n, gradient) in analytic.iter().enumerate() {
            for axis in 0..3 {
                let mut plus = atoms.clone();
                let mut minus = atoms.clone();
                plus[n].position[axis] += h;
                minus[n].position[axis] -= h;
                let numeric =
                    (loss(&plus, &config, &upstream) - loss(&minus, &config, &upstream)) / (2.0 * h);
                assert!(
                    (numeric - gradient[axis]).abs() < 1e-4,
                    "atom {n} axis {axis}: numeric {numeric} vs analytic {}",
                    gradient[axis]
                );
            }
        }
    }

    #[test]
    fn zero_upstream_gives_zero_gradient() {
        let config = config(1);
        let atoms = vec![Atom::new(Point3::new(0.2, 0.1, 0.0), 0, 1.0)];
        let context = GridContext::new(&atoms, &config).unwrap();
        let upstream = Grid::zeros(config.geometry.clone());
        assert_eq!(run(&context, &upstream).unwrap(), vec![Vector3::zeros()]);
    }

    #[test]
    fn uniform_upstream_on_symmetric_placement_cancels() {
        let config = config(1);
        let atoms = vec![Atom::new(Point3::origin(), 0, 1.2)];
        let context = GridContext::new(&atoms, &config).unwrap();
        let upstream = Grid::from_vec(config.geometry.clone(), vec![1.0; config.geometry.len()])
            .unwrap();
        let gradient = run(&context, &upstream).unwrap()[0];
        assert!(gradient.norm() < 1e-12, "gradient {gradient}");
    }

    #[test]
    fn atom_on_voxel_center_skips_the_coincident_voxel() {
        let config = config(1);
        let geometry = &config.geometry;
        let atoms = vec![Atom::new(geometry.voxel_center(5, 5, 5), 0, 1.0)];
        let context = GridContext::new(&atoms, &config).unwrap();

        let mut upstream = Grid::zeros(geometry.clone());
        upstream.set(0, 5, 5, 5, 1.0).unwrap();
        let gradient = run(&context, &upstream).unwrap()[0];
        assert_eq!(gradient, Vector3::zeros());
        assert!(gradient.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn single_voxel_upstream_pulls_atom_along_the_connecting_axis() {
        let config = config(1);
        let geometry = &config.geometry;
        let atoms = vec![Atom::new(geometry.voxel_center(5, 5, 5), 0, 1.0)];
        let context = GridContext::new(&atoms, &config).unwrap();

        // Voxel one step along +x, at distance 0.5 (Gaussian core).
        let mut upstream = Grid::zeros(geometry.clone());
        upstream.set(0, 6, 5, 5, 1.0).unwrap();
        let gradient = run(&context, &upstream).unwrap()[0];

        let d: f64 = 0.5;
        let expected_x = kernel::density_derivative(d, 1.0) * (-d) / d;
        assert!((gradient.x - expected_x).abs() < 1e-12);
        assert!(gradient.x > 0.0);
        assert_eq!(gradient.y, 0.0);
        assert_eq!(gradient.z, 0.0);
    }

    #[test]
    fn gradient_ignores_other_channels() {
        let config = config(2);
        let atoms = vec![Atom::new(Point3::new(0.1, 0.2, -0.1), 0, 1.0)];
        let context = GridContext::new(&atoms, &config).unwrap();

        let upstream = Grid::from_fn(config.geometry.clone(), |c, i, _, _| {
            if c == 1 { i as f64 } else { 0.0 }
        })
        .unwrap();
        assert_eq!(run(&context, &upstream).unwrap(), vec![Vector3::zeros()]);
    }

    #[test]
    fn output_preserves_atom_order_and_count() {
        let config = config(1);
        let atoms = vec![
            Atom::new(Point3::new(-1.0, 0.0, 0.0), 0, 1.0),
            Atom::new(Point3::new(50.0, 0.0, 0.0), 0, 1.0),
            Atom::new(Point3::new(1.0, 0.0, 0.0), 0, 1.0),
        ];
        let context = GridContext::new(&atoms, &config).unwrap();
        let upstream = Grid::from_fn(config.geometry.clone(), |_, i, _, _| i as f64).unwrap();
        let gradients = run(&context, &upstream).unwrap();

        assert_eq!(gradients.len(), 3);
        assert_eq!(gradients[1], Vector3::zeros());
        // Upstream grows along +x, so moving either atom toward +x raises the loss.
        assert!(gradients[0].x > 0.0);
        assert!(gradients[2].x > 0.0);
    }

    #[test]
    fn mismatched_upstream_is_rejected() {
        let config = config(1);
        let atoms = vec![Atom::new(Point3::origin(), 0, 1.0)];
        let context = GridContext::new(&atoms, &config).unwrap();

        let wrong_channels = Grid::zeros(
            GridGeometry::new(config.geometry.origin(), 0.5, 2, [11, 11, 11]).unwrap(),
        );
        assert!(matches!(
            run(&context, &wrong_channels),
            Err(EngineError::Model(ModelError::ShapeMismatch { .. }))
        ));

        let shifted = Grid::zeros(
            GridGeometry::new(Point3::new(0.0, 0.0, 0.0), 0.5, 1, [11, 11, 11]).unwrap(),
        );
        assert!(matches!(
            run(&context, &shifted),
            Err(EngineError::Model(ModelError::GeometryMismatch { .. }))
        ));
    }
}

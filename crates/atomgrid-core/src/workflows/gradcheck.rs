use crate::core::models::atom::Atom;
use crate::core::models::error::ModelError;
use crate::core::models::grid::Grid;
use crate::engine::config::GridConfig;
use crate::engine::context::GridContext;
use crate::engine::error::EngineError;
use crate::engine::tasks;
use nalgebra::Vector3;
use tracing::{debug, info, instrument};

/// Outcome of comparing analytic atom gradients with central differences.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientCheckReport {
    pub step: f64,
    pub analytic: Vec<Vector3<f64>>,
    pub numeric: Vec<Vector3<f64>>,
    /// Largest absolute per-coordinate deviation over all atoms.
    pub max_abs_error: f64,
    /// Atom holding `max_abs_error`, `None` for an empty atom list.
    pub worst_atom: Option<usize>,
}

impl GradientCheckReport {
    pub fn passes(&self, tolerance: f64) -> bool {
        self.max_abs_error <= tolerance
    }
}

/// Verifies the backward pass against finite differences of the forward pass.
///
/// For each atom and axis the scalar `sum(upstream * grid)` is re-evaluated with the
/// atom displaced by `+step` and `-step`; the central difference converges to the
/// analytic gradient as `O(step^2)` wherever the kernel is twice differentiable.
///
/// # Errors
///
/// * [`ModelError::InvalidParameter`] if `step` is not positive and finite.
/// * Any ingestion or shape error raised by the underlying passes.
#[instrument(skip_all, name = "gradcheck_workflow", fields(atoms = atoms.len(), step = step))]
pub fn run(
    atoms: &[Atom],
    config: &GridConfig,
    upstream: &Grid,
    step: f64,
) -> Result<GradientCheckReport, EngineError> {
    if !(step.is_finite() && step > 0.0) {
        return Err(ModelError::InvalidParameter {
            parameter: "step",
            reason: format!("{step} is not a positive finite displacement"),
        }
        .into());
    }

    let context = GridContext::new(atoms, config)?;
    let analytic = tasks::backward::run(&context, upstream)?;

    info!(
        evaluations = 6 * atoms.len(),
        "Evaluating central differences."
    );

    let mut displaced = atoms.to_vec();
    let mut numeric = Vec::with_capacity(atoms.len());
    for n in 0..atoms.len() {
        let mut gradient = Vector3::<f64>::zeros();
        for axis in 0..3 {
            let original = displaced[n].position[axis];

            displaced[n].position[axis] = original + step;
            let forward_loss = displaced_loss(&displaced, config, upstream)?;

            displaced[n].position[axis] = original - step;
            let backward_loss = displaced_loss(&displaced, config, upstream)?;

            displaced[n].position[axis] = original;
            gradient[axis] = (forward_loss - backward_loss) / (2.0 * step);
        }
        debug!(atom = n, numeric = ?gradient, analytic = ?analytic[n], "Atom checked.");
        numeric.push(gradient);
    }

    let mut max_abs_error = 0.0;
    let mut worst_atom = None;
    for (n, (a, b)) in analytic.iter().zip(&numeric).enumerate() {
        let error = (a - b).amax();
        if worst_atom.is_none() || error > max_abs_error {
            max_abs_error = error;
            worst_atom = Some(n);
        }
    }

    info!(max_abs_error, worst_atom = ?worst_atom, "Gradient check finished.");

    Ok(GradientCheckReport {
        step,
        analytic,
        numeric,
        max_abs_error,
        worst_atom,
    })
}

fn displaced_loss(atoms: &[Atom], config: &GridConfig, upstream: &Grid) -> Result<f64, EngineError> {
    let context = GridContext::new(atoms, config)?;
    Ok(tasks::forward::run(&context).dot(upstream)?)
}

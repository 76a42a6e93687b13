use crate::cli::GradcheckArgs;
use crate::config;
use crate::error::{CliError, Result};
use crate::io;
use atomgrid::core::models::grid::Grid;
use atomgrid::workflows;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

pub fn run(args: GradcheckArgs) -> Result<()> {
    info!("Loading atoms from {:?}", &args.input.input);
    let atoms = io::read_atoms(&args.input.input)?;
    let grid_config = config::resolve(&args.input, &atoms)?;

    info!(seed = args.seed, "Drawing random upstream gradient.");
    let mut rng = StdRng::seed_from_u64(args.seed);
    let upstream = Grid::from_fn(grid_config.geometry.clone(), |_, _, _, _| {
        rng.gen_range(-1.0..1.0)
    })?;

    println!(
        "Checking gradients of {} atom(s) on {} with step {:e}...",
        atoms.len(),
        grid_config.geometry,
        args.step
    );
    let report = workflows::gradcheck::run(&atoms, &grid_config, &upstream, args.step)?;

    if let Some(worst) = report.worst_atom {
        let (analytic, numeric) = (report.analytic[worst], report.numeric[worst]);
        println!(
            "Worst atom {}: analytic ({:.6e}, {:.6e}, {:.6e}) vs numeric ({:.6e}, {:.6e}, {:.6e})",
            worst, analytic.x, analytic.y, analytic.z, numeric.x, numeric.y, numeric.z
        );
    } else {
        warn!("No atoms to check.");
    }
    println!("Max absolute deviation: {:.3e}", report.max_abs_error);

    if !report.passes(args.tolerance) {
        return Err(CliError::GradientCheck {
            max_abs_error: report.max_abs_error,
            tolerance: args.tolerance,
        });
    }
    println!("✓ Gradient check passed (tolerance {:.3e}).", args.tolerance);
    Ok(())
}

use crate::cli::GradientArgs;
use crate::config;
use crate::error::Result;
use crate::io;
use atomgrid::workflows;
use tracing::info;

pub fn run(args: GradientArgs) -> Result<()> {
    info!("Loading atoms from {:?}", &args.input.input);
    let atoms = io::read_atoms(&args.input.input)?;
    let grid_config = config::resolve(&args.input, &atoms)?;

    info!("Loading upstream gradient from {:?}", &args.upstream);
    let upstream = io::read_upstream(&args.upstream, &grid_config.geometry)?;

    println!(
        "Back-propagating onto {} atom(s) from {}...",
        atoms.len(),
        grid_config.geometry
    );
    let gradients = workflows::grid::backward(&atoms, &grid_config, &upstream)?;

    println!(
        "{:>6} {:>8} {:>14} {:>14} {:>14}",
        "index", "channel", "dx", "dy", "dz"
    );
    for (index, (atom, gradient)) in atoms.iter().zip(&gradients).enumerate() {
        println!(
            "{:>6} {:>8} {:>14.6e} {:>14.6e} {:>14.6e}",
            index, atom.channel, gradient.x, gradient.y, gradient.z
        );
    }

    if let Some(output) = &args.output {
        info!("Writing atom gradients to {:?}", output);
        io::write_gradients(output, &atoms, &gradients)?;
        println!("✓ Gradients written to: {}", output.display());
    }
    Ok(())
}

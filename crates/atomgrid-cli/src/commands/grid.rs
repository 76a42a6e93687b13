use crate::cli::GridArgs;
use crate::config;
use crate::error::Result;
use crate::io;
use atomgrid::core::models::grid::Grid;
use atomgrid::workflows;
use tracing::{info, warn};

pub fn run(args: GridArgs) -> Result<()> {
    info!("Loading atoms from {:?}", &args.input.input);
    let atoms = io::read_atoms(&args.input.input)?;
    let grid_config = config::resolve(&args.input, &atoms)?;

    println!(
        "Gridding {} atom(s) onto {}...",
        atoms.len(),
        grid_config.geometry
    );
    let density = workflows::grid::forward(&atoms, &grid_config)?;
    print_summary(&density);

    if let Some(output) = &args.output {
        info!("Writing non-zero voxels to {:?}", output);
        let written = io::write_voxels(output, &density)?;
        if written == 0 {
            warn!("Density grid is empty; the voxel file only holds a header.");
        }
        println!("✓ {} voxel(s) written to: {}", written, output.display());
    }
    Ok(())
}

fn print_summary(density: &Grid) {
    println!("{:>8} {:>14} {:>12} {:>10}", "channel", "sum", "max", "occupied");
    for channel in 0..density.geometry().channels() {
        if let Some(summary) = density.channel_summary(channel) {
            println!(
                "{:>8} {:>14.6} {:>12.6} {:>10}",
                channel, summary.sum, summary.max, summary.occupied_voxels
            );
        }
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan",
    version,
    about = "atomgrid CLI - Rasterize atoms onto voxel grids and back-propagate grid gradients onto atom positions.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rasterize atoms onto a density grid and summarize or export it.
    Grid(GridArgs),
    /// Back-propagate an upstream grid gradient onto the atom positions.
    Gradient(GradientArgs),
    /// Compare analytic atom gradients with central finite differences.
    Gradcheck(GradcheckArgs),
}

/// Inputs shared by every subcommand.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Path to the atom table (CSV with columns x,y,z,channel,radius).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to a grid configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the voxel edge length from the config file.
    #[arg(short, long, value_name = "FLOAT")]
    pub resolution: Option<f64>,

    /// Override the number of grid channels from the config file.
    #[arg(long, value_name = "INT")]
    pub channels: Option<usize>,

    /// Override the atom radius multiplier from the config file.
    #[arg(long, value_name = "FLOAT")]
    pub radius_scale: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S grid.resolution=0.375
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `grid` subcommand.
#[derive(Args, Debug)]
pub struct GridArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write every non-zero voxel to a CSV file (channel,i,j,k,x,y,z,value).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `gradient` subcommand.
#[derive(Args, Debug)]
pub struct GradientArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Sparse upstream gradient (CSV with columns channel,i,j,k,value); omitted voxels are zero.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub upstream: PathBuf,

    /// Write per-atom gradients to a CSV file (index,channel,dx,dy,dz).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `gradcheck` subcommand.
#[derive(Args, Debug)]
pub struct GradcheckArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Displacement used for the central differences.
    #[arg(long, value_name = "FLOAT", default_value_t = 1e-4)]
    pub step: f64,

    /// Seed for the random upstream gradient.
    #[arg(long, value_name = "INT", default_value_t = 0)]
    pub seed: u64,

    /// Maximum accepted absolute deviation between analytic and numeric gradients.
    #[arg(long, value_name = "FLOAT", default_value_t = 1e-3)]
    pub tolerance: f64,
}

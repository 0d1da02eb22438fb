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
    author = "The cdgw developers",
    version,
    about = "cdgw CLI - GW quasiparticle energies by contour deformation, one-shot G0W0 and evGW.",
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
    /// Compute quasiparticle energies (one-shot G0W0, or evGW with --evgw-iter).
    Run(RunArgs),
    /// Print the memory estimates and the contraction strategy without computing.
    Estimate(EstimateArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub gw: GwArgs,

    /// Write the quasiparticle table to a CSV file (energies in eV).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write the evGW iteration history to a CSV file (energies in eV).
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,
}

/// Arguments for the `estimate` subcommand.
#[derive(Args, Debug)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub gw: GwArgs,
}

/// Options shared by every command that builds a GW configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct GwArgs {
    // --- Core Arguments ---
    /// Path to the mean-field input file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Unit of the energies given in the configuration (hartree, ev, mev, rydberg).
    #[arg(long, value_name = "UNIT")]
    pub energy_unit: Option<String>,

    // --- Target Overrides ---
    /// Number of occupied states to correct, ending at the HOMO.
    #[arg(long, value_name = "INT")]
    pub no_qp: Option<usize>,

    /// Number of virtual states to correct, starting at the LUMO.
    #[arg(long, value_name = "INT")]
    pub nv_qp: Option<usize>,

    // --- Grid and Quadrature Overrides ---
    /// Number of real-frequency points around each reference energy (odd).
    #[arg(long, value_name = "INT")]
    pub nomega_sigma: Option<usize>,

    /// Spacing of the real-frequency grid.
    #[arg(long, value_name = "FLOAT")]
    pub step_sigma: Option<f64>,

    /// Number of Gauss-Legendre points on the imaginary axis.
    #[arg(long, value_name = "INT")]
    pub gl_npoint: Option<usize>,

    // --- Screening Overrides ---
    /// Use the read-in spectral screening from the input file instead of analytic RPA.
    #[arg(long)]
    pub spectral_w: bool,

    /// Keep the screening at the mean-field energies during evGW (evGW0).
    #[arg(long)]
    pub fixed_screening: bool,

    /// Broadening added to real frequencies.
    #[arg(long, value_name = "FLOAT")]
    pub eta: Option<f64>,

    // --- Memory Overrides ---
    /// Force the low-memory contraction strategy.
    #[arg(long)]
    pub low_mem: bool,

    /// Memory ceiling in MB.
    #[arg(long, value_name = "FLOAT")]
    pub max_memory_mb: Option<f64>,

    // --- evGW Overrides ---
    /// Maximum number of evGW iterations (0 for one-shot G0W0).
    #[arg(long, value_name = "INT")]
    pub evgw_iter: Option<usize>,

    /// Convergence threshold on the largest quasiparticle energy change.
    #[arg(long, value_name = "FLOAT")]
    pub evgw_tolerance: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S sigma-grid.nomega=81
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

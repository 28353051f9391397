use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod pre_hmc;
mod summary;

#[derive(Parser)]
#[command(name = "dwiprep", version, about = "Diffusion MRI preprocessing helpers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble the pre-head-motion-correction graph and print it.
    PreHmc {
        /// DWI series acquired along the primary phase-encoding direction.
        #[arg(long = "dwi", required = true, num_args = 1..)]
        dwi: Vec<PathBuf>,
        /// Series acquired with the reversed phase-encoding direction.
        #[arg(long = "rpe", num_args = 1..)]
        rpe: Vec<PathBuf>,
        /// Phase-encoding direction of the --dwi series (i, j, k, optionally suffixed with -).
        #[arg(long, default_value = "j")]
        pedir: String,
        /// Denoising window in voxels (odd; 0 disables denoising).
        #[arg(long)]
        denoise_window: Option<u32>,
        /// Denoise the merged series instead of each input series.
        #[arg(long)]
        denoise_after_combining: bool,
        /// Maximum threads per stage.
        #[arg(long)]
        omp_nthreads: Option<u32>,
        /// Trade disk usage for memory in the stages that support it.
        #[arg(long)]
        low_mem: bool,
        /// Workflow name.
        #[arg(long)]
        name: Option<String>,
        /// Path to dwiprep.toml config file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Render the diffusion QC summary figure.
    Summary {
        /// Slice-wise QC archive (JSON with slice_scores and slice_counts).
        #[arg(long)]
        qc: PathBuf,
        /// Tab-separated confounds table.
        #[arg(long)]
        confounds: PathBuf,
        /// Output figure; the extension picks the format (.svg or .png).
        #[arg(short, long)]
        output: PathBuf,
        /// Repetition time in seconds, used to label the time axis.
        #[arg(long)]
        tr: Option<f64>,
        /// Only show these confounds (repeatable).
        #[arg(long = "confound")]
        confounds_shown: Vec<String>,
        /// Path to dwiprep.toml config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Dot,
}

fn main() -> Result<ExitCode> {
    dwiprep_core::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::PreHmc {
            dwi,
            rpe,
            pedir,
            denoise_window,
            denoise_after_combining,
            omp_nthreads,
            low_mem,
            name,
            config,
            format,
        }) => pre_hmc::run_pre_hmc(pre_hmc::PreHmcArgs {
            dwi,
            rpe,
            pedir,
            denoise_window,
            denoise_after_combining,
            omp_nthreads,
            low_mem,
            name,
            config,
            format,
        }),
        Some(Command::Summary {
            qc,
            confounds,
            output,
            tr,
            confounds_shown,
            config,
        }) => summary::run_summary(summary::SummaryArgs {
            qc,
            confounds,
            output,
            tr,
            confounds_shown,
            config,
        }),
        None => {
            println!("dwiprep v{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load `dwiprep.toml` from the given path, or the working directory.
fn load_config(path: Option<&std::path::Path>) -> Result<dwiprep_core::config::DwiprepConfig> {
    use anyhow::Context;

    let path = path.unwrap_or(std::path::Path::new("dwiprep.toml"));
    tracing::debug!(config = %path.display(), "loading config");
    dwiprep_core::config::load_config(path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}

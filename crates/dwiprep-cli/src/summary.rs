use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};

use dwiprep_core::report::{render_diffusion_summary, ConfoundTable, SliceQc, SummaryOptions};

pub struct SummaryArgs {
    pub qc: PathBuf,
    pub confounds: PathBuf,
    pub output: PathBuf,
    pub tr: Option<f64>,
    pub confounds_shown: Vec<String>,
    pub config: Option<PathBuf>,
}

pub fn run_summary(args: SummaryArgs) -> Result<ExitCode> {
    let config = crate::load_config(args.config.as_deref())?;
    let mut options = SummaryOptions::from(config.report);
    if let Some(tr) = args.tr {
        if !(tr.is_finite() && tr > 0.0) {
            anyhow::bail!("--tr must be a positive number of seconds, got {tr}");
        }
        options.repetition_time = Some(tr);
    }
    if !args.confounds_shown.is_empty() {
        options.selected = Some(args.confounds_shown.clone());
    }

    let qc = SliceQc::load(&args.qc)
        .with_context(|| format!("failed to read QC archive {}", args.qc.display()))?;
    let confounds = ConfoundTable::load(&args.confounds)
        .with_context(|| format!("failed to read confounds {}", args.confounds.display()))?;

    let summary = render_diffusion_summary(&qc, &confounds, &options, Some(&args.output))
        .context("failed to render summary figure")?;

    let bands = summary.band_names();
    println!("Wrote {}", args.output.display());
    println!(
        "  {} slices x {} volumes, {} confound band(s){}",
        qc.n_slices(),
        qc.n_volumes(),
        bands.len(),
        if bands.is_empty() {
            String::new()
        } else {
            format!(": {}", bands.join(", "))
        }
    );
    Ok(ExitCode::SUCCESS)
}

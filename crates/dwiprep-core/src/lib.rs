//! Diffusion-MRI preprocessing helpers.
//!
//! Two loosely coupled halves:
//!
//! * [`workflow`] assembles the pre-head-motion-correction stage graph
//!   (merge, denoise, split and, for reverse phase-encoding data, concatenate)
//!   as an inspectable [`workflow::WorkflowDefinition`] value. Executing the
//!   graph is left to an external engine.
//! * [`report`] renders slice-wise QC summary figures (confound traces stacked
//!   above a carpet plot) with `plotters`.
//!
//! Neither half installs a global logger. Events go through `tracing`; the
//! caller decides where they land, either with [`init_tracing`] or a scoped
//! subscriber.

pub mod config;
pub mod error;
pub mod report;
pub mod workflow;

pub use error::{DwiprepError, Result};

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "DWIPREP_LOG";

/// Install a stderr `fmt` subscriber filtered by `DWIPREP_LOG` (default `info`).
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

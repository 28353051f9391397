//! Pre-head-motion-correction workflow preset.
//!
//! Turns one or two lists of DWI series into single-volume outputs:
//! merge → (denoise) → split, run once for a single phase-encoding direction
//! or twice with a concatenation stage when reverse-PE series are supplied.
//! Denoising has to happen here, before any interpolation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PreprocessingConfig;
use crate::workflow::graph::{WorkflowDefinition, WorkflowNode, OUTPUT_NODE};
use crate::workflow::phase::{PhaseEncodingDirection, Polarity};
use crate::workflow::stages::{concat_bindings, StageKind, PRE_HMC_OUTPUTS, SPLIT_OUTPUTS};
use crate::{DwiprepError, Result};

use super::merge::{merge_and_denoise, ChainOutputs};

/// Scalar settings baked into the pre-HMC graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreHmcOptions {
    /// Denoising window in voxels. Must be odd; 0 skips denoising.
    pub dwi_denoise_window: u32,
    /// Denoise each series before merging instead of the merged series.
    pub denoise_before_combining: bool,
    /// Maximum threads a single stage may use.
    pub omp_nthreads: u32,
    /// Ask stages to trade disk for memory (uncompressed intermediates).
    pub low_mem: bool,
    pub name: String,
}

impl Default for PreHmcOptions {
    fn default() -> Self {
        PreprocessingConfig::default().into()
    }
}

impl From<PreprocessingConfig> for PreHmcOptions {
    fn from(config: PreprocessingConfig) -> Self {
        Self {
            dwi_denoise_window: config.dwi_denoise_window,
            denoise_before_combining: config.denoise_before_combining,
            omp_nthreads: config.omp_nthreads,
            low_mem: config.low_mem,
            name: config.workflow_name,
        }
    }
}

impl PreHmcOptions {
    pub fn validate(&self) -> Result<()> {
        if self.dwi_denoise_window != 0 && self.dwi_denoise_window % 2 == 0 {
            return Err(DwiprepError::Config(format!(
                "dwi_denoise_window must be odd or 0, got {}",
                self.dwi_denoise_window
            )));
        }
        if self.omp_nthreads == 0 {
            return Err(DwiprepError::Config("omp_nthreads must be > 0".into()));
        }
        if self.name.trim().is_empty() {
            return Err(DwiprepError::Config("workflow name must not be empty".into()));
        }
        Ok(())
    }
}

/// The two graph shapes, decided once from the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology<'a> {
    SingleDirection {
        series: &'a [PathBuf],
    },
    Bidirectional {
        plus: &'a [PathBuf],
        minus: &'a [PathBuf],
    },
}

impl<'a> Topology<'a> {
    /// Reverse-PE series present → bidirectional. A reversed `pedir` makes
    /// `dwi_series` the minus side.
    pub fn resolve(
        dwi_series: &'a [PathBuf],
        rpe_series: &'a [PathBuf],
        pedir: PhaseEncodingDirection,
    ) -> Self {
        if rpe_series.is_empty() {
            return Topology::SingleDirection { series: dwi_series };
        }
        match pedir.polarity() {
            Polarity::Minus => Topology::Bidirectional {
                plus: rpe_series,
                minus: dwi_series,
            },
            Polarity::Plus => Topology::Bidirectional {
                plus: dwi_series,
                minus: rpe_series,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::SingleDirection { .. } => "single_direction",
            Topology::Bidirectional { .. } => "bidirectional",
        }
    }
}

/// Build the pre-HMC graph.
///
/// All parameters are checked before any node is created. The returned graph
/// exposes `dwi_files, bval_files, bvec_files, original_files, b0_images,
/// b0_indices` on its `outputnode`.
pub fn pre_hmc_workflow(
    dwi_series: &[PathBuf],
    rpe_series: &[PathBuf],
    dwi_series_pedir: &str,
    options: &PreHmcOptions,
) -> Result<WorkflowDefinition> {
    options.validate()?;
    if dwi_series.is_empty() {
        return Err(DwiprepError::Config(
            "dwi_series must contain at least one file".into(),
        ));
    }
    let pedir: PhaseEncodingDirection = dwi_series_pedir.parse()?;
    let topology = Topology::resolve(dwi_series, rpe_series, pedir);

    let mut wf = WorkflowDefinition::new(options.name.as_str());
    wf.add_node(WorkflowNode::identity(OUTPUT_NODE, &PRE_HMC_OUTPUTS))?;

    match topology {
        Topology::SingleDirection { series } => {
            let merged = merge_and_denoise(&mut wf, "merge_dwis", series, options)?;
            add_split(&mut wf, "split_dwis", &merged, options)?;
            let pairs = SPLIT_OUTPUTS.map(|slot| (slot, slot));
            wf.connect_all("split_dwis", OUTPUT_NODE, &pairs)?;
        }
        Topology::Bidirectional { plus, minus } => {
            wf.add_node(WorkflowNode::new("concat_rpe_splits", StageKind::ConcatRpeSplits))?;
            for (polarity, series) in [(Polarity::Plus, plus), (Polarity::Minus, minus)] {
                let merge_id = format!("merge_{}", polarity.as_str());
                let split_id = format!("split_{}", polarity.as_str());
                let merged = merge_and_denoise(&mut wf, &merge_id, series, options)?;
                add_split(&mut wf, &split_id, &merged, options)?;
                wf.connect_all(&split_id, "concat_rpe_splits", &concat_bindings(polarity))?;
            }
            let pairs = PRE_HMC_OUTPUTS.map(|slot| (slot, slot));
            wf.connect_all("concat_rpe_splits", OUTPUT_NODE, &pairs)?;
        }
    }

    info!(
        workflow = %wf.name,
        topology = topology.as_str(),
        %pedir,
        denoise_window = options.dwi_denoise_window,
        node_count = wf.nodes.len(),
        connection_count = wf.connections.len(),
        "assembled pre-HMC workflow"
    );
    Ok(wf)
}

fn add_split(
    wf: &mut WorkflowDefinition,
    id: &str,
    merged: &ChainOutputs,
    options: &PreHmcOptions,
) -> Result<()> {
    wf.add_node(WorkflowNode::new(id, StageKind::SplitDwis).with_param("low_mem", options.low_mem))?;
    wf.connect(&merged.image.node, merged.image.slot, id, "dwi_file")?;
    wf.connect(&merged.bval.node, merged.bval.slot, id, "bval_file")?;
    wf.connect(&merged.bvec.node, merged.bvec.slot, id, "bvec_file")?;
    Ok(())
}

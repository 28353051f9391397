//! Merge-and-denoise chain shared by every pre-HMC topology.

use std::path::PathBuf;

use crate::workflow::graph::{WorkflowDefinition, WorkflowNode};
use crate::workflow::stages::StageKind;
use crate::Result;

use super::pre_hmc::PreHmcOptions;

/// A node output another stage can bind to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRef {
    pub node: String,
    pub slot: &'static str,
}

impl SlotRef {
    fn new(node: &str, slot: &'static str) -> Self {
        Self {
            node: node.to_string(),
            slot,
        }
    }
}

/// Where a merge chain exposes its combined series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutputs {
    pub image: SlotRef,
    pub bval: SlotRef,
    pub bvec: SlotRef,
}

/// Add a merge stage named `name`, preceded or followed by a denoise stage.
///
/// With `dwi_denoise_window == 0` no denoise stage is added. Otherwise one
/// `<name>_denoise` node is added: before combining it maps over the input
/// series and feeds the merge; after combining it consumes the merged image.
pub fn merge_and_denoise(
    wf: &mut WorkflowDefinition,
    name: &str,
    dwi_files: &[PathBuf],
    options: &PreHmcOptions,
) -> Result<ChainOutputs> {
    wf.add_node(
        WorkflowNode::new(name, StageKind::MergeDwis)
            .with_param("nthreads", options.omp_nthreads)
            .with_param("low_mem", options.low_mem),
    )?;

    let merged = ChainOutputs {
        image: SlotRef::new(name, "merged_image"),
        bval: SlotRef::new(name, "merged_bval"),
        bvec: SlotRef::new(name, "merged_bvec"),
    };

    if options.dwi_denoise_window == 0 {
        wf.set_input(name, "dwi_files", dwi_files)?;
        return Ok(merged);
    }

    let denoise_id = format!("{name}_denoise");
    wf.add_node(
        WorkflowNode::new(&denoise_id, StageKind::Denoise)
            .with_param("extent", options.dwi_denoise_window)
            .with_param("nthreads", options.omp_nthreads)
            .with_param("iterate_over_series", options.denoise_before_combining),
    )?;

    if options.denoise_before_combining {
        wf.set_input(&denoise_id, "in_file", dwi_files)?;
        wf.connect(&denoise_id, "out_file", name, "dwi_files")?;
        Ok(merged)
    } else {
        wf.set_input(name, "dwi_files", dwi_files)?;
        wf.connect(name, "merged_image", &denoise_id, "in_file")?;
        Ok(ChainOutputs {
            image: SlotRef::new(&denoise_id, "out_file"),
            ..merged
        })
    }
}

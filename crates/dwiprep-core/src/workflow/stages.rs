//! Stage kinds and the slot schema each one declares.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::phase::Polarity;

/// Per-volume outputs of the split stage, in binding order.
pub const SPLIT_OUTPUTS: [&str; 6] = [
    "dwi_files",
    "bval_files",
    "bvec_files",
    "original_files",
    "b0_images",
    "b0_indices",
];

/// Slots exposed by a pre-HMC graph's `outputnode`.
pub const PRE_HMC_OUTPUTS: [&str; 6] = SPLIT_OUTPUTS;

const MERGE_INPUTS: &[&str] = &["dwi_files"];
const MERGE_OUTPUTS: &[&str] = &[
    "merged_image",
    "merged_bval",
    "merged_bvec",
    "original_files",
];
const DENOISE_INPUTS: &[&str] = &["in_file"];
const DENOISE_OUTPUTS: &[&str] = &["out_file", "noise_image"];
const SPLIT_INPUTS: &[&str] = &["dwi_file", "bval_file", "bvec_file"];
const CONCAT_INPUTS: &[&str] = &[
    "dwi_plus",
    "bval_plus",
    "bvec_plus",
    "b0_images_plus",
    "b0_indices_plus",
    "original_files_plus",
    "dwi_minus",
    "bval_minus",
    "bvec_minus",
    "b0_images_minus",
    "b0_indices_minus",
    "original_files_minus",
];

/// The kind of operation a stage performs.
///
/// Stages are opaque to this crate; the kind only fixes the slot schema and
/// tells the execution engine which tool to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Pass-through node; its fields are given at construction.
    Identity,
    MergeDwis,
    Denoise,
    SplitDwis,
    ConcatRpeSplits,
}

impl StageKind {
    pub fn input_slots(self) -> &'static [&'static str] {
        match self {
            StageKind::Identity => &[],
            StageKind::MergeDwis => MERGE_INPUTS,
            StageKind::Denoise => DENOISE_INPUTS,
            StageKind::SplitDwis => SPLIT_INPUTS,
            StageKind::ConcatRpeSplits => CONCAT_INPUTS,
        }
    }

    pub fn output_slots(self) -> &'static [&'static str] {
        match self {
            StageKind::Identity => &[],
            StageKind::MergeDwis => MERGE_OUTPUTS,
            StageKind::Denoise => DENOISE_OUTPUTS,
            StageKind::SplitDwis => &SPLIT_OUTPUTS,
            StageKind::ConcatRpeSplits => &SPLIT_OUTPUTS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Identity => "identity",
            StageKind::MergeDwis => "merge_dwis",
            StageKind::Denoise => "denoise",
            StageKind::SplitDwis => "split_dwis",
            StageKind::ConcatRpeSplits => "concat_rpe_splits",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split output → concatenation input pairs for one polarity.
pub fn concat_bindings(polarity: Polarity) -> [(&'static str, &'static str); 6] {
    match polarity {
        Polarity::Plus => [
            ("bval_files", "bval_plus"),
            ("bvec_files", "bvec_plus"),
            ("dwi_files", "dwi_plus"),
            ("b0_images", "b0_images_plus"),
            ("b0_indices", "b0_indices_plus"),
            ("original_files", "original_files_plus"),
        ],
        Polarity::Minus => [
            ("bval_files", "bval_minus"),
            ("bvec_files", "bvec_minus"),
            ("dwi_files", "dwi_minus"),
            ("b0_images", "b0_images_minus"),
            ("b0_indices", "b0_indices_minus"),
            ("original_files", "original_files_minus"),
        ],
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from `dwiprep.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DwiprepConfig {
    pub preprocessing: PreprocessingConfig,
    pub report: ReportConfig,
}

/// Parameters baked into the pre-HMC graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PreprocessingConfig {
    /// Denoising window in voxels. Must be odd; 0 skips denoising.
    pub dwi_denoise_window: u32,
    pub denoise_before_combining: bool,
    pub omp_nthreads: u32,
    pub low_mem: bool,
    pub workflow_name: String,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            dwi_denoise_window: 5,
            denoise_before_combining: true,
            omp_nthreads: 1,
            low_mem: false,
            workflow_name: "pre_hmc_wf".to_string(),
        }
    }
}

/// Summary figure settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReportConfig {
    pub width: u32,
    pub height: u32,
    /// Sampling interval in seconds; frame indices are used when absent.
    pub repetition_time: Option<f64>,
    /// Optional allow-list applied on top of the fixed confound priority.
    pub confounds: Option<Vec<String>>,
    pub units: BTreeMap<String, String>,
    pub cutoffs: BTreeMap<String, Vec<f64>>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            width: 950,
            height: 800,
            repetition_time: None,
            confounds: None,
            units: BTreeMap::new(),
            cutoffs: BTreeMap::new(),
        }
    }
}

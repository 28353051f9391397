pub mod graph;
pub mod phase;
pub mod presets;
pub mod stages;

pub use graph::{Connection, ParamValue, WorkflowDefinition, WorkflowNode, OUTPUT_NODE};
pub use phase::{PhaseAxis, PhaseEncodingDirection, Polarity};
pub use presets::{merge_and_denoise, pre_hmc_workflow, PreHmcOptions, Topology};
pub use stages::{StageKind, PRE_HMC_OUTPUTS};

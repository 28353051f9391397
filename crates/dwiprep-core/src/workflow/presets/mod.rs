pub mod merge;
pub mod pre_hmc;

pub use merge::{merge_and_denoise, ChainOutputs, SlotRef};
pub use pre_hmc::{pre_hmc_workflow, PreHmcOptions, Topology};

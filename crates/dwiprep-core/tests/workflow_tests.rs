//! Integration tests for the pre-HMC workflow preset.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use dwiprep_core::workflow::{
    pre_hmc_workflow, ParamValue, PreHmcOptions, StageKind, WorkflowDefinition, OUTPUT_NODE,
    PRE_HMC_OUTPUTS,
};
use dwiprep_core::DwiprepError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

fn options(window: u32) -> PreHmcOptions {
    PreHmcOptions {
        dwi_denoise_window: window,
        ..PreHmcOptions::default()
    }
}

fn level_of(levels: &[Vec<String>], id: &str) -> usize {
    levels
        .iter()
        .position(|level| level.iter().any(|n| n == id))
        .unwrap_or_else(|| panic!("{id} missing from execution order"))
}

fn static_files(wf: &WorkflowDefinition, node: &str, slot: &str) -> Vec<PathBuf> {
    match wf.node(node).and_then(|n| n.static_inputs.get(slot)) {
        Some(ParamValue::Files(files)) => files.clone(),
        other => panic!("{node}.{slot} is not a file list: {other:?}"),
    }
}

/// Buffer shared with a scoped `fmt` subscriber.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

#[test]
fn single_direction_has_one_chain() {
    let dwi = paths(&["sub-01_run-1_dwi.nii.gz", "sub-01_run-2_dwi.nii.gz"]);
    let wf = pre_hmc_workflow(&dwi, &[], "j", &options(5)).unwrap();

    assert_eq!(wf.nodes_of_kind(StageKind::MergeDwis).len(), 1);
    assert_eq!(wf.nodes_of_kind(StageKind::SplitDwis).len(), 1);
    assert!(wf.nodes_of_kind(StageKind::ConcatRpeSplits).is_empty());

    let bindings = wf.output_bindings();
    assert_eq!(bindings.len(), PRE_HMC_OUTPUTS.len());
    assert!(bindings.values().all(|(node, _)| *node == "split_dwis"));
    wf.validate().unwrap();
}

#[test]
fn reverse_pe_adds_second_chain_and_concat() {
    let dwi = paths(&["sub-01_dir-AP_dwi.nii.gz"]);
    let rpe = paths(&["sub-01_dir-PA_dwi.nii.gz"]);
    let wf = pre_hmc_workflow(&dwi, &rpe, "j", &options(5)).unwrap();

    assert_eq!(wf.nodes_of_kind(StageKind::MergeDwis).len(), 2);
    assert_eq!(wf.nodes_of_kind(StageKind::SplitDwis).len(), 2);
    assert_eq!(wf.nodes_of_kind(StageKind::ConcatRpeSplits).len(), 1);

    let bindings = wf.output_bindings();
    for slot in PRE_HMC_OUTPUTS {
        assert_eq!(bindings[slot], ("concat_rpe_splits", slot));
    }

    for side in ["plus", "minus"] {
        let src = wf
            .source_of("concat_rpe_splits", &format!("dwi_{side}"))
            .unwrap();
        assert_eq!(src.source, format!("split_{side}"));
        assert_eq!(src.source_output, "dwi_files");
    }
}

#[test]
fn reversed_pedir_swaps_plus_and_minus() {
    let dwi = paths(&["ap.nii.gz"]);
    let rpe = paths(&["pa.nii.gz"]);

    let forward = pre_hmc_workflow(&dwi, &rpe, "j", &options(0)).unwrap();
    assert_eq!(static_files(&forward, "merge_plus", "dwi_files"), dwi);
    assert_eq!(static_files(&forward, "merge_minus", "dwi_files"), rpe);

    let reversed = pre_hmc_workflow(&dwi, &rpe, "j-", &options(0)).unwrap();
    assert_eq!(static_files(&reversed, "merge_plus", "dwi_files"), rpe);
    assert_eq!(static_files(&reversed, "merge_minus", "dwi_files"), dwi);
}

#[test]
fn pedir_ignored_for_ordering_without_reverse_pe() {
    let dwi = paths(&["a.nii.gz"]);
    let plus = pre_hmc_workflow(&dwi, &[], "i", &options(0)).unwrap();
    let minus = pre_hmc_workflow(&dwi, &[], "i-", &options(0)).unwrap();
    assert_eq!(plus, minus);
}

// ---------------------------------------------------------------------------
// Denoising
// ---------------------------------------------------------------------------

#[test]
fn zero_window_skips_denoising() {
    let dwi = paths(&["a.nii.gz"]);
    let rpe = paths(&["b.nii.gz"]);
    let single = pre_hmc_workflow(&dwi, &[], "j", &options(0)).unwrap();
    let both = pre_hmc_workflow(&dwi, &rpe, "j", &options(0)).unwrap();
    assert!(single.nodes_of_kind(StageKind::Denoise).is_empty());
    assert!(both.nodes_of_kind(StageKind::Denoise).is_empty());
}

#[test]
fn one_denoise_stage_per_chain() {
    let dwi = paths(&["a.nii.gz"]);
    let rpe = paths(&["b.nii.gz"]);
    let single = pre_hmc_workflow(&dwi, &[], "j", &options(7)).unwrap();
    let both = pre_hmc_workflow(&dwi, &rpe, "j", &options(7)).unwrap();
    assert_eq!(single.nodes_of_kind(StageKind::Denoise).len(), 1);
    assert_eq!(both.nodes_of_kind(StageKind::Denoise).len(), 2);
    for node in both.nodes_of_kind(StageKind::Denoise) {
        assert_eq!(node.param("extent"), Some(&ParamValue::Int(7)));
    }
}

#[test]
fn denoise_position_follows_option() {
    let dwi = paths(&["a.nii.gz", "b.nii.gz"]);

    let before = pre_hmc_workflow(&dwi, &[], "j", &options(5)).unwrap();
    let levels = before.resolve_order().unwrap();
    assert!(level_of(&levels, "merge_dwis_denoise") < level_of(&levels, "merge_dwis"));

    let after_opts = PreHmcOptions {
        denoise_before_combining: false,
        ..options(5)
    };
    let after = pre_hmc_workflow(&dwi, &[], "j", &after_opts).unwrap();
    let levels = after.resolve_order().unwrap();
    assert!(level_of(&levels, "merge_dwis") < level_of(&levels, "merge_dwis_denoise"));
    let src = after.source_of("split_dwis", "dwi_file").unwrap();
    assert_eq!(src.source, "merge_dwis_denoise");
}

// ---------------------------------------------------------------------------
// Ordering and serialization
// ---------------------------------------------------------------------------

#[test]
fn execution_order_ends_at_outputnode() {
    let dwi = paths(&["a.nii.gz"]);
    let rpe = paths(&["b.nii.gz"]);
    let wf = pre_hmc_workflow(&dwi, &rpe, "k", &options(5)).unwrap();
    let levels = wf.resolve_order().unwrap();

    let concat = level_of(&levels, "concat_rpe_splits");
    assert!(level_of(&levels, "split_plus") < concat);
    assert!(level_of(&levels, "split_minus") < concat);
    assert_eq!(levels.last().unwrap(), &vec![OUTPUT_NODE.to_string()]);
}

#[test]
fn json_form_is_stable() {
    let dwi = paths(&["a.nii.gz"]);
    let wf = pre_hmc_workflow(&dwi, &[], "j", &options(5)).unwrap();
    let json = serde_json::to_string(&wf).unwrap();
    let back: WorkflowDefinition = serde_json::from_str(&json).unwrap();
    assert_eq!(back, wf);
    assert!(json.contains("\"kind\":\"split_dwis\""));
}

#[test]
fn same_inputs_same_graph() {
    let dwi = paths(&["a.nii.gz"]);
    let rpe = paths(&["b.nii.gz"]);
    let a = pre_hmc_workflow(&dwi, &rpe, "j-", &options(5)).unwrap();
    let b = pre_hmc_workflow(&dwi, &rpe, "j-", &options(5)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_dot(), b.to_dot());
}

// ---------------------------------------------------------------------------
// Validation and logging
// ---------------------------------------------------------------------------

#[test]
fn invalid_pedir_rejected_in_both_topologies() {
    let dwi = paths(&["a.nii.gz"]);
    let rpe = paths(&["b.nii.gz"]);
    for rpe in [&[][..], &rpe[..]] {
        let err = pre_hmc_workflow(&dwi, rpe, "x", &options(5)).unwrap_err();
        assert!(matches!(err, DwiprepError::Config(_)));
    }
}

#[test]
fn assembly_logs_through_scoped_subscriber() {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let dwi = paths(&["a.nii.gz"]);
    let rpe = paths(&["b.nii.gz"]);
    tracing::subscriber::with_default(subscriber, || {
        pre_hmc_workflow(&dwi, &rpe, "j", &options(5)).unwrap();
    });

    let logs = buf.contents();
    assert!(logs.contains("assembled pre-HMC workflow"), "logs: {logs}");
    assert!(logs.contains("bidirectional"), "logs: {logs}");
}

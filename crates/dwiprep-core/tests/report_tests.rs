//! Integration tests for the QC summary renderer.

use dwiprep_core::report::{
    render_diffusion_summary, ConfoundTable, DiffusionSummary, Figure, SliceQc, SummaryOptions,
    CONFOUND_PRIORITY,
};
use dwiprep_core::DwiprepError;
use ndarray::{Array1, Array2};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A 50-slice, 10-volume bundle.
fn qc_bundle() -> SliceQc {
    let scores = Array2::from_shape_fn((50, 10), |(s, v)| ((s + 3 * v) % 7) as f64 / 7.0);
    let counts = Array1::from_shape_fn(50, |s| (400 + 10 * s) as f64);
    SliceQc::new(scores, counts).unwrap()
}

fn confounds(names: &[&str], rows: usize) -> ConfoundTable {
    ConfoundTable::from_columns(
        names
            .iter()
            .map(|name| {
                let values = (0..rows).map(|i| (i as f64 * 0.37).sin().abs()).collect();
                (name.to_string(), values)
            })
            .collect(),
    )
    .unwrap()
}

fn small_options() -> SummaryOptions {
    SummaryOptions {
        size: (320, 240),
        ..SummaryOptions::default()
    }
}

// ---------------------------------------------------------------------------
// Band selection
// ---------------------------------------------------------------------------

#[test]
fn all_priority_confounds_give_three_bands() {
    let table = confounds(&CONFOUND_PRIORITY, 10);
    let summary = DiffusionSummary::new(&qc_bundle(), &table, &small_options()).unwrap();
    assert_eq!(summary.band_count(), 3);
    assert_eq!(summary.band_names(), CONFOUND_PRIORITY);
    assert_eq!(summary.height_ratios(), [1, 1, 1, 5]);
}

#[test]
fn only_framewise_displacement_gives_one_band() {
    let table = confounds(&["framewise_displacement", "dvars", "rot_x"], 10);
    let summary = DiffusionSummary::new(&qc_bundle(), &table, &small_options()).unwrap();
    assert_eq!(summary.band_names(), ["framewise_displacement"]);
    assert_eq!(summary.height_ratios(), [1, 5]);
}

#[test]
fn no_known_confound_leaves_carpet_only() {
    let table = confounds(&["dvars"], 10);
    let summary = DiffusionSummary::new(&qc_bundle(), &table, &small_options()).unwrap();
    assert_eq!(summary.band_count(), 0);
    assert_eq!(summary.height_ratios(), [5]);

    let empty = DiffusionSummary::new(&qc_bundle(), &ConfoundTable::default(), &small_options())
        .unwrap();
    assert_eq!(empty.band_count(), 0);
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

#[test]
fn aligned_confounds_accepted() {
    let table = confounds(&["framewise_displacement"], 10);
    let summary = DiffusionSummary::new(&qc_bundle(), &table, &small_options()).unwrap();
    assert_eq!(summary.carpet().qc().n_volumes(), 10);
    assert_eq!(summary.carpet().qc().n_slices(), 50);
}

#[test]
fn confound_one_short_rejected() {
    let table = confounds(&["framewise_displacement"], 9);
    let err = DiffusionSummary::new(&qc_bundle(), &table, &small_options()).unwrap_err();
    assert!(matches!(err, DwiprepError::Shape(_)), "got {err}");
}

#[test]
fn ten_slices_by_fifty_volumes() {
    let scores = Array2::from_shape_fn((10, 50), |(s, v)| (s * v % 11) as f64);
    let qc = SliceQc::new(scores, Array1::from_elem(10, 250.0)).unwrap();
    assert_eq!((qc.n_slices(), qc.n_volumes()), (10, 50));

    let aligned = confounds(&["framewise_displacement"], 50);
    let summary = DiffusionSummary::new(&qc, &aligned, &small_options()).unwrap();
    assert_eq!(summary.band_names(), ["framewise_displacement"]);
    assert!(summary.render_svg_string().unwrap().contains("<svg"));

    let short = confounds(&["framewise_displacement"], 49);
    let err = DiffusionSummary::new(&qc, &short, &small_options()).unwrap_err();
    assert!(matches!(err, DwiprepError::Shape(_)), "got {err}");
}

#[test]
fn mismatched_counts_rejected() {
    let err = SliceQc::new(Array2::zeros((50, 10)), Array1::zeros(10)).unwrap_err();
    assert!(matches!(err, DwiprepError::Shape(_)));
}

#[test]
fn misaligned_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("summary.svg");
    let table = confounds(&["bval"], 11);
    let err = render_diffusion_summary(&qc_bundle(), &table, &small_options(), Some(&out))
        .unwrap_err();
    assert!(matches!(err, DwiprepError::Shape(_)));
    assert!(!out.exists());
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn svg_contains_band_labels_and_axis() {
    let table = confounds(&["bval", "framewise_displacement"], 10);
    let options = SummaryOptions {
        repetition_time: Some(2.0),
        ..small_options()
    };
    let svg = DiffusionSummary::new(&qc_bundle(), &table, &options)
        .unwrap()
        .render_svg_string()
        .unwrap();

    assert!(svg.contains("<svg"));
    assert!(svg.contains("bval"));
    assert!(svg.contains("framewise_displacement"));
    assert!(svg.contains("time (s)"));
    assert!(svg.contains("mean:"));
}

#[test]
fn rendering_is_deterministic() {
    let table = confounds(&CONFOUND_PRIORITY, 10);
    let a = DiffusionSummary::new(&qc_bundle(), &table, &small_options()).unwrap();
    let b = DiffusionSummary::new(&qc_bundle(), &table, &small_options()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.render_svg_string().unwrap(), b.render_svg_string().unwrap());
}

#[test]
fn summary_saved_as_svg() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("summary.svg");
    let table = confounds(&["hmc_xcorr"], 10);
    let summary =
        render_diffusion_summary(&qc_bundle(), &table, &small_options(), Some(&out)).unwrap();
    assert_eq!(summary.band_names(), ["hmc_xcorr"]);

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("hmc_xcorr"));
}

#[test]
fn tiny_canvases_render_without_panicking() {
    let table = confounds(&CONFOUND_PRIORITY, 10);
    for size in [(10, 10), (1, 1), (2, 200), (30, 5), (400, 3)] {
        let options = SummaryOptions {
            size,
            ..SummaryOptions::default()
        };
        let summary = DiffusionSummary::new(&qc_bundle(), &table, &options).unwrap();
        assert_eq!(summary.band_count(), 3);
        let svg = summary.render_svg_string().unwrap();
        assert!(svg.contains("<svg"), "{size:?}");
    }
}

#[test]
fn unknown_extension_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("summary.pdf");
    let table = confounds(&["bval"], 10);
    let err = render_diffusion_summary(&qc_bundle(), &table, &small_options(), Some(&out))
        .unwrap_err();
    assert!(matches!(err, DwiprepError::Config(_)));
}

#[test]
fn tsv_and_archive_round_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let qc_path = dir.path().join("sliceqc.json");
    let tsv_path = dir.path().join("confounds.tsv");

    std::fs::write(
        &qc_path,
        r#"{"slice_scores": [[0.1, 0.2, 0.3], [0.0, null, 0.5]], "slice_counts": [120, 80]}"#,
    )
    .unwrap();
    std::fs::write(&tsv_path, "bval\tframewise_displacement\n0\tn/a\n1000\t0.2\n1000\t0.4\n")
        .unwrap();

    let qc = SliceQc::load(&qc_path).unwrap();
    let table = ConfoundTable::load(&tsv_path).unwrap();
    let summary = DiffusionSummary::new(&qc, &table, &small_options()).unwrap();
    assert_eq!(summary.band_names(), ["bval", "framewise_displacement"]);

    let fd = &summary.bands()[1];
    assert_eq!(fd.stats().count, 2);
    assert!((fd.stats().max - 0.4).abs() < 1e-12);
}

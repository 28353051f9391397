//! The diffusion summary figure: confound bands stacked over the carpet.

use std::collections::BTreeMap;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ReportConfig;
use crate::report::carpet::CarpetBand;
use crate::report::colors::palette;
use crate::report::confound_band::{BandOptions, ConfoundBand};
use crate::report::confounds::ConfoundTable;
use crate::report::qc::SliceQc;
use crate::report::{check_size, Figure};
use crate::{DwiprepError, Result};

/// Confounds shown, top to bottom, when present in the table.
pub const CONFOUND_PRIORITY: [&str; 3] = ["bval", "hmc_xcorr", "framewise_displacement"];

const BAND_RATIO: u32 = 1;
const CARPET_RATIO: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    /// Allow-list applied on top of [`CONFOUND_PRIORITY`].
    pub selected: Option<Vec<String>>,
    pub repetition_time: Option<f64>,
    pub units: BTreeMap<String, String>,
    pub cutoffs: BTreeMap<String, Vec<f64>>,
    pub size: (u32, u32),
}

impl Default for SummaryOptions {
    fn default() -> Self {
        ReportConfig::default().into()
    }
}

impl From<ReportConfig> for SummaryOptions {
    fn from(config: ReportConfig) -> Self {
        Self {
            selected: config.confounds,
            repetition_time: config.repetition_time,
            units: config.units,
            cutoffs: config.cutoffs,
            size: (config.width, config.height),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionSummary {
    bands: Vec<ConfoundBand>,
    carpet: CarpetBand,
    size: (u32, u32),
}

impl DiffusionSummary {
    /// Lay out the figure. Shapes are checked here, before anything is drawn.
    pub fn new(qc: &SliceQc, confounds: &ConfoundTable, options: &SummaryOptions) -> Result<Self> {
        let volumes = qc.n_volumes();
        if !confounds.is_empty() && confounds.len() != volumes {
            return Err(DwiprepError::Shape(format!(
                "confound series have {} entries but the QC matrix has {volumes} volumes",
                confounds.len()
            )));
        }
        check_size(options.size)?;

        if let Some(allow) = &options.selected {
            for name in allow {
                if !CONFOUND_PRIORITY.contains(&name.as_str()) || !confounds.contains(name) {
                    warn!(confound = %name, "requested confound is not plotted");
                }
            }
        }

        let names: Vec<&str> = CONFOUND_PRIORITY
            .into_iter()
            .filter(|name| confounds.contains(name))
            .filter(|name| {
                options
                    .selected
                    .as_ref()
                    .map_or(true, |allow| allow.iter().any(|a| a.as_str() == *name))
            })
            .collect();

        let colors = palette(names.len());
        let mut bands = Vec::with_capacity(names.len());
        for (name, color) in names.into_iter().zip(colors) {
            let Some(values) = confounds.column(name) else {
                continue;
            };
            let band_options = BandOptions {
                units: options.units.get(name).cloned(),
                cutoffs: options.cutoffs.get(name).cloned().unwrap_or_default(),
                ylims: (None, None),
            };
            debug!(confound = name, "adding confound band");
            bands.push(ConfoundBand::new(name, values, color, &band_options));
        }

        Ok(Self {
            bands,
            carpet: CarpetBand::new(qc, options.repetition_time),
            size: options.size,
        })
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(ConfoundBand::name).collect()
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn bands(&self) -> &[ConfoundBand] {
        &self.bands
    }

    pub fn carpet(&self) -> &CarpetBand {
        &self.carpet
    }

    /// One entry per band, top to bottom; the carpet comes last.
    pub fn height_ratios(&self) -> Vec<u32> {
        let mut ratios = vec![BAND_RATIO; self.bands.len()];
        ratios.push(CARPET_RATIO);
        ratios
    }
}

impl Figure for DiffusionSummary {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let (_, height) = area.dim_in_pixel();
        let ratios = self.height_ratios();
        let total: u32 = ratios.iter().sum();

        let mut breaks = Vec::with_capacity(ratios.len() - 1);
        let mut acc = 0;
        for ratio in &ratios[..ratios.len() - 1] {
            acc += ratio;
            breaks.push((height as u64 * acc as u64 / total as u64) as i32);
        }
        let rows = area.split_by_breakpoints([] as [i32; 0], breaks);

        for (band, row) in self.bands.iter().zip(&rows) {
            band.draw(row)?;
        }
        if let Some(carpet_area) = rows.last() {
            self.carpet.draw(carpet_area)?;
        }
        Ok(())
    }
}

/// Build a summary figure and, when `output` is given, write it there.
pub fn render_diffusion_summary(
    qc: &SliceQc,
    confounds: &ConfoundTable,
    options: &SummaryOptions,
    output: Option<&Path>,
) -> Result<DiffusionSummary> {
    let summary = DiffusionSummary::new(qc, confounds, options)?;
    info!(
        bands = summary.band_count(),
        slices = qc.n_slices(),
        volumes = qc.n_volumes(),
        "laid out diffusion summary"
    );
    if let Some(path) = output {
        summary.save(path)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn qc(slices: usize, volumes: usize) -> SliceQc {
        SliceQc::new(Array2::zeros((slices, volumes)), Array1::ones(slices)).unwrap()
    }

    fn table(names: &[&str], rows: usize) -> ConfoundTable {
        ConfoundTable::from_columns(
            names
                .iter()
                .map(|n| (n.to_string(), vec![0.5; rows]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn bands_follow_priority_order() {
        let confounds = table(&["framewise_displacement", "dvars", "bval"], 10);
        let summary =
            DiffusionSummary::new(&qc(5, 10), &confounds, &SummaryOptions::default()).unwrap();
        assert_eq!(summary.band_names(), ["bval", "framewise_displacement"]);
        assert_eq!(summary.height_ratios(), [1, 1, 5]);
    }

    #[test]
    fn allow_list_filters_bands() {
        let confounds = table(&CONFOUND_PRIORITY, 10);
        let options = SummaryOptions {
            selected: Some(vec!["hmc_xcorr".into()]),
            ..SummaryOptions::default()
        };
        let summary = DiffusionSummary::new(&qc(5, 10), &confounds, &options).unwrap();
        assert_eq!(summary.band_names(), ["hmc_xcorr"]);
    }

    #[test]
    fn units_and_cutoffs_reach_bands() {
        let confounds = table(&["framewise_displacement"], 4);
        let mut options = SummaryOptions::default();
        options
            .units
            .insert("framewise_displacement".into(), "mm".into());
        options
            .cutoffs
            .insert("framewise_displacement".into(), vec![0.5]);
        let summary = DiffusionSummary::new(&qc(3, 4), &confounds, &options).unwrap();
        let band = &summary.bands()[0];
        assert_eq!(band.title(), "framewise_displacement [mm]");
        assert_eq!(band.cutoffs(), [0.5]);
    }

    #[test]
    fn misaligned_confounds_rejected() {
        let confounds = table(&["bval"], 9);
        let err =
            DiffusionSummary::new(&qc(5, 10), &confounds, &SummaryOptions::default()).unwrap_err();
        assert!(matches!(err, DwiprepError::Shape(_)));
    }

    #[test]
    fn zero_size_rejected() {
        let options = SummaryOptions {
            size: (0, 100),
            ..SummaryOptions::default()
        };
        let err = DiffusionSummary::new(&qc(2, 2), &ConfoundTable::default(), &options).unwrap_err();
        assert!(matches!(err, DwiprepError::Config(_)));
    }

    #[test]
    fn options_from_report_config() {
        let config = ReportConfig {
            width: 400,
            repetition_time: Some(3.0),
            ..ReportConfig::default()
        };
        let options = SummaryOptions::from(config);
        assert_eq!(options.size, (400, 800));
        assert_eq!(options.repetition_time, Some(3.0));
    }
}

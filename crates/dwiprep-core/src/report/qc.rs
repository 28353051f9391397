//! Slice-wise QC archive: per-slice outlier scores and voxel counts.

use std::path::Path;

use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::{DwiprepError, Result};

/// Scores are laid out `slices × volumes`; counts hold one entry per slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceQc {
    slice_scores: Array2<f64>,
    slice_counts: Array1<f64>,
}

/// On-disk layout. `null` entries decode as NaN.
#[derive(Debug, Deserialize)]
struct SliceQcArchive {
    slice_scores: Vec<Vec<Option<f64>>>,
    slice_counts: Vec<Option<f64>>,
}

impl SliceQc {
    pub fn new(slice_scores: Array2<f64>, slice_counts: Array1<f64>) -> Result<Self> {
        let (slices, volumes) = slice_scores.dim();
        if slices == 0 || volumes == 0 {
            return Err(DwiprepError::Shape(format!(
                "slice_scores must be non-empty, got {slices}x{volumes}"
            )));
        }
        if slice_counts.len() != slices {
            return Err(DwiprepError::Shape(format!(
                "slice_counts has {} entries but slice_scores has {slices} slices",
                slice_counts.len()
            )));
        }
        Ok(Self {
            slice_scores,
            slice_counts,
        })
    }

    /// Read a JSON archive with `slice_scores` and `slice_counts` arrays.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
            .map_err(|e| DwiprepError::Archive(format!("{}: {e}", path.display())))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let archive: SliceQcArchive =
            serde_json::from_str(raw).map_err(|e| DwiprepError::Archive(e.to_string()))?;

        let slices = archive.slice_scores.len();
        let volumes = archive.slice_scores.first().map_or(0, Vec::len);
        if let Some(row) = archive.slice_scores.iter().position(|r| r.len() != volumes) {
            return Err(DwiprepError::Shape(format!(
                "slice_scores row {row} has {} volumes, expected {volumes}",
                archive.slice_scores[row].len()
            )));
        }

        let flat: Vec<f64> = archive
            .slice_scores
            .into_iter()
            .flatten()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        let scores = Array2::from_shape_vec((slices, volumes), flat)
            .map_err(|e| DwiprepError::Shape(e.to_string()))?;
        let counts: Array1<f64> = archive
            .slice_counts
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();

        Self::new(scores, counts)
    }

    pub fn slice_scores(&self) -> &Array2<f64> {
        &self.slice_scores
    }

    pub fn slice_counts(&self) -> &Array1<f64> {
        &self.slice_counts
    }

    pub fn n_slices(&self) -> usize {
        self.slice_scores.nrows()
    }

    pub fn n_volumes(&self) -> usize {
        self.slice_scores.ncols()
    }
}

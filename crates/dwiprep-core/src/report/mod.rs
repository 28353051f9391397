//! QC summary figures for a preprocessed diffusion series.
//!
//! A [`DiffusionSummary`] stacks one band per selected confound above a
//! carpet of slice-wise outlier scores. Every figure implements [`Figure`],
//! which draws onto any plotters backend and exports SVG or PNG by file
//! extension.

pub mod carpet;
pub mod colors;
pub mod confound_band;
pub mod confounds;
pub mod qc;
pub mod spikes;
pub mod stats;
pub mod summary;

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::Pos;
use tracing::info;

use crate::{DwiprepError, Result};

pub use carpet::{plot_sliceqc, CarpetBand};
pub use confound_band::{BandOptions, ConfoundBand};
pub use confounds::ConfoundTable;
pub use qc::SliceQc;
pub use spikes::{SpikesOptions, SpikesPlot};
pub use stats::SeriesStats;
pub use summary::{
    render_diffusion_summary, DiffusionSummary, SummaryOptions, CONFOUND_PRIORITY,
};

/// Output format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("svg") => Ok(ImageFormat::Svg),
            Some("png") => Ok(ImageFormat::Png),
            _ => Err(DwiprepError::Config(format!(
                "unsupported figure format for '{}': expected .svg or .png",
                path.display()
            ))),
        }
    }
}

/// Something that can be drawn onto a plotters area of a fixed size.
pub trait Figure {
    /// Canvas size in pixels.
    fn size(&self) -> (u32, u32);

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()>;

    /// Render to an in-memory SVG document.
    fn render_svg_string(&self) -> Result<String> {
        check_size(self.size())?;
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, self.size()).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            self.draw(&root)?;
            root.present().map_err(render_err)?;
        }
        Ok(buf)
    }

    /// Write to `path`; the backend is released before returning.
    fn save(&self, path: &Path) -> Result<()> {
        check_size(self.size())?;
        let format = ImageFormat::from_path(path)?;
        match format {
            ImageFormat::Svg => {
                let root = SVGBackend::new(path, self.size()).into_drawing_area();
                root.fill(&WHITE).map_err(render_err)?;
                self.draw(&root)?;
                root.present().map_err(render_err)?;
            }
            ImageFormat::Png => {
                let root = BitMapBackend::new(path, self.size()).into_drawing_area();
                root.fill(&WHITE).map_err(render_err)?;
                self.draw(&root)?;
                root.present().map_err(render_err)?;
            }
        }
        info!(path = %path.display(), ?format, "wrote figure");
        Ok(())
    }
}

/// Both canvas dimensions must be non-zero.
pub fn check_size(size: (u32, u32)) -> Result<()> {
    if size.0 == 0 || size.1 == 0 {
        return Err(DwiprepError::Config(format!(
            "figure size must be non-zero, got {}x{}",
            size.0, size.1
        )));
    }
    Ok(())
}

/// Areas narrower or shorter than this are left blank.
pub(crate) const MIN_DRAWABLE: u32 = 2;

pub(crate) fn render_err(err: impl std::fmt::Display) -> DwiprepError {
    DwiprepError::Render(err.to_string())
}

/// Text style for labels drawn directly in pixel space.
pub(crate) fn label_style(size: u32, color: RGBColor, pos: Pos) -> TextStyle<'static> {
    ("sans-serif", size).into_font().color(&color).pos(pos)
}

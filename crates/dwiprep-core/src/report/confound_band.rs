//! One confound time series drawn as a thin band above the carpet.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::report::colors::{DIM_GRAY, LIGHT_GRAY};
use crate::report::stats::SeriesStats;
use crate::report::{label_style, render_err, MIN_DRAWABLE};
use crate::Result;

/// Left gutter holding the reference-line labels, as a fraction of the band width.
const GUTTER_RATIO: u32 = 101;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandOptions {
    pub units: Option<String>,
    pub cutoffs: Vec<f64>,
    /// Lower / upper limits the y range must at least reach.
    pub ylims: (Option<f64>, Option<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfoundBand {
    name: String,
    values: Vec<f64>,
    color: (u8, u8, u8),
    units: Option<String>,
    cutoffs: Vec<f64>,
    stats: SeriesStats,
    y_range: (f64, f64),
}

impl ConfoundBand {
    pub fn new(name: &str, values: &[f64], color: RGBColor, options: &BandOptions) -> Self {
        let stats = SeriesStats::from_series(values);
        Self {
            name: name.to_string(),
            values: values.to_vec(),
            color: (color.0, color.1, color.2),
            units: options.units.clone(),
            cutoffs: options.cutoffs.clone(),
            stats,
            y_range: y_limits(&stats, options.ylims),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn color(&self) -> RGBColor {
        RGBColor(self.color.0, self.color.1, self.color.2)
    }

    pub fn stats(&self) -> &SeriesStats {
        &self.stats
    }

    pub fn y_range(&self) -> (f64, f64) {
        self.y_range
    }

    pub fn cutoffs(&self) -> &[f64] {
        &self.cutoffs
    }

    /// Band caption, with the units in brackets when known.
    pub fn title(&self) -> String {
        match &self.units {
            Some(units) => format!("{} [{units}]", self.name),
            None => self.name.clone(),
        }
    }

    pub fn stats_label(&self) -> String {
        let units = self.units.as_deref().unwrap_or("");
        format!(
            "max: {:.3}{units} • mean: {:.3}{units} • σ: {:.3}",
            self.stats.max, self.stats.mean, self.stats.std
        )
    }

    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let (width, height) = area.dim_in_pixel();
        let (gutter, plot) = area.split_horizontally((width / GUTTER_RATIO + 24).min(width / 2));
        let (plot_width, _) = plot.dim_in_pixel();
        if plot_width < MIN_DRAWABLE || height < MIN_DRAWABLE {
            return Ok(());
        }

        let x_max = self.values.len().saturating_sub(1).max(1) as f64;
        let (lo, hi) = self.y_range;
        let mut chart = ChartBuilder::on(&plot)
            .build_cartesian_2d(0f64..x_max, lo..hi)
            .map_err(render_err)?;

        let to_pixel = |v: f64| ((hi - v) / (hi - lo) * height as f64).round() as i32;
        let gutter_x = gutter.dim_in_pixel().0 as i32 - 2;

        chart
            .draw_series(LineSeries::new(
                [(0.0, self.stats.p95), (x_max, self.stats.p95)],
                LIGHT_GRAY.stroke_width(1),
            ))
            .map_err(render_err)?;
        gutter
            .draw(&Text::new(
                format!("{:.2}", self.stats.p95),
                (gutter_x, to_pixel(self.stats.p95)),
                label_style(8, LIGHT_GRAY, Pos::new(HPos::Right, VPos::Center)),
            ))
            .map_err(render_err)?;

        for &cutoff in &self.cutoffs {
            chart
                .draw_series(LineSeries::new(
                    [(0.0, cutoff), (x_max, cutoff)],
                    DIM_GRAY.stroke_width(1),
                ))
                .map_err(render_err)?;
            gutter
                .draw(&Text::new(
                    format!("{cutoff:.2}"),
                    (gutter_x, to_pixel(cutoff)),
                    label_style(8, DIM_GRAY, Pos::new(HPos::Right, VPos::Center)),
                ))
                .map_err(render_err)?;
        }

        // NaN samples break the trace into separate runs.
        let color = self.color();
        for run in finite_runs(&self.values) {
            chart
                .draw_series(LineSeries::new(run, color.stroke_width(1)))
                .map_err(render_err)?;
        }

        let label_y = (height as f64 * 0.3) as i32;
        plot.draw(&Text::new(
            self.title(),
            (4, label_y),
            label_style(11, color, Pos::new(HPos::Left, VPos::Center)),
        ))
        .map_err(render_err)?;
        plot.draw(&Text::new(
            self.stats_label(),
            ((plot_width as f64 * 0.98) as i32, label_y),
            label_style(9, color, Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(render_err)?;

        Ok(())
    }
}

/// `[min - 0.1|min|, 1.1 max]`, widened to `ylims`, then 10 % of the span
/// added below for the captions.
fn y_limits(stats: &SeriesStats, ylims: (Option<f64>, Option<f64>)) -> (f64, f64) {
    if stats.count == 0 {
        return (0.0, 1.0);
    }
    let mut lo = stats.min - 0.1 * stats.min.abs();
    let mut hi = 1.1 * stats.max;
    if let Some(floor) = ylims.0 {
        lo = lo.min(floor);
    }
    if let Some(ceiling) = ylims.1 {
        hi = hi.max(ceiling);
    }
    if hi <= lo {
        hi = lo + 1.0;
    }
    lo -= 0.1 * (hi - lo);
    (lo, hi)
}

fn finite_runs(values: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            current.push((i as f64, v));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

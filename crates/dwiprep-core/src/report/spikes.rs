//! Spike plot: one trace per axial slice of a slice-wise noise series.

use ndarray::{s, Array2};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::report::colors::{finite_range, normalize, viridis, GRAY};
use crate::report::stats::{median, tick_labels, time_axis_label};
use crate::report::{label_style, render_err, Figure};
use crate::{DwiprepError, Result};

const TITLE_HEIGHT: u32 = 22;
const AXIS_HEIGHT: u32 = 30;
const COLORBAR_HEIGHT: u32 = 28;
const XTICK_STEP: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct SpikesOptions {
    pub repetition_time: Option<f64>,
    /// Input is z-scored per slice: symmetric limits and guide lines.
    pub zscored: bool,
    pub spike_thresh: f64,
    pub title: Option<String>,
    /// Leading volumes ignored when computing the y limits.
    pub nskip: usize,
    pub hide_x: bool,
    pub size: (u32, u32),
}

impl Default for SpikesOptions {
    fn default() -> Self {
        Self {
            repetition_time: None,
            zscored: true,
            spike_thresh: 6.0,
            title: Some("Spike plot".to_string()),
            nskip: 0,
            hide_x: true,
            size: (950, 300),
        }
    }
}

/// `slices × volumes` series with precomputed limits and guide lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikesPlot {
    series: Array2<f64>,
    options: SpikesOptions,
    stem: bool,
    y_range: (f64, f64),
    guides: Vec<f64>,
    threshold: Option<f64>,
    xticks: Vec<usize>,
}

impl SpikesPlot {
    pub fn new(series: Array2<f64>, options: &SpikesOptions) -> Result<Self> {
        let (slices, volumes) = series.dim();
        if slices == 0 || volumes == 0 {
            return Err(DwiprepError::Shape(format!(
                "spike series must be non-empty, got {slices}x{volumes}"
            )));
        }
        if options.nskip >= volumes {
            return Err(DwiprepError::Config(format!(
                "nskip ({}) must be smaller than the number of volumes ({volumes})",
                options.nskip
            )));
        }

        let kept: Vec<f64> = series.slice(s![.., options.nskip..]).iter().copied().collect();
        let (y_range, guides, threshold) = if options.zscored {
            let zs_max = max_abs(series.iter());
            let kept_max = max_abs(kept.iter()) * 1.05;
            let y_range = if kept_max > 0.0 {
                (-kept_max, kept_max)
            } else {
                (-1.0, 1.0)
            };
            let threshold = (zs_max < options.spike_thresh).then_some(options.spike_thresh);
            (y_range, guide_values(zs_max), threshold)
        } else {
            let (min, max) = finite_range(kept.iter());
            let hi = (max * 1.05).max((max - min) * 2.0 + max);
            let y_range = if hi > 0.0 { (0.0, hi) } else { (0.0, 1.0) };
            (y_range, Vec::new(), None)
        };

        let xticks = if options.hide_x {
            Vec::new()
        } else {
            let last = volumes - 1;
            let mut ticks: Vec<usize> = (0..last).step_by(XTICK_STEP).collect();
            ticks.push(last);
            ticks
        };

        Ok(Self {
            stem: distinct_values(&series) == 2,
            series,
            options: options.clone(),
            y_range,
            guides,
            threshold,
            xticks,
        })
    }

    pub fn y_range(&self) -> (f64, f64) {
        self.y_range
    }

    /// Positive guide levels; lines are drawn at `±value`.
    pub fn guides(&self) -> &[f64] {
        &self.guides
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    /// Binary data is drawn as stems instead of lines.
    pub fn is_stem(&self) -> bool {
        self.stem
    }

    pub fn xticks(&self) -> &[usize] {
        &self.xticks
    }

    pub fn y_label(&self) -> &'static str {
        if self.options.zscored {
            "slice-wise noise average on background (z-scored)"
        } else {
            "slice-wise noise average on background"
        }
    }

    /// Median of the series after `nskip`, the middle non-z-scored tick.
    pub fn median(&self) -> f64 {
        let kept: Vec<f64> = self
            .series
            .slice(s![.., self.options.nskip..])
            .iter()
            .copied()
            .collect();
        median(&kept)
    }

    fn draw_traces<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let (width, height) = area.dim_in_pixel();
        let (_, plot) = area.split_horizontally(width / 101);
        let (slices, volumes) = self.series.dim();
        let x_max = volumes.saturating_sub(1).max(1) as f64;
        let (lo, hi) = self.y_range;

        let mut chart = ChartBuilder::on(&plot)
            .build_cartesian_2d(0f64..x_max, lo..hi)
            .map_err(render_err)?;

        let guide_style = BLACK.mix(0.2).stroke_width(1);
        for &level in &self.guides {
            for y in [-level, level] {
                chart
                    .draw_series(LineSeries::new([(0.0, y), (x_max, y)], guide_style))
                    .map_err(render_err)?;
            }
        }
        if let Some(thresh) = self.threshold {
            for y in [-thresh, thresh] {
                chart
                    .draw_series(LineSeries::new([(0.0, y), (x_max, y)], BLACK.stroke_width(1)))
                    .map_err(render_err)?;
            }
        }

        for (sl, row) in self.series.outer_iter().enumerate() {
            let color = viridis(normalize(sl as f64, 0.0, slices.saturating_sub(1) as f64));
            let points: Vec<(f64, f64)> = row
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(i, &v)| (i as f64, v))
                .collect();
            if self.stem {
                chart
                    .draw_series(points.iter().map(|&(x, y)| {
                        PathElement::new(vec![(x, 0.0), (x, y)], color.stroke_width(1))
                    }))
                    .map_err(render_err)?;
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|&(x, y)| Circle::new((x, y), 2, color.filled())),
                    )
                    .map_err(render_err)?;
            } else {
                chart
                    .draw_series(LineSeries::new(points, color.stroke_width(1)))
                    .map_err(render_err)?;
            }
        }

        plot.draw(&Text::new(
            self.y_label(),
            (4, (height as f64 * 0.3) as i32),
            label_style(10, GRAY, Pos::new(HPos::Left, VPos::Center)),
        ))
        .map_err(render_err)?;
        Ok(())
    }

    fn draw_time_axis<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let (width, height) = area.dim_in_pixel();
        let offset = width / 101;
        let plot_width = (width - offset) as f64;
        let last = self.series.ncols().saturating_sub(1).max(1) as f64;
        let labels = tick_labels(&self.xticks, self.options.repetition_time);
        for (&tick, label) in self.xticks.iter().zip(&labels) {
            let x = offset as i32 + (tick as f64 / last * plot_width) as i32;
            area.draw(&Text::new(
                label.as_str(),
                (x, 2),
                label_style(9, BLACK, Pos::new(HPos::Center, VPos::Top)),
            ))
            .map_err(render_err)?;
        }
        area.draw(&Text::new(
            time_axis_label(self.options.repetition_time),
            ((width / 2) as i32, height as i32 - 2),
            label_style(10, BLACK, Pos::new(HPos::Center, VPos::Bottom)),
        ))
        .map_err(render_err)?;
        Ok(())
    }
}

/// Horizontal slice-order colorbar, inferior to superior.
fn draw_colorbar<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>) -> Result<()> {
    let (width, _) = area.dim_in_pixel();
    let x0 = (width as f64 * 0.7) as i32;
    let bar_width = (width as f64 * 0.2).max(1.0) as i32;
    for i in 0..bar_width {
        let color = viridis(i as f64 / bar_width as f64);
        area.draw(&Rectangle::new([(x0 + i, 2), (x0 + i + 1, 8)], color.filled()))
            .map_err(render_err)?;
    }
    for (frac, label) in [(0.0, "Inferior"), (0.5, "(axial slice)"), (1.0, "Superior")] {
        let x = x0 + (frac * bar_width as f64) as i32;
        area.draw(&Text::new(
            label,
            (x, 10),
            label_style(9, BLACK, Pos::new(HPos::Center, VPos::Top)),
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

impl Figure for SpikesPlot {
    fn size(&self) -> (u32, u32) {
        self.options.size
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let (width, height) = area.dim_in_pixel();
        let title_height = match self.options.title {
            Some(_) => TITLE_HEIGHT.min(height / 4),
            None => 0,
        };
        let colorbar_height = COLORBAR_HEIGHT.min(height / 4);
        let axis_height = if self.xticks.is_empty() {
            0
        } else {
            AXIS_HEIGHT.min(height / 4)
        };

        let (head, rest) = area.split_vertically(title_height);
        let (middle, colorbar) = rest.split_vertically(height - title_height - colorbar_height);
        let (traces, axis) =
            middle.split_vertically(height - title_height - colorbar_height - axis_height);

        if let Some(title) = &self.options.title {
            head.draw(&Text::new(
                title.as_str(),
                ((width / 2) as i32, 2),
                label_style(13, BLACK, Pos::new(HPos::Center, VPos::Top)),
            ))
            .map_err(render_err)?;
        }
        self.draw_traces(&traces)?;
        if !self.xticks.is_empty() {
            self.draw_time_axis(&axis)?;
        }
        draw_colorbar(&colorbar)
    }
}

fn max_abs<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(0.0, |acc, v| acc.max(v.abs()))
}

/// `0, step, 2·step, … < max` with `step = floor(max / 2)`.
fn guide_values(zs_max: f64) -> Vec<f64> {
    let step = (zs_max / 2.0).floor();
    if zs_max <= 0.0 {
        return Vec::new();
    }
    if step <= 0.0 {
        return vec![0.0];
    }
    (0..)
        .map(|i| i as f64 * step)
        .take_while(|&v| v < zs_max)
        .collect()
}

fn distinct_values(series: &Array2<f64>) -> usize {
    let mut values: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values.len()
}

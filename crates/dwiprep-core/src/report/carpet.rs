//! Carpet plot of slice-wise outlier scores over time.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::report::colors::{finite_range, normalize, plasma, viridis, GRAY, MISSING};
use crate::report::qc::SliceQc;
use crate::report::stats::{frame_ticks, tick_labels, time_axis_label};
use crate::report::{check_size, label_style, render_err, Figure, MIN_DRAWABLE};
use crate::Result;

/// Matrix width per unit of side-bar width.
const SIDE_BAR_RATIO: u32 = 100;
const AXIS_HEIGHT: u32 = 36;

/// Heat-mapped `slices × volumes` matrix with a voxel-count side bar.
#[derive(Debug, Clone, PartialEq)]
pub struct CarpetBand {
    qc: SliceQc,
    ticks: Vec<usize>,
    tick_labels: Vec<String>,
    x_label: &'static str,
}

impl CarpetBand {
    pub fn new(qc: &SliceQc, repetition_time: Option<f64>) -> Self {
        let ticks = frame_ticks(qc.n_volumes());
        let tick_labels = tick_labels(&ticks, repetition_time);
        Self {
            qc: qc.clone(),
            ticks,
            tick_labels,
            x_label: time_axis_label(repetition_time),
        }
    }

    pub fn qc(&self) -> &SliceQc {
        &self.qc
    }

    pub fn ticks(&self) -> &[usize] {
        &self.ticks
    }

    pub fn tick_labels(&self) -> &[String] {
        &self.tick_labels
    }

    pub fn x_label(&self) -> &'static str {
        self.x_label
    }

    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let (width, height) = area.dim_in_pixel();
        if width < MIN_DRAWABLE || height < MIN_DRAWABLE {
            return Ok(());
        }
        let axis_height = AXIS_HEIGHT.min(height / 3);
        let (body, axis) = area.split_vertically(height - axis_height);
        let side_width = (width / (SIDE_BAR_RATIO + 1)).max(4).min(width / 2);
        let (side, matrix) = body.split_horizontally(side_width);

        self.draw_side_bar(&side)?;
        self.draw_matrix(&matrix)?;
        self.draw_axis(&axis, side_width, matrix.dim_in_pixel().0)
    }

    fn draw_side_bar<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let counts = self.qc.slice_counts();
        let rows = counts.len();
        let (lo, hi) = finite_range(counts.iter());
        let mut chart = ChartBuilder::on(area)
            .build_cartesian_2d(0f64..1f64, 0f64..rows as f64)
            .map_err(render_err)?;
        chart
            .draw_series(counts.iter().enumerate().map(|(r, &count)| {
                let top = (rows - r) as f64;
                let color = if count.is_finite() {
                    plasma(normalize(count, lo, hi))
                } else {
                    MISSING
                };
                Rectangle::new([(0.0, top), (1.0, top - 1.0)], color.filled())
            }))
            .map_err(render_err)?;
        Ok(())
    }

    fn draw_matrix<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let scores = self.qc.slice_scores();
        let (rows, cols) = scores.dim();
        let (lo, hi) = finite_range(scores.iter());
        let mut chart = ChartBuilder::on(area)
            .build_cartesian_2d(0f64..cols as f64, 0f64..rows as f64)
            .map_err(render_err)?;
        // Slice 0 on top.
        chart
            .draw_series(scores.indexed_iter().map(|((r, c), &score)| {
                let top = (rows - r) as f64;
                let color = if score.is_finite() {
                    viridis(normalize(score, lo, hi))
                } else {
                    MISSING
                };
                Rectangle::new([(c as f64, top), (c as f64 + 1.0, top - 1.0)], color.filled())
            }))
            .map_err(render_err)?;
        Ok(())
    }

    fn draw_axis<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        offset: u32,
        matrix_width: u32,
    ) -> Result<()> {
        let (width, height) = area.dim_in_pixel();
        let cols = self.qc.n_volumes() as f64;
        for (&tick, label) in self.ticks.iter().zip(&self.tick_labels) {
            let x = offset as i32 + ((tick as f64 + 0.5) / cols * matrix_width as f64) as i32;
            area.draw(&PathElement::new(vec![(x, 0), (x, 4)], GRAY))
                .map_err(render_err)?;
            area.draw(&Text::new(
                label.as_str(),
                (x, 6),
                label_style(9, BLACK, Pos::new(HPos::Center, VPos::Top)),
            ))
            .map_err(render_err)?;
        }
        area.draw(&Text::new(
            self.x_label,
            ((offset + width) as i32 / 2, height as i32 - 2),
            label_style(11, BLACK, Pos::new(HPos::Center, VPos::Bottom)),
        ))
        .map_err(render_err)?;
        Ok(())
    }
}

struct SliceQcFigure {
    carpet: CarpetBand,
    size: (u32, u32),
}

impl Figure for SliceQcFigure {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        self.carpet.draw(area)
    }
}

/// Write a standalone carpet figure to `output` (`.svg` or `.png`).
pub fn plot_sliceqc(
    qc: &SliceQc,
    repetition_time: Option<f64>,
    size: (u32, u32),
    output: &Path,
) -> Result<()> {
    check_size(size)?;
    SliceQcFigure {
        carpet: CarpetBand::new(qc, repetition_time),
        size,
    }
    .save(output)
}

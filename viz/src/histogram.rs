//! Histogram layer for metric distributions.
//!
//! A fixed-bin histogram of display-clipped metric values, colored with the
//! same palette as the companion focal-plane scatter so the two views read
//! consistently. The layer is plain data (edges, counts, colors) with an
//! SVG rendering on top.

use crate::palette::ContinuousPalette;
use crate::scale::DisplayScale;
use crate::{render_err, Result};
use plotters::coord::Shift;
use plotters::prelude::*;

/// Fixed bin count for metric distribution histograms.
pub const NUM_BINS: usize = 50;

/// Binned distribution of one metric for one camera.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramLayer {
    metric: String,
    /// Bin edges, `NUM_BINS + 1` ascending values; empty when there was no
    /// data to bin.
    edges: Vec<f64>,
    counts: Vec<u64>,
    colors: Vec<RGBColor>,
}

impl HistogramLayer {
    /// Histogram with no entries, used when a camera has no measured values.
    pub fn empty(metric: &str) -> Self {
        Self {
            metric: metric.to_string(),
            edges: Vec::new(),
            counts: Vec::new(),
            colors: Vec::new(),
        }
    }

    /// Bin already-clipped values over the display range. NaN entries are
    /// skipped. An undefined scale yields an empty histogram.
    pub fn from_values(
        metric: &str,
        clipped: &[f64],
        scale: &DisplayScale,
        palette: &ContinuousPalette,
    ) -> Self {
        let Some((low, high)) = scale.bounds() else {
            return Self::empty(metric);
        };
        if !clipped.iter().any(|v| !v.is_nan()) {
            return Self::empty(metric);
        }

        let step = (high - low) / NUM_BINS as f64;
        let edges: Vec<f64> = (0..=NUM_BINS).map(|i| low + step * i as f64).collect();
        let mut counts = vec![0u64; NUM_BINS];

        for &value in clipped.iter().filter(|v| !v.is_nan()) {
            // Clipped values land in [low, high]; the top edge belongs to
            // the last bin.
            let bin = if value >= high {
                NUM_BINS - 1
            } else {
                (((value - low) / step).floor() as usize).min(NUM_BINS - 1)
            };
            counts[bin] += 1;
        }

        Self {
            metric: metric.to_string(),
            edges,
            counts,
            colors: palette.bin_colors(NUM_BINS),
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Value range covered by the bins, None when empty.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        match self.edges.as_slice() {
            [] => None,
            edges => Some((edges[0], edges[edges.len() - 1])),
        }
    }

    /// Draw into a drawing area, optionally forcing a shared value-axis
    /// range so sibling histograms compare directly.
    pub fn draw_on<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        x_range: Option<(f64, f64)>,
    ) -> Result<()> {
        area.fill(&WHITE).map_err(render_err)?;

        let (x_low, x_high) = match x_range.or_else(|| self.value_range()) {
            Some(range) => range,
            // Nothing to draw and no shared frame requested.
            None => return Ok(()),
        };

        let y_high = self.counts.iter().max().copied().unwrap_or(0).max(1) as f64 * 1.05;

        let mut chart = ChartBuilder::on(area)
            .caption(&self.metric, ("sans-serif", 14))
            .margin(5)
            .x_label_area_size(20)
            .y_label_area_size(28)
            .build_cartesian_2d(x_low..x_high, 0.0..y_high)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(4)
            .y_labels(3)
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(
                self.counts
                    .iter()
                    .zip(&self.colors)
                    .enumerate()
                    .filter(|(_, (&count, _))| count > 0)
                    .map(|(i, (&count, color))| {
                        Rectangle::new(
                            [(self.edges[i], 0.0), (self.edges[i + 1], count as f64)],
                            color.filled(),
                        )
                    }),
            )
            .map_err(render_err)?;

        Ok(())
    }

    /// Render as a standalone SVG document.
    pub fn to_svg(&self, width: u32, height: u32) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
            self.draw_on(&root, None)?;
            root.present().map_err(render_err)?;
        }
        Ok(svg)
    }
}

//! Per-amplifier QA strip layer.
//!
//! Detector-level metrics (read noise above all) come per amplifier rather
//! than per fiber. The strip lays the amplifier units out left to right in
//! (camera, spectrograph, amplifier) order, colors each point by camera, and
//! marks the fixed acceptance window so out-of-family amplifiers stand out.

use crate::palette::camera_color;
use crate::{render_err, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use qa::table::{AmpValue, MetricTable};

/// Acceptance window and display bounds for one per-amp metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmpThresholds {
    /// Lower edge of the nominal range.
    pub qamin: f64,
    /// Upper edge of the nominal range.
    pub qamax: f64,
    /// Display y-axis bounds.
    pub ymin: f64,
    pub ymax: f64,
}

/// Nominal CCD amplifier read noise window, in electrons.
pub const READNOISE_THRESHOLDS: AmpThresholds = AmpThresholds {
    qamin: 1.5,
    qamax: 4.0,
    ymin: 0.0,
    ymax: 5.0,
};

/// Color of the acceptance-window boundary lines.
const THRESHOLD_COLOR: RGBColor = RGBColor(255, 140, 0);

/// Per-amplifier values of one metric with its acceptance window.
#[derive(Debug, Clone, PartialEq)]
pub struct AmpQaLayer {
    metric: String,
    title: String,
    values: Vec<AmpValue>,
    thresholds: AmpThresholds,
}

impl AmpQaLayer {
    pub fn new(
        table: &MetricTable,
        metric: &str,
        title: &str,
        thresholds: AmpThresholds,
    ) -> Result<Self> {
        Ok(Self {
            metric: metric.to_string(),
            title: title.to_string(),
            values: table.amp_values(metric)?,
            thresholds,
        })
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn values(&self) -> &[AmpValue] {
        &self.values
    }

    pub fn thresholds(&self) -> AmpThresholds {
        self.thresholds
    }

    /// Amplifiers outside the nominal window, NaN included.
    pub fn out_of_range(&self) -> Vec<&AmpValue> {
        self.values
            .iter()
            .filter(|v| {
                v.value.is_nan() || v.value < self.thresholds.qamin || v.value > self.thresholds.qamax
            })
            .collect()
    }

    pub fn draw_on<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        area.fill(&WHITE).map_err(render_err)?;

        let n = self.values.len().max(1) as f64;
        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, ("sans-serif", 14))
            .margin(5)
            .x_label_area_size(20)
            .y_label_area_size(28)
            .build_cartesian_2d(0.0..n, self.thresholds.ymin..self.thresholds.ymax)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(0)
            .y_labels(3)
            .draw()
            .map_err(render_err)?;

        // Acceptance window boundaries.
        for bound in [self.thresholds.qamin, self.thresholds.qamax] {
            chart
                .draw_series(LineSeries::new(
                    [(0.0, bound), (n, bound)],
                    THRESHOLD_COLOR.stroke_width(1),
                ))
                .map_err(render_err)?;
        }

        chart
            .draw_series(
                self.values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.value.is_nan())
                    .map(|(i, v)| {
                        Circle::new(
                            (i as f64 + 0.5, v.value.clamp(self.thresholds.ymin, self.thresholds.ymax)),
                            4,
                            camera_color(v.cam).filled(),
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
            self.draw_on(&root)?;
            root.present().map_err(render_err)?;
        }
        Ok(svg)
    }
}

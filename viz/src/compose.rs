//! Side-by-side multi-camera composition.
//!
//! Arranges one focal-plane projection per camera into a linked grid:
//! scatter panels on the top row, companion histograms below. All scatter
//! panels share one spatial frame so the same fiber position aligns across
//! cameras, and the histograms share one value axis so distribution shapes
//! compare directly.

use crate::focalplane::{self, ScatterLayer};
use crate::histogram::HistogramLayer;
use crate::scale::CameraScaleOptions;
use crate::{render_err, Result};
use plotters::prelude::*;
use qa::camera::Camera;
use qa::layout::FocalPlaneLayout;
use qa::table::MetricTable;

/// One camera's column in the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPanel {
    pub scatter: ScatterLayer,
    pub histogram: HistogramLayer,
}

/// Linked per-camera grid for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraGrid {
    metric: String,
    /// Panels in caller-given camera order; this is the left-to-right
    /// layout order.
    panels: Vec<CameraPanel>,
    x_range: (f64, f64),
    y_range: (f64, f64),
    /// Shared histogram value axis; None when every panel is empty.
    hist_range: Option<(f64, f64)>,
}

impl CameraGrid {
    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn panels(&self) -> &[CameraPanel] {
        &self.panels
    }

    /// Cameras in panel order.
    pub fn cameras(&self) -> Vec<Camera> {
        self.panels.iter().map(|p| p.scatter.camera).collect()
    }

    pub fn hist_range(&self) -> Option<(f64, f64)> {
        self.hist_range
    }

    /// Render the full grid as one SVG document: scatter row on top,
    /// histogram row below, one column per camera.
    pub fn to_svg(&self, panel_width: u32, panel_height: u32) -> Result<String> {
        let columns = self.panels.len().max(1);
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(
                &mut svg,
                (panel_width * columns as u32, panel_height * 2),
            )
            .into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            let areas = root.split_evenly((2, columns));
            for (i, panel) in self.panels.iter().enumerate() {
                panel
                    .scatter
                    .draw_on(&areas[i], self.x_range, self.y_range)?;
                panel.histogram.draw_on(&areas[columns + i], self.hist_range)?;
            }

            root.present().map_err(render_err)?;
        }
        Ok(svg)
    }
}

/// Compose one projection per camera, preserving the caller's camera order.
///
/// Returns `Ok(None)` when the metric is not a column of the table at all:
/// an explicit no-data result callers must check before embedding, instead
/// of an empty or broken grid.
pub fn compose(
    table: &MetricTable,
    metric: &str,
    cameras: &[Camera],
    layout: &FocalPlaneLayout,
    options: &CameraScaleOptions,
) -> Result<Option<CameraGrid>> {
    if !table.has_metric(metric) {
        return Ok(None);
    }

    let mut panels = Vec::with_capacity(cameras.len());
    for &camera in cameras {
        let (scatter, histogram) =
            focalplane::project(table, metric, camera, layout, &options.for_camera(camera))?;
        panels.push(CameraPanel { scatter, histogram });
    }

    let hist_range = panels
        .iter()
        .filter_map(|p| p.histogram.value_range())
        .reduce(|(low_a, high_a), (low_b, high_b)| (low_a.min(low_b), high_a.max(high_b)));

    let (x_range, y_range) = focalplane::layout_ranges(layout);

    Ok(Some(CameraGrid {
        metric: metric.to_string(),
        panels,
        x_range,
        y_range,
        hist_range,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{CameraScaleOptions, ScaleOptions};
    use qa::layout::FiberPosition;
    use qa::table::FiberMetricRow;

    const METRIC: &str = "INTEG_RAW_FLUX";

    fn row(cam: Camera, fiber: u32, value: f64) -> FiberMetricRow {
        FiberMetricRow {
            cam,
            spectro: 0,
            fiber,
            values: [(METRIC.to_string(), value)].into_iter().collect(),
        }
    }

    fn layout() -> FocalPlaneLayout {
        FocalPlaneLayout::from_positions((0..9).map(|fiber| FiberPosition {
            fiber,
            x: fiber as f64,
            y: -(fiber as f64),
        }))
    }

    fn table() -> MetricTable {
        MetricTable::per_cam_fiber(
            1,
            1,
            vec![
                row(Camera::B, 0, 1.0),
                row(Camera::B, 1, 2.0),
                row(Camera::R, 3, 10.0),
                row(Camera::Z, 6, 100.0),
            ],
        )
    }

    #[test]
    fn test_camera_order_is_preserved() {
        let order = [Camera::Z, Camera::B, Camera::R];
        let grid = compose(
            &table(),
            METRIC,
            &order,
            &layout(),
            &CameraScaleOptions::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(grid.cameras(), order.to_vec());
    }

    #[test]
    fn test_absent_metric_yields_no_data_sentinel() {
        let result = compose(
            &table(),
            "SNR",
            &Camera::ALL,
            &layout(),
            &CameraScaleOptions::default(),
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_shared_histogram_range_spans_all_cameras() {
        let grid = compose(
            &table(),
            METRIC,
            &Camera::ALL,
            &layout(),
            &CameraScaleOptions::default(),
        )
        .unwrap()
        .unwrap();

        let (low, high) = grid.hist_range().unwrap();
        // B spans [1, 2], Z sits near 100 (widened when degenerate); the
        // shared axis must cover both.
        assert!(low <= 1.0);
        assert!(high >= 100.0);
    }

    #[test]
    fn test_per_camera_overrides_apply() {
        let options = CameraScaleOptions::default().with_override(
            Camera::B,
            ScaleOptions {
                zmax: Some(1.5),
                ..Default::default()
            },
        );
        let grid = compose(&table(), METRIC, &[Camera::B], &layout(), &options)
            .unwrap()
            .unwrap();

        let scatter = &grid.panels()[0].scatter;
        let max_display = scatter
            .points()
            .iter()
            .map(|p| p.value)
            .fold(f64::MIN, f64::max);
        assert_eq!(max_display, 1.5);
    }

    #[test]
    fn test_render_smoke() {
        let grid = compose(
            &table(),
            METRIC,
            &Camera::ALL,
            &layout(),
            &CameraScaleOptions::default(),
        )
        .unwrap()
        .unwrap();
        let svg = grid.to_svg(250, 270).unwrap();
        assert!(svg.contains("<svg"));
    }
}

//! Focal-plane projection of a metric for one camera.
//!
//! Partitions a per-camera-fiber table against one camera, resolves an
//! outlier-resistant display scale over the measured values, and produces a
//! color-mapped scatter layer over the fiber layout plus a companion
//! histogram of the clipped values. Unmeasured layout fibers become a
//! de-emphasized background so "no data" never reads as a zero.

use crate::histogram::HistogramLayer;
use crate::palette::{camera_color, ContinuousPalette, BACKGROUND_COLOR, NAN_COLOR};
use crate::scale::{self, DisplayScale, ScaleOptions};
use crate::{render_err, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use qa::camera::Camera;
use qa::layout::FocalPlaneLayout;
use qa::table::{BackgroundFiber, MetricTable};

/// Marker radius for measured fibers, in pixels.
pub const MEASURED_RADIUS: i32 = 5;

/// Marker radius for background (unmeasured) fibers; smaller visual weight
/// than measured points.
pub const BACKGROUND_RADIUS: i32 = 2;

/// Segments used to draw the plate boundary ring.
const RING_SEGMENTS: usize = 128;

/// One measured fiber, placed and colored for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub fiber: u32,
    pub x: f64,
    pub y: f64,
    /// Display-clipped metric value; the table's value is untouched.
    pub value: f64,
    pub color: RGBColor,
}

/// Color-mapped focal-plane scatter for one camera.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterLayer {
    pub camera: Camera,
    pub metric: String,
    pub scale: DisplayScale,
    points: Vec<ScatterPoint>,
    background: Vec<BackgroundFiber>,
    /// Spatial frame shared with sibling panels.
    x_range: (f64, f64),
    y_range: (f64, f64),
    /// Plate boundary radius; 0 when the layout is empty.
    plate_radius: f64,
}

impl ScatterLayer {
    pub fn points(&self) -> &[ScatterPoint] {
        &self.points
    }

    pub fn background(&self) -> &[BackgroundFiber] {
        &self.background
    }

    pub fn x_range(&self) -> (f64, f64) {
        self.x_range
    }

    pub fn y_range(&self) -> (f64, f64) {
        self.y_range
    }

    /// Draw into a drawing area using the given spatial frame, which sibling
    /// panels share so the same fiber position aligns across cameras.
    pub fn draw_on<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Result<()> {
        area.fill(&WHITE).map_err(render_err)?;

        let frame = camera_color(self.camera);
        let mut chart = ChartBuilder::on(area)
            .caption(
                self.camera.to_string(),
                ("sans-serif", 18).into_font().color(&frame),
            )
            .margin(5)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
            .map_err(render_err)?;

        // Background first so measured points draw on top of it.
        chart
            .draw_series(
                self.background
                    .iter()
                    .map(|b| Circle::new((b.x, b.y), BACKGROUND_RADIUS, BACKGROUND_COLOR.filled())),
            )
            .map_err(render_err)?;

        chart
            .draw_series(
                self.points
                    .iter()
                    .map(|p| Circle::new((p.x, p.y), MEASURED_RADIUS, p.color.filled())),
            )
            .map_err(render_err)?;

        // Plate boundary ring in the camera's color.
        if self.plate_radius > 0.0 {
            let ring = (0..=RING_SEGMENTS).map(|i| {
                let theta = i as f64 / RING_SEGMENTS as f64 * std::f64::consts::TAU;
                (self.plate_radius * theta.cos(), self.plate_radius * theta.sin())
            });
            chart
                .draw_series(std::iter::once(PathElement::new(
                    ring.collect::<Vec<_>>(),
                    frame.stroke_width(2),
                )))
                .map_err(render_err)?;
        }

        Ok(())
    }

    /// Render as a standalone SVG document.
    pub fn to_svg(&self, width: u32, height: u32) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
            self.draw_on(&root, self.x_range, self.y_range)?;
            root.present().map_err(render_err)?;
        }
        Ok(svg)
    }
}

/// Spatial frame covering the whole layout with a small margin, so every
/// camera panel shows the full plate.
pub(crate) fn layout_ranges(layout: &FocalPlaneLayout) -> ((f64, f64), (f64, f64)) {
    match layout.envelope() {
        Some(((x_min, x_max), (y_min, y_max))) => {
            let pad = |low: f64, high: f64| {
                let margin = ((high - low) * 0.05).max(1.0);
                (low - margin, high + margin)
            };
            (pad(x_min, x_max), pad(y_min, y_max))
        }
        None => ((-1.0, 1.0), (-1.0, 1.0)),
    }
}

fn plate_radius(layout: &FocalPlaneLayout) -> f64 {
    layout
        .iter()
        .map(|p| (p.x * p.x + p.y * p.y).sqrt())
        .fold(0.0, f64::max)
        * 1.02
}

/// Project one metric onto the focal plane for one camera.
///
/// Fails only when the metric is not a column of the table. A camera with no
/// measured rows still yields a valid scatter layer (background points only)
/// and an empty histogram.
pub fn project(
    table: &MetricTable,
    metric: &str,
    camera: Camera,
    layout: &FocalPlaneLayout,
    options: &ScaleOptions,
) -> Result<(ScatterLayer, HistogramLayer)> {
    let partition = table.partition_camera(camera, metric, layout)?;
    let palette = ContinuousPalette::default();

    let raw = partition.values();
    let display_scale = scale::resolve(&raw, options);
    let clipped = scale::clip_values(&raw, &display_scale);

    let points = partition
        .measured
        .iter()
        .zip(&clipped)
        .map(|(m, &value)| ScatterPoint {
            fiber: m.fiber,
            x: m.x,
            y: m.y,
            value,
            color: display_scale
                .normalize(value)
                .map(|t| palette.color_at(t))
                .unwrap_or(NAN_COLOR),
        })
        .collect();

    let histogram = HistogramLayer::from_values(metric, &clipped, &display_scale, &palette);

    let (x_range, y_range) = layout_ranges(layout);
    let scatter = ScatterLayer {
        camera,
        metric: metric.to_string(),
        scale: display_scale,
        points,
        background: partition.background,
        x_range,
        y_range,
        plate_radius: plate_radius(layout),
    };

    Ok((scatter, histogram))
}

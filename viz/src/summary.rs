//! Flavor-driven summary assembly.
//!
//! One exposure's QA summary is a named collection of renderable bundles
//! plus a metadata block. Which bundles appear depends on the exposure
//! flavor: calibration flux for arcs and flats, calibrated flux for science
//! exposures, a spectra sample when extractions exist, and the per-amplifier
//! read-noise strip for everything. Assembly degrades by omission: a bundle
//! whose inputs are missing or broken is logged and left out, and never
//! takes its siblings down with it.

use crate::amp::{AmpQaLayer, READNOISE_THRESHOLDS};
use crate::compose::{self, CameraGrid};
use crate::scale::CameraScaleOptions;
use crate::{render_err, Result};
use ndarray::Array1;
use plotters::coord::Shift;
use plotters::prelude::*;
use qa::camera::Camera;
use qa::identity::{ExposureIdentity, Flavor};
use qa::layout::FocalPlaneLayout;
use qa::spectra::{FiberSpectra, SpectrumTrace};
use qa::status::StatusTable;
use qa::table::MetricTable;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const RAWFLUX_METRIC: &str = "INTEG_RAW_FLUX";
pub const CALIBFLUX_METRIC: &str = "INTEG_CALIB_FLUX";
pub const READNOISE_METRIC: &str = "READNOISE";

/// Bundle names as they appear in the assembled summary.
pub const RAWFLUX_BUNDLE: &str = "RAWFLUX";
pub const CALIBFLUX_BUNDLE: &str = "CALIBFLUX";
pub const READNOISE_BUNDLE: &str = "READNOISE";
pub const SPECTRA_BUNDLE: &str = "SPECTRA";

/// How many fibers the spectra bundle samples for display.
pub const SPECTRA_SAMPLE_SIZE: usize = 5;

/// Wavelength-grid stride applied to sampled traces; full-resolution
/// spectra are far denser than a summary panel can show.
pub const SPECTRA_DOWNSAMPLE: usize = 4;

/// A small sample of extracted spectra, downsampled for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectraLayer {
    /// Sampled traces in ascending fiber order.
    traces: Vec<(u32, SpectrumTrace)>,
}

impl SpectraLayer {
    /// Sample up to [`SPECTRA_SAMPLE_SIZE`] fibers without replacement and
    /// downsample each trace. The sampled fibers are re-sorted so the
    /// legend order is stable regardless of draw order.
    pub fn sample<R: Rng + ?Sized>(spectra: &FiberSpectra, rng: &mut R) -> Self {
        let fibers = spectra.fibers();
        let mut picked: Vec<u32> = fibers
            .choose_multiple(rng, SPECTRA_SAMPLE_SIZE)
            .copied()
            .collect();
        picked.sort_unstable();

        let traces = picked
            .into_iter()
            .filter_map(|fiber| {
                spectra
                    .trace(fiber)
                    .map(|trace| (fiber, downsample(trace, SPECTRA_DOWNSAMPLE)))
            })
            .collect();

        Self { traces }
    }

    pub fn traces(&self) -> &[(u32, SpectrumTrace)] {
        &self.traces
    }

    /// Sampled fiber ids, ascending.
    pub fn fibers(&self) -> Vec<u32> {
        self.traces.iter().map(|(fiber, _)| *fiber).collect()
    }

    /// Comma-separated fiber list for the summary caption, e.g. "3, 17, 401".
    pub fn fiber_list(&self) -> String {
        self.fibers()
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn draw_on<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        area.fill(&WHITE).map_err(render_err)?;

        let samples = self
            .traces
            .iter()
            .flat_map(|(_, t)| t.wavelength.iter().zip(t.flux.iter()));
        let mut x = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y = (f64::INFINITY, f64::NEG_INFINITY);
        for (&w, &f) in samples {
            if w.is_finite() {
                x = (x.0.min(w), x.1.max(w));
            }
            if f.is_finite() {
                y = (y.0.min(f), y.1.max(f));
            }
        }
        if !(x.0 < x.1) {
            // Nothing drawable.
            return Ok(());
        }
        if !(y.0 < y.1) {
            y = (y.0 - 1.0, y.0 + 1.0);
        }

        let mut chart = ChartBuilder::on(area)
            .caption(format!("fibers {}", self.fiber_list()), ("sans-serif", 14))
            .margin(5)
            .x_label_area_size(20)
            .y_label_area_size(32)
            .build_cartesian_2d(x.0..x.1, y.0..y.1)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(5)
            .y_labels(3)
            .draw()
            .map_err(render_err)?;

        for (i, (_, trace)) in self.traces.iter().enumerate() {
            chart
                .draw_series(LineSeries::new(
                    trace
                        .wavelength
                        .iter()
                        .zip(trace.flux.iter())
                        .map(|(&w, &f)| (w, f)),
                    Palette99::pick(i).stroke_width(1),
                ))
                .map_err(render_err)?;
        }

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

fn downsample(trace: &SpectrumTrace, stride: usize) -> SpectrumTrace {
    let stride = stride.max(1);
    SpectrumTrace::new(
        Array1::from_iter(trace.wavelength.iter().step_by(stride).copied()),
        Array1::from_iter(trace.flux.iter().step_by(stride).copied()),
    )
}

/// One renderable bundle of the summary.
#[derive(Debug, Clone, PartialEq)]
pub enum Bundle {
    Grid(CameraGrid),
    Amp(AmpQaLayer),
    Spectra(SpectraLayer),
}

impl Bundle {
    pub fn to_svg(&self, width: u32, height: u32) -> Result<String> {
        match self {
            Bundle::Grid(grid) => grid.to_svg(width, height),
            Bundle::Amp(layer) => layer.to_svg(width, height),
            Bundle::Spectra(layer) => layer.to_svg(width, height),
        }
    }
}

/// Header-derived metadata shown alongside the bundles.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetadata {
    pub night: i64,
    pub expid: i64,
    pub flavor: String,
    pub program: String,
    pub exptime: f64,
    /// Labels of units whose processing failed, e.g. "R1".
    pub failed_units: Vec<String>,
}

impl SummaryMetadata {
    pub fn new(identity: &ExposureIdentity, status: &StatusTable) -> Self {
        let mut failed_units: Vec<String> =
            status.failed_units().map(|u| u.unit_label()).collect();
        failed_units.sort_unstable();
        Self {
            night: identity.night,
            expid: identity.expid,
            flavor: identity.flavor.to_string(),
            program: identity.program.clone(),
            exptime: identity.exptime,
            failed_units,
        }
    }

    /// Zero-padded exposure id used in archive paths, e.g. "00012345".
    pub fn zexpid(&self) -> String {
        format!("{:08}", self.expid)
    }

    /// Exposure time formatted for display.
    pub fn exptime_label(&self) -> String {
        format!("{:.1}", self.exptime)
    }
}

/// The assembled summary: named bundles plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryBundles {
    pub metadata: SummaryMetadata,
    bundles: BTreeMap<String, Bundle>,
}

impl SummaryBundles {
    pub fn get(&self, name: &str) -> Option<&Bundle> {
        self.bundles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bundles.contains_key(name)
    }

    /// Bundle names present, in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.bundles.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

/// QA products available for one exposure. Any of them may be absent when
/// the corresponding pipeline step did not run or its output is unreadable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryInputs<'a> {
    pub per_camfiber: Option<&'a MetricTable>,
    pub per_amp: Option<&'a MetricTable>,
    pub spectra: Option<&'a FiberSpectra>,
}

/// Assemble the summary for one exposure.
///
/// Returns a new collection; the inputs are not modified. Every bundle is
/// attempted independently: a failure is logged and the bundle omitted.
pub fn assemble<R: Rng + ?Sized>(
    identity: &ExposureIdentity,
    status: &StatusTable,
    inputs: &SummaryInputs<'_>,
    layout: &FocalPlaneLayout,
    rng: &mut R,
) -> SummaryBundles {
    let metadata = SummaryMetadata::new(identity, status);
    let mut bundles = BTreeMap::new();

    // Read noise applies to every flavor.
    match inputs.per_amp {
        Some(table) => {
            match AmpQaLayer::new(table, READNOISE_METRIC, "CCD Read Noise", READNOISE_THRESHOLDS)
            {
                Ok(layer) => {
                    bundles.insert(READNOISE_BUNDLE.to_string(), Bundle::Amp(layer));
                }
                Err(err) => warn!(expid = identity.expid, "skipping read-noise bundle: {err}"),
            }
        }
        None => debug!(expid = identity.expid, "no per-amplifier table"),
    }

    // Flux view depends on the flavor: raw for calibration lamps, calibrated
    // for on-sky exposures, none for anything else.
    let flux = match identity.flavor {
        Flavor::Arc | Flavor::Flat => Some((RAWFLUX_BUNDLE, RAWFLUX_METRIC)),
        Flavor::Science => Some((CALIBFLUX_BUNDLE, CALIBFLUX_METRIC)),
        Flavor::Other(_) => None,
    };
    if let Some((name, metric)) = flux {
        match inputs.per_camfiber {
            Some(table) => {
                match compose::compose(
                    table,
                    metric,
                    &Camera::ALL,
                    layout,
                    &CameraScaleOptions::default(),
                ) {
                    Ok(Some(grid)) => {
                        bundles.insert(name.to_string(), Bundle::Grid(grid));
                    }
                    Ok(None) => {
                        warn!(expid = identity.expid, metric, "metric absent, skipping {name}")
                    }
                    Err(err) => warn!(expid = identity.expid, "skipping {name} bundle: {err}"),
                }
            }
            None => debug!(expid = identity.expid, "no per-camera-fiber table"),
        }
    }

    // Spectra sample for every flavor that has a flux view.
    if flux.is_some() {
        if let Some(spectra) = inputs.spectra {
            let layer = SpectraLayer::sample(spectra, rng);
            if layer.is_empty() {
                debug!(expid = identity.expid, "no spectra to sample");
            } else {
                bundles.insert(SPECTRA_BUNDLE.to_string(), Bundle::Spectra(layer));
            }
        }
    }

    SummaryBundles { metadata, bundles }
}

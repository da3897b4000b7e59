//! Display-scale resolution for heavy-tailed metric distributions.
//!
//! QA metrics routinely carry outliers that would otherwise dominate a
//! linear color mapper, so the effective display range is resolved from an
//! optional percentile window plus optional hard bounds, NaN-safely. The
//! resolved scale only ever applies to display copies of the data; the
//! underlying metric tables are never mutated.

use qa::camera::Camera;
use std::collections::BTreeMap;
use tracing::debug;

/// Minimal half-span used to widen a degenerate (low == high) scale.
const MIN_HALF_SPAN: f64 = 0.5;

/// Effective display range for one (metric, camera) pair. Ephemeral:
/// recomputed per render request and discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayScale {
    Defined { low: f64, high: f64 },
    /// No finite data to scale. Consumers must check for this and render
    /// all points in a single neutral color instead of invoking a numeric
    /// color mapper.
    Undefined,
}

impl DisplayScale {
    pub fn is_defined(&self) -> bool {
        matches!(self, DisplayScale::Defined { .. })
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            DisplayScale::Defined { low, high } => Some((low, high)),
            DisplayScale::Undefined => None,
        }
    }

    /// Clip one value to the display range. NaN passes through, as does
    /// everything when the scale is undefined.
    pub fn clip(&self, value: f64) -> f64 {
        match *self {
            DisplayScale::Defined { low, high } if !value.is_nan() => value.clamp(low, high),
            _ => value,
        }
    }

    /// Position of a value within the range as t in [0, 1], for palette
    /// lookup. None for NaN input or an undefined scale.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        match *self {
            DisplayScale::Defined { low, high } if !value.is_nan() => {
                Some(((value - low) / (high - low)).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

/// Caller-supplied scaling policy for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScaleOptions {
    /// Percentile window (low_pct, high_pct) over the non-NaN values,
    /// e.g. (2.5, 97.5).
    pub percentile: Option<(f64, f64)>,
    /// Hard lower bound, overriding the percentile-derived low.
    pub zmin: Option<f64>,
    /// Hard upper bound, overriding the percentile-derived high.
    pub zmax: Option<f64>,
}

/// Per-camera scaling policy: a default plus optional per-camera overrides,
/// so each camera may scale independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraScaleOptions {
    default: ScaleOptions,
    overrides: BTreeMap<Camera, ScaleOptions>,
}

impl CameraScaleOptions {
    /// Same policy for every camera.
    pub fn uniform(default: ScaleOptions) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, camera: Camera, options: ScaleOptions) -> Self {
        self.overrides.insert(camera, options);
        self
    }

    pub fn for_camera(&self, camera: Camera) -> ScaleOptions {
        self.overrides.get(&camera).copied().unwrap_or(self.default)
    }
}

/// Resolve the effective display range for a metric.
///
/// Policy, in order: empty or all-NaN input yields [`DisplayScale::Undefined`];
/// a percentile window (or, absent one, the plain min/max) over the non-NaN
/// subset sets the initial bounds; hard zmin/zmax each override their side
/// independently; a degenerate low == high range is widened symmetrically to
/// a minimal nonzero span.
pub fn resolve(values: &[f64], options: &ScaleOptions) -> DisplayScale {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        debug!("no finite values to scale");
        return DisplayScale::Undefined;
    }
    finite.sort_unstable_by(f64::total_cmp);

    let (mut low, mut high) = match options.percentile {
        Some((low_pct, high_pct)) => (
            percentile_sorted(&finite, low_pct),
            percentile_sorted(&finite, high_pct),
        ),
        None => (finite[0], finite[finite.len() - 1]),
    };

    if let Some(zmin) = options.zmin {
        low = zmin;
    }
    if let Some(zmax) = options.zmax {
        high = zmax;
    }

    if low == high {
        let half = MIN_HALF_SPAN.max(low.abs() * 1e-3);
        low -= half;
        high += half;
    }

    debug!("resolved display scale [{low}, {high}]");
    DisplayScale::Defined { low, high }
}

/// Display copies of the values, clipped to the scale. NaN entries are
/// preserved so downstream color mapping can keep them neutral.
pub fn clip_values(values: &[f64], scale: &DisplayScale) -> Vec<f64> {
    values.iter().map(|&v| scale.clip(v)).collect()
}

/// Percentile of a sorted, NaN-free slice with linear interpolation between
/// order statistics. `pct` is clamped to [0, 100].
fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    let pct = pct.clamp(0.0, 100.0);
    let last = sorted.len() - 1;
    let rank = pct / 100.0 * last as f64;
    let below = rank.floor() as usize;
    if below == last {
        return sorted[last];
    }
    let frac = rank - below as f64;
    sorted[below] + (sorted[below + 1] - sorted[below]) * frac
}

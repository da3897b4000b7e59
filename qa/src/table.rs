//! Normalized in-memory metric tables.
//!
//! A [`MetricTable`] holds the numeric QA metrics of one exposure in columnar
//! form, keyed per row by (camera, spectrograph) plus either a fiber id or an
//! amplifier letter depending on the table variant. Tables are constructed
//! once per exposure and never mutated by renderers, which derive filtered
//! views instead of copies-with-edits.
//!
//! A fiber that was never measured for a camera is simply absent from the
//! table; that absence is distinct from a measured-but-invalid value, which
//! is stored as NaN.

use crate::camera::Camera;
use crate::layout::FocalPlaneLayout;
use crate::QaError;
use ndarray::Array1;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Table variant, declaring which key columns a table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TableKind {
    /// One row per (camera, spectrograph, amplifier).
    PerAmp,
    /// One row per (camera, spectrograph, fiber).
    PerCamFiber,
}

impl TableKind {
    /// Key columns of this variant, beyond the shared NIGHT/EXPID pair.
    pub fn key_columns(self) -> &'static [&'static str] {
        match self {
            TableKind::PerAmp => &["CAM", "SPECTRO", "AMP"],
            TableKind::PerCamFiber => &["CAM", "SPECTRO", "FIBER"],
        }
    }
}

/// Input row for a per-camera-fiber table.
#[derive(Debug, Clone, PartialEq)]
pub struct FiberMetricRow {
    pub cam: Camera,
    pub spectro: u8,
    pub fiber: u32,
    /// Metric name → value. Metrics missing from a row are stored as NaN.
    pub values: BTreeMap<String, f64>,
}

/// Input row for a per-amplifier table.
#[derive(Debug, Clone, PartialEq)]
pub struct AmpMetricRow {
    pub cam: Camera,
    pub spectro: u8,
    /// Amplifier letter, A-D.
    pub amp: char,
    pub values: BTreeMap<String, f64>,
}

/// One measured fiber placed on the focal plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasuredFiber {
    pub fiber: u32,
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// A layout fiber with no measurement for the requested camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundFiber {
    pub fiber: u32,
    pub x: f64,
    pub y: f64,
}

/// Result of partitioning a table against one camera: the camera's measured
/// fibers and, disjoint from them, every other layout position. Produced in
/// a single pass so the two subsets cannot drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPartition {
    pub camera: Camera,
    pub metric: String,
    pub measured: Vec<MeasuredFiber>,
    pub background: Vec<BackgroundFiber>,
}

impl CameraPartition {
    /// Metric values of the measured subset, in row order.
    pub fn values(&self) -> Vec<f64> {
        self.measured.iter().map(|m| m.value).collect()
    }
}

/// One amplifier's metric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmpValue {
    pub cam: Camera,
    pub spectro: u8,
    pub amp: char,
    pub value: f64,
}

impl AmpValue {
    /// Short unit label, e.g. "B0:A".
    pub fn label(&self) -> String {
        format!("{}{}:{}", self.cam, self.spectro, self.amp)
    }
}

/// Columnar metric table for one exposure.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    kind: TableKind,
    night: i64,
    expid: i64,
    cams: Vec<Camera>,
    spectros: Vec<u8>,
    fibers: Vec<u32>,
    amps: Vec<char>,
    columns: BTreeMap<String, Array1<f64>>,
}

impl MetricTable {
    /// Build a per-camera-fiber table. The column set is the union of all
    /// row metric names; rows lacking a metric get NaN in that column.
    pub fn per_cam_fiber(night: i64, expid: i64, rows: Vec<FiberMetricRow>) -> Self {
        let names: BTreeSet<String> = rows
            .iter()
            .flat_map(|r| r.values.keys().cloned())
            .collect();

        let mut columns = BTreeMap::new();
        for name in names {
            let column: Array1<f64> = rows
                .iter()
                .map(|r| r.values.get(&name).copied().unwrap_or(f64::NAN))
                .collect();
            columns.insert(name, column);
        }

        Self {
            kind: TableKind::PerCamFiber,
            night,
            expid,
            cams: rows.iter().map(|r| r.cam).collect(),
            spectros: rows.iter().map(|r| r.spectro).collect(),
            fibers: rows.iter().map(|r| r.fiber).collect(),
            amps: Vec::new(),
            columns,
        }
    }

    /// Build a per-amplifier table.
    pub fn per_amp(night: i64, expid: i64, rows: Vec<AmpMetricRow>) -> Self {
        let names: BTreeSet<String> = rows
            .iter()
            .flat_map(|r| r.values.keys().cloned())
            .collect();

        let mut columns = BTreeMap::new();
        for name in names {
            let column: Array1<f64> = rows
                .iter()
                .map(|r| r.values.get(&name).copied().unwrap_or(f64::NAN))
                .collect();
            columns.insert(name, column);
        }

        Self {
            kind: TableKind::PerAmp,
            night,
            expid,
            cams: rows.iter().map(|r| r.cam).collect(),
            spectros: rows.iter().map(|r| r.spectro).collect(),
            fibers: Vec::new(),
            amps: rows.iter().map(|r| r.amp).collect(),
            columns,
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn night(&self) -> i64 {
        self.night
    }

    pub fn expid(&self) -> i64 {
        self.expid
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.cams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cams.is_empty()
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Metric column, checked by name before any projection work.
    pub fn metric(&self, name: &str) -> crate::Result<&Array1<f64>> {
        self.columns.get(name).ok_or_else(|| QaError::UnknownMetric {
            metric: name.to_string(),
        })
    }

    /// Fiber ids, parallel to the metric columns. Empty for per-amp tables.
    pub fn fibers(&self) -> &[u32] {
        &self.fibers
    }

    /// Distinct cameras present, in canonical order.
    pub fn cameras(&self) -> Vec<Camera> {
        let set: BTreeSet<Camera> = self.cams.iter().copied().collect();
        set.into_iter().collect()
    }

    fn require_kind(&self, expected: TableKind) -> crate::Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(QaError::WrongTableKind {
                expected,
                found: self.kind,
            })
        }
    }

    /// Partition this table against one camera in a single pass.
    ///
    /// The *measured* subset holds the camera's rows placed at their layout
    /// positions; the *background* subset holds every layout fiber not
    /// measured by this camera. Measured fibers missing from the layout are
    /// logged and dropped, since they cannot be placed.
    pub fn partition_camera(
        &self,
        camera: Camera,
        metric: &str,
        layout: &FocalPlaneLayout,
    ) -> crate::Result<CameraPartition> {
        self.require_kind(TableKind::PerCamFiber)?;
        let column = self.metric(metric)?;

        let mut measured = Vec::new();
        let mut measured_ids: BTreeSet<u32> = BTreeSet::new();

        for (i, (&cam, &fiber)) in self.cams.iter().zip(&self.fibers).enumerate() {
            if cam != camera {
                continue;
            }
            measured_ids.insert(fiber);
            match layout.position(fiber) {
                Some((x, y)) => measured.push(MeasuredFiber {
                    fiber,
                    x,
                    y,
                    value: column[i],
                }),
                None => warn!("fiber {fiber} ({camera}{}) has no layout position", self.spectros[i]),
            }
        }

        let background = layout
            .iter()
            .filter(|p| !measured_ids.contains(&p.fiber))
            .map(|p| BackgroundFiber {
                fiber: p.fiber,
                x: p.x,
                y: p.y,
            })
            .collect();

        Ok(CameraPartition {
            camera,
            metric: metric.to_string(),
            measured,
            background,
        })
    }

    /// All per-amplifier values of one metric, ordered by (cam, spectro, amp).
    pub fn amp_values(&self, metric: &str) -> crate::Result<Vec<AmpValue>> {
        self.require_kind(TableKind::PerAmp)?;
        let column = self.metric(metric)?;

        let mut values: Vec<AmpValue> = self
            .cams
            .iter()
            .zip(&self.spectros)
            .zip(&self.amps)
            .zip(column)
            .map(|(((&cam, &spectro), &amp), &value)| AmpValue {
                cam,
                spectro,
                amp,
                value,
            })
            .collect();
        values.sort_by(|a, b| (a.cam, a.spectro, a.amp).cmp(&(b.cam, b.spectro, b.amp)));
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FiberPosition;

    fn fiber_row(cam: Camera, spectro: u8, fiber: u32, flux: f64) -> FiberMetricRow {
        FiberMetricRow {
            cam,
            spectro,
            fiber,
            values: [("INTEG_RAW_FLUX".to_string(), flux)].into_iter().collect(),
        }
    }

    fn layout() -> FocalPlaneLayout {
        FocalPlaneLayout::from_positions((0..6).map(|fiber| FiberPosition {
            fiber,
            x: fiber as f64 * 10.0,
            y: fiber as f64 * -5.0,
        }))
    }

    fn table() -> MetricTable {
        MetricTable::per_cam_fiber(
            20210101,
            12345,
            vec![
                fiber_row(Camera::B, 0, 0, 10.0),
                fiber_row(Camera::B, 0, 1, f64::NAN),
                fiber_row(Camera::R, 0, 0, 30.0),
                fiber_row(Camera::R, 0, 2, 40.0),
            ],
        )
    }

    #[test]
    fn test_metric_lookup() {
        let table = table();
        assert!(table.has_metric("INTEG_RAW_FLUX"));
        assert_eq!(table.metric("INTEG_RAW_FLUX").unwrap().len(), 4);
        assert_eq!(
            table.metric("SNR").unwrap_err(),
            QaError::UnknownMetric {
                metric: "SNR".to_string()
            }
        );
    }

    #[test]
    fn test_missing_metric_in_some_rows_is_nan() {
        let mut rows = vec![fiber_row(Camera::B, 0, 0, 1.0)];
        rows.push(FiberMetricRow {
            cam: Camera::B,
            spectro: 0,
            fiber: 1,
            values: [("SNR".to_string(), 7.0)].into_iter().collect(),
        });
        let table = MetricTable::per_cam_fiber(1, 1, rows);

        let flux = table.metric("INTEG_RAW_FLUX").unwrap();
        assert_eq!(flux[0], 1.0);
        assert!(flux[1].is_nan());
        let snr = table.metric("SNR").unwrap();
        assert!(snr[0].is_nan());
        assert_eq!(snr[1], 7.0);
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let table = table();
        let layout = layout();
        let part = table
            .partition_camera(Camera::B, "INTEG_RAW_FLUX", &layout)
            .unwrap();

        let measured_ids: Vec<u32> = part.measured.iter().map(|m| m.fiber).collect();
        assert_eq!(measured_ids, vec![0, 1]);

        let background_ids: Vec<u32> = part.background.iter().map(|b| b.fiber).collect();
        assert_eq!(background_ids, vec![2, 3, 4, 5]);
        assert_eq!(part.measured.len() + part.background.len(), layout.len());

        // Positions come from the layout, values from the table.
        assert_eq!(part.measured[0].x, 0.0);
        assert_eq!(part.measured[0].value, 10.0);
        assert!(part.measured[1].value.is_nan());
    }

    #[test]
    fn test_partition_unmeasured_camera_is_all_background() {
        let table = table();
        let layout = layout();
        let part = table
            .partition_camera(Camera::Z, "INTEG_RAW_FLUX", &layout)
            .unwrap();

        assert!(part.measured.is_empty());
        assert_eq!(part.background.len(), layout.len());
    }

    #[test]
    fn test_partition_requires_fiber_table() {
        let amp_table = MetricTable::per_amp(
            1,
            1,
            vec![AmpMetricRow {
                cam: Camera::B,
                spectro: 0,
                amp: 'A',
                values: [("READNOISE".to_string(), 2.0)].into_iter().collect(),
            }],
        );
        assert!(matches!(
            amp_table.partition_camera(Camera::B, "READNOISE", &layout()),
            Err(QaError::WrongTableKind { .. })
        ));
    }

    #[test]
    fn test_amp_values_sorted() {
        let amp_table = MetricTable::per_amp(
            1,
            1,
            vec![
                AmpMetricRow {
                    cam: Camera::R,
                    spectro: 0,
                    amp: 'B',
                    values: [("READNOISE".to_string(), 3.1)].into_iter().collect(),
                },
                AmpMetricRow {
                    cam: Camera::B,
                    spectro: 0,
                    amp: 'A',
                    values: [("READNOISE".to_string(), 2.4)].into_iter().collect(),
                },
            ],
        );

        let values = amp_table.amp_values("READNOISE").unwrap();
        assert_eq!(values[0].label(), "B0:A");
        assert_eq!(values[1].label(), "R0:B");
        assert_eq!(values[0].value, 2.4);
    }

    #[test]
    fn test_cameras_present() {
        assert_eq!(table().cameras(), vec![Camera::B, Camera::R]);
    }

    #[test]
    fn test_key_columns() {
        assert_eq!(
            TableKind::PerCamFiber.key_columns(),
            &["CAM", "SPECTRO", "FIBER"]
        );
        assert_eq!(TableKind::PerAmp.key_columns(), &["CAM", "SPECTRO", "AMP"]);
    }
}

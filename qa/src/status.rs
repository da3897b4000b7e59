//! Per-unit processing status aggregation.
//!
//! Each (camera, spectrograph) unit of an exposure is processed by its own
//! job, and a sidecar file maps the unit's log filename to the job's exit
//! code. This module joins that mapping with the exposure identity into one
//! normalized status table, one row per unit. The sidecar is parsed by an
//! external collaborator; only the materialized mapping arrives here.

use crate::camera::Camera;
use crate::identity::ExposureIdentity;
use crate::QaError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Processing status of one (camera, spectrograph) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub night: i64,
    pub expid: i64,
    pub cam: Camera,
    pub spectro: u8,
    /// Exit code of the unit's processing job; 0 means success.
    pub exit_code: i32,
}

impl UnitStatus {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Short unit label, e.g. "R1".
    pub fn unit_label(&self) -> String {
        format!("{}{}", self.cam, self.spectro)
    }
}

/// Normalized per-unit status table for one or more exposures.
///
/// Row order is unspecified; consumers must treat the table as a set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTable {
    rows: Vec<UnitStatus>,
}

impl StatusTable {
    pub fn rows(&self) -> &[UnitStatus] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows belonging to one exposure, as a new table.
    pub fn filter_exposure(&self, night: i64, expid: i64) -> StatusTable {
        StatusTable {
            rows: self
                .rows
                .iter()
                .filter(|r| r.night == night && r.expid == expid)
                .copied()
                .collect(),
        }
    }

    /// Distinct cameras present in the table, in canonical order.
    pub fn cameras(&self) -> Vec<Camera> {
        let set: BTreeSet<Camera> = self.rows.iter().map(|r| r.cam).collect();
        set.into_iter().collect()
    }

    /// Units that exited with a nonzero code.
    pub fn failed_units(&self) -> impl Iterator<Item = &UnitStatus> {
        self.rows.iter().filter(|r| !r.succeeded())
    }

    /// Order-independent row-set comparison.
    pub fn same_rows(&self, other: &StatusTable) -> bool {
        let key = |r: &UnitStatus| (r.night, r.expid, r.cam, r.spectro, r.exit_code);
        let mut a: Vec<_> = self.rows.iter().map(key).collect();
        let mut b: Vec<_> = other.rows.iter().map(key).collect();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

/// Parse the (camera, spectrograph) unit from a log filename.
///
/// The naming convention is fixed-position: the camera letter is the first
/// character and the spectrograph digit the second, e.g. `b0-qproc.log`.
pub fn parse_unit_name(filename: &str) -> crate::Result<(Camera, u8)> {
    let malformed = || QaError::MalformedIdentifier {
        token: filename.to_string(),
    };

    let mut chars = filename.chars();
    let cam = chars
        .next()
        .and_then(|c| Camera::from_letter(c).ok())
        .ok_or_else(malformed)?;
    let spectro = chars
        .next()
        .and_then(|c| c.to_digit(10))
        .ok_or_else(malformed)?;

    Ok((cam, spectro as u8))
}

/// Join a filename → exit-code mapping with the exposure identity into one
/// [`UnitStatus`] row per parseable unit.
///
/// Malformed filenames and duplicate (camera, spectrograph) units are logged
/// and skipped; they never fail the aggregation. The exposure identity must
/// already be resolved, which is where a missing night/expid surfaces.
pub fn aggregate_status(
    identity: &ExposureIdentity,
    exit_codes: &BTreeMap<String, i32>,
) -> StatusTable {
    let mut rows = Vec::with_capacity(exit_codes.len());
    let mut seen: BTreeSet<(Camera, u8)> = BTreeSet::new();

    for (filename, &exit_code) in exit_codes {
        let (cam, spectro) = match parse_unit_name(filename) {
            Ok(unit) => unit,
            Err(err) => {
                warn!("skipping unit log {filename:?}: {err}");
                continue;
            }
        };

        if !seen.insert((cam, spectro)) {
            warn!("duplicate unit {cam}{spectro} from {filename:?}, keeping first");
            continue;
        }

        rows.push(UnitStatus {
            night: identity.night,
            expid: identity.expid,
            cam,
            spectro,
            exit_code,
        });
    }

    StatusTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Flavor;

    fn identity() -> ExposureIdentity {
        ExposureIdentity {
            night: 20210101,
            expid: 12345,
            flavor: Flavor::Arc,
            program: "calib".to_string(),
            exptime: 5.0,
        }
    }

    fn mapping(pairs: &[(&str, i32)]) -> BTreeMap<String, i32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_one_row_per_valid_unit() {
        let codes = mapping(&[
            ("b0-qproc.log", 0),
            ("r0-qproc.log", 0),
            ("z0-qproc.log", 2),
            ("b1-qproc.log", 0),
        ]);
        let table = aggregate_status(&identity(), &codes);

        assert_eq!(table.len(), 4);
        let mut units: Vec<_> = table.rows().iter().map(|r| (r.cam, r.spectro)).collect();
        units.sort_unstable();
        units.dedup();
        assert_eq!(units.len(), 4, "(cam, spectro) must be unique");
    }

    #[test]
    fn test_end_to_end_mapping() {
        let codes = mapping(&[("b0-qproc.log", 0), ("r1-qproc.log", 1)]);
        let table = aggregate_status(&identity(), &codes);

        let mut rows = table.rows().to_vec();
        rows.sort_by_key(|r| (r.cam, r.spectro));
        assert_eq!(
            rows,
            vec![
                UnitStatus {
                    night: 20210101,
                    expid: 12345,
                    cam: Camera::B,
                    spectro: 0,
                    exit_code: 0,
                },
                UnitStatus {
                    night: 20210101,
                    expid: 12345,
                    cam: Camera::R,
                    spectro: 1,
                    exit_code: 1,
                },
            ]
        );
    }

    #[test]
    fn test_malformed_names_are_skipped() {
        let codes = mapping(&[
            ("b0-qproc.log", 0),
            ("qx-qproc.log", 0),
            ("b-qproc.log", 0),
            ("", 0),
        ]);
        let table = aggregate_status(&identity(), &codes);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].cam, Camera::B);
    }

    #[test]
    fn test_duplicate_units_keep_first() {
        let codes = mapping(&[("b0-qproc.log", 0), ("b0-retry.log", 3)]);
        let table = aggregate_status(&identity(), &codes);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_filter_exposure_roundtrip() {
        let codes = mapping(&[("b0-qproc.log", 0), ("r1-qproc.log", 1), ("z9-x.log", 0)]);
        let table = aggregate_status(&identity(), &codes);

        let filtered = table.filter_exposure(20210101, 12345);
        assert!(filtered.same_rows(&table));
        assert!(table.filter_exposure(20210102, 12345).is_empty());
    }

    #[test]
    fn test_failed_units() {
        let codes = mapping(&[("b0-qproc.log", 0), ("r1-qproc.log", 1)]);
        let table = aggregate_status(&identity(), &codes);

        let failed: Vec<_> = table.failed_units().map(UnitStatus::unit_label).collect();
        assert_eq!(failed, vec!["R1".to_string()]);
    }

    #[test]
    fn test_parse_unit_name_case_insensitive() {
        assert_eq!(
            parse_unit_name("B3-qproc.log").unwrap(),
            (Camera::B, 3),
        );
        assert_eq!(parse_unit_name("z0.log").unwrap(), (Camera::Z, 0));
        assert!(parse_unit_name("0b.log").is_err());
    }
}

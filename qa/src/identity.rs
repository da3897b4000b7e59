//! Exposure identity resolved from header fields.
//!
//! Callers hand over the exposure header as an already-materialized
//! key/value mapping; this module only validates and types it. The identity
//! is immutable once read and anchors every downstream table row.

use crate::QaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder used when the header carries no PROGRAM keyword. Downstream
/// reporting expects the field to always be present.
pub const MISSING_PROGRAM: &str = "no program in header!";

/// Exposure type, determining which QA bundles apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flavor {
    Arc,
    Flat,
    Science,
    /// Any other flavor string (ZERO, DARK, ...), kept verbatim.
    Other(String),
}

impl Flavor {
    /// Parse a header flavor value, case-insensitively, ignoring the
    /// trailing padding some header writers leave on string cards.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_end();
        match trimmed.to_ascii_uppercase().as_str() {
            "ARC" => Flavor::Arc,
            "FLAT" => Flavor::Flat,
            "SCIENCE" => Flavor::Science,
            _ => Flavor::Other(trimmed.to_string()),
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Arc => write!(f, "ARC"),
            Flavor::Flat => write!(f, "FLAT"),
            Flavor::Science => write!(f, "SCIENCE"),
            Flavor::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Identity of a single exposure, shared by reference across all of its
/// tables. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureIdentity {
    /// Integer date code of the observing night, e.g. 20210101.
    pub night: i64,
    /// Exposure id, unique within the survey.
    pub expid: i64,
    pub flavor: Flavor,
    pub program: String,
    /// Exposure time in seconds.
    pub exptime: f64,
}

impl ExposureIdentity {
    /// Build the identity from a materialized header mapping.
    ///
    /// NIGHT, EXPID, FLAVOR and EXPTIME are required; a missing or
    /// unparsable value fails with [`QaError::MissingIdentity`]. PROGRAM is
    /// optional and substituted with [`MISSING_PROGRAM`] when absent.
    pub fn from_header(header: &BTreeMap<String, String>) -> crate::Result<Self> {
        let night = required_parsed::<i64>(header, "NIGHT")?;
        let expid = required_parsed::<i64>(header, "EXPID")?;
        let flavor = Flavor::parse(required(header, "FLAVOR")?);
        let exptime = required_parsed::<f64>(header, "EXPTIME")?;
        let program = header
            .get("PROGRAM")
            .map(|p| p.trim_end().to_string())
            .unwrap_or_else(|| MISSING_PROGRAM.to_string());

        Ok(Self {
            night,
            expid,
            flavor,
            program,
            exptime,
        })
    }
}

fn required<'a>(header: &'a BTreeMap<String, String>, field: &str) -> crate::Result<&'a str> {
    header
        .get(field)
        .map(String::as_str)
        .ok_or_else(|| QaError::MissingIdentity {
            field: field.to_string(),
        })
}

fn required_parsed<T: std::str::FromStr>(
    header: &BTreeMap<String, String>,
    field: &str,
) -> crate::Result<T> {
    required(header, field)?
        .trim()
        .parse()
        .map_err(|_| QaError::MissingIdentity {
            field: field.to_string(),
        })
}

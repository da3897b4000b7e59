//! Normalized QA data model for multi-camera spectrograph exposures.
//!
//! This crate holds the in-memory tables that per-exposure QA is built on:
//! exposure identity resolved from header fields, per-unit processing status,
//! per-fiber and per-amplifier metric tables, and the static focal-plane
//! layout. Everything here is constructed once per exposure from
//! already-materialized inputs and is read-only afterward; no file or network
//! I/O happens in this crate.

pub mod camera;
pub mod identity;
pub mod layout;
pub mod spectra;
pub mod status;
pub mod table;

use thiserror::Error;

/// Error types for QA model construction and access.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QaError {
    /// A required exposure header field is absent or unparsable. Fatal to the
    /// whole exposure, since night/expid anchor every row downstream.
    #[error("missing or invalid header field {field:?}")]
    MissingIdentity { field: String },

    /// A per-unit token does not match the expected camera/spectrograph
    /// encoding. Fatal to that unit's row only.
    #[error("malformed unit identifier {token:?}")]
    MalformedIdentifier { token: String },

    /// A requested metric is not a column of the table.
    #[error("unknown metric {metric:?}")]
    UnknownMetric { metric: String },

    /// An operation was applied to the wrong table variant.
    #[error("expected a {expected:?} table, got {found:?}")]
    WrongTableKind {
        expected: table::TableKind,
        found: table::TableKind,
    },
}

/// Standard Result type for QA model operations.
pub type Result<T> = std::result::Result<T, QaError>;

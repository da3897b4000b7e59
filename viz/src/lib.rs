//! Focal-plane QA visualization for multi-camera spectrograph exposures.
//!
//! Builds renderable layers from the normalized tables in the `qa` crate:
//! a metric projected onto the focal plane per camera with outlier-resistant
//! color scaling, companion histograms, linked multi-camera grids, and
//! flavor-driven summary bundles. Layers are plain data plus an SVG
//! rendering, so an external page-templating collaborator can embed them
//! without this crate knowing anything about HTML.

pub mod amp;
pub mod compose;
pub mod focalplane;
pub mod histogram;
pub mod palette;
pub mod scale;
pub mod summary;

use thiserror::Error;

/// Error types for visualization operations.
#[derive(Debug, Error)]
pub enum VizError {
    /// Model-side failure: unknown metric, wrong table variant.
    #[error(transparent)]
    Model(#[from] qa::QaError),

    /// Backend failure while drawing a layer.
    #[error("rendering failed: {0}")]
    Render(String),
}

/// Standard Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VizError>;

/// Maps any drawing-backend error into [`VizError::Render`].
pub(crate) fn render_err<E: std::fmt::Display>(err: E) -> VizError {
    VizError::Render(err.to_string())
}

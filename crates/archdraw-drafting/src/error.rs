//! Error types for drawing generation.

use thiserror::Error;

/// Configuration errors rejected before any geometry is processed.
///
/// Degenerate geometry never produces an error; it is reported through
/// [`Diagnostic`](crate::types::Diagnostic) entries on the returned view.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DraftingError {
    /// Section view requested without a cutting plane.
    #[error("section view requires a section plane")]
    MissingSectionPlane,

    /// Section plane with a zero or non-finite normal.
    #[error("invalid section plane: {0}")]
    InvalidSectionPlane(String),

    /// Direction name that does not denote a cardinal elevation.
    #[error("unknown cardinal direction: {0:?}")]
    UnknownDirection(String),

    /// View direction that cannot define a basis.
    #[error("invalid view direction: {0}")]
    InvalidViewDirection(String),

    /// Request parameters out of range.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for drafting operations.
pub type Result<T> = std::result::Result<T, DraftingError>;

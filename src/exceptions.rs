//! ## Custom Errors for the EV Dashboard
//!
//! This module defines the error type shared by every layer of the dashboard.
//! It uses the `thiserror` crate to derive the `Error` trait.
//!
//! Loading a dataset can fail in exactly two ways that matter to the user:
//! the file is not there (`FileNotFound`), or anything else went wrong while reading,
//! parsing, or aggregating it (`LoadError`). Errors raised by DataFusion and Arrow are
//! folded into `LoadError` so callers only ever have to tell those two cases apart.
//!
//! The `DashboardResult` type alias simplifies error handling by providing a convenient
//! alias for results returned by the library.
//!
//! ### Example
//!
//! ```rust
//! use ev_dashboard::exceptions::{DashboardError, DashboardResult};
//!
//! fn check_top_n(n: usize) -> DashboardResult<usize> {
//!     if n == 0 {
//!         return Err(DashboardError::InvalidParameter("top_n must be positive".into()));
//!     }
//!     Ok(n)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors specific to the EV dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The input path does not resolve to a readable file.
    #[error("The file '{}' was not found. Please ensure it is in the correct directory.", .0.display())]
    FileNotFound(PathBuf),

    /// Any other failure while reading, parsing, or aggregating the dataset.
    #[error("An error occurred during file loading: {0}")]
    LoadError(String),

    /// Indicates that an invalid parameter was provided (e.g., a top-N of zero).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Wraps socket errors raised by the HTTP server.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// Returns true for the `FileNotFound` kind.
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, DashboardError::FileNotFound(_))
    }

    /// Returns true for the `LoadError` kind.
    pub fn is_load_error(&self) -> bool {
        matches!(self, DashboardError::LoadError(_))
    }
}

impl From<datafusion::error::DataFusionError> for DashboardError {
    fn from(err: datafusion::error::DataFusionError) -> Self {
        DashboardError::LoadError(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for DashboardError {
    fn from(err: arrow::error::ArrowError) -> Self {
        DashboardError::LoadError(err.to_string())
    }
}

/// A type alias for results returned by dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;

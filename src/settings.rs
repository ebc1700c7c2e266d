//! ## Dashboard Settings
//!
//! Fixed values the dashboard runs with. The binary always uses [`DashboardConfig::default`];
//! library callers (and the tests) may build their own configuration.

use crate::exceptions::{DashboardError, DashboardResult};
use std::path::PathBuf;
use std::time::Duration;

/// Hard-coded location of the dataset, relative to the working directory.
pub const DATA_PATH: &str = "EV Population Dataset.csv";

/// Number of (Make, Model Year) groups shown in the counts table.
pub const DEFAULT_TOP_N: usize = 10;

/// Address the HTTP server listens on.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";

/// How long a client may take to send its request before the connection is dropped.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime configuration for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub top_n: usize,
    pub bind_addr: String,
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DATA_PATH),
            top_n: DEFAULT_TOP_N,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl DashboardConfig {
    /// Checks that the configuration can actually be served.
    pub fn validate(&self) -> DashboardResult<()> {
        if self.top_n == 0 {
            return Err(DashboardError::InvalidParameter(
                "top_n must be greater than zero".to_string(),
            ));
        }
        if self.bind_addr.trim().is_empty() {
            return Err(DashboardError::InvalidParameter(
                "bind address cannot be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(DashboardError::InvalidParameter(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// File name shown in the page caption.
    pub fn source_name(&self) -> String {
        self.data_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.data_path.display().to_string())
    }
}

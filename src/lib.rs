//! # EV Dashboard
//!
//! A single-page dashboard over an electric vehicle registrations CSV, powered by Apache DataFusion.
//!
//! The dataset is aggregated into two tables:
//!
//! - the top (Make, Model Year) pairs by number of registered vehicles, and
//! - the average electric range of each vehicle type.
//!
//! Both are rendered as HTML tables and interactive bar charts and served over HTTP.
//!
//! ```rust,no_run
//! use ev_dashboard::analysis::load_and_analyze;
//! use std::path::Path;
//!
//! # async fn run() -> ev_dashboard::exceptions::DashboardResult<()> {
//! let summary = load_and_analyze(Path::new("EV Population Dataset.csv"), 10).await?;
//! for row in &summary.top_counts {
//!     println!("{}: {}", row.label(), row.total_evs);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cache;
pub mod dashboard;
pub mod dataset;
pub mod exceptions;
pub mod logging;
pub mod server;
pub mod settings;

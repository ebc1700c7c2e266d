//! ## Memoized analysis results
//!
//! The dashboard recomputes nothing between page loads: the first successful analysis of a
//! path is kept for the life of the process and handed out on every later request.
//!
//! - The cache starts empty and grows by one entry per distinct path that loads successfully.
//! - Failed loads are not stored, so the next request tries again.
//! - Entries are never invalidated.
//!
//! Where the summaries come from is abstracted by the [`SummarySource`] trait, so the cache
//! can be exercised without touching the file system.

use crate::analysis::{self, EvSummary};
use crate::exceptions::DashboardResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Something that can produce an [`EvSummary`] for a dataset path.
#[async_trait]
pub trait SummarySource {
    async fn load(&self, path: &Path) -> DashboardResult<EvSummary>;
}

/// Reads the CSV from disk and aggregates it with DataFusion.
#[derive(Debug, Clone)]
pub struct CsvSummarySource {
    pub top_n: usize,
}

impl CsvSummarySource {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }
}

#[async_trait]
impl SummarySource for CsvSummarySource {
    async fn load(&self, path: &Path) -> DashboardResult<EvSummary> {
        analysis::load_and_analyze(path, self.top_n).await
    }
}

/// Process-wide store of summaries keyed by dataset path.
pub struct AnalysisCache<S> {
    source: S,
    entries: RwLock<HashMap<PathBuf, Arc<EvSummary>>>,
}

impl<S: SummarySource + Send + Sync> AnalysisCache<S> {
    /// Creates an empty cache backed by `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the summary for `path`, loading it on the first call.
    pub async fn get_or_load(&self, path: &Path) -> DashboardResult<Arc<EvSummary>> {
        if let Some(summary) = self.get(path) {
            debug!("Cache hit for {}", path.display());
            return Ok(summary);
        }

        debug!("Cache miss for {}, loading", path.display());
        let summary = match self.source.load(path).await {
            Ok(summary) => Arc::new(summary),
            Err(e) => {
                warn!("Loading {} failed: {}", path.display(), e);
                return Err(e);
            }
        };

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let stored = entries
            .entry(path.to_path_buf())
            .or_insert_with(|| summary.clone());
        Ok(stored.clone())
    }

    /// Returns the cached summary for `path` without loading.
    pub fn get(&self, path: &Path) -> Option<Arc<EvSummary>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(path).cloned()
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

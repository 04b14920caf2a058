//! Per-cycle scan outcome types.

use chrono::{DateTime, Utc};
use posterwall_common::EntryId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::library::MediaEntry;

/// A non-fatal problem encountered during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanError {
    pub path: PathBuf,
    pub reason: String,
}

impl ScanError {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Everything one scan cycle changed. Produced once per cycle, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Index cycle number; 0 when the cycle never started.
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub added: Vec<MediaEntry>,
    pub updated: Vec<MediaEntry>,
    pub removed: Vec<EntryId>,
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    pub(crate) fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            cycle: 0,
            started_at,
            finished_at: started_at,
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// True when the cycle changed nothing and hit no errors.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.updated.is_empty()
            && self.removed.is_empty()
            && self.errors.is_empty()
    }

    pub fn summary(&self, failed: Option<String>) -> ScanSummary {
        ScanSummary {
            cycle: self.cycle,
            started_at: self.started_at,
            finished_at: self.finished_at,
            added: self.added.len(),
            updated: self.updated.len(),
            removed: self.removed.len(),
            errors: self.errors.clone(),
            failed,
        }
    }
}

/// Compact form of a [`ScanResult`] kept for status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub errors: Vec<ScanError>,
    /// Set when the cycle was abandoned.
    pub failed: Option<String>,
}

//! The library record for one media file.

use chrono::{DateTime, Utc};
use posterwall_common::{EntryId, MediaKind, ResolutionState};
use posterwall_parser::MediaGuess;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::metadata::{Resolution, ResolvedMetadata};

/// One movie, episode or unclassified file in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub id: EntryId,
    pub kind: MediaKind,
    /// Title as parsed from the path (series title for episodes).
    pub title: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    /// Title as the catalog spells it, once resolved.
    #[serde(default)]
    pub canonical_title: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    pub source_path: PathBuf,
    #[serde(default)]
    pub file_size: u64,
    pub file_modified_at: DateTime<Utc>,
    pub last_scanned_at: DateTime<Utc>,
    #[serde(default)]
    pub last_resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolution_state: ResolutionState,
    /// Scan cycle that found the backing file missing.
    #[serde(default)]
    pub tombstoned_at: Option<u64>,
}

impl MediaEntry {
    /// Fresh, unresolved entry for a classified file.
    pub fn from_guess(
        guess: &MediaGuess,
        source_path: PathBuf,
        file_size: u64,
        file_modified_at: DateTime<Utc>,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: guess.entry_id(),
            kind: guess.kind,
            title: guess.title.clone(),
            year: guess.year,
            season: guess.season,
            episode: guess.episode,
            canonical_title: None,
            external_id: None,
            poster_url: None,
            synopsis: None,
            source_path,
            file_size,
            file_modified_at,
            last_scanned_at: scanned_at,
            last_resolved_at: None,
            resolution_state: ResolutionState::Unresolved,
            tombstoned_at: None,
        }
    }

    /// Title to show: the catalog's when known, else the parsed one.
    pub fn display_title(&self) -> &str {
        self.canonical_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }

    pub fn is_tombstoned(&self) -> bool {
        self.tombstoned_at.is_some()
    }

    /// Record a terminal resolver outcome.
    pub fn apply_resolution(&mut self, resolution: Resolution, now: DateTime<Utc>) {
        self.last_resolved_at = Some(now);
        match resolution {
            Resolution::Resolved(ResolvedMetadata {
                canonical_title,
                year: _,
                poster_url,
                synopsis,
                external_id,
            }) => {
                self.resolution_state = ResolutionState::Resolved;
                self.canonical_title = Some(canonical_title);
                self.external_id = Some(external_id);
                self.poster_url = poster_url;
                self.synopsis = synopsis;
            }
            Resolution::NotFound => {
                self.resolution_state = ResolutionState::NotFound;
            }
        }
    }

    /// Record that transient failures exhausted the retry budget.
    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        self.resolution_state = ResolutionState::Failed;
        self.last_resolved_at = Some(now);
    }

    /// Sort key for listings: case-folded title, then year, season, episode.
    pub(crate) fn sort_key(&self) -> (String, Option<u16>, Option<u32>, Option<u32>) {
        (
            self.display_title().to_lowercase(),
            self.year,
            self.season,
            self.episode,
        )
    }
}

//! Typed, identity-derived IDs for library entries.
//!
//! An [`EntryId`] is a UUID v5 computed from an entry's identity fields, so the
//! same movie or episode always maps to the same ID no matter how many times
//! (or in which order) the share is scanned.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for entry identity UUIDs.
const ENTRY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b3e_94d7_4c1a_8e55_0b7a_3d2f_91c4);

/// Stable identifier for a library entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// ID for a movie, keyed by title and release year.
    #[must_use]
    pub fn for_movie(title: &str, year: Option<u16>) -> Self {
        Self::from_key(&format!(
            "movie|{}|{}",
            normalize_title(title),
            year.map(|y| y.to_string()).unwrap_or_default()
        ))
    }

    /// ID for an episode, keyed by series title, season, and episode number.
    #[must_use]
    pub fn for_episode(series_title: &str, season: u32, episode: u32) -> Self {
        Self::from_key(&format!(
            "episode|{}|{}|{}",
            normalize_title(series_title),
            season,
            episode
        ))
    }

    /// ID for a file that could not be classified.
    #[must_use]
    pub fn for_unknown(title: &str, year: Option<u16>) -> Self {
        Self::from_key(&format!(
            "unknown|{}|{}",
            normalize_title(title),
            year.map(|y| y.to_string()).unwrap_or_default()
        ))
    }

    fn from_key(key: &str) -> Self {
        Self(Uuid::new_v5(&ENTRY_NAMESPACE, key.as_bytes()))
    }

    /// Parse an ID from its hyphenated string form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl From<Uuid> for EntryId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<EntryId> for Uuid {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase a title and collapse runs of whitespace.
///
/// Used for identity keys and catalog matching, never for display.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

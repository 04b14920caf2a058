//! Core type definitions for library entries.
//!
//! All enums are serialized in lowercase/snake_case so the persisted index and
//! the HTTP API share one spelling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a media file was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A single movie.
    Movie,
    /// A single episode of a series.
    Episode,
    /// A file the classifier could not place.
    Unknown,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Episode => write!(f, "episode"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    /// Accepts singular and plural forms (`movie`/`movies`, `episode`/`episodes`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(Self::Movie),
            "episode" | "episodes" | "tv" => Ok(Self::Episode),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown media kind: {other}")),
        }
    }
}

/// Where an entry is in the metadata resolution lifecycle.
///
/// Transitions only go from `Unresolved` to one of the terminal states.
/// `Failed` entries are retried on the next scan; `Resolved` and `NotFound`
/// are only retried on a forced scan or when the backing file changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    /// Not yet looked up in the catalog.
    #[default]
    Unresolved,
    /// Metadata was found and attached.
    Resolved,
    /// The catalog has no match (or the guess was too weak to ask).
    NotFound,
    /// Transient catalog failures exhausted the retry budget.
    Failed,
}

impl ResolutionState {
    /// Whether the resolver has reached a final answer for this entry.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    /// Whether the next scan should look this entry up again.
    pub fn needs_resolution(self) -> bool {
        matches!(self, Self::Unresolved | Self::Failed)
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::Resolved => write!(f, "resolved"),
            Self::NotFound => write!(f, "not_found"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

//! The structured result of classifying a media file path.

use posterwall_common::{EntryId, MediaKind};

/// Confidence for an `S01E02`/`1x02` episode match.
pub const EPISODE_CONFIDENCE: f64 = 0.9;
/// Confidence for a `Title.2021` movie match on the filename.
pub const MOVIE_CONFIDENCE: f64 = 0.8;
/// Confidence for a movie match taken from the parent folder name.
pub const FOLDER_MOVIE_CONFIDENCE: f64 = 0.7;
/// Confidence for an episode marker without any recoverable series title.
pub const UNTITLED_EPISODE_CONFIDENCE: f64 = 0.3;
/// Confidence for anything the classifier could not place.
pub const UNKNOWN_CONFIDENCE: f64 = 0.2;

/// A best-effort interpretation of a media file's path and name.
///
/// Produced by [`classify`](crate::classify); immutable once produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaGuess {
    /// Directory portion the file was found under, relative to the library root.
    pub raw_path: String,
    /// The filename exactly as listed, extension included.
    pub raw_filename: String,
    /// Movie, episode, or unknown.
    pub kind: MediaKind,
    /// Movie title or series title, original case preserved.
    pub title: String,
    /// Release year (movies) or series year when one was present.
    pub year: Option<u16>,
    /// Season number for episodes.
    pub season: Option<u32>,
    /// Episode number for episodes.
    pub episode: Option<u32>,
    /// How much to trust this guess, 0.0 - 1.0.
    pub confidence: f64,
}

impl MediaGuess {
    /// The stable library identity this guess maps to.
    pub fn entry_id(&self) -> EntryId {
        match (self.kind, self.season, self.episode) {
            (MediaKind::Episode, Some(season), Some(episode)) => {
                EntryId::for_episode(&self.title, season, episode)
            }
            (MediaKind::Movie, _, _) => EntryId::for_movie(&self.title, self.year),
            _ => EntryId::for_unknown(&self.title, self.year),
        }
    }
}

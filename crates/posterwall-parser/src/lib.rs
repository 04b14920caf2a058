//! # posterwall-parser
//!
//! Classifies media files into movies, episodes, or unknowns from their
//! relative path and filename, and derives the title, year, season and
//! episode a metadata catalog can be searched with.
//!
//! ## Quick Start
//!
//! ```
//! use posterwall_common::MediaKind;
//! use posterwall_parser::classify;
//!
//! let guess = classify("", "Show.Name.S01E02.1080p.mkv");
//! assert_eq!(guess.kind, MediaKind::Episode);
//! assert_eq!(guess.title, "Show Name");
//! assert_eq!((guess.season, guess.episode), (Some(1), Some(2)));
//!
//! let guess = classify("", "Movie Title (2021).mp4");
//! assert_eq!(guess.kind, MediaKind::Movie);
//! assert_eq!(guess.title, "Movie Title");
//! assert_eq!(guess.year, Some(2021));
//! ```

mod classifier;
mod guess;
pub mod lexer;
mod title;

pub use guess::{
    MediaGuess, EPISODE_CONFIDENCE, FOLDER_MOVIE_CONFIDENCE, MOVIE_CONFIDENCE,
    UNKNOWN_CONFIDENCE, UNTITLED_EPISODE_CONFIDENCE,
};

/// Classify a file from its directory (relative to the library root) and name.
///
/// Pure and deterministic: the same inputs always produce the same guess.
/// Files that match no pattern are not an error; they come back as
/// [`MediaKind::Unknown`](posterwall_common::MediaKind::Unknown) with low
/// confidence.
///
/// # Examples
///
/// ```
/// use posterwall_common::MediaKind;
/// use posterwall_parser::classify;
///
/// let guess = classify("Breaking Bad/Season 1", "S01E01.mkv");
/// assert_eq!(guess.kind, MediaKind::Episode);
/// assert_eq!(guess.title, "Breaking Bad");
/// ```
pub fn classify(relative_path: &str, filename: &str) -> MediaGuess {
    classifier::classify(relative_path, filename)
}

/// Classifier handle for callers that hold their collaborators as fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathClassifier;

impl PathClassifier {
    /// Create a new classifier.
    pub fn new() -> Self {
        Self
    }

    /// See [`classify`].
    pub fn classify(&self, relative_path: &str, filename: &str) -> MediaGuess {
        classifier::classify(relative_path, filename)
    }
}

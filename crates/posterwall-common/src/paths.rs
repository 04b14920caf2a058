//! Path utilities for detecting media files by extension.
//!
//! The scanner uses these to decide which files on the share are worth
//! classifying; the classifier uses them to strip known extensions.

use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv", "mpg", "mpeg", "iso",
];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use posterwall_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.mkv")));
/// assert!(is_video_file(Path::new("/path/to/video.MP4")));
/// assert!(!is_video_file(Path::new("subtitle.srt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Strip a known video extension from a filename, if present.
///
/// Unknown extensions are left alone so that dotted release names like
/// `Show.Name.S01E02` are not truncated at their last dot.
///
/// # Examples
///
/// ```
/// use posterwall_common::paths::strip_video_extension;
///
/// assert_eq!(strip_video_extension("Movie.Title.2021.mkv"), "Movie.Title.2021");
/// assert_eq!(strip_video_extension("Show.Name.S01E02"), "Show.Name.S01E02");
/// ```
#[must_use]
pub fn strip_video_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => stem,
        _ => filename,
    }
}

/// Get the list of video file extensions.
///
/// # Examples
///
/// ```
/// use posterwall_common::paths::video_extensions;
///
/// let extensions = video_extensions();
/// assert!(extensions.contains(&"mkv"));
/// assert!(extensions.contains(&"mp4"));
/// ```
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("movie.mkv")));
        assert!(is_video_file(Path::new("movie.MKV")));
        assert!(is_video_file(Path::new("/share/tv/show/ep.avi")));
        assert!(!is_video_file(Path::new("poster.jpg")));
        assert!(!is_video_file(Path::new("notes.txt")));
    }

    #[test]
    fn test_strip_video_extension() {
        assert_eq!(strip_video_extension("a.mp4"), "a");
        assert_eq!(strip_video_extension("a.MKV"), "a");
        assert_eq!(strip_video_extension("a.srt"), "a.srt");
        assert_eq!(strip_video_extension("noext"), "noext");
    }

    #[test]
    fn test_edge_cases() {
        assert!(!is_video_file(Path::new("")));
        assert!(!is_video_file(Path::new("mkv")));
        assert!(!is_video_file(Path::new(".mkv")));
        assert_eq!(strip_video_extension(".mkv"), "");
    }
}

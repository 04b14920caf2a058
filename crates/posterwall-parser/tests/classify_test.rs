//! Fixture and property tests for path classification.
//!
//! Fixtures live in `tests/fixtures/paths.json`; each case names only the
//! fields it cares about.

use posterwall_common::MediaKind;
use posterwall_parser::{classify, MediaGuess, PathClassifier, UNKNOWN_CONFIDENCE};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TestCase {
    path: String,
    filename: String,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    kind: MediaKind,
    title: Option<String>,
    year: Option<u16>,
    season: Option<u32>,
    episode: Option<u32>,
    confidence: Option<f64>,
}

fn load_fixtures() -> Vec<TestCase> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/paths.json");
    let content = fs::read_to_string(&path).expect("fixture file should exist");
    serde_json::from_str(&content).expect("fixture file should parse")
}

fn check(case: &TestCase, guess: &MediaGuess) -> Vec<String> {
    let mut failures = Vec::new();
    let exp = &case.expected;

    if guess.kind != exp.kind {
        failures.push(format!("kind: expected {}, got {}", exp.kind, guess.kind));
    }
    if let Some(title) = &exp.title {
        if &guess.title != title {
            failures.push(format!("title: expected {title:?}, got {:?}", guess.title));
        }
    }
    if exp.year.is_some() && guess.year != exp.year {
        failures.push(format!("year: expected {:?}, got {:?}", exp.year, guess.year));
    }
    if exp.season.is_some() && guess.season != exp.season {
        failures.push(format!("season: expected {:?}, got {:?}", exp.season, guess.season));
    }
    if exp.episode.is_some() && guess.episode != exp.episode {
        failures.push(format!(
            "episode: expected {:?}, got {:?}",
            exp.episode, guess.episode
        ));
    }
    if let Some(confidence) = exp.confidence {
        if (guess.confidence - confidence).abs() > f64::EPSILON {
            failures.push(format!(
                "confidence: expected {confidence}, got {}",
                guess.confidence
            ));
        }
    }
    failures
}

#[test]
fn test_all_fixtures() {
    let cases = load_fixtures();
    assert!(!cases.is_empty());

    let mut report = Vec::new();
    for case in &cases {
        let guess = classify(&case.path, &case.filename);
        for failure in check(case, &guess) {
            report.push(format!("{}/{}: {failure}", case.path, case.filename));
        }
    }

    assert!(
        report.is_empty(),
        "{} fixture mismatches:\n{}",
        report.len(),
        report.join("\n")
    );
}

#[test]
fn test_classification_is_deterministic() {
    let classifier = PathClassifier::new();
    for case in load_fixtures() {
        let a = classifier.classify(&case.path, &case.filename);
        let b = classifier.classify(&case.path, &case.filename);
        assert_eq!(a, b);
        assert_eq!(a.entry_id(), b.entry_id());
    }
}

#[test]
fn test_case_insensitive_markers_keep_title_case() {
    let upper = classify("", "Show.Name.S01E02.mkv");
    let lower = classify("", "Show.Name.s01e02.mkv");
    assert_eq!(upper.title, "Show Name");
    assert_eq!(lower.title, "Show Name");
    assert_eq!(upper.entry_id(), lower.entry_id());
}

#[test]
fn test_same_episode_different_release_shares_identity() {
    let a = classify("Show Name/Season 1", "Show.Name.S01E02.720p.HDTV.mkv");
    let b = classify("", "show name - S01E02 - Pilot [1080p].mp4");
    assert_eq!(a.kind, MediaKind::Episode);
    assert_eq!(a.entry_id(), b.entry_id());
}

#[test]
fn test_last_year_before_quality_tag_wins() {
    let guess = classify("", "2001.A.Space.Odyssey.1968.1080p.mkv");
    assert_eq!(guess.kind, MediaKind::Movie);
    assert_eq!(guess.title, "2001 A Space Odyssey");
    assert_eq!(guess.year, Some(1968));
}

#[test]
fn test_year_after_quality_tag_is_ignored() {
    let guess = classify("", "Some.Title.1080p.2020.mkv");
    assert_eq!(guess.kind, MediaKind::Unknown);
    assert_eq!(guess.title, "Some Title");
}

#[test]
fn test_non_video_extension_is_kept_in_stem() {
    let guess = classify("", "notes.txt");
    assert_eq!(guess.kind, MediaKind::Unknown);
    assert_eq!(guess.title, "notes.txt".replace('.', " "));
    assert_eq!(guess.confidence, UNKNOWN_CONFIDENCE);
}

#[test]
fn test_empty_filename() {
    let guess = classify("", "");
    assert_eq!(guess.kind, MediaKind::Unknown);
    assert!(guess.title.is_empty());
}

#[test]
fn test_tag_words_at_title_start_stay_in_title() {
    let guess = classify("", "Extended.Family.2019.EXTENDED.720p.mkv");
    assert_eq!(guess.kind, MediaKind::Movie);
    assert_eq!(guess.title, "Extended Family");
    assert_eq!(guess.year, Some(2019));

    let guess = classify("", "Internal.Affairs.S01E03.INTERNAL.mkv");
    assert_eq!(guess.kind, MediaKind::Episode);
    assert_eq!(guess.title, "Internal Affairs");
}

//! Path classification.
//!
//! Turns a relative directory plus a filename into a [`MediaGuess`]:
//!
//! 1. Episode marker (`S01E02`, `1x02`) in the filename → episode. The series
//!    title is the text in front of the marker, or the nearest non-season
//!    ancestor folder when the filename starts with the marker.
//! 2. A year (1900-2099) before any quality tag → movie. With several
//!    candidates the last one wins, as long as a title precedes it.
//! 3. A movie-shaped parent folder (`Movie Title (2021)/`) → movie.
//! 4. Anything else → unknown, with the cleaned stem as title.

use posterwall_common::paths::strip_video_extension;
use posterwall_common::MediaKind;

use crate::guess::{
    MediaGuess, EPISODE_CONFIDENCE, FOLDER_MOVIE_CONFIDENCE, MOVIE_CONFIDENCE,
    UNKNOWN_CONFIDENCE, UNTITLED_EPISODE_CONFIDENCE,
};
use crate::lexer::{find_bracket_groups, BracketGroup, Lexer, Token};
use crate::title::{clean_title, split_trailing_year};

struct EpisodeMatch {
    title: String,
    year: Option<u16>,
    season: u32,
    episode: u32,
}

struct MovieMatch {
    title: String,
    year: u16,
}

/// Classify a file. Pure and deterministic; performs no I/O.
pub(crate) fn classify(relative_path: &str, filename: &str) -> MediaGuess {
    let stem = strip_video_extension(filename);
    let lexer = Lexer::new(stem);
    let groups = find_bracket_groups(stem);

    let mut guess = MediaGuess {
        raw_path: relative_path.to_string(),
        raw_filename: filename.to_string(),
        kind: MediaKind::Unknown,
        title: String::new(),
        year: None,
        season: None,
        episode: None,
        confidence: UNKNOWN_CONFIDENCE,
    };

    if let Some(ep) = match_episode(&lexer, &groups) {
        guess.kind = MediaKind::Episode;
        guess.season = Some(ep.season);
        guess.episode = Some(ep.episode);
        guess.year = ep.year;
        guess.confidence = EPISODE_CONFIDENCE;
        guess.title = ep.title;

        if guess.title.is_empty() {
            if let Some((title, year)) = series_from_path(relative_path) {
                guess.title = title;
                guess.year = guess.year.or(year);
            } else {
                guess.title = unknown_title(&lexer, &groups);
                guess.confidence = UNTITLED_EPISODE_CONFIDENCE;
            }
        }
        return guess;
    }

    if let Some(movie) = match_movie(&lexer, &groups) {
        guess.kind = MediaKind::Movie;
        guess.title = movie.title;
        guess.year = Some(movie.year);
        guess.confidence = MOVIE_CONFIDENCE;
        return guess;
    }

    if let Some(folder) = path_components(relative_path).last() {
        let folder_lexer = Lexer::new(folder);
        let folder_groups = find_bracket_groups(folder);
        if let Some(movie) = match_movie(&folder_lexer, &folder_groups) {
            guess.kind = MediaKind::Movie;
            guess.title = movie.title;
            guess.year = Some(movie.year);
            guess.confidence = FOLDER_MOVIE_CONFIDENCE;
            return guess;
        }
    }

    guess.title = unknown_title(&lexer, &groups);
    guess
}

fn match_episode(lexer: &Lexer<'_>, groups: &[BracketGroup]) -> Option<EpisodeMatch> {
    let (season, episode, marker_start) = lexer.tokens().iter().find_map(|(token, span)| {
        let parsed = match token {
            Token::SeasonEpisode(text) => parse_season_episode(text),
            Token::SeasonEpisodeX(text) => parse_season_x(text),
            _ => None,
        };
        parsed.map(|(s, e)| (s, e, span.start))
    })?;

    let (title_end, year) = split_trailing_year(lexer, groups, marker_start);
    Some(EpisodeMatch {
        title: clean_title(lexer, groups, 0..title_end),
        year,
        season,
        episode,
    })
}

fn match_movie(lexer: &Lexer<'_>, groups: &[BracketGroup]) -> Option<MovieMatch> {
    let limit = lexer.first_quality_index();

    lexer.tokens()[..limit]
        .iter()
        .rev()
        .find_map(|(token, span)| match token {
            Token::Year(text) => {
                let title = clean_title(lexer, groups, 0..span.start);
                let year = text.parse::<u16>().ok()?;
                (!title.is_empty()).then_some(MovieMatch { title, year })
            }
            _ => None,
        })
}

/// Title for a file that matched nothing: the text before the first quality
/// tag, falling back to the whole cleaned stem, then the raw stem.
fn unknown_title(lexer: &Lexer<'_>, groups: &[BracketGroup]) -> String {
    let input = lexer.input();
    let limit = lexer.first_quality_index();
    let end = lexer
        .tokens()
        .get(limit)
        .map(|(_, span)| span.start)
        .unwrap_or(input.len());

    let title = clean_title(lexer, groups, 0..end);
    if !title.is_empty() {
        return title;
    }
    let title = clean_title(lexer, groups, 0..input.len());
    if !title.is_empty() {
        return title;
    }
    input.trim().to_string()
}

/// `S01E02`, `s1e2`, `S01EP03`, `S01E01E02` (first episode), `S01E12v2`.
fn parse_season_episode(text: &str) -> Option<(u32, u32)> {
    let lower = text.to_ascii_lowercase();
    let rest = lower.strip_prefix('s')?;
    let (season, rest) = rest.split_once('e')?;
    let rest = rest.strip_prefix('p').unwrap_or(rest);
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    Some((season.parse().ok()?, rest[..digits].parse().ok()?))
}

/// `1x02`, `01x102`.
fn parse_season_x(text: &str) -> Option<(u32, u32)> {
    let (season, episode) = text.split_once(['x', 'X'])?;
    Some((season.parse().ok()?, episode.parse().ok()?))
}

fn path_components(relative_path: &str) -> impl DoubleEndedIterator<Item = &str> {
    relative_path
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ".")
}

/// Series title and year from the nearest ancestor that is not a season folder.
fn series_from_path(relative_path: &str) -> Option<(String, Option<u16>)> {
    let folder = path_components(relative_path)
        .rev()
        .find(|c| !is_season_folder(c))?;

    let lexer = Lexer::new(folder);
    let groups = find_bracket_groups(folder);
    let (end, year) = split_trailing_year(&lexer, &groups, folder.len());
    let title = clean_title(&lexer, &groups, 0..end);
    (!title.is_empty()).then_some((title, year))
}

/// `Season 1`, `Season.01`, `S01`, `Specials`, `Extras`.
fn is_season_folder(name: &str) -> bool {
    let lower = name.trim().to_ascii_lowercase();
    if matches!(lower.as_str(), "specials" | "extras") {
        return true;
    }

    let rest = lower
        .strip_prefix("season")
        .or_else(|| lower.strip_prefix('s'))
        .map(|r| r.trim_start_matches([' ', '.', '_', '-']));

    matches!(rest, Some(r) if !r.is_empty() && r.chars().all(|c| c.is_ascii_digit()))
}

//! Title text reconstruction.
//!
//! Titles are rebuilt from the original input rather than from tokens, so
//! characters the lexer does not know about (accents, `!`, `,`) are kept.

use std::ops::Range;

use crate::lexer::{BracketGroup, Lexer, Span, Token};

/// Clean the byte range `range` of the lexer input into display title text.
///
/// Bracketed segments and quality tags overlapping the range are dropped,
/// separators and stray brackets become spaces, and whitespace is collapsed.
pub fn clean_title(lexer: &Lexer<'_>, groups: &[BracketGroup], range: Range<usize>) -> String {
    let input = lexer.input();
    let end = range.end.min(input.len());
    let start = range.start.min(end);
    let region = Span::new(start, end);

    let mut excluded: Vec<Span> = groups
        .iter()
        .map(|g| g.outer_span)
        .filter(|s| s.overlaps(&region))
        .collect();
    excluded.extend(
        lexer
            .tokens()
            .iter()
            .enumerate()
            .filter(|(i, (_, s))| lexer.is_quality_at(*i) && s.overlaps(&region))
            .map(|(_, (_, s))| *s),
    );

    let mut out = String::with_capacity(end - start);
    for (i, ch) in input[start..end].char_indices() {
        if excluded.iter().any(|s| s.contains(start + i)) {
            out.push(' ');
            continue;
        }
        match ch {
            '.' | '_' | '-' | '(' | ')' | '[' | ']' | '{' | '}' => out.push(' '),
            c => out.push(c),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a trailing year off a title region ending at `end`.
///
/// Returns the new end of the title region and the year when the last content
/// token before `end` is a year with non-empty title text in front of it.
pub fn split_trailing_year(
    lexer: &Lexer<'_>,
    groups: &[BracketGroup],
    end: usize,
) -> (usize, Option<u16>) {
    let last = lexer
        .tokens()
        .iter()
        .filter(|(t, s)| s.end <= end && !t.is_punctuation())
        .last();

    if let Some((Token::Year(text), span)) = last {
        if !clean_title(lexer, groups, 0..span.start).is_empty() {
            if let Ok(year) = text.parse::<u16>() {
                return (span.start, Some(year));
            }
        }
    }
    (end, None)
}

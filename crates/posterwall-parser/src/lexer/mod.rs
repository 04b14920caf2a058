//! Logos-based lexer for media filenames.
//!
//! This module provides tokenization using the [logos](https://docs.rs/logos) crate,
//! which generates a fast lexer from regex patterns at compile time. Characters no
//! token matches (accents, punctuation like `!` or `,`) are simply skipped by the
//! lexer; title text is always rebuilt from the original input, so they survive.

mod token;
pub use token::Token;

use logos::Logos;
use std::ops::Range;

/// Byte span in the input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Check if this span overlaps with another.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if a byte offset falls inside this span.
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// A detected bracket group in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketGroup {
    /// The span of the entire bracket group including brackets.
    pub outer_span: Span,
    /// The span of the content inside the brackets.
    pub inner_span: Span,
    /// The opening bracket character (`[`, `(` or `{`).
    pub bracket_char: char,
}

/// Find all bracket groups in the input.
///
/// Returns groups for `[...]`, `(...)` and `{...}`. Unbalanced brackets are
/// ignored.
pub fn find_bracket_groups(input: &str) -> Vec<BracketGroup> {
    let mut groups = Vec::new();
    let mut stack: Vec<(usize, char)> = Vec::new();

    for (i, ch) in input.char_indices() {
        let open = match ch {
            '[' | '(' | '{' => {
                stack.push((i, ch));
                continue;
            }
            ']' => '[',
            ')' => '(',
            '}' => '{',
            _ => continue,
        };

        if let Some(pos) = stack.iter().rposition(|(_, c)| *c == open) {
            let (start, _) = stack[pos];
            stack.truncate(pos);
            groups.push(BracketGroup {
                outer_span: Span::new(start, i + 1),
                inner_span: Span::new(start + 1, i),
                bracket_char: open,
            });
        }
    }

    groups
}

/// A lexer that tokenizes filenames using Logos.
pub struct Lexer<'src> {
    tokens: Vec<(Token<'src>, Span)>,
    quality: Vec<bool>,
    input: &'src str,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given input.
    ///
    /// Tokenizes the entire input string immediately using Logos.
    pub fn new(input: &'src str) -> Self {
        let tokens: Vec<_> = Token::lexer(input)
            .spanned()
            .filter_map(|(tok, span)| tok.ok().map(|t| (t, Span::from(span))))
            .collect();

        // Ambiguous tags only count once something has closed the title.
        let mut title_closed = false;
        let quality = tokens
            .iter()
            .map(|(t, _)| {
                let is_tag = t.is_quality_tag() && (title_closed || !t.is_ambiguous_tag());
                title_closed |= t.ends_title();
                is_tag
            })
            .collect();

        Self {
            tokens,
            quality,
            input,
        }
    }

    /// Get all tokens with their spans.
    pub fn tokens(&self) -> &[(Token<'src>, Span)] {
        &self.tokens
    }

    /// Get the original input string.
    pub fn input(&self) -> &'src str {
        self.input
    }

    /// Whether the token at `index` is a quality tag in its position.
    pub fn is_quality_at(&self, index: usize) -> bool {
        self.quality.get(index).copied().unwrap_or(false)
    }

    /// Index of the first quality tag, or the token count if there is none.
    pub fn first_quality_index(&self) -> usize {
        self.quality
            .iter()
            .position(|q| *q)
            .unwrap_or(self.tokens.len())
    }
}

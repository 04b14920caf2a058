//! Token types for the Logos-based lexer.

use logos::Logos;

/// Token types recognized by the lexer.
///
/// Priorities are all distinct so that equal-length matches (for example
/// `x264` as a codec versus a plain word) always resolve the same way.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
pub enum Token<'src> {
    /// Season and episode identifier (e.g., S01E05, s1e1, S01E01E02, S01EP03, S01E12v2)
    #[regex(
        r"(?i)S[0-9]{1,4}E[Pp]?[0-9]{1,4}(?:E[Pp]?[0-9]{1,4})*(?:v[0-9]+)?",
        priority = 13
    )]
    SeasonEpisode(&'src str),

    /// Video resolution (e.g., 2160p, 1080p, 720p, 1920x1080, 4K)
    /// Heights below 1080 need the `p`/`i` suffix so that titles like `360` stay words.
    #[regex(
        r"(?i)((2160|1080)[pi]?|(720|576|480|360)[pi]|1920x1080|3840x2160|1280x720|4K|UHD)",
        priority = 12
    )]
    Resolution(&'src str),

    /// Season x episode format (e.g., 1x05, 01X05, 12x103)
    /// Season is at most two digits so that frame sizes like 640x480 stay out.
    #[regex(r"[0-9]{1,2}[xX][0-9]{1,3}", priority = 11)]
    SeasonEpisodeX(&'src str),

    /// Video codec keywords
    #[regex(
        r"(?i)(x26[45]|H\.?26[45]|HEVC|AVC|AV1|Xvi[Dd]|DivX|VC-?1|MPEG-?2)",
        priority = 10
    )]
    Codec(&'src str),

    /// Audio codec and channel keywords
    #[regex(
        r"(?i)(DTS-?HD|DTS-?X|DTS|TrueHD|Atmos|DDP?[0-9]\.[0-9]|E-?AC-?3|AC3|AAC|FLAC|7\.1|5\.1)",
        priority = 9
    )]
    Audio(&'src str),

    /// HDR format keywords
    #[regex(r"(?i)(HDR10\+|HDR10Plus|HDR10|HDR|HLG|DoVi|Dolby[ .]?Vision)", priority = 8)]
    Hdr(&'src str),

    /// Color depth (e.g., 10bit, 10-bit)
    #[regex(r"(?i)(8|10|12)-?bit", priority = 7)]
    BitDepth(&'src str),

    /// Release source keywords
    #[regex(
        r"(?i)(BluRay|Blu-Ray|BDRip|BRRip|WEB-?DL|WEB-?Rip|HDTV|HDRip|DVDRip|REMUX)",
        priority = 6
    )]
    Source(&'src str),

    /// Year (1900-2099)
    #[regex(r"(19|20)[0-9]{2}", priority = 5)]
    Year(&'src str),

    /// Edition identifiers (EXTENDED, UNCUT, etc.)
    #[regex(
        r"(?i)(EXTENDED|UNCUT|UNRATED|DIRECTORS[ .]?CUT|THEATRICAL|REMASTERED|IMAX)",
        priority = 4
    )]
    Edition(&'src str),

    /// Release modifiers (REPACK, PROPER, etc.)
    #[regex(r"(?i)(REPACK|PROPER|RERIP|INTERNAL)", priority = 3)]
    ReleaseModifier(&'src str),

    /// Dot delimiter
    #[token(".")]
    Dot,

    /// Hyphen delimiter
    #[token("-")]
    Hyphen,

    /// Underscore delimiter
    #[token("_")]
    Underscore,

    /// Opening square bracket
    #[token("[")]
    BracketOpen,

    /// Closing square bracket
    #[token("]")]
    BracketClose,

    /// Opening parenthesis
    #[token("(")]
    ParenOpen,

    /// Closing parenthesis
    #[token(")")]
    ParenClose,

    /// Opening brace
    #[token("{")]
    BraceOpen,

    /// Closing brace
    #[token("}")]
    BraceClose,

    /// Numeric token
    #[regex(r"[0-9]+", priority = 2)]
    Number(&'src str),

    /// Generic word token (lower priority than specific patterns)
    #[regex(r"[a-zA-Z][a-zA-Z0-9'&]*", priority = 1)]
    Word(&'src str),
}

impl Token<'_> {
    /// Whether this token is release-quality noise that never belongs in a title.
    pub fn is_quality_tag(&self) -> bool {
        matches!(
            self,
            Token::Resolution(_)
                | Token::Codec(_)
                | Token::Audio(_)
                | Token::Hdr(_)
                | Token::BitDepth(_)
                | Token::Source(_)
                | Token::Edition(_)
                | Token::ReleaseModifier(_)
        )
    }

    /// Whether this quality tag is also an everyday word (`Uncut`, `Internal`,
    /// `HDR`, `4K`) and so only counts as a tag once the title has ended.
    pub fn is_ambiguous_tag(&self) -> bool {
        match self {
            Token::Edition(_) | Token::ReleaseModifier(_) | Token::Hdr(_) => true,
            Token::Resolution(text) => {
                text.eq_ignore_ascii_case("4k") || text.eq_ignore_ascii_case("uhd")
            }
            _ => false,
        }
    }

    /// Whether this token closes the title region: a year, an episode marker
    /// or an unambiguous quality tag.
    pub fn ends_title(&self) -> bool {
        matches!(self, Token::Year(_))
            || self.is_episode_marker()
            || (self.is_quality_tag() && !self.is_ambiguous_tag())
    }

    /// Whether this token marks an episode (`S01E02` or `1x02`).
    pub fn is_episode_marker(&self) -> bool {
        matches!(self, Token::SeasonEpisode(_) | Token::SeasonEpisodeX(_))
    }

    /// Whether this token is a separator or bracket rather than content.
    pub fn is_punctuation(&self) -> bool {
        matches!(
            self,
            Token::Dot
                | Token::Hyphen
                | Token::Underscore
                | Token::BracketOpen
                | Token::BracketClose
                | Token::ParenOpen
                | Token::ParenClose
                | Token::BraceOpen
                | Token::BraceClose
        )
    }
}

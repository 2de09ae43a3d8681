#![forbid(unsafe_code)]

//! One input line, with a memoised plain form and styled tokenization.

use std::sync::{Arc, OnceLock};

use moor_search::Search;
use moor_style::Style;
use moor_text::{
    strip_formatting, styled_runes_from_string, CellWithMetadata, StyleContext,
    StyledRunesWithTrailer,
};
use unicode_width::UnicodeWidthChar;

use crate::linemeta::{LineIndex, LineNumber};

/// The raw bytes of one input line, newline stripped.
///
/// The plain (formatting-stripped) form is computed at most once and cached;
/// it's the canonical form for matching and width computation.
#[derive(Debug, Default)]
pub struct Line {
    raw: String,
    plain: OnceLock<String>,
}

impl Line {
    /// Wrap raw line content. Invalid UTF-8 should already have been replaced
    /// with U+FFFD by the ingest path.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            plain: OnceLock::new(),
        }
    }

    /// The raw content, formatting included.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The plain text form: stripped, tabs expanded, unprintables replaced.
    pub fn plain(&self, index: Option<LineIndex>, ctx: &StyleContext) -> &str {
        self.plain
            .get_or_init(|| strip_formatting(&self.raw, index.map(LineIndex::index), ctx))
    }

    /// Tokenize into styled cells, highlighting any search hits.
    #[must_use]
    pub fn highlighted_tokens(
        &self,
        plain_style: &Style,
        search_hit_style: &Style,
        search: &Search,
        index: Option<LineIndex>,
        ctx: &StyleContext,
    ) -> StyledRunesWithTrailer {
        let match_ranges = search.get_match_ranges(self.plain(index, ctx));

        let tokenized =
            styled_runes_from_string(plain_style, &self.raw, index.map(LineIndex::index), ctx);

        let mut cells = Vec::with_capacity(tokenized.cells.len());
        let mut last_was_search_hit = false;
        for token in tokenized.cells {
            let search_hit = match_ranges.in_range(cells.len());
            let style = if search_hit {
                search_hit_style.clone()
            } else {
                token.style
            };

            cells.push(CellWithMetadata {
                rune: token.rune,
                style,
                is_search_hit: search_hit,
                starts_search_hit: search_hit && !last_was_search_hit,
            });
            last_was_search_hit = search_hit;
        }

        StyledRunesWithTrailer {
            cells,
            trailer: tokenized.trailer,
            contains_search_hit: !match_ranges.is_empty(),
        }
    }

    /// Whether this line carries man-page overstrike formatting.
    #[must_use]
    pub fn has_man_page_formatting(&self) -> bool {
        moor_text::has_man_page_formatting(&self.raw)
    }
}

/// A line plus where it sits: its stable position and its user-facing number.
///
/// With filtering active the index is the position in the filtered view while
/// the number stays the original one, so displayed line numbers keep matching
/// the input file.
#[derive(Debug, Clone)]
pub struct NumberedLine {
    pub index: LineIndex,
    pub number: LineNumber,
    pub line: Arc<Line>,
}

impl NumberedLine {
    /// The plain form of the wrapped line.
    pub fn plain<'a>(&'a self, ctx: &StyleContext) -> &'a str {
        self.line.plain(Some(self.index), ctx)
    }

    /// Styled cells with search hits highlighted.
    #[must_use]
    pub fn highlighted_tokens(
        &self,
        plain_style: &Style,
        search_hit_style: &Style,
        search: &Search,
        ctx: &StyleContext,
    ) -> StyledRunesWithTrailer {
        self.line
            .highlighted_tokens(plain_style, search_hit_style, search, Some(self.index), ctx)
    }

    /// Display width of the plain form in screen columns.
    #[must_use]
    pub fn display_width(&self, ctx: &StyleContext) -> usize {
        self.plain(ctx)
            .chars()
            .map(|rune| rune.width().unwrap_or(0))
            .sum()
    }
}

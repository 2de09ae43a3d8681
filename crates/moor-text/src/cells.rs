#![forbid(unsafe_code)]

//! Screen cells with search-hit metadata.

use moor_style::Style;
use unicode_width::UnicodeWidthChar;

/// One styled rune plus metadata the renderer and search need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWithMetadata {
    pub rune: char,
    pub style: Style,
    /// True for every cell inside a search hit.
    pub is_search_hit: bool,
    /// True only for the first cell of a search hit.
    pub starts_search_hit: bool,
}

impl CellWithMetadata {
    /// A cell with no search metadata.
    #[must_use]
    pub fn new(rune: char, style: Style) -> Self {
        Self {
            rune,
            style,
            is_search_hit: false,
            starts_search_hit: false,
        }
    }

    /// Display width in screen columns (0, 1 or 2).
    #[must_use]
    pub fn width(&self) -> usize {
        self.rune.width().unwrap_or(0)
    }
}

/// The tokenizer's output for one line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledRunesWithTrailer {
    pub cells: Vec<CellWithMetadata>,
    /// Style for the rest of the screen row after the last cell, set by the
    /// final SGR state of the line.
    pub trailer: Style,
    pub contains_search_hit: bool,
}

/// Whitespace trimming and hit queries over cell slices.
pub trait CellSliceExt {
    /// The slice with leading whitespace removed.
    fn without_space_left(&self) -> &Self;
    /// The slice with trailing whitespace removed.
    fn without_space_right(&self) -> &Self;
    /// Whether any cell is part of a search hit.
    fn contains_search_hit(&self) -> bool;
}

impl CellSliceExt for [CellWithMetadata] {
    fn without_space_left(&self) -> &Self {
        for (i, cell) in self.iter().enumerate() {
            if !cell.rune.is_whitespace() {
                return &self[i..];
            }
        }
        &self[0..0]
    }

    fn without_space_right(&self) -> &Self {
        for (i, cell) in self.iter().enumerate().rev() {
            if !cell.rune.is_whitespace() {
                return &self[..=i];
            }
        }
        &self[0..0]
    }

    fn contains_search_hit(&self) -> bool {
        self.iter().any(|cell| cell.is_search_hit)
    }
}

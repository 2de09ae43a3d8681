#![forbid(unsafe_code)]

//! One rune with its style, the unit the screen grid stores.

use moor_style::Style;
use unicode_width::UnicodeWidthChar;

/// A single styled rune.
///
/// Display width is 0 for combining marks, 2 for wide (CJK etc.) runes and 1
/// for everything else. Continuation cells behind wide runes are represented
/// with [`StyledRune::CONTINUATION`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRune {
    pub rune: char,
    pub style: Style,
}

impl StyledRune {
    /// Marker stored in the cell after a double-width rune.
    pub const CONTINUATION: StyledRune = StyledRune {
        rune: '\0',
        style: Style::DEFAULT,
    };

    /// Create a styled rune.
    #[must_use]
    pub fn new(rune: char, style: Style) -> Self {
        Self { rune, style }
    }

    /// Check whether this is the filler cell behind a wide rune.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.rune == '\0'
    }

    /// Display width in screen columns (0, 1 or 2).
    #[must_use]
    pub fn width(&self) -> usize {
        rune_width(self.rune)
    }
}

/// Display width of a rune in screen columns.
#[must_use]
pub fn rune_width(rune: char) -> usize {
    if rune == '\0' {
        return 0;
    }
    rune.width().unwrap_or(0)
}

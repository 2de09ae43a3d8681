#![forbid(unsafe_code)]

//! Styled-text tokenizer.
//!
//! Turns a raw input line into styled screen cells, handling ANSI CSI SGR
//! sequences, OSC-8 hyperlinks, man-page overstrike, tabs and unprintable
//! characters. Also produces the plain (formatting-stripped) form of a line,
//! which is what searching and width computation run against.

pub mod cells;
pub mod context;
pub mod overstrike;
pub mod runes;
pub mod tokenizer;

pub use cells::{CellSliceExt, CellWithMetadata, StyledRunesWithTrailer};
pub use context::{StyleContext, UnprintableStyle};
pub use overstrike::has_man_page_formatting;
pub use tokenizer::{strip_formatting, styled_runes_from_string};

/// Check whether a rune can be sent to the terminal as-is.
#[must_use]
pub fn printable(rune: char) -> bool {
    if rune == ' ' {
        return true;
    }
    if rune.is_control() {
        return false;
    }
    // Line/paragraph separators and the BOM confuse terminals
    !matches!(rune, '\u{2028}' | '\u{2029}' | '\u{feff}')
}

#![forbid(unsafe_code)]

//! Rendering knobs threaded through the tokenizer.
//!
//! The original kept these as module-level variables; here they travel as a
//! context value owned by the pager so tests can run with different settings
//! in parallel.

use moor_style::{AttrMask, Color, Style};

/// How to render characters that have no printable representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnprintableStyle {
    /// Show a '?' on a red cell, making trouble visible.
    #[default]
    Highlight,
    /// Show a blank in the default style.
    Whitespace,
}

/// Tokenizer configuration: tab stops, unprintable policy, man-page styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleContext {
    /// Tab stop distance, at least 1. less defaults to 8, so do we.
    pub tab_size: usize,
    pub unprintable: UnprintableStyle,
    pub man_page_bold: Style,
    pub man_page_underline: Style,
    pub man_page_heading: Style,
}

impl Default for StyleContext {
    fn default() -> Self {
        Self {
            tab_size: 8,
            unprintable: UnprintableStyle::default(),
            man_page_bold: Style::DEFAULT.with_attr(AttrMask::BOLD),
            man_page_underline: Style::DEFAULT.with_attr(AttrMask::UNDERLINE),
            man_page_heading: Style::DEFAULT.with_attr(AttrMask::BOLD),
        }
    }
}

impl StyleContext {
    /// The style used for unprintable bytes when highlighting them.
    #[must_use]
    pub fn unprintable_style(&self) -> Style {
        Style::DEFAULT
            .with_background(Color::Ansi16(1))
            .with_foreground(Color::Ansi16(7))
    }
}

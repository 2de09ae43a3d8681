#![forbid(unsafe_code)]

//! Cell styling: attributes, colors, and OSC-8 hyperlinks.

use std::sync::Arc;

use bitflags::bitflags;

use crate::color::{Color, ColorCount, ColorRole};

bitflags! {
    /// Text attributes a cell can carry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrMask: u8 {
        /// SGR 1
        const BOLD = 0b0000_0001;
        /// SGR 2
        const DIM = 0b0000_0010;
        /// SGR 3
        const ITALIC = 0b0000_0100;
        /// SGR 4
        const UNDERLINE = 0b0000_1000;
        /// SGR 7
        const REVERSE = 0b0001_0000;
    }
}

/// The full look of one screen cell.
///
/// Styles are value types; the builder methods return modified copies. The
/// hyperlink is reference-counted so cloning a styled line stays cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    fg: Color,
    bg: Color,
    underline_color: Color,
    attrs: AttrMask,
    hyperlink: Option<Arc<str>>,
}

impl Style {
    /// The terminal's default look: default colors, no attributes.
    pub const DEFAULT: Style = Style {
        fg: Color::Default,
        bg: Color::Default,
        underline_color: Color::Default,
        attrs: AttrMask::empty(),
        hyperlink: None,
    };

    /// Foreground color.
    #[must_use]
    pub fn foreground(&self) -> Color {
        self.fg
    }

    /// Background color.
    #[must_use]
    pub fn background(&self) -> Color {
        self.bg
    }

    /// Underline color, usually `Color::Default`.
    #[must_use]
    pub fn underline_color(&self) -> Color {
        self.underline_color
    }

    /// Active OSC-8 hyperlink URI, if any.
    #[must_use]
    pub fn hyperlink(&self) -> Option<&str> {
        self.hyperlink.as_deref()
    }

    /// Set the foreground color.
    #[must_use]
    pub fn with_foreground(mut self, fg: Color) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background color.
    #[must_use]
    pub fn with_background(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }

    /// Set the underline color.
    #[must_use]
    pub fn with_underline_color(mut self, color: Color) -> Self {
        self.underline_color = color;
        self
    }

    /// Turn an attribute on.
    #[must_use]
    pub fn with_attr(mut self, attr: AttrMask) -> Self {
        self.attrs |= attr;
        self
    }

    /// Turn an attribute off.
    #[must_use]
    pub fn without_attr(mut self, attr: AttrMask) -> Self {
        self.attrs -= attr;
        self
    }

    /// Check whether an attribute is on.
    #[must_use]
    pub fn has_attr(&self, attr: AttrMask) -> bool {
        self.attrs.contains(attr)
    }

    /// Set or clear the OSC-8 hyperlink.
    #[must_use]
    pub fn with_hyperlink(mut self, url: Option<Arc<str>>) -> Self {
        self.hyperlink = url;
        self
    }

    /// The hyperlink as a cheaply clonable handle.
    #[must_use]
    pub fn hyperlink_handle(&self) -> Option<Arc<str>> {
        self.hyperlink.clone()
    }

    /// Render the transition from `self` to `next` as an ANSI string.
    ///
    /// Resets everything, then applies `next`. Emitting state deltas instead
    /// would be smaller, but a full reset keeps the terminal model simple and
    /// correct; the terminal driver only calls this on style changes.
    #[must_use]
    pub fn ansi_transition(&self, next: &Style, terminal: ColorCount) -> String {
        let mut out = String::from("\x1b[0m");
        if next.attrs.contains(AttrMask::BOLD) {
            out.push_str("\x1b[1m");
        }
        if next.attrs.contains(AttrMask::DIM) {
            out.push_str("\x1b[2m");
        }
        if next.attrs.contains(AttrMask::ITALIC) {
            out.push_str("\x1b[3m");
        }
        if next.attrs.contains(AttrMask::UNDERLINE) {
            out.push_str("\x1b[4m");
        }
        if next.attrs.contains(AttrMask::REVERSE) {
            out.push_str("\x1b[7m");
        }
        if next.fg.is_real() {
            out.push_str(&next.fg.ansi_string(ColorRole::Foreground, terminal));
        }
        if next.bg.is_real() {
            out.push_str(&next.bg.ansi_string(ColorRole::Background, terminal));
        }
        if next.underline_color.is_real() {
            out.push_str(&next.underline_color.ansi_string(ColorRole::Underline, terminal));
        }

        match (self.hyperlink(), next.hyperlink()) {
            (old, new) if old == new => {}
            (_, Some(url)) => {
                out.push_str("\x1b]8;;");
                out.push_str(url);
                out.push_str("\x1b\\");
            }
            (Some(_), None) => out.push_str("\x1b]8;;\x1b\\"),
            (None, None) => {}
        }

        out
    }
}

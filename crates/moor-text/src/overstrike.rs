#![forbid(unsafe_code)]

//! Man-page overstrike handling.
//!
//! nroff output encodes emphasis by backspacing: `X\bX` is bold, `_\bX` is
//! underlined, `_\bX\bX` is both, and `+\bo` (or the doubled form) is a
//! bullet. These predate ANSI and still arrive whenever someone pipes `man`
//! output at us.

use moor_style::{AttrMask, Style};

use crate::context::StyleContext;
use crate::runes::RuneWindow;

pub(crate) const BACKSPACE: char = '\x08';

/// One recognized overstrike token.
pub(crate) struct OverstrikeToken {
    pub rune: char,
    pub style: Style,
}

/// Consume `_\bX\bX` or `X\b_\bX`: a bold underlined X.
///
/// The attributes merge what the bold and underline styles carry, matching
/// how man pages look when both markups stack.
pub(crate) fn consume_bold_underline(
    runes: &mut RuneWindow<'_>,
    ctx: &StyleContext,
) -> Option<OverstrikeToken> {
    runes.get_relative(4)?;

    let first = runes.get_relative(0)?;
    let third = runes.get_relative(2)?;
    let fifth = runes.get_relative(4)?;

    if runes.get_relative(1)? != BACKSPACE || runes.get_relative(3)? != BACKSPACE {
        return None;
    }

    let rune = if first == '_' && third == fifth {
        // _\bX\bX
        fifth
    } else if third == '_' && first == fifth {
        // X\b_\bX
        fifth
    } else {
        return None;
    };

    let mut style = ctx.man_page_bold.clone();
    if ctx.man_page_underline.has_attr(AttrMask::UNDERLINE) {
        style = style.with_attr(AttrMask::UNDERLINE);
    }
    if ctx.man_page_underline.has_attr(AttrMask::ITALIC) {
        style = style.with_attr(AttrMask::ITALIC);
    }

    runes.next(); // first rune
    runes.next(); // first backspace
    runes.next(); // second rune
    runes.next(); // second backspace
    // The last rune is consumed by the caller

    Some(OverstrikeToken { rune, style })
}

/// Consume `X\bX`: a bold X.
pub(crate) fn consume_bold(
    runes: &mut RuneWindow<'_>,
    ctx: &StyleContext,
) -> Option<OverstrikeToken> {
    let first = runes.get_relative(0)?;
    if runes.get_relative(1)? != BACKSPACE {
        return None;
    }
    if runes.get_relative(2)? != first {
        return None;
    }

    runes.next(); // first rune
    runes.next(); // backspace

    Some(OverstrikeToken {
        rune: first,
        style: ctx.man_page_bold.clone(),
    })
}

/// Consume `_\bX`: an underlined X.
pub(crate) fn consume_underline(
    runes: &mut RuneWindow<'_>,
    ctx: &StyleContext,
) -> Option<OverstrikeToken> {
    if runes.get_relative(0)? != '_' {
        return None;
    }
    if runes.get_relative(1)? != BACKSPACE {
        return None;
    }
    let rune = runes.get_relative(2)?;

    runes.next(); // underscore
    runes.next(); // backspace

    Some(OverstrikeToken {
        rune,
        style: ctx.man_page_underline.clone(),
    })
}

/// Consume `+\bo` or `+\b+\bo\bo`: a bullet. Try "man printf" on macOS.
pub(crate) fn consume_bullet(runes: &mut RuneWindow<'_>) -> Option<OverstrikeToken> {
    const PATTERNS: [&[char]; 2] = [
        &['+', BACKSPACE, 'o'],
        &['+', BACKSPACE, '+', BACKSPACE, 'o', BACKSPACE, 'o'],
    ];

    'patterns: for pattern in PATTERNS {
        for (delta, want) in pattern.iter().enumerate() {
            if runes.get_relative(delta) != Some(*want) {
                continue 'patterns;
            }
        }

        // Skip everything except the last rune, the caller does that
        for _ in 0..pattern.len() - 1 {
            runes.next();
        }

        return Some(OverstrikeToken {
            rune: '•',
            style: Style::DEFAULT,
        });
    }

    None
}

fn consume_any(runes: &mut RuneWindow<'_>, ctx: &StyleContext) -> Option<OverstrikeToken> {
    consume_bullet(runes)
        .or_else(|| consume_bold_underline(runes, ctx))
        .or_else(|| consume_bold(runes, ctx))
        .or_else(|| consume_underline(runes, ctx))
}

/// Tokenize one styled chunk, resolving overstrike patterns. Runes not part
/// of any pattern come out with `base_style`.
pub(crate) fn tokens_from_chunk(
    chunk: &str,
    base_style: &Style,
    ctx: &StyleContext,
) -> Vec<OverstrikeToken> {
    let mut tokens = Vec::with_capacity(chunk.len());

    if !chunk.contains(BACKSPACE) {
        // Fast path, no overstrike to worry about
        for rune in chunk.chars() {
            tokens.push(OverstrikeToken {
                rune,
                style: base_style.clone(),
            });
        }
        return tokens;
    }

    let mut runes = RuneWindow::new(chunk);
    while let Some(rune) = runes.get_relative(0) {
        if let Some(token) = consume_any(&mut runes, ctx) {
            tokens.push(token);
        } else {
            tokens.push(OverstrikeToken {
                rune,
                style: base_style.clone(),
            });
        }
        runes.next();
    }

    tokens
}

/// Check whether any overstrike pattern occurs in the string.
///
/// This is the basis for detecting man-page content, which in turn disables
/// line numbers by default (man formats for the full terminal width).
#[must_use]
pub fn has_man_page_formatting(s: &str) -> bool {
    if !s.contains(BACKSPACE) {
        return false;
    }

    let ctx = StyleContext::default();
    let mut runes = RuneWindow::new(s);
    while runes.get_relative(0).is_some() {
        if consume_any(&mut runes, &ctx).is_some() {
            return true;
        }
        runes.next();
    }

    false
}

/// Detect a man-page section heading: a line consisting entirely of
/// bold-overstruck runes (`X\bX`), all cased letters uppercase. Such lines
/// render wholesale in the heading style.
pub(crate) fn man_page_heading_cells(s: &str, ctx: &StyleContext) -> Option<Vec<OverstrikeToken>> {
    if s.is_empty() || !s.contains(BACKSPACE) {
        return None;
    }

    let mut tokens = Vec::new();
    let mut saw_letter = false;
    let mut runes = s.chars();
    loop {
        let Some(first) = runes.next() else {
            break;
        };

        if first.is_lowercase() {
            return None;
        }
        if first.is_uppercase() {
            saw_letter = true;
        }

        if runes.next() != Some(BACKSPACE) {
            return None;
        }
        if runes.next() != Some(first) {
            return None;
        }

        tokens.push(OverstrikeToken {
            rune: first,
            style: ctx.man_page_heading.clone(),
        });
    }

    if !saw_letter {
        return None;
    }
    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bold() {
        assert!(has_man_page_formatting("x\x08x"));
    }

    #[test]
    fn detects_underline() {
        assert!(has_man_page_formatting("_\x08x"));
    }

    #[test]
    fn detects_bold_underline() {
        assert!(has_man_page_formatting("_\x08x\x08x"));
        assert!(has_man_page_formatting("x\x08_\x08x"));
    }

    #[test]
    fn detects_bullets() {
        assert!(has_man_page_formatting("+\x08o"));
        assert!(has_man_page_formatting("+\x08+\x08o\x08o"));
    }

    #[test]
    fn plain_text_is_not_man_page() {
        assert!(!has_man_page_formatting("hello"));
        assert!(!has_man_page_formatting(""));
        // A backspace alone is not an overstrike
        assert!(!has_man_page_formatting("x\x08y"));
    }

    #[test]
    fn heading_detection() {
        let ctx = StyleContext::default();
        let heading: String = "JOHAN"
            .chars()
            .flat_map(|c| [c, BACKSPACE, c])
            .collect();

        let cells = man_page_heading_cells(&heading, &ctx).expect("JOHAN should be a heading");
        assert_eq!(cells.len(), 5);
        for (cell, want) in cells.iter().zip("JOHAN".chars()) {
            assert_eq!(cell.rune, want);
            assert_eq!(cell.style, ctx.man_page_heading);
        }
    }

    #[test]
    fn lowercase_is_not_a_heading() {
        let ctx = StyleContext::default();
        let bolded: String = "johan".chars().flat_map(|c| [c, BACKSPACE, c]).collect();
        assert!(man_page_heading_cells(&bolded, &ctx).is_none());
    }

    #[test]
    fn partial_overstrike_is_not_a_heading() {
        let ctx = StyleContext::default();
        assert!(man_page_heading_cells("J\x08JOHAN", &ctx).is_none());
    }
}

#![forbid(unsafe_code)]

//! From raw bytes to styled cells.
//!
//! The entry points are [`styled_runes_from_string`] (full tokenization into
//! styled cells plus a trailer style) and [`strip_formatting`] (just the
//! plain text, same rune count as the cell vector).

use moor_style::{Color, Style};
use tracing::{debug, trace};

use crate::cells::{CellWithMetadata, StyledRunesWithTrailer};
use crate::context::{StyleContext, UnprintableStyle};
use crate::overstrike::{man_page_heading_cells, tokens_from_chunk, BACKSPACE};
use crate::printable;

/// Turn a (possibly formatted) string into a series of screen cells.
///
/// `line_index` is used for error reporting only.
#[must_use]
pub fn styled_runes_from_string(
    plain_style: &Style,
    raw: &str,
    line_index: Option<usize>,
    ctx: &StyleContext,
) -> StyledRunesWithTrailer {
    if let Some(heading) = man_page_heading_cells(raw, ctx) {
        return StyledRunesWithTrailer {
            cells: heading
                .into_iter()
                .map(|token| CellWithMetadata::new(token.rune, token.style))
                .collect(),
            trailer: Style::DEFAULT,
            // Populated by Line::highlighted_tokens() where the search hit
            // highlighting happens
            contains_search_hit: false,
        };
    }

    let mut cells: Vec<CellWithMetadata> = Vec::with_capacity(raw.len());
    let unprintable_style = ctx.unprintable_style();
    let tab_size = ctx.tab_size.max(1);

    let trailer = styled_chunks(plain_style, raw, line_index, |chunk, style| {
        for token in tokens_from_chunk(chunk, style, ctx) {
            match token.rune {
                '\t' => loop {
                    cells.push(CellWithMetadata::new(' ', token.style.clone()));
                    if cells.len() % tab_size == 0 {
                        // We arrived at the next tab stop
                        break;
                    }
                },

                '\u{fffd}' => match ctx.unprintable {
                    UnprintableStyle::Highlight => {
                        cells.push(CellWithMetadata::new('?', unprintable_style.clone()));
                    }
                    UnprintableStyle::Whitespace => {
                        cells.push(CellWithMetadata::new(' ', Style::DEFAULT));
                    }
                },

                BACKSPACE => {
                    cells.push(CellWithMetadata::new('<', unprintable_style.clone()));
                }

                rune if !printable(rune) => match ctx.unprintable {
                    UnprintableStyle::Highlight => {
                        cells.push(CellWithMetadata::new('?', unprintable_style.clone()));
                    }
                    UnprintableStyle::Whitespace => {
                        cells.push(CellWithMetadata::new(' ', Style::DEFAULT));
                    }
                },

                rune => cells.push(CellWithMetadata::new(rune, token.style)),
            }
        }
    });

    StyledRunesWithTrailer {
        cells,
        trailer,
        contains_search_hit: false,
    }
}

/// The plain form of a line: formatting stripped, tabs expanded, unprintables
/// replaced. Rune count matches the cell count of the full tokenization.
#[must_use]
pub fn strip_formatting(raw: &str, line_index: Option<usize>, ctx: &StyleContext) -> String {
    if is_plain(raw) {
        return raw.to_string();
    }

    let mut stripped = String::with_capacity(raw.len());
    let mut rune_count = 0usize;
    let tab_size = ctx.tab_size.max(1);

    styled_chunks(&Style::DEFAULT, raw, line_index, |chunk, style| {
        for token in tokens_from_chunk(chunk, style, ctx) {
            match token.rune {
                '\t' => loop {
                    stripped.push(' ');
                    rune_count += 1;
                    if rune_count % tab_size == 0 {
                        break;
                    }
                },

                '\u{fffd}' => {
                    match ctx.unprintable {
                        UnprintableStyle::Highlight => stripped.push('?'),
                        UnprintableStyle::Whitespace => stripped.push(' '),
                    }
                    rune_count += 1;
                }

                BACKSPACE => {
                    stripped.push('<');
                    rune_count += 1;
                }

                rune if !printable(rune) => {
                    stripped.push('?');
                    rune_count += 1;
                }

                rune => {
                    stripped.push(rune);
                    rune_count += 1;
                }
            }
        }
    });

    stripped
}

fn is_plain(s: &str) -> bool {
    s.bytes().all(|byte| (32..=126).contains(&byte))
}

/// Split a raw line into (text, style) chunks by parsing ANSI sequences.
/// Returns the final style state, used as the trailer.
fn styled_chunks(
    plain_style: &Style,
    raw: &str,
    line_index: Option<usize>,
    mut emit: impl FnMut(&str, &Style),
) -> Style {
    let mut style = plain_style.clone();
    let mut rest = raw;

    while !rest.is_empty() {
        let Some(esc_offset) = rest.find('\x1b') else {
            emit(rest, &style);
            break;
        };

        if esc_offset > 0 {
            emit(&rest[..esc_offset], &style);
        }
        let after_esc = &rest[esc_offset + 1..];

        match after_esc.chars().next() {
            Some('[') => {
                let body = &after_esc[1..];
                match consume_csi(body) {
                    Some((sequence, after)) => {
                        if let Some(params) = sequence.strip_suffix('m') {
                            match update_style_from_sgr(&style, params) {
                                Ok(updated) => style = updated,
                                Err(problem) => {
                                    debug!(
                                        line = ?line_index,
                                        "Bad SGR sequence <CSI {sequence}>: {problem}"
                                    );
                                    // Render the consumed bytes as unprintables
                                    emit(&rest[esc_offset..esc_offset + 2 + sequence.len()], &style);
                                }
                            }
                        } else {
                            debug!(line = ?line_index, "Unhandled CSI sequence <CSI {sequence}>");
                            emit(&rest[esc_offset..esc_offset + 2 + sequence.len()], &style);
                        }
                        rest = after;
                    }
                    None => {
                        // Unterminated sequence, render what we have
                        emit(&rest[esc_offset..], &style);
                        break;
                    }
                }
            }

            Some(']') => {
                let body = &after_esc[1..];
                match consume_osc(body) {
                    Some((content, after)) => {
                        if let Some(link_part) = content.strip_prefix("8;") {
                            // OSC 8: params ; URI
                            let uri = link_part
                                .split_once(';')
                                .map(|(_params, uri)| uri)
                                .unwrap_or("");
                            if uri.is_empty() {
                                style = style.with_hyperlink(None);
                            } else {
                                style = style.with_hyperlink(Some(uri.into()));
                            }
                        } else {
                            trace!(line = ?line_index, "Ignoring OSC sequence <OSC {content}>");
                        }
                        rest = after;
                    }
                    None => {
                        emit(&rest[esc_offset..], &style);
                        break;
                    }
                }
            }

            _ => {
                // A lone ESC renders as an unprintable
                emit(&rest[esc_offset..esc_offset + 1], &style);
                rest = after_esc;
            }
        }
    }

    style
}

/// Consume a CSI body (after `ESC [`) up to and including its final byte.
/// Returns the sequence (params + final byte) and the remainder.
fn consume_csi(body: &str) -> Option<(&str, &str)> {
    for (offset, byte) in body.bytes().enumerate() {
        match byte {
            0x30..=0x3f | 0x20..=0x2f => continue,
            0x40..=0x7e => return Some((&body[..=offset], &body[offset + 1..])),
            _ => return None,
        }
    }
    None
}

/// Consume an OSC body (after `ESC ]`) up to its terminator (BEL or ESC \).
/// Returns the content without the terminator, and the remainder.
fn consume_osc(body: &str) -> Option<(&str, &str)> {
    let mut bytes = body.char_indices();
    while let Some((offset, rune)) = bytes.next() {
        match rune {
            '\x07' => return Some((&body[..offset], &body[offset + 1..])),
            '\x1b' => {
                if let Some((_, '\\')) = bytes.next() {
                    return Some((&body[..offset], &body[offset + 2..]));
                }
                return None;
            }
            _ => {}
        }
    }
    None
}

/// Apply an SGR parameter string ("1;31") to a style.
///
/// Unknown codes are reported back to the caller's log and skipped; the rest
/// of the sequence still applies.
fn update_style_from_sgr(style: &Style, params: &str) -> Result<Style, String> {
    let numbers = split_into_numbers(params)?;
    let mut style = style.clone();

    let mut index = 0;
    while index < numbers.len() {
        let number = numbers[index];
        index += 1;
        match number {
            // SGR reset should not affect the OSC-8 hyperlink
            0 => style = Style::DEFAULT.with_hyperlink(style.hyperlink_handle()),

            1 => style = style.with_attr(moor_style::AttrMask::BOLD),
            2 => style = style.with_attr(moor_style::AttrMask::DIM),
            3 => style = style.with_attr(moor_style::AttrMask::ITALIC),
            4 => style = style.with_attr(moor_style::AttrMask::UNDERLINE),
            7 => style = style.with_attr(moor_style::AttrMask::REVERSE),

            22 => {
                style = style
                    .without_attr(moor_style::AttrMask::BOLD)
                    .without_attr(moor_style::AttrMask::DIM);
            }
            23 => style = style.without_attr(moor_style::AttrMask::ITALIC),
            24 => style = style.without_attr(moor_style::AttrMask::UNDERLINE),
            27 => style = style.without_attr(moor_style::AttrMask::REVERSE),

            30..=37 => style = style.with_foreground(Color::Ansi16((number - 30) as u8)),
            38 => {
                let (color, next) = consume_composite_color(&numbers, index - 1)?;
                style = style.with_foreground(color);
                index = next;
            }
            39 => style = style.with_foreground(Color::Default),

            40..=47 => style = style.with_background(Color::Ansi16((number - 40) as u8)),
            48 => {
                let (color, next) = consume_composite_color(&numbers, index - 1)?;
                style = style.with_background(color);
                index = next;
            }
            49 => style = style.with_background(Color::Default),

            58 => {
                let (color, next) = consume_composite_color(&numbers, index - 1)?;
                style = style.with_underline_color(color);
                index = next;
            }
            59 => style = style.with_underline_color(Color::Default),

            90..=97 => style = style.with_foreground(Color::Ansi16((number - 90 + 8) as u8)),
            100..=107 => style = style.with_background(Color::Ansi16((number - 100 + 8) as u8)),

            unknown => {
                debug!("Unrecognized ANSI SGR code <{unknown}>, skipping it");
            }
        }
    }

    Ok(style)
}

/// Parse ";"- or ":"-separated unsigned integers. Empty fields mean 0.
fn split_into_numbers(params: &str) -> Result<Vec<u64>, String> {
    let mut numbers = Vec::with_capacity(4);
    for field in params.split([';', ':']) {
        if field.is_empty() {
            numbers.push(0);
            continue;
        }
        let number = field
            .parse::<u64>()
            .map_err(|_| format!("unrecognized number <{field}>"))?;
        numbers.push(number);
    }
    Ok(numbers)
}

/// Parse the 38/48/58 composite color forms: `5;N` (256-color) or
/// `2;R;G;B` (24-bit). `index` points at the 38/48/58 marker. Returns the
/// color and the first unconsumed index.
fn consume_composite_color(numbers: &[u64], index: usize) -> Result<(Color, usize), String> {
    let type_index = index + 1;
    let Some(color_type) = numbers.get(type_index) else {
        return Err("incomplete color sequence".to_string());
    };

    match color_type {
        5 => {
            let Some(&value) = numbers.get(type_index + 1) else {
                return Err("incomplete 8-bit color sequence".to_string());
            };
            Ok((Color::Ansi256(value as u8), type_index + 2))
        }
        2 => {
            let (Some(&r), Some(&g), Some(&b)) = (
                numbers.get(type_index + 1),
                numbers.get(type_index + 2),
                numbers.get(type_index + 3),
            ) else {
                return Err("incomplete 24-bit color sequence, expected N;2;R;G;B".to_string());
            };
            Ok((Color::rgb(r as u8, g as u8, b as u8), type_index + 4))
        }
        other => Err(format!(
            "unknown color type <{other}>, expected 5 (8-bit) or 2 (24-bit)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moor_style::AttrMask;

    fn tokenize(raw: &str) -> StyledRunesWithTrailer {
        styled_runes_from_string(&Style::DEFAULT, raw, None, &StyleContext::default())
    }

    fn cell_string(result: &StyledRunesWithTrailer) -> String {
        result.cells.iter().map(|cell| cell.rune).collect()
    }

    #[test]
    fn plain_text_passes_through() {
        let result = tokenize("hello");
        assert_eq!(cell_string(&result), "hello");
        assert!(result.cells.iter().all(|cell| cell.style == Style::DEFAULT));
        assert_eq!(result.trailer, Style::DEFAULT);
    }

    #[test]
    fn sgr_foreground() {
        let result = tokenize("a\x1b[31mb");
        assert_eq!(cell_string(&result), "ab");
        assert_eq!(result.cells[0].style, Style::DEFAULT);
        assert_eq!(
            result.cells[1].style,
            Style::DEFAULT.with_foreground(Color::Ansi16(1))
        );
    }

    #[test]
    fn sgr_bright_colors() {
        let result = tokenize("\x1b[91mx\x1b[101my");
        assert_eq!(
            result.cells[0].style,
            Style::DEFAULT.with_foreground(Color::Ansi16(9))
        );
        assert_eq!(
            result.cells[1].style,
            Style::DEFAULT
                .with_foreground(Color::Ansi16(9))
                .with_background(Color::Ansi16(9))
        );
    }

    #[test]
    fn sgr_256_and_24_bit() {
        let result = tokenize("\x1b[38;5;196ma\x1b[48;2;1;2;3mb");
        assert_eq!(
            result.cells[0].style,
            Style::DEFAULT.with_foreground(Color::Ansi256(196))
        );
        assert_eq!(
            result.cells[1].style,
            Style::DEFAULT
                .with_foreground(Color::Ansi256(196))
                .with_background(Color::rgb(1, 2, 3))
        );
    }

    #[test]
    fn sgr_attribute_toggles() {
        let result = tokenize("\x1b[1;2;3;4;7mx\x1b[22;23;24;27my");
        let all_on = Style::DEFAULT
            .with_attr(AttrMask::BOLD)
            .with_attr(AttrMask::DIM)
            .with_attr(AttrMask::ITALIC)
            .with_attr(AttrMask::UNDERLINE)
            .with_attr(AttrMask::REVERSE);
        assert_eq!(result.cells[0].style, all_on);
        assert_eq!(result.cells[1].style, Style::DEFAULT);
    }

    #[test]
    fn sgr_underline_color() {
        let result = tokenize("\x1b[58;5;42mx\x1b[59my");
        assert_eq!(
            result.cells[0].style,
            Style::DEFAULT.with_underline_color(Color::Ansi256(42))
        );
        assert_eq!(result.cells[1].style, Style::DEFAULT);
    }

    #[test]
    fn reset_keeps_hyperlink() {
        let raw = "\x1b]8;;http://example.com/\x1b\\\x1b[1mlink\x1b[0mmore";
        let result = tokenize(raw);
        assert_eq!(cell_string(&result), "linkmore");
        // Bold reset by SGR 0, hyperlink preserved
        let after_reset = &result.cells[4].style;
        assert!(!after_reset.has_attr(AttrMask::BOLD));
        assert_eq!(after_reset.hyperlink(), Some("http://example.com/"));
    }

    #[test]
    fn empty_osc8_uri_clears_link() {
        let raw = "\x1b]8;;http://x/\x1b\\a\x1b]8;;\x1b\\b";
        let result = tokenize(raw);
        assert_eq!(result.cells[0].style.hyperlink(), Some("http://x/"));
        assert_eq!(result.cells[1].style.hyperlink(), None);
    }

    #[test]
    fn osc8_bel_terminator() {
        let raw = "\x1b]8;;http://x/\x07a";
        let result = tokenize(raw);
        assert_eq!(result.cells[0].style.hyperlink(), Some("http://x/"));
    }

    #[test]
    fn unknown_sgr_code_skipped() {
        // 73 is unknown; 1 before it must still apply
        let result = tokenize("\x1b[1;73mx");
        assert_eq!(cell_string(&result), "x");
        assert!(result.cells[0].style.has_attr(AttrMask::BOLD));
    }

    #[test]
    fn empty_params_mean_reset() {
        let result = tokenize("\x1b[1mx\x1b[my");
        assert!(result.cells[0].style.has_attr(AttrMask::BOLD));
        assert_eq!(result.cells[1].style, Style::DEFAULT);
    }

    #[test]
    fn trailer_is_final_sgr_state() {
        let result = tokenize("x\x1b[44m");
        assert_eq!(
            result.trailer,
            Style::DEFAULT.with_background(Color::Ansi16(4))
        );
    }

    #[test]
    fn tab_expansion() {
        let ctx = StyleContext::default();
        let result = styled_runes_from_string(&Style::DEFAULT, "\tx", None, &ctx);
        assert_eq!(cell_string(&result), "        x");

        let result = styled_runes_from_string(&Style::DEFAULT, "ab\tx", None, &ctx);
        assert_eq!(cell_string(&result), "ab      x");
    }

    #[test]
    fn tab_expansion_with_tab_size_4() {
        let ctx = StyleContext {
            tab_size: 4,
            ..StyleContext::default()
        };
        let result = styled_runes_from_string(&Style::DEFAULT, "ab\tx", None, &ctx);
        assert_eq!(cell_string(&result), "ab  x");
    }

    #[test]
    fn lone_backspace_renders_as_less_than() {
        let ctx = StyleContext::default();
        let result = tokenize("a\x08-");
        assert_eq!(cell_string(&result), "a<-");
        assert_eq!(result.cells[1].style, ctx.unprintable_style());
    }

    #[test]
    fn overstrike_bold() {
        let ctx = StyleContext::default();
        let result = tokenize("A\x08A");
        assert_eq!(cell_string(&result), "A");
        assert_eq!(result.cells[0].style, ctx.man_page_bold);
    }

    #[test]
    fn overstrike_underline() {
        let ctx = StyleContext::default();
        let result = tokenize("_\x08A");
        assert_eq!(cell_string(&result), "A");
        assert_eq!(result.cells[0].style, ctx.man_page_underline);
    }

    #[test]
    fn overstrike_bold_underline_merges() {
        let ctx = StyleContext::default();
        let result = tokenize("_\x08A\x08A");
        assert_eq!(cell_string(&result), "A");
        let expected = ctx.man_page_bold.clone().with_attr(AttrMask::UNDERLINE);
        assert_eq!(result.cells[0].style, expected);
    }

    #[test]
    fn overstrike_bullets() {
        let result = tokenize("+\x08o");
        assert_eq!(cell_string(&result), "•");
        assert_eq!(result.cells[0].style, Style::DEFAULT);

        let result = tokenize("+\x08+\x08o\x08o");
        assert_eq!(cell_string(&result), "•");
        assert_eq!(result.cells[0].style, Style::DEFAULT);
    }

    #[test]
    fn unprintable_highlight_policy() {
        let ctx = StyleContext::default();
        let result = tokenize("a\u{fffd}b");
        assert_eq!(cell_string(&result), "a?b");
        assert_eq!(result.cells[1].style, ctx.unprintable_style());
    }

    #[test]
    fn unprintable_whitespace_policy() {
        let ctx = StyleContext {
            unprintable: UnprintableStyle::Whitespace,
            ..StyleContext::default()
        };
        let result = styled_runes_from_string(&Style::DEFAULT, "a\u{fffd}b", None, &ctx);
        assert_eq!(cell_string(&result), "a b");
        assert_eq!(result.cells[1].style, Style::DEFAULT);
    }

    #[test]
    fn control_chars_render_per_policy() {
        let result = tokenize("a\x01b");
        assert_eq!(cell_string(&result), "a?b");
    }

    #[test]
    fn strip_matches_cell_count() {
        let ctx = StyleContext::default();
        for raw in [
            "hello",
            "\x1b[31mcolored\x1b[0m",
            "a\tb",
            "_\x08u underlined",
            "A\x08A bold",
            "+\x08o bullet",
            "bad \u{fffd} utf8",
            "back\x08space",
            "上午下 wide",
            "\x1b]8;;http://x/\x1b\\link\x1b]8;;\x1b\\",
        ] {
            let cells = styled_runes_from_string(&Style::DEFAULT, raw, None, &ctx).cells;
            let plain = strip_formatting(raw, None, &ctx);
            assert_eq!(
                plain.chars().count(),
                cells.len(),
                "count mismatch for {raw:?}: plain={plain:?}"
            );
        }
    }

    #[test]
    fn strip_expands_tabs() {
        let ctx = StyleContext::default();
        assert_eq!(strip_formatting("\tx", None, &ctx), "        x");
        assert_eq!(strip_formatting("ab\tx", None, &ctx), "ab      x");
    }

    #[test]
    fn strip_removes_sgr() {
        let ctx = StyleContext::default();
        assert_eq!(strip_formatting("\x1b[33mhej\x1b[0m", None, &ctx), "hej");
    }

    #[test]
    fn strip_collapses_overstrike() {
        let ctx = StyleContext::default();
        assert_eq!(strip_formatting("A\x08AB\x08B", None, &ctx), "AB");
    }

    #[test]
    fn unterminated_csi_renders_as_unprintables() {
        let result = tokenize("a\x1b[31");
        // ESC renders as '?', the digits as themselves
        assert_eq!(cell_string(&result), "a?[31");
    }
}

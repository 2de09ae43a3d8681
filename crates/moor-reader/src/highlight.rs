#![forbid(unsafe_code)]

//! The syntax highlighting pass.
//!
//! Once ingest finishes, every line gets re-styled with ANSI SGR embedded,
//! using syntect. The plain form of each line must come out unchanged; only
//! styling is added.

use std::sync::Arc;

use syntect::easy::HighlightLines;
use syntect::highlighting::Theme;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::as_24_bit_terminal_escaped;
use tracing::{debug, info};

use crate::line::Line;

/// Don't spend time styling inputs bigger than this; scrolling a huge file
/// matters more than colors do.
const MAX_HIGHLIGHT_BYTES: usize = 1024 * 1024;

/// How many leading lines to check for preexisting formatting.
const FORMATTING_PROBE_LINES: usize = 100;

/// What the highlighting pass needs to know.
#[derive(Debug, Clone)]
pub struct HighlightSettings {
    pub syntax_set: Arc<SyntaxSet>,
    pub theme: Arc<Theme>,
    /// Forced language (extension or token); otherwise guessed from the file
    /// name and the first line.
    pub language: Option<String>,
}

/// Produce re-styled raw lines, or `None` when highlighting shouldn't happen:
/// no matching syntax, preformatted input, or oversized input.
#[must_use]
pub fn highlighted_lines(
    lines: &[Arc<Line>],
    file_name: Option<&str>,
    settings: &HighlightSettings,
) -> Option<Vec<String>> {
    if lines.is_empty() {
        return None;
    }

    let total_bytes: usize = lines.iter().map(|line| line.raw().len()).sum();
    if total_bytes > MAX_HIGHLIGHT_BYTES {
        debug!("Input too big to highlight: {total_bytes} bytes");
        return None;
    }

    if lines.iter().take(FORMATTING_PROBE_LINES).any(|line| {
        line.raw().contains('\x1b') || line.raw().contains('\x08')
    }) {
        debug!("Input already carries formatting, not highlighting it");
        return None;
    }

    let syntax = find_syntax(lines, file_name, settings)?;
    if syntax.name == "Plain Text" {
        return None;
    }
    info!("Highlighting as {}", syntax.name);

    let mut highlighter = HighlightLines::new(syntax, &settings.theme);
    let mut styled = Vec::with_capacity(lines.len());
    for line in lines {
        let with_newline = format!("{}\n", line.raw());
        let regions = match highlighter.highlight_line(&with_newline, &settings.syntax_set) {
            Ok(regions) => regions,
            Err(error) => {
                debug!("Highlighting failed: {error}");
                return None;
            }
        };
        let escaped = as_24_bit_terminal_escaped(&regions, false);
        styled.push(escaped.trim_end_matches('\n').to_string());
    }

    Some(styled)
}

fn find_syntax<'a>(
    lines: &[Arc<Line>],
    file_name: Option<&str>,
    settings: &'a HighlightSettings,
) -> Option<&'a SyntaxReference> {
    let syntax_set = settings.syntax_set.as_ref();

    if let Some(language) = &settings.language {
        if let Some(syntax) = syntax_set.find_syntax_by_token(language) {
            return Some(syntax);
        }
        info!("No syntax found for requested language {language}");
    }

    if let Some(name) = file_name {
        if let Some(extension) = name.rsplit('.').next() {
            if let Some(syntax) = syntax_set.find_syntax_by_extension(extension) {
                return Some(syntax);
            }
        }
    }

    let first_line = lines.first()?.raw();
    syntax_set.find_syntax_by_first_line(first_line)
}

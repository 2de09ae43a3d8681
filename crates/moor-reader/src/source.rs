#![forbid(unsafe_code)]

//! The line-access surface shared by readers and filtered views.

use crate::line::NumberedLine;
use crate::linemeta::{format_count, LineIndex};

/// A batch of consecutive lines plus a human status for the footer.
#[derive(Debug, Clone, Default)]
pub struct Lines {
    pub lines: Vec<NumberedLine>,
    /// "name: 1,234 lines 37%", "name: <empty>" and friends.
    pub status_text: String,
}

/// Read access to an ordered sequence of lines.
///
/// Implemented by [`crate::Reader`] and by the pager's filtering view, so
/// rendering and searching don't care whether a filter is active.
pub trait LineSource {
    /// How many lines are available right now. Monotonic; frozen once
    /// reading is done.
    fn line_count(&self) -> usize;

    /// One line, or `None` past the end.
    fn get_line(&self, index: LineIndex) -> Option<NumberedLine>;

    /// Up to `count` consecutive lines starting at `from`, plus status text.
    fn get_lines(&self, from: LineIndex, count: usize) -> Lines;
}

/// Build the footer status for a batch of returned lines.
///
/// `last_returned` is the index of the last line in the batch, within this
/// source's numbering.
#[must_use]
pub fn status_text(
    name: Option<&str>,
    total_count: usize,
    last_returned: Option<LineIndex>,
) -> String {
    let prefix = match name {
        Some(name) => format!("{name}: "),
        None => String::new(),
    };

    if total_count == 0 {
        return format!("{prefix}<empty>");
    }

    let lines_word = if total_count == 1 { "line" } else { "lines" };

    let shown_through = last_returned.map_or(0, |index| index.index() + 1);
    let percent = (shown_through * 100 / total_count).min(100);

    format!(
        "{prefix}{} {lines_word} {percent}%",
        format_count(total_count)
    )
}

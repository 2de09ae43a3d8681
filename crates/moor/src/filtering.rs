#![forbid(unsafe_code)]

//! A filtered view over the active reader.
//!
//! When no filter is active the view is transparent. With a filter, only
//! lines whose plain form matches are visible; their indices are renumbered
//! contiguously from zero while the user-facing line numbers stay the
//! original ones.

use moor_reader::{LineIndex, LineSource, Lines, NumberedLine, Reader};
use moor_search::Search;
use moor_text::StyleContext;

/// Walk backing lines in blocks so filtering doesn't clone the whole store.
const SCAN_BLOCK_SIZE: usize = 1_000;

/// The backing reader seen through an optional filter.
pub struct FilteringReader<'a> {
    pub backing: &'a Reader,
    pub filter: &'a Search,
    pub ctx: &'a StyleContext,
}

impl FilteringReader<'_> {
    /// Visit matching lines in order until the visitor says stop.
    /// The visitor gets (filtered index, line).
    fn scan_matches(&self, mut visit: impl FnMut(usize, NumberedLine) -> bool) {
        let mut backing_position = LineIndex::from_zero_based(0);
        let mut matched = 0usize;

        loop {
            let block = self.backing.get_lines(backing_position, SCAN_BLOCK_SIZE);
            if block.lines.is_empty() {
                return;
            }

            for line in block.lines {
                if self.filter.matches(line.plain(self.ctx)) {
                    let renumbered = NumberedLine {
                        index: LineIndex::from_zero_based(matched),
                        number: line.number,
                        line: line.line,
                    };
                    if !visit(matched, renumbered) {
                        return;
                    }
                    matched += 1;
                }
            }

            backing_position = backing_position.non_wrapping_add(SCAN_BLOCK_SIZE as isize);
        }
    }
}

impl LineSource for FilteringReader<'_> {
    fn line_count(&self) -> usize {
        if self.filter.inactive() {
            return self.backing.line_count();
        }

        let mut count = 0;
        self.scan_matches(|_, _| {
            count += 1;
            true
        });
        count
    }

    fn get_line(&self, index: LineIndex) -> Option<NumberedLine> {
        if self.filter.inactive() {
            return self.backing.get_line(index);
        }

        let mut found = None;
        self.scan_matches(|matched, line| {
            if matched == index.index() {
                found = Some(line);
                return false;
            }
            true
        });
        found
    }

    fn get_lines(&self, from: LineIndex, count: usize) -> Lines {
        if self.filter.inactive() {
            return self.backing.get_lines(from, count);
        }

        let mut batch = Vec::new();
        let mut total = 0usize;
        self.scan_matches(|matched, line| {
            total = matched + 1;
            if matched >= from.index() && batch.len() < count {
                batch.push(line);
            }
            // Keep going to the end so the status percentage is right
            true
        });

        let last_returned = batch.last().map(|line| line.index);
        Lines {
            status_text: moor_reader::source::status_text(
                self.backing.display_name(),
                total,
                last_returned,
            ),
            lines: batch,
        }
    }
}

/// What the pager is currently reading from: the help text, or the active
/// reader seen through the filter.
pub enum ActiveSource<'a> {
    Plain(&'a Reader),
    Filtered(FilteringReader<'a>),
}

impl LineSource for ActiveSource<'_> {
    fn line_count(&self) -> usize {
        match self {
            Self::Plain(reader) => reader.line_count(),
            Self::Filtered(filtered) => filtered.line_count(),
        }
    }

    fn get_line(&self, index: LineIndex) -> Option<NumberedLine> {
        match self {
            Self::Plain(reader) => reader.get_line(index),
            Self::Filtered(filtered) => filtered.get_line(index),
        }
    }

    fn get_lines(&self, from: LineIndex, count: usize) -> Lines {
        match self {
            Self::Plain(reader) => reader.get_lines(from, count),
            Self::Filtered(filtered) => filtered.get_lines(from, count),
        }
    }
}

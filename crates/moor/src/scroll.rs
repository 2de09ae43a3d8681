#![forbid(unsafe_code)]

//! Scroll-position algebra.
//!
//! A position is a line index plus a delta in screen rows. The delta can be
//! any integer until somebody looks at the position; canonicalisation then
//! walks it across wrapped sub-rows, clamps at the top, and pulls the view up
//! so the bottom row never sits past the last content row.
//!
//! The tricky part is that the wrapped row count of a line depends on the
//! line-number prefix width, which depends on the largest visible line
//! number, which depends on the canonical position. Canonicalisation
//! iterates until the prefix width matches the result.

use moor_reader::{LineIndex, LineSource};
use moor_text::CellWithMetadata;

use crate::pager::Pager;
use crate::screen_lines::wrap_cells;

/// A scroll position: an input line plus a screen-row delta.
///
/// `line_index` of `None` means the very top (also when there are no lines
/// at all). The name is for debug logs only.
#[derive(Debug, Clone, Copy)]
pub struct ScrollPosition {
    pub line_index: Option<LineIndex>,
    pub delta_screen_lines: isize,
    pub name: &'static str,
}

impl ScrollPosition {
    /// The top of the input.
    #[must_use]
    pub const fn top(name: &'static str) -> Self {
        Self {
            line_index: None,
            delta_screen_lines: 0,
            name,
        }
    }

    /// A position with the given line at the top of the screen.
    #[must_use]
    pub const fn from_index(name: &'static str, index: LineIndex) -> Self {
        Self {
            line_index: Some(index),
            delta_screen_lines: 0,
            name,
        }
    }

    /// Move up `n` screen rows. Clipping happens at canonicalisation.
    #[must_use]
    pub fn previous_line(self, n: usize) -> Self {
        Self {
            delta_screen_lines: self.delta_screen_lines - n as isize,
            ..self
        }
    }

    /// Move down `n` screen rows. Clipping happens at canonicalisation.
    #[must_use]
    pub fn next_line(self, n: usize) -> Self {
        Self {
            delta_screen_lines: self.delta_screen_lines + n as isize,
            ..self
        }
    }
}

impl Pager<'_> {
    /// Canonicalise the current scroll position in place.
    pub(crate) fn canonicalize_scroll_position(&mut self) {
        self.scroll_position = self.canonical_position(self.scroll_position);
    }

    /// The input line at the top of the screen, or `None` when there are no
    /// lines. Canonicalises as a side effect.
    pub fn line_index(&mut self) -> Option<LineIndex> {
        self.canonicalize_scroll_position();
        self.scroll_position.line_index
    }

    /// The wrap sub-row of the top line shown in the first screen row.
    /// Canonicalises as a side effect.
    pub fn delta_screen_lines(&mut self) -> usize {
        self.canonicalize_scroll_position();
        self.scroll_position.delta_screen_lines.max(0) as usize
    }

    /// Scroll so the last input line's last row sits on the bottom content
    /// row, and keep following the tail while more input arrives.
    pub fn scroll_to_end(&mut self) {
        let line_count = self.reader().line_count();
        let Some(last) = LineIndex::from_length(line_count) else {
            self.scroll_position = ScrollPosition::top("scrollToEnd");
            return;
        };

        self.scroll_position = ScrollPosition {
            line_index: Some(last),
            // Any huge value lands on the last wrap row of the last line
            delta_screen_lines: isize::MAX / 2,
            name: "scrollToEnd",
        };

        if !self.active_reader().reading_done() {
            // Keep the view pinned to the end while input keeps arriving
            self.set_target_line(Some(LineIndex::MAX));
        }
    }

    /// Whether the bottom content row shows the last input line.
    pub fn is_scrolled_to_end(&mut self) -> bool {
        let count = self.reader().line_count();
        let Some(last) = LineIndex::from_length(count) else {
            return true;
        };

        let last_visible = self.last_visible_position();
        last_visible.line_index == Some(last)
    }

    /// The position of the bottom visible screen row, read off the rendered
    /// rows. Canonicalising `top + height - 1` would not work here: the
    /// bottom clamp treats every position as a screen top and would pull it
    /// back up.
    pub(crate) fn last_visible_position(&mut self) -> ScrollPosition {
        let rendered = self.render_lines();
        match rendered.lines.last() {
            Some(last) => ScrollPosition {
                line_index: last.input_line_index,
                delta_screen_lines: last.wrap_index as isize,
                name: "Last visible position",
            },
            None => ScrollPosition::top("Last visible position"),
        }
    }

    /// Positions compare equal when they canonicalise the same.
    pub(crate) fn scroll_positions_equal(&mut self, a: ScrollPosition, b: ScrollPosition) -> bool {
        let a = self.canonical_position(a);
        let b = self.canonical_position(b);
        a.line_index == b.line_index && a.delta_screen_lines == b.delta_screen_lines
    }

    /// Compute the canonical form of a position against the current reader,
    /// screen size, wrap flag and line-number visibility.
    pub(crate) fn canonical_position(&self, position: ScrollPosition) -> ScrollPosition {
        let source = self.reader();
        let line_count = source.line_count();
        if line_count == 0 {
            return ScrollPosition {
                line_index: None,
                delta_screen_lines: 0,
                name: position.name,
            };
        }

        let start_index = position
            .line_index
            .map_or(0, LineIndex::index)
            .min(line_count - 1);
        let start_delta = position.delta_screen_lines;

        // The prefix width both depends on and determines the result; peek
        // one iteration and only accept when the width matches. This is what
        // keeps scrolling across 999 -> 1,000 from blowing up.
        let mut prefix_width = self.prefix_width_at(&source, start_index, line_count);
        let mut result = (start_index, start_delta.max(0) as usize);
        for _ in 0..10 {
            result = self.walk_to_canonical(&source, start_index, start_delta, prefix_width);
            let converged_width = self.prefix_width_at(&source, result.0, line_count);
            if converged_width == prefix_width {
                break;
            }
            prefix_width = converged_width;
        }

        ScrollPosition {
            line_index: Some(LineIndex::from_zero_based(result.0)),
            delta_screen_lines: result.1 as isize,
            name: position.name,
        }
    }

    /// Walk a (line, delta) pair to 0 <= delta < rows(line), clamp at the
    /// top, then pull the view up until the window is full or we hit the top.
    fn walk_to_canonical(
        &self,
        source: &dyn LineSource,
        start_index: usize,
        start_delta: isize,
        prefix_width: usize,
    ) -> (usize, usize) {
        let line_count = source.line_count();
        let mut index = start_index;
        let mut delta = start_delta;

        // Backward across wrapped sub-rows
        while delta < 0 {
            if index == 0 {
                delta = 0;
                break;
            }
            index -= 1;
            delta += self.rows_in_line(source, index, prefix_width) as isize;
        }

        // Forward across wrapped sub-rows
        loop {
            let rows = self.rows_in_line(source, index, prefix_width) as isize;
            if delta < rows {
                break;
            }
            if index + 1 >= line_count {
                delta = rows - 1;
                break;
            }
            delta -= rows;
            index += 1;
        }
        let mut delta = delta.max(0) as usize;

        // Bottom clamp: when there are fewer content rows below us than the
        // window holds, move the top up until the last row lands on the
        // bottom (or we reach the very top).
        let visible_height = self.visible_height();
        let mut rows_below = self
            .rows_in_line(source, index, prefix_width)
            .saturating_sub(delta);
        let mut probe = index + 1;
        while rows_below < visible_height && probe < line_count {
            rows_below += self.rows_in_line(source, probe, prefix_width);
            probe += 1;
        }

        let mut deficit = visible_height.saturating_sub(rows_below);
        while deficit > 0 {
            if delta > 0 {
                let take = delta.min(deficit);
                delta -= take;
                deficit -= take;
            } else if index == 0 {
                break;
            } else {
                index -= 1;
                delta = self.rows_in_line(source, index, prefix_width) - 1;
                deficit -= 1;
            }
        }

        (index, delta)
    }

    /// How many screen rows one input line takes with the current wrap
    /// setting and the given line-number prefix width.
    fn rows_in_line(&self, source: &dyn LineSource, index: usize, prefix_width: usize) -> usize {
        if !self.wrap_long_lines {
            return 1;
        }

        let Some(line) = source.get_line(LineIndex::from_zero_based(index)) else {
            return 1;
        };

        let (screen_width, _) = self.screen.size();
        let available = screen_width.saturating_sub(prefix_width).max(1);

        // Counting wrap rows only needs rune widths and whitespace, so plain
        // cells are enough; the renderer's wrap routine keeps the counts in
        // sync with what actually gets drawn.
        let cells: Vec<CellWithMetadata> = line
            .plain(&self.ctx)
            .chars()
            .map(|rune| CellWithMetadata::new(rune, moor_style::Style::DEFAULT))
            .collect();
        wrap_cells(&cells, available).len()
    }

    /// The line-number prefix width to use when the given line is at the top
    /// of the screen: sized for the largest line number that could be
    /// visible from there.
    pub(crate) fn prefix_width_at(
        &self,
        source: &dyn LineSource,
        top_index: usize,
        line_count: usize,
    ) -> usize {
        if !self.show_line_numbers {
            return 0;
        }

        let bottom_estimate = (top_index + self.visible_height())
            .min(line_count)
            .saturating_sub(1);
        let number = source
            .get_line(LineIndex::from_zero_based(bottom_estimate))
            .map_or_else(
                || LineIndex::from_zero_based(bottom_estimate).number(),
                |line| line.number,
            );

        // Minimum 4: space for 3 digits plus one whitespace
        (number.format().chars().count() + 1).max(4)
    }
}

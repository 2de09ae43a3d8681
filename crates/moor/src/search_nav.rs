#![forbid(unsafe_code)]

//! Driving the scroll position from search results.
//!
//! Besides the obvious vertical jumps, a hit can sit off-screen to the right
//! of a long line; in that case we hide line numbers and scroll sideways
//! until it shows. Hits get centered vertically when possible.

use moor_reader::{LineIndex, LineSource};
use tracing::{info, warn};

use crate::linescan::{find_first_hit, SearchDirection};
use crate::modes::PagerMode;
use crate::pager::Pager;
use crate::scroll::ScrollPosition;

impl Pager<'_> {
    /// Find the first hit from `start`. `before` is exclusive.
    pub(crate) fn find_hit(
        &mut self,
        start: LineIndex,
        before: Option<LineIndex>,
        direction: SearchDirection,
    ) -> Option<LineIndex> {
        let source = self.reader();
        find_first_hit(&source, &self.search, &self.ctx, start, before, direction)
    }

    /// Scroll to the nearest hit while the user is typing the search string.
    pub(crate) fn scroll_to_search_hits(&mut self) {
        if self.search.inactive() {
            // This is not a search
            return;
        }

        if self.search_hit_is_visible() {
            // Already on-screen
            return;
        }

        if self.scroll_right_to_search_hits() {
            // Found it to the right, done!
            return;
        }

        let Some(top) = self.line_index() else {
            // No lines to search
            return;
        };

        let mut first_hit = self.find_hit(top, None, SearchDirection::Forward);
        if first_hit.is_none() && !top.is_zero() {
            // Try again from the top
            first_hit = self.find_hit(LineIndex::from_zero_based(0), Some(top), SearchDirection::Forward);
        }
        let Some(first_hit) = first_hit else {
            // No match, give up
            return;
        };

        self.scroll_position = ScrollPosition::from_index("scrollToSearchHits", first_hit);

        self.left_column = 0;
        self.show_line_numbers = self.show_line_numbers_pref;
        if !self.search_hit_is_visible() {
            self.scroll_right_to_search_hits();
        }
        self.center_search_hits_vertically();
    }

    /// Scroll to the next hit, when the user presses 'n'.
    pub(crate) fn scroll_to_next_search_hit(&mut self) {
        if self.search.inactive() {
            // Nothing to search for, never mind
            return;
        }

        if self.reader().line_count() == 0 {
            // Nothing to search in, never mind
            return;
        }

        if self.scroll_right_to_search_hits() {
            // Found it to the right, done!
            return;
        }

        let viewing = matches!(self.mode, PagerMode::Viewing);
        if viewing && self.is_scrolled_to_end() {
            self.mode = PagerMode::NotFound;
            return;
        }

        let first_search_index = if viewing {
            // Start searching on the first line below the bottom of the
            // screen
            self.last_visible_position()
                .line_index
                .map_or_else(|| LineIndex::from_zero_based(0), |last| last.non_wrapping_add(1))
        } else {
            // Not found: restart from the top
            self.mode = PagerMode::Viewing;
            LineIndex::from_zero_based(0)
        };

        let Some(hit) = self.find_hit(first_search_index, None, SearchDirection::Forward) else {
            self.mode = PagerMode::NotFound;
            return;
        };
        self.scroll_position = ScrollPosition::from_index("scrollToNextSearchHit", hit);

        // Don't let any search hit scroll out of sight
        self.set_target_line(None);

        self.left_column = 0;
        self.show_line_numbers = self.show_line_numbers_pref;
        if !self.search_hit_is_visible() {
            self.scroll_right_to_search_hits();
        }
        self.center_search_hits_vertically();
    }

    /// Scroll backwards to the nearest hit while the user is typing.
    pub(crate) fn scroll_to_search_hits_backwards(&mut self) {
        if self.search.inactive() {
            return;
        }

        if self.search_hit_is_visible() {
            return;
        }

        if self.scroll_left_to_search_hits() {
            // Found it to the left, done!
            return;
        }

        let Some(top) = self.line_index() else {
            return;
        };

        let mut first_hit = self.find_hit(top, None, SearchDirection::Backward);
        if first_hit.is_none() {
            let Some(last) = LineIndex::from_length(self.reader().line_count()) else {
                // We had lines to search a moment ago; lines never go away
                warn!("Wrapped backwards search had no lines to search");
                return;
            };

            let last_visible = self
                .last_visible_position()
                .line_index
                .unwrap_or_else(|| LineIndex::from_zero_based(0));
            if top == last_visible {
                // No match, can't wrap, give up
                return;
            }

            // Try again from the bottom
            first_hit = self.find_hit(last, Some(top), SearchDirection::Backward);
        }
        let Some(first_hit) = first_hit else {
            return;
        };

        // Scroll so that the hit is at the bottom of the screen. With a
        // visible height of 1 that means scrolling 0 steps.
        let hit_position = ScrollPosition::from_index("scrollToSearchHitsBackwards", first_hit);
        let rows_up = self.visible_height().saturating_sub(1);
        self.scroll_position = hit_position.previous_line(rows_up);

        self.scroll_max_right();
        if !self.search_hit_is_visible() {
            self.scroll_left_to_search_hits();
        }
        self.center_search_hits_vertically();
    }

    /// Scroll backwards to the previous hit, when the user presses 'p'.
    pub(crate) fn scroll_to_previous_search_hit(&mut self) {
        if self.search.inactive() {
            return;
        }

        if self.reader().line_count() == 0 {
            return;
        }

        if self.scroll_left_to_search_hits() {
            // Found it to the left, done!
            return;
        }

        let viewing = matches!(self.mode, PagerMode::Viewing);
        let first_search_index = if viewing {
            let Some(top) = self.line_index() else {
                return;
            };
            if top.is_zero() {
                // Already at the top, can't go further up
                self.mode = PagerMode::NotFound;
                return;
            }

            // Start searching on the first line above the top of the screen
            top.non_wrapping_add(-1)
        } else {
            // Not found: restart from the bottom
            self.mode = PagerMode::Viewing;
            let Some(last) = LineIndex::from_length(self.reader().line_count()) else {
                return;
            };
            last
        };

        let Some(hit) = self.find_hit(first_search_index, None, SearchDirection::Backward) else {
            self.mode = PagerMode::NotFound;
            return;
        };
        self.scroll_position = ScrollPosition::from_index("scrollToPreviousSearchHit", hit);

        // Don't let any search hit scroll out of sight
        self.set_target_line(None);

        // Prefer hits to the right
        self.scroll_max_right();
        if !self.search_hit_is_visible() {
            self.scroll_left_to_search_hits();
        }
        self.center_search_hits_vertically();
    }

    /// True if the first cell of any search hit is on screen right now.
    ///
    /// A longer hit may still continue off-screen to the right; the user can
    /// scroll manually for the rest.
    pub(crate) fn search_hit_is_visible(&mut self) -> bool {
        let rendered = self.render_lines();
        rendered
            .lines
            .iter()
            .any(|row| row.cells.iter().any(|cell| cell.starts_search_hit))
    }

    /// Scroll vertically so the visible hits sit mid-screen. Not supported
    /// while wrapping.
    fn center_search_hits_vertically(&mut self) {
        if self.wrap_long_lines {
            // Not supported when wrapping, maybe some day
            return;
        }

        loop {
            let rendered = self.render_lines();

            let mut first_hit_row = None;
            let mut last_hit_row = None;
            for (row_index, line) in rendered.input_lines.iter().enumerate() {
                if !self.search.matches(line.plain(&self.ctx)) {
                    continue;
                }
                if first_hit_row.is_none() {
                    first_hit_row = Some(row_index);
                }
                last_hit_row = Some(row_index);
            }

            let (Some(first), Some(last)) = (first_hit_row, last_hit_row) else {
                warn!("No hits found while centering, how did we get here?");
                return;
            };

            let center_hit_row = (first + last) / 2;
            // With a visible height of 1 the center screen row is 0
            let center_screen_row = self.visible_height().saturating_sub(1) / 2;

            let new_position = if center_hit_row >= center_screen_row {
                self.scroll_position.next_line(center_hit_row - center_screen_row)
            } else {
                self.scroll_position
                    .previous_line(center_screen_row - center_hit_row)
            };

            if self.scroll_positions_equal(self.scroll_position, new_position) {
                // No change, done!
                return;
            }
            self.scroll_position = self.canonical_position(new_position);
        }
    }

    /// Scroll as far right as the content allows. If we're already too far
    /// right, this scrolls left.
    pub(crate) fn scroll_max_right(&mut self) {
        if self.wrap_long_lines {
            // No horizontal scrolling when wrapping
            return;
        }

        // Render fully left first so we know how much space line numbers
        // take
        self.left_column = 0;
        self.show_line_numbers = self.show_line_numbers_pref;
        let rendered = self.render_lines();

        // Widest line in screen cells; some runes are double-width
        let widest = rendered
            .input_lines
            .iter()
            .map(|line| line.display_width(&self.ctx))
            .max()
            .unwrap_or(0);

        let (screen_width, _) = self.screen.size();

        let mut available = screen_width.saturating_sub(rendered.number_prefix_width);
        if widest <= available {
            // Everything fits, we're now max scrolled right
            return;
        }

        self.show_line_numbers = false;
        available = screen_width;
        if widest <= available {
            // Everything fits with line numbers off, this is max right
            return;
        }

        // With a 10 wide line and 10 available columns, start at column 0
        self.left_column = widest - available;
    }

    /// Scroll right looking for search hits. Returns whether any were found.
    pub(crate) fn scroll_right_to_search_hits(&mut self) -> bool {
        if self.wrap_long_lines {
            // No horizontal scrolling when wrapping
            return false;
        }

        let restore_show_line_numbers = self.show_line_numbers;
        let restore_left_column = self.left_column;

        let (screen_width, _) = self.screen.size();

        let rendered = self.render_lines();
        let number_prefix_width = rendered.number_prefix_width;
        let widest = rendered
            .input_lines
            .iter()
            .map(|line| line.display_width(&self.ctx))
            .max()
            .unwrap_or(0);

        // With a 10 wide screen and a 15 wide line, the leftmost screen
        // column can at most be 5
        let max_leftmost_column = widest.saturating_sub(screen_width);

        // If we have line numbers and disable them, do any new hits appear?
        if number_prefix_width > 0 {
            // The rightmost column can be covered by a scroll-right hint, so
            // one column less than the prefix width gets revealed
            let first_revealed = screen_width.saturating_sub(number_prefix_width + 1);
            if first_revealed == 0 {
                info!("Screen too narrow ({screen_width}) to disable line numbers for search hits");
                return false;
            }

            self.show_line_numbers = false;
            let revealed = self.render_lines();
            for row in &revealed.lines {
                let mut column = 0;
                for cell in &row.cells {
                    if column >= first_revealed && cell.starts_search_hit {
                        // Found a search hit on screen!
                        return true;
                    }
                    column += cell.width();
                }
            }
            self.show_line_numbers = restore_show_line_numbers;
        }

        while self.left_column < max_leftmost_column {
            // The last visible column could be covered by a scroll-right
            // hint, hence the extra minus one
            let first_not_visible =
                (self.left_column + screen_width).saturating_sub(number_prefix_width + 1);
            if first_not_visible < 1 {
                info!("Screen narrower than the number prefix, not scrolling right for hits");
                self.show_line_numbers = restore_show_line_numbers;
                self.left_column = restore_left_column;
                return false;
            }

            // Minus one to account for the scroll-left hint that will cover
            // the first column after scrolling
            let scroll_to_column = (first_not_visible - 1).min(max_leftmost_column);

            self.show_line_numbers = false;
            self.left_column = scroll_to_column;

            if self.search_hit_is_visible() {
                // Found it!
                return true;
            }
        }

        // Can't scroll right, pretend nothing happened
        self.show_line_numbers = restore_show_line_numbers;
        self.left_column = restore_left_column;
        false
    }

    /// Scroll left looking for search hits. Returns whether any were found.
    pub(crate) fn scroll_left_to_search_hits(&mut self) -> bool {
        if self.wrap_long_lines {
            // No horizontal scrolling when wrapping
            return false;
        }

        let restore_left_column = self.left_column;
        let restore_show_line_numbers = self.show_line_numbers;

        let (screen_width, _) = self.screen.size();

        // If we go max left, which column will be the rightmost visible one?
        let full_left_rightmost = {
            self.show_line_numbers = self.show_line_numbers_pref;
            self.left_column = 0;
            let rendered = self.render_lines();
            self.left_column = restore_left_column;
            self.show_line_numbers = restore_show_line_numbers;

            // The rightmost column can be covered by a scroll-right hint
            (screen_width as isize) - 2 - rendered.number_prefix_width as isize
        };

        if full_left_rightmost < 0 {
            info!("Screen too narrow ({screen_width}) to scroll left for search hits");
            return false;
        }
        let full_left_rightmost = full_left_rightmost as usize;

        // Keep scrolling left until we either find a hit, or reach the
        // leftmost column with the user's line number preference restored
        while self.left_column > 0 || self.show_line_numbers != self.show_line_numbers_pref {
            // The current leftmost column could be covered by a scroll-left
            // hint, so treat it as not visible
            let last_not_visible = self.left_column;

            if last_not_visible <= full_left_rightmost {
                // Going max left will show the column we want
                self.show_line_numbers = self.show_line_numbers_pref;
                self.left_column = 0;
            } else {
                // Scroll left one screen, leaving room for the scroll-left
                // hint to cover our first column
                self.left_column = (last_not_visible + 2).saturating_sub(screen_width);
                // If showing line numbers were possible we would have taken
                // the other branch
                self.show_line_numbers = false;
            }

            if self.search_hit_is_visible() {
                // Found it!
                return true;
            }
        }

        // Scrolling left didn't find anything, pretend nothing happened
        self.show_line_numbers = restore_show_line_numbers;
        self.left_column = restore_left_column;
        false
    }
}

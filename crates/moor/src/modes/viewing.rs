#![forbid(unsafe_code)]

//! The default mode: scrolling around.

use moor_screen::KeyCode;
use tracing::debug;

use crate::editor::handle_editing_request;
use crate::linescan::SearchDirection;
use crate::modes::{FilterModeState, GotoLineState, InfoState, PagerMode, SearchModeState};
use crate::pager::{Pager, PreHelpState};
use crate::scroll::ScrollPosition;

pub fn on_key(pager: &mut Pager, key: KeyCode) {
    match key {
        KeyCode::Escape => pager.quit(),

        KeyCode::Up => {
            // Clipping is done when rendering
            pager.scroll_position = pager.scroll_position.previous_line(1);
            pager.handle_scrolled_up();
        }

        KeyCode::Down | KeyCode::Enter => {
            // Clipping is done when rendering
            pager.scroll_position = pager.scroll_position.next_line(1);
            pager.handle_scrolled_down();
        }

        KeyCode::Right => pager.move_right(pager.side_scroll_amount as isize),
        KeyCode::Left => pager.move_right(-(pager.side_scroll_amount as isize)),
        KeyCode::AltRight => pager.move_right(1),
        KeyCode::AltLeft => pager.move_right(-1),

        KeyCode::Home => {
            pager.scroll_position = ScrollPosition::top("Pager scroll position");
            pager.handle_scrolled_up();
        }
        KeyCode::End => pager.scroll_to_end(),

        KeyCode::PgUp => {
            let page = pager.visible_height();
            pager.scroll_position = pager.scroll_position.previous_line(page);
            pager.handle_scrolled_up();
        }
        KeyCode::PgDown => {
            let page = pager.visible_height();
            pager.scroll_position = pager.scroll_position.next_line(page);
            pager.handle_scrolled_down();
        }

        other => debug!("Unhandled key event {other:?}"),
    }
}

pub fn on_rune(pager: &mut Pager, rune: char) {
    match rune {
        'q' => pager.quit(),

        'v' => handle_editing_request(pager),

        'h' => {
            if pager.is_showing_help {
                return;
            }

            pager.pre_help_state = Some(Box::new(PreHelpState {
                scroll_position: pager.scroll_position,
                left_column: pager.left_column,
                target_line: pager.target_line,
            }));
            pager.scroll_position = ScrollPosition::top("Pager scroll position");
            pager.left_column = 0;
            pager.set_target_line(None);
            pager.is_showing_help = true;
        }

        '=' => pager.show_status_bar = !pager.show_status_bar,

        // '\x10' is Ctrl-p, should scroll up one line
        'k' | 'y' | '\x10' => {
            pager.scroll_position = pager.scroll_position.previous_line(1);
            pager.handle_scrolled_up();
        }

        // '\x0e' is Ctrl-n, should scroll down one line
        'j' | 'e' | '\x0e' => {
            pager.scroll_position = pager.scroll_position.next_line(1);
            pager.handle_scrolled_down();
        }

        '<' => {
            pager.scroll_position = ScrollPosition::top("Pager scroll position");
            pager.handle_scrolled_up();
        }

        '>' | 'G' => pager.scroll_to_end(),

        'f' | ' ' => {
            let page = pager.visible_height();
            pager.scroll_position = pager.scroll_position.next_line(page);
            pager.handle_scrolled_down();
        }

        'b' => {
            let page = pager.visible_height();
            pager.scroll_position = pager.scroll_position.previous_line(page);
            pager.handle_scrolled_up();
        }

        // '\x15' is Ctrl-u, should work like just 'u'
        'u' | '\x15' => {
            let half_page = pager.visible_height() / 2;
            pager.scroll_position = pager.scroll_position.previous_line(half_page);
            pager.handle_scrolled_up();
        }

        // '\x04' is Ctrl-d, should work like just 'd'
        'd' | '\x04' => {
            let half_page = pager.visible_height() / 2;
            pager.scroll_position = pager.scroll_position.next_line(half_page);
            pager.handle_scrolled_down();
        }

        '/' => {
            pager.mode = PagerMode::Search(SearchModeState::new(
                SearchDirection::Forward,
                pager.scroll_position,
                pager.search_history.entries().len(),
            ));
            pager.set_target_line(None);
            pager.search.stop();
        }

        '?' => {
            pager.mode = PagerMode::Search(SearchModeState::new(
                SearchDirection::Backward,
                pager.scroll_position,
                pager.search_history.entries().len(),
            ));
            pager.set_target_line(None);
            pager.search.stop();
        }

        '&' => {
            // Filtering the help text is not supported
            if !pager.is_showing_help {
                pager.mode = PagerMode::Filter(FilterModeState::new());
                pager.search.stop();
                pager.filter.stop();
            }
        }

        'g' => {
            pager.mode = PagerMode::GotoLine(GotoLineState::new());
            pager.set_target_line(None);
        }

        ':' => {
            if pager.readers.len() > 1 {
                pager.mode = PagerMode::ColonCommand;
                pager.set_target_line(None);
            } else {
                pager.mode = PagerMode::Info(InfoState::new(
                    "Pass more files on the command line to be able to switch between them.",
                ));
            }
        }

        // Should match the not-found mode's bindings
        'n' => pager.scroll_to_next_search_hit(),
        'p' | 'N' => pager.scroll_to_previous_search_hit(),

        'm' => {
            pager.mode = PagerMode::Mark;
            pager.set_target_line(None);
        }

        '\'' => {
            pager.mode = PagerMode::JumpToMark;
            pager.set_target_line(None);
        }

        'w' => {
            pager.wrap_long_lines = !pager.wrap_long_lines;
            let message = if pager.wrap_long_lines {
                "Word wrapping enabled"
            } else {
                "Word wrapping disabled"
            };
            pager.mode = PagerMode::Info(InfoState::new(message));
        }

        '\x14' => pager.cycle_tab_size(), // Ctrl-t

        '\x01' => {
            // Ctrl-a: back to the left edge
            pager.left_column = 0;
            if !pager.show_line_numbers {
                // Numbers were hidden for side scrolling; bring them back if
                // the user wants them
                pager.show_line_numbers = pager.show_line_numbers_pref;
            }
        }

        other => debug!("Unhandled rune keypress {other:?}/0x{:08x}", other as u32),
    }
}

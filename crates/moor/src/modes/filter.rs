#![forbid(unsafe_code)]

//! Filtering: show only lines matching what the user types.
//!
//! The filter doubles as the search pattern so matches get highlighted.
//! Esc drops the filter, Enter keeps it. Scrolling keys work as usual while
//! the filter box is open.

use moor_screen::KeyCode;
use tracing::debug;

use crate::modes::{viewing, FilterModeState, PagerMode};
use crate::pager::Pager;

pub fn on_rune(pager: &mut Pager, mut state: FilterModeState, rune: char) {
    state.input_box.handle_rune(rune);
    update_filter_pattern(pager, &state);
    pager.mode = PagerMode::Filter(state);
}

pub fn on_key(pager: &mut Pager, mut state: FilterModeState, key: KeyCode) {
    if state.input_box.handle_key(key) {
        update_filter_pattern(pager, &state);
        pager.mode = PagerMode::Filter(state);
        return;
    }

    match key {
        KeyCode::Enter => {
            pager.mode = PagerMode::Viewing;
        }

        KeyCode::Escape => {
            pager.mode = PagerMode::Viewing;
            pager.filter.stop();
            pager.search.stop();
        }

        KeyCode::Up | KeyCode::Down | KeyCode::PgUp | KeyCode::PgDown => {
            // Scrolling works while the filter box is open
            viewing::on_key(pager, key);
            pager.mode = PagerMode::Filter(state);
        }

        other => {
            debug!("Unhandled filter key event {other:?}");
            pager.mode = PagerMode::Filter(state);
        }
    }
}

fn update_filter_pattern(pager: &mut Pager, state: &FilterModeState) {
    pager.filter.set(state.input_box.text());
    pager.search.set(state.input_box.text());
}

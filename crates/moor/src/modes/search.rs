#![forbid(unsafe_code)]

//! Incremental search with history navigation.
//!
//! Every edit recompiles the pattern and scrolls to the nearest hit in the
//! search direction. Enter keeps the new position, Esc restores the one from
//! before the search started. Up/Down walk the history ring; any edit resets
//! the history cursor and remembers what the user typed.

use moor_screen::KeyCode;
use tracing::debug;

use crate::linescan::SearchDirection;
use crate::modes::{PagerMode, SearchModeState};
use crate::pager::Pager;

pub fn on_rune(pager: &mut Pager, mut state: SearchModeState, rune: char) {
    // Any typing resets the history cursor
    state.history_index = pager.search_history.entries().len();
    state.input_box.handle_rune(rune);
    state.user_edited_text = state.input_box.text().to_string();
    update_search_pattern(pager, &state);
    pager.mode = PagerMode::Search(state);
}

pub fn on_key(pager: &mut Pager, mut state: SearchModeState, key: KeyCode) {
    if state.input_box.handle_key(key) {
        state.history_index = pager.search_history.entries().len();
        state.user_edited_text = state.input_box.text().to_string();
        update_search_pattern(pager, &state);
        pager.mode = PagerMode::Search(state);
        return;
    }

    match key {
        KeyCode::Enter => {
            pager.search_history.add_entry(state.input_box.text());
            pager.mode = PagerMode::Viewing;
        }

        KeyCode::Escape => {
            pager.search_history.add_entry(state.input_box.text());
            pager.mode = PagerMode::Viewing;
            pager.scroll_position = state.initial_scroll_position;
        }

        KeyCode::PgUp | KeyCode::PgDown => {
            pager.search_history.add_entry(state.input_box.text());
            pager.mode = PagerMode::Viewing;
            pager.on_key(key);
        }

        KeyCode::Up => {
            move_history_index(pager, &mut state, -1);
            pager.mode = PagerMode::Search(state);
        }

        KeyCode::Down => {
            move_history_index(pager, &mut state, 1);
            pager.mode = PagerMode::Search(state);
        }

        other => {
            debug!("Unhandled search key event {other:?}");
            pager.mode = PagerMode::Search(state);
        }
    }
}

fn update_search_pattern(pager: &mut Pager, state: &SearchModeState) {
    pager.search.set(state.input_box.text());

    match state.direction {
        SearchDirection::Backward => pager.scroll_to_search_hits_backwards(),
        SearchDirection::Forward => pager.scroll_to_search_hits(),
    }
}

fn move_history_index(pager: &mut Pager, state: &mut SearchModeState, delta: isize) {
    let history_length = pager.search_history.entries().len();
    if history_length == 0 {
        return;
    }

    let moved = state.history_index as isize + delta;
    state.history_index = moved.clamp(0, history_length as isize) as usize;

    if state.history_index == history_length {
        // Past the end: back to whatever the user typed last
        state.input_box.set_text(&state.user_edited_text.clone());
    } else {
        let entry = pager.search_history.entries()[state.history_index].clone();
        state.input_box.set_text(&entry);
    }
    update_search_pattern(pager, state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::ScrollPosition;
    use moor_reader::Reader;
    use moor_screen::FakeScreen;

    /// Incrementally searching for something below the screen must scroll
    /// there right away.
    #[test]
    fn incremental_search_scrolls_to_first_hidden_hit() {
        let reader = Reader::from_text(None, "a\nab\nabc\nabcd\nabcde\nabcdef\n");
        let mut screen = FakeScreen::new(20, 5);
        let mut pager = Pager::new(&mut screen, vec![reader]);

        let mut state = SearchModeState::new(
            SearchDirection::Forward,
            pager.scroll_position,
            pager.search_history.entries().len(),
        );
        state.input_box.set_text("abcde");
        update_search_pattern(&mut pager, &state);
        pager.mode = PagerMode::Search(state);

        assert_eq!(pager.mode.name(), "Search");
        assert_eq!(pager.line_index().unwrap().index(), 2);
    }

    /// Arrow up recalls history; arrow down past the end restores what the
    /// user was typing.
    #[test]
    fn history_navigation_round_trip() {
        let reader = Reader::from_text(None, "apa\nbepa\n");
        let mut screen = FakeScreen::new(20, 5);
        let mut pager = Pager::new(&mut screen, vec![reader]);
        pager.search_history.add_entry("old-search");

        let mut state = SearchModeState::new(
            SearchDirection::Forward,
            ScrollPosition::top("test"),
            pager.search_history.entries().len(),
        );
        for rune in "bep".chars() {
            state.input_box.handle_rune(rune);
        }
        state.user_edited_text = state.input_box.text().to_string();

        move_history_index(&mut pager, &mut state, -1);
        assert_eq!(state.input_box.text(), "old-search");

        move_history_index(&mut pager, &mut state, 1);
        assert_eq!(state.input_box.text(), "bep");
    }

    /// Esc restores the position from before the search started.
    #[test]
    fn escape_restores_initial_position() {
        let text = (0..50).map(|i| format!("line {i}\n")).collect::<String>();
        let reader = Reader::from_text(None, &text);
        let mut screen = FakeScreen::new(20, 5);
        let mut pager = Pager::new(&mut screen, vec![reader]);

        let initial = pager.scroll_position;
        let mut state = SearchModeState::new(
            SearchDirection::Forward,
            initial,
            pager.search_history.entries().len(),
        );
        state.input_box.set_text("line 40");
        update_search_pattern(&mut pager, &state);
        assert_eq!(pager.line_index().unwrap().index(), 40);

        on_key(&mut pager, state, moor_screen::KeyCode::Escape);
        assert_eq!(pager.mode.name(), "Viewing");
        assert_eq!(pager.line_index().unwrap().index(), 0);
    }
}

#![forbid(unsafe_code)]

//! Go to a line number.

use moor_reader::LineIndex;
use moor_screen::KeyCode;
use tracing::debug;

use crate::modes::{GotoLineState, PagerMode};
use crate::pager::Pager;
use crate::scroll::ScrollPosition;

pub fn on_key(pager: &mut Pager, mut state: GotoLineState, key: KeyCode) {
    if state.input_box.handle_key(key) {
        pager.mode = PagerMode::GotoLine(state);
        return;
    }

    match key {
        KeyCode::Enter => {
            go_to_line(pager, state.input_box.text());
            pager.mode = PagerMode::Viewing;
        }

        KeyCode::Escape => {
            pager.mode = PagerMode::Viewing;
        }

        other => {
            debug!("Unhandled goto key event {other:?}, treating it as a viewing key");
            pager.mode = PagerMode::Viewing;
            pager.on_key(other);
        }
    }
}

pub fn on_rune(pager: &mut Pager, mut state: GotoLineState, rune: char) {
    match rune {
        'q' => {
            pager.mode = PagerMode::Viewing;
        }

        'g' => {
            // "gg" goes to the top, like in less
            pager.scroll_position = ScrollPosition::top("Pager scroll position");
            pager.handle_scrolled_up();
            pager.mode = PagerMode::Viewing;
        }

        _ => {
            state.input_box.handle_rune(rune);
            pager.mode = PagerMode::GotoLine(state);
        }
    }
}

fn go_to_line(pager: &mut Pager, text: &str) {
    let Ok(line_number) = text.parse::<usize>() else {
        debug!("Got non-number goto text {text:?}");
        return;
    };
    if line_number < 1 {
        debug!("Got non-positive goto line number {line_number}");
        return;
    }

    let target = LineIndex::from_one_based(line_number);
    pager.scroll_position = ScrollPosition::from_index("onGotoLineKey", target);
    pager.set_target_line(Some(target));
}

#[cfg(test)]
mod tests {
    use super::*;
    use moor_reader::Reader;
    use moor_screen::FakeScreen;

    #[test]
    fn enter_goes_to_the_typed_line() {
        let text = (0..100).map(|i| format!("line {i}\n")).collect::<String>();
        let reader = Reader::from_text(None, &text);
        let mut screen = FakeScreen::new(20, 10);
        let mut pager = Pager::new(&mut screen, vec![reader]);

        let mut state = GotoLineState::new();
        for rune in "42".chars() {
            assert!(state.input_box.handle_rune(rune));
        }
        on_key(&mut pager, state, KeyCode::Enter);

        assert_eq!(pager.mode.name(), "Viewing");
        // One-based 42 is index 41
        assert_eq!(pager.line_index().unwrap().index(), 41);
    }

    #[test]
    fn double_g_goes_to_the_top() {
        let text = (0..100).map(|i| format!("line {i}\n")).collect::<String>();
        let reader = Reader::from_text(None, &text);
        let mut screen = FakeScreen::new(20, 10);
        let mut pager = Pager::new(&mut screen, vec![reader]);
        pager.scroll_to_end();

        on_rune(&mut pager, GotoLineState::new(), 'g');
        assert_eq!(pager.mode.name(), "Viewing");
        assert_eq!(pager.line_index().unwrap().index(), 0);
    }

    #[test]
    fn letters_are_rejected_by_the_box() {
        let reader = Reader::from_text(None, "x\n");
        let mut screen = FakeScreen::new(20, 10);
        let mut pager = Pager::new(&mut screen, vec![reader]);

        let state = GotoLineState::new();
        on_rune(&mut pager, state, 'z');
        let PagerMode::GotoLine(state) = &pager.mode else {
            panic!("Should still be in goto mode");
        };
        assert_eq!(state.input_box.text(), "");
    }
}

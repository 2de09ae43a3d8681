#![forbid(unsafe_code)]

//! Session bookmarks: 'm' plus a letter stores, ' plus the letter jumps.

use moor_screen::KeyCode;
use tracing::debug;

use crate::modes::{InfoState, PagerMode};
use crate::pager::Pager;

pub fn on_rune_set(pager: &mut Pager, rune: char) {
    pager.canonicalize_scroll_position();
    pager.bookmarks.insert(rune, pager.scroll_position);
    pager.mode = PagerMode::Info(InfoState::new(format!("Mark '{rune}' set")));
}

pub fn on_key_set(pager: &mut Pager, key: KeyCode) {
    if key != KeyCode::Escape {
        debug!("Unhandled mark key event {key:?}");
    }
    pager.mode = PagerMode::Viewing;
}

pub fn on_rune_jump(pager: &mut Pager, rune: char) {
    match pager.bookmarks.get(&rune) {
        Some(position) => {
            pager.scroll_position = *position;
            pager.set_target_line(None);
            pager.mode = PagerMode::Viewing;
        }
        None => {
            pager.mode = PagerMode::Info(InfoState::new(format!("No mark '{rune}'")));
        }
    }
}

pub fn on_key_jump(pager: &mut Pager, key: KeyCode) {
    if key != KeyCode::Escape {
        debug!("Unhandled jump-to-mark key event {key:?}");
    }
    pager.mode = PagerMode::Viewing;
}

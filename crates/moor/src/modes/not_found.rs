#![forbid(unsafe_code)]

//! Search wrapped around without finding anything.
//!
//! Pressing 'n' or 'p' again wraps the search to the other end of the input;
//! anything else goes back to viewing and replays the event there.

use moor_screen::KeyCode;

use crate::modes::PagerMode;
use crate::pager::Pager;

pub fn on_key(pager: &mut Pager, key: KeyCode) {
    pager.mode = PagerMode::Viewing;
    pager.on_key(key);
}

pub fn on_rune(pager: &mut Pager, rune: char) {
    match rune {
        // Should match the viewing mode's search bindings
        'n' => pager.scroll_to_next_search_hit(),
        'p' | 'N' => pager.scroll_to_previous_search_hit(),
        other => {
            pager.mode = PagerMode::Viewing;
            pager.on_rune(other);
        }
    }
}

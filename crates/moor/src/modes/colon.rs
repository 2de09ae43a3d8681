#![forbid(unsafe_code)]

//! File switching between multiple readers.

use std::sync::atomic::Ordering;

use moor_screen::KeyCode;
use tracing::debug;

use crate::modes::PagerMode;
use crate::pager::Pager;

pub fn on_key(pager: &mut Pager, key: KeyCode) {
    match key {
        KeyCode::Escape => pager.mode = PagerMode::Viewing,
        other => {
            debug!("Unhandled colon command event {other:?}, treating it as a viewing key");
            pager.mode = PagerMode::Viewing;
            pager.on_key(other);
        }
    }
}

pub fn on_rune(pager: &mut Pager, rune: char) {
    match rune {
        'p' => {
            pager.mode = PagerMode::Viewing;
            previous_file(pager);
        }
        'n' => {
            pager.mode = PagerMode::Viewing;
            next_file(pager);
        }
        'x' => {
            pager.mode = PagerMode::Viewing;
            first_file(pager);
        }
        other => debug!("Unhandled colon command rune {other:?}, ignoring it"),
    }
}

fn previous_file(pager: &mut Pager) {
    let current = pager.current_reader.load(Ordering::Relaxed);
    switch_to(pager, current.saturating_sub(1));
}

fn next_file(pager: &mut Pager) {
    let current = pager.current_reader.load(Ordering::Relaxed);
    switch_to(pager, (current + 1).min(pager.readers.len() - 1));
}

fn first_file(pager: &mut Pager) {
    switch_to(pager, 0);
}

/// Swap the backing reader and invalidate filter/search-coupled state. The
/// background task gets told so it watches the right reader's signals.
fn switch_to(pager: &mut Pager, index: usize) {
    pager.current_reader.store(index, Ordering::Relaxed);
    pager.filter.stop();
    let _ = pager.reader_switched_tx.try_send(());
}

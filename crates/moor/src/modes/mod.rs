#![forbid(unsafe_code)]

//! The pager's mode machine.
//!
//! `PagerMode` is a tagged union; each variant carries its own state and
//! gets dispatched by match from the controller. Mode handlers are free
//! functions taking the pager, so no mode ever holds a controller reference.

pub mod colon;
pub mod filter;
pub mod goto_line;
pub mod marks;
pub mod not_found;
pub mod search;
pub mod viewing;

use tracing::info;

use crate::input_box::{AcceptMode, InputBox};
use crate::linescan::SearchDirection;
use crate::scroll::ScrollPosition;

/// What the pager is currently doing.
pub enum PagerMode {
    Viewing,
    Search(SearchModeState),
    Filter(FilterModeState),
    GotoLine(GotoLineState),
    Mark,
    JumpToMark,
    ColonCommand,
    Info(InfoState),
    NotFound,
}

impl PagerMode {
    /// For tests and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Viewing => "Viewing",
            Self::Search(_) => "Search",
            Self::Filter(_) => "Filter",
            Self::GotoLine(_) => "GotoLine",
            Self::Mark => "Mark",
            Self::JumpToMark => "JumpToMark",
            Self::ColonCommand => "ColonCommand",
            Self::Info(_) => "Info",
            Self::NotFound => "NotFound",
        }
    }
}

/// Incremental search state.
pub struct SearchModeState {
    pub direction: SearchDirection,
    /// Pager position before the search started; Esc goes back here.
    pub initial_scroll_position: ScrollPosition,
    pub input_box: InputBox,
    /// Index into the search history; past-the-end means "what the user is
    /// currently typing".
    pub history_index: usize,
    /// What the user typed last, restored when arrowing back down past the
    /// newest history entry.
    pub user_edited_text: String,
}

impl SearchModeState {
    #[must_use]
    pub fn new(
        direction: SearchDirection,
        initial_scroll_position: ScrollPosition,
        history_length: usize,
    ) -> Self {
        Self {
            direction,
            initial_scroll_position,
            input_box: InputBox::new(AcceptMode::All),
            history_index: history_length,
            user_edited_text: String::new(),
        }
    }
}

/// Filtering state: just the input box.
pub struct FilterModeState {
    pub input_box: InputBox,
}

impl FilterModeState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input_box: InputBox::new(AcceptMode::All),
        }
    }
}

impl Default for FilterModeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Goto-line state: a digits-only input box.
pub struct GotoLineState {
    pub input_box: InputBox,
}

impl GotoLineState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input_box: InputBox::new(AcceptMode::PositiveNumbers),
        }
    }
}

impl Default for GotoLineState {
    fn default() -> Self {
        Self::new()
    }
}

/// A one-line message in the footer; any input falls back to viewing.
pub struct InfoState {
    pub text: String,
}

impl InfoState {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        info!("{text}");
        Self { text }
    }
}

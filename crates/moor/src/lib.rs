#![forbid(unsafe_code)]

//! The pager itself: controller, modes, rendering, scrolling, searching.
//!
//! The controller is single-threaded cooperative; exactly one thread drains
//! the event channel and mutates pager state. Background tasks (reader
//! ingest, highlighting, the spinner/throttle forwarder, parallel search
//! workers) only talk to the controller by signalling its event channel.

pub mod editor;
pub mod filtering;
pub mod help;
pub mod input_box;
pub mod linescan;
pub mod modes;
pub mod options;
pub mod pager;
pub mod screen_lines;
pub mod scroll;
pub mod search_nav;
pub mod styling;

#[cfg(test)]
mod pager_tests;

pub use filtering::ActiveSource;
pub use linescan::{find_first_hit, SearchDirection};
pub use options::Options;
pub use pager::{Pager, StatusBarOption};
pub use scroll::ScrollPosition;
pub use styling::UiStyles;

#![forbid(unsafe_code)]

//! Screen abstraction: a cell grid the render pipeline draws into, plus the
//! event stream the pager controller drains. The real terminal lives behind
//! the [`Screen`] trait; tests use [`FakeScreen`].

pub mod event;
pub mod fake;
pub mod screen;
pub mod styled_rune;
pub mod terminal;

pub use event::{Event, KeyCode, MouseButton, MouseMode};
pub use fake::FakeScreen;
pub use screen::Screen;
pub use styled_rune::StyledRune;
pub use terminal::TerminalScreen;

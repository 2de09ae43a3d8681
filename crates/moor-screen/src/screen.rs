#![forbid(unsafe_code)]

//! The contract between the pager and whatever displays it.

use crossbeam_channel::{Receiver, Sender};
use moor_style::Color;

use crate::event::Event;
use crate::styled_rune::StyledRune;

/// A cell grid with an event stream.
///
/// `set_cell` returns how many columns the write advanced (0 for combining
/// marks, 2 for wide runes), so callers can walk a row left to right without
/// duplicating width logic.
pub trait Screen {
    /// Terminal size as (columns, rows).
    fn size(&self) -> (usize, usize);

    /// Reset all cells to blank before a redraw.
    fn clear(&mut self);

    /// Put a styled rune at the given position. Out-of-bounds writes are
    /// ignored but still report an advance so render loops terminate.
    fn set_cell(&mut self, x: usize, y: usize, rune: StyledRune) -> usize;

    /// Flush the cell grid to the output.
    fn show(&mut self);

    /// Print the top `n` rows of the cell grid to the normal screen. Used to
    /// leave pager contents visible after exit.
    fn show_n_lines(&mut self, n: usize);

    /// Restore the terminal. Idempotent.
    fn close(&mut self);

    /// The event stream the pager drains. Internal pager tasks clone
    /// [`Screen::event_sender`] and inject their own events here.
    fn events(&self) -> &Receiver<Event>;

    /// A handle for producing events into [`Screen::events`].
    fn event_sender(&self) -> Sender<Event>;

    /// The terminal's background color, when detection worked.
    fn terminal_background(&self) -> Option<Color>;
}

#![forbid(unsafe_code)]

//! An in-memory screen for tests.

use crossbeam_channel::{unbounded, Receiver, Sender};
use moor_style::{Color, Style};

use crate::event::Event;
use crate::screen::Screen;
use crate::styled_rune::StyledRune;

/// Records cells instead of talking to a terminal.
pub struct FakeScreen {
    width: usize,
    height: usize,
    rows: Vec<Vec<StyledRune>>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    background: Option<Color>,
}

impl FakeScreen {
    /// Create a fake screen of the given size, all cells blank.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            width,
            height,
            rows: blank_rows(width, height),
            events_tx,
            events_rx,
            background: None,
        }
    }

    /// Pretend the terminal reported this background color.
    pub fn set_background(&mut self, background: Option<Color>) {
        self.background = background;
    }

    /// The cells of one row.
    #[must_use]
    pub fn get_row(&self, y: usize) -> &[StyledRune] {
        &self.rows[y]
    }

    /// One row as plain text, continuation cells skipped, right-trimmed.
    #[must_use]
    pub fn row_to_string(&self, y: usize) -> String {
        let mut out = String::new();
        for cell in &self.rows[y] {
            if cell.is_continuation() {
                continue;
            }
            out.push(cell.rune);
        }
        out.trim_end_matches(' ').to_string()
    }

    /// Pretend the terminal was resized.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.rows = blank_rows(width, height);
        let _ = self.events_tx.send(Event::Resize);
    }
}

fn blank_rows(width: usize, height: usize) -> Vec<Vec<StyledRune>> {
    vec![vec![StyledRune::new(' ', Style::DEFAULT); width]; height]
}

impl Screen for FakeScreen {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.rows = blank_rows(self.width, self.height);
    }

    fn set_cell(&mut self, x: usize, y: usize, rune: StyledRune) -> usize {
        let width = rune.width();
        if y >= self.height || x >= self.width {
            return width.max(1);
        }
        if width == 0 {
            // Combining mark, attaches to the previous column
            return 0;
        }

        self.rows[y][x] = rune;
        if width == 2 {
            if x + 1 < self.width {
                self.rows[y][x + 1] = StyledRune::CONTINUATION;
            }
            return 2;
        }
        1
    }

    fn show(&mut self) {
        // Nothing to flush, the cells are the output
    }

    fn show_n_lines(&mut self, _n: usize) {}

    fn close(&mut self) {}

    fn events(&self) -> &Receiver<Event> {
        &self.events_rx
    }

    fn event_sender(&self) -> Sender<Event> {
        self.events_tx.clone()
    }

    fn terminal_background(&self) -> Option<Color> {
        self.background
    }
}

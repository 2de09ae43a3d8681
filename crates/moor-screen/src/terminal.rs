#![forbid(unsafe_code)]

//! The crossterm-backed terminal screen.
//!
//! Raw mode + alternate screen, an input thread mapping crossterm events onto
//! ours, and a cell grid flushed row by row on `show()`. This is the thin
//! collaborator side of the screen contract; everything interesting happens
//! above it.

use std::io::{self, Write};

use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::{cursor, execute, terminal};
use moor_style::{Color, ColorCount, Style};
use tracing::{debug, warn};

use crate::event::{Event, MouseMode};
use crate::screen::Screen;
use crate::styled_rune::StyledRune;

/// Best-effort terminal restore for panic hooks: leave the alternate
/// screen, show the cursor, drop raw mode. Safe to call at any time.
pub fn emergency_restore() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, terminal::LeaveAlternateScreen, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

/// A real terminal.
pub struct TerminalScreen {
    width: usize,
    height: usize,
    rows: Vec<Vec<StyledRune>>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    color_count: ColorCount,
    mouse_captured: bool,
    closed: bool,
}

impl TerminalScreen {
    /// Set up the terminal: raw mode, alternate screen, hidden cursor,
    /// optional mouse capture, and a reader thread feeding the event channel.
    pub fn open(mouse_mode: MouseMode, color_count: ColorCount) -> io::Result<Self> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide
        )?;

        let mouse_captured = match mouse_mode {
            MouseMode::Select => false,
            MouseMode::Auto | MouseMode::Scroll => true,
        };
        if mouse_captured {
            execute!(stdout, crossterm::event::EnableMouseCapture)?;
        }

        let (width, height) = terminal::size()?;
        let (events_tx, events_rx) = unbounded();

        let input_tx = events_tx.clone();
        std::thread::Builder::new()
            .name("input".into())
            .spawn(move || input_loop(&input_tx))?;

        Ok(Self {
            width: width as usize,
            height: height as usize,
            rows: vec![],
            events_tx,
            events_rx,
            color_count,
            mouse_captured,
            closed: false,
        })
    }

    fn blank_rows(&self) -> Vec<Vec<StyledRune>> {
        vec![vec![StyledRune::new(' ', Style::DEFAULT); self.width]; self.height]
    }

    fn render_row(&self, out: &mut impl Write, row: &[StyledRune]) -> io::Result<()> {
        let mut current = Style::DEFAULT;
        for cell in row {
            if cell.is_continuation() {
                continue;
            }
            if cell.style != current {
                write!(out, "{}", current.ansi_transition(&cell.style, self.color_count))?;
                current = cell.style.clone();
            }
            let mut buffer = [0u8; 4];
            out.write_all(cell.rune.encode_utf8(&mut buffer).as_bytes())?;
        }
        if current != Style::DEFAULT {
            write!(out, "{}", current.ansi_transition(&Style::DEFAULT, self.color_count))?;
        }
        Ok(())
    }
}

fn input_loop(events: &Sender<Event>) {
    loop {
        let read = match crossterm::event::read() {
            Ok(read) => read,
            Err(error) => {
                warn!("Reading terminal input failed: {error}");
                let _ = events.send(Event::Exit);
                return;
            }
        };

        if let Some(event) = Event::from_crossterm(read) {
            if events.send(event).is_err() {
                // Nobody is listening any more
                return;
            }
        }
    }
}

impl Screen for TerminalScreen {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        if let Ok((width, height)) = terminal::size() {
            self.width = width as usize;
            self.height = height as usize;
        }
        self.rows = self.blank_rows();
    }

    fn set_cell(&mut self, x: usize, y: usize, rune: StyledRune) -> usize {
        let advance = rune.width();
        if y >= self.rows.len() || x >= self.width {
            return advance.max(1);
        }
        if advance == 0 {
            return 0;
        }
        self.rows[y][x] = rune;
        if advance == 2 {
            if x + 1 < self.width {
                self.rows[y][x + 1] = StyledRune::CONTINUATION;
            }
            return 2;
        }
        1
    }

    fn show(&mut self) {
        let mut out = io::BufWriter::new(io::stdout());
        let render = |out: &mut io::BufWriter<io::Stdout>| -> io::Result<()> {
            for (y, row) in self.rows.iter().enumerate() {
                crossterm::queue!(out, cursor::MoveTo(0, y as u16))?;
                self.render_row(out, row)?;
                crossterm::queue!(out, terminal::Clear(terminal::ClearType::UntilNewLine))?;
            }
            out.flush()
        };
        if let Err(error) = render(&mut out) {
            debug!("Flushing the screen failed: {error}");
        }
    }

    fn show_n_lines(&mut self, n: usize) {
        // Called after close() to leave contents on the normal screen
        let mut out = io::BufWriter::new(io::stdout());
        let render = |out: &mut io::BufWriter<io::Stdout>| -> io::Result<()> {
            for row in self.rows.iter().take(n) {
                self.render_row(out, row)?;
                out.write_all(b"\r\n")?;
            }
            out.flush()
        };
        if let Err(error) = render(&mut out) {
            debug!("Reprinting pager contents failed: {error}");
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut stdout = io::stdout();
        if self.mouse_captured {
            let _ = execute!(stdout, crossterm::event::DisableMouseCapture);
        }
        let _ = execute!(stdout, terminal::LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }

    fn events(&self) -> &Receiver<Event> {
        &self.events_rx
    }

    fn event_sender(&self) -> Sender<Event> {
        self.events_tx.clone()
    }

    fn terminal_background(&self) -> Option<Color> {
        // Querying OSC 11 through crossterm is not reliable enough to build
        // on; styling falls back to its dark-background defaults.
        None
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        self.close();
    }
}

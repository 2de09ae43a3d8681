#![forbid(unsafe_code)]

//! The one-line editable text field at the bottom of the screen, used by
//! search, filter, goto-line and mark entry.

use moor_screen::{KeyCode, Screen, StyledRune};
use moor_style::{AttrMask, Style};

/// What input the box accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptMode {
    #[default]
    All,
    PositiveNumbers,
}

/// An editable single-line text field with a cursor.
///
/// The cursor is a rune index: 0 is before the first rune, rune-count is
/// after the last. Callers watch the return value of the edit methods and
/// react to text changes themselves.
#[derive(Debug, Default)]
pub struct InputBox {
    text: String,
    cursor: usize,
    accept: AcceptMode,
}

impl InputBox {
    #[must_use]
    pub fn new(accept: AcceptMode) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            accept,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the contents, cursor at the end. Used by history navigation.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.move_cursor_end();
    }

    /// Render on the bottom row: prompt, text, and a reverse-video cursor
    /// cell (a reverse blank when the cursor is at the end).
    pub fn draw(&mut self, screen: &mut dyn Screen, prompt: &str) {
        let (width, height) = screen.size();
        if height == 0 {
            return;
        }
        let row = height - 1;
        let mut pos = 0;

        for rune in prompt.chars() {
            pos += screen.set_cell(pos, row, StyledRune::new(rune, Style::DEFAULT));
        }

        let runes: Vec<char> = self.text.chars().collect();
        self.cursor = self.cursor.min(runes.len());

        for rune in &runes[..self.cursor] {
            pos += screen.set_cell(pos, row, StyledRune::new(*rune, Style::DEFAULT));
        }

        let cursor_style = Style::DEFAULT.with_attr(AttrMask::REVERSE);
        if self.cursor < runes.len() {
            pos += screen.set_cell(pos, row, StyledRune::new(runes[self.cursor], cursor_style));
            for rune in &runes[self.cursor + 1..] {
                pos += screen.set_cell(pos, row, StyledRune::new(*rune, Style::DEFAULT));
            }
        } else {
            pos += screen.set_cell(pos, row, StyledRune::new(' ', cursor_style));
        }

        while pos < width {
            pos += screen.set_cell(pos, row, StyledRune::new(' ', Style::DEFAULT));
        }
    }

    /// Handle a typed rune, including the control-key editing shortcuts.
    /// Returns whether the rune was consumed.
    pub fn handle_rune(&mut self, rune: char) -> bool {
        match rune {
            // Some keyboards send 0x08 instead of backspace
            '\x08' => {
                self.backspace();
                return true;
            }
            '\x01' => {
                // Ctrl-A, move cursor to start
                self.move_cursor_home();
                return true;
            }
            '\x05' => {
                // Ctrl-E, move cursor to end
                self.move_cursor_end();
                return true;
            }
            '\x02' => {
                // Ctrl-B, move cursor left
                self.move_cursor_left();
                return true;
            }
            '\x06' => {
                // Ctrl-F, move cursor right
                self.move_cursor_right();
                return true;
            }
            '\x0b' => {
                // Ctrl-K, delete to end of line
                self.delete_to_end();
                return true;
            }
            '\x15' => {
                // Ctrl-U, delete to start of line
                self.delete_to_start();
                return true;
            }
            _ => {}
        }

        if self.accept == AcceptMode::PositiveNumbers && !rune.is_ascii_digit() {
            return false;
        }

        let mut runes: Vec<char> = self.text.chars().collect();
        self.cursor = self.cursor.min(runes.len());
        runes.insert(self.cursor, rune);
        self.text = runes.into_iter().collect();
        self.cursor += 1;
        true
    }

    /// Handle special keys. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.move_cursor_home(),
            KeyCode::End => self.move_cursor_end(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            _ => return false,
        }
        true
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let runes = self.text.chars().count();
        if self.cursor < runes {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn delete_to_end(&mut self) {
        self.text = self.text.chars().take(self.cursor).collect();
    }

    pub fn delete_to_start(&mut self) {
        self.text = self.text.chars().skip(self.cursor).collect();
        self.cursor = 0;
    }

    /// Remove the rune before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut runes: Vec<char> = self.text.chars().collect();
        runes.remove(self.cursor - 1);
        self.cursor -= 1;
        self.text = runes.into_iter().collect();
    }

    /// Remove the rune at the cursor.
    pub fn delete(&mut self) {
        let mut runes: Vec<char> = self.text.chars().collect();
        if self.cursor < runes.len() {
            runes.remove(self.cursor);
            self.text = runes.into_iter().collect();
        }
    }
}

#![forbid(unsafe_code)]

//! Lazy rune lookahead over a string.
//!
//! The overstrike matcher needs to peek up to five runes ahead without
//! decoding the whole (possibly megabytes-long) line up front.

use std::collections::VecDeque;
use std::str::Chars;

/// Iterate a string by runes with relative lookahead.
pub struct RuneWindow<'a> {
    chars: Chars<'a>,
    buffer: VecDeque<char>,
}

impl<'a> RuneWindow<'a> {
    #[must_use]
    pub fn new(s: &'a str) -> Self {
        Self {
            chars: s.chars(),
            buffer: VecDeque::new(),
        }
    }

    /// The rune `delta` positions ahead of the current one, or `None` past
    /// the end of the string. `get_relative(0)` is the current rune.
    pub fn get_relative(&mut self, delta: usize) -> Option<char> {
        while self.buffer.len() <= delta {
            let next = self.chars.next()?;
            self.buffer.push_back(next);
        }
        self.buffer.get(delta).copied()
    }

    /// Whether there is a rune after the current one.
    pub fn has_next(&mut self) -> bool {
        self.get_relative(1).is_some()
    }

    /// Step forward one rune.
    pub fn next(&mut self) {
        if self.buffer.pop_front().is_none() {
            let _ = self.chars.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let mut window = RuneWindow::new("");
        assert!(!window.has_next());
        assert_eq!(window.get_relative(0), None);
    }

    #[test]
    fn unicode() {
        let mut window = RuneWindow::new("åäö");

        assert_eq!(window.get_relative(0), Some('å'));
        assert_eq!(window.get_relative(1), Some('ä'));

        assert!(window.has_next());
        window.next();
        assert_eq!(window.get_relative(0), Some('ä'));

        assert!(window.has_next());
        window.next();
        assert_eq!(window.get_relative(0), Some('ö'));

        assert!(!window.has_next());
        assert_eq!(window.get_relative(1), None);

        window.next();
        assert!(!window.has_next());
        assert_eq!(window.get_relative(0), None);
    }

    #[test]
    fn lookahead_then_walk() {
        let mut window = RuneWindow::new("abcdef");
        assert_eq!(window.get_relative(4), Some('e'));
        window.next();
        window.next();
        assert_eq!(window.get_relative(0), Some('c'));
        assert_eq!(window.get_relative(3), Some('f'));
        assert_eq!(window.get_relative(4), None);
    }
}

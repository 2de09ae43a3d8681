#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! The pager controller only sees these; the crossterm mapping lives here so
//! the rest of the workspace never touches the terminal library directly.
//! Ctrl-letter keypresses are delivered as runes 0x01-0x1f, the way the
//! terminal would send them, so the viewing mode can bind e.g. Ctrl-U.

use crossterm::event as cte;

/// Key codes the pager reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Up,
    Down,
    Left,
    Right,
    AltLeft,
    AltRight,
    Home,
    End,
    PgUp,
    PgDown,
    Enter,
    Backspace,
    Delete,
    Escape,
}

/// Mouse wheel directions. The pager does not track pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    WheelUp,
    WheelDown,
    WheelLeft,
    WheelRight,
}

/// What to do about mouse reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    /// Capture the wheel unless the terminal is known to prefer selection.
    #[default]
    Auto,
    /// Leave the mouse alone so text selection works.
    Select,
    /// Capture the wheel for scrolling.
    Scroll,
}

/// An event delivered to the pager's event channel.
///
/// Internal pager events (more lines available, spinner frames) are separate
/// types owned by the pager crate; this enum is what the terminal produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyCode),
    Rune(char),
    Mouse(MouseButton),
    Resize,
    /// The terminal went away or the user hit the interrupt key.
    Exit,
}

impl Event {
    /// Map a crossterm event onto ours. Returns `None` for events the pager
    /// has no use for (focus, key releases, pointer motion).
    #[must_use]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        match event {
            cte::Event::Key(key) => {
                if key.kind == cte::KeyEventKind::Release {
                    return None;
                }
                Self::from_crossterm_key(key)
            }
            cte::Event::Mouse(mouse) => match mouse.kind {
                cte::MouseEventKind::ScrollUp => Some(Self::Mouse(MouseButton::WheelUp)),
                cte::MouseEventKind::ScrollDown => Some(Self::Mouse(MouseButton::WheelDown)),
                cte::MouseEventKind::ScrollLeft => Some(Self::Mouse(MouseButton::WheelLeft)),
                cte::MouseEventKind::ScrollRight => Some(Self::Mouse(MouseButton::WheelRight)),
                _ => None,
            },
            cte::Event::Resize(..) => Some(Self::Resize),
            _ => None,
        }
    }

    fn from_crossterm_key(key: cte::KeyEvent) -> Option<Self> {
        let alt = key.modifiers.contains(cte::KeyModifiers::ALT);
        let ctrl = key.modifiers.contains(cte::KeyModifiers::CONTROL);

        match key.code {
            cte::KeyCode::Char('c') if ctrl => Some(Self::Exit),
            cte::KeyCode::Char(c) if ctrl => {
                let c = c.to_ascii_lowercase();
                if c.is_ascii_lowercase() {
                    // Deliver as the control rune, like a raw terminal would
                    Some(Self::Rune((c as u8 & 0x1f) as char))
                } else {
                    None
                }
            }
            cte::KeyCode::Char(c) => Some(Self::Rune(c)),
            cte::KeyCode::Up => Some(Self::Key(KeyCode::Up)),
            cte::KeyCode::Down => Some(Self::Key(KeyCode::Down)),
            cte::KeyCode::Left if alt => Some(Self::Key(KeyCode::AltLeft)),
            cte::KeyCode::Right if alt => Some(Self::Key(KeyCode::AltRight)),
            cte::KeyCode::Left => Some(Self::Key(KeyCode::Left)),
            cte::KeyCode::Right => Some(Self::Key(KeyCode::Right)),
            cte::KeyCode::Home => Some(Self::Key(KeyCode::Home)),
            cte::KeyCode::End => Some(Self::Key(KeyCode::End)),
            cte::KeyCode::PageUp => Some(Self::Key(KeyCode::PgUp)),
            cte::KeyCode::PageDown => Some(Self::Key(KeyCode::PgDown)),
            cte::KeyCode::Enter => Some(Self::Key(KeyCode::Enter)),
            cte::KeyCode::Backspace => Some(Self::Key(KeyCode::Backspace)),
            cte::KeyCode::Delete => Some(Self::Key(KeyCode::Delete)),
            cte::KeyCode::Esc => Some(Self::Key(KeyCode::Escape)),
            _ => None,
        }
    }
}

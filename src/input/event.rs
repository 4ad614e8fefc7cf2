// src/input/event.rs

use std::fmt;
use std::io;
use std::sync::Arc;

use crate::keys::{self, MouseModifiers};

/// Buttons reported by X10 mouse tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// One decoded unit of terminal input, or a resize notification.
///
/// Coordinates are 0-based cells.
#[derive(Debug, Clone)]
pub enum InputEvent {
    Char(char),
    MouseClick {
        x: u16,
        y: u16,
        button: MouseButton,
        modifiers: MouseModifiers,
    },
    MouseRelease {
        x: u16,
        y: u16,
    },
    Resize {
        cols: u16,
        rows: u16,
    },
    /// The read window elapsed without input.
    Timeout,
    /// Reading the device failed. The producer stops after reporting it.
    Error(Arc<io::Error>),
    /// A chunk that matches no known pattern.
    Unknown(Vec<u8>),
}

impl InputEvent {
    pub(crate) fn error(e: io::Error) -> Self {
        InputEvent::Error(Arc::new(e))
    }
}

// io::Error has no PartialEq; errors compare by kind.
impl PartialEq for InputEvent {
    fn eq(&self, other: &Self) -> bool {
        use InputEvent::*;
        match (self, other) {
            (Char(a), Char(b)) => a == b,
            (
                MouseClick {
                    x: x1,
                    y: y1,
                    button: b1,
                    modifiers: m1,
                },
                MouseClick {
                    x: x2,
                    y: y2,
                    button: b2,
                    modifiers: m2,
                },
            ) => x1 == x2 && y1 == y2 && b1 == b2 && m1 == m2,
            (MouseRelease { x: x1, y: y1 }, MouseRelease { x: x2, y: y2 }) => {
                x1 == x2 && y1 == y2
            }
            (
                Resize {
                    cols: c1,
                    rows: r1,
                },
                Resize {
                    cols: c2,
                    rows: r2,
                },
            ) => c1 == c2 && r1 == r2,
            (Timeout, Timeout) => true,
            (Error(a), Error(b)) => a.kind() == b.kind(),
            (Unknown(a), Unknown(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputEvent::Char(c) => match keys::key_name(*c) {
                Some(name) => f.write_str(name),
                None if keys::is_printable(*c) => write!(f, "'{}'", c),
                None => write!(f, "U+{:04X}", *c as u32),
            },
            InputEvent::MouseClick {
                x,
                y,
                button,
                modifiers,
            } => {
                write!(f, "{:?} click at {},{}", button, x, y)?;
                if !modifiers.is_empty() {
                    write!(f, " with {:?}", modifiers)?;
                }
                Ok(())
            }
            InputEvent::MouseRelease { x, y } => write!(f, "release at {},{}", x, y),
            InputEvent::Resize { cols, rows } => write!(f, "resize to {}x{}", cols, rows),
            InputEvent::Timeout => f.write_str("timeout"),
            InputEvent::Error(e) => write!(f, "read error: {}", e),
            InputEvent::Unknown(bytes) => write!(f, "unknown input {:02x?}", bytes),
        }
    }
}

// src/keys.rs

//! Key constants for raw-mode input and the mouse modifier flags carried by
//! mouse reports.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier keys held during a mouse report.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MouseModifiers: u8 {
        const SHIFT = 1 << 2;
        const META = 1 << 3;
        const CONTROL = 1 << 4;
    }
}

pub const CTRL_AT: char = '\x00';
pub const CTRL_A: char = '\x01';
pub const CTRL_B: char = '\x02';
pub const CTRL_C: char = '\x03';
pub const CTRL_D: char = '\x04';
pub const CTRL_E: char = '\x05';
pub const CTRL_F: char = '\x06';
pub const CTRL_G: char = '\x07';
pub const CTRL_H: char = '\x08';
pub const CTRL_I: char = '\x09';
pub const CTRL_J: char = '\x0a';
pub const CTRL_K: char = '\x0b';
pub const CTRL_L: char = '\x0c';
pub const CTRL_M: char = '\x0d';
pub const CTRL_N: char = '\x0e';
pub const CTRL_O: char = '\x0f';
pub const CTRL_P: char = '\x10';
pub const CTRL_Q: char = '\x11';
pub const CTRL_R: char = '\x12';
pub const CTRL_S: char = '\x13';
pub const CTRL_T: char = '\x14';
pub const CTRL_U: char = '\x15';
pub const CTRL_V: char = '\x16';
pub const CTRL_W: char = '\x17';
pub const CTRL_X: char = '\x18';
pub const CTRL_Y: char = '\x19';
pub const CTRL_Z: char = '\x1a';
pub const CTRL_LEFT_BRACKET: char = '\x1b';
pub const CTRL_BACKSLASH: char = '\x1c';
pub const CTRL_RIGHT_BRACKET: char = '\x1d';
pub const CTRL_CARET: char = '\x1e';
pub const CTRL_UNDERSCORE: char = '\x1f';
pub const SPACE: char = '\x20';
pub const DEL: char = '\x7f';
pub const ESC: char = CTRL_LEFT_BRACKET;
pub const BACKSPACE: char = CTRL_H;
pub const TAB: char = CTRL_I;
pub const LINE_FEED: char = CTRL_J;
pub const ENTER: char = CTRL_M;

/// Shift+Tab, reported by the terminal as `ESC [ Z`.
///
/// Mapped to the first code point of the Unicode private use area so it can
/// travel as a regular `char`.
pub const SHIFT_TAB: char = '\u{E000}';

/// Returns a display name for keys that have no printable glyph.
pub fn key_name(c: char) -> Option<&'static str> {
    let name = match c {
        CTRL_AT => "^@",
        CTRL_A => "^A",
        CTRL_B => "^B",
        CTRL_C => "^C",
        CTRL_D => "^D",
        CTRL_E => "^E",
        CTRL_F => "^F",
        CTRL_G => "^G",
        BACKSPACE => "Backspace",
        TAB => "Tab",
        CTRL_J => "^J",
        CTRL_K => "^K",
        CTRL_L => "^L",
        ENTER => "Enter",
        CTRL_N => "^N",
        CTRL_O => "^O",
        CTRL_P => "^P",
        CTRL_Q => "^Q",
        CTRL_R => "^R",
        CTRL_S => "^S",
        CTRL_T => "^T",
        CTRL_U => "^U",
        CTRL_V => "^V",
        CTRL_W => "^W",
        CTRL_X => "^X",
        CTRL_Y => "^Y",
        CTRL_Z => "^Z",
        ESC => "Esc",
        CTRL_BACKSLASH => "^\\",
        CTRL_RIGHT_BRACKET => "^]",
        CTRL_CARET => "^^",
        CTRL_UNDERSCORE => "^_",
        SPACE => "Space",
        DEL => "Del",
        SHIFT_TAB => "Shift-Tab",
        _ => return None,
    };
    Some(name)
}

pub fn is_printable(c: char) -> bool {
    !c.is_control() && c != SHIFT_TAB
}

// src/input/decoder.rs

//! Classification of raw input chunks into `InputEvent`s.
//!
//! In raw mode every read returns what the terminal sent for one key press
//! (or one mouse report), so a chunk is classified as a whole.

use std::io::{ErrorKind, Read};

use log::{trace, warn};

use super::event::{InputEvent, MouseButton};
use crate::keys::{MouseModifiers, ESC, SHIFT_TAB};

/// Smallest chunk that still fits a complete mouse report.
const MIN_CHUNK_SIZE: usize = 8;

const MOUSE_REPORT_LEN: usize = 6;
const MOUSE_BUTTON_MASK: u8 = 0b11;
const MOUSE_MODIFIER_MASK: u8 = 0b1_1100;
const MOUSE_OFFSET: u8 = 32;
const MOUSE_COORD_OFFSET: i16 = 33;
const MOUSE_COORD_WRAP: i16 = 255;

/// Reads bounded chunks from `reader` and turns each into one event.
pub struct InputDecoder<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: Read> InputDecoder<R> {
    /// `chunk_size` is raised to the size of a mouse report if smaller.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        InputDecoder {
            reader,
            buf: vec![0; chunk_size.max(MIN_CHUNK_SIZE)],
        }
    }

    /// Blocks for at most one read window and returns the resulting event.
    pub fn next_event(&mut self) -> InputEvent {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return InputEvent::Timeout,
                Ok(n) => {
                    trace!("InputDecoder: read {} bytes: {:02x?}", n, &self.buf[..n]);
                    return decode(&self.buf[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("InputDecoder: read failed: {}", e);
                    return InputEvent::error(e);
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Classifies one non-empty chunk.
pub fn decode(chunk: &[u8]) -> InputEvent {
    let esc = ESC as u8;
    match chunk {
        [] => InputEvent::Timeout,
        [byte] => InputEvent::Char(char::from(*byte)),
        [e, b'[', b'Z'] if *e == esc => InputEvent::Char(SHIFT_TAB),
        [e, b'[', b'M', report @ ..] if *e == esc => decode_mouse(report, chunk),
        _ => match std::str::from_utf8(chunk) {
            Ok(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => InputEvent::Char(c),
                    _ => InputEvent::Unknown(chunk.to_vec()),
                }
            }
            Err(_) => InputEvent::Unknown(chunk.to_vec()),
        },
    }
}

/// Decodes the `b x y` bytes following `ESC [ M`.
fn decode_mouse(report: &[u8], chunk: &[u8]) -> InputEvent {
    let [cb, cx, cy, rest @ ..] = report else {
        trace!("InputDecoder: truncated mouse report {:02x?}", chunk);
        return InputEvent::Unknown(chunk.to_vec());
    };
    if !rest.is_empty() {
        trace!(
            "InputDecoder: ignoring {} bytes after a {}-byte mouse report",
            rest.len(),
            MOUSE_REPORT_LEN
        );
    }

    let code = cb.wrapping_sub(MOUSE_OFFSET);
    let x = mouse_coordinate(*cx);
    let y = mouse_coordinate(*cy);
    let modifiers = MouseModifiers::from_bits_truncate(code & MOUSE_MODIFIER_MASK);

    // The fourth button value (3) reports a release.
    let button = match code & MOUSE_BUTTON_MASK {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => return InputEvent::MouseRelease { x, y },
    };
    InputEvent::MouseClick {
        x,
        y,
        button,
        modifiers,
    }
}

fn mouse_coordinate(byte: u8) -> u16 {
    let value = i16::from(byte) - MOUSE_COORD_OFFSET;
    if value < 0 {
        (value + MOUSE_COORD_WRAP) as u16
    } else {
        value as u16
    }
}

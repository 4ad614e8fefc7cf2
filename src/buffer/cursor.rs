// src/buffer/cursor.rs

use log::trace;

use super::{Buffer, LineId};
use crate::error::{Error, Result};

/// Cursor movements. Moving past a boundary clamps instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
    /// Start of the current line.
    First,
    /// End of the current line.
    Last,
    /// First line of the buffer.
    Top,
    /// Last line of the buffer.
    Bottom,
}

/// A position in a `Buffer`: line handle, 0-based line number and rune column.
///
/// Holds `0 <= column <= line.length()` and a line number matching the line's
/// position in the list. If the referenced line is deleted by anything other
/// than an op applied through this cursor, the cursor becomes stale and every
/// operation on it fails with `Error::StaleCursor` until it is repositioned
/// with `jump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    line: LineId,
    lineno: usize,
    colno: usize,
}

impl Cursor {
    /// A cursor at the start of the buffer.
    pub fn new(buffer: &Buffer) -> Self {
        Cursor {
            line: buffer.first_line(),
            lineno: 0,
            colno: 0,
        }
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    pub fn lineno(&self) -> usize {
        self.lineno
    }

    pub fn colno(&self) -> usize {
        self.colno
    }

    pub fn move_to(&mut self, buffer: &Buffer, movement: Move) -> Result<()> {
        let line = buffer.line(self.line).ok_or(Error::StaleCursor)?;
        match movement {
            Move::Up => {
                if let Some(prev) = line.prev() {
                    self.lineno = self.lineno.saturating_sub(1);
                    self.line = prev;
                    self.clamp_column(buffer);
                }
            }
            Move::Down => {
                if let Some(next) = line.next() {
                    self.lineno += 1;
                    self.line = next;
                    self.clamp_column(buffer);
                }
            }
            Move::Left => self.colno = self.colno.saturating_sub(1),
            Move::Right => self.colno = (self.colno + 1).min(line.length()),
            Move::First => self.colno = 0,
            Move::Last => self.colno = line.length(),
            Move::Top => {
                self.line = buffer.first_line();
                self.lineno = 0;
                self.clamp_column(buffer);
            }
            Move::Bottom => {
                let last = buffer.line_count() - 1;
                if let Some(id) = buffer.line_at(last) {
                    self.line = id;
                    self.lineno = last;
                    self.clamp_column(buffer);
                }
            }
        }
        trace!(
            "Cursor: {:?} -> line {} column {}",
            movement,
            self.lineno,
            self.colno
        );
        Ok(())
    }

    /// Places the cursor at `lineno`/`colno`, clamped to the buffer. Works on
    /// a stale cursor.
    pub fn jump(&mut self, buffer: &Buffer, lineno: usize, colno: usize) {
        let lineno = lineno.min(buffer.line_count() - 1);
        if let Some(id) = buffer.line_at(lineno) {
            self.line = id;
            self.lineno = lineno;
            self.colno = colno;
            self.clamp_column(buffer);
        }
    }

    /// Checks the cursor against the buffer. Walks the list.
    pub fn validate(&self, buffer: &Buffer) -> Result<()> {
        let line = buffer.line(self.line).ok_or(Error::StaleCursor)?;
        if self.colno > line.length() {
            return Err(Error::InvariantViolation(format!(
                "cursor column {} beyond line length {}",
                self.colno,
                line.length()
            )));
        }
        if buffer.line_at(self.lineno) != Some(self.line) {
            return Err(Error::InvariantViolation(format!(
                "cursor line number {} does not match its line",
                self.lineno
            )));
        }
        Ok(())
    }

    pub(crate) fn set(&mut self, line: LineId, lineno: usize, colno: usize) {
        self.line = line;
        self.lineno = lineno;
        self.colno = colno;
    }

    fn clamp_column(&mut self, buffer: &Buffer) {
        let length = buffer.line(self.line).map_or(0, |line| line.length());
        self.colno = self.colno.min(length);
    }
}

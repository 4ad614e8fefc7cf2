// src/buffer/mod.rs

//! The in-memory representation of a file.
//!
//! A `Buffer` is a doubly-linked list of `Line`s kept in an arena. Links are
//! `LineId` handles carrying a generation, so a handle to a deleted line is
//! detected instead of aliasing whatever line reuses the slot.
//!
//! ```text
//! Buffer
//! ├── slots: [Slot { generation, Line { pieces, prev, next } }, ...]
//! ├── first ──► Line ◄──► Line ◄──► Line
//! └── line_count
//! ```

pub mod cursor;
pub mod history;
pub mod line;
pub mod op;
pub mod piece;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::error::{Error, Result};

pub use cursor::{Cursor, Move};
pub use history::History;
pub(crate) use line::LineContent;
pub use line::Line;
pub use op::{Clipboard, Op};
pub use piece::Piece;

/// Stable handle to a line in a `Buffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId {
    index: u32,
    generation: u32,
}

/// Line terminator of a single line, written back by `Buffer::contents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    line: Option<Line>,
}

/// A whole file as a linked sequence of lines.
///
/// `line_count` always equals the number of lines reachable from the first
/// line, and a buffer always holds at least one line.
#[derive(Debug)]
pub struct Buffer {
    filename: PathBuf,
    slots: Vec<Slot>,
    free: Vec<u32>,
    first: LineId,
    line_count: usize,
    /// Ending given to lines that did not come from the file.
    line_ending: LineEnding,
    final_terminator: bool,
}

impl Buffer {
    /// Reads `path` fully and splits it into lines.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let buffer = Buffer::from_bytes(path, bytes);
        info!(
            "Buffer: loaded {} ({} lines).",
            path.display(),
            buffer.line_count
        );
        Ok(buffer)
    }

    /// Builds a buffer from raw file content.
    ///
    /// LF and CRLF both end a line and each line remembers which one it had;
    /// a final line without a terminator is still a line. Empty content yields
    /// a single empty line.
    pub fn from_bytes(filename: impl Into<PathBuf>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let text: Arc<[u8]> = bytes.into();
        let mut buffer = Buffer {
            filename: filename.into(),
            slots: Vec::new(),
            free: Vec::new(),
            first: LineId {
                index: 0,
                generation: 0,
            },
            line_count: 0,
            line_ending: LineEnding::Lf,
            final_terminator: text.last() == Some(&b'\n'),
        };

        let mut segments = Vec::new();
        let mut start = 0;
        for (i, &byte) in text.iter().enumerate() {
            if byte != b'\n' {
                continue;
            }
            let crlf = i > start && text[i - 1] == b'\r';
            let ending = if crlf { LineEnding::CrLf } else { LineEnding::Lf };
            if segments.is_empty() {
                buffer.line_ending = ending;
            }
            segments.push((start, if crlf { i - 1 } else { i }, ending));
            start = i + 1;
        }
        if start < text.len() || segments.is_empty() {
            segments.push((start, text.len(), buffer.line_ending));
        }

        let mut prev: Option<LineId> = None;
        for (start, end, ending) in segments {
            let mut line = Line::new();
            if end > start {
                line.append_piece(Piece::slice(&text, start, end));
            }
            line.ending = ending;
            line.prev = prev;
            let id = buffer.alloc(line);
            match prev {
                Some(prev) => {
                    if let Some(prev_line) = buffer.slot_line_mut(prev) {
                        prev_line.next = Some(id);
                    }
                }
                None => buffer.first = id,
            }
            buffer.line_count += 1;
            prev = Some(id);
        }

        debug!(
            "Buffer: split {} bytes into {} lines ({:?}, final terminator: {}).",
            text.len(),
            buffer.line_count,
            buffer.line_ending,
            buffer.final_terminator
        );
        buffer
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Ending of the first terminated line, used for lines created by edits.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Whether the loaded content ended with a line terminator.
    pub fn has_final_terminator(&self) -> bool {
        self.final_terminator
    }

    pub fn first_line(&self) -> LineId {
        self.first
    }

    /// The line behind `id`, or `None` if it has been deleted.
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.line.as_ref())
    }

    pub fn next_line(&self, id: LineId) -> Option<LineId> {
        self.line(id).and_then(Line::next)
    }

    pub fn prev_line(&self, id: LineId) -> Option<LineId> {
        self.line(id).and_then(Line::prev)
    }

    /// Handle of the line at 0-based position `lineno`. Walks the list.
    pub fn line_at(&self, lineno: usize) -> Option<LineId> {
        self.lines().nth(lineno).map(|(id, _)| id)
    }

    pub fn lines(&self) -> Lines<'_> {
        Lines {
            buffer: self,
            next: Some(self.first),
        }
    }

    /// Reassembles the file: every line followed by its own line ending,
    /// except the last one when the loaded content had no final terminator.
    pub fn contents(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut lines = self.lines().peekable();
        while let Some((_, line)) = lines.next() {
            for piece in line.pieces() {
                bytes.extend_from_slice(piece.as_bytes());
            }
            if lines.peek().is_some() || self.final_terminator {
                bytes.extend_from_slice(line.ending().as_bytes());
            }
        }
        bytes
    }

    /// Walks the whole list and checks the links against `line_count`.
    pub fn check_invariants(&self) -> Result<()> {
        if self.line_count == 0 {
            return Err(Error::InvariantViolation("buffer has no lines".into()));
        }

        let mut count = 0;
        let mut prev: Option<LineId> = None;
        let mut cursor = Some(self.first);
        while let Some(id) = cursor {
            let line = self.line(id).ok_or_else(|| {
                Error::InvariantViolation(format!("line {} links to dead handle {:?}", count, id))
            })?;
            if line.prev != prev {
                return Err(Error::InvariantViolation(format!(
                    "line {} has prev {:?}, expected {:?}",
                    count, line.prev, prev
                )));
            }
            count += 1;
            if count > self.slots.len() {
                return Err(Error::InvariantViolation("line list contains a cycle".into()));
            }
            prev = Some(id);
            cursor = line.next;
        }

        if count != self.line_count {
            return Err(Error::InvariantViolation(format!(
                "line_count is {} but {} lines are linked",
                self.line_count, count
            )));
        }
        Ok(())
    }

    // --- Arena and list primitives used by the ops ---

    fn alloc(&mut self, line: Line) -> LineId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.line = Some(line);
                LineId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    line: Some(line),
                });
                LineId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, id: LineId) -> Option<Line> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let line = slot.line.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(line)
    }

    fn slot_line_mut(&mut self, id: LineId) -> Option<&mut Line> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.line.as_mut())
    }

    pub(crate) fn node(&self, id: LineId) -> Result<&Line> {
        self.line(id)
            .ok_or_else(|| Error::InvariantViolation(format!("dangling line handle {:?}", id)))
    }

    pub(crate) fn node_mut(&mut self, id: LineId) -> Result<&mut Line> {
        self.slot_line_mut(id)
            .ok_or_else(|| Error::InvariantViolation(format!("dangling line handle {:?}", id)))
    }

    /// Links `line` in front of `at`.
    pub(crate) fn insert_before(&mut self, at: LineId, mut line: Line) -> Result<LineId> {
        let prev = self.node(at)?.prev;
        line.prev = prev;
        line.next = Some(at);
        let id = self.alloc(line);
        self.node_mut(at)?.prev = Some(id);
        match prev {
            Some(prev) => self.node_mut(prev)?.next = Some(id),
            None => self.first = id,
        }
        self.line_count += 1;
        Ok(id)
    }

    /// Links `line` behind `at`.
    pub(crate) fn insert_after(&mut self, at: LineId, mut line: Line) -> Result<LineId> {
        let next = self.node(at)?.next;
        line.prev = Some(at);
        line.next = next;
        let id = self.alloc(line);
        self.node_mut(at)?.next = Some(id);
        if let Some(next) = next {
            self.node_mut(next)?.prev = Some(id);
        }
        self.line_count += 1;
        Ok(id)
    }

    /// Unlinks `id` and hands back its line. The only line cannot be unlinked.
    pub(crate) fn unlink(&mut self, id: LineId) -> Result<Line> {
        let (prev, next) = {
            let line = self.node(id)?;
            (line.prev, line.next)
        };
        if prev.is_none() && next.is_none() {
            return Err(Error::InvariantViolation(
                "cannot unlink the only line of a buffer".into(),
            ));
        }

        match prev {
            Some(prev) => self.node_mut(prev)?.next = next,
            None => {
                if let Some(next) = next {
                    self.first = next;
                }
            }
        }
        if let Some(next) = next {
            self.node_mut(next)?.prev = prev;
        }
        self.line_count -= 1;

        let mut line = self
            .release(id)
            .ok_or_else(|| Error::InvariantViolation(format!("line {:?} released twice", id)))?;
        line.prev = None;
        line.next = None;
        Ok(line)
    }

    // --- Positional primitives used by the history ---

    /// Links `line` in at position `lineno`; `lineno == line_count` appends.
    pub(crate) fn insert_at(&mut self, lineno: usize, line: Line) -> Result<LineId> {
        if lineno < self.line_count {
            let at = self.line_at_checked(lineno)?;
            self.insert_before(at, line)
        } else if lineno == self.line_count {
            let last = self.line_at_checked(lineno.saturating_sub(1))?;
            self.insert_after(last, line)
        } else {
            Err(Error::InvariantViolation(format!(
                "cannot insert at line {} of {}",
                lineno, self.line_count
            )))
        }
    }

    pub(crate) fn remove_at(&mut self, lineno: usize) -> Result<Line> {
        let id = self.line_at_checked(lineno)?;
        self.unlink(id)
    }

    pub(crate) fn replace_at(&mut self, lineno: usize, content: LineContent) -> Result<()> {
        let id = self.line_at_checked(lineno)?;
        self.node_mut(id)?.set_content(content);
        Ok(())
    }

    fn line_at_checked(&self, lineno: usize) -> Result<LineId> {
        self.line_at(lineno).ok_or_else(|| {
            Error::InvariantViolation(format!("no line {} of {}", lineno, self.line_count))
        })
    }
}

/// Iterator over the lines of a buffer, in order.
pub struct Lines<'a> {
    buffer: &'a Buffer,
    next: Option<LineId>,
}

impl<'a> Iterator for Lines<'a> {
    type Item = (LineId, &'a Line);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let line = self.buffer.line(id)?;
        self.next = line.next;
        Some((id, line))
    }
}

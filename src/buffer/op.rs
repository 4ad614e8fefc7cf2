// src/buffer/op.rs

//! Whole-line edit operations.
//!
//! Every op checks its preconditions before touching the list, so it either
//! applies completely or returns an error with the buffer unchanged.

use log::debug;

use super::history::Change;
use super::{Buffer, Cursor, Line, LineContent, LineId};
use crate::error::{Error, Result};

/// A whole-line edit, applied at a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// New empty line before the cursor line; the cursor moves onto it.
    LineInsert,
    /// New empty line after the cursor line; the cursor moves onto it.
    LineAppend,
    /// Removes the cursor line. The cursor moves to the following line, or
    /// to the preceding one when the last line is deleted, keeping its
    /// column where the new line allows.
    ///
    /// Deleting the only line of the buffer empties it instead, so
    /// `line_count` stays at 1 in that case.
    LineDel,
    /// Splits the cursor line at the cursor column; the cursor moves to the
    /// start of the second half. Both halves keep the line's ending.
    LineBreak,
    /// Appends the next line to the cursor line, which takes over the next
    /// line's ending. Fails with `Error::NoNextLine` on the last line.
    LineJoin,
    /// Copies `count` lines starting at the cursor line into the clipboard
    /// (fewer if the buffer ends first).
    LineCopy { count: usize },
    /// Inserts the clipboard lines before the cursor line; the cursor moves to
    /// the first pasted line.
    LinePaste,
}

/// Lines captured by `Op::LineCopy`. Holds pieces, so copying shares text
/// with the buffer instead of duplicating it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    lines: Vec<LineContent>,
}

impl Clipboard {
    pub fn new() -> Self {
        Clipboard::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Content of each copied line.
    pub fn lines(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.lines.iter().map(|content| {
            content
                .pieces
                .iter()
                .flat_map(|piece| piece.as_bytes().iter().copied())
                .collect()
        })
    }
}

impl Buffer {
    /// Applies `op` at `cursor`, repositioning the cursor as documented on
    /// each variant.
    pub fn apply(&mut self, op: Op, cursor: &mut Cursor, clipboard: &mut Clipboard) -> Result<()> {
        self.apply_recorded(op, cursor, clipboard).map(drop)
    }

    /// Like `apply`, returning the line changes the op made, in order.
    pub(crate) fn apply_recorded(
        &mut self,
        op: Op,
        cursor: &mut Cursor,
        clipboard: &mut Clipboard,
    ) -> Result<Vec<Change>> {
        let id = cursor.line();
        if self.line(id).is_none() {
            return Err(Error::StaleCursor);
        }
        let lineno = cursor.lineno();
        let count_before = self.line_count();

        let changes = match op {
            Op::LineInsert => {
                let blank = self.blank_line();
                let new = self.insert_before(id, Line::from_content(blank.clone()))?;
                cursor.set(new, lineno, 0);
                vec![Change::Inserted {
                    lineno,
                    content: blank,
                }]
            }
            Op::LineAppend => {
                let blank = self.blank_line();
                let new = self.insert_after(id, Line::from_content(blank.clone()))?;
                cursor.set(new, lineno + 1, 0);
                vec![Change::Inserted {
                    lineno: lineno + 1,
                    content: blank,
                }]
            }
            Op::LineDel => self.line_del(cursor)?,
            Op::LineBreak => {
                let line = self.node_mut(id)?;
                let before = line.content();
                let right = line.split_off(cursor.colno());
                let ending = line.ending();
                let after = line.content();
                let right = Line::from_pieces(right, ending);
                let inserted = right.content();
                let new = self.insert_after(id, right)?;
                cursor.set(new, lineno + 1, 0);
                vec![
                    Change::Replaced {
                        lineno,
                        before,
                        after,
                    },
                    Change::Inserted {
                        lineno: lineno + 1,
                        content: inserted,
                    },
                ]
            }
            Op::LineJoin => {
                let next = self.next_line(id).ok_or(Error::NoNextLine)?;
                let before = self.node(id)?.content();
                let removed = self.unlink(next)?.content();
                let line = self.node_mut(id)?;
                line.extend(removed.pieces.clone());
                line.ending = removed.ending;
                let after = line.content();
                vec![
                    Change::Replaced {
                        lineno,
                        before,
                        after,
                    },
                    Change::Removed {
                        lineno: lineno + 1,
                        content: removed,
                    },
                ]
            }
            Op::LineCopy { count } => {
                *clipboard = Clipboard {
                    lines: self
                        .lines_from(id)
                        .take(count.max(1))
                        .map(Line::content)
                        .collect(),
                };
                Vec::new()
            }
            Op::LinePaste => {
                if clipboard.is_empty() {
                    debug!("Buffer: paste with an empty clipboard, nothing to do.");
                    return Ok(Vec::new());
                }
                let mut changes = Vec::with_capacity(clipboard.len());
                let mut first_pasted = None;
                for (offset, content) in clipboard.lines.iter().enumerate() {
                    let new = self.insert_before(id, Line::from_content(content.clone()))?;
                    first_pasted.get_or_insert(new);
                    changes.push(Change::Inserted {
                        lineno: lineno + offset,
                        content: content.clone(),
                    });
                }
                if let Some(new) = first_pasted {
                    cursor.set(new, lineno, 0);
                }
                changes
            }
        };

        let expected = match op {
            Op::LineInsert | Op::LineAppend | Op::LineBreak => count_before + 1,
            Op::LineDel | Op::LineJoin => count_before.saturating_sub(1).max(1),
            Op::LineCopy { .. } => count_before,
            Op::LinePaste => count_before + clipboard.len(),
        };
        self.check_line_count(op, expected)?;
        if cursor.colno() > self.node(cursor.line())?.length() {
            return Err(Error::InvariantViolation(format!(
                "{:?} left the cursor at column {} past the end of its line",
                op,
                cursor.colno()
            )));
        }

        #[cfg(debug_assertions)]
        {
            self.check_invariants()?;
            cursor.validate(self)?;
        }

        debug!(
            "Buffer: applied {:?}; {} lines, cursor at {}:{}.",
            op,
            self.line_count(),
            cursor.lineno(),
            cursor.colno()
        );
        Ok(changes)
    }

    /// Cheap check run after every op, also in release builds.
    pub(crate) fn check_line_count(&self, op: Op, expected: usize) -> Result<()> {
        if self.line_count() != expected {
            return Err(Error::InvariantViolation(format!(
                "{:?} left {} lines, expected {}",
                op,
                self.line_count(),
                expected
            )));
        }
        Ok(())
    }

    fn line_del(&mut self, cursor: &mut Cursor) -> Result<Vec<Change>> {
        let id = cursor.line();
        let lineno = cursor.lineno();
        let (prev, next) = {
            let line = self.node(id)?;
            (line.prev(), line.next())
        };

        let (target, target_lineno) = match (next, prev) {
            (Some(next), _) => (next, lineno),
            (None, Some(prev)) => (prev, lineno.saturating_sub(1)),
            (None, None) => {
                let line = self.node_mut(id)?;
                let before = line.content();
                line.clear();
                let after = line.content();
                cursor.set(id, 0, 0);
                return Ok(vec![Change::Replaced {
                    lineno: 0,
                    before,
                    after,
                }]);
            }
        };

        let removed = self.unlink(id)?.content();
        let column = cursor.colno().min(self.node(target)?.length());
        cursor.set(target, target_lineno, column);
        Ok(vec![Change::Removed {
            lineno,
            content: removed,
        }])
    }

    fn blank_line(&self) -> LineContent {
        LineContent {
            pieces: Vec::new(),
            ending: self.line_ending(),
        }
    }

    fn lines_from(&self, id: LineId) -> impl Iterator<Item = &Line> + '_ {
        std::iter::successors(self.line(id), move |line| {
            line.next().and_then(|next| self.line(next))
        })
    }
}

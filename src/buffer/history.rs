// src/buffer/history.rs

//! Undo and redo over whole-line ops.
//!
//! Each applied op is logged as the line-level changes it made. A change
//! holds the content it inserted, removed or replaced, so undoing replays the
//! inverse changes in reverse order and redoing replays them forward. The
//! content shares pieces with the buffer, so an entry costs a few `Arc`
//! clones per touched line.

use log::{debug, trace};

use super::{Buffer, Clipboard, Cursor, Line, LineContent, Op};
use crate::error::Result;

/// Default number of ops kept for undo.
pub const DEFAULT_UNDO_LIMIT: usize = 1000;

/// One line-level change, addressed by 0-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Change {
    Inserted {
        lineno: usize,
        content: LineContent,
    },
    Removed {
        lineno: usize,
        content: LineContent,
    },
    Replaced {
        lineno: usize,
        before: LineContent,
        after: LineContent,
    },
}

impl Change {
    fn inverse(&self) -> Change {
        match self {
            Change::Inserted { lineno, content } => Change::Removed {
                lineno: *lineno,
                content: content.clone(),
            },
            Change::Removed { lineno, content } => Change::Inserted {
                lineno: *lineno,
                content: content.clone(),
            },
            Change::Replaced {
                lineno,
                before,
                after,
            } => Change::Replaced {
                lineno: *lineno,
                before: after.clone(),
                after: before.clone(),
            },
        }
    }

    /// Line count difference this change makes.
    fn delta(&self) -> isize {
        match self {
            Change::Inserted { .. } => 1,
            Change::Removed { .. } => -1,
            Change::Replaced { .. } => 0,
        }
    }
}

/// An applied op with the cursor positions around it.
#[derive(Debug, Clone)]
struct Entry {
    op: Op,
    changes: Vec<Change>,
    before: (usize, usize),
    after: (usize, usize),
}

/// Undo and redo stacks for one buffer.
///
/// Ops must reach the buffer through `History::apply` for the log to stay in
/// step with it. Applying a new op clears the redo stack.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        History::new(DEFAULT_UNDO_LIMIT)
    }
}

impl History {
    /// A history keeping at most `limit` ops (at least one).
    pub fn new(limit: usize) -> Self {
        History {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Applies `op` like `Buffer::apply` and logs it. Ops that leave the
    /// buffer untouched, like `LineCopy`, are not logged.
    pub fn apply(
        &mut self,
        buffer: &mut Buffer,
        op: Op,
        cursor: &mut Cursor,
        clipboard: &mut Clipboard,
    ) -> Result<()> {
        let before = (cursor.lineno(), cursor.colno());
        let changes = buffer.apply_recorded(op, cursor, clipboard)?;
        if changes.is_empty() {
            return Ok(());
        }

        self.redo_stack.clear();
        self.undo_stack.push(Entry {
            op,
            changes,
            before,
            after: (cursor.lineno(), cursor.colno()),
        });
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
        trace!("History: {} ops to undo.", self.undo_stack.len());
        Ok(())
    }

    /// Reverts the most recent op and puts the cursor back where it was
    /// before it. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, buffer: &mut Buffer, cursor: &mut Cursor) -> Result<bool> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(false);
        };
        let inverse: Vec<Change> = entry.changes.iter().rev().map(Change::inverse).collect();
        buffer.replay(entry.op, &inverse)?;
        cursor.jump(buffer, entry.before.0, entry.before.1);
        debug!("History: undid {:?}.", entry.op);
        self.redo_stack.push(entry);
        Ok(true)
    }

    /// Applies the most recently undone op again. Returns `false` when there
    /// is nothing to redo.
    pub fn redo(&mut self, buffer: &mut Buffer, cursor: &mut Cursor) -> Result<bool> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(false);
        };
        buffer.replay(entry.op, &entry.changes)?;
        cursor.jump(buffer, entry.after.0, entry.after.1);
        debug!("History: redid {:?}.", entry.op);
        self.undo_stack.push(entry);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Buffer {
    fn replay(&mut self, op: Op, changes: &[Change]) -> Result<()> {
        let delta: isize = changes.iter().map(Change::delta).sum();
        let expected = self.line_count().saturating_add_signed(delta);

        for change in changes {
            match change {
                Change::Inserted { lineno, content } => {
                    self.insert_at(*lineno, Line::from_content(content.clone()))?;
                }
                Change::Removed { lineno, .. } => {
                    self.remove_at(*lineno)?;
                }
                Change::Replaced { lineno, after, .. } => {
                    self.replace_at(*lineno, after.clone())?;
                }
            }
        }

        self.check_line_count(op, expected)?;
        #[cfg(debug_assertions)]
        self.check_invariants()?;
        Ok(())
    }
}

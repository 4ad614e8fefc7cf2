// src/view.rs

//! Read-only rendering seam, called after each processed event.

use std::io::{self, Write};

use crate::editor::Editor;

pub trait View {
    fn render(&mut self, editor: &Editor, out: &mut dyn Write) -> io::Result<()>;
}

/// Draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl View for NullView {
    fn render(&mut self, _editor: &Editor, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}

/// One status row at the bottom of the screen: file name, cursor position
/// (1-based) and line count. The terminal cursor is then parked on the
/// buffer cursor's cell.
#[derive(Debug, Default, Clone)]
pub struct StatusLine {
    last: Option<(String, (u16, u16))>,
}

impl StatusLine {
    pub fn new() -> Self {
        StatusLine::default()
    }

    pub fn text(editor: &Editor) -> String {
        let cursor = editor.cursor();
        let buffer = editor.buffer();
        format!(
            "{} {}:{} {} lines",
            buffer.filename().display(),
            cursor.lineno() + 1,
            cursor.colno() + 1,
            buffer.line_count()
        )
    }
}

impl View for StatusLine {
    fn render(&mut self, editor: &Editor, out: &mut dyn Write) -> io::Result<()> {
        let (cols, rows) = editor.size();
        let mut text = StatusLine::text(editor);
        if let Some((cut, _)) = text.char_indices().nth(usize::from(cols)) {
            text.truncate(cut);
        }
        if let Some((ref last_text, last_size)) = self.last {
            if *last_text == text && last_size == (cols, rows) {
                return Ok(());
            }
        }

        let cursor = editor.cursor();
        // Rows and columns are 1-based in CUP.
        write!(out, "\x1b[{};1H\x1b[2K{}", rows.max(1), text)?;
        write!(
            out,
            "\x1b[{};{}H",
            (cursor.lineno() + 1).min(usize::from(rows.max(1))),
            (cursor.colno() + 1).min(usize::from(cols.max(1)))
        )?;
        out.flush()?;
        self.last = Some((text, (cols, rows)));
        Ok(())
    }
}

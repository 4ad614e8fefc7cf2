// src/buffer/line.rs

use std::cell::Cell;

use super::piece::{rune_offset, Piece};
use super::{LineEnding, LineId};

/// Text and terminator of a line, detached from any buffer. Shares the
/// pieces with the line it was taken from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LineContent {
    pub(crate) pieces: Vec<Piece>,
    pub(crate) ending: LineEnding,
}

/// One line of text, stored as an ordered sequence of pieces.
///
/// The rune count is computed lazily and cached until the pieces change.
/// `prev`/`next` are arena handles owned by the `Buffer`; a line never refers
/// to its buffer.
#[derive(Debug, Default)]
pub struct Line {
    pieces: Vec<Piece>,
    length: Cell<Option<usize>>,
    pub(crate) ending: LineEnding,
    pub(crate) prev: Option<LineId>,
    pub(crate) next: Option<LineId>,
}

impl Line {
    pub fn new() -> Self {
        Line::default()
    }

    pub fn from_piece(piece: impl Into<Piece>) -> Self {
        let mut line = Line::new();
        line.append_piece(piece);
        line
    }

    pub(crate) fn from_pieces(pieces: Vec<Piece>, ending: LineEnding) -> Self {
        let mut line = Line::new();
        line.extend(pieces);
        line.ending = ending;
        line
    }

    pub(crate) fn from_content(content: LineContent) -> Self {
        Line::from_pieces(content.pieces, content.ending)
    }

    /// Appends a fragment. Empty fragments are dropped.
    pub fn append_piece(&mut self, piece: impl Into<Piece>) {
        let piece = piece.into();
        if !piece.is_empty() {
            self.pieces.push(piece);
        }
        self.invalidate();
    }

    /// Number of runes in the line.
    pub fn length(&self) -> usize {
        if let Some(length) = self.length.get() {
            return length;
        }
        let length = self.pieces.iter().map(Piece::rune_count).sum();
        self.length.set(Some(length));
        length
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn byte_len(&self) -> usize {
        self.pieces.iter().map(Piece::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Concatenated content of all pieces.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len());
        for piece in &self.pieces {
            bytes.extend_from_slice(piece.as_bytes());
        }
        bytes
    }

    /// Terminator written after this line.
    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    pub(crate) fn content(&self) -> LineContent {
        LineContent {
            pieces: self.pieces.clone(),
            ending: self.ending,
        }
    }

    /// Swaps in `content`, keeping the links.
    pub(crate) fn set_content(&mut self, content: LineContent) {
        self.pieces.clear();
        self.extend(content.pieces);
        self.ending = content.ending;
    }

    pub fn prev(&self) -> Option<LineId> {
        self.prev
    }

    pub fn next(&self) -> Option<LineId> {
        self.next
    }

    /// Cuts the line at rune `column`, keeping the left part and returning the
    /// pieces of the right part. Only the piece containing the cut is split.
    pub(crate) fn split_off(&mut self, column: usize) -> Vec<Piece> {
        let mut remaining = column;
        let mut index = 0;
        while index < self.pieces.len() {
            let runes = self.pieces[index].rune_count();
            if remaining < runes {
                break;
            }
            remaining -= runes;
            index += 1;
        }

        let mut right = self.pieces.split_off(index);
        if remaining > 0 {
            if let Some(first) = right.first() {
                let offset = rune_offset(first.as_bytes(), remaining);
                let (head, tail) = first.split_at(offset);
                self.pieces.push(head);
                right[0] = tail;
            }
        }
        self.invalidate();
        right
    }

    pub(crate) fn extend(&mut self, pieces: Vec<Piece>) {
        self.pieces
            .extend(pieces.into_iter().filter(|piece| !piece.is_empty()));
        self.invalidate();
    }

    pub(crate) fn clear(&mut self) {
        self.pieces.clear();
        self.invalidate();
    }

    fn invalidate(&self) {
        self.length.set(None);
    }
}

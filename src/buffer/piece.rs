// src/buffer/piece.rs

//! Immutable text fragments composing a line.

use std::fmt;
use std::sync::Arc;

/// A view of a byte range inside a shared, immutable allocation.
///
/// Cloning and splitting a piece never copies text: a loaded file is one
/// allocation and every piece created from it points into it.
#[derive(Clone)]
pub struct Piece {
    text: Arc<[u8]>,
    start: usize,
    end: usize,
}

impl Piece {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        let text = bytes.into();
        let end = text.len();
        Piece {
            text,
            start: 0,
            end,
        }
    }

    /// A piece covering `text[start..end]`.
    pub(crate) fn slice(text: &Arc<[u8]>, start: usize, end: usize) -> Self {
        debug_assert!(start <= end && end <= text.len());
        Piece {
            text: Arc::clone(text),
            start,
            end,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.text[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn rune_count(&self) -> usize {
        rune_count(self.as_bytes())
    }

    /// Splits at a byte offset relative to the start of the piece. Both halves
    /// keep sharing the original allocation.
    pub fn split_at(&self, offset: usize) -> (Piece, Piece) {
        let pivot = self.start + offset.min(self.len());
        (
            Piece::slice(&self.text, self.start, pivot),
            Piece::slice(&self.text, pivot, self.end),
        )
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Piece({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl PartialEq for Piece {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Piece {}

impl From<&[u8]> for Piece {
    fn from(bytes: &[u8]) -> Self {
        Piece::new(bytes)
    }
}

impl From<Vec<u8>> for Piece {
    fn from(bytes: Vec<u8>) -> Self {
        Piece::new(bytes)
    }
}

impl From<&str> for Piece {
    fn from(text: &str) -> Self {
        Piece::new(text.as_bytes())
    }
}

impl From<String> for Piece {
    fn from(text: String) -> Self {
        Piece::new(text.into_bytes())
    }
}

/// Counts UTF-8 runes. Each byte of a malformed sequence counts as one rune.
pub fn rune_count(bytes: &[u8]) -> usize {
    bytes
        .utf8_chunks()
        .map(|chunk| chunk.valid().chars().count() + chunk.invalid().len())
        .sum()
}

/// Byte offset of the rune at index `runes`, or `bytes.len()` past the end.
pub fn rune_offset(bytes: &[u8], runes: usize) -> usize {
    let mut remaining = runes;
    let mut offset = 0;
    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            if remaining == 0 {
                return offset;
            }
            remaining -= 1;
            offset += c.len_utf8();
        }
        for _ in chunk.invalid() {
            if remaining == 0 {
                return offset;
            }
            remaining -= 1;
            offset += 1;
        }
    }
    offset
}

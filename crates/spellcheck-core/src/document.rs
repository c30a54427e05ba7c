//! Rope-backed reference document.
//!
//! [`BufferDocument`] is a small [`Document`] implementation for hosts that do
//! not bring their own text storage (demos, tests, simple embedders). It keeps
//! text in a rope for O(log n) line access and decodes ranges with an identity
//! offset map (no escape sequences).

use ropey::Rope;

use crate::collaborators::{DecodedText, Document};
use crate::position::{DocRange, Position};

/// An editable in-memory document implementing [`Document`].
#[derive(Debug, Clone)]
pub struct BufferDocument {
    rope: Rope,
}

impl BufferDocument {
    /// Create a document from initial text.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Create an empty document.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// The full document text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Insert `text` at `pos`, returning the range now covering the inserted
    /// text (what the engine's `on_text_inserted` expects).
    pub fn insert(&mut self, pos: Position, text: &str) -> DocRange {
        let idx = self.char_index(pos);
        self.rope.insert(idx, text);

        let newlines = text.chars().filter(|&c| c == '\n').count();
        let end = if newlines == 0 {
            Position::new(pos.line, pos.column + text.chars().count())
        } else {
            let tail = text.rsplit('\n').next().unwrap_or("");
            Position::new(pos.line + newlines, tail.chars().count())
        };
        DocRange::new(pos, end)
    }

    /// Remove `range`, returning it unchanged (what the engine's
    /// `on_text_removed` expects: pre-edit coordinates of the deleted text).
    pub fn remove(&mut self, range: DocRange) -> DocRange {
        let start = self.char_index(range.start);
        let end = self.char_index(range.end);
        self.rope.remove(start..end);
        range
    }

    /// Replace the whole document (host-side reload).
    pub fn replace_all(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    fn char_index(&self, pos: Position) -> usize {
        let line = pos.line.min(self.rope.len_lines().saturating_sub(1));
        let line_start = self.rope.line_to_char(line);
        line_start + pos.column.min(self.line_length(line))
    }
}

impl Document for BufferDocument {
    fn document_range(&self) -> DocRange {
        let last_line = self.rope.len_lines().saturating_sub(1);
        DocRange::new(
            Position::start(),
            Position::new(last_line, self.line_length(last_line)),
        )
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_length(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        // Trim the terminator ("\n" or "\r\n") off the rope line.
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        len
    }

    fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let len = self.line_length(line);
        let slice = self.rope.line(line);
        Some(slice.slice(..len).to_string())
    }

    fn char_at(&self, pos: Position) -> Option<char> {
        if pos.line >= self.rope.len_lines() || pos.column >= self.line_length(pos.line) {
            return None;
        }
        let idx = self.rope.line_to_char(pos.line) + pos.column;
        Some(self.rope.char(idx))
    }

    fn decode(&self, range: DocRange) -> DecodedText {
        let mut decoded = DecodedText::default();
        let Some(range) = range.intersect(&self.document_range()) else {
            return decoded;
        };

        let mut pos = range.start;
        while pos < range.end {
            let line_len = self.line_length(pos.line);
            if pos.column < line_len {
                if let Some(c) = self.char_at(pos) {
                    decoded.text.push(c);
                    decoded.offsets.push(pos);
                }
                pos.column += 1;
            } else {
                // Line break inside the range.
                decoded.text.push('\n');
                decoded.offsets.push(pos);
                pos = Position::new(pos.line + 1, 0);
            }
        }
        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_length_excludes_terminator() {
        let doc = BufferDocument::new("abc\ndefg\n");
        assert_eq!(doc.line_length(0), 3);
        assert_eq!(doc.line_length(1), 4);
        assert_eq!(doc.line_length(2), 0);
        assert_eq!(doc.line_count(), 3);
    }

    #[test]
    fn test_insert_returns_inserted_range() {
        let mut doc = BufferDocument::new("hello world");
        let r = doc.insert(Position::new(0, 5), ", big");
        assert_eq!(r, DocRange::from_coords(0, 5, 0, 10));
        assert_eq!(doc.text(), "hello, big world");

        let r = doc.insert(Position::new(0, 6), "X\nYZ");
        assert_eq!(r, DocRange::from_coords(0, 6, 1, 2));
        assert_eq!(doc.text(), "hello,X\nYZ big world");
    }

    #[test]
    fn test_remove() {
        let mut doc = BufferDocument::new("one two three");
        doc.remove(DocRange::from_coords(0, 3, 0, 7));
        assert_eq!(doc.text(), "one three");
    }

    #[test]
    fn test_char_at_line_end_is_none() {
        let doc = BufferDocument::new("ab\ncd");
        assert_eq!(doc.char_at(Position::new(0, 1)), Some('b'));
        assert_eq!(doc.char_at(Position::new(0, 2)), None);
        assert_eq!(doc.char_at(Position::new(1, 0)), Some('c'));
    }

    #[test]
    fn test_decode_spans_lines_with_offset_map() {
        let doc = BufferDocument::new("ab\ncd");
        let decoded = doc.decode(DocRange::from_coords(0, 1, 1, 1));
        assert_eq!(decoded.text, "b\nc");
        assert_eq!(
            decoded.offsets,
            vec![
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(1, 0),
            ]
        );
    }

    #[test]
    fn test_decode_clamps_to_document() {
        let doc = BufferDocument::new("ab");
        let decoded = doc.decode(DocRange::from_coords(0, 1, 9, 9));
        assert_eq!(decoded.text, "b");
    }
}

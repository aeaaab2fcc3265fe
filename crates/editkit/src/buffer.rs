//! Character storage layer.
//!
//! [`TextBuffer`] owns the authoritative document content on a rope, giving
//! O(log n) edits and — the part everything else leans on — a consistent
//! character-offset ↔ UTF-8 byte-offset mapping. The line index addresses the
//! document in characters; a grammar engine addresses it in bytes; both read
//! through this one type so the two views can never drift apart.

use crate::delta::{ByteEdit, ByteRange, CharRange, EditDelta, Point};
use ropey::Rope;

/// Rope-backed character storage with byte-offset bridging.
///
/// All character offsets accepted by this type are clamped into the valid
/// range rather than rejected; geometry and indexing code upstream relies on
/// reads never failing.
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a buffer from initial text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Total byte count.
    pub fn byte_count(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Replace `range` (clamped) with `text`, returning the combined
    /// character/byte delta describing what changed.
    pub fn replace(&mut self, range: CharRange, text: &str) -> EditDelta {
        let before_char_count = self.rope.len_chars();
        let range = range.clamped(before_char_count);

        let start_byte = self.rope.char_to_byte(range.start);
        let old_end_byte = self.rope.char_to_byte(range.end);
        let start_point = self.point_at_byte(start_byte);
        let old_end_point = self.point_at_byte(old_end_byte);

        if !range.is_empty() {
            self.rope.remove(range.start..range.end);
        }
        if !text.is_empty() {
            self.rope.insert(range.start, text);
        }

        let new_end_byte = start_byte + text.len();
        let new_end_point = start_point.advanced_by(text);

        EditDelta {
            replaced: range,
            inserted_len: text.chars().count(),
            before_char_count,
            after_char_count: self.rope.len_chars(),
            byte_edit: ByteEdit {
                start_byte,
                old_end_byte,
                new_end_byte,
                start_point,
                old_end_point,
                new_end_point,
            },
        }
    }

    /// Text of `range` (clamped) as an owned `String`.
    pub fn substring(&self, range: CharRange) -> String {
        let range = range.clamped(self.rope.len_chars());
        self.rope.slice(range.start..range.end).to_string()
    }

    /// The whole document as an owned `String`.
    pub fn to_text(&self) -> String {
        self.rope.to_string()
    }

    /// UTF-8 byte range corresponding to a character range (clamped).
    pub fn byte_range(&self, range: CharRange) -> ByteRange {
        let range = range.clamped(self.rope.len_chars());
        ByteRange::new(
            self.rope.char_to_byte(range.start),
            self.rope.char_to_byte(range.end),
        )
    }

    /// Character offset containing the given byte offset (clamped).
    pub fn char_offset_for_byte(&self, byte_offset: usize) -> usize {
        self.rope
            .byte_to_char(byte_offset.min(self.rope.len_bytes()))
    }

    /// Byte offset of the given character offset (clamped).
    pub fn byte_offset_for_char(&self, char_offset: usize) -> usize {
        self.rope
            .char_to_byte(char_offset.min(self.rope.len_chars()))
    }

    /// Row/byte-column position of a byte offset (clamped).
    pub fn point_at_byte(&self, byte_offset: usize) -> Point {
        let byte_offset = byte_offset.min(self.rope.len_bytes());
        let row = self.rope.byte_to_line(byte_offset);
        let line_start = self.rope.line_to_byte(row);
        Point::new(row, byte_offset - line_start)
    }

    /// A contiguous run of bytes starting at `byte_offset`.
    ///
    /// Returns the empty slice for any offset at or past the end of the
    /// document — the explicit end-of-input signal a pull-based reader needs.
    /// The returned span is finite (one rope chunk at most); callers must
    /// keep asking at advancing offsets until they see the empty slice.
    pub fn bytes_at(&self, byte_offset: usize) -> &[u8] {
        if byte_offset >= self.rope.len_bytes() {
            return &[];
        }
        let (chunk, chunk_start, _, _) = self.rope.chunk_at_byte(byte_offset);
        &chunk.as_bytes()[byte_offset - chunk_start..]
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

//! Structured edit deltas.
//!
//! Every successful document mutation is described twice: once in **character
//! offsets** (Unicode scalar values) for line-index consumers, and once in
//! **byte offsets** plus row/column positions for an incremental parser.
//! Producing both at the edit site means downstream consumers never have to
//! diff old/new text to find out what changed.

/// A half-open range of character offsets (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRange {
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
}

impl CharRange {
    /// Create a range. `start` and `end` are swapped if given out of order.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// An empty range positioned at `offset`.
    pub fn empty_at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the range covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Clamp both endpoints into `[0, max]`.
    pub fn clamped(self, max: usize) -> Self {
        Self {
            start: self.start.min(max),
            end: self.end.min(max),
        }
    }
}

/// A half-open range of byte offsets (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl ByteRange {
    /// Create a byte range.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A row/column position. `row` counts lines, `column` counts **bytes** from
/// the start of the row — the convention grammar engines expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    /// Zero-based line number.
    pub row: usize,
    /// Byte column within the line.
    pub column: usize,
}

impl Point {
    /// Create a point.
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Advance this point across `text`, as if `text` were appended at it.
    pub fn advanced_by(mut self, text: &str) -> Self {
        let mut parts = text.split('\n');
        let Some(first) = parts.next() else {
            return self;
        };

        self.column = self.column.saturating_add(first.len());
        for part in parts {
            self.row = self.row.saturating_add(1);
            self.column = part.len();
        }

        self
    }
}

/// The byte-addressed description of one edit, in the shape an incremental
/// parser consumes: where the edit started, where the replaced range used to
/// end, and where the replacement ends now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteEdit {
    /// Byte offset where the edit begins.
    pub start_byte: usize,
    /// Exclusive end of the replaced range in the pre-edit document.
    pub old_end_byte: usize,
    /// Exclusive end of the replacement in the post-edit document.
    pub new_end_byte: usize,
    /// Position of `start_byte`.
    pub start_point: Point,
    /// Position of `old_end_byte` in the pre-edit document.
    pub old_end_point: Point,
    /// Position of `new_end_byte` in the post-edit document.
    pub new_end_point: Point,
}

/// Everything a consumer needs to know about one applied edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDelta {
    /// The replaced character range (clamped, in the pre-edit document).
    pub replaced: CharRange,
    /// Character length of the inserted text.
    pub inserted_len: usize,
    /// Character count before the edit.
    pub before_char_count: usize,
    /// Character count after the edit.
    pub after_char_count: usize,
    /// The same edit in byte offsets and positions.
    pub byte_edit: ByteEdit,
}

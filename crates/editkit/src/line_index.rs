//! Edit-indexed line tree.
//!
//! [`LineIndex`] tracks the line structure of a document as an AVL tree whose
//! nodes live in a flat arena and carry subtree aggregates (character count,
//! line count, summed line height). Line numbers and start offsets are never
//! stored — they are derived from tree rank during an O(log n) descent, so an
//! edit near the top of a large document never renumbers anything below it.
//!
//! The index stores line *lengths*, not line text; it is kept in sync by
//! feeding it the same character deltas applied to the [`crate::TextBuffer`].
//! It must be the sole mutator of line structure: callers that bypass
//! [`LineIndex::insert`] / [`LineIndex::delete`] get no error, just a broken
//! index.
//!
//! A line is `length` content characters plus a delimiter of 0, 1 (`"\n"`) or
//! 2 (`"\r\n"`) characters. A lone `'\r'` is ordinary content. The last line
//! always has delimiter length 0, and is the only line that does.

use crate::delta::CharRange;

const NIL: usize = usize::MAX;

/// Default height assigned to lines that have not been measured yet.
pub const DEFAULT_LINE_HEIGHT: f64 = 16.0;

/// Stable identity of a line. Ids survive edits to other lines and are only
/// retired when the line itself is merged away or the document is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId(usize);

/// A resolved snapshot of one line, produced by a lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Stable line identity (arena slot).
    pub id: LineId,
    /// Zero-based line number, derived from tree rank.
    pub row: usize,
    /// Character offset of the line start.
    pub location: usize,
    /// Content length in characters, excluding the delimiter.
    pub length: usize,
    /// Delimiter length: 0 (none), 1 (LF) or 2 (CRLF).
    pub delimiter_len: usize,
    /// Sum of the heights of all preceding lines.
    pub y_offset: f64,
    /// Cached height of this line (fragment count × line height).
    pub height: f64,
}

impl Line {
    /// Content + delimiter length in characters.
    pub fn total_len(&self) -> usize {
        self.length + self.delimiter_len
    }

    /// Character range of the line content (delimiter excluded).
    pub fn content_range(&self) -> CharRange {
        CharRange::new(self.location, self.location + self.length)
    }
}

/// Outcome of a structural edit, for precise cache invalidation.
#[derive(Debug, Clone, Default)]
pub struct IndexEdit {
    /// First affected row (post-edit).
    pub first_row: usize,
    /// Last affected row (post-edit).
    pub last_row: usize,
    /// Lines still present whose text changed.
    pub invalidated: Vec<LineId>,
    /// Lines removed by the edit. Their ids must not be used again.
    pub removed: Vec<LineId>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: usize,
    left: usize,
    right: usize,
    /// AVL height of the subtree rooted here.
    depth: i32,
    length: usize,
    delimiter_len: usize,
    height: f64,
    subtree_chars: usize,
    subtree_lines: usize,
    subtree_height: f64,
    in_use: bool,
}

/// Balanced line tree over a node arena.
pub struct LineIndex {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: usize,
    default_height: f64,
}

impl LineIndex {
    /// Create an index for an empty document: a single zero-length,
    /// zero-delimiter line.
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// Build an index from initial text.
    pub fn from_text(text: &str) -> Self {
        let mut index = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
            default_height: DEFAULT_LINE_HEIGHT,
        };
        let recs = scan_segments(text);
        index.root = index.build_balanced(&recs, NIL);
        index
    }

    /// Total character count tracked by the index (sum of all line totals).
    pub fn char_count(&self) -> usize {
        self.nodes[self.root].subtree_chars
    }

    /// Total line count. Always at least 1.
    pub fn line_count(&self) -> usize {
        self.nodes[self.root].subtree_lines
    }

    /// Summed height of all lines.
    pub fn total_height(&self) -> f64 {
        self.nodes[self.root].subtree_height
    }

    /// Height assigned to lines created by future edits.
    pub fn set_default_line_height(&mut self, height: f64) {
        self.default_height = height.max(f64::MIN_POSITIVE);
    }

    /// The line containing the character at `offset` (clamped).
    ///
    /// An offset on a line boundary resolves to the line that *starts* there,
    /// except `offset == char_count()`, which resolves to the last line.
    pub fn line_containing(&self, offset: usize) -> Line {
        let total = self.char_count();
        let offset = offset.min(total);
        if offset == total {
            return self.line_at_row(self.line_count() - 1);
        }

        let mut n = self.root;
        let mut off = offset;
        let mut location = 0usize;
        let mut row = 0usize;
        let mut y = 0.0f64;
        loop {
            let left = self.nodes[n].left;
            if left != NIL {
                let lc = self.nodes[left].subtree_chars;
                if off < lc {
                    n = left;
                    continue;
                }
                off -= lc;
                location += lc;
                row += self.nodes[left].subtree_lines;
                y += self.nodes[left].subtree_height;
            }
            let node_total = self.nodes[n].length + self.nodes[n].delimiter_len;
            if off < node_total {
                return self.line_info(n, row, location, y);
            }
            off -= node_total;
            location += node_total;
            row += 1;
            y += self.nodes[n].height;
            n = self.nodes[n].right;
        }
    }

    /// The line at row `row` (clamped to the last row).
    pub fn line_at_row(&self, row: usize) -> Line {
        let row = row.min(self.line_count() - 1);

        let mut n = self.root;
        let mut r = row;
        let mut location = 0usize;
        let mut y = 0.0f64;
        loop {
            let left = self.nodes[n].left;
            let left_lines = if left != NIL {
                self.nodes[left].subtree_lines
            } else {
                0
            };
            if r < left_lines {
                n = left;
                continue;
            }
            if left != NIL {
                location += self.nodes[left].subtree_chars;
                y += self.nodes[left].subtree_height;
            }
            if r == left_lines {
                return self.line_info(n, row, location, y);
            }
            r -= left_lines + 1;
            location += self.nodes[n].length + self.nodes[n].delimiter_len;
            y += self.nodes[n].height;
            n = self.nodes[n].right;
        }
    }

    /// Record the measured height of a line. Aggregates along the path to the
    /// root are repaired; unknown (retired) ids are ignored.
    pub fn set_line_height(&mut self, id: LineId, height: f64) {
        let n = id.0;
        if n >= self.nodes.len() || !self.nodes[n].in_use {
            return;
        }
        if self.nodes[n].height == height {
            return;
        }
        self.nodes[n].height = height;
        self.fix_aggregates_upward(n);
    }

    /// Apply an insertion of `text` at `offset` (clamped) to the line
    /// structure.
    pub fn insert(&mut self, offset: usize, text: &str) -> IndexEdit {
        if text.is_empty() {
            return IndexEdit::default();
        }
        let offset = offset.min(self.char_count());
        let line = self.line_containing(offset);
        let local = offset - line.location;

        let recs = if local <= line.length {
            // Insertion into line content: head + text + tail, tail keeps the
            // original delimiter.
            let head = local;
            let tail = line.length - local;
            let segs = scan_segments(text);
            let last = segs.len() - 1;
            let mut recs: Vec<(usize, usize)> = Vec::with_capacity(segs.len());
            for (i, &(len, delim)) in segs.iter().enumerate() {
                let mut length = len;
                let mut delim = if i < last { delim } else { line.delimiter_len };
                if i == 0 {
                    length += head;
                }
                if i == last {
                    length += tail;
                    // A trailing '\r' in the inserted text directly before the
                    // line's lone-LF delimiter forms a CRLF delimiter.
                    if tail == 0 && delim == 1 && text.ends_with('\r') {
                        length -= 1;
                        delim = 2;
                    }
                }
                recs.push((length, delim));
            }
            recs
        } else {
            // Insertion between the '\r' and '\n' of a CRLF delimiter. Both
            // seam characters are known, so the region rescans exactly.
            debug_assert_eq!(line.delimiter_len, 2);
            debug_assert_eq!(local, line.length + 1);
            let synthetic = format!("\r{text}\n");
            let mut segs = scan_segments(&synthetic);
            // The synthetic region ends on a delimiter; the empty trailing
            // segment belongs to the next document line, not this region.
            let trailing = segs.pop();
            debug_assert_eq!(trailing, Some((0, 0)));
            let mut recs: Vec<(usize, usize)> = Vec::with_capacity(segs.len());
            for (i, &(len, delim)) in segs.iter().enumerate() {
                let length = if i == 0 { line.length + len } else { len };
                recs.push((length, delim));
            }
            recs
        };

        self.replace_rows(line.row, line.row, line.id, recs)
    }

    /// Apply a deletion of `range` (clamped) to the line structure. Partial
    /// line remnants at the boundaries are merged into a single line.
    pub fn delete(&mut self, range: CharRange) -> IndexEdit {
        let range = range.clamped(self.char_count());
        if range.is_empty() {
            return IndexEdit::default();
        }

        let first = self.line_containing(range.start);
        let last = self.line_containing(range.end);
        let local_start = range.start - first.location;
        let local_end = range.end - last.location;

        // Kept prefix of the first line. Deleting from inside a CRLF
        // delimiter keeps its known '\r'.
        let (head, head_is_cr) = if local_start <= first.length {
            (local_start, false)
        } else {
            debug_assert_eq!(first.delimiter_len, 2);
            (first.length, true)
        };

        // Kept suffix of the last line. Deleting up to the inside of a CRLF
        // delimiter keeps its known '\n'.
        let (tail, tail_delim, tail_is_lf) = if local_end <= last.length {
            (last.length - local_end, last.delimiter_len, false)
        } else {
            debug_assert_eq!(last.delimiter_len, 2);
            debug_assert_eq!(local_end, last.length + 1);
            (0, 0, true)
        };

        let rec = if tail_is_lf {
            if head_is_cr {
                // "\r" + "\n" reassemble into a CRLF delimiter.
                (head, 2)
            } else {
                (head, 1)
            }
        } else if head_is_cr && tail == 0 && tail_delim == 1 {
            // Kept '\r' meets the last line's lone-LF delimiter.
            (head, 2)
        } else {
            let cr = if head_is_cr { 1 } else { 0 };
            (head + cr + tail, tail_delim)
        };

        self.replace_rows(first.row, last.row, first.id, vec![rec])
    }

    /// Reclassify a trailing content `'\r'` as the first half of a CRLF
    /// delimiter. The index never sees text, so the caller is responsible for
    /// having observed the `'\r'`; totals are unchanged.
    pub(crate) fn reclassify_trailing_cr(&mut self, id: LineId) {
        let n = id.0;
        debug_assert!(self.nodes[n].in_use);
        debug_assert_eq!(self.nodes[n].delimiter_len, 1);
        debug_assert!(self.nodes[n].length > 0);
        self.nodes[n].length -= 1;
        self.nodes[n].delimiter_len = 2;
    }

    /// All lines in document order. Intended for tests and bulk consumers;
    /// per-line queries should use the O(log n) lookups.
    pub fn lines(&self) -> Vec<Line> {
        let mut out = Vec::with_capacity(self.line_count());
        let mut location = 0usize;
        let mut y = 0.0f64;
        self.walk_in_order(self.root, &mut |index, n| {
            let row = out.len();
            let line = index.line_info(n, row, location, y);
            location += line.total_len();
            y += line.height;
            out.push(line);
        });
        out
    }

    // --- internals ---

    fn line_info(&self, n: usize, row: usize, location: usize, y: f64) -> Line {
        let node = &self.nodes[n];
        Line {
            id: LineId(n),
            row,
            location,
            length: node.length,
            delimiter_len: node.delimiter_len,
            y_offset: y,
            height: node.height,
        }
    }

    /// Replace rows `first_row..=last_row` with `recs`. The node at
    /// `first_row` (which must be `reuse`) is updated in place so its id and
    /// cache entries can be invalidated rather than dropped; surplus rows are
    /// removed, extra records are inserted after it.
    fn replace_rows(
        &mut self,
        first_row: usize,
        last_row: usize,
        reuse: LineId,
        recs: Vec<(usize, usize)>,
    ) -> IndexEdit {
        debug_assert!(!recs.is_empty());
        let mut removed = Vec::new();
        for _ in first_row..last_row {
            removed.push(self.remove_at_row(first_row + 1));
        }

        self.nodes[reuse.0].length = recs[0].0;
        self.nodes[reuse.0].delimiter_len = recs[0].1;
        self.fix_aggregates_upward(reuse.0);

        for (i, &(length, delim)) in recs.iter().enumerate().skip(1) {
            self.insert_at_row(first_row + i, length, delim);
        }

        IndexEdit {
            first_row,
            last_row: first_row + recs.len() - 1,
            invalidated: vec![reuse],
            removed,
        }
    }

    fn alloc(&mut self, length: usize, delimiter_len: usize) -> usize {
        let node = Node {
            parent: NIL,
            left: NIL,
            right: NIL,
            depth: 1,
            length,
            delimiter_len,
            height: self.default_height,
            subtree_chars: length + delimiter_len,
            subtree_lines: 1,
            subtree_height: self.default_height,
            in_use: true,
        };
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn build_balanced(&mut self, recs: &[(usize, usize)], parent: usize) -> usize {
        if recs.is_empty() {
            return NIL;
        }
        let mid = recs.len() / 2;
        let n = self.alloc(recs[mid].0, recs[mid].1);
        self.nodes[n].parent = parent;
        let left = self.build_balanced(&recs[..mid], n);
        let right = self.build_balanced(&recs[mid + 1..], n);
        self.nodes[n].left = left;
        self.nodes[n].right = right;
        self.update(n);
        n
    }

    fn depth(&self, n: usize) -> i32 {
        if n == NIL { 0 } else { self.nodes[n].depth }
    }

    fn balance_factor(&self, n: usize) -> i32 {
        self.depth(self.nodes[n].left) - self.depth(self.nodes[n].right)
    }

    fn update(&mut self, n: usize) {
        let node = &self.nodes[n];
        let (left, right) = (node.left, node.right);
        let mut chars = node.length + node.delimiter_len;
        let mut lines = 1usize;
        let mut height_sum = node.height;
        let mut depth = 1i32;
        for child in [left, right] {
            if child != NIL {
                let c = &self.nodes[child];
                chars += c.subtree_chars;
                lines += c.subtree_lines;
                height_sum += c.subtree_height;
                depth = depth.max(1 + c.depth);
            }
        }
        let node = &mut self.nodes[n];
        node.subtree_chars = chars;
        node.subtree_lines = lines;
        node.subtree_height = height_sum;
        node.depth = depth;
    }

    fn fix_aggregates_upward(&mut self, mut n: usize) {
        while n != NIL {
            self.update(n);
            n = self.nodes[n].parent;
        }
    }

    fn rotate_left(&mut self, x: usize) -> usize {
        let y = self.nodes[x].right;
        let t = self.nodes[y].left;
        let p = self.nodes[x].parent;

        self.nodes[y].parent = p;
        if p == NIL {
            self.root = y;
        } else if self.nodes[p].left == x {
            self.nodes[p].left = y;
        } else {
            self.nodes[p].right = y;
        }

        self.nodes[y].left = x;
        self.nodes[x].parent = y;
        self.nodes[x].right = t;
        if t != NIL {
            self.nodes[t].parent = x;
        }

        self.update(x);
        self.update(y);
        y
    }

    fn rotate_right(&mut self, x: usize) -> usize {
        let y = self.nodes[x].left;
        let t = self.nodes[y].right;
        let p = self.nodes[x].parent;

        self.nodes[y].parent = p;
        if p == NIL {
            self.root = y;
        } else if self.nodes[p].left == x {
            self.nodes[p].left = y;
        } else {
            self.nodes[p].right = y;
        }

        self.nodes[y].right = x;
        self.nodes[x].parent = y;
        self.nodes[x].left = t;
        if t != NIL {
            self.nodes[t].parent = x;
        }

        self.update(x);
        self.update(y);
        y
    }

    /// Repair aggregates and AVL balance from `n` up to the root.
    fn rebalance_upward(&mut self, mut n: usize) {
        while n != NIL {
            self.update(n);
            let bf = self.balance_factor(n);
            let subtree_root = if bf > 1 {
                if self.balance_factor(self.nodes[n].left) < 0 {
                    self.rotate_left(self.nodes[n].left);
                }
                self.rotate_right(n)
            } else if bf < -1 {
                if self.balance_factor(self.nodes[n].right) > 0 {
                    self.rotate_right(self.nodes[n].right);
                }
                self.rotate_left(n)
            } else {
                n
            };
            n = self.nodes[subtree_root].parent;
        }
    }

    fn insert_at_row(&mut self, row: usize, length: usize, delimiter_len: usize) -> LineId {
        let new = self.alloc(length, delimiter_len);
        if self.root == NIL {
            self.root = new;
            return LineId(new);
        }

        let mut n = self.root;
        let mut r = row;
        loop {
            let left = self.nodes[n].left;
            let left_lines = if left != NIL {
                self.nodes[left].subtree_lines
            } else {
                0
            };
            if r <= left_lines {
                if left == NIL {
                    self.nodes[n].left = new;
                    break;
                }
                n = left;
            } else {
                r -= left_lines + 1;
                let right = self.nodes[n].right;
                if right == NIL {
                    self.nodes[n].right = new;
                    break;
                }
                n = right;
            }
        }
        self.nodes[new].parent = n;
        self.rebalance_upward(n);
        LineId(new)
    }

    fn node_at_row(&self, row: usize) -> usize {
        let mut n = self.root;
        let mut r = row;
        loop {
            let left = self.nodes[n].left;
            let left_lines = if left != NIL {
                self.nodes[left].subtree_lines
            } else {
                0
            };
            if r < left_lines {
                n = left;
            } else if r == left_lines {
                return n;
            } else {
                r -= left_lines + 1;
                n = self.nodes[n].right;
            }
        }
    }

    fn remove_at_row(&mut self, row: usize) -> LineId {
        let z = self.node_at_row(row);
        let fix_from;

        if self.nodes[z].left == NIL {
            fix_from = self.nodes[z].parent;
            let r = self.nodes[z].right;
            self.transplant(z, r);
        } else if self.nodes[z].right == NIL {
            fix_from = self.nodes[z].parent;
            let l = self.nodes[z].left;
            self.transplant(z, l);
        } else {
            // Splice the in-order successor into z's position. Links move,
            // payloads do not, so every surviving LineId keeps its meaning.
            let mut s = self.nodes[z].right;
            while self.nodes[s].left != NIL {
                s = self.nodes[s].left;
            }
            let s_parent = self.nodes[s].parent;
            if s_parent != z {
                let sr = self.nodes[s].right;
                self.transplant(s, sr);
                let zr = self.nodes[z].right;
                self.nodes[s].right = zr;
                self.nodes[zr].parent = s;
                fix_from = s_parent;
            } else {
                fix_from = s;
            }
            self.transplant(z, s);
            let zl = self.nodes[z].left;
            self.nodes[s].left = zl;
            self.nodes[zl].parent = s;
        }

        if fix_from != NIL {
            self.rebalance_upward(fix_from);
        }

        self.nodes[z].in_use = false;
        self.nodes[z].parent = NIL;
        self.nodes[z].left = NIL;
        self.nodes[z].right = NIL;
        self.free.push(z);
        LineId(z)
    }

    fn transplant(&mut self, u: usize, v: usize) {
        let p = self.nodes[u].parent;
        if p == NIL {
            self.root = v;
        } else if self.nodes[p].left == u {
            self.nodes[p].left = v;
        } else {
            self.nodes[p].right = v;
        }
        if v != NIL {
            self.nodes[v].parent = p;
        }
    }

    fn walk_in_order(&self, n: usize, f: &mut impl FnMut(&Self, usize)) {
        if n == NIL {
            return;
        }
        self.walk_in_order(self.nodes[n].left, f);
        f(self, n);
        self.walk_in_order(self.nodes[n].right, f);
    }

    /// Structural self-check used by debug assertions and tests.
    #[doc(hidden)]
    pub fn assert_consistent(&self) {
        let lines = self.lines();
        assert!(!lines.is_empty(), "document must always have a line");
        let sum: usize = lines.iter().map(Line::total_len).sum();
        assert_eq!(sum, self.char_count(), "aggregate char count drifted");
        assert_eq!(lines.len(), self.line_count(), "aggregate line count drifted");
        for (i, line) in lines.iter().enumerate() {
            if i + 1 == lines.len() {
                assert_eq!(line.delimiter_len, 0, "last line must have no delimiter");
            } else {
                assert!(line.delimiter_len > 0, "interior line missing delimiter");
            }
        }
        self.assert_balanced(self.root);
    }

    fn assert_balanced(&self, n: usize) {
        if n == NIL {
            return;
        }
        let bf = self.balance_factor(n);
        assert!(bf.abs() <= 1, "AVL balance violated: {bf}");
        assert_eq!(
            self.depth(n),
            1 + self.depth(self.nodes[n].left).max(self.depth(self.nodes[n].right)),
            "stale depth"
        );
        self.assert_balanced(self.nodes[n].left);
        self.assert_balanced(self.nodes[n].right);
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `text` into `(content_len, delimiter_len)` segments. The final
/// segment always has delimiter length 0 (and may be empty). A `'\r'` not
/// followed by `'\n'` counts as content.
fn scan_segments(text: &str) -> Vec<(usize, usize)> {
    let mut segs = Vec::new();
    let mut len = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\n' => {
                segs.push((len, 1));
                len = 0;
            }
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                segs.push((len, 2));
                len = 0;
            }
            _ => len += 1,
        }
    }
    segs.push((len, 0));
    segs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundaries(index: &LineIndex) -> Vec<(usize, usize, usize)> {
        index
            .lines()
            .iter()
            .map(|l| (l.location, l.length, l.delimiter_len))
            .collect()
    }

    #[test]
    fn test_empty_document_has_one_line() {
        let index = LineIndex::new();
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.char_count(), 0);
        let line = index.line_containing(0);
        assert_eq!(line.length, 0);
        assert_eq!(line.delimiter_len, 0);
        index.assert_consistent();
    }

    #[test]
    fn test_from_text_boundaries() {
        let index = LineIndex::from_text("a\nbb\nccc");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.char_count(), 8);
        assert_eq!(boundaries(&index), vec![(0, 1, 1), (2, 2, 1), (5, 3, 0)]);
        index.assert_consistent();
    }

    #[test]
    fn test_trailing_newline_creates_empty_last_line() {
        let index = LineIndex::from_text("a\n");
        assert_eq!(boundaries(&index), vec![(0, 1, 1), (2, 0, 0)]);
    }

    #[test]
    fn test_line_containing_tie_breaks() {
        let index = LineIndex::from_text("a\nbb\nccc");
        // Boundary offsets resolve to the line that starts there.
        assert_eq!(index.line_containing(0).row, 0);
        assert_eq!(index.line_containing(1).row, 0); // the '\n'
        assert_eq!(index.line_containing(2).row, 1);
        assert_eq!(index.line_containing(5).row, 2);
        // Document end resolves to the last line.
        assert_eq!(index.line_containing(8).row, 2);
        // Out of range clamps.
        assert_eq!(index.line_containing(999).row, 2);
    }

    #[test]
    fn test_line_at_row_clamps() {
        let index = LineIndex::from_text("a\nb");
        assert_eq!(index.line_at_row(0).location, 0);
        assert_eq!(index.line_at_row(1).location, 2);
        assert_eq!(index.line_at_row(99).location, 2);
    }

    #[test]
    fn test_insert_without_newline_extends_line() {
        let mut index = LineIndex::from_text("a\nbb\nccc");
        let edit = index.insert(2, "X");
        assert_eq!(index.line_count(), 3);
        assert_eq!(boundaries(&index), vec![(0, 1, 1), (2, 3, 1), (6, 3, 0)]);
        assert_eq!(edit.first_row, 1);
        assert_eq!(edit.last_row, 1);
        assert!(edit.removed.is_empty());
        index.assert_consistent();
    }

    #[test]
    fn test_insert_with_newlines_splits_line() {
        let mut index = LineIndex::from_text("abcd");
        index.insert(2, "x\ny\nz");
        // "abx" / "y" / "zcd"
        assert_eq!(boundaries(&index), vec![(0, 3, 1), (4, 1, 1), (6, 3, 0)]);
        index.assert_consistent();
    }

    #[test]
    fn test_insert_newline_at_document_end() {
        let mut index = LineIndex::from_text("a");
        index.insert(1, "\n");
        assert_eq!(boundaries(&index), vec![(0, 1, 1), (2, 0, 0)]);
        index.assert_consistent();
    }

    #[test]
    fn test_insert_crlf_counts_as_one_delimiter() {
        let mut index = LineIndex::from_text("ab");
        index.insert(1, "\r\n");
        assert_eq!(boundaries(&index), vec![(0, 1, 2), (3, 1, 0)]);
        index.assert_consistent();
    }

    #[test]
    fn test_insert_inside_crlf_delimiter() {
        let mut index = LineIndex::from_text("a\r\nb");
        // Offset 2 is between '\r' and '\n'.
        index.insert(2, "x");
        // Region rescan: "a" + '\r' + "x" + '\n' -> "a\rx" with LF delimiter.
        assert_eq!(boundaries(&index), vec![(0, 3, 1), (4, 1, 0)]);
        assert_eq!(index.char_count(), 5);
        index.assert_consistent();
    }

    #[test]
    fn test_insert_newline_inside_crlf_delimiter() {
        let mut index = LineIndex::from_text("a\r\nb");
        index.insert(2, "\n");
        // Region rescan of '\r' + '\n' + '\n': the inserted LF joins the
        // existing '\r' into a CRLF delimiter, the original LF stands alone.
        assert_eq!(boundaries(&index), vec![(0, 1, 2), (3, 0, 1), (4, 1, 0)]);
        assert_eq!(index.char_count(), 5);
        index.assert_consistent();
    }

    #[test]
    fn test_insert_trailing_cr_joins_lf_delimiter() {
        let mut index = LineIndex::from_text("a\nb");
        // Insert "x\r" at the end of line 0's content: "ax\r" + "\n" -> CRLF.
        index.insert(1, "x\r");
        assert_eq!(boundaries(&index), vec![(0, 2, 2), (4, 1, 0)]);
        index.assert_consistent();
    }

    #[test]
    fn test_delete_within_line() {
        let mut index = LineIndex::from_text("hello\nworld");
        index.delete(CharRange::new(1, 4));
        assert_eq!(boundaries(&index), vec![(0, 2, 1), (3, 5, 0)]);
        index.assert_consistent();
    }

    #[test]
    fn test_delete_across_line_break_merges() {
        let mut index = LineIndex::from_text("a\nb");
        let edit = index.delete(CharRange::new(1, 2));
        assert_eq!(boundaries(&index), vec![(0, 2, 0)]);
        assert_eq!(edit.removed.len(), 1);
        index.assert_consistent();
    }

    #[test]
    fn test_delete_multiple_lines() {
        let mut index = LineIndex::from_text("aa\nbb\ncc\ndd");
        // Delete from inside line 0 to inside line 3.
        index.delete(CharRange::new(1, 10));
        assert_eq!(boundaries(&index), vec![(0, 2, 0)]);
        assert_eq!(index.line_count(), 1);
        index.assert_consistent();
    }

    #[test]
    fn test_delete_cr_of_crlf() {
        let mut index = LineIndex::from_text("a\r\nb");
        // Delete the '\r' (offset 1..2); the '\n' remains a delimiter.
        index.delete(CharRange::new(1, 2));
        assert_eq!(boundaries(&index), vec![(0, 1, 1), (2, 1, 0)]);
        index.assert_consistent();
    }

    #[test]
    fn test_delete_lf_of_crlf_leaves_cr_as_content() {
        let mut index = LineIndex::from_text("a\r\nb");
        // Delete the '\n' (offset 2..3); the lone '\r' is not a delimiter.
        index.delete(CharRange::new(2, 3));
        assert_eq!(boundaries(&index), vec![(0, 3, 0)]);
        index.assert_consistent();
    }

    #[test]
    fn test_delete_between_cr_and_lf_of_two_delimiters() {
        let mut index = LineIndex::from_text("a\r\n\r\nb");
        // Delete offsets 2..4 ('\n' of the first CRLF and '\r' of the
        // second): the kept '\r' and kept '\n' reassemble into one CRLF.
        index.delete(CharRange::new(2, 4));
        assert_eq!(boundaries(&index), vec![(0, 1, 2), (3, 1, 0)]);
        index.assert_consistent();
    }

    #[test]
    fn test_round_trip_restores_structure() {
        let mut index = LineIndex::from_text("a\nbb\nccc");
        let before = boundaries(&index);
        let text = "x\nyy\r\nz";
        let len = text.chars().count();
        index.insert(3, text);
        index.assert_consistent();
        index.delete(CharRange::new(3, 3 + len));
        assert_eq!(boundaries(&index), before);
        index.assert_consistent();
    }

    #[test]
    fn test_insert_at_line_start_shifts_following_lines() {
        let mut index = LineIndex::from_text("a\nbb\nccc");
        index.insert(2, "X");
        assert_eq!(index.line_count(), 3);
        let third = index.line_at_row(2);
        assert_eq!(third.location, 6);
        index.assert_consistent();
    }

    #[test]
    fn test_heights_aggregate_into_y_offsets() {
        let mut index = LineIndex::from_text("a\nb\nc");
        let rows: Vec<Line> = index.lines();
        index.set_line_height(rows[0].id, 10.0);
        index.set_line_height(rows[1].id, 30.0);
        index.set_line_height(rows[2].id, 20.0);
        assert_eq!(index.line_at_row(0).y_offset, 0.0);
        assert_eq!(index.line_at_row(1).y_offset, 10.0);
        assert_eq!(index.line_at_row(2).y_offset, 40.0);
        assert_eq!(index.total_height(), 60.0);
    }

    #[test]
    fn test_stale_line_id_height_update_is_ignored() {
        let mut index = LineIndex::from_text("a\nb");
        let second = index.line_at_row(1).id;
        index.delete(CharRange::new(1, 2));
        index.set_line_height(second, 99.0);
        index.assert_consistent();
    }

    #[test]
    fn test_many_sequential_inserts_stay_balanced() {
        let mut index = LineIndex::new();
        for i in 0..500 {
            let offset = index.char_count();
            index.insert(offset, &format!("line {i}\n"));
        }
        assert_eq!(index.line_count(), 501);
        index.assert_consistent();
        let line = index.line_at_row(250);
        assert_eq!(index.line_containing(line.location).row, 250);
    }
}

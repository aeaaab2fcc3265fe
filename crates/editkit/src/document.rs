//! Document facade.
//!
//! [`Document`] wires the storage, line index, layout cache and geometry
//! queries together behind one edit API. An edit is applied to the buffer and
//! the line index as one logical unit — the range is clamped up front, both
//! structures consume the same delta, and a revision counter is bumped only
//! once both have been updated — so readers never observe a half-applied
//! edit.

use crate::buffer::TextBuffer;
use crate::delta::{ByteEdit, ByteRange, CharRange, EditDelta};
use crate::geometry::{self, FragmentHit, GeometrySettings};
use crate::layout::{LayoutConfig, LineLayoutCache, Rect};
use crate::line_index::{Line, LineId, LineIndex};

/// Result of one applied edit, for incremental consumers.
#[derive(Debug, Clone)]
pub struct EditResult {
    /// Document revision after this edit.
    pub revision: u64,
    /// First affected row (post-edit).
    pub first_affected_row: usize,
    /// Last affected row (post-edit).
    pub last_affected_row: usize,
    /// Lines removed by the edit. Consumers holding per-line state keyed by
    /// [`LineId`] must drop these entries.
    pub removed_lines: Vec<LineId>,
    /// The edit in byte offsets and positions, ready for a grammar engine.
    pub byte_edit: ByteEdit,
    /// The full character/byte delta.
    pub delta: EditDelta,
}

/// An editable document with line indexing, lazy layout and caret geometry.
pub struct Document {
    buffer: TextBuffer,
    index: LineIndex,
    cache: LineLayoutCache,
    layout_config: LayoutConfig,
    geometry_settings: GeometrySettings,
    revision: u64,
}

impl Document {
    /// Create a document from initial text.
    pub fn new(text: &str, layout_config: LayoutConfig) -> Self {
        let mut index = LineIndex::from_text(text);
        index.set_default_line_height(layout_config.metrics.line_height);
        Self {
            buffer: TextBuffer::from_text(text),
            index,
            cache: LineLayoutCache::new(),
            layout_config,
            geometry_settings: GeometrySettings::default(),
            revision: 0,
        }
    }

    /// Create an empty document.
    pub fn empty(layout_config: LayoutConfig) -> Self {
        Self::new("", layout_config)
    }

    /// Monotonically increasing revision, bumped by every successful edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.buffer.char_count()
    }

    /// Total byte count.
    pub fn byte_count(&self) -> usize {
        self.buffer.byte_count()
    }

    /// Total line count.
    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    /// Replace `range` (clamped) with `text`.
    ///
    /// Mutates the buffer and the line index as one unit, dirties the layout
    /// entries of every touched line, and bumps the revision.
    pub fn apply_edit(&mut self, range: CharRange, text: &str) -> EditResult {
        let delta = self.buffer.replace(range, text);

        let deletion = self.index.delete(delta.replaced);
        let insertion = self.index.insert(delta.replaced.start, text);

        // An edit can leave the line at its start with content ending in '\r'
        // directly before an LF delimiter. The index cannot see the text, so
        // the reclassification to a CRLF delimiter happens here.
        let seam = self.index.line_containing(delta.replaced.start);
        if seam.delimiter_len == 1
            && seam.length > 0
            && self.buffer.substring(CharRange::new(
                seam.location + seam.length - 1,
                seam.location + seam.length,
            )) == "\r"
        {
            self.index.reclassify_trailing_cr(seam.id);
        }

        for id in deletion
            .invalidated
            .iter()
            .chain(deletion.removed.iter())
            .chain(insertion.invalidated.iter())
            .chain(insertion.removed.iter())
        {
            self.cache.invalidate(*id);
        }

        self.revision += 1;

        debug_assert_eq!(
            self.index.char_count(),
            self.buffer.char_count(),
            "line totals must track the buffer after every edit"
        );

        let (first_affected_row, last_affected_row) = if !text.is_empty() {
            (insertion.first_row, insertion.last_row)
        } else if !delta.replaced.is_empty() {
            (deletion.first_row, deletion.last_row)
        } else {
            let row = self.index.line_containing(delta.replaced.start).row;
            (row, row)
        };

        let mut removed_lines = deletion.removed;
        removed_lines.extend(insertion.removed);

        EditResult {
            revision: self.revision,
            first_affected_row,
            last_affected_row,
            removed_lines,
            byte_edit: delta.byte_edit,
            delta,
        }
    }

    /// The line containing the character at `offset` (clamped; boundary
    /// offsets resolve to the line starting there, the end offset to the last
    /// line).
    pub fn line_containing(&self, offset: usize) -> Line {
        self.index.line_containing(offset)
    }

    /// The line at `row` (clamped).
    pub fn line_at_row(&self, row: usize) -> Line {
        self.index.line_at_row(row)
    }

    /// Content text of the line at `row`, without its delimiter.
    pub fn line_text(&self, row: usize) -> String {
        let line = self.index.line_at_row(row);
        self.buffer.substring(line.content_range())
    }

    /// Text of a character range (clamped).
    pub fn substring(&self, range: CharRange) -> String {
        self.buffer.substring(range)
    }

    /// The whole document text.
    pub fn text(&self) -> String {
        self.buffer.to_text()
    }

    /// UTF-8 byte range of a character range (clamped).
    pub fn byte_range(&self, range: CharRange) -> ByteRange {
        self.buffer.byte_range(range)
    }

    /// The underlying storage, for byte-level readers (parsers).
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Current layout configuration.
    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout_config
    }

    /// Replace the layout configuration (width/typography change). All cached
    /// layouts are dirtied; recomputation happens on the next query.
    pub fn set_layout_config(&mut self, layout_config: LayoutConfig) {
        if self.layout_config == layout_config {
            return;
        }
        self.layout_config = layout_config;
        self.index
            .set_default_line_height(layout_config.metrics.line_height);
        self.cache.invalidate_all();
    }

    /// Current geometry insets.
    pub fn geometry_settings(&self) -> &GeometrySettings {
        &self.geometry_settings
    }

    /// Replace the geometry insets. Layouts are unaffected (insets only
    /// translate query results).
    pub fn set_geometry_settings(&mut self, settings: GeometrySettings) {
        self.geometry_settings = settings;
    }

    /// Rectangle where a caret at `offset` should render.
    ///
    /// `allow_wrap_to_next_fragment` decides the caret's affinity at a soft
    /// wrap boundary: with it, an offset at the head of a wrapped continuation
    /// resolves to the start of that continuation row; without it, the caret
    /// stays at the end of the previous visual row.
    pub fn caret_rect(&mut self, offset: usize, allow_wrap_to_next_fragment: bool) -> Rect {
        geometry::caret_rect(
            &mut self.index,
            &mut self.cache,
            &self.buffer,
            &self.layout_config,
            &self.geometry_settings,
            offset,
            allow_wrap_to_next_fragment,
        )
    }

    /// The line and wrapped fragment containing `offset` (clamped).
    pub fn line_fragment_at(&mut self, offset: usize) -> FragmentHit {
        geometry::fragment_at(
            &mut self.index,
            &mut self.cache,
            &self.buffer,
            &self.layout_config,
            offset,
        )
    }

    /// All lines in document order. Intended for tests and bulk exports.
    pub fn lines(&self) -> Vec<Line> {
        self.index.lines()
    }
}

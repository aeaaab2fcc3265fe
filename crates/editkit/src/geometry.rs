//! Caret and fragment geometry.
//!
//! Resolves character offsets to 2-D rectangles by composing the line index
//! (which line, which vertical offset) with the line layout cache (which
//! fragment, which horizontal cell). Queries are defensive: offsets clamp,
//! and an index/buffer length mismatch — reachable only through a caller bug
//! — produces a minimal fallback rectangle instead of a failure, so rendering
//! code can always proceed.

use crate::buffer::TextBuffer;
use crate::layout::{LayoutConfig, LineFragment, LineLayoutCache, Rect, visual_x_for_column};
use crate::line_index::{Line, LineIndex};

/// Horizontal insets applied before text starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySettings {
    /// Width reserved for the gutter (line numbers etc.).
    pub gutter_width: f64,
    /// Additional content inset after the gutter.
    pub content_inset: f64,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            gutter_width: 0.0,
            content_inset: 0.0,
        }
    }
}

impl GeometrySettings {
    /// Distance from the container's left edge to the first text cell.
    pub fn leading_inset(&self) -> f64 {
        self.gutter_width + self.content_inset
    }
}

/// A resolved fragment query: the owning line plus the fragment covering the
/// requested offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentHit {
    /// The line containing the offset.
    pub line: Line,
    /// The fragment within that line.
    pub fragment: LineFragment,
}

pub(crate) fn caret_rect(
    index: &mut LineIndex,
    cache: &mut LineLayoutCache,
    buffer: &TextBuffer,
    config: &LayoutConfig,
    settings: &GeometrySettings,
    offset: usize,
    allow_wrap_to_next_fragment: bool,
) -> Rect {
    let inset = settings.leading_inset();

    if index.char_count() != buffer.char_count() {
        // Reachable only if line structure was mutated behind the index's
        // back. Fail loudly in debug builds, stay renderable in release.
        debug_assert!(
            false,
            "line index ({}) and buffer ({}) disagree on document length",
            index.char_count(),
            buffer.char_count()
        );
        return Rect::new(inset, 0.0, 0.0, config.metrics.line_height);
    }

    let offset = offset.min(buffer.char_count());
    let line = index.line_containing(offset);
    // A caret inside a line delimiter renders at the visual end of the line.
    let local = (offset - line.location).min(line.length);

    let text = buffer.substring(line.content_range());
    let layout = cache.get_or_create(line.id, &text, config);
    let line_height = config.metrics.line_height;
    let measured_height = layout.height();
    let mut fragment = *layout.fragment_containing(local);
    if !allow_wrap_to_next_fragment && fragment.index > 0 && local == fragment.start {
        // Upstream affinity: without forward movement a boundary offset
        // renders at the end of the previous visual row.
        fragment = layout.fragments()[fragment.index - 1];
    }
    index.set_line_height(line.id, measured_height);

    if allow_wrap_to_next_fragment && fragment.index > 0 && local == fragment.start {
        // The offset sits at the head of a wrapped continuation. Resolve the
        // next offset with forward movement disabled (so this cannot recurse)
        // and pin the caret to the start of the continuation row.
        let mut rect = caret_rect(index, cache, buffer, config, settings, offset + 1, false);
        rect.x = inset;
        return rect;
    }

    let x_line = visual_x_for_column(&text, local, config);
    let x_fragment_start = visual_x_for_column(&text, fragment.start, config);
    let x = inset + (x_line - x_fragment_start) as f64 * config.metrics.cell_width;
    let y = line.y_offset + fragment.index as f64 * line_height;

    Rect::new(x, y, 0.0, line_height)
}

pub(crate) fn fragment_at(
    index: &mut LineIndex,
    cache: &mut LineLayoutCache,
    buffer: &TextBuffer,
    config: &LayoutConfig,
    offset: usize,
) -> FragmentHit {
    let offset = offset.min(buffer.char_count());
    let line = index.line_containing(offset);
    let local = (offset - line.location).min(line.length);

    let text = buffer.substring(line.content_range());
    let layout = cache.get_or_create(line.id, &text, config);
    let measured_height = layout.height();
    let fragment = *layout.fragment_containing(local);
    index.set_line_height(line.id, measured_height);

    FragmentHit { line, fragment }
}

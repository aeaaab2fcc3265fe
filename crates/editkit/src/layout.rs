//! Per-line fragment layout.
//!
//! Given a container width and typography metrics, a line of text is broken
//! into visually wrapped [`LineFragment`]s by greedy cell-based wrapping
//! (UAX #11 widths, tab-stop expansion, grapheme-cluster-safe break points).
//! [`LineLayoutCache`] memoizes one [`LineLayout`] per line id; entries are
//! dirtied by explicit invalidation and recomputed lazily on the next query,
//! never eagerly.

use crate::line_index::LineId;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Default tab width (in cells) used when a caller does not specify one.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Soft wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// No soft wrapping (each line is a single fragment).
    None,
    /// Wrap at grapheme-cluster boundaries.
    #[default]
    Char,
    /// Prefer wrapping after whitespace, falling back to cluster wrap.
    Word,
}

/// Opaque typography inputs supplied by the rendering layer. The core only
/// uses them to derive wrap width and fragment rectangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypographyMetrics {
    /// Width of one character cell.
    pub cell_width: f64,
    /// Height of one rendered fragment.
    pub line_height: f64,
}

impl Default for TypographyMetrics {
    fn default() -> Self {
        Self {
            cell_width: 8.0,
            line_height: 16.0,
        }
    }
}

/// Everything line wrapping depends on. Changing any field requires
/// invalidating the whole layout cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Container width available for text.
    pub container_width: f64,
    /// Typography metrics.
    pub metrics: TypographyMetrics,
    /// Tab width in cells.
    pub tab_width: usize,
    /// Soft wrapping mode.
    pub wrap_mode: WrapMode,
    /// Substitute otherwise invisible control characters with a one-cell
    /// placeholder glyph.
    pub show_invisibles: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            container_width: 640.0,
            metrics: TypographyMetrics::default(),
            tab_width: DEFAULT_TAB_WIDTH,
            wrap_mode: WrapMode::Char,
            show_invisibles: false,
        }
    }
}

impl LayoutConfig {
    /// Usable wrap width in whole cells. Never less than one cell, so layout
    /// always makes progress.
    pub fn width_cells(&self) -> usize {
        let cells = (self.container_width / self.metrics.cell_width).floor() as usize;
        cells.max(1)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One visually wrapped sub-range of a line. Character offsets are local to
/// the line content; the rectangle is relative to the line's origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFragment {
    /// Position of this fragment within the line (0 = first).
    pub index: usize,
    /// First content character covered (inclusive, line-local).
    pub start: usize,
    /// End of the covered range (exclusive, line-local).
    pub end: usize,
    /// Rendered rectangle relative to the line origin.
    pub rect: Rect,
}

/// The computed wrapped layout of one line: an ordered, non-empty fragment
/// list.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    fragments: Vec<LineFragment>,
    height: f64,
}

impl LineLayout {
    /// Lay out `text` (one line, no trailing line break) against `config`.
    pub fn compute(text: &str, config: &LayoutConfig) -> Self {
        let width_cells = config.width_cells();
        let mut fragments: Vec<LineFragment> = Vec::new();

        let mut frag_start_char = 0usize;
        let mut frag_start_x = 0usize;
        let mut x = 0usize;
        let mut char_index = 0usize;
        // Candidate word break: (char_index, x) just after whitespace.
        let mut last_break: Option<(usize, usize)> = None;

        for (_, cluster) in text.grapheme_indices(true) {
            let w = cluster_cells(cluster, x, config);

            if config.wrap_mode != WrapMode::None {
                while x - frag_start_x + w > width_cells && char_index > frag_start_char {
                    let (break_char, break_x) = match (config.wrap_mode, last_break) {
                        (WrapMode::Word, Some((bc, bx))) if bc > frag_start_char => (bc, bx),
                        _ => (char_index, x),
                    };
                    fragments.push(Self::fragment(
                        fragments.len(),
                        frag_start_char,
                        break_char,
                        frag_start_x,
                        break_x,
                        config,
                    ));
                    frag_start_char = break_char;
                    frag_start_x = break_x;
                    last_break = None;
                }
            }

            x += w;
            char_index += cluster.chars().count();
            if config.wrap_mode == WrapMode::Word
                && cluster.chars().all(char::is_whitespace)
                && !cluster.is_empty()
            {
                last_break = Some((char_index, x));
            }
        }

        // Final fragment; an empty line still gets one empty fragment.
        fragments.push(Self::fragment(
            fragments.len(),
            frag_start_char,
            char_index,
            frag_start_x,
            x,
            config,
        ));

        Self {
            height: fragments.len() as f64 * config.metrics.line_height,
            fragments,
        }
    }

    fn fragment(
        index: usize,
        start: usize,
        end: usize,
        x_start_cells: usize,
        x_end_cells: usize,
        config: &LayoutConfig,
    ) -> LineFragment {
        LineFragment {
            index,
            start,
            end,
            rect: Rect::new(
                0.0,
                index as f64 * config.metrics.line_height,
                (x_end_cells - x_start_cells) as f64 * config.metrics.cell_width,
                config.metrics.line_height,
            ),
        }
    }

    /// The ordered fragment list. Never empty.
    pub fn fragments(&self) -> &[LineFragment] {
        &self.fragments
    }

    /// Number of fragments (the line's visual row count).
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Total height of this line (fragment count × line height).
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The fragment containing the line-local character offset.
    ///
    /// A boundary offset resolves to the fragment that starts there; the
    /// line-end offset resolves to the last fragment.
    pub fn fragment_containing(&self, local_offset: usize) -> &LineFragment {
        for fragment in &self.fragments {
            if local_offset < fragment.end {
                return fragment;
            }
        }
        // Fragment lists are non-empty by construction.
        &self.fragments[self.fragments.len() - 1]
    }
}

/// Memoized per-line layouts, keyed by stable line id.
pub struct LineLayoutCache {
    layouts: HashMap<LineId, LineLayout>,
}

impl LineLayoutCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            layouts: HashMap::new(),
        }
    }

    /// Return the cached layout for `id`, computing it from `text` on a miss.
    pub fn get_or_create(&mut self, id: LineId, text: &str, config: &LayoutConfig) -> &LineLayout {
        self.layouts
            .entry(id)
            .or_insert_with(|| LineLayout::compute(text, config))
    }

    /// Drop the cached layout for one line (its text changed).
    pub fn invalidate(&mut self, id: LineId) {
        self.layouts.remove(&id);
    }

    /// Drop every cached layout (width or typography changed).
    pub fn invalidate_all(&mut self) {
        self.layouts.clear();
    }

    /// Whether `id` currently has a cached layout.
    pub fn is_cached(&self, id: LineId) -> bool {
        self.layouts.contains_key(&id)
    }

    /// Number of cached layouts.
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl Default for LineLayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Visual width (in cells) of one character at a given cell offset within the
/// line. `'\t'` advances to the next tab stop; characters without an
/// intrinsic width measure zero, or one cell when substituted by a visible
/// placeholder.
pub fn cell_width_at(ch: char, cell_offset_in_line: usize, config: &LayoutConfig) -> usize {
    if ch == '\t' {
        let tab_width = config.tab_width.max(1);
        tab_width - cell_offset_in_line % tab_width
    } else {
        UnicodeWidthChar::width(ch).unwrap_or(if config.show_invisibles { 1 } else { 0 })
    }
}

/// Visual width (in cells) of one grapheme cluster at a given cell offset.
pub fn cluster_cells(cluster: &str, cell_offset_in_line: usize, config: &LayoutConfig) -> usize {
    if cluster == "\t" {
        let tab_width = config.tab_width.max(1);
        return tab_width - cell_offset_in_line % tab_width;
    }
    let width = UnicodeWidthStr::width(cluster);
    if width == 0 && config.show_invisibles {
        1
    } else {
        width
    }
}

/// Cell offset from the line start to character `column` (counted in
/// `char`s), expanding tabs along the way.
pub fn visual_x_for_column(line: &str, column: usize, config: &LayoutConfig) -> usize {
    let mut x = 0usize;
    for ch in line.chars().take(column) {
        x = x.saturating_add(cell_width_at(ch, x, config));
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width_cells: usize) -> LayoutConfig {
        LayoutConfig {
            container_width: width_cells as f64 * 8.0,
            ..LayoutConfig::default()
        }
    }

    fn ranges(layout: &LineLayout) -> Vec<(usize, usize)> {
        layout.fragments().iter().map(|f| (f.start, f.end)).collect()
    }

    #[test]
    fn test_empty_line_has_one_empty_fragment() {
        let layout = LineLayout::compute("", &config(10));
        assert_eq!(ranges(&layout), vec![(0, 0)]);
        assert_eq!(layout.height(), 16.0);
    }

    #[test]
    fn test_exact_fit_does_not_wrap() {
        let layout = LineLayout::compute("1234567890", &config(10));
        assert_eq!(layout.fragment_count(), 1);
    }

    #[test]
    fn test_one_over_wraps() {
        let layout = LineLayout::compute("12345678901", &config(10));
        assert_eq!(ranges(&layout), vec![(0, 10), (10, 11)]);
    }

    #[test]
    fn test_cjk_wraps_intact() {
        // 5 double-width chars fill 10 cells; the 6th wraps whole.
        let layout = LineLayout::compute("你好世界测试", &config(10));
        assert_eq!(ranges(&layout), vec![(0, 5), (5, 6)]);
    }

    #[test]
    fn test_double_width_never_splits() {
        // "Hello" fills 5 of 6 cells; the 2-cell char wraps intact.
        let layout = LineLayout::compute("Hello你", &config(6));
        assert_eq!(ranges(&layout), vec![(0, 5), (5, 6)]);
    }

    #[test]
    fn test_tab_expansion_in_wrapping() {
        let cfg = config(8);
        assert_eq!(visual_x_for_column("a\tb", 2, &cfg), 4);
        assert_eq!(visual_x_for_column("a\tb", 3, &cfg), 5);
        let layout = LineLayout::compute("a\tbcdefg", &cfg);
        // Cells: a=1, tab to 4, then bcde reach 8; f wraps.
        assert_eq!(ranges(&layout), vec![(0, 6), (6, 8)]);
    }

    #[test]
    fn test_word_wrap_prefers_whitespace() {
        let cfg = LayoutConfig {
            wrap_mode: WrapMode::Word,
            ..config(7)
        };
        let layout = LineLayout::compute("hello world", &cfg);
        assert_eq!(ranges(&layout), vec![(0, 6), (6, 11)]);
    }

    #[test]
    fn test_word_wrap_falls_back_on_long_word() {
        let cfg = LayoutConfig {
            wrap_mode: WrapMode::Word,
            ..config(4)
        };
        let layout = LineLayout::compute("abcdefgh", &cfg);
        assert_eq!(ranges(&layout), vec![(0, 4), (4, 8)]);
    }

    #[test]
    fn test_wrap_mode_none_keeps_one_fragment() {
        let cfg = LayoutConfig {
            wrap_mode: WrapMode::None,
            ..config(4)
        };
        let layout = LineLayout::compute("abcdefgh", &cfg);
        assert_eq!(layout.fragment_count(), 1);
        assert_eq!(layout.fragments()[0].rect.width, 8.0 * 8.0);
    }

    #[test]
    fn test_combining_cluster_not_split() {
        // "e" + combining acute is one cluster; width 1.
        let text = "e\u{0301}abc";
        let layout = LineLayout::compute(text, &config(2));
        // Clusters: "e&#769;"(2 chars, 1 cell), a, b, c.
        assert_eq!(ranges(&layout), vec![(0, 3), (3, 5)]);
    }

    #[test]
    fn test_fragment_rects_stack_vertically() {
        let layout = LineLayout::compute("12345678901234567890123", &config(10));
        let frags = layout.fragments();
        assert_eq!(frags.len(), 3);
        assert_eq!(frags[0].rect.y, 0.0);
        assert_eq!(frags[1].rect.y, 16.0);
        assert_eq!(frags[2].rect.y, 32.0);
        assert_eq!(frags[0].rect.width, 80.0);
        assert_eq!(frags[2].rect.width, 24.0);
        assert_eq!(layout.height(), 48.0);
    }

    #[test]
    fn test_fragment_containing_boundaries() {
        let layout = LineLayout::compute("12345678901234", &config(10));
        assert_eq!(layout.fragment_containing(0).index, 0);
        assert_eq!(layout.fragment_containing(9).index, 0);
        // Boundary offset belongs to the fragment that starts there.
        assert_eq!(layout.fragment_containing(10).index, 1);
        // Line-end offset resolves to the last fragment.
        assert_eq!(layout.fragment_containing(14).index, 1);
        assert_eq!(layout.fragment_containing(99).index, 1);
    }

    #[test]
    fn test_cache_memoizes_and_invalidates() {
        let mut index = crate::LineIndex::from_text("abc\ndef");
        let id = index.line_at_row(0).id;
        let cfg = config(10);
        let mut cache = LineLayoutCache::new();

        cache.get_or_create(id, "abc", &cfg);
        assert!(cache.is_cached(id));
        assert_eq!(cache.len(), 1);
        // Memoized: a different text for the same id is not recomputed.
        let layout = cache.get_or_create(id, "zzzzzzzzzzzz", &cfg);
        assert_eq!(layout.fragment_count(), 1);

        cache.invalidate(id);
        assert!(!cache.is_cached(id));
        let layout = cache.get_or_create(id, "zzzzzzzzzzzz", &cfg);
        assert_eq!(layout.fragment_count(), 2);

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        let _ = index.line_at_row(1);
    }

    #[test]
    fn test_show_invisibles_gives_control_chars_a_cell() {
        let cfg = LayoutConfig {
            show_invisibles: true,
            ..config(10)
        };
        assert_eq!(cell_width_at('\u{0007}', 0, &cfg), 1);
        let plain = config(10);
        assert_eq!(cell_width_at('\u{0007}', 0, &plain), 0);
    }
}

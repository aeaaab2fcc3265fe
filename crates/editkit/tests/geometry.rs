use editkit::{CharRange, Document, GeometrySettings, LayoutConfig, TypographyMetrics, WrapMode};

const CELL: f64 = 8.0;
const LINE: f64 = 16.0;

fn config(width_cells: usize) -> LayoutConfig {
    LayoutConfig {
        container_width: width_cells as f64 * CELL,
        metrics: TypographyMetrics {
            cell_width: CELL,
            line_height: LINE,
        },
        wrap_mode: WrapMode::Char,
        ..LayoutConfig::default()
    }
}

#[test]
fn test_empty_document_caret_at_leading_inset() {
    let mut d = Document::empty(config(80));
    d.set_geometry_settings(GeometrySettings {
        gutter_width: 40.0,
        content_inset: 8.0,
    });

    assert_eq!(d.line_count(), 1);
    let rect = d.caret_rect(0, false);
    assert_eq!(rect.x, 48.0);
    assert_eq!(rect.y, 0.0);
    assert_eq!(rect.width, 0.0);
    assert_eq!(rect.height, LINE);
}

#[test]
fn test_caret_advances_by_cells() {
    let mut d = Document::new("abc", config(80));
    assert_eq!(d.caret_rect(0, false).x, 0.0);
    assert_eq!(d.caret_rect(2, false).x, 2.0 * CELL);
    // Clamped past the end of the document.
    assert_eq!(d.caret_rect(99, false).x, 3.0 * CELL);
}

#[test]
fn test_caret_expands_tabs() {
    let mut d = Document::new("a\tb", config(80));
    assert_eq!(d.caret_rect(1, false).x, 1.0 * CELL);
    assert_eq!(d.caret_rect(2, false).x, 4.0 * CELL);
    assert_eq!(d.caret_rect(3, false).x, 5.0 * CELL);
}

#[test]
fn test_caret_rows_stack_vertically() {
    let mut d = Document::new("a\nbb\nccc", config(80));
    assert_eq!(d.caret_rect(0, false).y, 0.0);
    assert_eq!(d.caret_rect(2, false).y, LINE);
    assert_eq!(d.caret_rect(5, false).y, 2.0 * LINE);
}

#[test]
fn test_caret_inside_crlf_renders_at_line_end() {
    let mut d = Document::new("ab\r\ncd", config(80));
    // Offsets 2 and 3 are the CR and LF; both pin to the end of "ab".
    let end = d.caret_rect(2, false);
    assert_eq!(end.x, 2.0 * CELL);
    assert_eq!(end.y, 0.0);
    assert_eq!(d.caret_rect(3, false), end);
    // Offset 4 starts the next line.
    assert_eq!(d.caret_rect(4, false).y, LINE);
    assert_eq!(d.caret_rect(4, false).x, 0.0);
}

#[test]
fn test_wrap_forward_pins_caret_to_continuation_start() {
    let mut d = Document::new("1234567890abc", config(10));
    d.set_geometry_settings(GeometrySettings {
        gutter_width: 32.0,
        content_inset: 0.0,
    });

    // Offset 10 sits exactly at the head of the wrapped continuation.
    let downstream = d.caret_rect(10, true);
    assert_eq!(downstream.x, 32.0);
    assert_eq!(downstream.y, LINE);

    // Without forward movement the caret stays at the end of the first row.
    let upstream = d.caret_rect(10, false);
    assert_eq!(upstream.x, 32.0 + 10.0 * CELL);
    assert_eq!(upstream.y, 0.0);
    assert_ne!(downstream, upstream);

    // Mid-fragment offsets are unaffected by the forward-movement flag.
    let mid = d.caret_rect(12, true);
    assert_eq!(mid, d.caret_rect(12, false));
    assert_eq!(mid.x, 32.0 + 2.0 * CELL);
    assert_eq!(mid.y, LINE);
}

#[test]
fn test_wrapped_line_height_feeds_following_rows() {
    // 24 chars wrap into 3 fragments of 10 cells.
    let mut d = Document::new("123456789012345678901234\nx", config(10));

    // Warm the first line's layout so its measured height replaces the
    // default single-row estimate.
    let _ = d.caret_rect(0, false);

    let rect = d.caret_rect(25, false);
    assert_eq!(rect.y, 3.0 * LINE);
}

#[test]
fn test_fragment_hit_identifies_line_and_fragment() {
    let mut d = Document::new("1234567890abc\nzz", config(10));

    let hit = d.line_fragment_at(3);
    assert_eq!(hit.line.row, 0);
    assert_eq!(hit.fragment.index, 0);

    let hit = d.line_fragment_at(11);
    assert_eq!(hit.line.row, 0);
    assert_eq!(hit.fragment.index, 1);
    assert_eq!(hit.fragment.start, 10);

    let hit = d.line_fragment_at(14);
    assert_eq!(hit.line.row, 1);
    assert_eq!(hit.fragment.index, 0);
}

#[test]
fn test_caret_follows_edits() {
    let mut d = Document::new("ab", config(80));
    assert_eq!(d.caret_rect(2, false).x, 2.0 * CELL);

    d.apply_edit(CharRange::empty_at(1), "xyz");
    assert_eq!(d.text(), "axyzb");
    assert_eq!(d.caret_rect(5, false).x, 5.0 * CELL);

    d.apply_edit(CharRange::empty_at(1), "\n");
    assert_eq!(d.text(), "a\nxyzb");
    assert_eq!(d.caret_rect(2, false).y, LINE);
    assert_eq!(d.caret_rect(2, false).x, 0.0);
    assert_eq!(d.caret_rect(3, false).x, 1.0 * CELL);
}

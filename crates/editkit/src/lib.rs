#![warn(missing_docs)]
//! editkit - Headless Editing Core
//!
//! # Overview
//!
//! `editkit` is the editing core of a code editor: character-addressed text
//! storage, an incrementally maintained line index, lazy per-line wrapped
//! layout, and caret geometry queries. It is headless — no rendering, no
//! widgets — and assumes the upper layer supplies typography metrics and a
//! container width.
//!
//! # Core Features
//!
//! - **Rope Text Storage**: O(log n) edits with character ↔ UTF-8 byte
//!   offset bridging
//! - **Balanced Line Index**: augmented order-statistic tree, O(log n)
//!   offset → line and row → line queries
//! - **Stable Line Identity**: lines keep their id across unrelated edits,
//!   so per-line caches survive
//! - **Lazy Layout**: per-line wrapped fragments computed on first query,
//!   dirtied by edits, never recomputed eagerly
//! - **Caret Geometry**: offset → rectangle with soft-wrap aware caret
//!   affinity
//! - **Edit Deltas**: every edit yields byte offsets and row/column points
//!   ready for an incremental grammar engine (see `editkit-treesitter`)
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Document (edits, revision, queries)        │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Geometry (caret rects, fragment hits)      │  ← Coordinates
//! ├─────────────────────────────────────────────┤
//! │  Layout (soft wrapping, layout cache)       │  ← Fragments
//! ├─────────────────────────────────────────────┤
//! │  Line Index (balanced tree of line records) │  ← Line Access
//! ├─────────────────────────────────────────────┤
//! │  Text Buffer (rope storage)                 │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editkit::{CharRange, Document, LayoutConfig};
//!
//! let mut doc = Document::new("fn main() {\n}\n", LayoutConfig::default());
//!
//! // Insert text at a character offset.
//! let result = doc.apply_edit(CharRange::empty_at(12), "    // body\n");
//! assert_eq!(result.revision, 1);
//! assert_eq!(doc.line_count(), 4);
//!
//! // Where does the caret at offset 12 render?
//! let rect = doc.caret_rect(12, false);
//! assert_eq!(rect.y, 16.0);
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - rope-backed character storage with byte bridging
//! - [`delta`] - edit ranges, points, and deltas
//! - [`line_index`] - balanced tree of line records with stable ids
//! - [`layout`] - soft wrapping and the per-line layout cache
//! - [`geometry`] - caret and fragment geometry queries
//! - [`document`] - the facade tying the layers together
//!
//! # Unicode Support
//!
//! - UTF-8 internal encoding, character-offset public API
//! - CJK double-width characters and tab stops in layout
//! - Grapheme clusters never split across wrap points

pub mod buffer;
pub mod delta;
pub mod document;
pub mod geometry;
pub mod layout;
pub mod line_index;

pub use buffer::TextBuffer;
pub use delta::{ByteEdit, ByteRange, CharRange, EditDelta, Point};
pub use document::{Document, EditResult};
pub use geometry::{FragmentHit, GeometrySettings};
pub use layout::{
    DEFAULT_TAB_WIDTH, LayoutConfig, LineFragment, LineLayout, LineLayoutCache, Rect,
    TypographyMetrics, WrapMode,
};
pub use line_index::{IndexEdit, Line, LineId, LineIndex};

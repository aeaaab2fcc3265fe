#![warn(missing_docs)]
//! `editkit-treesitter` - Tree-sitter integration for `editkit`.
//!
//! This crate wraps a Tree-sitter parser into an incremental parse engine for
//! [`editkit::Document`]:
//!
//! - edits are reported as they happen, so re-parses reuse unchanged subtrees
//! - parse trees are tagged with the document revision that built them, so
//!   stale results can be discarded
//! - each parse call runs under its own cooperative deadline
//! - source is read straight from the document rope, chunk by chunk
//!
//! Raw UTF-8 and UTF-16 (both byte orders) input, included-range restriction
//! for embedded languages, and capture queries are also supported.

mod engine;

pub use engine::{
    Capture, DEFAULT_PARSE_TIMEOUT, ParseEngine, ParseEngineError, ParseStatus, TextEncoding,
};

use editkit::{ByteEdit, ByteRange, Document, TextBuffer};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use streaming_iterator::StreamingIterator;
use tree_sitter::{
    InputEdit, Language, ParseOptions, ParseState, Parser, Point, Query, QueryCursor, Range, Tree,
};

/// Default upper bound on the time one parse call may spend.
pub const DEFAULT_PARSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced by [`ParseEngine`].
#[derive(Debug)]
pub enum ParseEngineError {
    /// Setting the Tree-sitter language failed (version mismatch).
    Language(String),
    /// Compiling a Tree-sitter query failed.
    Query(String),
    /// The requested included ranges were rejected (overlapping or unordered).
    IncludedRanges(String),
}

impl std::fmt::Display for ParseEngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Language(msg) => write!(f, "tree-sitter language error: {msg}"),
            Self::Query(msg) => write!(f, "tree-sitter query error: {msg}"),
            Self::IncludedRanges(msg) => write!(f, "invalid included ranges: {msg}"),
        }
    }
}

impl std::error::Error for ParseEngineError {}

/// How the engine updated its parse tree for the last `parse()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// First parse for this engine instance.
    Initial,
    /// Re-parsed incrementally against the edited previous tree.
    Incremental,
    /// The previous tree was stale (edits were not reported), so the engine
    /// re-parsed from scratch.
    FullReparse,
    /// No work was performed (the current tree already matches this revision).
    Skipped,
    /// The call-scoped deadline expired before parsing finished. The previous
    /// tree (if any) is kept; call `parse()` again to retry.
    TimedOut,
}

/// Source text encoding for [`ParseEngine::parse_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8 bytes.
    Utf8,
    /// UTF-16, little-endian byte order.
    Utf16Le,
    /// UTF-16, big-endian byte order.
    Utf16Be,
}

struct SyntaxTree {
    tree: Tree,
    revision: u64,
}

/// An incremental Tree-sitter parse engine for [`Document`]s.
///
/// The engine tracks one parse tree tagged with the document revision it was
/// built from. Edits are reported through [`apply_edit`](Self::apply_edit) as
/// they happen; [`parse`](Self::parse) then re-parses incrementally, reading
/// the document rope chunk by chunk without materializing the text.
///
/// Each `parse()` call gets its own deadline, captured when the call starts.
/// The parser checks it cooperatively and abandons the call when it expires,
/// leaving the engine ready for a retry. A deadline is never shared across
/// calls, so a slow parse cannot poison the next one.
pub struct ParseEngine {
    language: Language,
    parser: Parser,
    timeout: Duration,
    did_timeout: bool,
    tree: Option<SyntaxTree>,
    synced_revision: u64,
}

impl ParseEngine {
    /// Create an engine for the given language.
    pub fn new(language: &Language) -> Result<Self, ParseEngineError> {
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|e| ParseEngineError::Language(e.to_string()))?;

        Ok(Self {
            language: language.clone(),
            parser,
            timeout: DEFAULT_PARSE_TIMEOUT,
            did_timeout: false,
            tree: None,
            synced_revision: 0,
        })
    }

    /// Upper bound on the time one `parse()` call may spend.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the per-call parse deadline. Takes effect on the next call.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Whether the most recent parse call hit its deadline.
    pub fn did_timeout(&self) -> bool {
        self.did_timeout
    }

    /// The current parse tree, regardless of which revision built it.
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref().map(|t| &t.tree)
    }

    /// The current parse tree only if it was built from `revision`.
    ///
    /// Returns `None` for a tree built from an older revision, so consumers
    /// holding a revision can discard results the document has outrun.
    pub fn tree_for_revision(&self, revision: u64) -> Option<&Tree> {
        match &self.tree {
            Some(t) if t.revision == revision => Some(&t.tree),
            _ => None,
        }
    }

    /// Report one document edit to the engine.
    ///
    /// Shifts the previous tree's node positions so the next `parse()` can
    /// reuse unchanged subtrees. `revision` is the document revision after the
    /// edit; report edits in the order they were applied.
    pub fn apply_edit(&mut self, edit: &ByteEdit, revision: u64) {
        if let Some(syntax) = self.tree.as_mut() {
            syntax.tree.edit(&InputEdit {
                start_byte: edit.start_byte,
                old_end_byte: edit.old_end_byte,
                new_end_byte: edit.new_end_byte,
                start_position: ts_point(edit.start_point),
                old_end_position: ts_point(edit.old_end_point),
                new_end_position: ts_point(edit.new_end_point),
            });
        }
        self.synced_revision = revision;
    }

    /// Bring the parse tree up to date with `document`.
    ///
    /// Incremental when every edit since the last parse was reported through
    /// [`apply_edit`](Self::apply_edit); otherwise the stale tree is dropped
    /// and the document is re-parsed from scratch.
    pub fn parse(&mut self, document: &Document) -> ParseStatus {
        let revision = document.revision();
        if let Some(syntax) = &self.tree {
            if syntax.revision == revision {
                self.did_timeout = false;
                return ParseStatus::Skipped;
            }
        }

        let status = match &self.tree {
            None => ParseStatus::Initial,
            Some(_) if self.synced_revision == revision => ParseStatus::Incremental,
            Some(_) => ParseStatus::FullReparse,
        };
        if status == ParseStatus::FullReparse {
            self.tree = None;
        }

        self.run_parse(document.buffer(), revision, status)
    }

    /// Drop the current tree and parse `document` from scratch.
    pub fn parse_from_scratch(&mut self, document: &Document) -> ParseStatus {
        self.tree = None;
        self.run_parse(
            document.buffer(),
            document.revision(),
            ParseStatus::Initial,
        )
    }

    fn run_parse(&mut self, buffer: &TextBuffer, revision: u64, status: ParseStatus) -> ParseStatus {
        // The deadline is scoped to this call alone.
        let deadline = Instant::now() + self.timeout;
        let mut expired = expired_at(deadline);
        let options = ParseOptions::new().progress_callback(&mut expired);

        let old_tree = self.tree.as_ref().map(|t| &t.tree);
        let result = self.parser.parse_with_options(
            &mut |byte_offset, _: Point| buffer.bytes_at(byte_offset),
            old_tree,
            Some(options),
        );

        match result {
            Some(tree) => {
                self.tree = Some(SyntaxTree { tree, revision });
                self.synced_revision = revision;
                self.did_timeout = false;
                status
            }
            None => {
                // Abandoned mid-parse; reset so the next call starts clean.
                // The previous (edited) tree is kept for the retry.
                self.parser.reset();
                self.did_timeout = true;
                ParseStatus::TimedOut
            }
        }
    }

    /// Parse raw bytes outside any document, without touching the engine's
    /// tracked tree.
    ///
    /// UTF-16 input with an odd byte length cannot be valid; it yields `None`
    /// without invoking the parser (and without touching `did_timeout`).
    /// Every encoding parses under the same call-scoped deadline as
    /// [`parse`](Self::parse); an abandoned attempt resets the parser and
    /// raises `did_timeout`.
    pub fn parse_raw(&mut self, bytes: &[u8], encoding: TextEncoding) -> Option<Tree> {
        let deadline = Instant::now() + self.timeout;
        let mut expired = expired_at(deadline);
        let options = ParseOptions::new().progress_callback(&mut expired);

        let result = match encoding {
            TextEncoding::Utf8 => self.parser.parse_with_options(
                &mut |offset, _: Point| &bytes[offset.min(bytes.len())..],
                None,
                Some(options),
            ),
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return None;
                }
                let code_units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| {
                        let pair = [pair[0], pair[1]];
                        match encoding {
                            TextEncoding::Utf16Be => u16::from_be_bytes(pair),
                            _ => u16::from_le_bytes(pair),
                        }
                    })
                    .collect();
                match encoding {
                    TextEncoding::Utf16Be => self.parser.parse_utf16_be_with_options(
                        &mut |offset, _: Point| &code_units[offset.min(code_units.len())..],
                        None,
                        Some(options),
                    ),
                    _ => self.parser.parse_utf16_le_with_options(
                        &mut |offset, _: Point| &code_units[offset.min(code_units.len())..],
                        None,
                        Some(options),
                    ),
                }
            }
        };

        match result {
            Some(tree) => {
                self.did_timeout = false;
                Some(tree)
            }
            None => {
                self.parser.reset();
                self.did_timeout = true;
                None
            }
        }
    }

    /// Restrict parsing to the given byte ranges of the buffer (for embedded
    /// languages). An empty slice restores whole-document parsing.
    ///
    /// The current tree is dropped either way; the next `parse()` starts from
    /// scratch under the new ranges.
    pub fn set_included_byte_ranges(
        &mut self,
        buffer: &TextBuffer,
        ranges: &[ByteRange],
    ) -> Result<(), ParseEngineError> {
        let ts_ranges: Vec<Range> = ranges
            .iter()
            .map(|r| Range {
                start_byte: r.start,
                end_byte: r.end,
                start_point: ts_point(buffer.point_at_byte(r.start)),
                end_point: ts_point(buffer.point_at_byte(r.end)),
            })
            .collect();

        self.parser
            .set_included_ranges(&ts_ranges)
            .map_err(|e| ParseEngineError::IncludedRanges(e.to_string()))?;
        self.tree = None;
        Ok(())
    }

    /// Run a capture query against the current tree.
    ///
    /// `source` must be the same text the tree was parsed from. Captures come
    /// back sorted by byte range and capture name, with exact duplicates
    /// removed.
    pub fn captures(
        &self,
        query_source: &str,
        source: &[u8],
    ) -> Result<Vec<Capture>, ParseEngineError> {
        let Some(syntax) = self.tree.as_ref() else {
            return Ok(Vec::new());
        };

        let query = Query::new(&self.language, query_source)
            .map_err(|e| ParseEngineError::Query(e.to_string()))?;
        let capture_names = query.capture_names();

        let mut cursor = QueryCursor::new();
        let mut out = Vec::<Capture>::new();
        let mut matches = cursor.matches(&query, syntax.tree.root_node(), source);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                if node.end_byte() <= node.start_byte() {
                    continue;
                }
                let name = capture_names[capture.index as usize].to_string();
                out.push(Capture {
                    name,
                    byte_range: ByteRange::new(node.start_byte(), node.end_byte()),
                });
            }
        }

        out.sort_by(|a, b| {
            (a.byte_range.start, a.byte_range.end, &a.name)
                .cmp(&(b.byte_range.start, b.byte_range.end, &b.name))
        });
        out.dedup();
        Ok(out)
    }
}

/// One named query capture over a byte range of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Capture name from the query (without the `@`).
    pub name: String,
    /// Byte range of the captured node.
    pub byte_range: ByteRange,
}

fn expired_at(deadline: Instant) -> impl FnMut(&ParseState) -> ControlFlow<()> {
    move |_| {
        if Instant::now() >= deadline {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

fn ts_point(point: editkit::Point) -> Point {
    Point {
        row: point.row,
        column: point.column,
    }
}

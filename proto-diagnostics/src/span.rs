//! Source location model shared by diagnostics and descriptor `SourceCodeInfo`.
//!
//! Lines and columns are 1-based (as reported to users); byte offsets are
//! 0-based into the owning file's raw bytes. A span is always half-open:
//! `[start_offset, end_offset)`.

use serde::{Deserialize, Serialize};

/// A half-open source range inside one named file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Name of the file this span belongs to (as passed to the resolver).
    pub file: String,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub start_offset: u32,
    pub end_offset: u32,
}

impl Span {
    pub fn new(
        file: impl Into<String>,
        start_line: u32,
        start_col: u32,
        end_line: u32,
        end_col: u32,
        start_offset: u32,
        end_offset: u32,
    ) -> Self {
        Self {
            file: file.into(),
            start_line,
            start_col,
            end_line,
            end_col,
            start_offset,
            end_offset,
        }
    }

    /// Zero-width span at a single point, used for synthetic diagnostics that
    /// have no real extent (e.g. "file has no syntax statement").
    pub fn point(file: impl Into<String>, line: u32, col: u32, offset: u32) -> Self {
        Self::new(file, line, col, line, col, offset, offset)
    }

    /// Merge two spans from the same file into their enclosing union.
    ///
    /// Used when a composite AST node's span is computed from its children.
    pub fn merge(a: &Span, b: &Span) -> Span {
        debug_assert_eq!(a.file, b.file, "cannot merge spans from different files");
        let (start_line, start_col, start_offset) = if a.start_offset <= b.start_offset {
            (a.start_line, a.start_col, a.start_offset)
        } else {
            (b.start_line, b.start_col, b.start_offset)
        };
        let (end_line, end_col, end_offset) = if a.end_offset >= b.end_offset {
            (a.end_line, a.end_col, a.end_offset)
        } else {
            (b.end_line, b.end_col, b.end_offset)
        };
        Span {
            file: a.file.clone(),
            start_line,
            start_col,
            end_line,
            end_col,
            start_offset,
            end_offset,
        }
    }

    pub fn byte_len(&self) -> u32 {
        self.end_offset.saturating_sub(self.start_offset)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.start_line, self.start_col)
    }
}

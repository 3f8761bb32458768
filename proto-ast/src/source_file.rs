//! Owns the raw bytes of one `.proto` file plus the position-lookup tables
//! built while lexing it (spec §3 "SourceFile").

use proto_diagnostics::Span;

/// Dense id into a [`SourceFile`]'s span table. Ids are handed out in
/// increasing source order, so `TokenId` ordering matches document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    pub offset: u32,
    pub len: u32,
}

impl ByteSpan {
    pub fn end(&self) -> u32 {
        self.offset + self.len
    }
}

/// Where a comment sits relative to the token it is attributed to.
///
/// `Detached` covers spec §4.1's blank-line rule: a leading comment run
/// separated from the following declaration by a blank line belongs to the
/// enclosing scope rather than to the declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAttachment {
    Leading,
    Trailing,
    Detached,
}

#[derive(Debug, Clone, Copy)]
struct CommentRecord {
    comment: TokenId,
    attached_to: TokenId,
    attachment: CommentAttachment,
}

/// Raw bytes of one `.proto` file plus the tables the lexer fills in as it
/// scans: a monotonically growing line-offset table and a dense token span
/// table (spec §3). Comments are not AST nodes; they live here, attributed to
/// an adjacent token.
pub struct SourceFile {
    name: String,
    text: String,
    line_starts: Vec<u32>,
    spans: Vec<ByteSpan>,
    comments: Vec<CommentRecord>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let raw = text.into();
        let text = raw
            .strip_prefix('\u{feff}')
            .map(str::to_owned)
            .unwrap_or(raw);

        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }

        Self {
            name: name.into(),
            text,
            line_starts,
            spans: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Appends a new span and returns its id. Callers must push spans in
    /// strictly increasing, non-overlapping order (spec §3 invariant).
    pub fn push_span(&mut self, offset: u32, len: u32) -> TokenId {
        if let Some(last) = self.spans.last() {
            assert!(
                offset >= last.end(),
                "token spans must be non-overlapping and monotonic by offset"
            );
        }
        let id = TokenId(self.spans.len() as u32);
        self.spans.push(ByteSpan { offset, len });
        id
    }

    pub fn span(&self, id: TokenId) -> ByteSpan {
        self.spans[id.0 as usize]
    }

    /// Finds the token whose span starts exactly at `offset`, if any.
    ///
    /// Composite AST nodes don't carry a `TokenId` of their own (only
    /// terminals do), but a composite's span always starts at the offset of
    /// its leading token (see `proto-ast`'s parser, which seeds a
    /// composite's span from the current token's span before consuming any
    /// children). This recovers that token id for comment lookups.
    pub fn token_at_offset(&self, offset: u32) -> Option<TokenId> {
        self.spans
            .binary_search_by_key(&offset, |s| s.offset)
            .ok()
            .map(|i| TokenId(i as u32))
    }

    pub fn text_of(&self, id: TokenId) -> &str {
        let span = self.span(id);
        &self.text[span.offset as usize..span.end() as usize]
    }

    /// Records a comment's attribution to an adjacent token. Comment ids must
    /// be greater than every previously recorded comment, and attribution
    /// targets must be monotonically non-decreasing (spec §3 invariant).
    pub fn push_comment(
        &mut self,
        comment: TokenId,
        attached_to: TokenId,
        attachment: CommentAttachment,
    ) {
        if let Some(last) = self.comments.last() {
            assert!(
                comment.0 > last.comment.0,
                "comment token ids must be strictly increasing"
            );
            assert!(
                attached_to.0 >= last.attached_to.0,
                "comment attribution ids must be monotonically non-decreasing"
            );
        }
        self.comments.push(CommentRecord {
            comment,
            attached_to,
            attachment,
        });
    }

    pub fn leading_comments(&self, token: TokenId) -> Vec<TokenId> {
        self.comments_with(token, CommentAttachment::Leading)
    }

    pub fn trailing_comments(&self, token: TokenId) -> Vec<TokenId> {
        self.comments_with(token, CommentAttachment::Trailing)
    }

    pub fn detached_comments(&self, token: TokenId) -> Vec<TokenId> {
        self.comments_with(token, CommentAttachment::Detached)
    }

    fn comments_with(&self, token: TokenId, attachment: CommentAttachment) -> Vec<TokenId> {
        self.comments
            .iter()
            .filter(|c| {
                c.attached_to == token
                    && std::mem::discriminant(&c.attachment) == std::mem::discriminant(&attachment)
            })
            .map(|c| c.comment)
            .collect()
    }

    /// 1-based `(line, column)` for a byte offset; column counts Unicode
    /// scalar values, not bytes, so diagnostics line up in a terminal.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx] as usize;
        let col = self.text[line_start..offset as usize].chars().count() as u32 + 1;
        (line_idx as u32 + 1, col)
    }

    pub fn span_at(&self, id: TokenId) -> Span {
        self.byte_span_to_span(self.span(id))
    }

    pub fn byte_span_to_span(&self, byte_span: ByteSpan) -> Span {
        let (start_line, start_col) = self.line_col(byte_span.offset);
        let (end_line, end_col) = self.line_col(byte_span.end());
        Span::new(
            self.name.clone(),
            start_line,
            start_col,
            end_line,
            end_col,
            byte_span.offset,
            byte_span.end(),
        )
    }

    pub fn point_span(&self, offset: u32) -> Span {
        let (line, col) = self.line_col(offset);
        Span::point(self.name.clone(), line, col, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom() {
        let f = SourceFile::new("a.proto", "\u{feff}syntax");
        assert_eq!(f.text(), "syntax");
    }

    #[test]
    fn line_col_tracks_newlines() {
        let f = SourceFile::new("a.proto", "abc\ndef\n");
        assert_eq!(f.line_col(0), (1, 1));
        assert_eq!(f.line_col(4), (2, 1));
        assert_eq!(f.line_col(7), (2, 4));
    }

    #[test]
    fn comment_attribution_round_trips() {
        let mut f = SourceFile::new("a.proto", "// lead\nmessage");
        let comment = f.push_span(0, 7);
        let tok = f.push_span(8, 7);
        f.push_comment(comment, tok, CommentAttachment::Leading);
        assert_eq!(f.leading_comments(tok), vec![comment]);
        assert!(f.trailing_comments(tok).is_empty());
    }
}

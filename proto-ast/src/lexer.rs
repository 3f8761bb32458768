//! Hand-rolled byte/char scanner turning a [`SourceFile`] into a stream of
//! significant tokens plus comment attribution (spec §4.1).
//!
//! Whitespace runs are not individually spanned: nothing ever needs a
//! `TokenId` for one, so the lexer only tracks newline counts locally to
//! decide comment attachment, instead of paying for a span-table entry per
//! run.

use crate::errors::{LexError, SpannedLexError};
use crate::source_file::{CommentAttachment, SourceFile, TokenId};
use crate::token::{IntRadix, Keyword, Punct, Token, TokenKind};

pub struct Lexer<'a> {
    file: &'a mut SourceFile,
    chars: Vec<(u32, char)>,
    pos: usize,
    tokens: Vec<Token>,
    errors: Vec<SpannedLexError>,
    last_significant: Option<TokenId>,
    /// Comments seen since the last significant token, awaiting attachment.
    pending: Vec<TokenId>,
    /// Newlines seen since the end of the previous trivia/token.
    newlines_since_prev: u32,
    /// True once a newline has been seen since `last_significant`, used to
    /// tell a trailing comment (same line) from a leading one.
    saw_newline_since_token: bool,
}

pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<SpannedLexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(file: &'a mut SourceFile) -> Self {
        let chars = file.text().char_indices().map(|(i, c)| (i as u32, c)).collect();
        Self {
            file,
            chars,
            pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
            last_significant: None,
            pending: Vec::new(),
            newlines_since_prev: 0,
            saw_newline_since_token: false,
        }
    }

    pub fn run(mut self) -> LexOutput {
        while let Some((offset, c)) = self.peek() {
            if c == '\n' {
                self.newlines_since_prev += 1;
                self.saw_newline_since_token = true;
                self.bump();
                continue;
            }
            if c.is_whitespace() {
                self.bump();
                continue;
            }
            if c == '/' && self.peek_at(1) == Some('/') {
                self.scan_line_comment(offset);
                continue;
            }
            if c == '/' && self.peek_at(1) == Some('*') {
                self.scan_block_comment(offset);
                continue;
            }
            if c == '"' || c == '\'' {
                self.scan_string(offset, c);
                continue;
            }
            if c.is_ascii_digit() {
                self.scan_number(offset);
                continue;
            }
            if c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) {
                self.scan_number(offset);
                continue;
            }
            if is_ident_start(c) {
                self.scan_ident(offset);
                continue;
            }
            if let Some(p) = Punct::from_char(c) {
                self.bump();
                let id = self.file.push_span(offset, c.len_utf8() as u32);
                self.push_significant(Token { id, kind: TokenKind::Punct(p) });
                continue;
            }
            self.bump();
            let id = self.file.push_span(offset, c.len_utf8() as u32);
            self.errors.push(SpannedLexError {
                span: self.file.span_at(id),
                error: LexError::UnexpectedChar { found: c },
            });
        }
        self.flush_pending_as_detached();
        LexOutput { tokens: self.tokens, errors: self.errors }
    }

    fn peek(&self) -> Option<(u32, char)> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<(u32, char)> {
        let cur = self.peek();
        if cur.is_some() {
            self.pos += 1;
        }
        cur
    }

    fn end_offset(&self) -> u32 {
        self.chars
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or_else(|| self.file.len())
    }

    fn push_significant(&mut self, token: Token) {
        self.flush_pending(token.id);
        self.tokens.push(token);
        self.last_significant = Some(token.id);
        self.saw_newline_since_token = false;
    }

    /// Attaches buffered comments to the token that just arrived. A blank
    /// line immediately before the token detaches the whole pending run from
    /// it instead (spec §4.1).
    fn flush_pending(&mut self, attached_to: TokenId) {
        if self.pending.is_empty() {
            return;
        }
        let detached = self.newlines_since_prev >= 2;
        let kind = if detached { CommentAttachment::Detached } else { CommentAttachment::Leading };
        for comment in self.pending.drain(..) {
            self.file.push_comment(comment, attached_to, kind);
        }
    }

    /// At end of file, any still-pending comments have no following token to
    /// attach to; record them against themselves as detached trailers.
    fn flush_pending_as_detached(&mut self) {
        for comment in self.pending.drain(..) {
            self.file.push_comment(comment, comment, CommentAttachment::Detached);
        }
    }

    fn scan_line_comment(&mut self, offset: u32) {
        self.bump();
        self.bump();
        while let Some((_, c)) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        self.record_comment(offset, TokenKind::LineComment);
    }

    fn scan_block_comment(&mut self, offset: u32) {
        self.bump();
        self.bump();
        let mut terminated = false;
        while let Some((_, c)) = self.peek() {
            if c == '*' && self.peek_at(1) == Some('/') {
                self.bump();
                self.bump();
                terminated = true;
                break;
            }
            if c == '\n' {
                self.newlines_since_prev += 1;
            }
            self.bump();
        }
        let id = self.record_comment(offset, TokenKind::BlockComment);
        if !terminated {
            self.errors.push(SpannedLexError {
                span: self.file.span_at(id),
                error: LexError::UnterminatedBlockComment,
            });
        }
    }

    fn record_comment(&mut self, offset: u32, kind: TokenKind) -> TokenId {
        let end = self.end_offset();
        let id = self.file.push_span(offset, end - offset);
        self.tokens.push(Token { id, kind });
        if self.last_significant.is_some() && !self.saw_newline_since_token {
            self.file.push_comment(id, self.last_significant.unwrap(), CommentAttachment::Trailing);
        } else {
            self.pending.push(id);
        }
        self.newlines_since_prev = 0;
        id
    }

    fn scan_string(&mut self, offset: u32, quote: char) {
        self.bump();
        let mut terminated = false;
        while let Some((_, c)) = self.peek() {
            if c == quote {
                self.bump();
                terminated = true;
                break;
            }
            if c == '\n' {
                break;
            }
            if c == '\\' {
                self.bump();
                self.scan_escape(offset);
                continue;
            }
            self.bump();
        }
        let end = self.end_offset();
        let id = self.file.push_span(offset, end - offset);
        self.push_significant(Token { id, kind: TokenKind::StringLiteral });
        if !terminated {
            self.errors.push(SpannedLexError {
                span: self.file.span_at(id),
                error: LexError::UnterminatedString,
            });
        }
    }

    fn scan_escape(&mut self, string_offset: u32) {
        let Some((_, c)) = self.peek() else {
            return;
        };
        match c {
            'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' | '\'' | '"' | '?' => {
                self.bump();
            }
            '0'..='7' => {
                for _ in 0..3 {
                    if self.peek().is_some_and(|(_, d)| ('0'..='7').contains(&d)) {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            'x' => {
                self.bump();
                while self.peek().is_some_and(|(_, d)| d.is_ascii_hexdigit()) {
                    self.bump();
                }
            }
            'u' => {
                self.bump();
                for _ in 0..4 {
                    self.bump();
                }
            }
            'U' => {
                self.bump();
                for _ in 0..8 {
                    self.bump();
                }
            }
            other => {
                self.bump();
                self.errors.push(SpannedLexError {
                    span: self.file.point_span(string_offset),
                    error: LexError::InvalidEscape(other),
                });
            }
        }
    }

    fn scan_number(&mut self, offset: u32) {
        let mut radix = IntRadix::Decimal;
        let mut is_float = false;

        if self.peek().map(|(_, c)| c) == Some('0')
            && matches!(self.peek_at(1), Some('x') | Some('X'))
        {
            radix = IntRadix::Hex;
            self.bump();
            self.bump();
            while self.peek().is_some_and(|(_, c)| c.is_ascii_hexdigit()) {
                self.bump();
            }
        } else {
            if self.peek().map(|(_, c)| c) == Some('0')
                && self.peek_at(1).is_some_and(|c| ('0'..='7').contains(&c))
            {
                radix = IntRadix::Octal;
            }
            while self.peek().is_some_and(|(_, c)| c.is_ascii_digit()) {
                self.bump();
            }
            if self.peek().map(|(_, c)| c) == Some('.')
                && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                self.bump();
                while self.peek().is_some_and(|(_, c)| c.is_ascii_digit()) {
                    self.bump();
                }
            }
            if matches!(self.peek().map(|(_, c)| c), Some('e') | Some('E')) {
                let save = self.pos;
                self.bump();
                if matches!(self.peek().map(|(_, c)| c), Some('+') | Some('-')) {
                    self.bump();
                }
                if self.peek().is_some_and(|(_, c)| c.is_ascii_digit()) {
                    is_float = true;
                    while self.peek().is_some_and(|(_, c)| c.is_ascii_digit()) {
                        self.bump();
                    }
                } else {
                    self.pos = save;
                }
            }
        }

        let end = self.end_offset();
        let id = self.file.push_span(offset, end - offset);
        let kind = if is_float { TokenKind::FloatLiteral } else { TokenKind::IntLiteral(radix) };
        self.push_significant(Token { id, kind });
    }

    fn scan_ident(&mut self, offset: u32) {
        while self.peek().is_some_and(|(_, c)| is_ident_continue(c)) {
            self.bump();
        }
        let end = self.end_offset();
        let id = self.file.push_span(offset, end - offset);
        let text = self.file.text_of(id);
        let kind = match Keyword::from_str(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident,
        };
        self.push_significant(Token { id, kind });
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> (SourceFile, LexOutput) {
        let mut file = SourceFile::new("t.proto", src);
        let out = {
            let lexer = Lexer::new(&mut file);
            lexer.run()
        };
        (file, out)
    }

    #[test]
    fn lexes_keywords_and_idents() {
        let (file, out) = lex("message Foo {}");
        assert!(out.errors.is_empty());
        assert_eq!(out.tokens.len(), 4);
        assert_eq!(out.tokens[0].kind, TokenKind::Keyword(Keyword::Message));
        assert_eq!(file.text_of(out.tokens[1].id), "Foo");
    }

    #[test]
    fn trailing_comment_attaches_to_prior_token() {
        let (file, out) = lex("int32 x = 1; // trailing\n");
        let semi = out
            .tokens
            .iter()
            .rev()
            .find(|t| matches!(t.kind, TokenKind::Punct(Punct::Semi)))
            .unwrap();
        assert_eq!(file.trailing_comments(semi.id).len(), 1);
    }

    #[test]
    fn blank_line_detaches_leading_comment() {
        let (file, out) = lex("// detached\n\nmessage Foo {}\n");
        let message_tok = out
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::Keyword(Keyword::Message))
            .unwrap();
        assert!(file.leading_comments(message_tok.id).is_empty());
        assert_eq!(file.detached_comments(message_tok.id).len(), 1);
    }

    #[test]
    fn unterminated_string_reported() {
        let (_file, out) = lex("\"abc\n");
        assert!(out.errors.iter().any(|e| matches!(e.error, LexError::UnterminatedString)));
    }

    #[test]
    fn hex_and_float_literals() {
        let (_file, out) = lex("0x1F 3.14 2e10");
        assert_eq!(out.tokens[0].kind, TokenKind::IntLiteral(IntRadix::Hex));
        assert_eq!(out.tokens[1].kind, TokenKind::FloatLiteral);
        assert_eq!(out.tokens[2].kind, TokenKind::FloatLiteral);
    }
}

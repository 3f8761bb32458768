//! Recursive-descent parser over the significant token stream (spec §4.2).
//!
//! Errors are recorded rather than raised: on a malformed declaration the
//! parser skips to the next `;` or a matching `}` and resumes, so one bad
//! statement doesn't swallow the rest of the file. Every input token ends up
//! represented somewhere in the tree, including ones the parser couldn't
//! place (as [`NodeKind::Error`]) and stray top-level semicolons (as
//! [`NodeKind::EmptyDecl`]).

use crate::ast::{Ast, NodeId, NodeKind};
use crate::errors::{ParseError, SpannedParseError};
use crate::source_file::SourceFile;
use crate::token::{Keyword, Punct, Token, TokenKind};

pub struct ParseOutput {
    pub ast: Ast,
    pub errors: Vec<SpannedParseError>,
}

pub fn parse(file: &SourceFile, tokens: &[Token]) -> ParseOutput {
    let mut p = Parser { file, tokens, pos: 0, ast: Ast::new(), errors: Vec::new() };
    let root = p.parse_file();
    p.ast.set_root(root);
    ParseOutput { ast: p.ast, errors: p.errors }
}

struct Parser<'a> {
    file: &'a SourceFile,
    tokens: &'a [Token],
    pos: usize,
    ast: Ast,
    errors: Vec<SpannedParseError>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn end_span(&self) -> proto_diagnostics::Span {
        match self.tokens.last() {
            Some(t) => {
                let s = self.file.span_at(t.id);
                self.file.point_span(s.end_offset)
            }
            None => self.file.point_span(0),
        }
    }

    fn current_span(&self) -> proto_diagnostics::Span {
        match self.peek() {
            Some(t) => self.file.span_at(t.id),
            None => self.end_span(),
        }
    }

    fn describe(&self, tok: Option<Token>) -> String {
        match tok {
            Some(t) => format!("{:?} {:?}", t.kind, self.file.text_of(t.id)),
            None => "end of file".to_string(),
        }
    }

    fn error(&mut self, expected: impl Into<String>) {
        let expected = expected.into();
        let span = self.current_span();
        let found = self.describe(self.peek());
        let error = if self.at_eof() {
            ParseError::UnexpectedEof { expected }
        } else {
            ParseError::Expected { expected, found }
        };
        self.errors.push(SpannedParseError { span, error });
    }

    fn is_punct(&self, p: Punct) -> bool {
        self.peek_kind() == Some(TokenKind::Punct(p))
    }

    fn is_keyword(&self, k: Keyword) -> bool {
        self.peek_kind() == Some(TokenKind::Keyword(k))
    }

    fn eat_punct(&mut self, p: Punct) -> Option<Token> {
        if self.is_punct(p) {
            self.bump()
        } else {
            self.error(format!("{p:?}"));
            None
        }
    }

    fn eat_keyword(&mut self, k: Keyword) -> Option<Token> {
        if self.is_keyword(k) {
            self.bump()
        } else {
            self.error(format!("{k:?}"));
            None
        }
    }

    /// Skips tokens until just past the next `;` at the current nesting
    /// depth, or just past a matching `}`, whichever comes first. Used to
    /// resynchronize after a malformed declaration.
    fn recover(&mut self) -> Vec<NodeId> {
        let mut skipped = Vec::new();
        let mut depth = 0i32;
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Punct(Punct::LBrace) => depth += 1,
                TokenKind::Punct(Punct::RBrace) if depth == 0 => break,
                TokenKind::Punct(Punct::RBrace) => depth -= 1,
                TokenKind::Punct(Punct::Semi) if depth == 0 => {
                    let span = self.file.span_at(tok.id);
                    skipped.push(self.ast.push_terminal(NodeKind::Error, tok.id, span));
                    self.bump();
                    break;
                }
                _ => {}
            }
            let span = self.file.span_at(tok.id);
            skipped.push(self.ast.push_terminal(NodeKind::Error, tok.id, span));
            self.bump();
        }
        skipped
    }

    fn terminal(&mut self, kind: NodeKind) -> Option<NodeId> {
        let tok = self.bump()?;
        let span = self.file.span_at(tok.id);
        Some(self.ast.push_terminal(kind, tok.id, span))
    }

    fn composite_span(&self, children: &[NodeId], fallback: proto_diagnostics::Span) -> proto_diagnostics::Span {
        let mut iter = children.iter().map(|c| self.ast.node(*c).span().clone());
        match iter.next() {
            Some(first) => iter.fold(first, |acc, s| proto_diagnostics::Span::merge(&acc, &s)),
            None => fallback,
        }
    }

    fn composite(&mut self, kind: NodeKind, children: Vec<NodeId>, start: proto_diagnostics::Span) -> NodeId {
        let span = self.composite_span(&children, start);
        self.ast.push_composite(kind, children, span)
    }

    // ---- grammar ----

    fn parse_file(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        while !self.at_eof() {
            if self.is_punct(Punct::Semi) {
                let semi = self.terminal(NodeKind::Error).unwrap();
                children.push(self.composite(NodeKind::EmptyDecl, vec![semi], start.clone()));
                continue;
            }
            if self.is_keyword(Keyword::Syntax) {
                children.push(self.parse_syntax());
                continue;
            }
            if self.is_keyword(Keyword::Edition) {
                children.push(self.parse_edition());
                continue;
            }
            if self.is_keyword(Keyword::Import) {
                children.push(self.parse_import());
                continue;
            }
            if self.is_keyword(Keyword::Package) {
                children.push(self.parse_package());
                continue;
            }
            if self.is_keyword(Keyword::Option) {
                children.push(self.parse_option_stmt());
                continue;
            }
            if self.is_keyword(Keyword::Message) {
                children.push(self.parse_message());
                continue;
            }
            if self.is_keyword(Keyword::Enum) {
                children.push(self.parse_enum());
                continue;
            }
            if self.is_keyword(Keyword::Service) {
                children.push(self.parse_service());
                continue;
            }
            if self.is_keyword(Keyword::Extend) {
                children.push(self.parse_extend());
                continue;
            }
            self.error("a top-level declaration");
            children.extend(self.recover());
        }
        self.ast.push_composite(NodeKind::File, children, start)
    }

    fn parse_syntax(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        self.eat_punct(Punct::Eq);
        if let Some(s) = self.terminal(NodeKind::StrLit) {
            children.push(s);
        }
        self.eat_punct(Punct::Semi);
        self.composite(NodeKind::Syntax, children, start)
    }

    fn parse_edition(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        self.eat_punct(Punct::Eq);
        if let Some(s) = self.terminal(NodeKind::StrLit) {
            children.push(s);
        }
        self.eat_punct(Punct::Semi);
        self.composite(NodeKind::Edition, children, start)
    }

    fn parse_import(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        if self.is_keyword(Keyword::Optional) || matches!(self.peek_kind(), Some(TokenKind::Ident)) {
            // `public`/`weak` are plain identifiers in this grammar.
            if let Some(tok) = self.peek() {
                let text = self.file.text_of(tok.id);
                if text == "public" || text == "weak" {
                    if let Some(id) = self.terminal(NodeKind::Ident) {
                        children.push(id);
                    }
                }
            }
        }
        if let Some(s) = self.terminal(NodeKind::StrLit) {
            children.push(s);
        } else {
            self.error("a string literal");
        }
        self.eat_punct(Punct::Semi);
        self.composite(NodeKind::Import, children, start)
    }

    fn parse_package(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        children.push(self.parse_ident_path());
        self.eat_punct(Punct::Semi);
        self.composite(NodeKind::Package, children, start)
    }

    fn parse_ident_path(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        if let Some(id) = self.terminal(NodeKind::Ident) {
            children.push(id);
        } else {
            self.error("an identifier");
        }
        while self.is_punct(Punct::Dot) {
            self.bump();
            if let Some(id) = self.terminal(NodeKind::Ident) {
                children.push(id);
            } else {
                self.error("an identifier");
                break;
            }
        }
        self.composite(NodeKind::IdentPath, children, start)
    }

    fn parse_option_stmt(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        children.push(self.parse_option_name());
        self.eat_punct(Punct::Eq);
        if let Some(v) = self.parse_option_value() {
            children.push(v);
        }
        self.eat_punct(Punct::Semi);
        self.composite(NodeKind::OptionStmt, children, start)
    }

    fn parse_option_name(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        loop {
            if self.is_punct(Punct::LParen) {
                self.bump();
                children.push(self.parse_ident_path());
                self.eat_punct(Punct::RParen);
            } else if let Some(id) = self.terminal(NodeKind::Ident) {
                children.push(id);
            } else {
                self.error("an option name component");
                break;
            }
            if self.is_punct(Punct::Dot) {
                self.bump();
                continue;
            }
            break;
        }
        self.composite(NodeKind::OptionName, children, start)
    }

    fn parse_option_value(&mut self) -> Option<NodeId> {
        let start = self.current_span();
        match self.peek_kind()? {
            TokenKind::StringLiteral => self.terminal(NodeKind::StrLit),
            TokenKind::IntLiteral(_) => self.terminal(NodeKind::IntLit),
            TokenKind::FloatLiteral => self.terminal(NodeKind::FloatLit),
            TokenKind::Keyword(Keyword::True) | TokenKind::Keyword(Keyword::False) => {
                self.terminal(NodeKind::BoolLit)
            }
            TokenKind::Keyword(Keyword::Inf) | TokenKind::Keyword(Keyword::Nan) => {
                self.terminal(NodeKind::SpecialFloatLit)
            }
            TokenKind::Punct(Punct::Minus) | TokenKind::Punct(Punct::Plus) => {
                let sign = self.bump().unwrap();
                let sign_id = self.ast.push_terminal(NodeKind::Error, sign.id, self.file.span_at(sign.id));
                let value = self.parse_option_value()?;
                Some(self.composite(NodeKind::IntLit, vec![sign_id, value], start))
            }
            TokenKind::Punct(Punct::LBrace) => Some(self.parse_message_literal()),
            TokenKind::Ident => self.terminal(NodeKind::Ident),
            _ => {
                self.error("an option value");
                None
            }
        }
    }

    fn parse_message_literal(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.eat_punct(Punct::LBrace);
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            children.push(self.parse_message_literal_field());
        }
        self.eat_punct(Punct::RBrace);
        self.composite(NodeKind::MessageLiteral, children, start)
    }

    fn parse_message_literal_field(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        if let Some(id) = self.terminal(NodeKind::Ident) {
            children.push(id);
        } else {
            self.error("a message literal field name");
        }
        if self.is_punct(Punct::Colon) {
            self.bump();
        }
        if self.is_punct(Punct::LBracket) {
            children.push(self.parse_array_literal());
        } else if let Some(v) = self.parse_option_value() {
            children.push(v);
        }
        if self.is_punct(Punct::Comma) || self.is_punct(Punct::Semi) {
            self.bump();
        }
        self.composite(NodeKind::MessageLiteralField, children, start)
    }

    fn parse_array_literal(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        while !self.is_punct(Punct::RBracket) && !self.at_eof() {
            if let Some(v) = self.parse_option_value() {
                children.push(v);
            } else {
                break;
            }
            if self.is_punct(Punct::Comma) {
                self.bump();
            }
        }
        self.eat_punct(Punct::RBracket);
        self.composite(NodeKind::ArrayLiteral, children, start)
    }

    fn parse_compact_options(&mut self) -> Option<NodeId> {
        if !self.is_punct(Punct::LBracket) {
            return None;
        }
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        while !self.is_punct(Punct::RBracket) && !self.at_eof() {
            let opt_start = self.current_span();
            let mut opt_children = Vec::new();
            opt_children.push(self.parse_option_name());
            self.eat_punct(Punct::Eq);
            if let Some(v) = self.parse_option_value() {
                opt_children.push(v);
            }
            children.push(self.composite(NodeKind::OptionStmt, opt_children, opt_start));
            if self.is_punct(Punct::Comma) {
                self.bump();
            }
        }
        self.eat_punct(Punct::RBracket);
        Some(self.composite(NodeKind::CompactOptions, children, start))
    }

    fn is_type_start(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Ident) | Some(TokenKind::Punct(Punct::Dot)))
    }

    fn parse_message(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        if let Some(id) = self.terminal(NodeKind::Ident) {
            children.push(id);
        }
        children.push(self.parse_message_body());
        self.composite(NodeKind::Message, children, start)
    }

    fn parse_message_body(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.eat_punct(Punct::LBrace);
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            if self.is_punct(Punct::Semi) {
                let semi = self.terminal(NodeKind::Error).unwrap();
                children.push(self.composite(NodeKind::EmptyDecl, vec![semi], start.clone()));
                continue;
            }
            if self.is_keyword(Keyword::Message) {
                children.push(self.parse_message());
                continue;
            }
            if self.is_keyword(Keyword::Enum) {
                children.push(self.parse_enum());
                continue;
            }
            if self.is_keyword(Keyword::Oneof) {
                children.push(self.parse_oneof());
                continue;
            }
            if self.is_keyword(Keyword::Option) {
                children.push(self.parse_option_stmt());
                continue;
            }
            if self.is_keyword(Keyword::Reserved) {
                children.push(self.parse_reserved());
                continue;
            }
            if self.is_keyword(Keyword::Extensions) {
                children.push(self.parse_extensions());
                continue;
            }
            if self.is_keyword(Keyword::Extend) {
                children.push(self.parse_extend());
                continue;
            }
            if self.is_keyword(Keyword::Map) {
                children.push(self.parse_field(true));
                continue;
            }
            if matches!(self.peek_kind(), Some(TokenKind::Keyword(Keyword::Optional)))
                || matches!(self.peek_kind(), Some(TokenKind::Keyword(Keyword::Required)))
                || matches!(self.peek_kind(), Some(TokenKind::Keyword(Keyword::Repeated)))
                || self.is_type_start()
            {
                children.push(self.parse_field(false));
                continue;
            }
            self.error("a message element");
            children.extend(self.recover());
        }
        self.eat_punct(Punct::RBrace);
        self.composite(NodeKind::MessageBody, children, start)
    }

    fn parse_label(&mut self) -> Option<NodeId> {
        match self.peek_kind()? {
            TokenKind::Keyword(Keyword::Optional)
            | TokenKind::Keyword(Keyword::Required)
            | TokenKind::Keyword(Keyword::Repeated) => self.terminal(NodeKind::Label),
            _ => None,
        }
    }

    fn parse_field(&mut self, is_map: bool) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();

        if is_map {
            children.push(self.parse_map_type());
        } else {
            if let Some(label) = self.parse_label() {
                children.push(label);
            }
            children.push(self.parse_ident_path());
        }

        if let Some(id) = self.terminal(NodeKind::Ident) {
            children.push(id);
        } else {
            self.error("a field name");
        }
        self.eat_punct(Punct::Eq);
        if let Some(id) = self.terminal(NodeKind::IntLit) {
            children.push(id);
        } else {
            self.error("a field number");
        }
        if let Some(opts) = self.parse_compact_options() {
            children.push(opts);
        }
        self.eat_punct(Punct::Semi);
        self.composite(NodeKind::Field, children, start)
    }

    fn parse_map_type(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        self.eat_punct(Punct::Lt);
        children.push(self.parse_ident_path());
        self.eat_punct(Punct::Comma);
        children.push(self.parse_ident_path());
        self.eat_punct(Punct::Gt);
        self.composite(NodeKind::MapType, children, start)
    }

    fn parse_oneof(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        if let Some(id) = self.terminal(NodeKind::Ident) {
            children.push(id);
        }
        self.eat_punct(Punct::LBrace);
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            if self.is_keyword(Keyword::Option) {
                children.push(self.parse_option_stmt());
                continue;
            }
            if self.is_type_start() {
                let field_start = self.current_span();
                let mut field_children = Vec::new();
                field_children.push(self.parse_ident_path());
                if let Some(id) = self.terminal(NodeKind::Ident) {
                    field_children.push(id);
                } else {
                    self.error("a field name");
                }
                self.eat_punct(Punct::Eq);
                if let Some(id) = self.terminal(NodeKind::IntLit) {
                    field_children.push(id);
                } else {
                    self.error("a field number");
                }
                if let Some(opts) = self.parse_compact_options() {
                    field_children.push(opts);
                }
                self.eat_punct(Punct::Semi);
                children.push(self.composite(NodeKind::OneofField, field_children, field_start));
                continue;
            }
            self.error("a oneof field");
            children.extend(self.recover());
        }
        self.eat_punct(Punct::RBrace);
        self.composite(NodeKind::Oneof, children, start)
    }

    fn parse_reserved(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        if matches!(self.peek_kind(), Some(TokenKind::StringLiteral)) {
            while matches!(self.peek_kind(), Some(TokenKind::StringLiteral)) {
                if let Some(id) = self.terminal(NodeKind::ReservedName) {
                    children.push(id);
                }
                if self.is_punct(Punct::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        } else {
            loop {
                let range_start = self.current_span();
                let mut range_children = Vec::new();
                if let Some(id) = self.terminal(NodeKind::IntLit) {
                    range_children.push(id);
                } else {
                    self.error("a reserved number");
                    break;
                }
                if self.is_keyword(Keyword::To) {
                    self.bump();
                    if self.is_keyword(Keyword::Max) {
                        if let Some(id) = self.terminal(NodeKind::Ident) {
                            range_children.push(id);
                        }
                    } else if let Some(id) = self.terminal(NodeKind::IntLit) {
                        range_children.push(id);
                    }
                }
                children.push(self.composite(NodeKind::ReservedRange, range_children, range_start));
                if self.is_punct(Punct::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.eat_punct(Punct::Semi);
        self.composite(NodeKind::Reserved, children, start)
    }

    fn parse_extensions(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        loop {
            let range_start = self.current_span();
            let mut range_children = Vec::new();
            if let Some(id) = self.terminal(NodeKind::IntLit) {
                range_children.push(id);
            } else {
                self.error("an extension number");
                break;
            }
            if self.is_keyword(Keyword::To) {
                self.bump();
                if self.is_keyword(Keyword::Max) {
                    if let Some(id) = self.terminal(NodeKind::Ident) {
                        range_children.push(id);
                    }
                } else if let Some(id) = self.terminal(NodeKind::IntLit) {
                    range_children.push(id);
                }
            }
            children.push(self.composite(NodeKind::ExtensionsRange, range_children, range_start));
            if self.is_punct(Punct::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        if let Some(opts) = self.parse_compact_options() {
            children.push(opts);
        }
        self.eat_punct(Punct::Semi);
        self.composite(NodeKind::Extensions, children, start)
    }

    fn parse_extend(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        children.push(self.parse_ident_path());
        self.eat_punct(Punct::LBrace);
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            if self.is_type_start()
                || matches!(self.peek_kind(), Some(TokenKind::Keyword(Keyword::Optional)))
                || matches!(self.peek_kind(), Some(TokenKind::Keyword(Keyword::Required)))
                || matches!(self.peek_kind(), Some(TokenKind::Keyword(Keyword::Repeated)))
            {
                children.push(self.parse_field(false));
                continue;
            }
            self.error("an extension field");
            children.extend(self.recover());
        }
        self.eat_punct(Punct::RBrace);
        self.composite(NodeKind::Extend, children, start)
    }

    fn parse_enum(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        if let Some(id) = self.terminal(NodeKind::Ident) {
            children.push(id);
        }
        children.push(self.parse_enum_body());
        self.composite(NodeKind::Enum, children, start)
    }

    fn parse_enum_body(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.eat_punct(Punct::LBrace);
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            if self.is_punct(Punct::Semi) {
                let semi = self.terminal(NodeKind::Error).unwrap();
                children.push(self.composite(NodeKind::EmptyDecl, vec![semi], start.clone()));
                continue;
            }
            if self.is_keyword(Keyword::Option) {
                children.push(self.parse_option_stmt());
                continue;
            }
            if self.is_keyword(Keyword::Reserved) {
                children.push(self.parse_reserved());
                continue;
            }
            if matches!(self.peek_kind(), Some(TokenKind::Ident)) {
                children.push(self.parse_enum_value());
                continue;
            }
            self.error("an enum value");
            children.extend(self.recover());
        }
        self.eat_punct(Punct::RBrace);
        self.composite(NodeKind::EnumBody, children, start)
    }

    fn parse_enum_value(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        if let Some(id) = self.terminal(NodeKind::Ident) {
            children.push(id);
        }
        self.eat_punct(Punct::Eq);
        let negative = self.is_punct(Punct::Minus);
        if negative {
            self.bump();
        }
        if let Some(id) = self.terminal(NodeKind::IntLit) {
            children.push(id);
        } else {
            self.error("an enum value number");
        }
        if let Some(opts) = self.parse_compact_options() {
            children.push(opts);
        }
        self.eat_punct(Punct::Semi);
        self.composite(NodeKind::EnumValue, children, start)
    }

    fn parse_service(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        if let Some(id) = self.terminal(NodeKind::Ident) {
            children.push(id);
        }
        self.eat_punct(Punct::LBrace);
        while !self.is_punct(Punct::RBrace) && !self.at_eof() {
            if self.is_punct(Punct::Semi) {
                let semi = self.terminal(NodeKind::Error).unwrap();
                children.push(self.composite(NodeKind::EmptyDecl, vec![semi], start.clone()));
                continue;
            }
            if self.is_keyword(Keyword::Option) {
                children.push(self.parse_option_stmt());
                continue;
            }
            if self.is_keyword(Keyword::Rpc) {
                children.push(self.parse_rpc());
                continue;
            }
            self.error("a service element");
            children.extend(self.recover());
        }
        self.eat_punct(Punct::RBrace);
        self.composite(NodeKind::Service, children, start)
    }

    fn parse_rpc(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        self.bump();
        if let Some(id) = self.terminal(NodeKind::Ident) {
            children.push(id);
        }
        self.eat_punct(Punct::LParen);
        children.push(self.parse_rpc_type());
        self.eat_punct(Punct::RParen);
        self.eat_keyword(Keyword::Returns);
        self.eat_punct(Punct::LParen);
        children.push(self.parse_rpc_type());
        self.eat_punct(Punct::RParen);

        if self.is_punct(Punct::LBrace) {
            self.bump();
            while !self.is_punct(Punct::RBrace) && !self.at_eof() {
                if self.is_keyword(Keyword::Option) {
                    children.push(self.parse_option_stmt());
                } else if self.is_punct(Punct::Semi) {
                    self.bump();
                } else {
                    self.error("an rpc option");
                    children.extend(self.recover());
                }
            }
            self.eat_punct(Punct::RBrace);
        } else {
            self.eat_punct(Punct::Semi);
        }
        self.composite(NodeKind::Rpc, children, start)
    }

    fn parse_rpc_type(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        if self.is_keyword(Keyword::Stream) {
            if let Some(id) = self.terminal(NodeKind::Ident) {
                children.push(id);
            }
        }
        children.push(self.parse_ident_path());
        self.composite(NodeKind::RpcType, children, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstView;
    use crate::lexer::Lexer;

    fn parse_src(src: &str) -> (SourceFile, ParseOutput) {
        let mut file = SourceFile::new("t.proto", src);
        let lex_out = {
            let lexer = Lexer::new(&mut file);
            lexer.run()
        };
        let parse_out = parse(&file, &lex_out.tokens);
        (file, parse_out)
    }

    #[test]
    fn parses_minimal_file() {
        let (file, out) = parse_src("syntax = \"proto3\";\nmessage Foo { int32 x = 1; }\n");
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let view = AstView::new(&out.ast, &file);
        let root = view.root();
        assert_eq!(root.syntax(), Some("\"proto3\""));
        let messages: Vec<_> = root.messages().collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].name(), "Foo");
        let fields: Vec<_> = messages[0].fields().collect();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name(), "x");
        assert_eq!(fields[0].number(), Some(1));
    }

    #[test]
    fn parses_package_and_nested_enum() {
        let (file, out) = parse_src(
            "package foo.bar;\nmessage M { enum E { A = 0; } repeated string names = 2; }\n",
        );
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let view = AstView::new(&out.ast, &file);
        let root = view.root();
        assert_eq!(root.package().as_deref(), Some("foo.bar"));
        let message = root.messages().next().unwrap();
        assert_eq!(message.nested_enums().next().unwrap().name(), "E");
        let field = message.fields().next().unwrap();
        assert_eq!(field.label(), Some("repeated"));
    }

    #[test]
    fn recovers_after_malformed_field() {
        let (_file, out) = parse_src("message M { @@@ ; int32 ok = 1; }\n");
        assert!(!out.errors.is_empty());
        let view = AstView::new(&out.ast, &_file);
        let message = view.root().messages().next().unwrap();
        assert_eq!(message.fields().count(), 1);
    }

    #[test]
    fn parses_service_and_rpc() {
        let (file, out) = parse_src(
            "service Greeter { rpc SayHello (stream HelloRequest) returns (HelloReply); }\n",
        );
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let view = AstView::new(&out.ast, &file);
        let service = view.root().services().next().unwrap();
        assert_eq!(service.name(), "Greeter");
        let rpc = service.rpcs().next().unwrap();
        assert_eq!(rpc.name(), "SayHello");
        assert!(rpc.client_streaming());
        assert!(!rpc.server_streaming());
        assert_eq!(rpc.input_type().as_deref(), Some("HelloRequest"));
        assert_eq!(rpc.output_type().as_deref(), Some("HelloReply"));
    }
}

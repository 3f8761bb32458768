//! Lexer, parser, and position-preserving AST for the Protocol Buffers
//! schema language (spec §3/§4.1/§4.2).
//!
//! This crate only turns source text into a tree with accurate spans and
//! comment attribution; it does not know what a message or a field *means*
//! structurally — validating cardinalities, resolving types, and lowering to
//! descriptor form are `proto-ir`'s job.

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod source_file;
pub mod token;

pub use ast::{Ast, AstView, NodeId, NodeKind};
pub use errors::{LexError, ParseError, SpannedLexError, SpannedParseError};
pub use lexer::{LexOutput, Lexer};
pub use literal::{decode_string_literal, strip_quotes};
pub use parser::{parse, ParseOutput};
pub use source_file::SourceFile;
pub use token::{Keyword, Punct, Token, TokenKind};

/// Lexes and parses one file in a single call, the common case for callers
/// that don't need to inspect the raw token stream.
pub fn parse_source(name: impl Into<String>, text: impl Into<String>) -> (SourceFile, ParseOutput, Vec<SpannedLexError>) {
    let mut file = SourceFile::new(name, text);
    let lex_out = Lexer::new(&mut file).run();
    let parse_out = parse(&file, &lex_out.tokens);
    (file, parse_out, lex_out.errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_produces_usable_tree() {
        let (file, parse_out, lex_errors) =
            parse_source("a.proto", "syntax = \"proto3\";\nmessage Ping {}\n");
        assert!(lex_errors.is_empty());
        assert!(parse_out.errors.is_empty());
        let view = AstView::new(&parse_out.ast, &file);
        assert_eq!(view.root().messages().next().unwrap().name(), "Ping");
    }
}

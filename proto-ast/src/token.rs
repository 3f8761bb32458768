//! Token kinds produced by the lexer (spec §4.1).

/// Reserved words that change grammar productions. Every other bareword is
/// a plain [`TokenKind::Ident`] — `default`, `json_name`, `weak`, `public`
/// are *contextual* keywords handled by the parser at the call site, not
/// reserved here, matching how the grammar actually uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Syntax,
    Edition,
    Import,
    Package,
    Option,
    Message,
    Enum,
    Extend,
    Service,
    Rpc,
    Returns,
    Stream,
    Optional,
    Required,
    Repeated,
    Group,
    Oneof,
    Map,
    Reserved,
    Extensions,
    To,
    Max,
    True,
    False,
    Inf,
    Nan,
}

impl Keyword {
    pub fn from_str(s: &str) -> Option<Keyword> {
        Some(match s {
            "syntax" => Keyword::Syntax,
            "edition" => Keyword::Edition,
            "import" => Keyword::Import,
            "package" => Keyword::Package,
            "option" => Keyword::Option,
            "message" => Keyword::Message,
            "enum" => Keyword::Enum,
            "extend" => Keyword::Extend,
            "service" => Keyword::Service,
            "rpc" => Keyword::Rpc,
            "returns" => Keyword::Returns,
            "stream" => Keyword::Stream,
            "optional" => Keyword::Optional,
            "required" => Keyword::Required,
            "repeated" => Keyword::Repeated,
            "group" => Keyword::Group,
            "oneof" => Keyword::Oneof,
            "map" => Keyword::Map,
            "reserved" => Keyword::Reserved,
            "extensions" => Keyword::Extensions,
            "to" => Keyword::To,
            "max" => Keyword::Max,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "inf" => Keyword::Inf,
            "nan" => Keyword::Nan,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    Eq,
    Semi,
    Colon,
    Comma,
    Dot,
    Lt,
    Gt,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Slash,
    Plus,
    Minus,
}

impl Punct {
    pub fn from_char(c: char) -> Option<Punct> {
        Some(match c {
            '=' => Punct::Eq,
            ';' => Punct::Semi,
            ':' => Punct::Colon,
            ',' => Punct::Comma,
            '.' => Punct::Dot,
            '<' => Punct::Lt,
            '>' => Punct::Gt,
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '/' => Punct::Slash,
            '+' => Punct::Plus,
            '-' => Punct::Minus,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntRadix {
    Decimal,
    Octal,
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Keyword(Keyword),
    IntLiteral(IntRadix),
    FloatLiteral,
    StringLiteral,
    Punct(Punct),
    /// `//` line comment or `/* */` block comment. Stored in the file's span
    /// table like any other token but attributed via
    /// [`crate::source_file::SourceFile::push_comment`] rather than appearing
    /// in the AST.
    LineComment,
    BlockComment,
    Whitespace,
    Eof,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::Whitespace
        )
    }
}

/// One lexed token: its span id plus classification. The significant-token
/// stream handed to the parser excludes [`TokenKind::is_trivia`] entries.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub id: crate::source_file::TokenId,
    pub kind: TokenKind,
}

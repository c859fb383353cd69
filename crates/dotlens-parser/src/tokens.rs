//! Token definitions for the DOT lexer.

use std::fmt;

use crate::span::Span;

/// A lexical token of the DOT language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    // Keywords (case-insensitive in source)
    Strict,
    Graph,
    Digraph,
    Subgraph,
    Node,
    Edge,

    /// Alphanumeric identifier not starting with a digit
    Identifier(&'a str),
    /// Numeral such as `-1.5` or `.5`
    Numeral(&'a str),
    /// Double-quoted string with `\"` and line continuations resolved
    QuotedString(String),
    /// HTML string, including the outer angle brackets
    HtmlString(&'a str),

    /// `->`
    DirectedEdge,
    /// `--`
    UndirectedEdge,

    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Equals,
    Semicolon,
    Comma,
    Colon,
    Plus,

    // Trivia
    Whitespace,
    Newline,
    LineComment(&'a str),
    BlockComment(&'a str),
    /// A `#` line, treated as a comment
    Preprocessor(&'a str),
}

impl Token<'_> {
    /// True for whitespace and comments, which the parser never sees.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace
                | Token::Newline
                | Token::LineComment(_)
                | Token::BlockComment(_)
                | Token::Preprocessor(_)
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Strict => write!(f, "strict"),
            Token::Graph => write!(f, "graph"),
            Token::Digraph => write!(f, "digraph"),
            Token::Subgraph => write!(f, "subgraph"),
            Token::Node => write!(f, "node"),
            Token::Edge => write!(f, "edge"),
            Token::Identifier(s) | Token::Numeral(s) | Token::HtmlString(s) => write!(f, "{s}"),
            Token::QuotedString(s) => write!(f, "\"{s}\""),
            Token::DirectedEdge => write!(f, "->"),
            Token::UndirectedEdge => write!(f, "--"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Equals => write!(f, "="),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Plus => write!(f, "+"),
            Token::Whitespace => write!(f, " "),
            Token::Newline => writeln!(f),
            Token::LineComment(s) => write!(f, "//{s}"),
            Token::BlockComment(s) => write!(f, "/*{s}*/"),
            Token::Preprocessor(s) => write!(f, "#{s}"),
        }
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken<'a> {
    pub token: Token<'a>,
    pub span: Span,
}

impl<'a> PositionedToken<'a> {
    pub fn new(token: Token<'a>, span: Span) -> Self {
        Self { token, span }
    }
}

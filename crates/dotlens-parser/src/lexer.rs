//! Lexical analyzer for DOT source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! It handles whitespace, the three comment forms (`//`, `/* */` and `#`
//! lines), quoted and HTML strings, numerals, identifiers and the
//! case-insensitive DOT keywords.
//!
//! The public entry point is [`tokenize`], which performs error-recovering
//! lexical analysis and collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    ascii::{Caseless, digit0, digit1},
    combinator::{alt, cut_err, not, opt, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{any, literal, none_of, one_of, take_until, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` to provide detailed error
/// messages with codes, help text, and precise span information.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Characters that may appear in an unquoted identifier.
fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

/// A piece of quoted string content after escape handling.
#[derive(Debug, Clone, Copy)]
enum StrPiece {
    Char(char),
    /// A backslash DOT does not interpret, kept with the character after it
    Kept(char),
    /// A backslash-newline line continuation
    Nothing,
}

/// Parse a backslash sequence inside a quoted string.
///
/// Only `\"` is an escape in DOT. A backslash before a line break joins the
/// lines; any other backslash is kept verbatim for Graphviz escape strings
/// such as `\n` or `\N`.
fn string_escape<'a>(input: &mut Input<'a>) -> IResult<'a, StrPiece> {
    preceded(
        '\\',
        alt((
            '"'.value(StrPiece::Char('"')),
            alt(("\r\n", "\n")).value(StrPiece::Nothing),
            any.map(StrPiece::Kept),
        )),
    )
    .parse_next(input)
}

/// Parse a double-quoted string.
fn quoted_string<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let string_content = repeat(
        0..,
        alt((string_escape, none_of(['"', '\\']).map(StrPiece::Char))),
    )
    .fold(String::new, |mut acc, piece| {
        match piece {
            StrPiece::Char(c) => acc.push(c),
            StrPiece::Kept(c) => {
                acc.push('\\');
                acc.push(c);
            }
            StrPiece::Nothing => {}
        }
        acc
    });

    let start_pos = input.current_token_start();

    '"'.parse_next(input)
        .map_err(|_: ErrMode<ContextError<LexerDiagnostic>>| {
            ErrMode::Backtrack(ContextError::new())
        })?;

    cut_err(terminated(string_content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"`"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::QuotedString)
}

/// Parse an HTML string: `<` ... `>` with balanced inner angle brackets.
fn html_string<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();
    let remaining = input.peek_finish();
    if !remaining.starts_with('<') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }

    let mut depth = 0usize;
    let mut end = None;
    for (idx, c) in remaining.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(idx + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    match end {
        Some(len) => Ok(Token::HtmlString(input.next_slice(len))),
        None => {
            let _ = input.finish();
            Err(ErrMode::Cut(ContextError::new().add_context(
                input,
                &input.checkpoint(),
                LexerDiagnostic {
                    code: ErrorCode::E003,
                    message: "unterminated HTML string",
                    help: Some("balance every `<` with a `>`"),
                    start: start_pos,
                },
            )))
        }
    }
}

/// Parse a numeral: `[-]?(.[0-9]+ | [0-9]+(.[0-9]*)?)`
fn numeral<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    terminated(
        (
            opt('-'),
            alt((('.', digit1).void(), (digit1, opt(('.', digit0))).void())),
        )
            .take(),
        // "2abc" is not a numeral followed by an identifier
        peek(not(one_of(is_id_char))),
    )
    .map(Token::Numeral)
    .parse_next(input)
}

/// Parse keywords with word boundary checking
fn keyword<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    terminated(
        alt((
            literal(Caseless("strict")),
            literal(Caseless("digraph")),
            literal(Caseless("graph")),
            literal(Caseless("subgraph")),
            literal(Caseless("node")),
            literal(Caseless("edge")),
        )),
        peek(not(one_of(is_id_char))),
    )
    .map(|keyword: &str| match keyword.to_ascii_lowercase().as_str() {
        "strict" => Token::Strict,
        "digraph" => Token::Digraph,
        "graph" => Token::Graph,
        "subgraph" => Token::Subgraph,
        "node" => Token::Node,
        _ => Token::Edge,
    })
    .parse_next(input)
}

/// Parse identifiers
fn identifier<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., is_id_char)
        .verify(|s: &str| !s.starts_with(|c: char| c.is_ascii_digit()))
        .map(Token::Identifier)
        .parse_next(input)
}

/// Parse line comment starting with '//'
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parse a `/* ... */` comment.
fn block_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();
    "/*".parse_next(input)?;

    let result = cut_err(terminated(take_until(0.., "*/"), "*/"))
        .context(LexerDiagnostic {
            code: ErrorCode::E004,
            message: "unterminated block comment",
            help: Some("close the comment with `*/`"),
            start: start_pos,
        })
        .map(Token::BlockComment)
        .parse_next(input);
    if result.is_err() {
        let _ = input.finish();
    }
    result
}

/// Parse a `#` line, which Graphviz treats as preprocessor output.
fn preprocessor_line<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    preceded('#', take_while(0.., |c| c != '\n'))
        .map(Token::Preprocessor)
        .parse_next(input)
}

/// Parse edge operators
fn edge_operator<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        literal("->").value(Token::DirectedEdge),
        literal("--").value(Token::UndirectedEdge),
    ))
    .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        '='.value(Token::Equals),
        ';'.value(Token::Semicolon),
        ','.value(Token::Comma),
        ':'.value(Token::Colon),
        '+'.value(Token::Plus),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces, tabs, etc. but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        alt((line_comment, block_comment, preprocessor_line)),
        quoted_string,
        html_string,
        edge_operator, // Must come before numeral ("-1" vs "--")
        keyword,       // Must come before identifier
        numeral,       // Must come before identifier
        identifier,
        single_char_token,
        newline, // Must come before whitespace
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => {
                    self.tokens.push(token);
                }
                Err(e) => {
                    let error_pos = input.current_token_start();

                    let diagnostic = Self::convert_err_mode(e, error_pos);
                    self.diagnostics.emit(diagnostic);

                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    /// Finish lexing and return tokens or collected errors.
    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Falls back to E002 (unexpected character) when the error carries no
    /// [`LexerDiagnostic`] context.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos);

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Tokenize DOT source, collecting every lexical error.
///
/// # Returns
///
/// - `Ok(tokens)` - All tokens, trivia included
/// - `Err(ParseError)` - One or more errors occurred; contains all diagnostics
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let located_input = LocatingSlice::new(input);
    let mut lexer = Lexer::new();
    lexer.tokenize(located_input);
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_single_token(input: &str, expected: Token<'_>) {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to parse: {input}");
        assert_eq!(result.unwrap().token, expected);
    }

    fn significant(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !t.is_trivia())
            .collect()
    }

    #[test]
    fn test_keywords_case_insensitive() {
        test_single_token("digraph", Token::Digraph);
        test_single_token("DiGraph", Token::Digraph);
        test_single_token("GRAPH", Token::Graph);
        test_single_token("strict", Token::Strict);
        test_single_token("SubGraph", Token::Subgraph);
        test_single_token("node", Token::Node);
        test_single_token("Edge", Token::Edge);
    }

    #[test]
    fn test_keyword_word_boundary() {
        test_single_token("nodes", Token::Identifier("nodes"));
        test_single_token("graph_1", Token::Identifier("graph_1"));
        test_single_token("edgeé", Token::Identifier("edgeé"));
    }

    #[test]
    fn test_numerals() {
        test_single_token("42", Token::Numeral("42"));
        test_single_token("-1.5", Token::Numeral("-1.5"));
        test_single_token(".5", Token::Numeral(".5"));
        test_single_token("3.", Token::Numeral("3."));
    }

    #[test]
    fn test_numeral_followed_by_letters_is_an_error() {
        assert!(tokenize("2abc").is_err());
    }

    #[test]
    fn test_quoted_string_escapes() {
        test_single_token(r#""say \"hi\"""#, Token::QuotedString("say \"hi\"".into()));
        test_single_token(r#""a\nb""#, Token::QuotedString("a\\nb".into()));
        test_single_token("\"one \\\ntwo\"", Token::QuotedString("one two".into()));
        test_single_token("\"multi\nline\"", Token::QuotedString("multi\nline".into()));
    }

    #[test]
    fn test_html_string() {
        test_single_token(
            "<<b>bold</b> text>",
            Token::HtmlString("<<b>bold</b> text>"),
        );
    }

    #[test]
    fn test_edge_operators() {
        assert_eq!(
            significant("a->b--c"),
            vec![
                Token::Identifier("a"),
                Token::DirectedEdge,
                Token::Identifier("b"),
                Token::UndirectedEdge,
                Token::Identifier("c"),
            ]
        );
        assert_eq!(
            significant("a -- -1"),
            vec![
                Token::Identifier("a"),
                Token::UndirectedEdge,
                Token::Numeral("-1"),
            ]
        );
    }

    #[test]
    fn test_comments() {
        let tokens = significant("# line 1\na // tail\n/* block\n comment */ b");
        assert_eq!(tokens, vec![Token::Identifier("a"), Token::Identifier("b")]);
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("graph {}").unwrap();
        assert_eq!(tokens[0].span, Span::new(0..5));
        assert_eq!(tokens[2].span, Span::new(6..7));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("a = \"open").unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert_eq!(diag.labels()[0].span(), Span::new(4..9));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("a /* never closed").unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E004));
    }

    #[test]
    fn test_unterminated_html() {
        let err = tokenize("label = <<b>x</b>").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E003));
    }

    #[test]
    fn test_unexpected_characters_are_all_reported() {
        let err = tokenize("a ! b ? c").unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
        assert!(
            err.diagnostics()
                .iter()
                .all(|d| d.code() == Some(ErrorCode::E002))
        );
    }
}

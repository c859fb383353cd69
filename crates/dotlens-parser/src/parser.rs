//! Parser for DOT source tokens.
//!
//! This module transforms the significant tokens from the
//! [`lexer`](super::lexer) into the syntax tree defined in [`ast`](super::ast).
//! The public entry point is [`build_document`].

use winnow::{
    Parser as _,
    combinator::{alt, eof, opt, repeat, terminated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    ast::{AttrTarget, Attribute, Document, EdgeEndpoint, EdgeOp, Statement, SubgraphBlock},
    error::{Diagnostic, ErrorCode},
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    ///
    /// Used to calculate start_offset as: `tokens.len() - start_offset_value`
    StartOffset(usize),
}

type Input<'src> = DotTokenSlice<'src>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;
/// Type alias for winnow TokenSlice with our positioned tokens
type DotTokenSlice<'src> = TokenSlice<'src, PositionedToken<'src>>;

/// Run `f` and turn any failure into a cut error that remembers where the
/// committed construct started.
fn commit<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Match one token exactly, returning its span.
fn exact<'src>(input: &mut Input<'src>, expected: Token<'static>, label: &'static str) -> IResult<Span> {
    any.verify_map(|token: &PositionedToken<'_>| (token.token == expected).then_some(token.span))
        .context(Context::Label(label))
        .parse_next(input)
}

fn semicolon_or_comma<'src>(input: &mut Input<'src>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| {
        matches!(token.token, Token::Semicolon | Token::Comma)
    })
    .void()
    .parse_next(input)
}

/// Identifier, numeral or HTML string.
fn simple_id<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::Identifier(s) | Token::Numeral(s) | Token::HtmlString(s) => {
            Some(Spanned::new((*s).to_string(), token.span))
        }
        _ => None,
    })
    .parse_next(input)
}

fn quoted_string<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::QuotedString(s) => Some(Spanned::new(s.clone(), token.span)),
        _ => None,
    })
    .context(Context::Label("quoted string"))
    .parse_next(input)
}

/// A quoted string, possibly concatenated with `+`.
fn quoted_id<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    let mut value = quoted_string.parse_next(input)?;
    while opt(|i: &mut Input<'src>| exact(i, Token::Plus, "`+`"))
        .parse_next(input)?
        .is_some()
    {
        let next = commit(input, quoted_string)?;
        let span = value.span().union(next.span());
        value = Spanned::new(format!("{}{}", value.inner(), next.inner()), span);
    }
    Ok(value)
}

/// Parse a DOT ID
fn identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    alt((simple_id, quoted_id))
        .context(Context::Label("identifier"))
        .parse_next(input)
}

/// Parse `:port` or `:port:compass`, returned joined by `:`.
fn port<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    exact(input, Token::Colon, "`:`")?;
    let first = commit(input, identifier)?;
    match opt(|i: &mut Input<'src>| exact(i, Token::Colon, "`:`")).parse_next(input)? {
        Some(_) => {
            let compass = commit(input, identifier)?;
            let span = first.span().union(compass.span());
            Ok(Spanned::new(
                format!("{}:{}", first.inner(), compass.inner()),
                span,
            ))
        }
        None => Ok(first),
    }
}

/// Parse `name = value`
fn attribute<'src>(input: &mut Input<'src>) -> IResult<Attribute> {
    let name = identifier.parse_next(input)?;
    let value = commit(input, |i| {
        exact(i, Token::Equals, "`=`")?;
        identifier.parse_next(i)
    })?;
    Ok(Attribute::new(name, value))
}

/// Parse one bracketed `[ ... ]` block.
fn attribute_block<'src>(input: &mut Input<'src>) -> IResult<Vec<Attribute>> {
    exact(input, Token::LeftBracket, "`[`")?;
    commit(input, |i| {
        let attributes: Vec<Attribute> =
            repeat(0.., terminated(attribute, opt(semicolon_or_comma))).parse_next(i)?;
        exact(i, Token::RightBracket, "`]`")?;
        Ok(attributes)
    })
}

/// Parse one or more adjacent attribute blocks, flattened.
fn attribute_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Attribute>> {
    repeat(1.., attribute_block)
        .fold(Vec::new, |mut acc, block| {
            acc.extend(block);
            acc
        })
        .context(Context::Label("attribute list"))
        .parse_next(input)
}

fn edge_op<'src>(input: &mut Input<'src>) -> IResult<Spanned<EdgeOp>> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::DirectedEdge => Some(Spanned::new(EdgeOp::Directed, token.span)),
        Token::UndirectedEdge => Some(Spanned::new(EdgeOp::Undirected, token.span)),
        _ => None,
    })
    .context(Context::Label("edge operator"))
    .parse_next(input)
}

fn node_id<'src>(input: &mut Input<'src>) -> IResult<EdgeEndpoint> {
    let id = identifier.parse_next(input)?;
    let port = opt(port).parse_next(input)?;
    Ok(EdgeEndpoint::Node { id, port })
}

fn endpoint<'src>(input: &mut Input<'src>) -> IResult<EdgeEndpoint> {
    alt((subgraph_block.map(EdgeEndpoint::Subgraph), node_id))
        .context(Context::Label("edge endpoint"))
        .parse_next(input)
}

/// Parse the `-> b -> c` continuation of an edge statement.
fn edge_rhs<'src>(input: &mut Input<'src>) -> IResult<Vec<(Spanned<EdgeOp>, EdgeEndpoint)>> {
    repeat(0.., (edge_op, |i: &mut Input<'src>| commit(i, endpoint))).parse_next(input)
}

fn edge_statement<'src>(
    input: &mut Input<'src>,
    first: EdgeEndpoint,
    rhs: Vec<(Spanned<EdgeOp>, EdgeEndpoint)>,
) -> IResult<Statement> {
    let attributes = opt(attribute_list).parse_next(input)?.unwrap_or_default();
    let (operators, rest): (Vec<_>, Vec<_>) = rhs.into_iter().unzip();
    let mut endpoints = Vec::with_capacity(rest.len() + 1);
    endpoints.push(first);
    endpoints.extend(rest);
    Ok(Statement::Edge {
        endpoints,
        operators,
        attributes,
    })
}

/// Parse `[subgraph [ID]] { statements }`
fn subgraph_block<'src>(input: &mut Input<'src>) -> IResult<SubgraphBlock> {
    let keyword = opt(|i: &mut Input<'src>| exact(i, Token::Subgraph, "`subgraph`"))
        .parse_next(input)?;

    let (name, open) = match keyword {
        Some(_) => {
            let name = opt(identifier).parse_next(input)?;
            let open = commit(input, |i| exact(i, Token::LeftBrace, "`{`"))?;
            (name, open)
        }
        None => (None, exact(input, Token::LeftBrace, "`{`")?),
    };

    let statements = commit(input, statement_list)?;
    let close = commit(input, |i| exact(i, Token::RightBrace, "`}`"))?;

    Ok(SubgraphBlock {
        name,
        statements,
        span: keyword.unwrap_or(open).union(close),
    })
}

/// Parse `graph|node|edge [attrs]`
fn attr_statement<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    let target = any
        .verify_map(|token: &PositionedToken<'_>| match token.token {
            Token::Graph => Some(AttrTarget::Graph),
            Token::Node => Some(AttrTarget::Node),
            Token::Edge => Some(AttrTarget::Edge),
            _ => None,
        })
        .parse_next(input)?;
    let attributes = commit(input, attribute_list)?;
    Ok(Statement::Attr { target, attributes })
}

/// A subgraph, either standalone or the head of an edge chain.
fn subgraph_statement<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    let block = subgraph_block.parse_next(input)?;
    let rhs = edge_rhs.parse_next(input)?;
    if rhs.is_empty() {
        return Ok(Statement::Subgraph(block));
    }
    edge_statement(input, EdgeEndpoint::Subgraph(block), rhs)
}

/// A statement starting with an ID: assignment, node or edge.
fn id_statement<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    let name = identifier.parse_next(input)?;

    if opt(|i: &mut Input<'src>| exact(i, Token::Equals, "`=`"))
        .parse_next(input)?
        .is_some()
    {
        let value = commit(input, identifier)?;
        return Ok(Statement::Assign(Attribute::new(name, value)));
    }

    let port = opt(port).parse_next(input)?;
    let rhs = edge_rhs.parse_next(input)?;
    if rhs.is_empty() {
        let attributes = opt(attribute_list).parse_next(input)?.unwrap_or_default();
        return Ok(Statement::Node {
            id: name,
            port,
            attributes,
        });
    }
    edge_statement(input, EdgeEndpoint::Node { id: name, port }, rhs)
}

fn statement<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    alt((attr_statement, subgraph_statement, id_statement))
        .context(Context::Label("statement"))
        .parse_next(input)
}

fn statement_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Statement>> {
    repeat(
        0..,
        terminated(
            statement,
            opt(|i: &mut Input<'src>| exact(i, Token::Semicolon, "`;`")),
        ),
    )
    .parse_next(input)
}

/// Parse `[strict] (graph | digraph) [ID] { statements }`
fn document<'src>(input: &mut Input<'src>) -> IResult<Document> {
    let strict = opt(|i: &mut Input<'src>| exact(i, Token::Strict, "`strict`"))
        .parse_next(input)?
        .is_some();

    let directed = any
        .verify_map(|token: &PositionedToken<'_>| match token.token {
            Token::Graph => Some(Spanned::new(false, token.span)),
            Token::Digraph => Some(Spanned::new(true, token.span)),
            _ => None,
        })
        .context(Context::Label("`graph` or `digraph`"))
        .parse_next(input)?;

    let name = opt(identifier).parse_next(input)?;
    commit(input, |i| exact(i, Token::LeftBrace, "`{`"))?;
    let statements = commit(input, statement_list)?;
    commit(input, |i| exact(i, Token::RightBrace, "`}`"))?;
    commit(input, |i| {
        eof.void()
            .context(Context::Label("end of input"))
            .parse_next(i)
    })?;

    Ok(Document {
        strict,
        directed,
        name,
        statements,
    })
}

/// Convert a winnow error into a diagnostic.
///
/// `current_remaining` is the number of tokens left when the error was
/// raised; the error's [`Context::StartOffset`] marks where the construct
/// being parsed began and becomes a secondary label.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let end_offset = tokens.len() - current_remaining;
    let end_of_input = tokens
        .last()
        .map(|t| Span::new(t.span.end()..t.span.end()))
        .unwrap_or_default();

    match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => {
            let start_offset = e
                .context()
                .find_map(|ctx| match ctx {
                    Context::StartOffset(n) => Some(tokens.len() - n),
                    _ => None,
                })
                .unwrap_or(end_offset);

            let expected = e
                .context()
                .find_map(|ctx| match ctx {
                    Context::Label(label) => Some(format!("expected {label}")),
                    _ => None,
                })
                .unwrap_or_else(|| "unexpected token or end of input".to_string());

            let mut diagnostic = match tokens.get(end_offset) {
                Some(found) => Diagnostic::error(format!("unexpected `{}`: {expected}", found.token))
                    .with_code(ErrorCode::E100)
                    .with_label(found.span, "unexpected token"),
                None => Diagnostic::error(format!("unexpected end of input: {expected}"))
                    .with_code(ErrorCode::E101)
                    .with_label(end_of_input, "input ends here"),
            };

            if start_offset < end_offset {
                let context_span = tokens[start_offset].span.union(tokens[end_offset - 1].span);
                diagnostic = diagnostic.with_secondary_label(context_span, "while parsing this");
            }
            diagnostic.with_help("check the statement syntax near this position")
        }
        ErrMode::Incomplete(_) => {
            // Not reachable with complete token slices.
            Diagnostic::error("incomplete input, more tokens expected")
                .with_code(ErrorCode::E101)
                .with_label(end_of_input, "incomplete")
                .with_help("ensure input is complete")
        }
    }
}

/// Build a document from significant (non-trivia) tokens.
pub fn build_document<'src>(tokens: &'src [PositionedToken<'src>]) -> Result<Document, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    document.parse_next(&mut token_slice).map_err(|e| {
        let current_remaining = token_slice.eof_offset();
        convert_error(e, tokens, current_remaining)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn significant(input: &str) -> Vec<PositionedToken<'_>> {
        tokenize(input)
            .expect("Failed to tokenize input")
            .into_iter()
            .filter(|t| !t.token.is_trivia())
            .collect()
    }

    fn parse_ok(input: &str) -> Document {
        let tokens = significant(input);
        build_document(&tokens).expect("document should parse")
    }

    fn parse_err(input: &str) -> Diagnostic {
        let tokens = significant(input);
        build_document(&tokens).expect_err("document should not parse")
    }

    #[test]
    fn test_identifier_forms() {
        for (src, expected) in [
            ("abc", "abc"),
            ("-2.5", "-2.5"),
            ("\"hello world\"", "hello world"),
            ("\"con\" + \"cat\" + \"enated\"", "concatenated"),
            ("<<b>x</b>>", "<<b>x</b>>"),
        ] {
            let tokens = significant(src);
            let mut slice = TokenSlice::new(&tokens);
            let id = identifier.parse_next(&mut slice).unwrap();
            assert_eq!(id.inner(), expected);
        }
    }

    #[test]
    fn test_concatenation_span() {
        let tokens = significant("\"a\" + \"b\"");
        let mut slice = TokenSlice::new(&tokens);
        let id = identifier.parse_next(&mut slice).unwrap();
        assert_eq!(id.span(), Span::new(0..9));
    }

    #[test]
    fn test_empty_graph() {
        let doc = parse_ok("strict digraph G {}");
        assert!(doc.strict);
        assert!(*doc.directed.inner());
        assert_eq!(doc.name.unwrap().inner(), "G");
        assert!(doc.statements.is_empty());
    }

    #[test]
    fn test_anonymous_graph() {
        let doc = parse_ok("graph { a }");
        assert!(!doc.strict);
        assert!(!*doc.directed.inner());
        assert!(doc.name.is_none());
        assert_eq!(doc.statements.len(), 1);
    }

    #[test]
    fn test_node_statement_with_attributes() {
        let doc = parse_ok("digraph { a:p1:n [shape=box, color=red; label=\"A\"][style=filled] }");
        let Statement::Node {
            id,
            port,
            attributes,
        } = &doc.statements[0]
        else {
            panic!("expected node statement");
        };
        assert_eq!(id.inner(), "a");
        assert_eq!(port.as_ref().unwrap().inner(), "p1:n");
        let names: Vec<_> = attributes.iter().map(|a| a.name.inner().as_str()).collect();
        assert_eq!(names, ["shape", "color", "label", "style"]);
    }

    #[test]
    fn test_edge_chain() {
        let doc = parse_ok("digraph { a -> b -> c [color=blue] }");
        let Statement::Edge {
            endpoints,
            operators,
            attributes,
        } = &doc.statements[0]
        else {
            panic!("expected edge statement");
        };
        assert_eq!(endpoints.len(), 3);
        assert_eq!(operators.len(), 2);
        assert!(operators.iter().all(|op| *op.inner() == EdgeOp::Directed));
        assert_eq!(attributes.len(), 1);
    }

    #[test]
    fn test_subgraph_endpoints() {
        let doc = parse_ok("graph { {a b} -- subgraph s { c } -- d }");
        let Statement::Edge { endpoints, .. } = &doc.statements[0] else {
            panic!("expected edge statement");
        };
        assert!(matches!(&endpoints[0], EdgeEndpoint::Subgraph(b) if b.name.is_none()));
        assert!(
            matches!(&endpoints[1], EdgeEndpoint::Subgraph(b) if b.name.as_ref().unwrap().inner() == "s")
        );
        assert!(matches!(&endpoints[2], EdgeEndpoint::Node { .. }));
    }

    #[test]
    fn test_statement_kinds() {
        let doc = parse_ok(
            "digraph {
                rankdir = LR;
                node [shape=box]
                edge [arrowhead=none]
                graph [bgcolor=white]
                subgraph cluster_x { label = \"X\"; x }
            }",
        );
        assert!(matches!(doc.statements[0], Statement::Assign(_)));
        assert!(matches!(
            doc.statements[1],
            Statement::Attr {
                target: AttrTarget::Node,
                ..
            }
        ));
        assert!(matches!(
            doc.statements[2],
            Statement::Attr {
                target: AttrTarget::Edge,
                ..
            }
        ));
        assert!(matches!(
            doc.statements[3],
            Statement::Attr {
                target: AttrTarget::Graph,
                ..
            }
        ));
        let Statement::Subgraph(block) = &doc.statements[4] else {
            panic!("expected subgraph");
        };
        assert_eq!(block.statements.len(), 2);
    }

    #[test]
    fn test_missing_closing_brace() {
        let diag = parse_err("digraph { a -> b");
        assert_eq!(diag.code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_missing_attribute_value() {
        let diag = parse_err("digraph { a [color=] }");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert_eq!(diag.labels()[0].span(), Span::new(19..20));
    }

    #[test]
    fn test_dangling_edge_operator() {
        let diag = parse_err("digraph { a -> ; }");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert!(diag.message().contains("`;`"));
    }

    #[test]
    fn test_trailing_tokens() {
        let diag = parse_err("graph {} graph {}");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert_eq!(diag.labels()[0].span(), Span::new(9..14));
    }

    #[test]
    fn test_empty_input() {
        let diag = parse_err("");
        assert_eq!(diag.code(), Some(ErrorCode::E101));
    }
}

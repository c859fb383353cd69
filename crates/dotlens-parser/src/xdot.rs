//! Reader and writer for xdot drawing attributes.
//!
//! Graphviz's xdot output stores drawing instructions in the `_draw_`,
//! `_ldraw_`, `_hdraw_`, `_tdraw_`, `_hldraw_` and `_tldraw_` attributes as a
//! whitespace separated op stream, for example
//! `c 7 -#000000 e 27 18 27 18`. String operands are length-prefixed with a
//! byte count: `n -bytes`.
//!
//! Decimal operands are rounded to the nearest integer.

use std::fmt::Write as _;

use thiserror::Error;
use winnow::{
    Parser as _,
    ascii::{dec_uint, float, multispace0},
    combinator::{cut_err, preceded, repeat},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::any,
};

use dotlens_core::render_op::{RenderOp, RenderOpKind};

use crate::error::{Diagnostic, ErrorCode};
use crate::span::Span;

/// An error in an xdot op stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct XdotError {
    code: ErrorCode,
    message: &'static str,
    offset: usize,
}

impl XdotError {
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        self.message
    }

    /// Byte offset of the error inside the op stream.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// A diagnostic pointing at the attribute value the stream came from.
    pub fn to_diagnostic(&self, value_span: Span) -> Diagnostic {
        Diagnostic::error(format!("invalid drawing attribute: {}", self.message))
            .with_code(self.code)
            .with_label(value_span, self.code.description())
            .with_help(format!("the error is at byte {} of the value", self.offset))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct XdotContext {
    code: ErrorCode,
    message: &'static str,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<XdotContext>>;

fn cut_with(input: &Input<'_>, code: ErrorCode, message: &'static str) -> ErrMode<ContextError<XdotContext>> {
    ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        XdotContext { code, message },
    ))
}

/// A decimal operand rounded to `i32`.
fn number(input: &mut Input<'_>) -> IResult<i32> {
    preceded(multispace0, float)
        .map(|value: f64| value.round() as i32)
        .parse_next(input)
}

/// A point count followed by that many coordinate pairs.
fn point_list(input: &mut Input<'_>) -> IResult<Vec<i32>> {
    let count: usize = preceded(multispace0, dec_uint).parse_next(input)?;
    // Every coordinate needs at least one digit and one separator.
    if count.saturating_mul(4) > input.peek_finish().len() + 1 {
        return Err(cut_with(input, ErrorCode::E301, "point count exceeds the operands present"));
    }
    let coords: Vec<i32> = repeat(count * 2, number).parse_next(input)?;

    let mut integers = Vec::with_capacity(coords.len() + 1);
    integers.push(count as i32);
    integers.extend(coords);
    Ok(integers)
}

/// A length-prefixed string operand: `n -bytes`.
fn byte_string<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    let len: usize = preceded(multispace0, dec_uint).parse_next(input)?;
    (multispace0, '-').parse_next(input)?;

    let rest = input.peek_finish();
    if len > rest.len() || !rest.is_char_boundary(len) {
        return Err(cut_with(input, ErrorCode::E302, "string length does not match its content"));
    }
    Ok(input.next_slice(len))
}

fn numbers(input: &mut Input<'_>, count: usize) -> IResult<Vec<i32>> {
    repeat(count, number).parse_next(input)
}

fn operands(input: &mut Input<'_>, kind: RenderOpKind) -> IResult<RenderOp> {
    use RenderOpKind as K;

    let op = match kind {
        K::FilledEllipse | K::UnfilledEllipse => RenderOp::new(kind, numbers(input, 4)?),
        K::FilledPolygon | K::UnfilledPolygon | K::Polyline | K::FilledBezier | K::UnfilledBezier => {
            RenderOp::new(kind, point_list(input)?)
        }
        K::Text => {
            let integers = numbers(input, 4)?;
            RenderOp::with_text(kind, integers, byte_string(input)?)
        }
        K::FillColor | K::PenColor | K::Style => RenderOp::with_text(kind, Vec::new(), byte_string(input)?),
        K::Font => {
            let size = number(input)?;
            RenderOp::with_text(kind, vec![size], byte_string(input)?)
        }
        K::Image => {
            let integers = numbers(input, 4)?;
            RenderOp::with_text(kind, integers, byte_string(input)?)
        }
        K::FontCharacteristics => RenderOp::new(kind, vec![number(input)?]),
    };
    Ok(op)
}

fn render_op(input: &mut Input<'_>) -> IResult<RenderOp> {
    let code: char = any.parse_next(input)?;
    let Some(kind) = RenderOpKind::from_code(code) else {
        return Err(cut_with(input, ErrorCode::E300, "unknown op code"));
    };
    cut_err(|i: &mut Input<'_>| operands(i, kind))
        .context(XdotContext {
            code: ErrorCode::E301,
            message: "missing or malformed operand",
        })
        .parse_next(input)
}

/// Parse an xdot op stream into render operations.
///
/// An empty or whitespace-only stream yields no ops.
pub fn parse_render_ops(source: &str) -> Result<Vec<RenderOp>, XdotError> {
    let mut input = LocatingSlice::new(source);
    let mut ops = Vec::new();

    loop {
        let _ = multispace0::<_, ContextError<XdotContext>>.parse_next(&mut input);
        if input.is_empty() {
            return Ok(ops);
        }
        match render_op(&mut input) {
            Ok(op) => ops.push(op),
            Err(err) => {
                let context = match err {
                    ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().next().cloned(),
                    ErrMode::Incomplete(_) => None,
                };
                let context = context.unwrap_or(XdotContext {
                    code: ErrorCode::E301,
                    message: "missing or malformed operand",
                });
                return Err(XdotError {
                    code: context.code,
                    message: context.message,
                    offset: input.current_token_start(),
                });
            }
        }
    }
}

/// Write render operations as an xdot op stream.
///
/// The output parses back into the same ops with [`parse_render_ops`].
pub fn write_render_ops(ops: &[RenderOp]) -> String {
    let mut out = String::new();
    for op in ops {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push(op.kind().code());
        for value in op.integers() {
            let _ = write!(out, " {value}");
        }
        if let Some(text) = op.text() {
            let _ = write!(out, " {} -{text}", text.len());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_draw_attribute() {
        let ops = parse_render_ops("c 7 -#000000 e 27 18 27 18").unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind(), RenderOpKind::PenColor);
        assert_eq!(ops[0].text(), Some("#000000"));
        assert_eq!(ops[1].kind(), RenderOpKind::UnfilledEllipse);
        assert_eq!(ops[1].integers(), &[27, 18, 27, 18]);
    }

    #[test]
    fn test_decimals_are_rounded() {
        let ops = parse_render_ops("E 27.4 -18.6 1e1 0.5").unwrap();
        assert_eq!(ops[0].integers(), &[27, -19, 10, 1]);
    }

    #[test]
    fn test_text_and_font() {
        let ops = parse_render_ops("F 14 11 -Times-Roman c 7 -#000000 T 27 14.3 0 7 1 -a").unwrap();
        assert_eq!(ops[0].kind(), RenderOpKind::Font);
        assert_eq!(ops[0].integers(), &[14]);
        assert_eq!(ops[0].text(), Some("Times-Roman"));
        assert_eq!(ops[2].integers(), &[27, 14, 0, 7]);
        assert_eq!(ops[2].text(), Some("a"));
    }

    #[test]
    fn test_string_length_counts_bytes() {
        let ops = parse_render_ops("T 0 0 0 10 6 -héllo S 6 -filled").unwrap();
        assert_eq!(ops[0].text(), Some("héllo"));
        assert_eq!(ops[1].text(), Some("filled"));
        assert!(parse_render_ops("T 0 0 0 10 2 -é").is_ok());
        let err = parse_render_ops("T 0 0 0 10 1 -é").unwrap_err();
        assert_eq!(err.code(), ErrorCode::E302);
    }

    #[test]
    fn test_strings_may_contain_spaces() {
        let ops = parse_render_ops("T 1 2 -1 30 11 -hello world").unwrap();
        assert_eq!(ops[0].text(), Some("hello world"));
        assert_eq!(ops[0].integer(2), -1);
    }

    #[test]
    fn test_bezier_point_list() {
        let ops = parse_render_ops("B 4 27 72 27 60 27 48 27 36").unwrap();
        assert_eq!(ops[0].kind(), RenderOpKind::UnfilledBezier);
        assert_eq!(ops[0].points().len(), 4);
        assert_eq!(ops[0].points()[3], (27, 36));
    }

    #[test]
    fn test_empty_stream() {
        assert!(parse_render_ops("").unwrap().is_empty());
        assert!(parse_render_ops("  \n ").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_op() {
        let err = parse_render_ops("e 1 2 3 4 Q 5").unwrap_err();
        assert_eq!(err.code(), ErrorCode::E300);
        assert_eq!(err.offset(), 11);
    }

    #[test]
    fn test_missing_operand() {
        let err = parse_render_ops("e 1 2 3").unwrap_err();
        assert_eq!(err.code(), ErrorCode::E301);
    }

    #[test]
    fn test_point_count_too_large() {
        let err = parse_render_ops("P 1000000000 0 0").unwrap_err();
        assert_eq!(err.code(), ErrorCode::E301);
    }

    #[test]
    fn test_writer_output_parses_back() {
        let source = "C 5 -white P 3 0 0 10 0 5 8 F 14 11 -Times-Roman T 5 3 0 7 1 -x";
        let ops = parse_render_ops(source).unwrap();
        assert_eq!(write_render_ops(&ops), source);
        assert_eq!(parse_render_ops(&write_render_ops(&ops)).unwrap(), ops);
    }
}

// Parser for VHDL integer constant expressions.
//
// Parses the token stream of an assigned value (the text between `:=` and
// `;`) into an `Expr`. Uses chumsky combinators. Precedence follows VHDL:
// `**` binds tightest, then `* / mod rem`, then a leading sign, then `+ -`.
//
// Preconditions: input is a value fragment, not a whole declaration line.
// Postconditions: returns an expression plus any lex/parse errors.
// Failure modes: syntax errors produce `Rich` diagnostics.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::ast::{BinOp, Expr, ExprKind};
use crate::lexer::Token;

/// Result of parsing: expression plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub expr: Option<Expr>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

/// Parse a value fragment. Lexes then parses.
pub fn parse_expr(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = expr_parser(source).then_ignore(end());
    let (expr, parse_errors) = parser.parse(stream).into_output_errors();

    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    // A lex error drops the offending token, so a successful parse of the
    // remainder must not be mistaken for the value the user wrote.
    let expr = if all_errors.is_empty() { expr } else { None };

    ParseResult {
        expr,
        errors: all_errors,
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    let span: SimpleSpan = (lhs.span.start()..rhs.span.end()).into();
    Expr {
        kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
        span,
    }
}

fn expr_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    recursive(move |expr| {
        // ── Primary ──

        let literal = select! {
            Token::Integer(v) => ExprKind::Int(v),
            Token::Based(v) => ExprKind::Int(v),
        }
        .map_with(|kind, e| Expr {
            kind,
            span: e.span(),
        });

        let reference = just(Token::Ident).map_with(move |_, e| {
            let span: SimpleSpan = e.span();
            Expr {
                kind: ExprKind::Ref(source[span.start()..span.end()].to_string()),
                span,
            }
        });

        let atom = literal
            .or(reference)
            .or(expr.delimited_by(just(Token::LParen), just(Token::RParen)));

        // ── factor: primary ('**' primary)? ──

        let factor = atom
            .clone()
            .then(just(Token::Pow).ignore_then(atom).or_not())
            .map_with(|(base, exponent), e| match exponent {
                Some(exponent) => Expr {
                    kind: ExprKind::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)),
                    span: e.span(),
                },
                None => base,
            });

        // ── term: factor (mul_op factor)* ──

        let mul_op = select! {
            Token::Star => BinOp::Mul,
            Token::Slash => BinOp::Div,
            Token::Mod => BinOp::Mod,
            Token::Rem => BinOp::Rem,
        };
        let term = factor
            .clone()
            .foldl(mul_op.then(factor).repeated(), |lhs, (op, rhs)| {
                binary(op, lhs, rhs)
            });

        // ── simple_expression: sign? term (add_op term)* ──

        let sign = select! {
            Token::Minus => true,
            Token::Plus => false,
        };
        let signed_term = sign
            .or_not()
            .then(term.clone())
            .map_with(|(sign, term), e| match sign {
                Some(true) => Expr {
                    kind: ExprKind::Neg(Box::new(term)),
                    span: e.span(),
                },
                _ => term,
            });

        let add_op = select! {
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
        };
        signed_term.foldl(add_op.then(term).repeated(), |lhs, (op, rhs)| {
            binary(op, lhs, rhs)
        })
    })
}

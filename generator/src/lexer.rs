// Lexer for VHDL constant declarations.
//
// Tokenizes the fragments of a declaration line that the parameter reader
// inspects: the declaration side (to recover the declared name) and the
// assigned integer expression. Uses the `logos` crate for DFA-based lexing.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns all tokens with byte-offset spans, plus any lex errors.
// Failure modes: unrecognized characters and out-of-range literals produce
//                `LexError`; lexing continues.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A lexer error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// VHDL token types relevant to integer constant declarations.
///
/// Identifiers carry no value; use the span to retrieve the text from the
/// source. Keywords are matched case-insensitively, as VHDL requires.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\x0C]+|--[^\n]*")]
pub enum Token {
    // ── Keywords ──
    #[token("mod", ignore(ascii_case))]
    Mod,
    #[token("rem", ignore(ascii_case))]
    Rem,

    // ── Symbols ──
    #[token(":=")]
    Assign,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("**")]
    Pow,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // ── Literals ──
    //
    // Based literals must appear before Integer so `16#FF#` is not split
    // into `16` followed by an unrecognized `#`.
    /// Based literal (e.g. `16#FF#`, `2#1010_0101#`).
    #[regex(r"[0-9]+#[0-9a-zA-Z](_?[0-9a-zA-Z])*#", parse_based)]
    Based(u64),

    /// Decimal literal with optional `_` separators (e.g. `1_024`).
    #[regex(r"[0-9](_?[0-9])*", parse_decimal)]
    Integer(u64),

    // ── Identifier ──
    /// Identifier: `[a-zA-Z][a-zA-Z0-9_]*`
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Mod => write!(f, "mod"),
            Token::Rem => write!(f, "rem"),
            Token::Assign => write!(f, ":="),
            Token::Colon => write!(f, ":"),
            Token::Semi => write!(f, ";"),
            Token::Pow => write!(f, "**"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Based(v) | Token::Integer(v) => write!(f, "{v}"),
            Token::Ident => write!(f, "<ident>"),
        }
    }
}

// ── Callbacks ──

fn parse_decimal(lex: &mut logos::Lexer<'_, Token>) -> Option<u64> {
    let digits: String = lex.slice().chars().filter(|&c| c != '_').collect();
    digits.parse().ok()
}

fn parse_based(lex: &mut logos::Lexer<'_, Token>) -> Option<u64> {
    let slice = lex.slice();
    let (base_str, rest) = slice.split_once('#')?;
    let base: u32 = base_str.parse().ok()?;
    if !(2..=16).contains(&base) {
        return None;
    }
    let digits: String = rest
        .trim_end_matches('#')
        .chars()
        .filter(|&c| c != '_')
        .collect();
    u64::from_str_radix(&digits, base).ok()
}

// ── Public API ──

/// Lex a declaration fragment into tokens.
///
/// Returns all successfully lexed tokens together with any errors for
/// unrecognised characters or literals that do not fit in 64 bits. Lexing is
/// non-fatal: errors are collected and the lexer continues past them.
pub fn lex(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => errors.push(LexError {
                span,
                message: format!("unexpected input: {:?}", &source[span.start..span.end]),
            }),
        }
    }

    LexResult { tokens, errors }
}

/// Recover the declared name from the declaration side of a line.
///
/// The name is the last identifier before the first `:`, which covers both
/// `constant NAME : integer` and generic-style `NAME : natural`. Returns
/// `None` when the declaration has no such identifier.
pub fn declared_name(declaration: &str) -> Option<&str> {
    let result = lex(declaration);
    let mut name = None;
    for (token, span) in &result.tokens {
        match token {
            Token::Ident => name = Some(&declaration[span.start..span.end]),
            Token::Colon => break,
            _ => {}
        }
    }
    name
}

// ── Tests ──

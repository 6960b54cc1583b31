// AST node types for VHDL integer constant expressions.
//
// The parameter reader accepts the subset of VHDL static expressions that
// hardware packages use to size their constants: literals, references to
// earlier constants, unary sign, `+ - * / mod rem **`, and parentheses.
//
// Preconditions: produced by the parser from a token stream.
// Postconditions: each node's span covers its source range within the value text.
// Failure modes: evaluation fails on overflow, division by zero, negative
//                exponents, and unknown constant references.
// Side effects: none.

use std::collections::HashMap;
use std::fmt;

use chumsky::span::SimpleSpan;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

/// Binary operators, in VHDL spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Rem,
    Pow,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "mod",
            BinOp::Rem => "rem",
            BinOp::Pow => "**",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(u64),
    Ref(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

/// An integer constant expression with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Integer constants visible to an expression, keyed by upper-cased name
/// (VHDL identifiers are case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct Env {
    values: HashMap<String, i64>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: i64) {
        self.values.insert(name.to_ascii_uppercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(&name.to_ascii_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Why an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    UnknownConstant { name: String, span: Span },
    Overflow { op: BinOp, span: Span },
    DivisionByZero { span: Span },
    NegativeExponent { span: Span },
}

impl ExprError {
    pub fn span(&self) -> Span {
        match self {
            ExprError::UnknownConstant { span, .. }
            | ExprError::Overflow { span, .. }
            | ExprError::DivisionByZero { span }
            | ExprError::NegativeExponent { span } => *span,
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::UnknownConstant { name, .. } => {
                write!(f, "reference to unknown integer constant '{}'", name)
            }
            ExprError::Overflow { op, .. } => {
                write!(f, "integer overflow evaluating '{}'", op)
            }
            ExprError::DivisionByZero { .. } => write!(f, "division by zero"),
            ExprError::NegativeExponent { .. } => {
                write!(f, "exponent of '**' must not be negative")
            }
        }
    }
}

impl std::error::Error for ExprError {}

impl Expr {
    /// Evaluate with 64-bit checked arithmetic and VHDL operator semantics:
    /// `/` and `rem` truncate toward zero, `mod` takes the sign of the
    /// right operand.
    pub fn eval(&self, env: &Env) -> Result<i64, ExprError> {
        match &self.kind {
            ExprKind::Int(v) => i64::try_from(*v).map_err(|_| ExprError::Overflow {
                op: BinOp::Add,
                span: self.span,
            }),
            ExprKind::Ref(name) => env.get(name).ok_or_else(|| ExprError::UnknownConstant {
                name: name.clone(),
                span: self.span,
            }),
            ExprKind::Neg(inner) => {
                let v = inner.eval(env)?;
                v.checked_neg().ok_or(ExprError::Overflow {
                    op: BinOp::Sub,
                    span: self.span,
                })
            }
            ExprKind::Binary(op, lhs, rhs) => {
                let l = lhs.eval(env)?;
                let r = rhs.eval(env)?;
                apply(*op, l, r, self.span)
            }
        }
    }
}

fn apply(op: BinOp, l: i64, r: i64, span: Span) -> Result<i64, ExprError> {
    let overflow = ExprError::Overflow { op, span };
    match op {
        BinOp::Add => l.checked_add(r).ok_or(overflow),
        BinOp::Sub => l.checked_sub(r).ok_or(overflow),
        BinOp::Mul => l.checked_mul(r).ok_or(overflow),
        BinOp::Div | BinOp::Rem | BinOp::Mod if r == 0 => {
            Err(ExprError::DivisionByZero { span })
        }
        BinOp::Div => l.checked_div(r).ok_or(overflow),
        BinOp::Rem => l.checked_rem(r).ok_or(overflow),
        BinOp::Mod => {
            let rem = l.checked_rem(r).ok_or(overflow)?;
            if rem != 0 && (rem < 0) != (r < 0) {
                Ok(rem + r)
            } else {
                Ok(rem)
            }
        }
        BinOp::Pow => {
            if r < 0 {
                return Err(ExprError::NegativeExponent { span });
            }
            let exp = u32::try_from(r).map_err(|_| overflow.clone())?;
            l.checked_pow(exp).ok_or(overflow)
        }
    }
}

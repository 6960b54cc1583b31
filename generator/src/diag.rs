// diag.rs — Unified diagnostics model
//
// Provides the shared diagnostic types used across all generator passes.
// Locations are 1-based line numbers in the parameter source; diagnostics
// raised after reading (validation, quantization) carry no line.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0101`, `W0301`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // E01xx: reading the parameter source
    pub const E0101: DiagCode = DiagCode("E0101"); // malformed parameter value
    pub const W0101: DiagCode = DiagCode("W0101"); // parameter bound more than once

    // E02xx: parameter validation
    pub const E0201: DiagCode = DiagCode("E0201"); // missing parameter
    pub const E0202: DiagCode = DiagCode("E0202"); // DSP count not even
    pub const E0203: DiagCode = DiagCode("E0203"); // DFT size not divisible by DSP count
    pub const E0204: DiagCode = DiagCode("E0204"); // non-positive or negative value
    pub const E0205: DiagCode = DiagCode("E0205"); // value outside supported range

    // E03xx: quantization
    pub const E0301: DiagCode = DiagCode("E0301"); // twiddle component out of range
    pub const W0301: DiagCode = DiagCode("W0301"); // twiddle components wrapped
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Related line ─────────────────────────────────────────────────────────

/// A secondary source location providing context for a diagnostic.
#[derive(Debug, Clone)]
pub struct RelatedLine {
    pub line: usize,
    pub label: String,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic emitted by any pass.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub line: Option<usize>,
    pub message: String,
    pub hint: Option<String>,
    pub related: Vec<RelatedLine>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, location, hint, or related lines.
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            line: None,
            message: message.into(),
            hint: None,
            related: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, message)
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the 1-based source line the diagnostic points at.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a related line.
    pub fn with_related(mut self, line: usize, label: impl Into<String>) -> Self {
        self.related.push(RelatedLine {
            line,
            label: label.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: ", level, code)?;
        } else {
            write!(f, "{}: ", level)?;
        }
        if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }
        write!(f, "{}", self.message)?;
        for related in &self.related {
            write!(f, "\n  note: line {}: {}", related.line, related.label)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

/// True if any diagnostic in the slice is an error.
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(Diagnostic::is_error)
}

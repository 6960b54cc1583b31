// reader.rs — Hardware parameter reader
//
// Extracts the twiddle generator's parameters from a VHDL constants package
// by scanning declaration lines at the text level. No VHDL parsing beyond
// the assigned value. A line is of interest when it contains both `:=` and
// `;`, and it binds a parameter when its declaration side contains one of
// the recognized markers.
//
// Preconditions: input is valid UTF-8.
// Postconditions: every marker found is bound to its last evaluated value.
// Failure modes: a marker line with an unreadable value produces E0101;
//                missing markers are not reported here (see `config`).
// Side effects: none.

use std::fmt;

use crate::ast::Env;
use crate::diag::{codes, Diagnostic};
use crate::lexer::declared_name;
use crate::parser::parse_expr;

// ── Markers ─────────────────────────────────────────────────────────────────

/// Declaration-name markers the reader recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Fractional bits of the fixed-point format.
    TwPres,
    /// Base-2 logarithm of the DSP count.
    DftLgDsps,
    /// DFT transform size.
    DftSize,
}

impl Marker {
    pub const ALL: [Marker; 3] = [Marker::TwPres, Marker::DftLgDsps, Marker::DftSize];

    /// The substring searched for in a declaration.
    pub fn name(self) -> &'static str {
        match self {
            Marker::TwPres => "TW_PRES",
            Marker::DftLgDsps => "DFT_LG_DSPS",
            Marker::DftSize => "DFT_SIZE",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Data types ──────────────────────────────────────────────────────────────

/// A marker's value and the 1-based line it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub value: i64,
    pub line: usize,
}

/// Parameters as read, before validation. `None` means the marker never
/// appeared (or only appeared with an unreadable value).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    pub tw_pres: Option<Binding>,
    pub dft_lg_dsps: Option<Binding>,
    pub dft_size: Option<Binding>,
}

impl RawParams {
    pub fn get(&self, marker: Marker) -> Option<Binding> {
        match marker {
            Marker::TwPres => self.tw_pres,
            Marker::DftLgDsps => self.dft_lg_dsps,
            Marker::DftSize => self.dft_size,
        }
    }

    fn slot_mut(&mut self, marker: Marker) -> &mut Option<Binding> {
        match marker {
            Marker::TwPres => &mut self.tw_pres,
            Marker::DftLgDsps => &mut self.dft_lg_dsps,
            Marker::DftSize => &mut self.dft_size,
        }
    }
}

/// Result of reading: raw parameters, the number of integer constants
/// evaluated along the way, and any diagnostics.
#[derive(Debug)]
pub struct ReadResult {
    pub raw: RawParams,
    pub constants: usize,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Scanner ─────────────────────────────────────────────────────────────────

/// Scan a declaration source for the generator's parameters.
///
/// Every declaration whose value evaluates is recorded so that later
/// declarations can refer to it (`DFT_SIZE := 2**DFT_LG_SIZE;`). A marker
/// bound twice keeps the later value and produces a W0101 warning.
pub fn read_parameters(source: &str) -> ReadResult {
    let mut raw = RawParams::default();
    let mut env = Env::new();
    let mut diagnostics = Vec::new();

    for (idx, full_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(full_line);
        if !(line.contains(":=") && line.contains(';')) {
            continue;
        }
        let Some((declaration, assignment)) = line.split_once(":=") else {
            continue;
        };
        let value_text = assignment.split(';').next().unwrap_or_default();

        let markers: Vec<Marker> = Marker::ALL
            .into_iter()
            .filter(|m| declaration.contains(m.name()))
            .collect();

        let value = match evaluate(value_text, &env) {
            Ok(v) => v,
            Err(message) => {
                for marker in &markers {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "cannot read value of {}: {}",
                            marker, message
                        ))
                        .with_code(codes::E0101)
                        .at_line(line_no)
                        .with_hint("expected an integer constant expression"),
                    );
                }
                continue;
            }
        };

        if let Some(name) = declared_name(declaration) {
            env.insert(name, value);
        }

        for marker in markers {
            let slot = raw.slot_mut(marker);
            if let Some(previous) = *slot {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "{} bound more than once; using the value {} from this line",
                        marker, value
                    ))
                    .with_code(codes::W0101)
                    .at_line(line_no)
                    .with_related(
                        previous.line,
                        format!("earlier binding to {} ignored", previous.value),
                    ),
                );
            }
            *slot = Some(Binding {
                value,
                line: line_no,
            });
        }
    }

    ReadResult {
        raw,
        constants: env.len(),
        diagnostics,
    }
}

/// Lex, parse and evaluate a value fragment, flattening failures into one message.
fn evaluate(value_text: &str, env: &Env) -> Result<i64, String> {
    let parsed = parse_expr(value_text);
    if let Some(first) = parsed.errors.first() {
        return Err(format!("'{}': {}", value_text.trim(), first));
    }
    let Some(expr) = parsed.expr else {
        return Err(format!("'{}': not an expression", value_text.trim()));
    };
    expr.eval(env)
        .map_err(|e| format!("'{}': {}", value_text.trim(), e))
}

/// Strip a VHDL `--` comment from one line, leaving string and character
/// literals intact.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            // Character literal such as '"' or '-'. An attribute tick
            // (`T'HIGH`) never has a closing quote two bytes on.
            b'\'' if !in_string && bytes.get(i + 2) == Some(&b'\'') => {
                i += 3;
                continue;
            }
            b'"' => in_string = !in_string,
            b'-' if !in_string && bytes.get(i + 1) == Some(&b'-') => return &line[..i],
            _ => {}
        }
        i += 1;
    }
    line
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::DiagLevel;

    const PACKAGE: &str = "\
library ieee;
use ieee.std_logic_1164.all;

package constants is
  constant TW_PRES     : integer := 7;
  constant DFT_LG_DSPS : integer := 1;
  constant DFT_SIZE    : integer := 8;
  constant TWLEN       : integer := 16;
end constants;
";

    #[test]
    fn reads_all_three_markers() {
        let result = read_parameters(PACKAGE);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.raw.tw_pres, Some(Binding { value: 7, line: 5 }));
        assert_eq!(result.raw.dft_lg_dsps, Some(Binding { value: 1, line: 6 }));
        assert_eq!(result.raw.dft_size, Some(Binding { value: 8, line: 7 }));
        assert_eq!(result.constants, 4);
    }

    #[test]
    fn missing_marker_is_none_not_error() {
        let result = read_parameters("constant TW_PRES : integer := 3;\n");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.raw.get(Marker::TwPres).map(|b| b.value), Some(3));
        assert_eq!(result.raw.get(Marker::DftSize), None);
        assert_eq!(result.raw.get(Marker::DftLgDsps), None);
    }

    #[test]
    fn line_without_terminator_is_ignored() {
        let result = read_parameters("constant DFT_SIZE : integer := 8\n");
        assert_eq!(result.raw.dft_size, None);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn value_is_trimmed_at_first_terminator() {
        let result = read_parameters("constant DFT_SIZE : integer := 16; -- sixteen;\n");
        assert_eq!(result.raw.dft_size.map(|b| b.value), Some(16));
    }

    #[test]
    fn commented_out_declaration_is_ignored() {
        let source = "-- constant DFT_SIZE : integer := 64;\nconstant DFT_SIZE : integer := 8;\n";
        let result = read_parameters(source);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.raw.dft_size, Some(Binding { value: 8, line: 2 }));
    }

    #[test]
    fn expression_referencing_earlier_constant() {
        let source = "\
constant DFT_LG_SIZE : integer := 5;
constant DFT_SIZE    : integer := 2**DFT_LG_SIZE;
constant TW_PRES     : integer := DFT_LG_SIZE + 1;
";
        let result = read_parameters(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.raw.dft_size.map(|b| b.value), Some(32));
        assert_eq!(result.raw.tw_pres.map(|b| b.value), Some(6));
    }

    #[test]
    fn malformed_marker_value_is_error() {
        let result = read_parameters("constant TW_PRES : integer := seven;\n");
        assert_eq!(result.raw.tw_pres, None);
        assert_eq!(result.diagnostics.len(), 1);
        let d = &result.diagnostics[0];
        assert_eq!(d.level, DiagLevel::Error);
        assert_eq!(d.code, Some(codes::E0101));
        assert_eq!(d.line, Some(1));
        assert!(d.message.contains("TW_PRES"), "{}", d.message);
        assert!(d.message.contains("seven"), "{}", d.message);
    }

    #[test]
    fn malformed_non_marker_value_is_ignored() {
        let source = "\
constant RESET_VALUE : std_logic_vector(3 downto 0) := \"0101\";
constant DFT_SIZE : integer := 8;
";
        let result = read_parameters(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.raw.dft_size.map(|b| b.value), Some(8));
    }

    #[test]
    fn duplicate_marker_last_wins_with_warning() {
        let source = "\
constant DFT_SIZE : integer := 8;
constant DFT_SIZE : integer := 16;
";
        let result = read_parameters(source);
        assert_eq!(result.raw.dft_size, Some(Binding { value: 16, line: 2 }));
        assert_eq!(result.diagnostics.len(), 1);
        let d = &result.diagnostics[0];
        assert_eq!(d.level, DiagLevel::Warning);
        assert_eq!(d.code, Some(codes::W0101));
        assert_eq!(d.line, Some(2));
        assert_eq!(d.related[0].line, 1);
    }

    #[test]
    fn marker_is_a_substring_match() {
        let result = read_parameters("  generic_DFT_SIZE_g : natural := 32;\n");
        assert_eq!(result.raw.dft_size.map(|b| b.value), Some(32));
    }

    #[test]
    fn division_by_zero_in_marker_value() {
        let result = read_parameters("constant DFT_SIZE : integer := 8 / 0;\n");
        assert_eq!(result.raw.dft_size, None);
        assert!(result.diagnostics[0].message.contains("division by zero"));
    }

    #[test]
    fn strip_comment_respects_strings() {
        assert_eq!(strip_comment("x := \"--\"; -- c"), "x := \"--\"; ");
        assert_eq!(strip_comment("-- all comment"), "");
        assert_eq!(strip_comment("no comment"), "no comment");
    }

    #[test]
    fn strip_comment_skips_character_literals() {
        assert_eq!(strip_comment("c := '\"'; -- x"), "c := '\"'; ");
        assert_eq!(strip_comment("d := '-'; -- x"), "d := '-'; ");
        assert_eq!(strip_comment("q := '\"' & \"--\"; -- x"), "q := '\"' & \"--\"; ");
        assert_eq!(strip_comment("h := T'HIGH; -- x"), "h := T'HIGH; ");
    }

    #[test]
    fn quote_character_literal_does_not_hide_next_comment() {
        let src = "\
q <= '\"'; -- constant DFT_SIZE : integer := 99;
constant TW_PRES : integer := 6;
constant DFT_LG_DSPS : integer := 1;
constant DFT_SIZE : integer := 8;
";
        let result = read_parameters(src);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.raw.dft_size.map(|b| b.value), Some(8));
        assert_eq!(result.raw.dft_size.map(|b| b.line), Some(4));
    }
}

// emit.rs — VHDL generation for the twiddle package
//
// Walks the pipeline's consumption order (DSP pair → operation → sample),
// looks up each twiddle, quantizes it, and serializes the nested array as a
// VHDL package. Element `b` of operation `a` in pair `c` is the twiddle for
// `k = a · dsp_pairs + c`, `n = b`.
//
// Preconditions: `params` validated; `table` built for `params.transform_size`.
// Postconditions: on success, `generated.vhdl_source` holds the whole package.
// Failure modes: E0301 when a component overflows under `OverflowPolicy::Error`;
//                an uncoded error when `table` was built for another size.
// Side effects: none.

use std::fmt::Write as _;

use crate::config::HardwareParams;
use crate::diag::{codes, Diagnostic};
use crate::fixed::{FixedTwiddle, OverflowPolicy, QuantizeError, COMPONENT_BITS, TWIDDLE_BITS};
use crate::twiddle::{TableKeying, TwiddleTable};

/// Elements per line in the array literal.
const ELEMENTS_PER_LINE: usize = 4;

// ── Public types ────────────────────────────────────────────────────────────

/// How the array types are sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeSizing {
    /// Numeric bounds computed from the parameters.
    #[default]
    Literal,
    /// Bounds written against `PERDSP`, `DFT_SIZE` and `TWLEN` from the
    /// constants package.
    Symbolic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    pub package_name: String,
    pub constants_package: String,
    pub sizing: TypeSizing,
    pub overflow: OverflowPolicy,
    pub keying: TableKeying,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            package_name: "twiddles".to_string(),
            constants_package: "constants".to_string(),
            sizing: TypeSizing::Literal,
            overflow: OverflowPolicy::Wrap,
            keying: TableKeying::Pair,
        }
    }
}

impl EmitOptions {
    /// Declarations and body as the hand-maintained legacy generator
    /// wrote them: flat product-keyed table, wrapped overflow, symbolic sizes.
    pub fn legacy() -> Self {
        EmitOptions {
            sizing: TypeSizing::Symbolic,
            overflow: OverflowPolicy::Wrap,
            keying: TableKeying::Product,
            ..EmitOptions::default()
        }
    }
}

/// One scheduled slot of the emitted array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub k: usize,
    pub n: usize,
    /// False when the table had no value and `0 + 0i` was substituted.
    pub present: bool,
    pub twiddle: FixedTwiddle,
}

/// The nested array in emission order: `pairs[c][a · N + b]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub pairs: Vec<Vec<Slot>>,
}

impl Layout {
    /// Walk the pipeline order and quantize every slot.
    pub fn build(params: &HardwareParams, table: &TwiddleTable) -> Self {
        let n_size = params.transform_size;
        let dsp_pairs = params.dsp_pairs();
        let pairs = (0..dsp_pairs)
            .map(|c| {
                let mut slots = Vec::with_capacity(params.scheduled_slots());
                for a in 0..params.operations_per_slice() {
                    let k = a * dsp_pairs + c;
                    for b in 0..n_size {
                        let value = table.get(k, b);
                        slots.push(Slot {
                            k,
                            n: b,
                            present: value.is_some(),
                            twiddle: FixedTwiddle::from_complex(
                                value.unwrap_or_default(),
                                params.precision,
                            ),
                        });
                    }
                }
                slots
            })
            .collect();
        Layout { pairs }
    }

    pub fn element_count(&self) -> usize {
        self.pairs.iter().map(Vec::len).sum()
    }

    fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.pairs.iter().flatten()
    }
}

#[derive(Debug)]
pub struct EmitResult {
    pub generated: Option<GeneratedVhdl>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct GeneratedVhdl {
    pub vhdl_source: String,
    pub elements: usize,
}

// ── Public entry point ──────────────────────────────────────────────────────

pub fn emit(params: &HardwareParams, table: &TwiddleTable, options: &EmitOptions) -> EmitResult {
    if table.transform_size() != params.transform_size {
        return EmitResult {
            generated: None,
            diagnostics: vec![Diagnostic::error(format!(
                "twiddle table was built for N = {}, but DFT_SIZE = {}",
                table.transform_size(),
                params.transform_size
            ))],
        };
    }
    let layout = Layout::build(params, table);
    let mut diagnostics = Vec::new();

    if let Some(d) = check_overflow(&layout, params, options.overflow) {
        let fatal = d.is_error();
        diagnostics.push(d);
        if fatal {
            return EmitResult {
                generated: None,
                diagnostics,
            };
        }
    }

    let mut ctx = EmitCtx::new(params, options);
    ctx.emit_all(&layout);
    EmitResult {
        generated: Some(GeneratedVhdl {
            vhdl_source: ctx.out,
            elements: layout.element_count(),
        }),
        diagnostics,
    }
}

/// Report the first overflowing slot: an error under `Error`, a warning
/// with the total count under `Wrap`.
fn check_overflow(
    layout: &Layout,
    params: &HardwareParams,
    policy: OverflowPolicy,
) -> Option<Diagnostic> {
    let mut first: Option<(&Slot, QuantizeError)> = None;
    let mut count = 0;
    for slot in layout.slots() {
        if let Some(err) = slot.twiddle.overflow() {
            count += slot.twiddle.overflow_count();
            if first.is_none() {
                first = Some((slot, err));
            }
        }
    }
    let (slot, err) = first?;
    let safe = COMPONENT_BITS - 2;
    let location = format!("twiddle (k={}, n={})", slot.k, slot.n);
    let d = match policy {
        OverflowPolicy::Error => Diagnostic::error(format!(
            "{}: {} at TW_PRES = {}",
            location, err, params.precision
        ))
        .with_code(codes::E0301),
        OverflowPolicy::Wrap => Diagnostic::warning(format!(
            "{} twiddle component(s) do not fit in {} bits and were wrapped; first is {}: {}",
            count, COMPONENT_BITS, location, err
        ))
        .with_code(codes::W0301),
    };
    Some(d.with_hint(format!(
        "TW_PRES <= {} keeps every twiddle in range",
        safe
    )))
}

// ── Internal context ────────────────────────────────────────────────────────

struct EmitCtx<'a> {
    params: &'a HardwareParams,
    options: &'a EmitOptions,
    out: String,
}

impl<'a> EmitCtx<'a> {
    fn new(params: &'a HardwareParams, options: &'a EmitOptions) -> Self {
        // 19 bytes per element: two quotes, 16 bits, comma.
        let capacity = params
            .dsp_pairs()
            .checked_mul(params.scheduled_slots())
            .and_then(|n| n.checked_mul(19))
            .and_then(|n| n.checked_add(2048))
            .unwrap_or(2048);
        EmitCtx {
            params,
            options,
            out: String::with_capacity(capacity),
        }
    }

    fn emit_all(&mut self, layout: &Layout) {
        self.emit_banner();
        self.emit_context_clause();
        self.emit_declarations();
        self.emit_body(layout);
        self.emit_footer();
    }

    fn emit_banner(&mut self) {
        let rule = "-".repeat(79);
        let p = self.params;
        let _ = writeln!(self.out, "{}", rule);
        let _ = writeln!(self.out, "-- Title      : Twiddles");
        let _ = writeln!(self.out, "-- Project    : DFT pipeline");
        let _ = writeln!(self.out, "{}", rule);
        let _ = writeln!(self.out, "-- File       : {}.vhd", self.options.package_name);
        let _ = writeln!(self.out, "-- Generator  : twgen");
        let _ = writeln!(self.out, "{}", rule);
        let _ = writeln!(
            self.out,
            "-- Description: Generated package containing twiddle factor array."
        );
        let _ = writeln!(
            self.out,
            "--              TW_PRES = {}, DSPs = {}, DFT_SIZE = {}",
            p.precision, p.dsp_count, p.transform_size
        );
        let _ = writeln!(
            self.out,
            "--              Do not edit; regenerate from the constants package."
        );
        let _ = writeln!(self.out, "{}", rule);
        self.out.push('\n');
    }

    fn emit_context_clause(&mut self) {
        self.out.push_str("library ieee;\nuse ieee.std_logic_1164.all;\n\n");
        let _ = writeln!(self.out, "library work;");
        let _ = writeln!(self.out, "use work.{}.all;", self.options.constants_package);
        self.out.push('\n');
    }

    fn emit_declarations(&mut self) {
        let _ = writeln!(self.out, "package {} is", self.options.package_name);
        self.out.push('\n');
        match self.options.sizing {
            TypeSizing::Symbolic => {
                self.out.push_str(
                    "  type twat is array(0 to PERDSP*DFT_SIZE-1) of STD_LOGIC_VECTOR(TWLEN-1 downto 0);\n",
                );
                self.out
                    .push_str("  type twa is array(0 to DFT_SIZE/(PERDSP*2)-1) of twat;\n");
            }
            TypeSizing::Literal => {
                let _ = writeln!(
                    self.out,
                    "  type twat is array(0 to {}) of STD_LOGIC_VECTOR({} downto 0);",
                    self.params.scheduled_slots() - 1,
                    TWIDDLE_BITS - 1
                );
                let _ = writeln!(
                    self.out,
                    "  type twa is array(0 to {}) of twat;",
                    self.params.dsp_pairs() - 1
                );
            }
        }
        self.out.push_str("  constant TWIDDLES : twa := (\n");
    }

    fn emit_body(&mut self, layout: &Layout) {
        let n_size = self.params.transform_size;
        let pair_count = layout.pairs.len();
        // A one-element positional aggregate is not legal VHDL.
        let named = self.options.sizing == TypeSizing::Literal && pair_count == 1;

        for (c, slots) in layout.pairs.iter().enumerate() {
            if named {
                let _ = write!(self.out, "{} => ", c);
            }
            self.out.push('(');
            let last = slots.len().saturating_sub(1);
            for (i, slot) in slots.iter().enumerate() {
                let literal = slot
                    .twiddle
                    .literal(OverflowPolicy::Wrap)
                    .unwrap_or_default();
                self.out.push('"');
                self.out.push_str(&literal);
                self.out.push('"');
                if i != last {
                    self.out.push(',');
                }
                let b = i % n_size;
                if (b + 1) % ELEMENTS_PER_LINE == 0 {
                    self.out.push('\n');
                }
            }
            self.out.push(')');
            if c + 1 != pair_count {
                self.out.push_str(",\n");
            }
        }
    }

    fn emit_footer(&mut self) {
        let _ = writeln!(self.out, ");\nend {};", self.options.package_name);
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

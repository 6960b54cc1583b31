// pipeline.rs — Generation state and pass orchestration
//
// Holds all pass artifacts and runs the minimal set of passes for a given
// terminal PassId.
//
// Preconditions: the parameter source text is set before calling run_pipeline.
// Postconditions: all artifacts for required passes are populated, or has_error is set.
// Failure modes: any pass emitting error-level diagnostics.
// Side effects: calls on_pass_complete callback after each pass for immediate display.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::{self, HardwareParams};
use crate::diag::{codes, has_errors, Diagnostic};
use crate::emit::{EmitOptions, GeneratedVhdl, TypeSizing};
use crate::fixed::OverflowPolicy;
use crate::pass::{descriptor, required_passes, PassId};
use crate::reader::{self, RawParams};
use crate::twiddle::{TableKeying, TwiddleTable};

// ── Artifact storage ───────────────────────────────────────────────────────

/// Holds the source, all pass artifacts, and accumulated diagnostics.
pub struct GenerationState {
    pub source: String,
    pub raw: Option<RawParams>,
    pub params: Option<HardwareParams>,
    pub table: Option<TwiddleTable>,
    pub generated: Option<GeneratedVhdl>,
    pub diagnostics: Vec<Diagnostic>,
    pub has_error: bool,
}

impl GenerationState {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            raw: None,
            params: None,
            table: None,
            generated: None,
            diagnostics: Vec::new(),
            has_error: false,
        }
    }
}

// ── Provenance ─────────────────────────────────────────────────────────────

/// Provenance metadata for reproducible builds.
///
/// `source_hash`: SHA-256 of the raw parameter source text.
/// `output_hash`: SHA-256 of the generated VHDL, when it was generated.
/// `generator_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub source_hash: [u8; 32],
    pub output_hash: Option<[u8; 32]>,
    pub generator_version: &'static str,
}

impl Provenance {
    pub fn source_hash_hex(&self) -> String {
        bytes_to_hex(&self.source_hash)
    }

    pub fn output_hash_hex(&self) -> Option<String> {
        self.output_hash.as_ref().map(bytes_to_hex)
    }
}

#[derive(Serialize)]
struct BuildInfo<'a> {
    source_sha256: String,
    output_sha256: Option<String>,
    generator_version: &'a str,
    parameters: Option<ParamsInfo>,
    options: OptionsInfo<'a>,
}

/// Validated parameters plus the derived layout dimensions.
#[derive(Debug, Clone, Serialize)]
pub struct ParamsInfo {
    #[serde(flatten)]
    pub params: HardwareParams,
    pub operations_per_slice: usize,
    pub dsp_pairs: usize,
    pub scheduled_slots: usize,
}

impl From<HardwareParams> for ParamsInfo {
    fn from(params: HardwareParams) -> Self {
        ParamsInfo {
            params,
            operations_per_slice: params.operations_per_slice(),
            dsp_pairs: params.dsp_pairs(),
            scheduled_slots: params.scheduled_slots(),
        }
    }
}

#[derive(Serialize)]
struct OptionsInfo<'a> {
    package_name: &'a str,
    constants_package: &'a str,
    table: &'static str,
    overflow: &'static str,
    sizing: &'static str,
}

impl<'a> From<&'a EmitOptions> for OptionsInfo<'a> {
    fn from(o: &'a EmitOptions) -> Self {
        OptionsInfo {
            package_name: &o.package_name,
            constants_package: &o.constants_package,
            table: match o.keying {
                TableKeying::Pair => "pair",
                TableKeying::Product => "product",
            },
            overflow: match o.overflow {
                OverflowPolicy::Wrap => "wrap",
                OverflowPolicy::Error => "error",
            },
            sizing: match o.sizing {
                TypeSizing::Literal => "literal",
                TypeSizing::Symbolic => "symbolic",
            },
        }
    }
}

fn sha256(bytes: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// Compute provenance for the state's source and generated output.
pub fn compute_provenance(state: &GenerationState) -> Provenance {
    Provenance {
        source_hash: sha256(state.source.as_bytes()),
        output_hash: state
            .generated
            .as_ref()
            .map(|g| sha256(g.vhdl_source.as_bytes())),
        generator_version: env!("CARGO_PKG_VERSION"),
    }
}

/// Serialize provenance, parameters and options as pretty JSON for
/// `--emit build-info`.
pub fn build_info_json(state: &GenerationState, options: &EmitOptions) -> String {
    let provenance = compute_provenance(state);
    let info = BuildInfo {
        source_sha256: provenance.source_hash_hex(),
        output_sha256: provenance.output_hash_hex(),
        generator_version: provenance.generator_version,
        parameters: state.params.map(ParamsInfo::from),
        options: options.into(),
    };
    let mut json = serde_json::to_string_pretty(&info).unwrap_or_default();
    json.push('\n');
    json
}

/// Serialize the validated parameters as pretty JSON for `--emit params`.
pub fn params_json(params: &HardwareParams) -> String {
    let mut json = serde_json::to_string_pretty(&ParamsInfo::from(*params)).unwrap_or_default();
    json.push('\n');
    json
}

// ── Error type ─────────────────────────────────────────────────────────────

/// Pipeline execution failed due to error-level diagnostics in a pass.
/// The specific diagnostics are available in `GenerationState.diagnostics`.
#[derive(Debug)]
pub struct PipelineError {
    /// The pass that produced the error.
    pub failing_pass: PassId,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pass failed", descriptor(self.failing_pass).name)
    }
}

impl std::error::Error for PipelineError {}

// ── Helper: per-pass bookkeeping ───────────────────────────────────────────

/// Per-pass post-processing: callback, accumulate, verbose, error check.
fn finish_pass(
    state: &mut GenerationState,
    pass_id: PassId,
    diags: Vec<Diagnostic>,
    elapsed: Duration,
    verbose: bool,
    on_pass_complete: &mut impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), PipelineError> {
    on_pass_complete(pass_id, &diags);
    let is_err = has_errors(&diags);
    state.diagnostics.extend(diags);
    if verbose {
        let desc = descriptor(pass_id);
        eprintln!(
            "twgen: {} complete, {:.1}ms ({})",
            desc.name,
            elapsed.as_secs_f64() * 1000.0,
            desc.invariants
        );
    }
    if is_err {
        state.has_error = true;
        return Err(PipelineError {
            failing_pass: pass_id,
        });
    }
    Ok(())
}

/// A pass ran before its inputs were available. Only reachable if
/// `required_passes` and the runner disagree.
fn missing_input(pass_id: PassId, what: &str) -> Diagnostic {
    Diagnostic::error(format!(
        "internal: {} pass ran without {}",
        descriptor(pass_id).name,
        what
    ))
}

// ── Pipeline runner ────────────────────────────────────────────────────────

/// Run the minimal set of passes to produce `terminal`.
///
/// Per-pass sequence: execute → on_pass_complete(callback) → verbose → error check.
///
/// Preconditions: `state.source` is set.
/// Postconditions: artifacts for all passes in `required_passes(terminal)` are populated,
///   or `state.has_error` is true.
/// Failure modes: any pass producing error-level diagnostics.
/// Side effects: calls `on_pass_complete` after each pass for immediate diagnostic display.
pub fn run_pipeline(
    state: &mut GenerationState,
    terminal: PassId,
    options: &EmitOptions,
    verbose: bool,
    mut on_pass_complete: impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), PipelineError> {
    for pass_id in required_passes(terminal) {
        let t = Instant::now();
        match pass_id {
            PassId::Read => {
                let result = reader::read_parameters(&state.source);
                let elapsed = t.elapsed();
                if verbose {
                    eprintln!("twgen: evaluated {} integer constants", result.constants);
                }
                state.raw = Some(result.raw);
                finish_pass(
                    state,
                    pass_id,
                    result.diagnostics,
                    elapsed,
                    verbose,
                    &mut on_pass_complete,
                )?;
            }
            PassId::Validate => {
                let diags = match state.raw.as_ref().map(config::validate) {
                    Some(Ok(params)) => {
                        if verbose {
                            eprintln!(
                                "twgen: TW_PRES = {}, DSPs = {}, DFT_SIZE = {}, {} operations per DSP",
                                params.precision,
                                params.dsp_count,
                                params.transform_size,
                                params.operations_per_slice()
                            );
                        }
                        state.params = Some(params);
                        Vec::new()
                    }
                    Some(Err(diags)) => diags,
                    None => vec![missing_input(pass_id, "raw parameters")],
                };
                let elapsed = t.elapsed();
                finish_pass(state, pass_id, diags, elapsed, verbose, &mut on_pass_complete)?;
            }
            PassId::BuildTable => {
                let diags = match state.params {
                    Some(params) => match TwiddleTable::build(params.transform_size, options.keying) {
                        Ok(table) => {
                            if verbose {
                                eprintln!(
                                    "twgen: {:?} table, {} of {} slots present",
                                    table.keying(),
                                    table.present(),
                                    table.len()
                                );
                            }
                            state.table = Some(table);
                            Vec::new()
                        }
                        Err(e) => vec![Diagnostic::error(e.to_string()).with_code(codes::E0205)],
                    },
                    None => vec![missing_input(pass_id, "validated parameters")],
                };
                let elapsed = t.elapsed();
                finish_pass(state, pass_id, diags, elapsed, verbose, &mut on_pass_complete)?;
            }
            PassId::Emit => {
                let diags = match (state.params.as_ref(), state.table.as_ref()) {
                    (Some(params), Some(table)) => {
                        let result = crate::emit::emit(params, table, options);
                        state.generated = result.generated;
                        result.diagnostics
                    }
                    _ => vec![missing_input(pass_id, "a twiddle table")],
                };
                let elapsed = t.elapsed();
                finish_pass(state, pass_id, diags, elapsed, verbose, &mut on_pass_complete)?;
            }
        }
    }
    Ok(())
}

/// Read, validate, build and emit in one call, returning the VHDL text.
///
/// Warnings are returned alongside the text; any error aborts with every
/// diagnostic collected so far.
pub fn generate(
    source: &str,
    options: &EmitOptions,
) -> Result<(String, Vec<Diagnostic>), Vec<Diagnostic>> {
    let mut state = GenerationState::new(source);
    let outcome = run_pipeline(&mut state, PassId::Emit, options, false, |_, _| {});
    match (outcome, state.generated) {
        (Ok(()), Some(generated)) => Ok((generated.vhdl_source, state.diagnostics)),
        _ => Err(state.diagnostics),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
constant TW_PRES     : integer := 6;
constant DFT_LG_DSPS : integer := 2;
constant DFT_SIZE    : integer := 16;
";

    #[test]
    fn validate_terminal_skips_table() {
        let mut state = GenerationState::new(SOURCE);
        let mut seen = Vec::new();
        run_pipeline(&mut state, PassId::Validate, &EmitOptions::default(), false, |p, _| {
            seen.push(p)
        })
        .unwrap();
        assert_eq!(seen, vec![PassId::Read, PassId::Validate]);
        assert!(state.params.is_some());
        assert!(state.table.is_none());
        assert!(state.generated.is_none());
    }

    #[test]
    fn emit_terminal_populates_everything() {
        let mut state = GenerationState::new(SOURCE);
        run_pipeline(&mut state, PassId::Emit, &EmitOptions::default(), false, |_, _| {}).unwrap();
        assert!(!state.has_error);
        assert!(state.table.is_some());
        assert_eq!(state.generated.as_ref().unwrap().elements, 2 * 4 * 16);
    }

    #[test]
    fn missing_parameter_stops_before_table() {
        let mut state = GenerationState::new("constant TW_PRES : integer := 6;\n");
        let err =
            run_pipeline(&mut state, PassId::Emit, &EmitOptions::default(), false, |_, _| {})
                .unwrap_err();
        assert_eq!(err.failing_pass, PassId::Validate);
        assert_eq!(err.to_string(), "validate pass failed");
        assert!(state.has_error);
        assert!(state.table.is_none());
        assert_eq!(state.diagnostics.len(), 2);
        assert!(state.diagnostics.iter().all(|d| d.code == Some(codes::E0201)));
    }

    #[test]
    fn malformed_value_fails_read() {
        let source = SOURCE.replace(":= 16;", ":= sixteen;");
        let mut state = GenerationState::new(source);
        let err =
            run_pipeline(&mut state, PassId::Emit, &EmitOptions::default(), false, |_, _| {})
                .unwrap_err();
        assert_eq!(err.failing_pass, PassId::Read);
        assert!(state.params.is_none());
    }

    #[test]
    fn oversize_transform_fails_validate_without_table() {
        let source = SOURCE.replace(":= 16;", ":= 8589934592;");
        let mut state = GenerationState::new(source);
        let err =
            run_pipeline(&mut state, PassId::Emit, &EmitOptions::legacy(), false, |_, _| {})
                .unwrap_err();
        assert_eq!(err.failing_pass, PassId::Validate);
        assert!(state.table.is_none());
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].code, Some(codes::E0205));
    }

    #[test]
    fn overflow_error_fails_emit_without_output() {
        let source = SOURCE.replace(":= 6;", ":= 7;");
        let options = EmitOptions {
            overflow: OverflowPolicy::Error,
            ..EmitOptions::default()
        };
        let diags = generate(&source, &options).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, Some(codes::E0301));
    }

    #[test]
    fn generate_returns_warnings_with_text() {
        let source = SOURCE.replace(":= 6;", ":= 7;");
        let (vhdl, warnings) = generate(&source, &EmitOptions::default()).unwrap();
        assert!(vhdl.starts_with("----"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, Some(codes::W0301));
    }

    #[test]
    fn params_json_includes_derived_dimensions() {
        let params = HardwareParams::new(6, 4, 16).unwrap();
        let json: serde_json::Value = serde_json::from_str(&params_json(&params)).unwrap();
        assert_eq!(json["precision"], 6);
        assert_eq!(json["dsp_count"], 4);
        assert_eq!(json["transform_size"], 16);
        assert_eq!(json["operations_per_slice"], 4);
        assert_eq!(json["dsp_pairs"], 2);
        assert_eq!(json["scheduled_slots"], 64);
    }

    #[test]
    fn build_info_hashes_source_and_output() {
        let mut state = GenerationState::new(SOURCE);
        let options = EmitOptions::default();
        run_pipeline(&mut state, PassId::Emit, &options, false, |_, _| {}).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&build_info_json(&state, &options)).unwrap();
        let source_hash = json["source_sha256"].as_str().unwrap();
        let output_hash = json["output_sha256"].as_str().unwrap();
        assert_eq!(source_hash.len(), 64);
        assert_eq!(output_hash.len(), 64);
        assert_ne!(source_hash, output_hash);
        assert_eq!(json["generator_version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["options"]["table"], "pair");
        assert_eq!(json["parameters"]["dsp_pairs"], 2);
    }

    #[test]
    fn provenance_is_deterministic() {
        let a = compute_provenance(&GenerationState::new(SOURCE));
        let b = compute_provenance(&GenerationState::new(SOURCE));
        assert_eq!(a.source_hash, b.source_hash);
        assert_eq!(a.output_hash, None);
    }

    #[test]
    fn empty_input_sha256() {
        assert_eq!(
            bytes_to_hex(&sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

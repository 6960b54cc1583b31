// config.rs — Validated hardware parameters
//
// Turns the reader's raw bindings into a `HardwareParams` value that the
// table builder and emitter take as an explicit argument. All consistency
// checks run here, before any table is built.
//
// Preconditions: `RawParams` from `reader::read_parameters`.
// Postconditions: on success, `dsp_count` is even and divides `transform_size`.
// Failure modes: E0201 missing, E0202 odd DSP count, E0203 indivisible size,
//                E0204 non-positive values, E0205 unsupported range.
// Side effects: none.

use serde::Serialize;

use crate::diag::{codes, Diagnostic};
use crate::reader::{Binding, Marker, RawParams};

/// Largest supported `DFT_LG_DSPS`.
pub const MAX_LG_DSPS: i64 = 30;

/// Largest supported `DFT_SIZE`. Keeps the `N·N/2`-slot table and the
/// emitted text within a few hundred megabytes.
pub const MAX_DFT_SIZE: i64 = 1 << 12;

/// Largest supported `TW_PRES`. Beyond this `2^precision` scaling no longer
/// leaves integral values exact in an `f64`.
pub const MAX_PRECISION: i64 = 52;

/// Parameters of the DSP pipeline the twiddle table is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HardwareParams {
    /// Fractional bits of the fixed-point format (`TW_PRES`).
    pub precision: u32,
    /// Number of DSP slices, `2^DFT_LG_DSPS`.
    pub dsp_count: usize,
    /// DFT size N (`DFT_SIZE`).
    pub transform_size: usize,
}

impl HardwareParams {
    /// Build parameters directly, applying the same checks as `validate`.
    pub fn new(precision: u32, dsp_count: usize, transform_size: usize) -> Result<Self, Diagnostic> {
        let params = HardwareParams {
            precision,
            dsp_count,
            transform_size,
        };
        if u64::from(precision) > MAX_PRECISION as u64 {
            return Err(out_of_range(Marker::TwPres, precision.into(), 0, MAX_PRECISION, None));
        }
        if transform_size == 0 {
            return Err(Diagnostic::error("DFT_SIZE must be positive").with_code(codes::E0204));
        }
        if transform_size as u64 > MAX_DFT_SIZE as u64 {
            let value = i64::try_from(transform_size).unwrap_or(i64::MAX);
            return Err(out_of_range(Marker::DftSize, value, 1, MAX_DFT_SIZE, None));
        }
        params.check_layout(None)?;
        Ok(params)
    }

    /// Operations each DSP slice performs, `N / dsp_count`.
    pub fn operations_per_slice(&self) -> usize {
        self.transform_size / self.dsp_count
    }

    /// Number of DSP pairs, the outer dimension of the emitted array.
    pub fn dsp_pairs(&self) -> usize {
        self.dsp_count / 2
    }

    /// Elements per DSP pair, the inner dimension of the emitted array.
    pub fn scheduled_slots(&self) -> usize {
        self.operations_per_slice() * self.transform_size
    }

    fn check_layout(&self, line: Option<usize>) -> Result<(), Diagnostic> {
        if self.dsp_count < 2 || self.dsp_count % 2 != 0 {
            let mut d = Diagnostic::error(format!(
                "DSP count {} is not even; the pipeline processes slices in pairs",
                self.dsp_count
            ))
            .with_code(codes::E0202)
            .with_hint("DFT_LG_DSPS must be at least 1");
            if let Some(line) = line {
                d = d.at_line(line);
            }
            return Err(d);
        }
        if self.transform_size % self.dsp_count != 0 {
            let mut d = Diagnostic::error(format!(
                "DFT_SIZE {} is not a multiple of the DSP count {}",
                self.transform_size, self.dsp_count
            ))
            .with_code(codes::E0203);
            if let Some(line) = line {
                d = d.at_line(line);
            }
            return Err(d);
        }
        Ok(())
    }
}

/// Validate raw bindings. Reports every independent problem rather than
/// stopping at the first.
pub fn validate(raw: &RawParams) -> Result<HardwareParams, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();

    let tw_pres = require(raw, Marker::TwPres, &mut diagnostics);
    let lg_dsps = require(raw, Marker::DftLgDsps, &mut diagnostics);
    let dft_size = require(raw, Marker::DftSize, &mut diagnostics);

    let precision = tw_pres.and_then(|b| {
        if b.value < 0 {
            diagnostics.push(negative(Marker::TwPres, b));
            None
        } else if b.value > MAX_PRECISION {
            diagnostics.push(out_of_range(Marker::TwPres, b.value, 0, MAX_PRECISION, Some(b.line)));
            None
        } else {
            u32::try_from(b.value).ok()
        }
    });

    let dsp_count = lg_dsps.and_then(|b| {
        if b.value < 0 {
            diagnostics.push(negative(Marker::DftLgDsps, b));
            None
        } else if b.value > MAX_LG_DSPS {
            diagnostics.push(out_of_range(Marker::DftLgDsps, b.value, 0, MAX_LG_DSPS, Some(b.line)));
            None
        } else {
            Some(1usize << b.value)
        }
    });

    let transform_size = dft_size.and_then(|b| {
        if b.value <= 0 {
            diagnostics.push(
                Diagnostic::error(format!("DFT_SIZE must be positive, found {}", b.value))
                    .with_code(codes::E0204)
                    .at_line(b.line),
            );
            None
        } else if b.value > MAX_DFT_SIZE {
            diagnostics.push(out_of_range(
                Marker::DftSize,
                b.value,
                1,
                MAX_DFT_SIZE,
                Some(b.line),
            ));
            None
        } else {
            usize::try_from(b.value).ok()
        }
    });

    if let (Some(precision), Some(dsp_count), Some(transform_size)) =
        (precision, dsp_count, transform_size)
    {
        let params = HardwareParams {
            precision,
            dsp_count,
            transform_size,
        };
        let line = raw.dft_size.map(|b| b.line);
        match params.check_layout(line) {
            Ok(()) if diagnostics.is_empty() => return Ok(params),
            Ok(()) => {}
            Err(d) => diagnostics.push(d),
        }
    }

    Err(diagnostics)
}

fn require(raw: &RawParams, marker: Marker, diagnostics: &mut Vec<Diagnostic>) -> Option<Binding> {
    let binding = raw.get(marker);
    if binding.is_none() {
        diagnostics.push(
            Diagnostic::error(format!("missing parameter {}", marker))
                .with_code(codes::E0201)
                .with_hint(format!(
                    "declare `constant {} : integer := <value>;` in the constants package",
                    marker
                )),
        );
    }
    binding
}

fn negative(marker: Marker, b: Binding) -> Diagnostic {
    Diagnostic::error(format!("{} must not be negative, found {}", marker, b.value))
        .with_code(codes::E0204)
        .at_line(b.line)
}

fn out_of_range(marker: Marker, value: i64, min: i64, max: i64, line: Option<usize>) -> Diagnostic {
    let d = Diagnostic::error(format!(
        "{} = {} is outside the supported range {}..={}",
        marker, value, min, max
    ))
    .with_code(codes::E0205);
    match line {
        Some(line) => d.at_line(line),
        None => d,
    }
}

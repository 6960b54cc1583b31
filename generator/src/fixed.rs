// fixed.rs — Fixed-point quantizer
//
// Converts a complex twiddle into two 8-bit two's-complement components.
// Each component is `trunc(value · 2^precision)`; the width does not depend
// on the precision, so callers choose a precision that keeps values in
// `[-128, 127]` or pick an overflow policy.
//
// Preconditions: `precision <= config::MAX_PRECISION`.
// Postconditions: every encoded component is exactly `COMPONENT_BITS` wide.
// Failure modes: out-of-range components under `OverflowPolicy::Error`.
// Side effects: none.

use std::fmt;

use num_complex::Complex64;

/// Bits per twiddle component.
pub const COMPONENT_BITS: u32 = 8;

/// Bits per emitted twiddle literal (real followed by imaginary).
pub const TWIDDLE_BITS: u32 = 2 * COMPONENT_BITS;

/// What to do with a component outside the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Keep the low `COMPONENT_BITS` bits (modular two's complement).
    #[default]
    Wrap,
    /// Refuse to encode.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Real,
    Imag,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Real => f.write_str("real"),
            Component::Imag => f.write_str("imaginary"),
        }
    }
}

/// A scaled component that does not fit in `COMPONENT_BITS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizeError {
    pub component: Component,
    pub value: i64,
}

impl fmt::Display for QuantizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (min, max) = component_range();
        write!(
            f,
            "{} part {} does not fit in {} bits ({}..={})",
            self.component, self.value, COMPONENT_BITS, min, max
        )
    }
}

impl std::error::Error for QuantizeError {}

/// A twiddle scaled to integers, before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedTwiddle {
    pub real: i64,
    pub imag: i64,
}

impl FixedTwiddle {
    /// Scale by `2^precision` and truncate each part toward zero.
    pub fn from_complex(value: Complex64, precision: u32) -> Self {
        let scaled = value * 2f64.powi(precision as i32);
        FixedTwiddle {
            real: scaled.re.trunc() as i64,
            imag: scaled.im.trunc() as i64,
        }
    }

    /// The first component outside the representable range, if any.
    pub fn overflow(&self) -> Option<QuantizeError> {
        [(Component::Real, self.real), (Component::Imag, self.imag)]
            .into_iter()
            .find(|&(_, value)| !fits(value, COMPONENT_BITS))
            .map(|(component, value)| QuantizeError { component, value })
    }

    /// Number of components outside the representable range (0, 1 or 2).
    pub fn overflow_count(&self) -> usize {
        [self.real, self.imag]
            .into_iter()
            .filter(|&v| !fits(v, COMPONENT_BITS))
            .count()
    }

    /// Encode both components, honouring `policy`.
    pub fn encode(&self, policy: OverflowPolicy) -> Result<(String, String), QuantizeError> {
        if policy == OverflowPolicy::Error {
            if let Some(err) = self.overflow() {
                return Err(err);
            }
        }
        Ok((
            encode_twos_complement(self.real, COMPONENT_BITS),
            encode_twos_complement(self.imag, COMPONENT_BITS),
        ))
    }

    /// The `TWIDDLE_BITS`-wide literal: real bits followed by imaginary bits.
    pub fn literal(&self, policy: OverflowPolicy) -> Result<String, QuantizeError> {
        let (real, imag) = self.encode(policy)?;
        Ok(real + &imag)
    }
}

/// Quantize a complex value into `(real_bits, imag_bits)`.
pub fn quantize(
    value: Complex64,
    precision: u32,
    policy: OverflowPolicy,
) -> Result<(String, String), QuantizeError> {
    FixedTwiddle::from_complex(value, precision).encode(policy)
}

/// Inclusive range of a `COMPONENT_BITS`-wide two's-complement integer.
pub fn component_range() -> (i64, i64) {
    let half = 1i64 << (COMPONENT_BITS - 1);
    (-half, half - 1)
}

/// True if `value` is representable in `width`-bit two's complement.
pub fn fits(value: i64, width: u32) -> bool {
    let half = 1i64 << (width - 1);
    (-half..half).contains(&value)
}

/// Encode `value` as a `width`-bit two's-complement bit string, keeping the
/// low `width` bits when it does not fit.
pub fn encode_twos_complement(value: i64, width: u32) -> String {
    let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
    format!("{:0width$b}", (value as u64) & mask, width = width as usize)
}

/// Decode a two's-complement bit string. Returns `None` for an empty string,
/// a string longer than 64 bits, or any character other than `0`/`1`.
pub fn decode_twos_complement(bits: &str) -> Option<i64> {
    if bits.is_empty() || bits.len() > 64 || !bits.bytes().all(|b| b == b'0' || b == b'1') {
        return None;
    }
    let raw = u64::from_str_radix(bits, 2).ok()?;
    let width = bits.len() as u32;
    if width == 64 {
        return Some(raw as i64);
    }
    let sign_bit = 1u64 << (width - 1);
    if raw & sign_bit == 0 {
        Some(raw as i64)
    } else {
        Some(raw as i64 - (1i64 << width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a negative value as the complement of `-1 - value`, the way
    /// hand-written VHDL generators usually do it.
    fn ones_complement_offset(value: i64, width: u32) -> String {
        if value >= 0 {
            return format!("{:0width$b}", value, width = width as usize);
        }
        format!("{:0width$b}", -1 - value, width = width as usize)
            .chars()
            .map(|c| if c == '1' { '0' } else { '1' })
            .collect()
    }

    #[test]
    fn round_trip_whole_range() {
        for x in -128..=127 {
            let bits = encode_twos_complement(x, 8);
            assert_eq!(bits.len(), 8);
            assert_eq!(decode_twos_complement(&bits), Some(x), "x = {x}");
        }
    }

    #[test]
    fn matches_ones_complement_offset_formulation() {
        for x in -128..=127 {
            assert_eq!(encode_twos_complement(x, 8), ones_complement_offset(x, 8));
        }
    }

    #[test]
    fn zero_value() {
        let (re, im) = quantize(Complex64::new(0.0, 0.0), 7, OverflowPolicy::Error).unwrap();
        assert_eq!(re, "00000000");
        assert_eq!(im, "00000000");
    }

    #[test]
    fn known_value_minus_i() {
        // precision 0, N = 8, k = 1, n = 2: exp(-iπ/2) = 0 - 1i.
        let w = crate::twiddle::twiddle(1, 2, 8);
        let (re, im) = quantize(w, 0, OverflowPolicy::Error).unwrap();
        assert_eq!(re, "00000000");
        assert_eq!(im, "11111111");
    }

    #[test]
    fn truncates_toward_zero() {
        let f = FixedTwiddle::from_complex(Complex64::new(0.70710678, -0.70710678), 6);
        assert_eq!(f, FixedTwiddle { real: 45, imag: -45 });
    }

    #[test]
    fn tiny_negative_truncates_to_zero() {
        let f = FixedTwiddle::from_complex(Complex64::new(-1e-16, 6e-17), 7);
        assert_eq!(f, FixedTwiddle::default());
    }

    #[test]
    fn unit_at_precision_seven_overflows() {
        let f = FixedTwiddle::from_complex(Complex64::new(1.0, 0.0), 7);
        assert_eq!(f.real, 128);
        assert_eq!(
            f.overflow(),
            Some(QuantizeError {
                component: Component::Real,
                value: 128
            })
        );
        assert_eq!(f.overflow_count(), 1);
        assert!(f.encode(OverflowPolicy::Error).is_err());
        // Wrapped like the legacy generator: 128 reads back as -128.
        let (re, im) = f.encode(OverflowPolicy::Wrap).unwrap();
        assert_eq!(re, "10000000");
        assert_eq!(im, "00000000");
    }

    #[test]
    fn minus_one_at_precision_seven_fits() {
        let f = FixedTwiddle::from_complex(Complex64::new(0.0, -1.0), 7);
        assert_eq!(f.imag, -128);
        assert_eq!(f.overflow(), None);
        assert_eq!(f.literal(OverflowPolicy::Error).unwrap(), "0000000010000000");
    }

    #[test]
    fn wrap_is_modular() {
        assert_eq!(encode_twos_complement(-129, 8), "01111111");
        assert_eq!(encode_twos_complement(-200, 8), "00111000");
        assert_eq!(encode_twos_complement(256, 8), "00000000");
    }

    #[test]
    fn quantize_error_message() {
        let err = QuantizeError {
            component: Component::Imag,
            value: -130,
        };
        assert_eq!(
            err.to_string(),
            "imaginary part -130 does not fit in 8 bits (-128..=127)"
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode_twos_complement(""), None);
        assert_eq!(decode_twos_complement("0120"), None);
        assert_eq!(decode_twos_complement("1"), Some(-1));
        assert_eq!(decode_twos_complement("01"), Some(1));
    }

    #[test]
    fn literal_is_sixteen_bits() {
        let f = FixedTwiddle { real: 45, imag: -45 };
        let lit = f.literal(OverflowPolicy::Error).unwrap();
        assert_eq!(lit.len(), TWIDDLE_BITS as usize);
        assert_eq!(lit, "0010110111010011");
    }
}

// twiddle.rs — Twiddle table builder
//
// Computes `exp(-i·2π·k·n/N)` for `k` in `[0, N/2)` and `n` in `[0, N)`,
// enumerated k-major, n-minor, ascending.
//
// Two keyings are supported. `Pair` stores one slot per `(k, n)` in an
// `N/2 × N` table. `Product` reproduces the legacy flat table of `N·N/2`
// slots keyed by `k·n`, where a later write to a key overwrites an earlier
// one. The twiddle value depends only on the product `k·n`, so the two
// keyings agree on every slot the emitter reads up to angle rounding.
//
// Preconditions: `transform_size > 0`.
// Postconditions: every `(k, n)` in the domain has a present slot.
// Failure modes: `TableSizeError` when the slot count overflows `usize` or
//                the table could never be allocated.
// Side effects: none.

use std::f64::consts::PI;
use std::fmt;

use num_complex::Complex64;

/// How the table maps `(k, n)` to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableKeying {
    /// One slot per `(k, n)` pair.
    #[default]
    Pair,
    /// One slot per product `k·n`, last write wins.
    Product,
}

/// The twiddle factor `exp(-i·2π·k·n/N)` in double precision.
pub fn twiddle(k: usize, n: usize, transform_size: usize) -> Complex64 {
    let theta = -2.0 * PI * k as f64 * n as f64 / transform_size as f64;
    Complex64::new(0.0, theta).exp()
}

/// The table for `transform_size` has more slots than can be addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSizeError {
    pub transform_size: usize,
    pub keying: TableKeying,
}

impl fmt::Display for TableSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a {:?}-keyed twiddle table for N = {} is too large to allocate",
            self.keying, self.transform_size
        )
    }
}

impl std::error::Error for TableSizeError {}

/// Number of slots a table of `keying` needs for `transform_size`, or
/// `None` when that many slots cannot be allocated.
pub fn slot_count(transform_size: usize, keying: TableKeying) -> Option<usize> {
    let len = match keying {
        TableKeying::Pair => (transform_size / 2).checked_mul(transform_size)?,
        TableKeying::Product => transform_size.checked_mul(transform_size)? / 2,
    };
    let bytes = len.checked_mul(std::mem::size_of::<Option<Complex64>>())?;
    (bytes <= isize::MAX as usize).then_some(len)
}

/// Precomputed twiddle factors. Slots are `None` until written.
#[derive(Debug, Clone)]
pub struct TwiddleTable {
    keying: TableKeying,
    transform_size: usize,
    slots: Vec<Option<Complex64>>,
}

impl TwiddleTable {
    /// Build the table for transform size `transform_size`.
    pub fn build(transform_size: usize, keying: TableKeying) -> Result<Self, TableSizeError> {
        let rows = transform_size / 2;
        let len = slot_count(transform_size, keying).ok_or(TableSizeError {
            transform_size,
            keying,
        })?;
        let mut table = TwiddleTable {
            keying,
            transform_size,
            slots: vec![None; len],
        };
        for k in 0..rows {
            for n in 0..transform_size {
                if let Some(key) = table.key(k, n) {
                    table.slots[key] = Some(twiddle(k, n, transform_size));
                }
            }
        }
        Ok(table)
    }

    pub fn keying(&self) -> TableKeying {
        self.keying
    }

    pub fn transform_size(&self) -> usize {
        self.transform_size
    }

    /// Number of slots, present or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots that hold a value.
    pub fn present(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Slot index for `(k, n)`, or `None` when it falls outside the table.
    pub fn key(&self, k: usize, n: usize) -> Option<usize> {
        let key = match self.keying {
            TableKeying::Pair => {
                if n >= self.transform_size {
                    return None;
                }
                k.checked_mul(self.transform_size)?.checked_add(n)?
            }
            TableKeying::Product => k.checked_mul(n)?,
        };
        (key < self.slots.len()).then_some(key)
    }

    /// The stored twiddle for `(k, n)`, or `None` if that slot was never written.
    pub fn get(&self, k: usize, n: usize) -> Option<Complex64> {
        self.key(k, n).and_then(|key| self.slots[key])
    }
}

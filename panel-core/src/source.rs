//! Rotary position sources.
//!
//! An [`AxisSource`] yields a raw, monotonically wrapping position in
//! `[0, max_count)`. The concrete variant is picked once at startup from the
//! configuration and never swapped afterwards, so a closed enum replaces the
//! virtual dispatch a trait object would cost on the interrupt path.

use portable_atomic::{AtomicU16, AtomicU32, Ordering};

/// A position counter wrapping modulo `max_count`.
///
/// Negative wrap is clamped by adding `max_count` before truncation, so the
/// counter stays in `[0, max_count)` for any step with `|delta| <= max_count`.
#[derive(Debug, Clone, Copy)]
pub struct ModularCounter {
    count: u32,
    max_count: u32,
}

impl ModularCounter {
    #[must_use]
    pub const fn new(max_count: u32) -> Self {
        Self { count: 0, max_count }
    }

    /// Apply a signed step and return the new position.
    pub fn add(&mut self, delta: i32) -> u32 {
        let mut next = self.count as i64 + delta as i64;
        if next < 0 {
            next += self.max_count as i64;
        }
        if next >= self.max_count as i64 {
            next -= self.max_count as i64;
        }
        self.count = next as u32;
        self.count
    }

    #[inline]
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.count
    }

    #[inline]
    #[must_use]
    pub const fn max_count(&self) -> u32 {
        self.max_count
    }
}

/// Transition-table quadrature decoder for a directly wired encoder.
///
/// Indexed by `previous_state | new_state << 2` where a state is
/// `a | b << 1`. Single-phase transitions step by one, both-phase
/// transitions (a missed edge) by two, and the four no-change/illegal codes
/// are bounce and contribute nothing.
const STEP_TABLE: [i8; 16] = [
    0, 1, -1, 2, //
    -1, 0, -2, 1, //
    1, -2, 0, -1, //
    2, -1, 1, 0,
];

/// Software quadrature decoder fed from GPIO edge events.
///
/// Mutated only by the edge handler that owns it; the decoded position is
/// published through an [`AtomicU32`] cell for the main loop to read.
#[derive(Debug)]
pub struct QuadratureDecoder {
    state: u8,
    counter: ModularCounter,
}

impl QuadratureDecoder {
    /// Seed the 2-bit phase state from the current pin levels.
    #[must_use]
    pub const fn new(max_count: u32, a: bool, b: bool) -> Self {
        Self {
            state: a as u8 | ((b as u8) << 1),
            counter: ModularCounter::new(max_count),
        }
    }

    /// Feed one edge event (the new pin levels) and return the new position.
    pub fn step(&mut self, a: bool, b: bool) -> u32 {
        let new_state = a as u8 | ((b as u8) << 1);
        let code = self.state | (new_state << 2);
        self.state = new_state;
        self.counter.add(STEP_TABLE[code as usize] as i32)
    }

    #[inline]
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.counter.get()
    }
}

/// A raw rotary position source. `get()` is non-blocking and side-effect
/// free; it only loads whatever the producing interrupt last published.
#[derive(Debug, Clone, Copy)]
pub enum AxisSource {
    /// Position counter maintained by a quadrature decoder (hardware-assisted
    /// or GPIO edge driven).
    Encoder(&'static AtomicU32),
    /// Free-running ADC conversion; the latest sample is right-shifted down
    /// to 8-bit resolution. No debounce at this layer.
    Analog {
        sample: &'static AtomicU16,
        shift: u8,
    },
    /// Disabled axis slot; reads a fixed idle position.
    Null,
}

impl AxisSource {
    #[inline]
    #[must_use]
    pub fn get(&self) -> u32 {
        match *self {
            AxisSource::Encoder(cell) => cell.load(Ordering::Relaxed),
            AxisSource::Analog { sample, shift } => {
                u32::from(sample.load(Ordering::Relaxed)) >> shift
            }
            AxisSource::Null => 0,
        }
    }
}

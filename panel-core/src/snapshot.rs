//! The combined input state shared between the main loop and the
//! asynchronous consumers.
//!
//! The main loop overwrites one [`SharedSnapshot`] per tick; the USB report
//! task and the legacy bus interrupt read it whenever they need the latest
//! state. Each field is a single-writer/single-reader atomic cell, so no
//! consumer ever blocks and no field is ever observed torn. A reader may see
//! the previous tick's value for one field and the current tick's for
//! another; that one-tick staleness is an accepted property of the design,
//! not something to lock away, because the bus responder must never stall
//! the console's clock.

use crate::axis::Direction;
use portable_atomic::{AtomicU16, AtomicU8, Ordering};

/// Report bit asserted while the first axis moves in the positive direction;
/// the three following bits cover axis 0 negative, axis 1 positive and
/// axis 1 negative.
pub const AXIS_BUTTON_BASE: u16 = 12;

/// The combined button/axis state for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSnapshot {
    /// Bit i set = button i active, after remap and axis-button merge.
    pub buttons: u16,
    /// 128-centered report bytes, one per axis.
    pub axis: [u8; 2],
}

impl InputSnapshot {
    /// Centered axes, nothing pressed.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            buttons: 0,
            axis: [128; 2],
        }
    }

    /// Merge the axis directions into the auxiliary button bits.
    #[must_use]
    pub const fn with_axis_buttons(mut self, directions: [Direction; 2]) -> Self {
        let mut i = 0;
        while i < 2 {
            let bit = AXIS_BUTTON_BASE + 2 * i as u16;
            match directions[i].sign() {
                1 => self.buttons |= 1 << bit,
                -1 => self.buttons |= 1 << (bit + 1),
                _ => {}
            }
            i += 1;
        }
        self
    }
}

/// Atomic cell holding the most recently published [`InputSnapshot`].
#[derive(Debug)]
pub struct SharedSnapshot {
    buttons: AtomicU16,
    axis: [AtomicU8; 2],
}

impl SharedSnapshot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buttons: AtomicU16::new(0),
            axis: [AtomicU8::new(128), AtomicU8::new(128)],
        }
    }

    /// Publish a new snapshot, one atomic store per field.
    pub fn publish(&self, snapshot: InputSnapshot) {
        self.buttons.store(snapshot.buttons, Ordering::Relaxed);
        self.axis[0].store(snapshot.axis[0], Ordering::Relaxed);
        self.axis[1].store(snapshot.axis[1], Ordering::Relaxed);
    }

    /// Load the latest snapshot.
    #[must_use]
    pub fn load(&self) -> InputSnapshot {
        InputSnapshot {
            buttons: self.buttons.load(Ordering::Relaxed),
            axis: [
                self.axis[0].load(Ordering::Relaxed),
                self.axis[1].load(Ordering::Relaxed),
            ],
        }
    }

    /// Load only the button mask; the cheap path for the bus interrupt.
    #[inline]
    #[must_use]
    pub fn buttons(&self) -> u16 {
        self.buttons.load(Ordering::Relaxed)
    }
}

impl Default for SharedSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

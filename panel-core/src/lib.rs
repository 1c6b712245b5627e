//! Platform-agnostic input processing for arcade panel controllers.
//!
//! This crate holds everything between the raw peripherals and the two
//! report consumers (USB HID and the legacy console bus), without any
//! platform-specific dependencies. It can be used both in embedded `no_std`
//! environments and on host for testing.
//!
//! # Overview
//!
//! - [`source`]: rotary position sources ([`AxisSource`]) and quadrature
//!   decoding ([`QuadratureDecoder`], [`ModularCounter`])
//! - [`axis`]: the per-axis direction state machine ([`AxisProcessor`])
//! - [`button`]: debounced, remapped button sampling ([`ButtonSampler`])
//! - [`snapshot`]: the combined state shared with interrupt consumers
//!   ([`InputSnapshot`], [`SharedSnapshot`])
//! - [`config`]: the persisted configuration image and its typed form
//!   ([`Config`])
//!
//! # Data flow
//!
//! Once per 1 kHz tick the main loop samples every button, runs
//! [`AxisProcessor::process`] for each axis and publishes the merged result
//! through a [`SharedSnapshot`]. Interrupt handlers (quadrature edges, the
//! legacy bus) never take a lock: position counters and snapshot fields are
//! single-writer atomic cells, and a reader may observe at most one stale
//! tick of data.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod axis;
pub mod button;
pub mod config;
pub mod snapshot;
pub mod source;

// Re-export main types at crate root
pub use axis::{AxisConfig, AxisOutput, AxisProcessor, Direction};
pub use button::{ButtonConfig, ButtonSampler, NUM_BUTTONS};
pub use config::{Config, ConfigError, CONFIG_SIZE};
pub use snapshot::{InputSnapshot, SharedSnapshot};
pub use source::{AxisSource, ModularCounter, QuadratureDecoder};

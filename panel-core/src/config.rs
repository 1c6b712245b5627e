//! Persisted configuration image and its typed form.
//!
//! The host tool writes the configuration as an opaque little-endian byte
//! image through a feature report; the firmware stores it verbatim and
//! parses it once at boot. Packing tricks (flag word, nibble-packed remap)
//! live only here: the rest of the crate works with the typed [`Config`].
//!
//! Image layout (24 bytes):
//!
//! ```text
//! 0..4    flags          bit1 invert axis 0, bit2 invert axis 1,
//!                        bit5 analog axes, bit6 axis direction buttons,
//!                        bit7 invert light signals
//! 4..6    sensitivity    i8 per axis
//! 6       personality    0 = disabled, 1 = Pop'n, 2/3 = IIDX QE1/QE2
//! 7       button debounce time, ms
//! 8       axis debounce time, ms (reserved)
//! 9       axis sustain time, ms
//! 10..12  reduction ratio per axis
//! 12..14  deadzone per axis, half-degree units
//! 14..20  button remap, one nibble per button, 0 = identity
//! 20      capability flags   bit0: dedicated light outputs claim two slots
//! 21      claimed slots, one nibble per slot
//! 22..24  reserved
//! ```
//!
//! Short images are padded with the default bytes, so a field the host never
//! wrote keeps its default.

use crate::axis::AxisConfig;
use crate::button::{ButtonConfig, NUM_BUTTONS};
use psx_proto::Personality;

/// Size of the persisted configuration image.
pub const CONFIG_SIZE: usize = 24;

const FLAG_INVERT_QE1: u32 = 1 << 1;
const FLAG_INVERT_QE2: u32 = 1 << 2;
const FLAG_ANALOG_AXES: u32 = 1 << 5;
const FLAG_AXIS_BUTTONS: u32 = 1 << 6;
const FLAG_INVERT_LEDS: u32 = 1 << 7;

const CAP_LIGHT_TAKEOVER: u8 = 1 << 0;

/// Default image: 2 ms button debounce, 100 ms sustain, everything else off.
const DEFAULT_IMAGE: [u8; CONFIG_SIZE] = [
    0, 0, 0, 0, // flags
    0, 0, // sensitivity
    0, // personality
    2, // button debounce
    0, // axis debounce (reserved)
    100, // axis sustain
    0, 0, // reduction
    0, 0, // deadzone
    0, 0, 0, 0, 0, 0, // remap nibbles
    0, // capability flags
    0, // claimed slots
    0, 0, // reserved
];

/// Error from the configuration write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A write segment does not fit inside the image.
    SegmentOutOfRange,
}

/// Typed session configuration, parsed once at boot and immutable until the
/// next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub invert_qe: [bool; 2],
    /// Axes read the free-running ADC instead of the encoders.
    pub analog_axes: bool,
    /// Axis directions assert the auxiliary report bits 12..=15.
    pub axis_buttons: bool,
    /// Lights are on at rest and turn off when active.
    pub invert_leds: bool,
    pub personality: Option<Personality>,
    pub axes: [AxisConfig; 2],
    pub buttons: ButtonConfig,
}

impl Config {
    /// Parse a stored image. Anything the image does not cover keeps its
    /// default, and out-of-range values degrade per field rather than
    /// rejecting the whole image.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut image = DEFAULT_IMAGE;
        let len = bytes.len().min(CONFIG_SIZE);
        image[..len].copy_from_slice(&bytes[..len]);

        let flags = u32::from_le_bytes([image[0], image[1], image[2], image[3]]);

        let axes = [
            AxisConfig {
                debounce_time_ms: image[8],
                sustain_time_ms: image[9],
                reduction_ratio: image[10],
                deadzone: image[12],
                sensitivity: image[4] as i8,
            },
            AxisConfig {
                debounce_time_ms: image[8],
                sustain_time_ms: image[9],
                reduction_ratio: image[11],
                deadzone: image[13],
                sensitivity: image[5] as i8,
            },
        ];

        let mut remap = [0u8; NUM_BUTTONS];
        let mut enabled = [true; NUM_BUTTONS];
        for i in 0..NUM_BUTTONS {
            let nibble = (image[14 + i / 2] >> ((i % 2) * 4)) & 0xF;
            remap[i] = if nibble > 0 { nibble - 1 } else { i as u8 };
        }
        if image[20] & CAP_LIGHT_TAKEOVER != 0 {
            // Two input slots are wired to dedicated light outputs.
            enabled[usize::from(image[21] & 0xF).min(NUM_BUTTONS - 1)] = false;
            enabled[usize::from(image[21] >> 4).min(NUM_BUTTONS - 1)] = false;
        }

        Self {
            invert_qe: [flags & FLAG_INVERT_QE1 != 0, flags & FLAG_INVERT_QE2 != 0],
            analog_axes: flags & FLAG_ANALOG_AXES != 0,
            axis_buttons: flags & FLAG_AXIS_BUTTONS != 0,
            invert_leds: flags & FLAG_INVERT_LEDS != 0,
            personality: Personality::from_config(image[6]),
            axes,
            buttons: ButtonConfig {
                debounce_time_ms: image[7],
                remap,
                enabled,
            },
        }
    }

    /// Serialize for the host readback report. Identity remaps canonicalize
    /// to the zero nibble.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; CONFIG_SIZE] {
        let mut image = DEFAULT_IMAGE;

        let mut flags = 0u32;
        for (flag, set) in [
            (FLAG_INVERT_QE1, self.invert_qe[0]),
            (FLAG_INVERT_QE2, self.invert_qe[1]),
            (FLAG_ANALOG_AXES, self.analog_axes),
            (FLAG_AXIS_BUTTONS, self.axis_buttons),
            (FLAG_INVERT_LEDS, self.invert_leds),
        ] {
            if set {
                flags |= flag;
            }
        }
        image[0..4].copy_from_slice(&flags.to_le_bytes());

        image[4] = self.axes[0].sensitivity as u8;
        image[5] = self.axes[1].sensitivity as u8;
        image[6] = match self.personality {
            None => 0,
            Some(Personality::PopN) => 1,
            Some(Personality::IidxQe1) => 2,
            Some(Personality::IidxQe2) => 3,
        };
        image[7] = self.buttons.debounce_time_ms;
        image[8] = self.axes[0].debounce_time_ms;
        image[9] = self.axes[0].sustain_time_ms;
        image[10] = self.axes[0].reduction_ratio;
        image[11] = self.axes[1].reduction_ratio;
        image[12] = self.axes[0].deadzone;
        image[13] = self.axes[1].deadzone;

        for chunk in image[14..20].iter_mut() {
            *chunk = 0;
        }
        for i in 0..NUM_BUTTONS {
            let nibble = if self.buttons.remap[i] == i as u8 {
                0
            } else {
                self.buttons.remap[i] + 1
            };
            image[14 + i / 2] |= (nibble & 0xF) << ((i % 2) * 4);
        }

        // Capability bytes are owned by the host tool; disabled slots are
        // derived state and round-trip through the stored image instead.

        image
    }

    /// Copy one opaque write segment into a staged image, verbatim.
    pub fn apply_segment(
        image: &mut [u8; CONFIG_SIZE],
        offset: usize,
        data: &[u8],
    ) -> Result<(), ConfigError> {
        let end = offset
            .checked_add(data.len())
            .ok_or(ConfigError::SegmentOutOfRange)?;
        if end > CONFIG_SIZE {
            return Err(ConfigError::SegmentOutOfRange);
        }
        image[offset..end].copy_from_slice(data);
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_bytes(&DEFAULT_IMAGE)
    }
}

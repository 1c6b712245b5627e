//! Debounced button sampling and report-bit remapping.
//!
//! Inputs are pulled up, so a low level is a press. A level change is
//! committed only once it has been stable past the debounce interval since
//! the previous commit; observing a still-bouncing contact changes neither
//! the committed level nor the debounce timer.

/// Number of physical button inputs on the panel.
pub const NUM_BUTTONS: usize = 12;

/// Button configuration shared by every input of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    /// Debounce interval in milliseconds, shared across all buttons.
    pub debounce_time_ms: u8,
    /// Report bit for each input, already resolved from the packed nibble
    /// form of the persisted image (0 there means identity).
    pub remap: [u8; NUM_BUTTONS],
    /// Inputs claimed by other device capabilities (dedicated light
    /// outputs) report nothing and get no LED feedback.
    pub enabled: [bool; NUM_BUTTONS],
}

impl Default for ButtonConfig {
    fn default() -> Self {
        let mut remap = [0u8; NUM_BUTTONS];
        for (i, slot) in remap.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self {
            debounce_time_ms: 2,
            remap,
            enabled: [true; NUM_BUTTONS],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ButtonState {
    /// Last committed pin level (true = released under pull-up).
    level: bool,
    last_change_ms: u32,
}

/// Debounced sampler for the whole input array. Mutated only from the main
/// loop.
#[derive(Debug)]
pub struct ButtonSampler {
    config: ButtonConfig,
    states: [ButtonState; NUM_BUTTONS],
}

impl ButtonSampler {
    /// Seed committed levels from the pins as read at startup.
    #[must_use]
    pub fn new(config: ButtonConfig, initial_levels: [bool; NUM_BUTTONS], now_ms: u32) -> Self {
        let mut states = [ButtonState {
            level: true,
            last_change_ms: now_ms,
        }; NUM_BUTTONS];
        for (state, &level) in states.iter_mut().zip(initial_levels.iter()) {
            state.level = level;
        }
        Self { config, states }
    }

    /// Sample all inputs for one tick and return the remapped button mask.
    pub fn sample(&mut self, raw_levels: &[bool; NUM_BUTTONS], now_ms: u32) -> u16 {
        let debounce = u32::from(self.config.debounce_time_ms);
        let mut mask = 0u16;

        for i in 0..NUM_BUTTONS {
            if !self.config.enabled[i] {
                continue;
            }
            let state = &mut self.states[i];

            if raw_levels[i] != state.level
                && now_ms.wrapping_sub(state.last_change_ms) >= debounce
            {
                state.level = raw_levels[i];
                state.last_change_ms = now_ms;
            }

            // The reported state is always the committed one.
            if !state.level {
                mask |= 1 << self.config.remap[i];
            }
        }

        mask
    }

    /// Committed press state for LED feedback. Disabled inputs are never
    /// pressed.
    #[inline]
    #[must_use]
    pub fn is_pressed(&self, index: usize) -> bool {
        self.config.enabled[index] && !self.states[index].level
    }

    /// Committed press state of every input in physical order, for lamp
    /// feedback. Remapping moves report bits, never lamps.
    #[must_use]
    pub fn pressed_mask(&self) -> u16 {
        let mut mask = 0u16;
        for i in 0..NUM_BUTTONS {
            if self.is_pressed(i) {
                mask |= 1 << i;
            }
        }
        mask
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self, index: usize) -> bool {
        self.config.enabled[index]
    }
}

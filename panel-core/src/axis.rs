//! Per-axis direction state machine.
//!
//! Turns the noisy raw position of an [`AxisSource`](crate::source::AxisSource)
//! into a stable ternary direction plus a 128-centered report byte. The
//! machine commits a new reference position only when motion exceeds the
//! configured deadzone angle from rest, and holds a detected direction for
//! the sustain time after motion pauses so a spinning turntable does not
//! flicker between pressed and released.

use fixed::types::I48F16;

/// Degrees with 1/65536° resolution. The wide integer part keeps a
/// whole-revolution delta on the largest configurable modulus in range.
type Degrees = I48F16;

/// Per-axis configuration, loaded once at startup and immutable afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisConfig {
    /// Reserved; the deadzone gate supersedes a separate axis debounce, but
    /// the field stays in the persisted image.
    pub debounce_time_ms: u8,
    /// How long a direction stays asserted after motion pauses.
    pub sustain_time_ms: u8,
    /// Position coarsening factor; 0 disables reduction.
    pub reduction_ratio: u8,
    /// Deadzone in configuration units; the effective angle is half this.
    pub deadzone: u8,
    /// Report scaling code. Negative divides, positive multiplies, zero is
    /// identity; −127/−126/−125 select 600/400/360 CPR encoders instead.
    pub sensitivity: i8,
}

/// One full modular revolution for the given sensitivity code, at x4
/// quadrature multiplication for the fixed-CPR sentinels.
#[must_use]
pub const fn max_count_for(sensitivity: i8) -> u32 {
    match sensitivity {
        -127 => 600 * 4,
        -126 => 400 * 4,
        -125 => 360 * 4,
        s if s < 0 => 256 * (-(s as i32)) as u32,
        _ => 256,
    }
}

/// Coarsen a raw sample by the reduction step width. Ratio 0 is the
/// identity; any positive ratio is idempotent on already-reduced values.
#[inline]
#[must_use]
pub const fn reduce(raw: u32, ratio: u8) -> u32 {
    if ratio == 0 {
        return raw;
    }
    let width = 2 * ratio as u32 + 1;
    (raw / width) * width
}

/// Stabilized motion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    #[default]
    Idle,
    MovingPositive,
    SustainPositive,
    MovingNegative,
    SustainNegative,
}

impl Direction {
    /// Ternary direction: +1 for the positive pair, −1 for the negative
    /// pair, 0 at rest.
    #[inline]
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Direction::Idle => 0,
            Direction::MovingPositive | Direction::SustainPositive => 1,
            Direction::MovingNegative | Direction::SustainNegative => -1,
        }
    }
}

/// Result of one processing tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub struct AxisOutput {
    pub direction: Direction,
    /// Scaled, 128-centered report byte.
    pub value: u8,
}

/// Direction state machine for one axis. Mutated only from the main loop.
#[derive(Debug)]
pub struct AxisProcessor {
    config: AxisConfig,
    max_count: u32,
    deadzone_angle: Degrees,
    last_committed: u32,
    direction: Direction,
    sustain_started_ms: u32,
}

impl AxisProcessor {
    #[must_use]
    pub fn new(config: AxisConfig) -> Self {
        Self::with_max_count(config, max_count_for(config.sensitivity))
    }

    /// Processor over an explicit modulus, for sources whose range is set by
    /// the hardware (an 8-bit analog sweep) rather than by the sensitivity
    /// code. Report scaling still honors the configured sensitivity.
    #[must_use]
    pub fn with_max_count(config: AxisConfig, max_count: u32) -> Self {
        Self {
            config,
            max_count,
            deadzone_angle: Degrees::from_num(config.deadzone) / 2,
            last_committed: 0,
            direction: Direction::Idle,
            sustain_started_ms: 0,
        }
    }

    #[must_use]
    pub const fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Run one tick: reduction, wrap-corrected delta, deadzone gate, the
    /// direction transition, then report scaling.
    pub fn process(&mut self, raw: u32, now_ms: u32) -> AxisOutput {
        let reduced = reduce(raw, self.config.reduction_ratio);

        let mut delta = reduced as i32 - self.last_committed as i32;
        // Forward wrap through zero: the committed position sits in the top
        // half and the new sample in the lowest quarter. The encoder
        // convention only wraps forward, so no mirror-image correction.
        if self.last_committed > self.max_count / 2 && reduced < self.max_count / 4 {
            delta += self.max_count as i32;
        }

        let delta_angle = Degrees::from_num(delta * 360) / Degrees::from_num(self.max_count);
        let deadzone = self.deadzone_angle;
        let sustain = u32::from(self.config.sustain_time_ms);

        match self.direction {
            Direction::Idle => {
                if delta > 0 && delta_angle >= deadzone {
                    self.last_committed = reduced;
                    self.direction = Direction::MovingPositive;
                } else if delta < 0 && delta_angle <= -deadzone {
                    self.last_committed = reduced;
                    self.direction = Direction::MovingNegative;
                }
            }
            Direction::MovingPositive => {
                if delta == 0 {
                    self.sustain_started_ms = now_ms;
                    self.last_committed = reduced;
                    self.direction = Direction::SustainPositive;
                } else if delta < 0 && delta_angle <= -deadzone {
                    self.last_committed = reduced;
                    self.direction = Direction::MovingNegative;
                } else if delta > 0 {
                    self.last_committed = reduced;
                }
            }
            Direction::SustainPositive => {
                if delta <= 0 && now_ms.wrapping_sub(self.sustain_started_ms) > sustain {
                    self.last_committed = reduced;
                    self.direction = Direction::Idle;
                } else if delta > 0 {
                    self.last_committed = reduced;
                    self.direction = Direction::MovingPositive;
                } else if delta < 0 && delta_angle <= -deadzone {
                    self.last_committed = reduced;
                    self.direction = Direction::MovingNegative;
                }
            }
            Direction::MovingNegative => {
                if delta == 0 {
                    self.sustain_started_ms = now_ms;
                    self.last_committed = reduced;
                    self.direction = Direction::SustainNegative;
                } else if delta > 0 && delta_angle >= deadzone {
                    self.last_committed = reduced;
                    self.direction = Direction::MovingPositive;
                } else if delta < 0 {
                    self.last_committed = reduced;
                }
            }
            Direction::SustainNegative => {
                if delta >= 0 && now_ms.wrapping_sub(self.sustain_started_ms) > sustain {
                    self.last_committed = reduced;
                    self.direction = Direction::Idle;
                } else if delta < 0 {
                    self.last_committed = reduced;
                    self.direction = Direction::MovingNegative;
                } else if delta > 0 && delta_angle >= deadzone {
                    self.last_committed = reduced;
                    self.direction = Direction::MovingPositive;
                }
            }
        }

        AxisOutput {
            direction: self.direction,
            value: self.report_value(),
        }
    }

    /// Scale the committed position and center it on the report midpoint.
    /// Sensitivity codes outside the documented set keep the identity
    /// behavior; existing host tools rely on that.
    fn report_value(&self) -> u8 {
        let committed = self.last_committed;
        let scaled = match self.config.sensitivity {
            -127 => committed * 256 / (600 * 4),
            -126 => committed * 256 / (400 * 4),
            -125 => committed * 256 / (360 * 4),
            s if s < 0 => committed / (-(s as i32)) as u32,
            s if s > 0 => committed.wrapping_mul(s as u32),
            _ => committed,
        };
        scaled.wrapping_sub(128) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(config: AxisConfig) -> AxisProcessor {
        AxisProcessor::new(config)
    }

    #[test]
    fn reduction_zero_is_identity() {
        for raw in [0u32, 1, 17, 255, 2399] {
            assert_eq!(reduce(raw, 0), raw);
        }
    }

    #[test]
    fn reduction_is_idempotent() {
        for ratio in 1..=8u8 {
            for raw in [0u32, 1, 100, 999, 2399] {
                let once = reduce(raw, ratio);
                assert_eq!(reduce(once, ratio), once);
            }
        }
    }

    #[test]
    fn max_count_codes() {
        assert_eq!(max_count_for(-127), 2400);
        assert_eq!(max_count_for(-126), 1600);
        assert_eq!(max_count_for(-125), 1440);
        assert_eq!(max_count_for(-4), 1024);
        assert_eq!(max_count_for(0), 256);
        assert_eq!(max_count_for(3), 256);
    }

    #[test]
    fn small_motion_inside_deadzone_stays_idle() {
        // Deadzone 4 config units = 2 degrees; one count on a 256-count
        // revolution is about 1.4 degrees.
        let mut p = processor(AxisConfig {
            deadzone: 4,
            ..AxisConfig::default()
        });
        for raw in [1u32, 1, 1, 0, 1] {
            let out = p.process(raw, 0);
            assert_eq!(out.direction, Direction::Idle);
            // Reference position never commits: the report stays centered.
            assert_eq!(out.value, 128);
        }
    }

    #[test]
    fn motion_past_deadzone_commits() {
        let mut p = processor(AxisConfig {
            deadzone: 4,
            ..AxisConfig::default()
        });
        let out = p.process(2, 0); // 2.8 degrees > 2
        assert_eq!(out.direction, Direction::MovingPositive);
        assert_eq!(out.value, 2u8.wrapping_sub(128));
    }

    #[test]
    fn forward_wrap_is_a_small_positive_motion() {
        let mut p = processor(AxisConfig::default()); // max_count 256
        assert_eq!(p.process(200, 0).direction, Direction::MovingPositive);
        // 200 -> 10 through zero: delta = 10 - 200 + 256 = 66, still forward.
        let out = p.process(10, 1);
        assert_eq!(out.direction, Direction::MovingPositive);
        assert_eq!(out.value, 10u8.wrapping_sub(128));
    }

    #[test]
    fn no_backward_wrap_correction() {
        // Mirror image of the forward wrap: 10 -> 200 reads as a large
        // positive delta, not a backward wrap. Preserved behavior.
        let mut p = processor(AxisConfig::default());
        p.process(10, 0);
        assert_eq!(p.process(200, 1).direction, Direction::MovingPositive);
    }

    #[test]
    fn explicit_modulus_overrides_sensitivity() {
        // An 8-bit analog source always sweeps 0..=255, whatever count the
        // sensitivity code implies for encoders.
        let mut p = AxisProcessor::with_max_count(
            AxisConfig {
                sensitivity: -127,
                ..AxisConfig::default()
            },
            256,
        );
        assert_eq!(p.max_count(), 256);
        assert_eq!(p.process(250, 0).direction, Direction::MovingPositive);
        // 250 -> 5 through zero: delta = 5 - 250 + 256 = 11, still forward.
        assert_eq!(p.process(5, 1).direction, Direction::MovingPositive);
    }

    #[test]
    fn whole_revolution_jump_on_large_modulus() {
        // sensitivity -100 gives a 25600-count revolution; a near-full-turn
        // jump in a single tick must not trip the fixed-point angle math.
        let mut p = processor(AxisConfig {
            sensitivity: -100,
            deadzone: 4,
            ..AxisConfig::default()
        });
        let out = p.process(24000, 0);
        assert_eq!(out.direction, Direction::MovingPositive);
        assert_eq!(out.value, 112); // 24000 * 256 / 25600 = 240, centered
    }

    #[test]
    fn sustain_holds_direction_then_releases() {
        let mut p = processor(AxisConfig {
            sustain_time_ms: 10,
            ..AxisConfig::default()
        });
        assert_eq!(p.process(5, 0).direction, Direction::MovingPositive);
        // Motion pauses: sustain starts.
        assert_eq!(p.process(5, 1).direction, Direction::SustainPositive);
        assert_eq!(p.process(5, 6).direction.sign(), 1);
        assert_eq!(p.process(5, 11).direction.sign(), 1);
        // Past the sustain window the direction drops.
        assert_eq!(p.process(5, 12).direction, Direction::Idle);
    }

    #[test]
    fn new_motion_restarts_sustain_clock() {
        let mut p = processor(AxisConfig {
            sustain_time_ms: 10,
            ..AxisConfig::default()
        });
        p.process(5, 0);
        assert_eq!(p.process(5, 1).direction, Direction::SustainPositive);
        // More forward motion near the end of the window...
        assert_eq!(p.process(8, 9).direction, Direction::MovingPositive);
        // ...then a fresh pause: the clock restarts from here.
        assert_eq!(p.process(8, 10).direction, Direction::SustainPositive);
        assert_eq!(p.process(8, 19).direction.sign(), 1);
        assert_eq!(p.process(8, 21).direction, Direction::Idle);
    }

    #[test]
    fn reversal_must_exceed_deadzone() {
        let mut p = processor(AxisConfig {
            deadzone: 4, // 2 degrees, about 1.4 counts at 256/rev
            ..AxisConfig::default()
        });
        assert_eq!(p.process(10, 0).direction, Direction::MovingPositive);
        // One count backwards is inside the deadzone: direction holds.
        assert_eq!(p.process(9, 1).direction, Direction::MovingPositive);
        // Two counts backwards exceeds it.
        assert_eq!(p.process(7, 2).direction, Direction::MovingNegative);
    }

    #[test]
    fn fixed_cpr_sentinel_scaling() {
        let mut p = processor(AxisConfig {
            sensitivity: -127,
            ..AxisConfig::default()
        });
        // Half a 2400-count revolution scales to half of the byte range.
        let out = p.process(1200, 0);
        assert_eq!(out.value, 0); // 1200 * 256 / 2400 - 128
    }

    #[test]
    fn divide_and_multiply_scaling() {
        let mut p = processor(AxisConfig {
            sensitivity: -2, // max_count 512
            ..AxisConfig::default()
        });
        assert_eq!(p.process(300, 0).value, (150u32.wrapping_sub(128)) as u8);

        let mut p = processor(AxisConfig {
            sensitivity: 3,
            ..AxisConfig::default()
        });
        assert_eq!(p.process(10, 0).value, 30u8.wrapping_sub(128));
    }

    #[test]
    fn sustain_survives_tick_wraparound() {
        let mut p = processor(AxisConfig {
            sustain_time_ms: 10,
            ..AxisConfig::default()
        });
        p.process(5, u32::MAX - 5);
        assert_eq!(
            p.process(5, u32::MAX - 4).direction,
            Direction::SustainPositive
        );
        // Tick counter wraps inside the sustain window.
        assert_eq!(p.process(5, 2).direction.sign(), 1);
        assert_eq!(p.process(5, 7).direction, Direction::Idle);
    }
}

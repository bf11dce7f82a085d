//! Tunable configuration of the matrix engine.
//!
//! The whole [`EcConfig`] can be replaced at any time with
//! [`crate::matrix::EcMatrix::update_config`], the noise floor is kept.
use ecsm_types::threshold::ActuationProfile;

use crate::calibration::{DEFAULT_BOTTOMING_MARGIN, DEFAULT_NOISE_FLOOR_ROUNDS, DEFAULT_NOISE_FLOOR_ROUND_DELAY_MS};
use crate::driver::DEFAULT_DISCHARGE_TIME_US;

/// Default static actuation level
pub const DEFAULT_ACTUATION_THRESHOLD: u16 = 550;
/// Default static release level
pub const DEFAULT_RELEASE_THRESHOLD: u16 = 500;

/// Config of the electro-capacitive matrix
#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EcConfig<const ROW: usize, const COL: usize> {
    /// Actuation and release references of each key
    pub profiles: [[ActuationProfile; COL]; ROW],
    /// Per-key gain in 1/64 steps, 0 disables the gain stage
    pub gains: [[u8; COL]; ROW],
    /// Capacitor discharge wait after each read, in microseconds
    pub discharge_time_us: u16,
    /// Added to the highest rest reading to form the deadzone
    pub deadzone_offset: u16,
    /// Sampling rounds of the noise floor calibration
    pub noise_floor_rounds: u16,
    /// Pause between two noise floor rounds, in milliseconds
    pub noise_floor_round_delay_ms: u32,
    /// Distance above the noise floor a reading needs to count as a bottom-out candidate
    pub bottoming_margin: u16,
}

impl<const ROW: usize, const COL: usize> Default for EcConfig<ROW, COL> {
    fn default() -> Self {
        Self::with_profile(ActuationProfile::fixed(DEFAULT_ACTUATION_THRESHOLD, DEFAULT_RELEASE_THRESHOLD))
    }
}

impl<const ROW: usize, const COL: usize> EcConfig<ROW, COL> {
    /// Config which applies the same profile to every key
    pub fn with_profile(profile: ActuationProfile) -> Self {
        Self {
            profiles: [[profile; COL]; ROW],
            gains: [[0; COL]; ROW],
            discharge_time_us: DEFAULT_DISCHARGE_TIME_US,
            deadzone_offset: 0,
            noise_floor_rounds: DEFAULT_NOISE_FLOOR_ROUNDS,
            noise_floor_round_delay_ms: DEFAULT_NOISE_FLOOR_ROUND_DELAY_MS,
            bottoming_margin: DEFAULT_BOTTOMING_MARGIN,
        }
    }

    pub fn profile(&self, row: usize, col: usize) -> &ActuationProfile {
        &self.profiles[row][col]
    }

    /// Apply the per-key gain to a raw sensor value.
    pub fn calibrate_value(&self, row: usize, col: usize, raw: u16) -> u16 {
        apply_gain(self.gains[row][col], raw)
    }
}

/// Scale `raw` by `gain / 64`, gain 0 passes the value through
pub fn apply_gain(gain: u8, raw: u16) -> u16 {
    match gain {
        0 => raw,
        gain => ((raw as u32 * gain as u32) >> 6).min(u16::MAX as u32) as u16,
    }
}

/// Move a gained value from one gain to another
pub(crate) fn regain(value: u16, from: u8, to: u8) -> u16 {
    let raw = match from {
        0 => value as u32,
        from => ((value as u32) << 6) / from as u32,
    };
    apply_gain(to, raw.min(u16::MAX as u32) as u16)
}

//! Per-key calibration records.
//!
//! The noise floor is measured once at boot with the keys at rest. Bottoming-out
//! calibration runs on demand while the user presses every key down fully.
//!
//! Noise floor, amplitude and bottoming depth are kept as raw sensor values, so a new
//! gain table applies to them without measuring again. Deadzone and extremum are
//! compared against gained readings and are kept in gained units.

/// Default number of noise floor sampling rounds
pub const DEFAULT_NOISE_FLOOR_ROUNDS: u16 = 30;
/// Default pause between noise floor rounds, in milliseconds
pub const DEFAULT_NOISE_FLOOR_ROUND_DELAY_MS: u32 = 1;
/// Default distance above the noise floor for a bottom-out candidate
pub const DEFAULT_BOTTOMING_MARGIN: u16 = 32;

/// Calibration record of one key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyCalibration {
    /// Rest level of the key, raw
    pub noise_floor: u16,
    /// Peak to peak variation at rest, raw
    pub noise_amplitude: u16,
    /// Gained readings below the deadzone are treated as rest
    pub deadzone: u16,
    /// Deepest reading while pressed, or shallowest reading while released,
    /// since the last transition
    pub extremum: u16,
    /// Deepest raw reading seen by the bottoming calibration
    pub bottoming_reading: u16,
    /// The next qualifying reading seeds `bottoming_reading`
    pub bottoming_starter: bool,
}

impl KeyCalibration {
    /// Clamp a reading into the range above the deadzone
    #[inline]
    pub fn clamp(&self, reading: u16) -> u16 {
        reading.max(self.deadzone)
    }

    /// Highest raw reading seen at rest
    pub fn rest_ceiling(&self) -> u16 {
        self.noise_floor.saturating_add(self.noise_amplitude / 2)
    }

    /// Derive the deadzone from the measured noise: the highest rest reading, passed
    /// through the key's gain stage `calibrate`, plus `offset`.
    ///
    /// The extremum is lifted to the new deadzone if it sits below it.
    pub fn derive_deadzone(&mut self, offset: u16, calibrate: impl FnOnce(u16) -> u16) {
        self.deadzone = calibrate(self.rest_ceiling()).saturating_add(offset);
        self.extremum = self.clamp(self.extremum);
    }

    /// Make the next qualifying reading the new bottoming reference
    pub fn arm_bottoming(&mut self) {
        self.bottoming_starter = true;
    }

    /// Feed one reading to the bottoming calibration.
    ///
    /// Returns true if `bottoming_reading` changed.
    pub fn record_bottoming(&mut self, reading: u16, margin: u16) -> bool {
        if reading <= self.noise_floor.saturating_add(margin) {
            return false;
        }
        if self.bottoming_starter {
            self.bottoming_starter = false;
            self.bottoming_reading = reading;
            true
        } else if reading > self.bottoming_reading {
            self.bottoming_reading = reading;
            true
        } else {
            false
        }
    }
}

/// Running min/max of rest readings of every key
pub(crate) struct NoiseSampler<const ROW: usize, const COL: usize> {
    min: [[u16; COL]; ROW],
    max: [[u16; COL]; ROW],
}

impl<const ROW: usize, const COL: usize> NoiseSampler<ROW, COL> {
    pub(crate) fn new() -> Self {
        Self {
            min: [[u16::MAX; COL]; ROW],
            max: [[0; COL]; ROW],
        }
    }

    pub(crate) fn sample(&mut self, row: usize, col: usize, reading: u16) {
        let min = &mut self.min[row][col];
        *min = (*min).min(reading);
        let max = &mut self.max[row][col];
        *max = (*max).max(reading);
    }

    /// Write the noise floor and amplitude into `records`.
    pub(crate) fn finish(&self, records: &mut [[KeyCalibration; COL]; ROW]) {
        for (row, cols) in records.iter_mut().enumerate() {
            for (col, record) in cols.iter_mut().enumerate() {
                let (min, max) = (self.min[row][col], self.max[row][col]);
                if min > max {
                    // Never sampled
                    continue;
                }
                record.noise_floor = ((min as u32 + max as u32) / 2) as u16;
                record.noise_amplitude = max - min;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_noise_floor_from_samples() {
        let mut sampler: NoiseSampler<1, 2> = NoiseSampler::new();
        for reading in [100, 104, 96, 101] {
            sampler.sample(0, 0, reading);
        }
        for reading in [40, 41, 39] {
            sampler.sample(0, 1, reading);
        }

        let mut records = [[KeyCalibration::default(); 2]; 1];
        sampler.finish(&mut records);

        assert_eq!(records[0][0].noise_floor, 100);
        assert_eq!(records[0][0].noise_amplitude, 8);
        assert_eq!(records[0][0].rest_ceiling(), 104);
        records[0][0].derive_deadzone(5, |raw| raw);
        assert_eq!(records[0][0].deadzone, 109);
        assert_eq!(records[0][0].extremum, 109);
        assert_eq!(records[0][1].noise_floor, 40);
        assert_eq!(records[0][1].noise_amplitude, 2);
    }

    #[test]
    fn test_deadzone_follows_gain() {
        let mut record = KeyCalibration {
            noise_floor: 100,
            noise_amplitude: 10,
            extremum: 300,
            ..Default::default()
        };
        record.derive_deadzone(4, |raw| raw * 2);
        assert_eq!(record.deadzone, 214);
        assert_eq!(record.extremum, 300);
        record.derive_deadzone(4, |raw| raw * 4);
        assert_eq!(record.deadzone, 424);
        assert_eq!(record.extremum, 424);
        assert_eq!(record.noise_floor, 100);
    }

    #[test]
    fn test_bottoming_keeps_deepest() {
        let mut record = KeyCalibration {
            noise_floor: 100,
            ..Default::default()
        };
        record.arm_bottoming();

        // Inside the margin
        assert!(!record.record_bottoming(132, 32));
        assert!(record.bottoming_starter);

        for reading in [300, 450, 600] {
            assert!(record.record_bottoming(reading, 32));
        }
        assert_eq!(record.bottoming_reading, 600);

        assert!(!record.record_bottoming(500, 32));
        assert_eq!(record.bottoming_reading, 600);
    }

    #[test]
    fn test_bottoming_starter_overrides_previous_depth() {
        let mut record = KeyCalibration {
            noise_floor: 100,
            bottoming_reading: 900,
            ..Default::default()
        };
        record.arm_bottoming();
        assert!(record.record_bottoming(400, 32));
        assert_eq!(record.bottoming_reading, 400);
        assert!(!record.bottoming_starter);
    }
}

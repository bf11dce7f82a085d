use ecsm_types::threshold::KeyProfileUpdate;

use crate::actuation::decide;
use crate::calibration::{KeyCalibration, NoiseSampler};
use crate::config::{EcConfig, regain};
use crate::driver::SensePeripheral;

/// Pressed state of one matrix row, bit `col` set while the key at `col` is pressed.
pub type MatrixRow = u32;

/// Electro-capacitive switch matrix.
///
/// Owns the calibration record of every key and the active configuration.
/// The pressed state itself is kept by the caller as `[MatrixRow; ROW]` and
/// updated in place by [`EcMatrix::scan`].
pub struct EcMatrix<P: SensePeripheral, const ROW: usize, const COL: usize> {
    peripheral: P,
    config: EcConfig<ROW, COL>,
    calibration: [[KeyCalibration; COL]; ROW],
    /// Latest raw value of each key
    raw: [[u16; COL]; ROW],
    /// Route every scan to the bottoming calibration
    bottoming: bool,
    initialized: bool,
}

impl<P: SensePeripheral, const ROW: usize, const COL: usize> EcMatrix<P, ROW, COL> {
    const COL_FITS: () = assert!(COL <= MatrixRow::BITS as usize, "too many columns for a matrix row");

    pub fn new(peripheral: P, config: EcConfig<ROW, COL>) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::COL_FITS;
        Self {
            peripheral,
            config,
            calibration: [[KeyCalibration::default(); COL]; ROW],
            raw: [[0; COL]; ROW],
            bottoming: false,
            initialized: false,
        }
    }

    /// Configure the peripherals and measure the noise floor of every key.
    ///
    /// Keys must be at rest while this runs. Call it once, before the first [`EcMatrix::scan`].
    pub fn init(&mut self) {
        self.peripheral.init();
        self.peripheral.set_discharge_time(self.config.discharge_time_us);
        self.calibrate_noise_floor();
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn calibrate_noise_floor(&mut self) {
        let rounds = self.config.noise_floor_rounds;
        let mut sampler = NoiseSampler::<ROW, COL>::new();
        for round in 0..rounds {
            self.sweep(|_, row, col, raw| sampler.sample(row, col, raw));
            if round + 1 < rounds {
                self.peripheral.delay_ms(self.config.noise_floor_round_delay_ms);
            }
        }
        sampler.finish(&mut self.calibration);
        self.derive_deadzones();
        for cal in self.calibration.iter_mut().flatten() {
            cal.extremum = cal.deadzone;
        }

        info!("Noise floor calibrated with {} rounds", rounds);
        for (row, cols) in self.calibration.iter().enumerate() {
            for (col, cal) in cols.iter().enumerate() {
                trace!(
                    "Key ({}, {}): floor {}, amplitude {}, deadzone {}",
                    row, col, cal.noise_floor, cal.noise_amplitude, cal.deadzone
                );
            }
        }
    }

    fn derive_deadzones(&mut self) {
        let offset = self.config.deadzone_offset;
        for (row, cols) in self.calibration.iter_mut().enumerate() {
            for (col, cal) in cols.iter_mut().enumerate() {
                let config = &self.config;
                cal.derive_deadzone(offset, |raw| config.calibrate_value(row, col, raw));
            }
        }
    }

    /// Visit every key once with its raw reading, multiplexer bank by bank.
    fn sweep(&mut self, mut visit: impl FnMut(&mut Self, usize, usize, u16)) {
        for bank in 0..self.peripheral.bank_count() {
            self.peripheral.disable_unused_multiplexers(bank);
            for col in 0..COL {
                if self.peripheral.bank_of(col) != bank {
                    continue;
                }
                for row in 0..ROW {
                    let reading = self.read_key(row, col);
                    visit(self, row, col, reading);
                }
            }
        }
    }

    fn read_key(&mut self, row: usize, col: usize) -> u16 {
        let raw = self.peripheral.read_raw(row, col);
        self.raw[row][col] = raw;
        raw
    }

    /// Update press/release state of key
    fn update_key(&mut self, current_row: &mut MatrixRow, row: usize, col: usize, raw: u16) -> bool {
        let reading = self.config.calibrate_value(row, col, raw);
        let pressed = (*current_row >> col) & 1 == 1;
        let profile = &self.config.profiles[row][col];
        match decide(&mut self.calibration[row][col], profile, pressed, reading) {
            Some(true) => {
                *current_row |= 1 << col;
                debug!("Key ({}, {}) pressed at {}", row, col, reading);
                true
            }
            Some(false) => {
                *current_row &= !(1 << col);
                debug!("Key ({}, {}) released at {}", row, col, reading);
                true
            }
            None => false,
        }
    }

    /// Scan key values and update matrix state.
    ///
    /// Returns true if any key changed its state. During bottoming calibration the
    /// readings only feed the calibration and the matrix is left untouched.
    pub fn scan(&mut self, current_matrix: &mut [MatrixRow; ROW]) -> bool {
        let mut updated = false;
        if self.bottoming {
            let margin = self.config.bottoming_margin;
            self.sweep(|this, row, col, reading| {
                if this.calibration[row][col].record_bottoming(reading, margin) {
                    trace!("Key ({}, {}) bottoms out at {}", row, col, reading);
                }
            });
        } else {
            self.sweep(|this, row, col, reading| {
                updated |= this.update_key(&mut current_matrix[row], row, col, reading);
            });
        }
        updated
    }

    /// Start measuring the bottom-out depth of every key.
    pub fn enter_bottoming_calibration(&mut self) {
        for cal in self.calibration.iter_mut().flatten() {
            cal.arm_bottoming();
        }
        self.bottoming = true;
        info!("Enter bottoming calibration");
    }

    /// Go back to normal scanning.
    pub fn exit_bottoming_calibration(&mut self) {
        self.bottoming = false;
        info!("Exit bottoming calibration");
    }

    pub fn is_bottoming(&self) -> bool {
        self.bottoming
    }

    /// Replace the active configuration.
    ///
    /// The noise floor is kept, deadzones are re-derived with the new offset and gains.
    /// Extrema of keys whose gain changed are moved to the new gain.
    pub fn update_config(&mut self, config: EcConfig<ROW, COL>) {
        let old_gains = core::mem::replace(&mut self.config, config).gains;
        self.peripheral.set_discharge_time(self.config.discharge_time_us);
        if self.initialized {
            for (row, cols) in self.calibration.iter_mut().enumerate() {
                for (col, cal) in cols.iter_mut().enumerate() {
                    let (from, to) = (old_gains[row][col], self.config.gains[row][col]);
                    if from != to {
                        cal.extremum = regain(cal.extremum, from, to);
                    }
                }
            }
            self.derive_deadzones();
        }
        debug!("Matrix config updated");
    }

    /// Replace the profile of a single key
    pub fn apply_profile_update(&mut self, update: KeyProfileUpdate) {
        let (row, col) = (update.row as usize, update.col as usize);
        if row >= ROW || col >= COL {
            warn!("Ignore profile update of ({}, {}), outside the matrix", row, col);
            return;
        }
        self.config.profiles[row][col] = update.profile;
    }

    /// Decode a postcard encoded [`KeyProfileUpdate`] and apply it
    pub fn apply_encoded_profile_update(&mut self, frame: &[u8]) -> Result<(), postcard::Error> {
        let update: KeyProfileUpdate = postcard::from_bytes(frame)?;
        self.apply_profile_update(update);
        Ok(())
    }

    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }

    pub fn config(&self) -> &EcConfig<ROW, COL> {
        &self.config
    }

    pub fn calibration(&self, row: usize, col: usize) -> &KeyCalibration {
        &self.calibration[row][col]
    }

    /// Deepest raw reading of the key seen by the bottoming calibration
    pub fn bottoming_reading(&self, row: usize, col: usize) -> u16 {
        self.calibration[row][col].bottoming_reading
    }

    pub fn raw_value(&self, row: usize, col: usize) -> u16 {
        self.raw[row][col]
    }

    /// Gain corrected value of the latest reading
    pub fn calibrated_value(&self, row: usize, col: usize) -> u16 {
        self.config.calibrate_value(row, col, self.raw[row][col])
    }
}

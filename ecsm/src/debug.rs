//! Diagnostic dump of the matrix values.
//!
//! Plain comma separated tables for external tooling, one section per value kind.
//! Not an authoritative interface, the layout may change.
use core::fmt::{Result, Write};

use crate::driver::SensePeripheral;
use crate::matrix::EcMatrix;

/// Raw readings at or below this level are too weak to derive a gain from
const GAIN_SUGGESTION_FLOOR: u16 = 0x60;

impl<P: SensePeripheral, const ROW: usize, const COL: usize> EcMatrix<P, ROW, COL> {
    /// Write raw, calibration and calibrated values of every key to `out`.
    pub fn dump<W: Write>(&self, out: &mut W) -> Result {
        Self::write_table(out, "raw_values", |row, col| self.raw_value(row, col))?;
        Self::write_table(out, "gain_values", |row, col| self.config().gains[row][col] as u16)?;
        Self::write_table(out, "calibrated_values", |row, col| self.calibrated_value(row, col))?;
        Self::write_table(out, "noise_floor", |row, col| self.calibration(row, col).noise_floor)?;
        Self::write_table(out, "noise_amplitude", |row, col| {
            self.calibration(row, col).noise_amplitude
        })?;
        Self::write_table(out, "deadzone", |row, col| self.calibration(row, col).deadzone)?;
        Self::write_table(out, "bottoming", |row, col| self.bottoming_reading(row, col))?;
        Self::write_table(out, "suggested_gain", |row, col| self.suggested_gain(row, col) as u16)
    }

    /// Gain which brings the key's latest raw reading up to the strongest raw reading of
    /// the matrix. Meant to replace the gain table, so the current gains are ignored.
    ///
    /// Returns 0 when the reading is too weak, for example a key which isn't pressed.
    pub fn suggested_gain(&self, row: usize, col: usize) -> u8 {
        let value = self.raw_value(row, col);
        if value <= GAIN_SUGGESTION_FLOOR {
            return 0;
        }
        let max = (0..ROW)
            .flat_map(|r| (0..COL).map(move |c| (r, c)))
            .map(|(r, c)| self.raw_value(r, c))
            .max()
            .unwrap_or(value);
        let ratio = ((max as u32) << 6) / value as u32;
        ratio.min(0xff) as u8
    }

    fn write_table<W: Write>(out: &mut W, name: &str, value: impl Fn(usize, usize) -> u16) -> Result {
        writeln!(out, "{}:", name)?;
        for row in 0..ROW {
            for col in 0..COL {
                if col > 0 {
                    out.write_char(',')?;
                }
                write!(out, "{:4}", value(row, col))?;
            }
            out.write_char('\n')?;
        }
        out.write_char('\n')
    }
}

//! Peripheral sequencing of the electro-capacitive sense circuit.
//!
//! One read drives a row line, lets the sense capacitor charge through the selected key,
//! samples the peak-hold voltage with the ADC, and discharges the capacitor again.
//! No decision policy lives here.
pub(crate) mod gpio;
pub mod mux;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use self::mux::{ChannelMap, MuxBank};

/// Default time to wait for the sense capacitor to discharge fully, in microseconds.
pub const DEFAULT_DISCHARGE_TIME_US: u16 = 10;

/// One-shot ADC conversion on the shared sense input.
pub trait SenseAdc {
    fn read(&mut self) -> u16;
}

impl<F: FnMut() -> u16> SenseAdc for F {
    fn read(&mut self) -> u16 {
        self()
    }
}

/// The hardware seam of the matrix engine.
///
/// [`SenseDriver`] implements it for real boards. Anything else which produces one reading
/// per (row, col), for example a recorded trace, can drive the engine as well.
pub trait SensePeripheral {
    /// Configure pins and start the converter.
    fn init(&mut self);

    /// Set the capacitor discharge wait used after each read.
    fn set_discharge_time(&mut self, us: u16);

    /// Number of multiplexer banks, the outer loop of a scan.
    fn bank_count(&self) -> usize;

    /// The multiplexer bank which carries `col`.
    fn bank_of(&self, col: usize) -> usize;

    /// Hold every bank except `active` disabled.
    fn disable_unused_multiplexers(&mut self, active: usize);

    /// Acquire one raw sensor value.
    fn read_raw(&mut self, row: usize, col: usize) -> u16;

    /// Blocking wait used between calibration rounds.
    fn delay_ms(&mut self, ms: u32);
}

/// Electro-capacitive sense driver.
///
/// Generic parameters are in order: output pin type, ADC, delay provider, number of rows,
/// number of columns, number of multiplexers and number of multiplexer select lines.
pub struct SenseDriver<
    Out: OutputPin,
    A: SenseAdc,
    D: DelayNs,
    const ROW: usize,
    const COL: usize,
    const MUX: usize,
    const SEL: usize,
> {
    /// Row strobe lines
    row_pins: [Out; ROW],
    /// Open-drain line holding the peak-hold capacitor discharged while low
    discharge_pin: Out,
    mux: MuxBank<Out, MUX, SEL>,
    channel_map: ChannelMap<COL, MUX, SEL>,
    adc: A,
    delay: D,
    discharge_time_us: u16,
}

impl<Out: OutputPin, A: SenseAdc, D: DelayNs, const ROW: usize, const COL: usize, const MUX: usize, const SEL: usize>
    SenseDriver<Out, A, D, ROW, COL, MUX, SEL>
{
    pub fn new(
        row_pins: [Out; ROW],
        discharge_pin: Out,
        mux: MuxBank<Out, MUX, SEL>,
        channel_map: ChannelMap<COL, MUX, SEL>,
        adc: A,
        delay: D,
    ) -> Self {
        Self {
            row_pins,
            discharge_pin,
            mux,
            channel_map,
            adc,
            delay,
            discharge_time_us: DEFAULT_DISCHARGE_TIME_US,
        }
    }

    fn discharge_capacitor(&mut self) {
        self.discharge_pin.set_low().ok();
    }

    fn charge_capacitor(&mut self, row: usize) {
        self.discharge_pin.set_high().ok();
        self.row_pins[row].set_high().ok();
    }
}

impl<Out: OutputPin, A: SenseAdc, D: DelayNs, const ROW: usize, const COL: usize, const MUX: usize, const SEL: usize>
    SensePeripheral for SenseDriver<Out, A, D, ROW, COL, MUX, SEL>
{
    fn init(&mut self) {
        self.discharge_capacitor();
        for pin in self.row_pins.iter_mut() {
            pin.set_low().ok();
        }
        self.mux.init_select();
        self.mux.enable_all();
        // The first conversion only powers the converter up
        let _ = self.adc.read();
    }

    fn set_discharge_time(&mut self, us: u16) {
        self.discharge_time_us = us;
    }

    fn bank_count(&self) -> usize {
        MUX
    }

    fn bank_of(&self, col: usize) -> usize {
        self.channel_map.get(col).mux as usize
    }

    fn disable_unused_multiplexers(&mut self, active: usize) {
        self.mux.disable_unused_multiplexers(active);
    }

    fn read_raw(&mut self, row: usize, col: usize) -> u16 {
        let route = self.channel_map.get(col);
        self.mux.select_channel(route.mux as usize, route.channel);

        // Ghost prevention, the row must start from low
        self.row_pins[row].set_low().ok();
        // The charge curve is timing dependent, nothing may run between charging and sampling
        let value = critical_section::with(|_| {
            self.charge_capacitor(row);
            self.adc.read()
        });
        self.discharge_capacitor();
        self.delay.delay_us(self.discharge_time_us as u32);

        value
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

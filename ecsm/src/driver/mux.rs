//! Analog multiplexer banks.
//!
//! Every column sense line reaches the single ADC input through one of `MUX` analog
//! multiplexers (74HC4051 style). All multiplexers share the `SEL` channel select lines
//! and each one has its own low-active enable line.
use ecsm_types::channel::ColumnChannel;
use embedded_hal::digital::OutputPin;

use super::gpio::OutputController;

/// Column to multiplexer channel map.
///
/// Build it in a `const` item, then an inconsistent map fails the build instead of
/// misrouting a column at runtime.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMap<const COL: usize, const MUX: usize, const SEL: usize> {
    columns: [ColumnChannel; COL],
}

impl<const COL: usize, const MUX: usize, const SEL: usize> ChannelMap<COL, MUX, SEL> {
    pub const fn new(columns: [ColumnChannel; COL]) -> Self {
        assert!(MUX > 0, "at least one multiplexer is required");
        assert!(SEL < 8, "too many select lines");
        let mut i = 0;
        while i < COL {
            assert!((columns[i].mux as usize) < MUX, "column routed to a missing multiplexer");
            assert!(
                (columns[i].channel as usize) < (1 << SEL),
                "channel not addressable by the select lines"
            );
            i += 1;
        }
        Self { columns }
    }

    /// Map columns `0..COL` onto consecutive channels, filling multiplexer 0 first.
    pub const fn sequential() -> Self {
        let mut columns = [ColumnChannel::new(0, 0); COL];
        let mut i = 0;
        while i < COL {
            columns[i] = ColumnChannel::new((i >> SEL) as u8, (i & ((1 << SEL) - 1)) as u8);
            i += 1;
        }
        Self::new(columns)
    }

    pub fn get(&self, col: usize) -> ColumnChannel {
        self.columns[col]
    }
}

/// A group of multiplexers sharing their select lines.
pub struct MuxBank<Out: OutputPin, const MUX: usize, const SEL: usize> {
    select: [OutputController<Out>; SEL],
    enable: [OutputController<Out>; MUX],
}

impl<Out: OutputPin, const MUX: usize, const SEL: usize> MuxBank<Out, MUX, SEL> {
    /// Create a bank from the select lines (bit 0 first) and the low-active enable lines.
    pub fn new(select_pins: [Out; SEL], enable_pins: [Out; MUX]) -> Self {
        Self {
            select: select_pins.map(|p| OutputController::new(p, false)),
            enable: enable_pins.map(|p| OutputController::new(p, true)),
        }
    }

    /// Park all select lines low.
    pub fn init_select(&mut self) {
        for pin in self.select.iter_mut() {
            pin.deactivate();
        }
    }

    pub fn enable_all(&mut self) {
        for en in self.enable.iter_mut() {
            en.activate();
        }
    }

    /// Route `channel` of multiplexer `mux` to the ADC.
    ///
    /// The multiplexer is disabled while the select lines move, so no intermediate
    /// channel is connected to the sense line.
    pub fn select_channel(&mut self, mux: usize, channel: u8) {
        self.enable[mux].deactivate();
        for (bit, pin) in self.select.iter_mut().enumerate() {
            pin.set_active(channel & (1 << bit) != 0);
        }
        self.enable[mux].activate();
    }

    /// Disable every multiplexer except `active`.
    pub fn disable_unused_multiplexers(&mut self, active: usize) {
        for (idx, en) in self.enable.iter_mut().enumerate() {
            if idx != active {
                en.deactivate();
            }
        }
    }
}

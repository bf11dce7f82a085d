use embedded_hal::digital::OutputPin;

/// The gpio driver is a wrapper for the embedded-hal digital output pin trait.
///
/// It wraps the low-active and high-active pins, so that callers only talk about
/// "active" and "inactive" lines. Analog multiplexer enable inputs are usually low-active.
pub(crate) struct OutputController<P: OutputPin> {
    pin: P,
    low_active: bool,
}

impl<P: OutputPin> OutputController<P> {
    /// Create a new OutputController instance
    pub fn new(pin: P, low_active: bool) -> Self {
        Self { pin, low_active }
    }

    /// Activate the GPIO pin
    pub fn activate(&mut self) {
        if self.low_active {
            self.pin.set_low().ok();
        } else {
            self.pin.set_high().ok();
        }
    }

    /// Deactivate the GPIO pin
    pub fn deactivate(&mut self) {
        if self.low_active {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
    }

    /// Drive the pin to the given logical level
    pub fn set_active(&mut self, active: bool) {
        if active {
            self.activate();
        } else {
            self.deactivate();
        }
    }
}

//! Input device module
//!
//! This module defines the [`InputDevice`] trait and [`EcMatrixDevice`], which turns the
//! bitmask produced by [`EcMatrix::scan`] into a stream of [`KeyboardEvent`]s for the
//! keymap layers.
use embassy_time::{Duration, Timer};
use heapless::Deque;

use crate::driver::SensePeripheral;
use crate::event::KeyboardEvent;
use crate::matrix::{EcMatrix, MatrixRow};

/// Default pause between two scans which found no change
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(500);

const PENDING_EVENT_NUM: usize = 32;

/// The trait for input devices.
#[allow(async_fn_in_trait)]
pub trait InputDevice {
    /// Read the raw input event
    async fn read_event(&mut self) -> KeyboardEvent;
}

/// [`EcMatrix`] wrapped as an [`InputDevice`]
pub struct EcMatrixDevice<P: SensePeripheral, const ROW: usize, const COL: usize> {
    matrix: EcMatrix<P, ROW, COL>,
    /// Matrix state after the last scan
    state: [MatrixRow; ROW],
    pending: Deque<KeyboardEvent, PENDING_EVENT_NUM>,
    poll_interval: Duration,
}

impl<P: SensePeripheral, const ROW: usize, const COL: usize> EcMatrixDevice<P, ROW, COL> {
    /// Create the device. The matrix is initialised on the first read if that didn't happen yet.
    pub fn new(matrix: EcMatrix<P, ROW, COL>, poll_interval: Duration) -> Self {
        Self {
            matrix,
            state: [0; ROW],
            pending: Deque::new(),
            poll_interval,
        }
    }

    pub fn matrix(&self) -> &EcMatrix<P, ROW, COL> {
        &self.matrix
    }

    /// Mutable access, used to toggle bottoming calibration or update the config
    pub fn matrix_mut(&mut self) -> &mut EcMatrix<P, ROW, COL> {
        &mut self.matrix
    }

    /// Snapshot of the matrix state
    pub fn state(&self) -> [MatrixRow; ROW] {
        self.state
    }

    fn enqueue_changes(&mut self, previous: &[MatrixRow; ROW]) {
        for (row, (old, new)) in previous.iter().zip(self.state.iter()).enumerate() {
            let changed = old ^ new;
            for col in 0..COL {
                if (changed >> col) & 1 == 0 {
                    continue;
                }
                let event = KeyboardEvent::key(row as u8, col as u8, (new >> col) & 1 == 1);
                if let Err(event) = self.pending.push_back(event) {
                    warn!("Key event queue full, drop the oldest event");
                    let _ = self.pending.pop_front();
                    let _ = self.pending.push_back(event);
                }
            }
        }
    }
}

impl<P: SensePeripheral, const ROW: usize, const COL: usize> InputDevice for EcMatrixDevice<P, ROW, COL> {
    async fn read_event(&mut self) -> KeyboardEvent {
        if !self.matrix.is_initialized() {
            self.matrix.init();
        }

        loop {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }

            let previous = self.state;
            if self.matrix.scan(&mut self.state) {
                self.enqueue_changes(&previous);
            } else {
                Timer::after(self.poll_interval).await;
            }
        }
    }
}

#![allow(dead_code)]

use std::collections::VecDeque;
use std::vec::Vec;

use ecsm::{EcConfig, EcMatrix, SensePeripheral};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Peripheral which replays scripted readings.
///
/// Each key returns its scripted readings in order, then its rest value forever.
pub struct ScriptedSensor<const ROW: usize, const COL: usize> {
    pub rest: [[u16; COL]; ROW],
    pub script: [[VecDeque<u16>; COL]; ROW],
    /// Multiplexer bank of each column
    pub banks: [usize; COL],
    pub bank_count: usize,
    /// Every (row, col) read, in order
    pub reads: Vec<(usize, usize)>,
    /// Active bank of every `disable_unused_multiplexers` call
    pub bank_switches: Vec<usize>,
    pub delays_ms: Vec<u32>,
    pub discharge_time_us: u16,
    pub initialized: bool,
}

impl<const ROW: usize, const COL: usize> ScriptedSensor<ROW, COL> {
    pub fn new(rest: u16) -> Self {
        Self {
            rest: [[rest; COL]; ROW],
            script: core::array::from_fn(|_| core::array::from_fn(|_| VecDeque::new())),
            banks: [0; COL],
            bank_count: 1,
            reads: Vec::new(),
            bank_switches: Vec::new(),
            delays_ms: Vec::new(),
            discharge_time_us: 0,
            initialized: false,
        }
    }

    pub fn with_banks(mut self, banks: [usize; COL], bank_count: usize) -> Self {
        self.banks = banks;
        self.bank_count = bank_count;
        self
    }

    pub fn push(&mut self, row: usize, col: usize, readings: &[u16]) {
        self.script[row][col].extend(readings.iter().copied());
    }
}

impl<const ROW: usize, const COL: usize> SensePeripheral for ScriptedSensor<ROW, COL> {
    fn init(&mut self) {
        self.initialized = true;
    }

    fn set_discharge_time(&mut self, us: u16) {
        self.discharge_time_us = us;
    }

    fn bank_count(&self) -> usize {
        self.bank_count
    }

    fn bank_of(&self, col: usize) -> usize {
        self.banks[col]
    }

    fn disable_unused_multiplexers(&mut self, active: usize) {
        self.bank_switches.push(active);
    }

    fn read_raw(&mut self, row: usize, col: usize) -> u16 {
        self.reads.push((row, col));
        self.script[row][col].pop_front().unwrap_or(self.rest[row][col])
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

/// Build an initialised matrix whose keys rest at `rest`
pub fn calibrated_matrix<const ROW: usize, const COL: usize>(
    rest: u16,
    config: EcConfig<ROW, COL>,
) -> EcMatrix<ScriptedSensor<ROW, COL>, ROW, COL> {
    let mut matrix = EcMatrix::new(ScriptedSensor::new(rest), config);
    matrix.init();
    matrix
}

//! # ECSM
//!
//! Analog sensing key matrix engine for electro-capacitive keyboard switches.
//!
//! Every key reports a continuous sensor value. [`matrix::EcMatrix`] converts the values into
//! press/release decisions with a per-key, self calibrating threshold model:
//!
//! - [`driver`] - multiplexer selection, capacitor charge/discharge timing and ADC sampling
//! - [`calibration`] - noise floor and bottoming-out calibration records
//! - [`actuation`] - static and dynamic actuation/release decisions
//! - [`matrix`] - scan orchestration over the whole matrix
//! - [`input_device`] - key events for the keymap layers
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod actuation;
pub mod calibration;
pub mod config;
pub mod debug;
pub mod driver;
pub mod event;
pub mod input_device;
pub mod matrix;

pub use ecsm_types as types;
pub use config::EcConfig;
pub use driver::{SenseAdc, SenseDriver, SensePeripheral};
pub use matrix::{EcMatrix, MatrixRow};

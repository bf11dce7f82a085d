//! # ECSM Types
//!
//! Fundamental type definitions shared by the electro-capacitive switch matrix engine
//! and the tools which configure it.
//!
//! - [`threshold`] - Actuation/release threshold modes and per-key profiles
//! - [`channel`] - Multiplexer channel addressing of matrix columns
//!
//! All types are `no_std`, serializable with `serde` and sized with postcard's `MaxSize`,
//! so a host can push a [`threshold::KeyProfileUpdate`] to the firmware as a postcard frame.

#![no_std]

pub mod channel;
pub mod threshold;

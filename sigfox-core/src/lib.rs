//! Board-agnostic core logic for the Sigfox sensor node firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Channel layer: response framer, bus arbiter, modem channel driver
//! - Command protocol engine driving the Wisol modem
//! - Transmit policy (duty cycle, duplicate suppression)
//! - Sensor pipeline: priorities, producers, inter-task messages
//! - Node configuration types and parser
//! - Sensor trait
//!
//! Everything is generic over an embassy-sync `RawMutex`, so the same code
//! runs under the firmware executor and in host tests.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod engine;
pub mod pipeline;
pub mod traits;

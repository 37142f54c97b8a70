//! Configuration type definitions
//!
//! These types describe one sensor node. They are filled from the embedded
//! `node.toml` at boot, or from [`NodeConfig::default`] when that fails.

use heapless::Vec;
use sigfox_protocol::Country;

use crate::channel::COMMAND_TIMEOUT_MS;
use crate::pipeline::{ProducerConfig, MAX_PRODUCERS};

/// According to regulation, messages should be sent only every 10 minutes
pub const SEND_INTERVAL_MS: u32 = 10 * 60 * 1000;

/// Default sensor poll interval
pub const POLL_INTERVAL_MS: u32 = 500;

/// Modem and transmit settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    /// Country the node operates in, selects the radio zone
    pub country: Country,
    /// Talk to the SNEK emulator instead of the network
    pub use_emulator: bool,
    /// Per-command response timeout
    pub command_timeout_ms: u32,
    /// Minimum time between two uplinks
    pub send_interval_ms: u32,
    /// Attempts per command on channel failure (1 = no retry)
    pub max_attempts: u8,
    /// Pause between attempts
    pub retry_backoff_ms: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            country: Country::SINGAPORE,
            use_emulator: true,
            command_timeout_ms: COMMAND_TIMEOUT_MS,
            send_interval_ms: SEND_INTERVAL_MS,
            max_attempts: 1,
            retry_backoff_ms: 200,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeConfig {
    pub radio: RadioConfig,
    pub sensors: Vec<ProducerConfig, MAX_PRODUCERS>,
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sensor(&self, name: &str) -> Option<&ProducerConfig> {
        self.sensors.iter().find(|s| s.name == name)
    }
}

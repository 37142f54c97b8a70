//! Messages exchanged between pipeline tasks

use heapless::String;

use crate::engine::SequenceReport;

/// Fixed width of a producer name
pub const NAME_LEN: usize = 3;

/// Producer identity carried by every sample
pub type SensorName = String<NAME_LEN>;

/// Reserved producer name requesting the startup sequence
pub const STARTUP_NAME: &str = "000";

/// Build a sensor name, truncated to [`NAME_LEN`] characters
pub fn sensor_name(name: &str) -> SensorName {
    let mut out = SensorName::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Byte identifying a sensor's reading in the uplink payload
pub fn payload_tag(name: &str) -> u8 {
    name.as_bytes().first().copied().unwrap_or(0)
}

/// A reading posted by a sensor producer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleMessage {
    pub name: SensorName,
    pub value: f32,
    /// Samples taken by this producer so far, this one included
    pub count: u32,
    /// Uptime at sampling
    pub timestamp_ms: u32,
}

impl SampleMessage {
    pub fn new(name: &str, value: f32, count: u32, timestamp_ms: u32) -> Self {
        Self {
            name: sensor_name(name),
            value,
            count,
            timestamp_ms,
        }
    }

    /// Synthetic message triggering the startup sequence
    pub fn startup(timestamp_ms: u32) -> Self {
        Self::new(STARTUP_NAME, 0.0, 0, timestamp_ms)
    }

    pub fn is_startup(&self) -> bool {
        self.name == STARTUP_NAME
    }
}

/// Messages rendered by the display consumer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayMessage {
    /// A fresh sensor reading
    Sample(SampleMessage),
    /// Outcome of a finished command sequence
    Sequence(SequenceReport),
}

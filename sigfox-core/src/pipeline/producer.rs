//! Sensor producer
//!
//! One producer per sensor: it reads the device while holding the bus
//! permit, stamps a [`SampleMessage`] and posts it to the engine inbox, with
//! a copy to the display.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::{DisplayMessage, DisplayQueue, Inbox, ProducerConfig, SampleMessage};
use crate::channel::{ArbiterError, ChannelArbiter};
use crate::traits::{Sensor, SensorError};

/// Errors from one producer poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProducerError {
    /// Could not get the bus
    Arbiter(ArbiterError),
    /// Sensor read failed
    Sensor(SensorError),
    /// Engine has not consumed earlier samples; this one was dropped
    InboxFull,
}

impl From<ArbiterError> for ProducerError {
    fn from(e: ArbiterError) -> Self {
        ProducerError::Arbiter(e)
    }
}

impl From<SensorError> for ProducerError {
    fn from(e: SensorError) -> Self {
        ProducerError::Sensor(e)
    }
}

pub struct SensorProducer<'a, M: RawMutex, S, const N: usize> {
    config: ProducerConfig,
    sensor: S,
    arbiter: &'a ChannelArbiter<M, N>,
    inbox: &'a Inbox<M>,
    display: Option<&'a DisplayQueue<M>>,
    count: u32,
}

impl<'a, M: RawMutex, S: Sensor, const N: usize> SensorProducer<'a, M, S, N> {
    pub fn new(
        config: ProducerConfig,
        sensor: S,
        arbiter: &'a ChannelArbiter<M, N>,
        inbox: &'a Inbox<M>,
    ) -> Self {
        Self {
            config,
            sensor,
            arbiter,
            inbox,
            display: None,
            count: 0,
        }
    }

    /// Also send every sample to the display consumer
    pub fn with_display(mut self, display: &'a DisplayQueue<M>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Samples produced so far
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Take one sample and post it
    pub async fn poll(&mut self, timestamp_ms: u32) -> Result<SampleMessage, ProducerError> {
        let value = {
            let _permit = self.arbiter.acquire(self.config.priority).await?;
            self.sensor.read()?
        };

        self.count = self.count.wrapping_add(1);
        let sample = SampleMessage {
            name: self.config.name.clone(),
            value,
            count: self.count,
            timestamp_ms,
        };

        // Display is best-effort
        if let Some(display) = self.display {
            let _ = display.try_send(DisplayMessage::Sample(sample.clone()));
        }

        self.inbox
            .try_send(sample.clone())
            .map_err(|_| ProducerError::InboxFull)?;
        Ok(sample)
    }
}

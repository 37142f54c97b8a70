//! Sensor producer tasks
//!
//! One task per configured sensor, woken by its own ticker.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant, Ticker};

use sigfox_core::pipeline::{ProducerError, SensorProducer};

use crate::channels::MAX_BUS_WAITERS;
use crate::sensors::NodeSensor;

/// Producer as run by [`sensor_task`]
pub type Producer =
    SensorProducer<'static, CriticalSectionRawMutex, NodeSensor, MAX_BUS_WAITERS>;

/// Sensor task - samples one sensor at its poll interval
#[embassy_executor::task(pool_size = 4)]
pub async fn sensor_task(mut producer: Producer) {
    let config = producer.config().clone();
    info!(
        "Sensor task {} started: every {} ms at {:?} (level {})",
        config.name.as_str(),
        config.poll_interval_ms,
        config.priority,
        config.priority.level()
    );

    let mut ticker = Ticker::every(Duration::from_millis(config.poll_interval_ms as u64));

    loop {
        ticker.next().await;

        // Uptime wraps after ~49 days; the transmit policy uses wrapping math
        let now_ms = Instant::now().as_millis() as u32;

        match producer.poll(now_ms).await {
            Ok(sample) => {
                trace!("{} sample #{}", config.name.as_str(), sample.count);
            }
            Err(ProducerError::InboxFull) => {
                debug!("{}: engine busy, sample dropped", config.name.as_str());
            }
            Err(e) => {
                warn!("{}: poll failed: {:?}", config.name.as_str(), e);
            }
        }
    }
}

//! Transmit policy
//!
//! Decides what a sensor sample turns into. Every sample updates the latest
//! reading of its sensor; an uplink carrying all latest readings is only
//! sent when the modem is up, the send interval has passed and the payload
//! differs from the last one delivered. A modem that never came up is
//! retried at the same interval.

use heapless::Vec;
use sigfox_protocol::MAX_BYTES_PER_MESSAGE;

use crate::pipeline::{payload_tag, SampleMessage, SensorName, MAX_PRODUCERS};

/// Uplink payload
pub type Payload = Vec<u8, MAX_BYTES_PER_MESSAGE>;

/// Bytes per reading: name tag + i16
const READING_LEN: usize = 3;

/// What to do with a sample
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decision {
    /// Keep the reading, send nothing
    Record,
    /// Modem not started, run startup again
    Startup,
    /// Send this payload
    Transmit(Payload),
}

#[derive(Debug, Clone)]
struct Reading {
    name: SensorName,
    value: f32,
}

#[derive(Debug, Clone)]
pub struct TransmitPolicy {
    send_interval_ms: u32,
    readings: Vec<Reading, MAX_PRODUCERS>,
    last_sent_ms: Option<u32>,
    last_startup_ms: Option<u32>,
    last_payload: Option<Payload>,
}

impl TransmitPolicy {
    pub fn new(send_interval_ms: u32) -> Self {
        Self {
            send_interval_ms,
            readings: Vec::new(),
            last_sent_ms: None,
            last_startup_ms: None,
            last_payload: None,
        }
    }

    /// Record a sample and decide what follows
    pub fn on_sample(&mut self, sample: &SampleMessage, started: bool) -> Decision {
        self.record(sample);
        let now = sample.timestamp_ms;

        if !started {
            return if self.elapsed(self.last_startup_ms, now) {
                Decision::Startup
            } else {
                Decision::Record
            };
        }

        if !self.elapsed(self.last_sent_ms, now) {
            return Decision::Record;
        }

        let payload = self.payload();
        if self.last_payload.as_ref() == Some(&payload) {
            return Decision::Record;
        }
        Decision::Transmit(payload)
    }

    /// A startup sequence was attempted at `now`
    pub fn on_startup(&mut self, now: u32) {
        self.last_startup_ms = Some(now);
    }

    /// An uplink was attempted at `now`
    ///
    /// A failed attempt still counts against the send interval, but its
    /// payload is not remembered so it goes out again next time.
    pub fn on_transmit(&mut self, payload: Payload, now: u32, delivered: bool) {
        self.last_sent_ms = Some(now);
        if delivered {
            self.last_payload = Some(payload);
        }
    }

    /// Latest reading of a sensor
    pub fn reading(&self, name: &str) -> Option<f32> {
        self.readings
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value)
    }

    /// Payload built from the latest readings, in arrival order of sensors
    pub fn payload(&self) -> Payload {
        let mut payload = Payload::new();
        for reading in &self.readings {
            let tag = payload_tag(&reading.name);
            let value = encode_reading(reading.value);
            if payload.len() + READING_LEN > MAX_BYTES_PER_MESSAGE {
                break;
            }
            let _ = payload.push(tag);
            let _ = payload.extend_from_slice(&value);
        }
        payload
    }

    fn record(&mut self, sample: &SampleMessage) {
        if sample.is_startup() {
            return;
        }
        match self.readings.iter_mut().find(|r| r.name == sample.name) {
            Some(reading) => reading.value = sample.value,
            None => {
                // Readings beyond the last slot are not sent
                let _ = self.readings.push(Reading {
                    name: sample.name.clone(),
                    value: sample.value,
                });
            }
        }
    }

    fn elapsed(&self, since: Option<u32>, now: u32) -> bool {
        since.map_or(true, |t| now.wrapping_sub(t) >= self.send_interval_ms)
    }
}

/// Reading in tenths, big-endian, saturated to i16
fn encode_reading(value: f32) -> [u8; 2] {
    // Float to int casts saturate and map NaN to 0
    ((value * 10.0) as i16).to_be_bytes()
}

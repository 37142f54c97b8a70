//! Sensor pipeline
//!
//! Up to [`MAX_PRODUCERS`] sensor producers, each at its own priority, feed
//! the protocol engine through a shallow [`Inbox`]. A display consumer at
//! [`Priority::Background`] receives copies of samples and sequence reports.

pub mod builder;
pub mod message;
pub mod priority;
pub mod producer;

use embassy_sync::channel::Channel;

pub use builder::{Pipeline, PipelineBuilder, ProducerConfig};
pub use message::{
    payload_tag, sensor_name, DisplayMessage, SampleMessage, SensorName, STARTUP_NAME,
};
pub use priority::Priority;
pub use producer::{ProducerError, SensorProducer};

/// Sensors a node can carry
pub const MAX_PRODUCERS: usize = 4;

/// One message in flight plus one queued
pub const INBOX_SIZE: usize = 2;

/// Pending display messages
pub const DISPLAY_QUEUE_SIZE: usize = 4;

/// Engine inbound queue
pub type Inbox<M> = Channel<M, SampleMessage, INBOX_SIZE>;

/// Display consumer queue
pub type DisplayQueue<M> = Channel<M, DisplayMessage, DISPLAY_QUEUE_SIZE>;

/// Pipeline layout errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PipelineError {
    TooManyProducers,
    DuplicateName,
    DuplicatePriority,
    /// Name starts with the same character as another producer's, so both
    /// would share a payload tag
    DuplicateTag,
    /// Empty name or the startup sentinel
    ReservedName,
    /// Background belongs to the display consumer
    ReservedPriority,
    /// Poll interval of zero
    InvalidInterval,
}

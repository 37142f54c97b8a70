//! Shared modem channel
//!
//! The modem is reached through one serial link shared by every producer of
//! traffic. This module holds the pieces that make that safe:
//!
//! - [`ResponseFramer`]: turns interrupt-delivered bytes into responses
//! - [`ChannelArbiter`]: single-permit gate serializing bus users
//! - [`ChannelDriver`]: executes one [`ChannelRequest`] at a time
//!
//! ```text
//! engine ──ChannelRequest──► driver ──acquire──► arbiter
//!    ▲                          │ write
//!    │ success / failure        ▼
//!    └──────────────────── framer ◄── UART RX bytes
//! ```

pub mod arbiter;
pub mod driver;
pub mod framer;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use sigfox_protocol::{CommandLine, FramerError, Response};

pub use arbiter::{ArbiterError, ChannelArbiter, Permit};
pub use driver::ChannelDriver;
pub use framer::{ResponseFramer, ResponseQueue};

/// Wait up to 1 second for a response from the modem
pub const COMMAND_TIMEOUT_MS: u32 = 1000;

/// Requests waiting for the driver; one in flight at a time
pub const REQUEST_QUEUE_SIZE: usize = 1;

/// Queue of requests consumed by the channel driver
pub type RequestQueue<'a, M> = Channel<M, ChannelRequest<'a, M>, REQUEST_QUEUE_SIZE>;

/// Reasons a request did not produce a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// No complete response within the request timeout
    Timeout,
    /// Writing the command to the link failed
    Write,
    /// Response could not be framed
    Framing(FramerError),
    /// Bus arbiter refused the request
    Busy,
}

impl From<FramerError> for ChannelError {
    fn from(e: FramerError) -> Self {
        ChannelError::Framing(e)
    }
}

impl From<ArbiterError> for ChannelError {
    fn from(_: ArbiterError) -> Self {
        ChannelError::Busy
    }
}

/// A single unit of work for the channel driver
pub struct ChannelRequest<'a, M: RawMutex> {
    /// Command text, already terminated
    pub payload: CommandLine,
    pub timeout_ms: u32,
    /// Character ending a response
    pub marker: u8,
    /// Markers making up one response
    pub expected_markers: u8,
    /// Raised with the response on success
    pub success: &'a Signal<M, Response>,
    /// Raised on timeout or link failure
    pub failure: &'a Signal<M, ChannelError>,
}

impl<'a, M: RawMutex> ChannelRequest<'a, M> {
    /// Report the outcome to whoever submitted the request
    pub fn complete(&self, result: Result<Response, ChannelError>) {
        match result {
            Ok(response) => self.success.signal(response),
            Err(e) => self.failure.signal(e),
        }
    }
}

/// Success/failure notification pair owned by a requester
pub struct Notifications<M: RawMutex> {
    pub success: Signal<M, Response>,
    pub failure: Signal<M, ChannelError>,
}

impl<M: RawMutex> Default for Notifications<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Notifications<M> {
    pub const fn new() -> Self {
        Self {
            success: Signal::new(),
            failure: Signal::new(),
        }
    }

    /// Clear stale notifications before a new request
    pub fn reset(&self) {
        self.success.reset();
        self.failure.reset();
    }

    /// Wait for whichever notification is raised first
    pub async fn wait_any(&self) -> Result<Response, ChannelError> {
        match select(self.success.wait(), self.failure.wait()).await {
            Either::First(response) => Ok(response),
            Either::Second(e) => Err(e),
        }
    }
}

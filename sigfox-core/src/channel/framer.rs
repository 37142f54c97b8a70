//! Interrupt-safe response framer
//!
//! Wraps the pure [`LineFramer`] so bytes can be fed from the UART receive
//! path while a task waits for the completed response. Completed responses
//! go into a bounded completion queue. When the queue is full the response
//! is dropped and the consumer sees [`FramerError::QueueFull`] once it has
//! drained what was queued; nothing already queued is overwritten.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use sigfox_protocol::{FramerError, LineFramer, Response};

/// Completed responses waiting for the consumer
pub const RESPONSE_QUEUE_SIZE: usize = 2;

/// Completion target installed into a [`ResponseFramer`]
pub type ResponseQueue<M> = Channel<M, Result<Response, FramerError>, RESPONSE_QUEUE_SIZE>;

struct FramerState<'a, M: RawMutex> {
    framer: LineFramer,
    target: Option<&'a ResponseQueue<M>>,
    /// A completion was lost because the target was full
    dropped: bool,
}

/// Framer shared between the byte source and the waiting consumer
pub struct ResponseFramer<'a, M: RawMutex> {
    state: Mutex<M, RefCell<FramerState<'a, M>>>,
}

impl<'a, M: RawMutex> Default for ResponseFramer<'a, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, M: RawMutex> ResponseFramer<'a, M> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(FramerState {
                framer: LineFramer::new(),
                target: None,
                dropped: false,
            })),
        }
    }

    /// Install the queue receiving completed responses
    pub fn set_completion_target(&self, target: &'a ResponseQueue<M>) {
        self.state.lock(|s| s.borrow_mut().target = Some(target));
    }

    /// Number of markers making up one response
    pub fn set_expected_marker_count(&self, count: u8) {
        self.state
            .lock(|s| s.borrow_mut().framer.set_expected_markers(count));
    }

    /// Character ending a response
    pub fn set_marker(&self, marker: u8) {
        self.state.lock(|s| s.borrow_mut().framer.set_marker(marker));
    }

    /// Set marker and marker count for the next response
    pub fn configure(&self, marker: u8, expected_markers: u8) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.framer.set_marker(marker);
            s.framer.set_expected_markers(expected_markers);
        });
    }

    /// Feed one received byte
    ///
    /// Safe to call from interrupt context. Returns `true` when the byte
    /// completed a response (or reported an overflow).
    pub fn on_byte_received(&self, byte: u8) -> bool {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let completed = match s.framer.feed(byte) {
                Ok(None) => return false,
                Ok(Some(response)) => Ok(response),
                Err(e) => Err(e),
            };

            // Without a target the response has nowhere to go
            if let Some(target) = s.target {
                if target.try_send(completed).is_err() {
                    s.dropped = true;
                }
            }
            true
        })
    }

    /// Feed a chunk of received bytes
    pub fn on_bytes_received(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.on_byte_received(byte);
        }
    }

    /// Wait for the next completed response
    ///
    /// Responses are returned in arrival order. A response dropped on a full
    /// queue is reported as [`FramerError::QueueFull`] after every response
    /// queued before it.
    pub async fn next_response(&self) -> Result<Response, FramerError> {
        let target = self
            .state
            .lock(|s| s.borrow().target)
            .ok_or(FramerError::NoTarget)?;

        if let Ok(queued) = target.try_receive() {
            return queued;
        }
        if self.state.lock(|s| core::mem::take(&mut s.borrow_mut().dropped)) {
            return Err(FramerError::QueueFull);
        }
        target.receive().await
    }

    /// Drop the partial response and any unconsumed completions
    pub fn discard_pending(&self) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.framer.reset();
            s.dropped = false;
            if let Some(target) = s.target {
                while target.try_receive().is_ok() {}
            }
        });
    }

    /// Bytes buffered for the response in progress
    pub fn pending_len(&self) -> usize {
        self.state.lock(|s| s.borrow().framer.pending().len())
    }
}

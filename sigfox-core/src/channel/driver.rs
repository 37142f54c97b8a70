//! Modem channel driver
//!
//! Executes [`ChannelRequest`]s one at a time: takes the bus permit, arms
//! the framer, writes the command and races the response against the
//! request timeout. Every request ends in exactly one of its two
//! notifications.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_io_async::Write;
use sigfox_protocol::Response;

use super::{ChannelArbiter, ChannelError, ChannelRequest, RequestQueue, ResponseFramer};
use crate::pipeline::Priority;

/// Modem traffic competes for the bus at the most urgent level
const DRIVER_PRIORITY: Priority = Priority::Critical;

/// Owns the write half of the modem link
pub struct ChannelDriver<'a, M: RawMutex, W, D, const N: usize> {
    requests: &'a RequestQueue<'a, M>,
    arbiter: &'a ChannelArbiter<M, N>,
    framer: &'a ResponseFramer<'a, M>,
    writer: W,
    delay: D,
}

impl<'a, M, W, D, const N: usize> ChannelDriver<'a, M, W, D, N>
where
    M: RawMutex,
    W: Write,
    D: DelayNs,
{
    pub fn new(
        requests: &'a RequestQueue<'a, M>,
        arbiter: &'a ChannelArbiter<M, N>,
        framer: &'a ResponseFramer<'a, M>,
        writer: W,
        delay: D,
    ) -> Self {
        Self {
            requests,
            arbiter,
            framer,
            writer,
            delay,
        }
    }

    /// Link the commands are written to
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Serve requests forever
    pub async fn run(&mut self) -> ! {
        loop {
            self.serve_one().await;
        }
    }

    /// Take the next request and complete it
    pub async fn serve_one(&mut self) {
        let request = self.requests.receive().await;
        let result = self.transact(&request).await;
        request.complete(result);
    }

    /// Run one request against the modem
    pub async fn transact(
        &mut self,
        request: &ChannelRequest<'a, M>,
    ) -> Result<Response, ChannelError> {
        let _permit = self.arbiter.acquire(DRIVER_PRIORITY).await?;

        self.framer
            .configure(request.marker, request.expected_markers);
        self.framer.discard_pending();

        self.writer
            .write_all(request.payload.as_bytes())
            .await
            .map_err(|_| ChannelError::Write)?;
        self.writer.flush().await.map_err(|_| ChannelError::Write)?;

        match select(
            self.framer.next_response(),
            self.delay.delay_ms(request.timeout_ms),
        )
        .await
        {
            Either::First(response) => Ok(response?),
            Either::Second(()) => Err(ChannelError::Timeout),
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted modem used by channel and engine tests

    use std::boxed::Box;
    use std::collections::VecDeque;
    use std::vec::Vec;

    use embedded_hal_async::delay::DelayNs;
    use embedded_io_async::{ErrorKind, ErrorType, Write};

    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use crate::channel::ResponseFramer;

    /// Writer that answers every complete command line with the next reply
    pub struct ScriptedModem {
        framer: &'static ResponseFramer<'static, NoopRawMutex>,
        replies: VecDeque<&'static [u8]>,
        line: Vec<u8>,
        pub written: Vec<Vec<u8>>,
        pub fail_writes: bool,
    }

    impl ScriptedModem {
        pub fn new(
            framer: &'static ResponseFramer<'static, NoopRawMutex>,
            replies: &[&'static [u8]],
        ) -> Self {
            Self {
                framer,
                replies: replies.iter().copied().collect(),
                line: Vec::new(),
                written: Vec::new(),
                fail_writes: false,
            }
        }
    }

    impl ErrorType for ScriptedModem {
        type Error = ErrorKind;
    }

    impl Write for ScriptedModem {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.fail_writes {
                return Err(ErrorKind::BrokenPipe);
            }
            self.line.extend_from_slice(buf);
            if self.line.last() == Some(&b'\r') {
                self.written.push(core::mem::take(&mut self.line));
                if let Some(reply) = self.replies.pop_front() {
                    self.framer.on_bytes_received(reply);
                }
            }
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    /// Delay completing immediately, recording what was asked for
    #[derive(Default)]
    pub struct InstantDelay {
        pub total_ms: u64,
    }

    impl DelayNs for InstantDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ms += u64::from(ns) / 1_000_000;
        }

        async fn delay_us(&mut self, us: u32) {
            self.total_ms += u64::from(us) / 1_000;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.total_ms += u64::from(ms);
        }
    }

    pub fn leak<T>(value: T) -> &'static T {
        Box::leak(Box::new(value))
    }
}

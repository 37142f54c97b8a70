//! Command protocol engine
//!
//! Consumes [`SampleMessage`]s one at a time and turns them into command
//! sequences executed against the modem through the channel driver:
//!
//! ```text
//! Idle ──sample──► install sequence ──► Sending ──► Awaiting ──┐
//!  ▲                                       ▲     success      │
//!  │                                       └── next step ◄────┤
//!  └────────────── done (sentinel) / failure ◄────────────────┘
//! ```
//!
//! A failed step ends its sequence only; the engine goes back to waiting for
//! the next message. Channel failures may be retried, handler failures
//! never are. A startup retried after a failure is preceded by a module
//! reset that also restores the zone's uplink frequency.

pub mod context;
pub mod handlers;
pub mod policy;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use sigfox_protocol::{
    diagnostics_sequence, recovery_sequence, startup_sequence, transmit_sequence, CommandStep,
    Response, StepCondition, END_OF_RESPONSE,
};

pub use context::{ChannelInfo, ProtocolContext, DEVICE_ID_LEN, PAC_LEN};
pub use handlers::HandlerError;
pub use policy::{Decision, Payload, TransmitPolicy};

use crate::channel::{ChannelError, ChannelRequest, Notifications, RequestQueue};
use crate::config::RadioConfig;
use crate::pipeline::{DisplayMessage, DisplayQueue, Inbox, SampleMessage};

/// Why a sequence stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// Channel reported failure or timeout
    Channel(ChannelError),
    /// Response did not fit the step
    Handler(HandlerError),
}

impl From<ChannelError> for EngineError {
    fn from(e: ChannelError) -> Self {
        EngineError::Channel(e)
    }
}

impl From<HandlerError> for EngineError {
    fn from(e: HandlerError) -> Self {
        EngineError::Handler(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceKind {
    Startup,
    Transmit,
    /// Module temperature and voltage readout
    Diagnostics,
    /// Reset before a startup retry
    Recovery,
}

/// Outcome of one finished sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceReport {
    pub kind: SequenceKind,
    /// Steps sent and answered successfully
    pub steps_completed: u8,
    /// Conditional steps passed over without being sent
    pub steps_skipped: u8,
    pub error: Option<EngineError>,
}

impl SequenceReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives the modem for the sensor node
pub struct ProtocolEngine<'a, M: RawMutex, D> {
    ctx: ProtocolContext,
    policy: TransmitPolicy,
    radio: RadioConfig,
    inbox: &'a Inbox<M>,
    requests: &'a RequestQueue<'a, M>,
    notifications: &'a Notifications<M>,
    display: Option<&'a DisplayQueue<M>>,
    delay: D,
}

impl<'a, M: RawMutex, D: DelayNs> ProtocolEngine<'a, M, D> {
    pub fn new(
        radio: RadioConfig,
        inbox: &'a Inbox<M>,
        requests: &'a RequestQueue<'a, M>,
        notifications: &'a Notifications<M>,
        delay: D,
    ) -> Self {
        Self {
            ctx: ProtocolContext::new(&radio),
            policy: TransmitPolicy::new(radio.send_interval_ms),
            radio,
            inbox,
            requests,
            notifications,
            display: None,
            delay,
        }
    }

    /// Post a report of every finished sequence to the display
    pub fn with_display(mut self, display: &'a DisplayQueue<M>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn context(&self) -> &ProtocolContext {
        &self.ctx
    }

    pub fn policy(&self) -> &TransmitPolicy {
        &self.policy
    }

    /// Process the next message
    ///
    /// The first call runs the startup sequence before anything queued in
    /// the inbox.
    pub async fn next(&mut self) -> Option<SequenceReport> {
        let message = if self.ctx.take_first_activation() {
            SampleMessage::startup(0)
        } else {
            self.inbox.receive().await
        };

        let report = self.handle(message).await;
        if let Some(report) = report {
            self.post(report);
        }
        report
    }

    /// Read the module's temperature and voltage
    ///
    /// Results land in the context; previous readings are kept when the
    /// sequence fails part way.
    pub async fn diagnostics(&mut self) -> SequenceReport {
        self.ctx.install(diagnostics_sequence());
        let report = self.execute(SequenceKind::Diagnostics).await;
        self.post(report);
        report
    }

    fn post(&self, report: SequenceReport) {
        if let Some(display) = self.display {
            // Display is best-effort
            let _ = display.try_send(DisplayMessage::Sequence(report));
        }
    }

    /// Turn one message into at most one command sequence
    pub async fn handle(&mut self, message: SampleMessage) -> Option<SequenceReport> {
        let now = message.timestamp_ms;
        let decision = if message.is_startup() {
            Decision::Startup
        } else {
            self.policy.on_sample(&message, self.ctx.is_started())
        };

        match decision {
            Decision::Record => None,
            Decision::Startup => {
                self.policy.on_startup(now);
                if !message.is_startup() {
                    self.ctx.install(recovery_sequence(self.ctx.zone()));
                    let recovery = self.execute(SequenceKind::Recovery).await;
                    if !recovery.succeeded() {
                        return Some(recovery);
                    }
                }
                self.ctx.install(startup_sequence(self.ctx.use_emulator()));
                let report = self.execute(SequenceKind::Startup).await;
                self.ctx.set_started(report.succeeded());
                Some(report)
            }
            Decision::Transmit(payload) => {
                self.ctx.install(transmit_sequence(self.ctx.zone(), &payload));
                let report = self.execute(SequenceKind::Transmit).await;
                self.policy.on_transmit(payload, now, report.succeeded());
                Some(report)
            }
        }
    }

    /// Run the installed sequence up to its sentinel or first failure
    async fn execute(&mut self, kind: SequenceKind) -> SequenceReport {
        let mut report = SequenceReport {
            kind,
            steps_completed: 0,
            steps_skipped: 0,
            error: None,
        };

        while let Some(step) = self.ctx.current_step().cloned() {
            if !self.condition_holds(step.when) {
                report.steps_skipped += 1;
                self.ctx.advance();
                continue;
            }

            if let Err(error) = self.run_step(&step).await {
                self.ctx.fail();
                report.error = Some(error);
                return report;
            }
            report.steps_completed += 1;
            self.ctx.advance();
        }

        report
    }

    fn condition_holds(&self, condition: StepCondition) -> bool {
        match condition {
            StepCondition::Always => true,
            StepCondition::ChannelsBusy => self
                .ctx
                .channel_info()
                .map_or(true, |info| info.needs_reset()),
        }
    }

    async fn run_step(&mut self, step: &CommandStep) -> Result<(), EngineError> {
        let response = self.transact(step).await?;
        handlers::apply(step.handler, &response, &mut self.ctx)?;
        Ok(())
    }

    /// Submit a step, retrying channel failures with a fixed back-off
    async fn transact(&mut self, step: &CommandStep) -> Result<Response, ChannelError> {
        let attempts = self.radio.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.request(step).await {
                Err(_) if attempt < attempts => {
                    attempt += 1;
                    self.delay.delay_ms(self.radio.retry_backoff_ms).await;
                }
                result => return result,
            }
        }
    }

    async fn request(&self, step: &CommandStep) -> Result<Response, ChannelError> {
        let notifications = self.notifications;
        notifications.reset();

        self.requests
            .send(ChannelRequest {
                payload: step.render(),
                timeout_ms: self.radio.command_timeout_ms,
                marker: END_OF_RESPONSE,
                expected_markers: step.expected_markers,
                success: &notifications.success,
                failure: &notifications.failure,
            })
            .await;

        notifications.wait_any().await
    }
}

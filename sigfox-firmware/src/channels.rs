//! Inter-task communication channels
//!
//! Defines the statics shared between Embassy tasks. Everything is guarded
//! by a critical-section mutex so the UART receive path can feed the framer
//! regardless of which context it runs in.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use sigfox_core::channel::{
    ChannelArbiter, Notifications, RequestQueue, ResponseFramer, ResponseQueue,
};
use sigfox_core::pipeline::{DisplayQueue, Inbox, MAX_PRODUCERS};

/// Bus users: every sensor producer plus the modem driver
pub const MAX_BUS_WAITERS: usize = MAX_PRODUCERS + 1;

/// The single-permit bus gate
pub type Bus = ChannelArbiter<CriticalSectionRawMutex, MAX_BUS_WAITERS>;

/// Frames modem responses out of UART bytes
pub static FRAMER: ResponseFramer<'static, CriticalSectionRawMutex> = ResponseFramer::new();

/// Completed modem responses, filled by [`FRAMER`]
pub static RESPONSES: ResponseQueue<CriticalSectionRawMutex> = Channel::new();

/// Shared bus gate
pub static BUS: Bus = ChannelArbiter::exclusive();

/// Requests from the engine to the modem driver
pub static REQUESTS: RequestQueue<'static, CriticalSectionRawMutex> = Channel::new();

/// Engine's success/failure notifications
pub static ENGINE_NOTIFY: Notifications<CriticalSectionRawMutex> = Notifications::new();

/// Samples waiting for the engine
pub static INBOX: Inbox<CriticalSectionRawMutex> = Channel::new();

/// Samples and sequence reports for the display task
pub static DISPLAY: DisplayQueue<CriticalSectionRawMutex> = Channel::new();

//! Bus arbitration
//!
//! A counting permit gate guarding the single physical bus. With one initial
//! permit it gives exclusive use to one task at a time. Tasks that cannot
//! get a permit are suspended and queued; on release the permit is handed
//! directly to the most urgent waiter (FIFO within a priority), so a freshly
//! arriving task can never overtake a queued one.
//!
//! Permits are not re-entrant: a task holding one must release it before
//! acquiring again.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Context, Poll};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;
use heapless::Vec;

use crate::pipeline::Priority;

/// Errors returned by the arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArbiterError {
    /// More tasks waiting than the arbiter was sized for
    WaitQueueFull,
}

struct Waiter {
    ticket: u32,
    priority: Priority,
    /// Permit already handed over, waiting to be picked up
    granted: bool,
    waker: WakerRegistration,
}

struct ArbiterState<const N: usize> {
    permits: usize,
    initial: usize,
    next_ticket: u32,
    waiters: Vec<Waiter, N>,
}

impl<const N: usize> ArbiterState<N> {
    /// Hand a permit to the most urgent waiter, or return it to the pool
    fn release_one(&mut self) {
        let next = self
            .waiters
            .iter_mut()
            .filter(|w| !w.granted)
            .min_by_key(|w| w.priority);

        match next {
            Some(waiter) => {
                waiter.granted = true;
                waiter.waker.wake();
            }
            None => {
                debug_assert!(self.permits < self.initial, "permit released twice");
                self.permits = (self.permits + 1).min(self.initial);
            }
        }
    }

    fn position(&self, ticket: u32) -> Option<usize> {
        self.waiters.iter().position(|w| w.ticket == ticket)
    }
}

/// Priority-ordered counting semaphore for a shared bus
///
/// `MAX_WAITERS` bounds how many tasks may be suspended in [`acquire`]
/// at once.
///
/// [`acquire`]: ChannelArbiter::acquire
pub struct ChannelArbiter<M: RawMutex, const MAX_WAITERS: usize> {
    state: Mutex<M, RefCell<ArbiterState<MAX_WAITERS>>>,
}

impl<M: RawMutex, const MAX_WAITERS: usize> ChannelArbiter<M, MAX_WAITERS> {
    /// Create an arbiter holding `permits` permits
    pub const fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(RefCell::new(ArbiterState {
                permits,
                initial: permits,
                next_ticket: 0,
                waiters: Vec::new(),
            })),
        }
    }

    /// Create an arbiter for exclusive use of the bus
    pub const fn exclusive() -> Self {
        Self::new(1)
    }

    /// Permits currently available
    pub fn available(&self) -> usize {
        self.state.lock(|s| s.borrow().permits)
    }

    /// Tasks currently suspended waiting for a permit
    pub fn waiting(&self) -> usize {
        self.state
            .lock(|s| s.borrow().waiters.iter().filter(|w| !w.granted).count())
    }

    /// Take a permit without waiting
    pub fn try_acquire(&self) -> Option<Permit<'_, M, MAX_WAITERS>> {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if s.permits > 0 {
                s.permits -= 1;
                Some(Permit { arbiter: self })
            } else {
                None
            }
        })
    }

    /// Wait for a permit
    ///
    /// Suspends the calling task until a permit is handed to it. Among
    /// suspended tasks, the most urgent `priority` is served first.
    pub async fn acquire(
        &self,
        priority: Priority,
    ) -> Result<Permit<'_, M, MAX_WAITERS>, ArbiterError> {
        let ticket = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if s.permits > 0 {
                s.permits -= 1;
                return Ok(None);
            }

            let ticket = s.next_ticket;
            s.next_ticket = s.next_ticket.wrapping_add(1);
            s.waiters
                .push(Waiter {
                    ticket,
                    priority,
                    granted: false,
                    waker: WakerRegistration::new(),
                })
                .map_err(|_| ArbiterError::WaitQueueFull)?;
            Ok(Some(ticket))
        })?;

        if let Some(ticket) = ticket {
            let mut wait = PendingWait {
                arbiter: self,
                ticket,
                done: false,
            };
            poll_fn(|cx| wait.poll(cx)).await;
        }

        Ok(Permit { arbiter: self })
    }

    fn release(&self) {
        self.state.lock(|s| s.borrow_mut().release_one());
    }
}

/// A queued acquire; leaves the queue cleanly if the task is cancelled
struct PendingWait<'a, M: RawMutex, const N: usize> {
    arbiter: &'a ChannelArbiter<M, N>,
    ticket: u32,
    done: bool,
}

impl<'a, M: RawMutex, const N: usize> PendingWait<'a, M, N> {
    fn poll(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let ticket = self.ticket;
        let ready = self.arbiter.state.lock(|s| {
            let mut s = s.borrow_mut();
            let Some(pos) = s.position(ticket) else {
                return false;
            };
            if s.waiters[pos].granted {
                s.waiters.remove(pos);
                true
            } else {
                s.waiters[pos].waker.register(cx.waker());
                false
            }
        });

        if ready {
            self.done = true;
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl<'a, M: RawMutex, const N: usize> Drop for PendingWait<'a, M, N> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let ticket = self.ticket;
        self.arbiter.state.lock(|s| {
            let mut s = s.borrow_mut();
            if let Some(pos) = s.position(ticket) {
                let waiter = s.waiters.remove(pos);
                if waiter.granted {
                    // Permit was already ours, pass it on
                    s.release_one();
                }
            }
        });
    }
}

/// Exclusive right to use the bus; released on drop
pub struct Permit<'a, M: RawMutex, const N: usize> {
    arbiter: &'a ChannelArbiter<M, N>,
}

impl<'a, M: RawMutex, const N: usize> Permit<'a, M, N> {
    /// Give the permit back
    pub fn release(self) {
        drop(self);
    }
}

impl<'a, M: RawMutex, const N: usize> Drop for Permit<'a, M, N> {
    fn drop(&mut self) {
        self.arbiter.release();
    }
}

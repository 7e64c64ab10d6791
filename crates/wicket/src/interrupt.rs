use crate::{
    Error, Result,
    mutex::{Condvar, Mutex, lock, wait_for},
};
use core::time::Duration;
use std::time::Instant;

/// A per-thread interrupt token.
///
/// Every suspension point in the office (backoff, shipping, the worker's poll
/// and the counter wait) goes through the token of the thread that is
/// suspended. [`Interrupt::raise`] wakes that thread; the wait it was in (or
/// the next one it enters) returns [`Error::WaitInterrupted`] and the pending
/// interrupt is consumed, much like a thread interrupt status.
#[derive(Debug, Default)]
pub struct Interrupt {
    pending: Mutex<bool>,
    wake: Condvar,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token as interrupted and wakes a thread sleeping on it.
    ///
    /// A thread blocked on the counter is not parked on this token; the caller
    /// must also poke the gate (see
    /// [`AdmissionGate::wake_waiters`](crate::AdmissionGate::wake_waiters)).
    pub fn raise(&self) -> Result<()> {
        let mut pending = lock(&self.pending)?;
        *pending = true;
        self.wake.notify_all();
        Ok(())
    }

    /// Returns `true` if an interrupt is pending, without consuming it.
    pub fn is_raised(&self) -> Result<bool> {
        Ok(*lock(&self.pending)?)
    }

    /// Consumes a pending interrupt, returning whether there was one.
    pub fn take(&self) -> Result<bool> {
        let mut pending = lock(&self.pending)?;
        Ok(core::mem::take(&mut *pending))
    }

    /// Sleeps for `duration` unless interrupted first.
    ///
    /// # Errors
    ///
    /// - [`Error::WaitInterrupted`] if an interrupt was pending or arrived
    ///   during the sleep. The interrupt is consumed.
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        let mut pending = lock(&self.pending)?;
        loop {
            if core::mem::take(&mut *pending) {
                return Err(Error::WaitInterrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            let (guard, _) = wait_for(&self.wake, pending, deadline - now)?;
            pending = guard;
        }
    }
}

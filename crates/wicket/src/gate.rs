use crate::{
    Interrupt, Result,
    mutex::{Condvar, Mutex, lock, wait_for},
};
use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// The single-slot counter.
///
/// A binary permit that serializes producers through the counter. The permit
/// is acquired with a bounded wait so a waiting producer gets control back
/// periodically and can look at the shutdown flag; an unbounded wait would
/// strand it past closing time.
///
/// The worker never touches the gate.
#[derive(Debug)]
pub struct AdmissionGate {
    #[cfg(feature = "cache-padded")]
    permits: crossbeam_utils::CachePadded<Mutex<usize>>,
    #[cfg(not(feature = "cache-padded"))]
    permits: Mutex<usize>,
    released: Condvar,
}

/// Result of [`AdmissionGate::try_acquire`].
#[derive(Debug)]
pub enum GateStatus {
    /// The permit was acquired and is held until the [`GatePermit`] drops.
    Acquired {
        /// Proof of holding the counter.
        permit: GatePermit,
    },
    /// The timeout ran out while another producer held the counter.
    TimedOut,
}

impl GateStatus {
    /// Returns the permit, panicking if the acquire timed out.
    #[cfg(test)]
    pub(crate) fn unwrap_acquired(self) -> GatePermit {
        match self {
            Self::Acquired { permit } => permit,
            Self::TimedOut => panic!("expected the counter to be acquired"),
        }
    }

    pub fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired { .. })
    }
}

impl AdmissionGate {
    /// Creates a gate holding its single permit.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            #[cfg(feature = "cache-padded")]
            permits: crossbeam_utils::CachePadded::new(Mutex::new(1)),
            #[cfg(not(feature = "cache-padded"))]
            permits: Mutex::new(1),
            released: Condvar::new(),
        })
    }

    /// Waits up to `timeout` for the counter.
    ///
    /// Returns [`GateStatus::Acquired`] with a permit that gives the counter
    /// back when dropped, so release happens exactly once on every exit path.
    ///
    /// # Errors
    ///
    /// - [`Error::WaitInterrupted`](crate::Error::WaitInterrupted) if
    ///   `interrupt` is raised before or during the wait. The permit is not
    ///   taken in that case.
    /// - [`Error::LockPoisoned`](crate::Error) on a poisoned std lock.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    pub fn try_acquire(
        self: &Arc<Self>,
        timeout: Duration,
        interrupt: &Interrupt,
    ) -> Result<GateStatus> {
        let deadline = Instant::now() + timeout;
        let mut permits = lock(&self.permits)?;
        loop {
            if interrupt.take()? {
                return Err(crate::Error::WaitInterrupted);
            }
            if *permits > 0 {
                *permits -= 1;
                return Ok(GateStatus::Acquired {
                    permit: GatePermit {
                        gate: Arc::clone(self),
                    },
                });
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(GateStatus::TimedOut);
            }
            let (guard, _) = wait_for(&self.released, permits, deadline - now)?;
            permits = guard;
        }
    }

    /// Number of free permits, either `0` or `1`.
    pub fn available(&self) -> Result<usize> {
        Ok(*lock(&self.permits)?)
    }

    /// Wakes every producer blocked in [`try_acquire`](Self::try_acquire) so
    /// it re-checks its interrupt token.
    pub fn wake_waiters(&self) -> Result<()> {
        // Taking the lock orders this wake-up after any waiter's interrupt
        // check, so it cannot be lost.
        let _permits = lock(&self.permits)?;
        self.released.notify_all();
        Ok(())
    }

    fn release(&self) {
        match lock(&self.permits) {
            Ok(mut permits) => {
                debug_assert_eq!(*permits, 0, "counter released while not held");
                *permits += 1;
                self.released.notify_one();
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Counter permit lost: {_e}");
            }
        }
    }
}

/// Proof that the holder is at the counter.
///
/// Dropping it (or calling [`GatePermit::release`]) returns the permit and lets
/// one waiting producer through.
#[derive(Debug)]
#[must_use = "dropping the permit releases the counter immediately"]
pub struct GatePermit {
    gate: Arc<AdmissionGate>,
}

impl GatePermit {
    /// Gives the counter back.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

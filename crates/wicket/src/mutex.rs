use crate::Result;
use core::time::Duration;

#[cfg(not(feature = "parking-lot"))]
pub(crate) use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::{Condvar, Mutex, MutexGuard};

/// Locks `mutex`, surfacing poisoning as [`crate::Error::LockPoisoned`] when
/// built on `std::sync`.
#[cfg(not(feature = "parking-lot"))]
#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    Ok(mutex.lock()?)
}

#[cfg(feature = "parking-lot")]
#[inline]
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    Ok(mutex.lock())
}

/// Blocks on `condvar` for at most `timeout`, returning the reacquired guard
/// and whether the wait ran out.
#[cfg(not(feature = "parking-lot"))]
pub(crate) fn wait_for<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: Duration,
) -> Result<(MutexGuard<'a, T>, bool)> {
    let (guard, res) = condvar
        .wait_timeout(guard, timeout)
        .map_err(|_| crate::Error::LockPoisoned)?;
    Ok((guard, res.timed_out()))
}

#[cfg(feature = "parking-lot")]
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn wait_for<'a, T>(
    condvar: &Condvar,
    mut guard: MutexGuard<'a, T>,
    timeout: Duration,
) -> Result<(MutexGuard<'a, T>, bool)> {
    let res = condvar.wait_for(&mut guard, timeout);
    Ok((guard, res.timed_out()))
}

//! Errors produced by the office.
//!
//! The first three variants are the closing-time taxonomy: a producer that
//! runs into one of them simply ends its session, and the condition is
//! reported through its [`Exit`](crate::Exit) rather than as an `Err`. The
//! remaining variants are infrastructure failures that do reach the
//! controlling thread.

use thiserror::Error;

/// A result type defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `wicket` can emit.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The counter could not be acquired before the acquire timeout ran out
    /// and the producer has no attempts left.
    #[error("counter was not acquired within the admission timeout")]
    AdmissionTimeout,

    /// An open-check found the office closed.
    #[error("office is closed")]
    OfficeClosed,

    /// A sleeping or blocked thread was interrupted.
    #[error("wait was interrupted")]
    WaitInterrupted,

    /// The operation failed because a lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("lock poisoned")]
    LockPoisoned,

    /// [`Office::open`](crate::Office::open) was called more than once.
    #[error("office has already been opened")]
    AlreadyOpened,

    /// The OS refused to spawn a worker or producer thread.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A joined thread panicked.
    #[error("thread `{name}` panicked")]
    ThreadPanicked { name: String },
}

#[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
#[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

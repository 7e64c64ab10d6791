use portable_atomic::{AtomicBool, Ordering};

/// The office's open/closed state.
///
/// Starts open and flips to closed exactly once; it never reopens. Reads are
/// atomic, so a polling thread can check it without taking the office lock.
/// Checks that decide a state transition are still made under the office
/// lock (see [`Office`](crate::Office)), which is what makes them consistent
/// with appends to the submission log.
#[derive(Debug)]
pub struct ShutdownFlag {
    #[cfg(feature = "cache-padded")]
    open: crossbeam_utils::CachePadded<AtomicBool>,
    #[cfg(not(feature = "cache-padded"))]
    open: AtomicBool,
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownFlag {
    /// Creates an open flag.
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            open: crossbeam_utils::CachePadded::new(AtomicBool::new(true)),
            #[cfg(not(feature = "cache-padded"))]
            open: AtomicBool::new(true),
        }
    }

    /// Closes the office.
    ///
    /// Returns `true` if this call performed the `open -> closed` transition
    /// and `false` if the flag was already closed, in which case nothing
    /// changes.
    #[inline]
    pub fn close(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }

    /// Returns `true` while the office is open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread::scope;

    #[test]
    fn starts_open() {
        assert!(ShutdownFlag::new().is_open());
    }

    #[test]
    fn close_is_idempotent() {
        let flag = ShutdownFlag::new();
        assert!(flag.close());
        assert!(!flag.is_open());
        assert!(!flag.close());
        assert!(!flag.is_open());
    }

    #[test]
    fn exactly_one_closer_wins() {
        let flag = Arc::new(ShutdownFlag::new());
        let winners = Arc::new(portable_atomic::AtomicUsize::new(0));

        scope(|s| {
            for _ in 0..8 {
                let flag = Arc::clone(&flag);
                let winners = Arc::clone(&winners);
                s.spawn(move || {
                    if flag.close() {
                        winners.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::Relaxed), 1);
        assert!(!flag.is_open());
    }
}

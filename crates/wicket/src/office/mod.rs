//! The coordinator that ties the counter, the shutdown flag, the submission
//! log and the worker together.
//!
//! An [`Office`] owns one lock (the ledger) and everything that decides a
//! state transition happens under it: open-checks, log appends, cursor
//! advances and closing. The [`AdmissionGate`] is a separate mechanism that
//! only limits who stands at the counter. Producers and the worker each run on
//! their own thread and hold an [`Office`] handle instead of global state.
//!
//! ## Lifecycle
//!
//! 1. [`Office::open`] starts the worker, then `producer_count` producers.
//! 2. [`RunningOffice::close`] flips the shutdown flag once. Admission stops;
//!    shipments that complete later are dropped.
//! 3. The worker drains what was logged before closing and stops.
//! 4. [`RunningOffice::join`] collects the worker's and producers' results
//!    into a [`Report`].
//!
//! [`Office::run`] does all four with the configured service window.

mod producer;
mod worker;

pub use producer::*;
pub use worker::*;

use crate::{
    AdmissionGate, Error, Event, Interrupt, Observer, OfficeConfig, Result, SessionId,
    ShutdownFlag,
    log::{Ledger, LedgerSnapshot},
    mutex::{Mutex, lock},
    session::Actor,
};
use core::fmt;
use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub(crate) struct Shared {
    pub(crate) config: OfficeConfig,
    pub(crate) flag: ShutdownFlag,
    pub(crate) gate: Arc<AdmissionGate>,
    pub(crate) ledger: Mutex<Ledger>,
    observer: Arc<dyn Observer>,
    opened: AtomicBool,
}

impl Shared {
    #[inline]
    pub(crate) fn emit(&self, event: Event) {
        self.observer.on_event(&event);
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("config", &self.config)
            .field("flag", &self.flag)
            .field("gate", &self.gate)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

/// Handle to a post office. Cheap to clone; every clone refers to the same
/// shared state.
#[derive(Clone, Debug)]
pub struct Office {
    shared: Arc<Shared>,
}

impl Office {
    /// Creates an open office. No threads run until [`Office::open`].
    pub fn new(config: OfficeConfig, observer: Arc<dyn Observer>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                flag: ShutdownFlag::new(),
                gate: AdmissionGate::new(),
                ledger: Mutex::new(Ledger::default()),
                observer,
                opened: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &OfficeConfig {
        &self.shared.config
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.shared.gate
    }

    /// Lock-free read of the shutdown flag, suitable for polling.
    pub fn is_open(&self) -> bool {
        self.shared.flag.is_open()
    }

    /// Closes the office.
    ///
    /// Returns `true` on the call that closed it; repeated calls return `false`
    /// and change nothing. The flag flips under the office lock, so no
    /// producer can pass an open-check and append after this returns.
    pub fn close(&self) -> Result<bool> {
        let _ledger = lock(&self.shared.ledger)?;
        let closed = self.shared.flag.close();
        if closed {
            self.shared.emit(Event::OfficeClosed);
        }
        Ok(closed)
    }

    /// Takes a consistent copy of the log, cursor and session count.
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        let ledger = lock(&self.shared.ledger)?;
        Ok(LedgerSnapshot {
            log: ledger.log.as_slice().to_vec(),
            processed: ledger.cursor,
            outstanding: ledger.outstanding,
            open: self.shared.flag.is_open(),
        })
    }

    /// Registers a new producer session with its own interrupt token.
    ///
    /// The session counts as outstanding until the producer finishes or is
    /// dropped.
    pub fn producer(&self, id: SessionId) -> Result<Producer> {
        Producer::new(Arc::clone(&self.shared), id)
    }

    /// Creates the worker with its own interrupt token.
    pub fn worker(&self) -> Worker {
        Worker::new(Arc::clone(&self.shared))
    }

    /// Starts the worker thread and `producer_count` producer threads.
    ///
    /// Every session is registered before the worker starts, so the worker
    /// cannot mistake a not-yet-started producer for one that has left.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyOpened`] on a second call.
    /// - [`Error::Spawn`] if a thread cannot be started. The office is closed
    ///   first so threads already running wind down.
    pub fn open(&self) -> Result<RunningOffice> {
        if self.shared.opened.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyOpened);
        }

        let producers = (1..)
            .take(self.shared.config.producer_count)
            .map(|id| self.producer(SessionId::new(id)))
            .collect::<Result<Vec<_>>>()?;

        let worker = self.worker();
        let worker_interrupt = worker.interrupt_handle();
        let worker = self.spawn("wicket-worker".to_owned(), move || worker.run())?;

        let mut handles = Vec::with_capacity(producers.len());
        for producer in producers {
            let id = producer.id();
            let interrupt = producer.interrupt_handle();
            let handle = self.spawn(format!("wicket-producer-{}", id.get()), move || {
                producer.run()
            })?;
            handles.push(ProducerHandle {
                id,
                interrupt,
                handle,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Office opened with {} producers", handles.len());

        Ok(RunningOffice {
            office: self.clone(),
            worker,
            worker_interrupt,
            producers: handles,
        })
    }

    /// Opens the office, keeps it open for the service window, closes it and
    /// waits for every thread.
    pub fn run(&self) -> Result<Report> {
        let running = self.open()?;
        thread::sleep(self.shared.config.service_window);
        running.close()?;
        running.join()
    }

    fn spawn<T, F>(&self, name: String, f: F) -> Result<JoinHandle<Result<T>>>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        thread::Builder::new().name(name).spawn(f).map_err(|e| {
            if let Err(_close) = self.close() {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to close office after spawn failure: {_close}");
            }
            Error::Spawn(e)
        })
    }
}

struct ProducerHandle {
    id: SessionId,
    interrupt: Arc<Interrupt>,
    handle: JoinHandle<Result<Exit>>,
}

/// An office whose worker and producers are running.
pub struct RunningOffice {
    office: Office,
    worker: JoinHandle<Result<Vec<SessionId>>>,
    worker_interrupt: Arc<Interrupt>,
    producers: Vec<ProducerHandle>,
}

impl fmt::Debug for RunningOffice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningOffice")
            .field("office", &self.office)
            .field("producers", &self.producers.len())
            .finish_non_exhaustive()
    }
}

impl RunningOffice {
    pub fn office(&self) -> &Office {
        &self.office
    }

    /// See [`Office::close`].
    pub fn close(&self) -> Result<bool> {
        self.office.close()
    }

    /// Interrupts whatever wait `actor` is in, or its next one.
    ///
    /// Returns `false` if no such producer was started.
    pub fn interrupt(&self, actor: Actor) -> Result<bool> {
        match actor {
            Actor::Worker => self.worker_interrupt.raise()?,
            Actor::Producer(id) => {
                let Some(producer) = self.producers.iter().find(|p| p.id == id) else {
                    return Ok(false);
                };
                producer.interrupt.raise()?;
                self.office.gate().wake_waiters()?;
            }
        }
        Ok(true)
    }

    /// Waits for the worker, then for every producer.
    ///
    /// The worker only returns once the office is closed and drained, or once
    /// every session has ended, so call [`RunningOffice::close`] first unless
    /// the producers are expected to finish on their own.
    ///
    /// # Errors
    ///
    /// The first failure among the joined threads, after all of them have
    /// been joined.
    pub fn join(self) -> Result<Report> {
        let processed = join_thread(self.worker);

        let mut exits = Vec::with_capacity(self.producers.len());
        let mut failure = None;
        for producer in self.producers {
            match join_thread(producer.handle) {
                Ok(exit) => exits.push((producer.id, exit)),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        let processed = processed?;
        if let Some(e) = failure {
            return Err(e);
        }

        let log = self.office.snapshot()?.log;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Office joined: {} logged, {} processed",
            log.len(),
            processed.len()
        );

        Ok(Report {
            processed,
            log,
            exits,
        })
    }
}

fn join_thread<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    let name = handle.thread().name().unwrap_or("<unnamed>").to_owned();
    handle
        .join()
        .map_err(|_| Error::ThreadPanicked { name })?
}

/// Outcome of a full office run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// Items in the order the worker processed them.
    pub processed: Vec<SessionId>,
    /// The submission log at the end of the run.
    pub log: Vec<SessionId>,
    /// How each producer session ended, in session order.
    pub exits: Vec<(SessionId, Exit)>,
}

impl Report {
    /// Number of sessions whose item was admitted.
    pub fn recorded(&self) -> usize {
        self.exits.iter().filter(|(_, exit)| exit.is_recorded()).count()
    }

    /// `true` if the worker processed exactly the logged items, in order.
    pub fn is_drained(&self) -> bool {
        self.processed == self.log
    }
}

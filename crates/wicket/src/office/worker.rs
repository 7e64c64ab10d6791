use crate::{
    Error, Event, Interrupt, Result, SessionId, mutex::lock, office::Shared, session::Actor,
};
use std::sync::Arc;

/// The worker's phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Office open; processing items as they are logged.
    Running,
    /// Office closed; flushing what was logged before closing.
    Draining,
    /// Nothing left that could ever be logged or processed.
    Done,
}

/// The single consumer of the submission log.
#[derive(Debug)]
pub struct Worker {
    shared: Arc<Shared>,
    interrupt: Arc<Interrupt>,
    state: WorkerState,
    processed: Vec<SessionId>,
}

impl Worker {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            interrupt: Arc::new(Interrupt::new()),
            state: WorkerState::Running,
            processed: Vec::new(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Items processed so far, in log order.
    pub fn processed(&self) -> &[SessionId] {
        &self.processed
    }

    /// The token that interrupts this worker's poll sleep.
    pub fn interrupt_handle(&self) -> Arc<Interrupt> {
        Arc::clone(&self.interrupt)
    }

    /// One poll: under the office lock, process the next logged item if there
    /// is one, then re-evaluate the phase.
    ///
    /// The worker is done once everything logged has been processed and
    /// either every session has ended or the office is closed. Closing and
    /// appending happen under the same lock, so once closed and drained no
    /// further item can appear.
    pub fn tick(&mut self) -> Result<WorkerState> {
        if self.state == WorkerState::Done {
            return Ok(self.state);
        }

        let mut ledger = lock(&self.shared.ledger)?;
        if let Some(id) = ledger.take_next() {
            self.processed.push(id);
            self.shared.emit(Event::Processed { id });
        }

        let open = self.shared.flag.is_open();
        if !open && self.state == WorkerState::Running {
            self.state = WorkerState::Draining;
            self.shared.emit(Event::WorkerDraining);
        }

        if ledger.is_drained() && (ledger.outstanding == 0 || !open) {
            self.state = WorkerState::Done;
            self.shared.emit(Event::WorkerDone {
                processed: ledger.cursor,
            });
        }

        Ok(self.state)
    }

    /// Polls every `worker_poll_interval` until done and returns the processed
    /// items.
    ///
    /// An interrupted poll sleep is reported and the loop carries on.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures (a poisoned lock).
    pub fn run(mut self) -> Result<Vec<SessionId>> {
        let poll = self.shared.config.worker_poll_interval;
        while self.state != WorkerState::Done {
            match self.interrupt.sleep(poll) {
                Ok(()) => {
                    self.tick()?;
                }
                Err(Error::WaitInterrupted) => {
                    self.shared.emit(Event::Interrupted {
                        actor: Actor::Worker,
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventRecorder, Exit, Office, OfficeConfig, ProducerState};
    use core::time::Duration;
    use std::thread;

    fn instant_office() -> (Office, Arc<EventRecorder>) {
        let recorder = Arc::new(EventRecorder::new());
        let config = OfficeConfig {
            producer_count: 0,
            worker_poll_interval: Duration::from_millis(1),
            gate_acquire_timeout: Duration::from_millis(5),
            shipping_duration: Duration::ZERO,
            producer_retry_backoff: Duration::ZERO,
            ..OfficeConfig::default()
        };
        (Office::new(config, recorder.clone()), recorder)
    }

    fn finish(producer: &mut crate::Producer) -> Exit {
        loop {
            if let ProducerState::Done(exit) = producer.step().unwrap() {
                return exit;
            }
        }
    }

    #[test]
    fn idle_tick_does_nothing_while_sessions_remain() {
        let (office, recorder) = instant_office();
        let _producer = office.producer(SessionId::new(1)).unwrap();
        let mut worker = office.worker();

        assert_eq!(worker.tick().unwrap(), WorkerState::Running);
        assert!(worker.processed().is_empty());
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn processes_one_item_per_tick_in_log_order() {
        let (office, _) = instant_office();
        let mut first = office.producer(SessionId::new(1)).unwrap();
        let mut second = office.producer(SessionId::new(2)).unwrap();
        let mut worker = office.worker();

        // second records before first
        second.step().unwrap();
        second.step().unwrap();
        first.step().unwrap();
        first.step().unwrap();
        assert_eq!(finish(&mut second), Exit::Recorded);
        assert_eq!(finish(&mut first), Exit::Recorded);

        assert_eq!(worker.tick().unwrap(), WorkerState::Running);
        assert_eq!(worker.processed(), &[SessionId::new(2)]);
        assert_eq!(worker.tick().unwrap(), WorkerState::Done);
        assert_eq!(worker.processed(), &[SessionId::new(2), SessionId::new(1)]);
        assert_eq!(office.snapshot().unwrap().processed, 2);
    }

    #[test]
    fn drains_after_close_then_stops() {
        let (office, recorder) = instant_office();
        let mut recorded = office.producer(SessionId::new(1)).unwrap();
        let _still_waiting = office.producer(SessionId::new(2)).unwrap();
        let mut worker = office.worker();

        finish(&mut recorded);
        office.close().unwrap();

        assert_eq!(worker.tick().unwrap(), WorkerState::Done);
        assert_eq!(worker.processed(), &[SessionId::new(1)]);

        let events = recorder.events();
        let tail = &events[events.len() - 3..];
        assert_eq!(
            tail,
            &[
                Event::Processed {
                    id: SessionId::new(1)
                },
                Event::WorkerDraining,
                Event::WorkerDone { processed: 1 },
            ]
        );
        // done is sticky
        assert_eq!(worker.tick().unwrap(), WorkerState::Done);
    }

    #[test]
    fn draining_takes_one_tick_per_item() {
        let (office, _) = instant_office();
        let mut worker = office.worker();
        for id in 1..=3 {
            let mut producer = office.producer(SessionId::new(id)).unwrap();
            finish(&mut producer);
        }
        office.close().unwrap();

        assert_eq!(worker.tick().unwrap(), WorkerState::Draining);
        assert_eq!(worker.tick().unwrap(), WorkerState::Draining);
        assert_eq!(worker.tick().unwrap(), WorkerState::Done);
        assert_eq!(worker.processed().len(), 3);
    }

    #[test]
    fn finishes_while_open_once_every_session_ended() {
        let (office, _) = instant_office();
        let mut worker = office.worker();
        let mut producer = office.producer(SessionId::new(1)).unwrap();
        finish(&mut producer);

        assert_eq!(worker.tick().unwrap(), WorkerState::Done);
        assert!(office.is_open());
    }

    #[test]
    fn interrupted_poll_is_not_fatal() {
        let (office, recorder) = instant_office();
        let _producer = office.producer(SessionId::new(1)).unwrap();
        let worker = office.worker();
        let interrupt = worker.interrupt_handle();

        let handle = thread::spawn(move || worker.run());
        interrupt.raise().unwrap();
        thread::sleep(Duration::from_millis(20));
        office.close().unwrap();

        assert!(handle.join().unwrap().unwrap().is_empty());
        let events = recorder.events();
        assert!(events.contains(&Event::Interrupted {
            actor: Actor::Worker
        }));
        assert_eq!(events.last(), Some(&Event::WorkerDone { processed: 0 }));
    }
}

use crate::{
    Error, Event, GatePermit, GateStatus, HandOff, Interrupt, Result, SessionId,
    mutex::lock,
    office::Shared,
    session::{Actor, Session},
};
use std::sync::Arc;

/// Where a producer is in its session.
///
/// ```text
/// Waiting --acquired--> InCounter --open--> Shipping --slept--> Recording --> Done
///    |  ^                   |                   |                    |
///    |  +-- timed out,      +-- closed --> Done +-- interrupted      +-- closed --> Done
///    |      office open         (rejected)          --> Done             (dropped late)
///    +-- timed out, office closed --> Done
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProducerState {
    Waiting,
    InCounter,
    Shipping,
    Recording,
    Done(Exit),
}

/// How a producer session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Exit {
    /// The item was admitted to the submission log.
    Recorded,
    /// The open-check at the counter failed.
    RejectedAtCounter,
    /// The office closed while the producer was waiting for the counter.
    RejectedWhileWaiting,
    /// The producer used up its admission attempts.
    AdmissionTimeout,
    /// The shipment finished after closing; the item was discarded.
    DroppedLate,
    /// A wait was interrupted; the session was abandoned.
    Interrupted,
}

impl Exit {
    pub fn is_recorded(self) -> bool {
        matches!(self, Self::Recorded)
    }

    /// The error this exit corresponds to, if it is not a success.
    pub fn error(self) -> Option<Error> {
        match self {
            Self::Recorded => None,
            Self::RejectedAtCounter | Self::RejectedWhileWaiting | Self::DroppedLate => {
                Some(Error::OfficeClosed)
            }
            Self::AdmissionTimeout => Some(Error::AdmissionTimeout),
            Self::Interrupted => Some(Error::WaitInterrupted),
        }
    }
}

/// One sender's attempt to get one item admitted.
///
/// Drive it with [`Producer::step`] for one transition at a time, or with
/// [`Producer::run`] on its own thread until it is done.
#[derive(Debug)]
pub struct Producer {
    session: Session,
    shared: Arc<Shared>,
    interrupt: Arc<Interrupt>,
    permit: Option<GatePermit>,
    state: ProducerState,
    attempts: u32,
}

impl Producer {
    pub(crate) fn new(shared: Arc<Shared>, id: SessionId) -> Result<Self> {
        Ok(Self {
            session: Session::register(Arc::clone(&shared), id)?,
            shared,
            interrupt: Arc::new(Interrupt::new()),
            permit: None,
            state: ProducerState::Waiting,
            attempts: 0,
        })
    }

    pub fn id(&self) -> SessionId {
        self.session.id()
    }

    pub fn state(&self) -> ProducerState {
        self.state
    }

    /// `true` while this producer holds the counter.
    pub fn holds_counter(&self) -> bool {
        self.permit.is_some()
    }

    /// The token that interrupts this producer's waits.
    pub fn interrupt_handle(&self) -> Arc<Interrupt> {
        Arc::clone(&self.interrupt)
    }

    /// Runs the session to completion.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures (a poisoned lock). Closure, timeouts and
    /// interruption end the session with the matching [`Exit`].
    pub fn run(mut self) -> Result<Exit> {
        self.shared.emit(Event::SessionStarted { id: self.id() });
        loop {
            if let ProducerState::Done(exit) = self.step()? {
                return Ok(exit);
            }
        }
    }

    /// Performs one transition and returns the new state.
    ///
    /// Stepping a finished producer returns its final state again. On reaching
    /// [`ProducerState::Done`] the counter is released if still held and the
    /// session is deregistered.
    pub fn step(&mut self) -> Result<ProducerState> {
        let next = match self.state {
            ProducerState::Waiting => self.wait_for_counter(),
            ProducerState::InCounter => self.check_open(),
            ProducerState::Shipping => self.ship(),
            ProducerState::Recording => self.record(),
            ProducerState::Done(_) => return Ok(self.state),
        };

        let next = match next {
            Ok(next) => next,
            Err(Error::WaitInterrupted) => {
                self.shared.emit(Event::Interrupted {
                    actor: Actor::Producer(self.id()),
                });
                ProducerState::Done(Exit::Interrupted)
            }
            Err(e) => return Err(e),
        };

        if let ProducerState::Done(_) = next {
            self.leave_counter();
            self.session.end()?;
        }
        self.state = next;
        Ok(next)
    }

    fn wait_for_counter(&mut self) -> Result<ProducerState> {
        let id = self.id();
        let config = &self.shared.config;

        match self
            .shared
            .gate
            .try_acquire(config.gate_acquire_timeout, &self.interrupt)?
        {
            GateStatus::Acquired { permit } => {
                self.permit = Some(permit);
                self.attempts = 0;
                self.shared.emit(Event::EnteredCounter { id });
                Ok(ProducerState::InCounter)
            }
            GateStatus::TimedOut => {
                self.attempts = self.attempts.saturating_add(1);
                {
                    let _ledger = lock(&self.shared.ledger)?;
                    if !self.shared.flag.is_open() {
                        self.shared.emit(Event::RejectedWhileWaiting { id });
                        return Ok(ProducerState::Done(Exit::RejectedWhileWaiting));
                    }
                    if config
                        .max_admission_attempts
                        .is_some_and(|max| self.attempts >= max)
                    {
                        self.shared.emit(Event::AdmissionTimedOut { id });
                        return Ok(ProducerState::Done(Exit::AdmissionTimeout));
                    }
                    self.shared.emit(Event::WaitingForCounter { id });
                }
                self.interrupt.sleep(config.producer_retry_backoff)?;
                Ok(ProducerState::Waiting)
            }
        }
    }

    /// The flag may have flipped between the acquire and now, so it is checked
    /// again under the office lock while the counter is held.
    fn check_open(&mut self) -> Result<ProducerState> {
        let id = self.id();
        {
            let _ledger = lock(&self.shared.ledger)?;
            if !self.shared.flag.is_open() {
                self.shared.emit(Event::RejectedAtCounter { id });
                return Ok(ProducerState::Done(Exit::RejectedAtCounter));
            }
            self.shared.emit(Event::Shipping { id });
        }

        if self.shared.config.hand_off == HandOff::ReleaseAfterCheck {
            self.leave_counter();
        }
        Ok(ProducerState::Shipping)
    }

    fn ship(&mut self) -> Result<ProducerState> {
        self.interrupt.sleep(self.shared.config.shipping_duration)?;
        Ok(ProducerState::Recording)
    }

    fn record(&mut self) -> Result<ProducerState> {
        let id = self.id();
        let mut ledger = lock(&self.shared.ledger)?;
        if self.shared.flag.is_open() {
            ledger.log.append(id);
            self.shared.emit(Event::Recorded { id });
            Ok(ProducerState::Done(Exit::Recorded))
        } else {
            self.shared.emit(Event::DroppedLate { id });
            Ok(ProducerState::Done(Exit::DroppedLate))
        }
    }

    fn leave_counter(&mut self) {
        if let Some(permit) = self.permit.take() {
            self.shared.emit(Event::LeftCounter { id: self.id() });
            permit.release();
        }
    }
}

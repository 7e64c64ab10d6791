//! The office's status stream.
//!
//! Every state transition of a producer, the worker or the office itself is
//! reported as one [`Event`]. Wording is for humans; the sequence of variants
//! is what callers can rely on. Events whose relative order matters (log
//! appends, processing, closure, rejections) are emitted while the office
//! lock is held, so an [`Observer`] sees them in the order the underlying
//! state changed.

use crate::{
    SessionId,
    mutex::{Mutex, lock},
    session::Actor,
};
use core::fmt;

/// One state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Event {
    /// A producer thread began its session.
    SessionStarted { id: SessionId },
    /// The counter was busy for a whole acquire timeout; the producer backs off
    /// and retries.
    WaitingForCounter { id: SessionId },
    /// The producer acquired the counter.
    EnteredCounter { id: SessionId },
    /// The producer is about to give the counter back.
    LeftCounter { id: SessionId },
    /// The open-check at the counter found the office closed.
    RejectedAtCounter { id: SessionId },
    /// The open-check at the counter passed; the shipment is under way.
    Shipping { id: SessionId },
    /// The office closed while the producer was waiting for the counter.
    RejectedWhileWaiting { id: SessionId },
    /// The producer ran out of admission attempts.
    AdmissionTimedOut { id: SessionId },
    /// The item was appended to the submission log.
    Recorded { id: SessionId },
    /// The shipment completed after closing time and was discarded.
    DroppedLate { id: SessionId },
    /// A wait was interrupted.
    Interrupted { actor: Actor },
    /// The worker processed the next logged item.
    Processed { id: SessionId },
    /// The office closed.
    OfficeClosed,
    /// The worker noticed the office closed and is draining.
    WorkerDraining,
    /// The worker finished after processing `processed` items.
    WorkerDone { processed: usize },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionStarted { id } => write!(f, "Sender {id} arrives at the post office"),
            Self::WaitingForCounter { id } => {
                write!(f, "Sender {id} waits for the postal worker")
            }
            Self::EnteredCounter { id } => write!(f, "Sender {id} steps up to the counter"),
            Self::LeftCounter { id } => write!(f, "Sender {id} leaves the counter"),
            Self::RejectedAtCounter { id } => {
                write!(f, "Sender {id} finds the post office closed and leaves")
            }
            Self::Shipping { id } => write!(f, "Sender {id} is sending a parcel"),
            Self::RejectedWhileWaiting { id } => {
                write!(f, "Sender {id} gives up waiting: the post office closed")
            }
            Self::AdmissionTimedOut { id } => {
                write!(f, "Sender {id} gives up waiting for the counter")
            }
            Self::Recorded { id } => write!(f, "Sender {id} finished sending"),
            Self::DroppedLate { id } => {
                write!(f, "Sender {id} finished after closing time; parcel not accepted")
            }
            Self::Interrupted { actor } => write!(f, "The {actor} was interrupted"),
            Self::Processed { id } => {
                write!(f, "Postal worker processes the parcel from sender {id}")
            }
            Self::OfficeClosed => f.write_str("The post office is closing; no more parcels accepted"),
            Self::WorkerDraining => f.write_str("Postal worker is clearing the remaining parcels"),
            Self::WorkerDone { processed } => {
                write!(f, "Postal worker processed {processed} parcels and goes home")
            }
        }
    }
}

/// Receives the office's events.
///
/// Called synchronously on the thread that caused the transition, sometimes
/// while the office lock is held. Implementations must be quick and must not
/// call back into the office.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<F> Observer for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event);
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&self, _event: &Event) {}
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<Event>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        lock(&self.events).map(|e| e.clone()).unwrap_or_default()
    }
}

impl Observer for EventRecorder {
    fn on_event(&self, event: &Event) {
        if let Ok(mut events) = lock(&self.events) {
            events.push(event.clone());
        }
    }
}

/// Writes events through `tracing`.
///
/// Routine transitions go out at `info`, waiting and per-counter noise at
/// `debug`, and discarded or interrupted work at `warn`.
#[cfg_attr(docsrs, doc(cfg(feature = "tracing")))]
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

#[cfg(feature = "tracing")]
impl Observer for TracingObserver {
    fn on_event(&self, event: &Event) {
        match event {
            Event::EnteredCounter { .. }
            | Event::LeftCounter { .. }
            | Event::WaitingForCounter { .. } => tracing::debug!("{event}"),
            Event::DroppedLate { .. }
            | Event::Interrupted { .. }
            | Event::AdmissionTimedOut { .. } => tracing::warn!("{event}"),
            _ => tracing::info!("{event}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn recorder_keeps_order() {
        let recorder = EventRecorder::new();
        recorder.on_event(&Event::OfficeClosed);
        recorder.on_event(&Event::WorkerDraining);
        recorder.on_event(&Event::WorkerDone { processed: 0 });

        assert_eq!(
            recorder.events(),
            vec![
                Event::OfficeClosed,
                Event::WorkerDraining,
                Event::WorkerDone { processed: 0 }
            ]
        );
    }

    #[test]
    fn closures_observe() {
        let recorder = Arc::new(EventRecorder::new());
        let forward = {
            let recorder = Arc::clone(&recorder);
            move |event: &Event| recorder.on_event(event)
        };
        forward.on_event(&Event::OfficeClosed);

        let shared: Arc<dyn Observer> = recorder.clone();
        shared.on_event(&Event::WorkerDraining);

        assert_eq!(recorder.events().len(), 2);
    }

    #[test]
    fn display_names_the_session() {
        let id = SessionId::new(2);
        assert!(Event::Recorded { id }.to_string().contains("#2"));
        assert!(
            Event::Interrupted {
                actor: Actor::Producer(id)
            }
            .to_string()
            .contains("producer #2")
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_string(&Event::Processed {
            id: SessionId::new(3),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"processed","id":3}"#);
    }
}

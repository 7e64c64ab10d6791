use crate::{Result, mutex::lock, office::Shared};
use core::fmt;
use std::sync::Arc;

/// Identifier of a producer session.
///
/// Sessions started by [`Office::open`](crate::Office::open) are numbered from
/// `1` in start order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SessionId(u32);

impl SessionId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for SessionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A thread whose waits can be interrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Actor {
    Worker,
    Producer(SessionId),
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Worker => f.write_str("worker"),
            Self::Producer(id) => write!(f, "producer {id}"),
        }
    }
}

/// Registration of one producer session with the office.
///
/// Counts towards the office's outstanding sessions from creation until
/// [`Session::end`] or drop, whichever comes first. The worker may only finish
/// while the office is open once this count reaches zero.
#[derive(Debug)]
pub(crate) struct Session {
    id: SessionId,
    active: bool,
    shared: Arc<Shared>,
}

impl Session {
    pub(crate) fn register(shared: Arc<Shared>, id: SessionId) -> Result<Self> {
        lock(&shared.ledger)?.outstanding += 1;
        Ok(Self {
            id,
            active: true,
            shared,
        })
    }

    pub(crate) fn id(&self) -> SessionId {
        self.id
    }

    /// Deregisters the session; later calls do nothing.
    pub(crate) fn end(&mut self) -> Result<()> {
        if self.active {
            lock(&self.shared.ledger)?.outstanding -= 1;
            self.active = false;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(_e) = self.end() {
            #[cfg(feature = "tracing")]
            tracing::error!("Session {} could not deregister: {_e}", self.id);
        }
    }
}

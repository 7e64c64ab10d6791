use crate::SessionId;

/// Ordered, append-only record of admitted items.
///
/// Written only by producers and read only by the worker, both while holding
/// the office lock, so an entry is never observed half-written or out of
/// order. Its order is the order in which producers finished recording, which
/// can differ from the order they reached the counter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionLog {
    entries: Vec<SessionId>,
}

impl SubmissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` and returns its index.
    pub fn append(&mut self, id: SessionId) -> usize {
        self.entries.push(id);
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<SessionId> {
        self.entries.get(index).copied()
    }

    pub fn as_slice(&self) -> &[SessionId] {
        &self.entries
    }
}

/// Shared state guarded by the office lock.
///
/// `cursor <= log.len()` always holds; the number of finished producers is the
/// log length, since appending and counting happen in the same critical
/// section.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    pub(crate) log: SubmissionLog,
    pub(crate) cursor: usize,
    pub(crate) outstanding: usize,
}

impl Ledger {
    /// Advances the cursor past the next unprocessed entry and returns it.
    pub(crate) fn take_next(&mut self) -> Option<SessionId> {
        let id = self.log.get(self.cursor)?;
        self.cursor += 1;
        Some(id)
    }

    pub(crate) fn finished(&self) -> usize {
        self.log.len()
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.cursor >= self.finished()
    }
}

/// A consistent copy of the office's shared state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// Admitted items in processing order.
    pub log: Vec<SessionId>,
    /// How many of them the worker has processed.
    pub processed: usize,
    /// Producer sessions that have not ended yet.
    pub outstanding: usize,
    /// Whether the office was open when the snapshot was taken.
    pub open: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_order() {
        let mut log = SubmissionLog::new();
        assert!(log.is_empty());
        assert_eq!(log.append(SessionId::new(3)), 0);
        assert_eq!(log.append(SessionId::new(1)), 1);
        assert_eq!(log.as_slice(), &[SessionId::new(3), SessionId::new(1)]);
        assert_eq!(log.get(2), None);
    }

    #[test]
    fn cursor_never_passes_log() {
        let mut ledger = Ledger::default();
        assert!(ledger.is_drained());
        assert_eq!(ledger.take_next(), None);

        ledger.log.append(SessionId::new(2));
        ledger.log.append(SessionId::new(1));
        assert!(!ledger.is_drained());

        assert_eq!(ledger.take_next(), Some(SessionId::new(2)));
        assert_eq!(ledger.take_next(), Some(SessionId::new(1)));
        assert_eq!(ledger.take_next(), None);
        assert_eq!(ledger.cursor, 2);
        assert!(ledger.is_drained());
    }
}

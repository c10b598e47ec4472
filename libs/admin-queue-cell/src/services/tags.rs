use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use shared_models::AdminBooking;

#[derive(Debug, Default)]
struct TagState {
    last_issued: u64,
    in_flight: BTreeSet<u64>,
    // id -> newest read ticket issued when the row was removed
    removed: HashMap<String, u64>,
}

impl TagState {
    /// Drops tags no in-flight read can still trip over.
    fn prune(&mut self) {
        let oldest = self.in_flight.first().copied();
        self.removed.retain(|id, removed_after| {
            let needed = oldest.is_some_and(|oldest| oldest <= *removed_after);
            if !needed {
                debug!("Retiring optimistic tag for {}", id);
            }
            needed
        });
    }
}

/// Records removed locally ahead of the server.
///
/// Every listing read holds a [`ReadTicket`] while it is in flight. A removal
/// remembers the newest ticket issued so far; reads holding that ticket or an
/// older one started before the removal and never bring the record back, no
/// matter when they finish. Reads started afterwards are authoritative. A tag
/// is retired once the last read that started before it has finished.
#[derive(Debug, Default)]
pub struct OptimisticTags {
    state: Mutex<TagState>,
}

/// One listing read in flight. Dropping it ends the read.
#[derive(Debug)]
pub struct ReadTicket<'a> {
    tags: &'a OptimisticTags,
    seq: u64,
}

impl ReadTicket<'_> {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Drop for ReadTicket<'_> {
    fn drop(&mut self) {
        let mut state = self.tags.lock();
        state.in_flight.remove(&self.seq);
        state.prune();
    }
}

impl OptimisticTags {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TagState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ticket for a listing read that is about to start.
    pub fn begin_read(&self) -> ReadTicket<'_> {
        let mut state = self.lock();
        state.last_issued += 1;
        let seq = state.last_issued;
        state.in_flight.insert(seq);

        ReadTicket { tags: self, seq }
    }

    pub fn tag_removed(&self, internal_id: &str) {
        let mut state = self.lock();
        let issued = state.last_issued;
        state.removed.insert(internal_id.to_string(), issued);
        state.prune();
    }

    pub fn is_tagged(&self, internal_id: &str) -> bool {
        self.lock().removed.contains_key(internal_id)
    }

    pub fn len(&self) -> usize {
        self.lock().removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().removed.is_empty()
    }

    /// Filters a listing fetched under `ticket`.
    pub fn reconcile(&self, ticket: &ReadTicket<'_>, mut listing: Vec<AdminBooking>) -> Vec<AdminBooking> {
        let state = self.lock();

        listing.retain(|row| match state.removed.get(&row.internal_id) {
            Some(removed_after) if ticket.seq <= *removed_after => {
                debug!("Hiding {} from listing {}", row.internal_id, ticket.seq);
                false
            }
            _ => true,
        });

        listing
    }
}

//! Debounced, single-flight autosave bookkeeping
//!
//! The scheduler owns no content and performs no I/O. It answers two
//! questions for the editor session: "is a save due now?" (`poll`) and "may a
//! save for this content go out now?" (`begin`/`finish`). A save that is due
//! while another one for the same content is in flight is deferred, and the
//! editor sends the freshest state once the first one resolves.

use crate::debouncer::Debouncer;
use crate::section::ContentId;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
pub struct AutosaveScheduler {
    debouncer: Debouncer,
    in_flight: HashSet<ContentId>,
    deferred: HashSet<ContentId>,
}

impl AutosaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            in_flight: HashSet::new(),
            deferred: HashSet::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.debouncer.delay()
    }

    /// (Re)start the timer after a dirty-causing edit
    pub fn arm(&mut self, now: Instant) {
        self.debouncer.arm(now);
    }

    /// Drop the pending autosave, if any
    pub fn cancel(&mut self) {
        if self.debouncer.is_pending() {
            debug!("AutosaveScheduler: pending autosave cancelled");
        }
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_remaining(now)
    }

    /// True once when the quiet period after the last edit has elapsed
    pub fn poll(&mut self, now: Instant) -> bool {
        self.debouncer.fire(now)
    }

    /// Claim the save slot for `content_id`.
    ///
    /// Returns false when a save is already in flight; the request is then
    /// remembered and `finish` reports it.
    pub fn begin(&mut self, content_id: ContentId) -> bool {
        if self.in_flight.contains(&content_id) {
            debug!(
                "AutosaveScheduler: save for content {} deferred behind in-flight request",
                content_id
            );
            self.deferred.insert(content_id);
            return false;
        }
        self.in_flight.insert(content_id);
        true
    }

    /// Release the save slot. Returns true when a deferred save is waiting.
    pub fn finish(&mut self, content_id: ContentId) -> bool {
        self.in_flight.remove(&content_id);
        self.deferred.remove(&content_id)
    }

    pub fn is_in_flight(&self, content_id: ContentId) -> bool {
        self.in_flight.contains(&content_id)
    }

    pub fn has_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }
}

//! Drag-and-drop reordering with optimistic apply and reconciliation
//!
//! A move is applied to the store immediately. The full `{id, order_index}`
//! list is then committed; when a commit fails the optimistic list is thrown
//! away and the server's order is reloaded. Only one commit is in flight at a
//! time; moves made meanwhile are folded into a single follow-up commit.

use crate::section::{Section, SectionId, SectionOrder};
use crate::section_store::{renumber, SectionStore};
use tracing::{debug, info, warn};

/// A drop gesture: `active_id` was released over `over_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    pub active_id: SectionId,
    pub over_id: Option<SectionId>,
}

impl MoveEvent {
    pub fn new(active_id: SectionId, over_id: SectionId) -> Self {
        Self {
            active_id,
            over_id: Some(over_id),
        }
    }
}

/// Move the active section into the slot of the one it was dropped on.
///
/// This is a splice (remove then insert), not a swap: every section between
/// the two slots shifts by one and keeps its relative order. Every
/// `order_index` is rewritten. Returns `None` when the event is a no-op.
pub fn move_section(sections: &[Section], event: MoveEvent) -> Option<Vec<Section>> {
    let over_id = event.over_id?;
    if over_id == event.active_id {
        return None;
    }

    let old_index = sections.iter().position(|s| s.id == event.active_id)?;
    let new_index = sections.iter().position(|s| s.id == over_id)?;

    let mut moved = sections.to_vec();
    let section = moved.remove(old_index);
    moved.insert(new_index, section);
    renumber(&mut moved);
    Some(moved)
}

/// A reorder request ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderCommit {
    pub generation: u64,
    pub orders: Vec<SectionOrder>,
}

/// What the caller should do after a commit resolves
#[derive(Debug, Clone, PartialEq)]
pub enum ReorderFollowUp {
    Idle,
    /// More moves happened while the commit was in flight
    Commit(ReorderCommit),
    /// The commit failed; reload the canonical order
    Reconcile { token: u64 },
}

#[derive(Debug, Default)]
pub struct ReorderCoordinator {
    /// Bumped on every local change to the order
    generation: u64,
    in_flight: Option<u64>,
    queued: bool,
    reloading: Option<u64>,
}

impl ReorderCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_committing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_reconciling(&self) -> bool {
        self.reloading.is_some()
    }

    /// Apply a move to the store optimistically.
    ///
    /// Returns the commit to send, or `None` when the move was a no-op or a
    /// commit is already in flight (the new order goes out after it).
    pub fn apply_move(&mut self, store: &mut SectionStore, event: MoveEvent) -> Option<ReorderCommit> {
        let Some(moved) = move_section(store.sections(), event) else {
            debug!("ReorderCoordinator: ignoring no-op move {:?}", event);
            return None;
        };
        store.apply_order(moved);
        info!(
            "ReorderCoordinator: moved section {} over {:?}",
            event.active_id, event.over_id
        );
        self.local_change(store)
    }

    /// The store's order changed locally for another reason (e.g. a deletion)
    pub fn local_change(&mut self, store: &SectionStore) -> Option<ReorderCommit> {
        self.generation += 1;
        self.begin_commit(store)
    }

    fn begin_commit(&mut self, store: &SectionStore) -> Option<ReorderCommit> {
        if self.in_flight.is_some() {
            self.queued = true;
            return None;
        }
        self.in_flight = Some(self.generation);
        Some(ReorderCommit {
            generation: self.generation,
            orders: store.order(),
        })
    }

    /// Record the outcome of the commit for `generation`
    pub fn finish_commit(
        &mut self,
        store: &SectionStore,
        generation: u64,
        succeeded: bool,
    ) -> ReorderFollowUp {
        if self.in_flight != Some(generation) {
            warn!(
                "ReorderCoordinator: unexpected commit result for generation {}",
                generation
            );
            return ReorderFollowUp::Idle;
        }
        self.in_flight = None;

        if !succeeded {
            self.queued = false;
            self.reloading = Some(self.generation);
            return ReorderFollowUp::Reconcile {
                token: self.generation,
            };
        }
        if std::mem::take(&mut self.queued) {
            if let Some(commit) = self.begin_commit(store) {
                return ReorderFollowUp::Commit(commit);
            }
        }
        ReorderFollowUp::Idle
    }

    /// Whether a reload started with `token` may replace the local list.
    ///
    /// A reload is stale once the user has reordered again after it started.
    pub fn accept_reload(&mut self, token: u64) -> bool {
        if self.reloading == Some(token) {
            self.reloading = None;
        }
        token == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section_store::is_dense;
    use crate::section_store::tests::section;

    fn abc() -> Vec<Section> {
        vec![section(1, "a", 1), section(2, "b", 2), section(3, "c", 3)]
    }

    fn keys(sections: &[Section]) -> Vec<(String, u32)> {
        sections
            .iter()
            .map(|s| (s.key.clone(), s.order_index))
            .collect()
    }

    #[test]
    fn test_drag_b_onto_c() {
        let moved = move_section(&abc(), MoveEvent::new(2, 3)).unwrap();
        assert_eq!(
            keys(&moved),
            vec![("a".into(), 1), ("c".into(), 2), ("b".into(), 3)]
        );
    }

    #[test]
    fn test_noop_moves() {
        assert!(move_section(&abc(), MoveEvent::new(2, 2)).is_none());
        assert!(move_section(
            &abc(),
            MoveEvent {
                active_id: 2,
                over_id: None
            }
        )
        .is_none());
        assert!(move_section(&abc(), MoveEvent::new(2, 42)).is_none());
    }

    #[test]
    fn test_move_is_splice_not_swap() {
        let sections: Vec<Section> = (1..=6)
            .map(|i| section(i, &format!("s{i}"), i as u32))
            .collect();

        for i in 0..sections.len() {
            for j in 0..sections.len() {
                if i == j {
                    continue;
                }
                let event = MoveEvent::new(sections[i].id, sections[j].id);
                let moved = move_section(&sections, event).unwrap();

                let mut expected: Vec<SectionId> = sections.iter().map(|s| s.id).collect();
                let id = expected.remove(i);
                expected.insert(j, id);

                let got: Vec<SectionId> = moved.iter().map(|s| s.id).collect();
                assert_eq!(got, expected, "move {i} -> {j}");
                assert!(is_dense(&moved));
            }
        }
    }

    #[test]
    fn test_moving_up_shifts_others_down() {
        let moved = move_section(&abc(), MoveEvent::new(3, 1)).unwrap();
        assert_eq!(
            keys(&moved),
            vec![("c".into(), 1), ("a".into(), 2), ("b".into(), 3)]
        );
    }

    #[test]
    fn test_moves_during_commit_coalesce() {
        let mut store = SectionStore::new();
        store.load_sections(abc());
        let mut coordinator = ReorderCoordinator::new();

        let first = coordinator.apply_move(&mut store, MoveEvent::new(1, 3)).unwrap();
        assert!(coordinator.is_committing());

        // Two more moves while the first commit is out
        assert!(coordinator.apply_move(&mut store, MoveEvent::new(2, 1)).is_none());
        assert!(coordinator.apply_move(&mut store, MoveEvent::new(3, 2)).is_none());

        match coordinator.finish_commit(&store, first.generation, true) {
            ReorderFollowUp::Commit(next) => {
                assert_eq!(next.orders, store.order());
                assert_eq!(next.generation, 3);
            }
            other => panic!("expected follow-up commit, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_commit_requests_reconcile() {
        let mut store = SectionStore::new();
        store.load_sections(abc());
        let mut coordinator = ReorderCoordinator::new();

        let commit = coordinator.apply_move(&mut store, MoveEvent::new(1, 2)).unwrap();
        coordinator.apply_move(&mut store, MoveEvent::new(3, 1));

        let follow_up = coordinator.finish_commit(&store, commit.generation, false);
        let ReorderFollowUp::Reconcile { token } = follow_up else {
            panic!("expected reconcile");
        };
        assert!(coordinator.is_reconciling());
        assert!(coordinator.accept_reload(token));
        assert!(!coordinator.is_reconciling());
    }

    #[test]
    fn test_reload_is_stale_after_new_move() {
        let mut store = SectionStore::new();
        store.load_sections(abc());
        let mut coordinator = ReorderCoordinator::new();

        let commit = coordinator.apply_move(&mut store, MoveEvent::new(1, 2)).unwrap();
        let ReorderFollowUp::Reconcile { token } =
            coordinator.finish_commit(&store, commit.generation, false)
        else {
            panic!("expected reconcile");
        };

        coordinator.apply_move(&mut store, MoveEvent::new(3, 1));
        assert!(!coordinator.accept_reload(token));
    }
}

//! Most-recent-selection-wins bookkeeping. Stop resolution runs async
//! against the schedule provider, so a user can select a second vehicle
//! while the first resolution is still in flight; the stale result must
//! not overwrite the newer selection's stops.

use std::sync::Mutex;

use serde::Serialize;

use crate::schedule::ResolvedStop;

/// Handle for one selection attempt. Only the token from the most recent
/// `begin` can commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionToken(u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedTrip {
    pub trip_id: String,
    pub stops: Vec<ResolvedStop>,
}

#[derive(Default)]
pub struct SelectionGuard {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    current: Option<SelectedTrip>,
}

impl SelectionGuard {
    /// Marks a new selection as the active one and returns its token.
    /// Tokens handed out earlier become stale immediately.
    pub fn begin(&self) -> SelectionToken {
        let mut inner = self.inner.lock().unwrap();
        inner.generation += 1;
        SelectionToken(inner.generation)
    }

    /// Stores the resolved trip if `token` still belongs to the active
    /// selection. Returns whether the commit won.
    pub fn commit(&self, token: SelectionToken, selected: SelectedTrip) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if token.0 != inner.generation {
            return false;
        }
        inner.current = Some(selected);
        true
    }

    /// The last selection that committed successfully.
    pub fn current(&self) -> Option<SelectedTrip> {
        self.inner.lock().unwrap().current.clone()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn selected(trip_id: &str) -> SelectedTrip {
        SelectedTrip {
            trip_id: trip_id.to_string(),
            stops: vec![],
        }
    }

    #[test]
    fn test_commit_stores_current() {
        let guard = SelectionGuard::default();

        let token = guard.begin();
        assert!(guard.commit(token, selected("T1")));
        assert_eq!(guard.current().unwrap().trip_id, "T1");
    }

    #[test]
    fn test_stale_resolution_cannot_overwrite_newer_selection() {
        let guard = SelectionGuard::default();

        let first = guard.begin();
        let second = guard.begin();

        // The second selection resolves before the first
        assert!(guard.commit(second, selected("T2")));

        // The first selection's late result loses
        assert!(!guard.commit(first, selected("T1")));
        assert_eq!(guard.current().unwrap().trip_id, "T2");
    }

    #[test]
    fn test_no_selection_yet() {
        let guard = SelectionGuard::default();
        assert!(guard.current().is_none());
    }

    #[test]
    fn test_uncommitted_begin_keeps_previous_result() {
        let guard = SelectionGuard::default();

        let token = guard.begin();
        guard.commit(token, selected("T1"));

        // A newer selection that has not resolved yet does not clear the view
        guard.begin();
        assert_eq!(guard.current().unwrap().trip_id, "T1");
    }
}

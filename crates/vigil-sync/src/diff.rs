//! Head-identity change detection across ordered list snapshots.
//!
//! Views poll full lists and re-render; the tracker answers the one cheap
//! question that drives a transient "new row" highlight: did the head of
//! the list change since the previous snapshot? Entities stay opaque -
//! only the identity of the first element is compared, never content.

/// Tracks the head identity of successive snapshots for one view.
///
/// The first observation never signals, so the initial load does not
/// flash every row that happens to be at the top.
#[derive(Debug, Default)]
pub struct ListDiffTracker<Id> {
    last_top: Option<Id>,
}

impl<Id: Clone + PartialEq> ListDiffTracker<Id> {
    pub fn new() -> Self {
        Self { last_top: None }
    }

    /// Observe the newest snapshot and return the identity to highlight,
    /// if any.
    ///
    /// Signals only when a previous head was recorded and the new head
    /// differs from it. The stored head is unconditionally replaced
    /// (cleared when the snapshot is empty), so a later unrelated
    /// re-render of the same snapshot cannot re-trigger the highlight.
    pub fn update<T, F>(&mut self, snapshot: &[T], mut id_of: F) -> Option<Id>
    where
        F: FnMut(&T) -> Id,
    {
        let new_top = snapshot.first().map(&mut id_of);
        let signal = match (&self.last_top, &new_top) {
            (Some(prev), Some(top)) if prev != top => Some(top.clone()),
            _ => None,
        };
        self.last_top = new_top;
        signal
    }

    /// Identity recorded by the most recent [`Self::update`] call.
    pub fn last_top(&self) -> Option<&Id> {
        self.last_top.as_ref()
    }
}

use std::collections::BTreeMap;
use std::ops::Bound;

pub(crate) type DeferredQuery = Box<dyn FnOnce() + Send>;

/// QueryGates parks deferred queries keyed by the release point they wait
/// for (a command sequence or a log index). The map is ordered so the
/// advancement loop can step straight to the next occupied gate instead of
/// visiting every intermediate point.
pub(crate) struct QueryGates {
    gates: BTreeMap<u64, Vec<DeferredQuery>>,
}

impl QueryGates {
    pub(crate) fn new() -> Self {
        QueryGates { gates: BTreeMap::new() }
    }

    pub(crate) fn register(&mut self, point: u64, query: DeferredQuery) {
        self.gates.entry(point).or_default().push(query);
    }

    /// `next_point_within()` returns the lowest occupied gate in
    /// `(after, through]`, if any. Gates at or below `after` stay dormant:
    /// their release point has already passed.
    pub(crate) fn next_point_within(&self, after: u64, through: u64) -> Option<u64> {
        self.gates
            .range((Bound::Excluded(after), Bound::Included(through)))
            .next()
            .map(|(point, _)| *point)
    }

    /// `take()` removes and returns every query parked at `point`.
    pub(crate) fn take(&mut self, point: u64) -> Vec<DeferredQuery> {
        self.gates.remove(&point).unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.gates.values().map(Vec::len).sum()
    }
}

//! Per-worker state threaded through a phase: this worker's edge slice,
//! its phase-local adjacency registration, and its ball arena.

use std::collections::{HashMap, HashSet};

use gu_fabric::Exchange;
use gu_ident::{EdgeId, VertexId};
use gu_store::{BallArena, EdgeStore};

/// One worker's full local state for one engine run.
pub struct Worker<F: Exchange> {
    /// The exchange fabric this worker communicates over.
    pub fabric: F,
    /// This worker's slice of the edge set.
    pub store: EdgeStore,
    /// Phase-local registration: `vertex -> [(incident eid, other endpoint)]`,
    /// rebuilt every phase by the sparsifier.
    pub(crate) incidence: HashMap<VertexId, Vec<(EdgeId, VertexId)>>,
    /// Ball storage for the exponentiator's current batch.
    pub(crate) arena: BallArena,
    /// Vertices owned locally that have been confirmed matched. Persistent
    /// across phases, unlike everything else in this struct.
    pub(crate) retired: HashSet<VertexId>,
}

impl<F: Exchange> Worker<F> {
    /// Builds a worker from a fabric handle and this worker's edge slice.
    #[must_use]
    pub fn new(fabric: F, store: EdgeStore) -> Self {
        Self {
            fabric,
            store,
            incidence: HashMap::new(),
            arena: BallArena::with_capacity(0, 0),
            retired: HashSet::new(),
        }
    }

    /// This worker's rank, per [`Exchange::rank`].
    #[must_use]
    pub fn rank(&self) -> usize {
        self.fabric.rank()
    }

    /// Total worker count, per [`Exchange::world_size`].
    #[must_use]
    pub fn world_size(&self) -> usize {
        self.fabric.world_size()
    }
}

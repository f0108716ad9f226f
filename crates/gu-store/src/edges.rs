//! The stable, fixed-order edge array and its phase-local fields.

use std::collections::HashMap;

use gu_ident::{edge_id, EdgeId, VertexId};

use crate::StoreError;

/// Per-edge state held by its owner.
///
/// `active`, `matched` are monotone and terminal; `deg_in_sparse`,
/// `stalled`, `priority`, and the ball (held out-of-band in
/// [`crate::BallArena`]) are phase-local and overwritten every phase.
#[derive(Debug, Clone)]
pub struct EdgeSlot {
    /// First endpoint as supplied at ingest (not necessarily `min(u, v)`).
    pub u: VertexId,
    /// Second endpoint as supplied at ingest.
    pub v: VertexId,
    /// Symmetric global edge id, `eid(u, v)`.
    pub eid: EdgeId,
    /// Not yet deleted. Toggles `true -> false` exactly once.
    pub active: bool,
    /// Part of the output matching. Toggles `false -> true` exactly once.
    pub matched: bool,
    /// Whether this edge was drawn into this phase's sparsified line graph.
    pub participates: bool,
    /// Number of sparsified line-graph neighbors, valid only while
    /// `participates` is true for the current phase.
    pub deg_in_sparse: i64,
    /// Excluded from this phase's exponentiation/MIS round because its
    /// sparse degree exceeds the phase threshold (or it did not
    /// participate).
    pub stalled: bool,
    /// Deterministic per-(eid, phase) MIS priority.
    pub priority: u64,
}

impl EdgeSlot {
    fn new(u: VertexId, v: VertexId) -> Self {
        Self {
            u,
            v,
            eid: edge_id(u, v),
            active: true,
            matched: false,
            participates: false,
            deg_in_sparse: 0,
            stalled: true,
            priority: 0,
        }
    }

    /// Resets the phase-local fields at the start of a new phase. `active`
    /// and `matched` are left untouched.
    pub fn reset_phase_local(&mut self) {
        self.participates = false;
        self.deg_in_sparse = 0;
        self.stalled = true;
        self.priority = 0;
    }

    /// The endpoint other than `from`. Panics if `from` is not an endpoint,
    /// which would indicate state-store corruption.
    #[must_use]
    pub fn other(&self, from: VertexId) -> VertexId {
        if from == self.u {
            self.v
        } else {
            debug_assert_eq!(from, self.v, "vertex is not an endpoint of this edge");
            self.u
        }
    }
}

/// Owns the fixed-order edge array and the `eid -> local index` map for one
/// worker's edge slice.
///
/// Positions are stable for the duration of a phase;
/// [`EdgeStore::compact_if_needed`] is the only operation that may change
/// them, and it is only ever called between phases.
#[derive(Debug, Default)]
pub struct EdgeStore {
    edges: Vec<EdgeSlot>,
    id_to_index: HashMap<EdgeId, usize>,
}

impl EdgeStore {
    /// Builds the store from this worker's slice of `(u, v)` edge pairs.
    /// The collaborator is expected to have already filtered self-loops and
    /// duplicates; this constructor additionally deduplicates defensively by
    /// `eid`, keeping the first occurrence.
    #[must_use]
    pub fn init(edge_pairs: impl IntoIterator<Item = (VertexId, VertexId)>) -> Self {
        let mut edges = Vec::new();
        let mut id_to_index = HashMap::new();
        for (u, v) in edge_pairs {
            if u == v {
                continue;
            }
            let slot = EdgeSlot::new(u, v);
            if id_to_index.contains_key(&slot.eid) {
                continue;
            }
            id_to_index.insert(slot.eid, edges.len());
            edges.push(slot);
        }
        Self { edges, id_to_index }
    }

    /// Number of edge slots held locally (including inactive ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when this worker holds no edges at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Count of locally active edges.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.edges.iter().filter(|e| e.active).count()
    }

    /// Iterates over all local edge slots with their stable local index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &EdgeSlot)> {
        self.edges.iter().enumerate()
    }

    /// Iterates mutably over all local edge slots with their stable local index.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut EdgeSlot)> {
        self.edges.iter_mut().enumerate()
    }

    /// Looks up a slot by local index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EdgeSlot> {
        self.edges.get(index)
    }

    /// Looks up a slot mutably by local index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut EdgeSlot> {
        self.edges.get_mut(index)
    }

    /// Resolves a global eid to this worker's local index, if owned here.
    #[must_use]
    pub fn index_of(&self, eid: EdgeId) -> Option<usize> {
        self.id_to_index.get(&eid).copied()
    }

    /// Resolves a global eid to its slot, returning [`StoreError::UnknownEdge`]
    /// when this worker does not own it.
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownEdge`] if `eid` is not present locally.
    pub fn get_by_eid(&self, eid: EdgeId) -> Result<&EdgeSlot, StoreError> {
        self.index_of(eid)
            .and_then(|i| self.edges.get(i))
            .ok_or(StoreError::UnknownEdge(eid))
    }

    /// Resets phase-local fields on every edge slot; called once at the
    /// start of each phase by the phase driver.
    pub fn reset_phase_local_all(&mut self) {
        for slot in &mut self.edges {
            slot.reset_phase_local();
        }
    }

    /// Fraction of local slots that are still active; drives the
    /// compaction threshold decision in [`EdgeStore::compact_if_needed`].
    #[must_use]
    pub fn active_fraction(&self) -> f64 {
        if self.edges.is_empty() {
            return 1.0;
        }
        self.active_count() as f64 / self.edges.len() as f64
    }

    /// Rebuilds the edge array and `id_to_index` map, dropping inactive
    /// edges, but only when the active fraction is below `threshold`. Never
    /// called inside a phase — callers are responsible for only invoking
    /// this between phases; this function does not itself track phase
    /// state.
    pub fn compact_if_needed(&mut self, threshold: f64) -> bool {
        if self.active_fraction() >= threshold {
            return false;
        }
        let retained: Vec<EdgeSlot> = std::mem::take(&mut self.edges)
            .into_iter()
            .filter(|e| e.active)
            .collect();
        let mut id_to_index = HashMap::with_capacity(retained.len());
        for (index, slot) in retained.iter().enumerate() {
            id_to_index.insert(slot.eid, index);
        }
        self.edges = retained;
        self.id_to_index = id_to_index;
        true
    }
}

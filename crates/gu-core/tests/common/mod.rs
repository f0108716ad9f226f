//! Shared helpers for the integration test suite.

use std::collections::HashSet;

use gu_core::{EdgeId, VertexId};

/// Flattens a run's per-worker results into one global matched-eid set.
pub fn matched_eids(results: &[gu_core::MatchingResult]) -> HashSet<EdgeId> {
    results.iter().flat_map(|r| r.matched_local.iter().copied()).collect()
}

/// A matching is valid and maximal over `edges` iff it is vertex-disjoint
/// and no unmatched edge has both endpoints free.
pub fn assert_valid_and_maximal(edges: &[(VertexId, VertexId)], matched: &HashSet<EdgeId>) {
    let mut matched_vertices: HashSet<VertexId> = HashSet::new();
    for &(u, v) in edges {
        if matched.contains(&gu_core::edge_id(u, v)) {
            assert!(matched_vertices.insert(u), "vertex {u} claimed by more than one matched edge");
            assert!(matched_vertices.insert(v), "vertex {v} claimed by more than one matched edge");
        }
    }
    for &(u, v) in edges {
        let eid = gu_core::edge_id(u, v);
        if !matched.contains(&eid) {
            assert!(
                matched_vertices.contains(&u) || matched_vertices.contains(&v),
                "edge ({u}, {v}) is unmatched but both endpoints are free: matching is not maximal"
            );
        }
    }
}

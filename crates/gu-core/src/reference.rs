//! Sequential reference greedy matcher.
//!
//! Used two ways: as the ground truth an external caller can validate a
//! distributed run against at `p = 1`, and as the Finisher's `Gather`
//! strategy once the residual graph is small enough to fit on one machine.

use std::collections::HashSet;

use gu_ident::{keyed_hash64, tag, EdgeId, VertexId};

/// One edge as seen by the sequential matcher: endpoints plus its global id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Global edge id.
    pub eid: EdgeId,
    /// First endpoint.
    pub u: VertexId,
    /// Second endpoint.
    pub v: VertexId,
}

/// Runs greedy maximal matching over `edges` in deterministic priority
/// order (the same `(eid, phase)`-keyed priority Local MIS uses, at a fixed
/// sentinel phase so the reference order is reproducible independent of
/// how many distributed phases preceded it).
///
/// Returns the set of matched edge ids.
#[must_use]
pub fn sequential_greedy(edges: &[Edge]) -> HashSet<EdgeId> {
    const REFERENCE_PHASE: u64 = u64::MAX;

    let mut ordered: Vec<&Edge> = edges.iter().collect();
    ordered.sort_unstable_by_key(|e| (keyed_hash64(&[e.eid, REFERENCE_PHASE], tag::PRIORITY), e.eid));

    let mut matched_vertices: HashSet<VertexId> = HashSet::new();
    let mut matched_edges = HashSet::new();

    for edge in ordered {
        if matched_vertices.contains(&edge.u) || matched_vertices.contains(&edge.v) {
            continue;
        }
        matched_vertices.insert(edge.u);
        matched_vertices.insert(edge.v);
        matched_edges.insert(edge.eid);
    }

    matched_edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_matches_exactly_one_edge() {
        let edges = vec![
            Edge { eid: gu_ident::edge_id(1, 2), u: 1, v: 2 },
            Edge { eid: gu_ident::edge_id(2, 3), u: 2, v: 3 },
            Edge { eid: gu_ident::edge_id(1, 3), u: 1, v: 3 },
        ];
        let matched = sequential_greedy(&edges);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn two_disjoint_edges_both_matched() {
        let edges = vec![
            Edge { eid: gu_ident::edge_id(1, 2), u: 1, v: 2 },
            Edge { eid: gu_ident::edge_id(3, 4), u: 3, v: 4 },
        ];
        let matched = sequential_greedy(&edges);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn empty_input_matches_nothing() {
        assert!(sequential_greedy(&[]).is_empty());
    }

    #[test]
    fn result_is_maximal_for_a_star() {
        // Star: center 1 connected to 2,3,4,5,6 — at most one edge can match.
        let edges: Vec<Edge> = (2u64..=6)
            .map(|leaf| Edge { eid: gu_ident::edge_id(1, leaf), u: 1, v: leaf })
            .collect();
        let matched = sequential_greedy(&edges);
        assert_eq!(matched.len(), 1);
    }
}

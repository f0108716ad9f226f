//! Sampled invariant checks. Enabled by [`crate::config::Config::test_mode`]
//! and scaled by [`crate::config::CheckConfig::sample_rate`], the Integrator
//! calls [`check_matching_is_disjoint`] on a deterministic fraction of
//! phases. These are deliberately cheap, local checks a phase driver can
//! afford to run without materially changing performance; full-graph
//! verification belongs to external test harnesses, not this crate's
//! runtime path.

use std::collections::HashSet;

use gu_ident::{edge_id, EdgeId, VertexId};

use crate::error::GuError;

/// Verifies `eid(u, v) == eid(v, u)` for every sampled pair.
///
/// # Errors
/// Returns [`GuError::SymmetricIdFailure`] on the first mismatch.
pub fn check_symmetric_ids(pairs: &[(VertexId, VertexId)]) -> Result<(), GuError> {
    for &(u, v) in pairs {
        if edge_id(u, v) != edge_id(v, u) {
            return Err(GuError::SymmetricIdFailure(u, v));
        }
    }
    Ok(())
}

/// Verifies that a candidate matching is vertex-disjoint: no vertex appears
/// as an endpoint of more than one matched edge.
///
/// # Errors
/// Returns [`GuError::InvariantViolation`] on the first repeated vertex.
pub fn check_matching_is_disjoint(matching: &[(VertexId, VertexId)]) -> Result<(), GuError> {
    let mut seen = HashSet::with_capacity(matching.len() * 2);
    for &(u, v) in matching {
        if !seen.insert(u) {
            return Err(GuError::InvariantViolation(format!(
                "vertex {u} appears in more than one matched edge"
            )));
        }
        if !seen.insert(v) {
            return Err(GuError::InvariantViolation(format!(
                "vertex {v} appears in more than one matched edge"
            )));
        }
    }
    Ok(())
}

/// Verifies that every matched edge id is drawn from the known edge set
/// (no phantom matches).
///
/// # Errors
/// Returns [`GuError::InvariantViolation`] if a matched id is unknown.
pub fn check_matching_is_subset(matched: &HashSet<EdgeId>, all_edges: &HashSet<EdgeId>) -> Result<(), GuError> {
    for eid in matched {
        if !all_edges.contains(eid) {
            return Err(GuError::InvariantViolation(format!(
                "matched eid {eid} is not a known edge"
            )));
        }
    }
    Ok(())
}

/// Verifies a ball is sorted ascending and duplicate-free.
///
/// # Errors
/// Returns [`GuError::InvariantViolation`] on the first violation.
pub fn check_ball_sorted_unique(ball: &[EdgeId]) -> Result<(), GuError> {
    for window in ball.windows(2) {
        if window[0] >= window[1] {
            return Err(GuError::InvariantViolation(format!(
                "ball is not strictly sorted/unique at {:?}",
                window
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_ids_hold_for_any_pair() {
        assert!(check_symmetric_ids(&[(1, 2), (5, 3), (9, 9)]).is_ok());
    }

    #[test]
    fn disjoint_matching_passes() {
        assert!(check_matching_is_disjoint(&[(1, 2), (3, 4)]).is_ok());
    }

    #[test]
    fn shared_vertex_fails_disjoint_check() {
        assert!(check_matching_is_disjoint(&[(1, 2), (2, 3)]).is_err());
    }

    #[test]
    fn unsorted_ball_fails() {
        assert!(check_ball_sorted_unique(&[3, 1, 2]).is_err());
    }

    #[test]
    fn duplicate_in_ball_fails() {
        assert!(check_ball_sorted_unique(&[1, 2, 2, 3]).is_err());
    }

    #[test]
    fn sorted_unique_ball_passes() {
        assert!(check_ball_sorted_unique(&[1, 2, 3]).is_ok());
    }
}

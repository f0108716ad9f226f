//! Symmetric global edge identifiers.

use crate::owner::VertexId;
use crate::{keyed_hash64, tag};

/// A symmetric 64-bit global edge identifier: `eid(u, v) = eid(v, u)`.
///
/// Constructed exclusively through [`edge_id`], which normalizes endpoint
/// order before hashing, so the symmetry property holds by construction
/// rather than by convention.
pub type EdgeId = u64;

/// Computes the symmetric edge id `H(min(u, v), max(u, v), "eid")`.
///
/// # Panics
/// Panics in debug builds if `u == v`; self-loops must be filtered by the
/// ingestion collaborator before edges reach this function.
#[must_use]
pub fn edge_id(u: VertexId, v: VertexId) -> EdgeId {
    debug_assert_ne!(u, v, "self-loops must be filtered before ingest");
    let (lo, hi) = if u < v { (u, v) } else { (v, u) };
    keyed_hash64(&[lo, hi], tag::EID)
}

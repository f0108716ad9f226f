//! Wire messages exchanged between workers within a single phase.
//!
//! All messages are addressed by [`gu_ident::owner`] / [`gu_ident::edge_owner`]
//! and carried over [`gu_fabric::Exchange::exchange`]; nothing here is ever
//! written to disk.

use gu_ident::{EdgeId, VertexId};
use serde::{Deserialize, Serialize};

/// Registers a participating edge as incident to one of its endpoints, sent
/// to that endpoint's owner by the edge's owner after sparsification.
///
/// The vertex owner accumulates these into a phase-local adjacency table
/// that backs both sparse-degree computation and ball growth — the line
/// graph is never materialized, only discovered through this join.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IncidenceMsg {
    /// Endpoint this message is addressed to.
    pub vertex: VertexId,
    /// The participating edge incident to `vertex`.
    pub eid: EdgeId,
    /// `eid`'s endpoint other than `vertex`, so the vertex owner can answer
    /// ball-growth queries with the next hop's frontier vertex directly,
    /// without a further round trip to `eid`'s owner.
    pub other: VertexId,
}

/// Reports back to an edge's owner how many other participating edges share
/// one of its endpoints, so the owner can sum both endpoints' contributions
/// into `deg_in_sparse`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DegreeContribMsg {
    /// The edge this contribution is for.
    pub eid: EdgeId,
    /// Count of other participating edges sharing the endpoint that
    /// produced this message, i.e. `|incident| - 1`.
    pub contrib: u64,
    /// Whether the endpoint that produced this message is already retired
    /// (matched in an earlier phase). A retired endpoint means `eid` can
    /// never be matched and should be deactivated.
    pub retired: bool,
}

/// Asks a vertex owner for the registered incident-edge list of `vertex`,
/// to grow `requester`'s ball by one hop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrontierQuery {
    /// The candidate edge growing its ball.
    pub requester: EdgeId,
    /// The endpoint whose incident list is being requested.
    pub vertex: VertexId,
}

/// A vertex owner's reply to a [`FrontierQuery`]: the full incident-edge
/// list registered for `vertex` this phase, each paired with the edge's
/// other endpoint (the next hop's frontier vertex).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborsMsg {
    /// Echoes [`FrontierQuery::requester`].
    pub requester: EdgeId,
    /// `(neighbor edge, its endpoint other than the queried vertex)` pairs.
    pub neighbors: Vec<(EdgeId, VertexId)>,
}

/// A locally-minimal candidate (per Local MIS) requesting one endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchRequest {
    /// The requesting edge.
    pub eid: EdgeId,
    /// The endpoint being claimed.
    pub vertex: VertexId,
    /// The requester's deterministic phase priority, for arbitration.
    pub priority: u64,
}

/// A vertex owner's arbitration decision, routed back to the edge owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchDecision {
    /// The edge this decision is about.
    pub eid: EdgeId,
    /// The endpoint that was arbitrated.
    pub vertex: VertexId,
    /// `true` if `eid` won arbitration for `vertex`.
    pub won: bool,
}

/// A locally-owned edge, gathered by the Finisher's `Gather` strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResidualEdge {
    /// Global edge id.
    pub eid: EdgeId,
    /// First endpoint.
    pub u: VertexId,
    /// Second endpoint.
    pub v: VertexId,
}

/// The gathering rank's verdict for one residual edge, routed back to its
/// original owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FinishDecision {
    /// The edge this decision is about.
    pub eid: EdgeId,
    /// `true` if the sequential pass matched this edge.
    pub matched: bool,
}

/// Informs a vertex owner that one of its vertices was just confirmed
/// matched, so it is permanently excluded from future arbitration — matched
/// state is monotone and terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetireVertexMsg {
    /// The vertex to retire.
    pub vertex: VertexId,
}

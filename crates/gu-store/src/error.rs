//! State-store error kinds.

use gu_ident::EdgeId;
use thiserror::Error;

/// Errors raised by the state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A caller referenced an eid that is not present in `id_to_index`.
    #[error("unknown edge id {0}")]
    UnknownEdge(EdgeId),
    /// `compact_if_needed` (or any position-mutating operation) was called
    /// while a phase was in progress; edge positions must stay stable for
    /// the duration of a phase.
    #[error("attempted to compact the edge store mid-phase")]
    CompactionDuringPhase,
}

//! The engine's output type. There is no persisted state; a
//! [`MatchingResult`] is purely an in-memory summary of one worker's final
//! local view.

use std::collections::HashSet;

use gu_ident::EdgeId;

use crate::telemetry::RunMetrics;

/// One worker's final output after a run completes.
#[derive(Debug, Clone, Default)]
pub struct MatchingResult {
    /// Edge ids this worker owns that ended up matched.
    pub matched_local: HashSet<EdgeId>,
    /// Edge ids this worker owns that are still active but unmatched (only
    /// possible if the run was stopped early, e.g. by a hard error).
    pub active_unmatched_local: HashSet<EdgeId>,
    /// Per-phase and summary metrics for this worker's run.
    pub metrics: RunMetrics,
}

impl MatchingResult {
    /// True if this worker finished with no active edges left unresolved.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.active_unmatched_local.is_empty()
    }
}

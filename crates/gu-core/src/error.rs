//! Error kinds for the per-phase pipeline.

use gu_fabric::FabricError;
use gu_ident::EdgeId;
use thiserror::Error;

/// Fatal and recoverable error kinds produced by the engine.
///
/// Only [`GuError::BallOverflow`] (handled by adaptive stalling) and the
/// soft variant of [`GuError::BudgetExceeded`] are recoverable locally;
/// every other variant is fatal and triggers a coordinated abort. Each
/// variant carries a short machine-readable tag via [`GuError::tag`] for
/// the user-visible failure contract.
#[derive(Debug, Error)]
pub enum GuError {
    /// `|B(e)| > S` mid-exponentiation. Recovered by stalling `e` for the
    /// rest of this phase; surfaced only for observability.
    #[error("ball overflow for eid {eid} in phase {phase}: size {size} exceeds budget {budget}")]
    BallOverflow {
        /// The edge whose ball overflowed.
        eid: EdgeId,
        /// Current phase index.
        phase: u64,
        /// Observed ball size.
        size: usize,
        /// The configured per-machine edge budget `S`.
        budget: usize,
    },
    /// Worker resident set size crossed a Memory Guard threshold.
    #[error("memory budget exceeded ({used} bytes, {frac:.2} of limit), hard={hard}")]
    BudgetExceeded {
        /// Estimated bytes in use.
        used: u64,
        /// Fraction of the configured limit in use.
        frac: f64,
        /// `true` for the hard (fatal) threshold, `false` for the soft one.
        hard: bool,
    },
    /// A quantified invariant failed a sampled check.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// `eid(u, v) != eid(v, u)` was observed in a sampled check.
    #[error("symmetric id failure for pair ({0}, {1})")]
    SymmetricIdFailure(u64, u64),
    /// The exchange fabric reported a transport-level failure.
    #[error("fabric error: {0}")]
    Fabric(#[from] FabricError),
    /// A message referenced a vertex this worker has no record of owning.
    #[error("malformed graph: unknown vertex {0} referenced by a participation message")]
    MalformedGraph(u64),
    /// The phase budget was exhausted with active edges still remaining.
    #[error("progress stall: phase budget {phase_budget} exhausted with {active_edges} active edges remaining")]
    ProgressStall {
        /// The configured phase budget.
        phase_budget: u64,
        /// Globally active edge count at the point of exhaustion.
        active_edges: u64,
    },
}

impl GuError {
    /// Short machine-readable tag identifying the error kind, for the
    /// user-visible non-zero-exit contract.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            GuError::BallOverflow { .. } => "ball_overflow",
            GuError::BudgetExceeded { hard: true, .. } => "budget_exceeded_hard",
            GuError::BudgetExceeded { hard: false, .. } => "budget_exceeded_soft",
            GuError::InvariantViolation(_) => "invariant_violation",
            GuError::SymmetricIdFailure(_, _) => "symmetric_id_failure",
            GuError::Fabric(_) => "fabric_error",
            GuError::MalformedGraph(_) => "malformed_graph",
            GuError::ProgressStall { .. } => "progress_stall",
        }
    }

    /// Whether this error kind is recoverable in place (only `BallOverflow`
    /// and soft `BudgetExceeded` are).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GuError::BallOverflow { .. } | GuError::BudgetExceeded { hard: false, .. }
        )
    }
}

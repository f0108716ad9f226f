//! Structured observability for phase execution.
//!
//! Metrics-file export and plotting are out of scope; what this module
//! provides is the in-process [`MetricsSink`] seam plus `tracing` spans and
//! events emitted at each phase boundary, so an embedding binary can wire up
//! its own subscriber.

use tracing::info;

/// Per-phase counters recorded by the phase driver.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseMetrics {
    /// Phase index, starting at 0.
    pub phase: u64,
    /// Candidate edges entering the sparsifier this phase.
    pub candidates: u64,
    /// Candidates that participated in the sparsified line graph.
    pub participants: u64,
    /// Candidates stalled (deferred) this phase.
    pub stalled: u64,
    /// Rounds of ball growth actually executed (`<= R`).
    pub rounds_run: u32,
    /// Global maximum ball size observed this phase.
    pub max_ball_size: u64,
    /// Number of ball overflows that triggered a local stall this phase.
    pub overflow_count: u64,
    /// Vertices newly matched this phase.
    pub newly_matched: u64,
    /// Globally active edge count at phase end.
    pub active_edges: u64,
    /// Wall-clock duration of the phase.
    pub duration: std::time::Duration,
}

/// Summary across an entire run, accumulated by the phase driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    /// One entry per executed phase, in order.
    pub phases: Vec<PhaseMetrics>,
    /// True if the Finisher ran to close out the residual.
    pub finisher_invoked: bool,
}

impl RunMetrics {
    /// Total vertices matched across all recorded phases.
    #[must_use]
    pub fn total_newly_matched(&self) -> u64 {
        self.phases.iter().map(|p| p.newly_matched).sum()
    }
}

/// Receives phase metrics as they are produced. Implementations must not
/// block the phase driver; [`TracingSink`] emits a `tracing` event and
/// returns immediately, [`NullSink`] discards.
pub trait MetricsSink: Send + Sync {
    /// Called once at the end of each phase.
    fn on_phase(&self, metrics: &PhaseMetrics);

    /// Called once when the Finisher takes over from the main pipeline.
    fn on_finisher_invoked(&self) {}
}

/// Emits each phase as a `tracing` event at `info` level, under a
/// `phase`-scoped span identified by the phase index.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn on_phase(&self, metrics: &PhaseMetrics) {
        let span = tracing::info_span!("phase", phase = metrics.phase);
        let _entered = span.enter();
        info!(
            candidates = metrics.candidates,
            participants = metrics.participants,
            stalled = metrics.stalled,
            rounds_run = metrics.rounds_run,
            max_ball_size = metrics.max_ball_size,
            overflow_count = metrics.overflow_count,
            newly_matched = metrics.newly_matched,
            active_edges = metrics.active_edges,
            duration_ms = metrics.duration.as_millis(),
            "phase complete"
        );
    }

    fn on_finisher_invoked(&self) {
        info!("finisher invoked");
    }
}

/// Discards everything. Useful for property tests that run thousands of
/// phases and don't want tracing overhead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn on_phase(&self, _metrics: &PhaseMetrics) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_metrics_sums_newly_matched() {
        let mut run = RunMetrics::default();
        run.phases.push(PhaseMetrics {
            newly_matched: 3,
            ..Default::default()
        });
        run.phases.push(PhaseMetrics {
            newly_matched: 5,
            ..Default::default()
        });
        assert_eq!(run.total_newly_matched(), 8);
    }

    #[test]
    fn null_sink_does_not_panic() {
        NullSink.on_phase(&PhaseMetrics::default());
    }
}

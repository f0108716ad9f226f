//! Phase driver and Memory Guard.
//!
//! Runs the barrier-synchronous phase loop: reset phase-local state, ask
//! the Parameter Oracle for this phase's parameters, run the D-H pipeline,
//! check convergence, and hand off to the Finisher once the phase budget is
//! exhausted.

use std::collections::HashMap;
use std::time::Instant;

use gu_fabric::Exchange;
use gu_ident::VertexId;
use tracing::{info, warn};

use crate::config::{Config, FinishStrategy};
use crate::error::GuError;
use crate::oracle::{derive_phase_params, OracleState};
use crate::result::MatchingResult;
use crate::telemetry::{MetricsSink, PhaseMetrics, RunMetrics};
use crate::worker::Worker;
use crate::{exponentiator, finisher, sparsifier, staller};

/// Estimates this worker's resident memory use, for the Memory Guard.
/// Measuring actual process RSS is platform-specific and out of scope;
/// callers running under real memory pressure should supply their own
/// probe (e.g. reading `/proc/self/statm` on Linux).
pub trait MemoryProbe: Send + Sync {
    /// Estimated bytes currently resident for this worker.
    fn resident_bytes(&self) -> u64;
}

/// A probe that always reports zero use, effectively disabling the Memory
/// Guard. The default for callers that have no better signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMemoryProbe;

impl MemoryProbe for NullMemoryProbe {
    fn resident_bytes(&self) -> u64 {
        0
    }
}

/// Everything the driver needs beyond the per-worker state: configuration,
/// an approximate total vertex count (for the initial edge budget), the
/// configured memory limit, and the observability collaborators.
pub struct RunOptions<'a> {
    /// Validated engine configuration.
    pub cfg: Config,
    /// Approximate total vertex count, used to size the edge budget `S`.
    pub n_hint: u64,
    /// Memory limit in bytes the Memory Guard's fractions apply to.
    pub memory_limit_bytes: u64,
    /// Memory usage probe.
    pub memory_probe: &'a dyn MemoryProbe,
    /// Metrics sink.
    pub sink: &'a dyn MetricsSink,
}

fn local_max_active_degree(store: &gu_store::EdgeStore) -> u64 {
    let mut degree: HashMap<VertexId, u64> = HashMap::new();
    for (_, slot) in store.iter().filter(|(_, s)| s.active) {
        *degree.entry(slot.u).or_insert(0) += 1;
        *degree.entry(slot.v).or_insert(0) += 1;
    }
    degree.values().copied().max().unwrap_or(0)
}

fn memory_guard_check(opts: &RunOptions, phase: u64) -> Result<(), GuError> {
    if opts.memory_limit_bytes == 0 {
        return Ok(());
    }
    let used = opts.memory_probe.resident_bytes();
    let frac = used as f64 / opts.memory_limit_bytes as f64;
    if frac >= opts.cfg.memory.hard_frac {
        return Err(GuError::BudgetExceeded { used, frac, hard: true });
    }
    if frac >= opts.cfg.memory.soft_frac {
        warn!(phase, used, frac, "memory guard soft threshold crossed");
    }
    Ok(())
}

/// Runs one worker's side of a full matching computation to completion.
///
/// # Errors
/// Returns the first fatal [`GuError`] encountered; soft/recoverable
/// conditions (ball overflow, soft memory pressure) are handled internally
/// and only surfaced through `opts.sink`/tracing.
pub fn run<F: Exchange>(worker: &mut Worker<F>, opts: &RunOptions) -> Result<MatchingResult, GuError> {
    let edge_budget = opts.cfg.edge_budget(opts.n_hint);
    let mut oracle_state = OracleState::default();
    let mut run_metrics = RunMetrics::default();

    let mut phase = 0u64;
    while phase < opts.cfg.phase_budget {
        let active_global = run_one_phase(
            worker,
            opts,
            phase,
            &mut oracle_state,
            edge_budget,
            &mut run_metrics,
        )?;
        phase += 1;

        if active_global == 0 {
            return Ok(finish_result(worker, run_metrics));
        }

        if finisher::should_gather(&opts.cfg, active_global, edge_budget) {
            opts.sink.on_finisher_invoked();
            run_metrics.finisher_invoked = true;
            finisher::gather(worker)?;
            return Ok(finish_result(worker, run_metrics));
        }
    }

    match opts.cfg.finish.strategy {
        FinishStrategy::Gather => {
            opts.sink.on_finisher_invoked();
            run_metrics.finisher_invoked = true;
            finisher::gather(worker)?;
            Ok(finish_result(worker, run_metrics))
        }
        FinishStrategy::Distributed => {
            opts.sink.on_finisher_invoked();
            run_metrics.finisher_invoked = true;
            let extra_cap = opts.cfg.phase_budget.max(1);
            for extra in 0..extra_cap {
                let active_global = run_one_phase(
                    worker,
                    opts,
                    phase + extra,
                    &mut oracle_state,
                    edge_budget,
                    &mut run_metrics,
                )?;
                if active_global == 0 {
                    return Ok(finish_result(worker, run_metrics));
                }
            }
            let active_local = worker.store.active_count() as u64;
            let active_global = worker.fabric.allreduce_sum_u64(active_local)?;
            Err(GuError::ProgressStall {
                phase_budget: opts.cfg.phase_budget,
                active_edges: active_global,
            })
        }
    }
}

#[allow(clippy::too_many_lines)]
fn run_one_phase<F: Exchange>(
    worker: &mut Worker<F>,
    opts: &RunOptions,
    phase: u64,
    oracle_state: &mut OracleState,
    edge_budget: usize,
    run_metrics: &mut RunMetrics,
) -> Result<u64, GuError> {
    let start = Instant::now();
    worker.store.reset_phase_local_all();

    let local_max_degree = local_max_active_degree(&worker.store);
    let delta_est = worker.fabric.allreduce_max_u64(local_max_degree)?;
    oracle_state.observe_delta(opts.cfg.sampling.estimator, delta_est);

    let params = derive_phase_params(&opts.cfg, oracle_state, edge_budget);

    sparsifier::run(worker, phase, params.sampling_p)?;
    staller::run(worker, params.stall_threshold);

    let candidates = worker
        .store
        .iter()
        .filter(|(_, s)| s.active && s.participates)
        .count() as u64;
    let stalled = worker
        .store
        .iter()
        .filter(|(_, s)| s.active && s.participates && s.stalled)
        .count() as u64;

    let outcome = exponentiator::run(
        worker,
        &opts.cfg,
        phase,
        params.rounds,
        params.batch_size,
        edge_budget,
    )?;
    let max_ball_size = worker.fabric.allreduce_max_u64(outcome.local_max_ball)?;
    oracle_state.observe_ball(opts.cfg.sampling.estimator, max_ball_size);

    worker.store.compact_if_needed(0.5);

    let active_local = worker.store.active_count() as u64;
    let active_global = worker.fabric.allreduce_sum_u64(active_local)?;

    memory_guard_check(opts, phase)?;

    let metrics = PhaseMetrics {
        phase,
        candidates,
        participants: candidates - stalled,
        stalled,
        rounds_run: params.rounds,
        max_ball_size,
        overflow_count: outcome.overflow_count,
        newly_matched: outcome.newly_matched,
        active_edges: active_global,
        duration: start.elapsed(),
    };
    opts.sink.on_phase(&metrics);
    run_metrics.phases.push(metrics);

    info!(phase, active_global, newly_matched = outcome.newly_matched, "phase driver advanced");

    Ok(active_global)
}

fn finish_result<F: Exchange>(worker: &Worker<F>, metrics: RunMetrics) -> MatchingResult {
    let mut result = MatchingResult {
        metrics,
        ..Default::default()
    };
    for (_, slot) in worker.store.iter() {
        if slot.matched {
            result.matched_local.insert(slot.eid);
        } else if slot.active {
            result.active_unmatched_local.insert(slot.eid);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::NullSink;
    use gu_fabric::inmem::InMemFabric;
    use gu_store::EdgeStore;

    #[test]
    fn triangle_converges_to_one_matched_edge_per_worker_run() {
        let fabrics = InMemFabric::new_pool(3);
        let edges = [(1u64, 2u64), (2, 3), (1, 3)];
        let mut workers: Vec<Worker<InMemFabric>> = fabrics
            .into_iter()
            .enumerate()
            .map(|(i, fabric)| Worker::new(fabric, EdgeStore::init(vec![edges[i]])))
            .collect();

        let cfg = Config::default();
        let probe = NullMemoryProbe;
        let sink = NullSink;

        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .map(|w| {
                    let opts = RunOptions {
                        cfg,
                        n_hint: 3,
                        memory_limit_bytes: 0,
                        memory_probe: &probe,
                        sink: &sink,
                    };
                    scope.spawn(move || run(w, &opts).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
        });

        let total_matched: usize = results.iter().map(|r| r.matched_local.len()).sum();
        assert_eq!(total_matched, 1);
        for r in &results {
            assert!(r.converged());
        }
    }

    #[test]
    fn two_disjoint_edges_both_match() {
        let fabrics = InMemFabric::new_pool(2);
        let edges = [(1u64, 2u64), (3u64, 4u64)];
        let mut workers: Vec<Worker<InMemFabric>> = fabrics
            .into_iter()
            .enumerate()
            .map(|(i, fabric)| Worker::new(fabric, EdgeStore::init(vec![edges[i]])))
            .collect();

        let cfg = Config::default();
        let probe = NullMemoryProbe;
        let sink = NullSink;

        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .map(|w| {
                    let opts = RunOptions {
                        cfg,
                        n_hint: 4,
                        memory_limit_bytes: 0,
                        memory_probe: &probe,
                        sink: &sink,
                    };
                    scope.spawn(move || run(w, &opts).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
        });

        let total_matched: usize = results.iter().map(|r| r.matched_local.len()).sum();
        assert_eq!(total_matched, 2);
    }
}

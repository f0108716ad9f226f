//! Top-level entry point: assigns an edge list across a worker pool and
//! runs the phase driver on each worker to completion.
//!
//! Graph ingestion and cleanup are out of scope; callers already have
//! `(u, v)` pairs in hand, e.g. from their own loader.

use gu_fabric::inmem::InMemFabric;
use gu_ident::{edge_id, edge_owner, VertexId};
use gu_store::EdgeStore;

use crate::config::Config;
use crate::driver::{self, MemoryProbe, NullMemoryProbe, RunOptions};
use crate::error::GuError;
use crate::result::MatchingResult;
use crate::telemetry::{MetricsSink, NullSink};
use crate::worker::Worker;

/// Runs maximal matching over `edges` using an in-process pool of
/// `world_size` workers, returning each worker's final local result.
///
/// `n_hint` should approximate the total vertex count; it only affects the
/// initial edge-budget sizing, not correctness.
///
/// # Errors
/// Returns the first fatal [`GuError`] any worker encounters.
pub fn run_in_process(
    edges: impl IntoIterator<Item = (VertexId, VertexId)>,
    world_size: usize,
    n_hint: u64,
    cfg: Config,
) -> Result<Vec<MatchingResult>, GuError> {
    let probe = NullMemoryProbe;
    let sink = NullSink;
    run_in_process_with(edges, world_size, n_hint, cfg, 0, &probe, &sink)
}

/// As [`run_in_process`], but with a caller-supplied Memory Guard limit and
/// memory probe/metrics sink collaborators (shared read-only across all
/// worker threads). A `memory_limit_bytes` of `0` disables the Memory
/// Guard, matching [`run_in_process`]'s behavior.
///
/// # Errors
/// Returns the first fatal [`GuError`] any worker encounters.
#[allow(clippy::too_many_arguments)]
pub fn run_in_process_with(
    edges: impl IntoIterator<Item = (VertexId, VertexId)>,
    world_size: usize,
    n_hint: u64,
    cfg: Config,
    memory_limit_bytes: u64,
    probe: &(dyn MemoryProbe + Sync),
    sink: &(dyn MetricsSink + Sync),
) -> Result<Vec<MatchingResult>, GuError> {
    let mut slices: Vec<Vec<(VertexId, VertexId)>> = vec![Vec::new(); world_size];
    for (u, v) in edges {
        if u == v {
            continue;
        }
        let owner = edge_owner(edge_id(u, v), world_size);
        slices[owner].push((u, v));
    }

    let fabrics = InMemFabric::new_pool(world_size);
    let mut workers: Vec<Worker<InMemFabric>> = fabrics
        .into_iter()
        .zip(slices)
        .map(|(fabric, slice)| Worker::new(fabric, EdgeStore::init(slice)))
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = workers
            .iter_mut()
            .map(|w| {
                let opts = RunOptions {
                    cfg,
                    n_hint,
                    memory_limit_bytes,
                    memory_probe: probe,
                    sink,
                };
                scope.spawn(move || driver::run(w, &opts))
            })
            .collect();
        #[allow(clippy::expect_used)]
        handles
            .into_iter()
            .map(|h| h.join().expect("worker thread panicked"))
            .collect()
    })
}

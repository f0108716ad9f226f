//! Exponentiator: grows each non-stalled participant's ball by repeatedly
//! joining the line graph one hop at a time through vertex owners, for up to
//! `R` rounds or until the ball stops growing.
//!
//! Candidates are processed in batches sized by the Parameter Oracle so the
//! ball arena never holds more than one batch's worth of balls at once.
//! Local MIS and Integration run immediately after each batch's balls are
//! built, before the arena is released for the next batch — a candidate's
//! ball only ever exists in the arena during its own batch's iteration.

use std::collections::HashMap;

use gu_fabric::Exchange;
use gu_ident::{edge_owner, owner, EdgeId, VertexId};
use gu_store::merge_sorted_unique;

use crate::config::Config;
use crate::error::GuError;
use crate::messages::{FrontierQuery, NeighborsMsg};
use crate::worker::Worker;
use crate::{integrator, local_mis};

struct BallBuild {
    eids: Vec<EdgeId>,
    visited: Vec<VertexId>,
    frontier: Vec<VertexId>,
    overflowed: bool,
}

/// Totals folded back into the phase driver once every batch has been
/// grown, locally arbitrated, and integrated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExponentiationOutcome {
    /// This worker's local maximum finished ball size, to be folded into
    /// the global `B_est` via [`Exchange::allreduce_max_u64`] by the caller.
    pub local_max_ball: u64,
    /// Number of candidate balls that hit `edge_budget` and were stalled
    /// for the rest of this phase.
    pub overflow_count: u64,
    /// Edges newly matched this phase, summed across every batch's
    /// Integrator pass.
    pub newly_matched: u64,
}

/// Runs ball growth, Local MIS, and Integration for one phase, batch by
/// batch, across all non-stalled participants.
///
/// Local MIS and Integration run per batch rather than once at the end:
/// each batch's balls are released from the arena before the next batch is
/// built, so a candidate can only win or be matched during the same batch
/// iteration that built its ball.
///
/// # Errors
/// Returns [`GuError::Fabric`] if the exchange fabric fails, or
/// [`GuError::MalformedGraph`] if a reply references an edge this worker
/// does not own.
#[allow(clippy::expect_used)]
pub fn run<F: Exchange>(
    worker: &mut Worker<F>,
    cfg: &Config,
    phase: u64,
    rounds: u32,
    batch_size: usize,
    edge_budget: usize,
) -> Result<ExponentiationOutcome, GuError> {
    let world_size = worker.world_size();
    let candidates: Vec<usize> = worker
        .store
        .iter()
        .filter(|(_, s)| s.active && s.participates && !s.stalled)
        .map(|(i, _)| i)
        .collect();

    let mut outcome = ExponentiationOutcome::default();

    for batch in candidates.chunks(batch_size.max(1)) {
        worker.arena.release();
        let mut builds: HashMap<usize, BallBuild> = HashMap::new();
        for &idx in batch {
            let slot = worker.store.get(idx).expect("candidate index is valid");
            let mut visited = vec![slot.u, slot.v];
            visited.sort_unstable();
            builds.insert(
                idx,
                BallBuild {
                    eids: vec![slot.eid],
                    visited,
                    frontier: vec![slot.u, slot.v],
                    overflowed: false,
                },
            );
        }

        let mut active: Vec<usize> = batch.to_vec();

        for _round in 0..rounds {
            if active.is_empty() {
                break;
            }

            let mut query_out = vec![Vec::new(); world_size];
            for &idx in &active {
                let eid = worker.store.get(idx).expect("candidate index is valid").eid;
                for &v in &builds[&idx].frontier {
                    query_out[owner(v, world_size)].push(FrontierQuery { requester: eid, vertex: v });
                }
            }
            let query_in = worker.fabric.exchange(query_out)?;

            let mut reply_out = vec![Vec::new(); world_size];
            for bucket in query_in {
                for q in bucket {
                    let neighbors = worker.incidence.get(&q.vertex).cloned().unwrap_or_default();
                    reply_out[edge_owner(q.requester, world_size)].push(NeighborsMsg {
                        requester: q.requester,
                        neighbors,
                    });
                }
            }
            let reply_in = worker.fabric.exchange(reply_out)?;

            let mut next_frontiers: HashMap<usize, Vec<VertexId>> = HashMap::new();
            for bucket in reply_in {
                for msg in bucket {
                    let idx = worker
                        .store
                        .index_of(msg.requester)
                        .ok_or(GuError::MalformedGraph(msg.requester))?;
                    let Some(build) = builds.get_mut(&idx) else {
                        continue;
                    };
                    if build.overflowed {
                        continue;
                    }

                    let mut new_eids: Vec<EdgeId> = msg.neighbors.iter().map(|(e, _)| *e).collect();
                    new_eids.sort_unstable();
                    new_eids.dedup();
                    let merged = merge_sorted_unique(&build.eids, &new_eids);

                    if merged.len() > edge_budget {
                        build.overflowed = true;
                        worker.store.get_mut(idx).expect("candidate index is valid").stalled = true;
                        continue;
                    }
                    build.eids = merged;

                    let next: Vec<VertexId> = msg
                        .neighbors
                        .iter()
                        .map(|(_, other)| *other)
                        .filter(|v| build.visited.binary_search(v).is_err())
                        .collect();
                    for v in &next {
                        if let Err(pos) = build.visited.binary_search(v) {
                            build.visited.insert(pos, *v);
                        }
                    }
                    next_frontiers.entry(idx).or_default().extend(next);
                }
            }

            active.retain(|idx| !builds[idx].overflowed);
            for &idx in &active {
                let frontier = next_frontiers.remove(&idx).unwrap_or_default();
                builds.get_mut(&idx).expect("active index has a build").frontier = frontier;
            }
            active.retain(|idx| !builds[idx].frontier.is_empty());
        }

        for (idx, build) in &builds {
            if build.overflowed {
                outcome.overflow_count += 1;
                continue;
            }
            worker.arena.set(*idx, &build.eids);
            outcome.local_max_ball = outcome.local_max_ball.max(build.eids.len() as u64);
        }

        let winners = local_mis::run(worker, phase);
        outcome.newly_matched += integrator::run(worker, cfg, phase, &winners)?;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gu_fabric::inmem::InMemFabric;
    use gu_store::EdgeStore;

    #[test]
    fn path_of_four_grows_ball_to_cover_all_participants() {
        // Path 1-2-3-4-5, one edge per worker, all participating.
        let fabrics = InMemFabric::new_pool(4);
        let edges = [(1u64, 2u64), (2, 3), (3, 4), (4, 5)];

        let mut workers: Vec<Worker<InMemFabric>> = fabrics
            .into_iter()
            .enumerate()
            .map(|(i, fabric)| Worker::new(fabric, EdgeStore::init(vec![edges[i]])))
            .collect();

        for w in &mut workers {
            for (_, slot) in w.store.iter_mut() {
                slot.participates = true;
            }
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .map(|w| {
                    scope.spawn(move || {
                        crate::sparsifier::run(w, 0, 1.0).unwrap();
                        run(w, &Config::default(), 0, 4, 10, 100).unwrap()
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        });

        // Middle edge (2,3) should see all four edges within its ball; with
        // enough rounds the path's line graph is fully connected.
        let (_, middle) = workers[1].store.iter().next().unwrap();
        let ball = workers[1].arena.get(0).unwrap();
        assert!(ball.contains(&middle.eid));
        assert!(ball.len() >= 3);
    }

    #[test]
    fn every_batch_gets_to_match_not_just_the_last_one() {
        // Three vertex-disjoint edges on one worker, forced into three
        // separate batches. Each is a singleton ball (no shared vertex), so
        // each should win Local MIS and confirm a match inside its own
        // batch's iteration, not only the last batch's.
        let mut fabrics = InMemFabric::new_pool(1);
        let edges = vec![(1u64, 2u64), (3, 4), (5, 6)];
        let mut worker = Worker::new(fabrics.remove(0), EdgeStore::init(edges));
        for (_, slot) in worker.store.iter_mut() {
            slot.participates = true;
        }

        let outcome = run(&mut worker, &Config::default(), 0, 2, 1, 100).unwrap();

        assert_eq!(outcome.newly_matched, 3);
        for (_, slot) in worker.store.iter() {
            assert!(slot.matched);
        }
    }
}

//! Integrator: arbitrates vertex-owner conflicts among this
//! phase's Local MIS winners. A true maximal independent set in the line
//! graph is already vertex-disjoint, so arbitration rarely overturns a
//! winner; it exists as the vertex owner's authoritative word in case two
//! winners ever claim the same vertex in the same phase.
//!
//! A sampled fraction of phases re-verify this worker's newly-confirmed
//! matches with [`crate::checks::check_matching_is_disjoint`] — a cheap
//! local round-trip over vertex pairs this worker just matched, catching an
//! arbitration regression before it silently corrupts the result.

use gu_fabric::Exchange;
use gu_ident::{bernoulli_draw, edge_owner, owner, tag};

use crate::checks::check_matching_is_disjoint;
use crate::config::Config;
use crate::error::GuError;
use crate::messages::{MatchDecision, MatchRequest, RetireVertexMsg};
use crate::worker::Worker;

/// Sends match requests for `winners` (local indices from
/// [`crate::local_mis::run`]), arbitrates per vertex, and applies confirmed
/// matches to the local store. Returns the number of edges newly matched
/// by this worker.
///
/// # Errors
/// Returns [`GuError::Fabric`] if the exchange fabric fails, or
/// [`GuError::InvariantViolation`] if a sampled disjointness check fails.
#[allow(clippy::expect_used)]
pub fn run<F: Exchange>(worker: &mut Worker<F>, cfg: &Config, phase: u64, winners: &[usize]) -> Result<u64, GuError> {
    let world_size = worker.world_size();

    let mut request_out = vec![Vec::new(); world_size];
    for &idx in winners {
        let slot = worker.store.get(idx).expect("winner index is valid");
        for vertex in [slot.u, slot.v] {
            request_out[owner(vertex, world_size)].push(MatchRequest {
                eid: slot.eid,
                vertex,
                priority: slot.priority,
            });
        }
    }
    let request_in = worker.fabric.exchange(request_out)?;

    // Arbitrate: lowest (priority, eid) wins each vertex. Vertices already
    // retired in a previous phase never get a winner again.
    use std::collections::HashMap;
    let mut best: HashMap<u64, (u64, u64)> = HashMap::new(); // vertex -> (priority, eid)
    for bucket in &request_in {
        for req in bucket {
            if worker.retired.contains(&req.vertex) {
                continue;
            }
            best.entry(req.vertex)
                .and_modify(|cur| {
                    if (req.priority, req.eid) < *cur {
                        *cur = (req.priority, req.eid);
                    }
                })
                .or_insert((req.priority, req.eid));
        }
    }

    let mut decision_out = vec![Vec::new(); world_size];
    for bucket in request_in {
        for req in bucket {
            let won = best.get(&req.vertex).copied() == Some((req.priority, req.eid));
            decision_out[edge_owner(req.eid, world_size)].push(MatchDecision {
                eid: req.eid,
                vertex: req.vertex,
                won,
            });
        }
    }
    let decision_in = worker.fabric.exchange(decision_out)?;

    let mut confirmations: HashMap<u64, u8> = HashMap::new();
    for bucket in decision_in {
        for dec in bucket {
            if dec.won {
                *confirmations.entry(dec.eid).or_insert(0) += 1;
            } else {
                confirmations.entry(dec.eid).or_insert(0);
            }
        }
    }

    let mut retire_out = vec![Vec::new(); world_size];
    let mut newly_matched = 0u64;
    let mut newly_matched_pairs = Vec::new();
    for (&eid, &count) in &confirmations {
        if count < 2 {
            continue;
        }
        if let Some(index) = worker.store.index_of(eid) {
            if let Some(slot) = worker.store.get_mut(index) {
                slot.matched = true;
                slot.active = false;
                newly_matched += 1;
                newly_matched_pairs.push((slot.u, slot.v));
                for vertex in [slot.u, slot.v] {
                    retire_out[owner(vertex, world_size)].push(RetireVertexMsg { vertex });
                }
            }
        }
    }
    let retire_in = worker.fabric.exchange(retire_out)?;
    for bucket in retire_in {
        for msg in bucket {
            worker.retired.insert(msg.vertex);
        }
    }

    if cfg.test_mode && bernoulli_draw(&[phase, worker.rank() as u64], tag::CHECK, cfg.checks.sample_rate) {
        check_matching_is_disjoint(&newly_matched_pairs)?;
    }

    Ok(newly_matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gu_fabric::inmem::InMemFabric;
    use gu_store::EdgeStore;

    #[test]
    fn disjoint_edges_both_confirm() {
        let fabrics = InMemFabric::new_pool(2);
        let mut workers: Vec<Worker<InMemFabric>> = fabrics
            .into_iter()
            .enumerate()
            .map(|(i, fabric)| {
                Worker::new(fabric, EdgeStore::init(vec![[(1u64, 2u64), (3, 4)][i]]))
            })
            .collect();
        for w in &mut workers {
            w.store.get_mut(0).unwrap().priority = 1;
        }

        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .map(|w| scope.spawn(move || run(w, &Config::default(), 0, &[0]).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
        });

        assert_eq!(results, vec![1, 1]);
        for w in &workers {
            assert!(w.store.get(0).unwrap().matched);
        }
    }

    #[test]
    fn shared_vertex_only_lower_priority_wins() {
        let fabrics = InMemFabric::new_pool(2);
        // Both edges claim vertex 2.
        let mut workers: Vec<Worker<InMemFabric>> = fabrics
            .into_iter()
            .enumerate()
            .map(|(i, fabric)| Worker::new(fabric, EdgeStore::init(vec![[(1u64, 2u64), (2, 3)][i]])))
            .collect();
        workers[0].store.get_mut(0).unwrap().priority = 1;
        workers[1].store.get_mut(0).unwrap().priority = 2;

        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .map(|w| scope.spawn(move || run(w, &Config::default(), 0, &[0]).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
        });

        assert_eq!(results, vec![1, 0]);
        assert!(workers[0].store.get(0).unwrap().matched);
        assert!(!workers[1].store.get(0).unwrap().matched);
    }

    #[test]
    fn sampled_disjointness_check_passes_on_a_correct_match() {
        let fabrics = InMemFabric::new_pool(2);
        let mut workers: Vec<Worker<InMemFabric>> = fabrics
            .into_iter()
            .enumerate()
            .map(|(i, fabric)| {
                Worker::new(fabric, EdgeStore::init(vec![[(1u64, 2u64), (3, 4)][i]]))
            })
            .collect();
        for w in &mut workers {
            w.store.get_mut(0).unwrap().priority = 1;
        }

        let mut cfg = Config::default();
        cfg.test_mode = true;
        cfg.checks.sample_rate = 1.0;

        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .map(|w| scope.spawn(move || run(w, &cfg, 0, &[0])))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });

        for r in results {
            assert!(r.is_ok());
        }
    }
}

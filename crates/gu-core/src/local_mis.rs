//! Local MIS: each non-stalled candidate decides, purely from its own ball
//! and deterministic priorities, whether it is locally minimal in the
//! implicit line graph. No communication is needed here — every ball
//! member's priority is a pure function of `(eid, phase)` that any worker
//! can recompute.

use gu_ident::{keyed_hash64, tag, EdgeId};
use gu_fabric::Exchange;

use crate::worker::Worker;

/// Deterministic per-phase MIS priority for `eid`. Lower wins.
#[must_use]
pub fn priority(eid: EdgeId, phase: u64) -> u64 {
    keyed_hash64(&[eid, phase], tag::PRIORITY)
}

/// Evaluates local minimality for every non-stalled, active, participating
/// candidate, writing the result into [`gu_store::EdgeSlot::priority`] and
/// returning the set of local indices that won their ball (and so request
/// a match this phase).
#[allow(clippy::expect_used)]
pub fn run<F: Exchange>(worker: &mut Worker<F>, phase: u64) -> Vec<usize> {
    let mut winners = Vec::new();

    let candidate_indices: Vec<usize> = worker
        .store
        .iter()
        .filter(|(_, s)| s.active && s.participates && !s.stalled)
        .map(|(i, _)| i)
        .collect();

    for idx in candidate_indices {
        let eid = worker.store.get(idx).expect("valid candidate index").eid;
        let own_priority = priority(eid, phase);
        worker.store.get_mut(idx).expect("valid candidate index").priority = own_priority;

        let Some(ball) = worker.arena.get(idx) else {
            continue;
        };
        let is_locally_minimal = ball
            .iter()
            .filter(|&&neighbor_eid| neighbor_eid != eid)
            .all(|&neighbor_eid| {
                let neighbor_priority = priority(neighbor_eid, phase);
                (own_priority, eid) < (neighbor_priority, neighbor_eid)
            });

        if is_locally_minimal {
            winners.push(idx);
        }
    }

    winners
}

#[cfg(test)]
mod tests {
    use super::*;
    use gu_fabric::inmem::InMemFabric;
    use gu_store::EdgeStore;

    #[test]
    fn singleton_ball_always_wins() {
        let mut fabrics = InMemFabric::new_pool(1);
        let mut worker = Worker::new(fabrics.remove(0), EdgeStore::init(vec![(1, 2)]));
        let (_, slot) = worker.store.iter().next().unwrap();
        let eid = slot.eid;
        worker.store.get_mut(0).unwrap().participates = true;
        worker.arena.set(0, &[eid]);

        let winners = run(&mut worker, 0);
        assert_eq!(winners, vec![0]);
    }

    #[test]
    fn loses_to_a_strictly_lower_priority_neighbor() {
        let mut fabrics = InMemFabric::new_pool(1);
        let mut worker = Worker::new(fabrics.remove(0), EdgeStore::init(vec![(1, 2)]));
        let (_, slot) = worker.store.iter().next().unwrap();
        let eid = slot.eid;
        worker.store.get_mut(0).unwrap().participates = true;

        // Find a neighbor eid guaranteed to have a strictly lower priority
        // at phase 0 by scanning synthetic eids.
        let own_priority = priority(eid, 0);
        let lower_neighbor = (0u64..10_000)
            .find(|&candidate| candidate != eid && priority(candidate, 0) < own_priority)
            .expect("some eid in range has lower priority");

        worker.arena.set(0, &{
            let mut ball = vec![eid, lower_neighbor];
            ball.sort_unstable();
            ball
        });

        let winners = run(&mut worker, 0);
        assert!(winners.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn priority_is_deterministic(eid in 0u64..1_000_000, phase in 0u64..100) {
            proptest::prop_assert_eq!(priority(eid, phase), priority(eid, phase));
        }

        #[test]
        fn priority_orders_distinct_eids_consistently(a in 0u64..1_000_000, b in 0u64..1_000_000, phase in 0u64..100) {
            if a != b {
                let ord_forward = (priority(a, phase), a).cmp(&(priority(b, phase), b));
                let ord_backward = (priority(b, phase), b).cmp(&(priority(a, phase), a));
                proptest::prop_assert_eq!(ord_forward, ord_backward.reverse());
            }
        }
    }
}

//! Staller: excludes overly-dense participants from this
//! phase's exponentiation round by comparing sparse degree against the
//! phase's stall threshold. Purely local — no communication.

use crate::worker::Worker;
use gu_fabric::Exchange;

/// Marks every edge `stalled` according to `stall_threshold`. Non-active or
/// non-participating edges are always stalled (they take no part in ball
/// growth or Local MIS this phase).
pub fn run<F: Exchange>(worker: &mut Worker<F>, stall_threshold: u64) {
    for (_, slot) in worker.store.iter_mut() {
        if slot.active && slot.participates {
            slot.stalled = slot.deg_in_sparse.max(0) as u64 > stall_threshold;
        } else {
            slot.stalled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gu_fabric::inmem::InMemFabric;
    use gu_store::EdgeStore;

    #[test]
    fn stalls_only_over_threshold_participants() {
        let mut fabrics = InMemFabric::new_pool(1);
        let mut worker = Worker::new(fabrics.remove(0), EdgeStore::init(vec![(1, 2), (3, 4)]));
        for (_, slot) in worker.store.iter_mut() {
            slot.participates = true;
        }
        worker.store.get_mut(0).unwrap().deg_in_sparse = 10;
        worker.store.get_mut(1).unwrap().deg_in_sparse = 2;

        run(&mut worker, 5);

        assert!(worker.store.get(0).unwrap().stalled);
        assert!(!worker.store.get(1).unwrap().stalled);
    }

    #[test]
    fn non_participants_are_always_stalled() {
        let mut fabrics = InMemFabric::new_pool(1);
        let mut worker = Worker::new(fabrics.remove(0), EdgeStore::init(vec![(1, 2)]));
        worker.store.get_mut(0).unwrap().participates = false;
        run(&mut worker, 100);
        assert!(worker.store.get(0).unwrap().stalled);
    }
}

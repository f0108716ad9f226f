//! Reference in-process fabric: `p` workers as OS threads in one process,
//! connected through a shared rendezvous hub.
//!
//! This is the stand-in for the synchronous collective-messaging substrate
//! treated as an external collaborator (barrier, allreduce, sparse
//! all-to-all). It is the fabric every test in this
//! workspace runs against; a production deployment would swap it for a real
//! transport behind the same [`crate::Exchange`] trait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Instant;

use crate::accounting::Accountant;
use crate::wire::{chunk_by_encoded_size, decode_bucket, encode_bucket, CHUNK_LIMIT_BYTES};
use crate::{Exchange, FabricError, FabricStats, Record};

/// Shared state every worker's [`InMemFabric`] handle talks through.
struct Hub {
    p: usize,
    /// `round_slot[src][dst]` holds the current round's encoded bytes from
    /// `src` to `dst`. Reused across rounds; cleared implicitly by
    /// overwrite.
    round_slot: Mutex<Vec<Vec<Vec<u8>>>>,
    /// Per-rank scratch value for `allreduce_*`.
    reduce_slot: Mutex<Vec<u64>>,
    /// Rendezvous point. A `std::sync::Barrier` may be waited on repeatedly;
    /// every logical round (and every allreduce/barrier call) is exactly one
    /// `wait()` per worker, which keeps the protocol a simple sequence of
    /// barrier generations instead of needing per-round objects.
    barrier: Barrier,
    accountants: Vec<Accountant>,
    poisoned: AtomicU64,
}

impl Hub {
    fn new(p: usize) -> Self {
        Self {
            p,
            round_slot: Mutex::new(vec![vec![Vec::new(); p]; p]),
            reduce_slot: Mutex::new(vec![0u64; p]),
            barrier: Barrier::new(p),
            accountants: (0..p).map(|_| Accountant::default()).collect(),
            poisoned: AtomicU64::new(0),
        }
    }

    fn mark_poisoned(&self) {
        self.poisoned.fetch_add(1, Ordering::SeqCst);
    }

    fn check_poisoned(&self, round: usize) -> Result<(), FabricError> {
        if self.poisoned.load(Ordering::SeqCst) > 0 {
            return Err(FabricError::Transport {
                round,
                detail: "a peer worker panicked inside the fabric".to_owned(),
            });
        }
        Ok(())
    }
}

/// A single worker's handle onto the shared in-process fabric.
pub struct InMemFabric {
    hub: Arc<Hub>,
    rank: usize,
}

impl InMemFabric {
    /// Builds `p` handles onto one freshly constructed hub, one per rank, in
    /// rank order. Callers typically move each handle into its own thread.
    #[must_use]
    pub fn new_pool(p: usize) -> Vec<Self> {
        let hub = Arc::new(Hub::new(p));
        (0..p)
            .map(|rank| Self {
                hub: Arc::clone(&hub),
                rank,
            })
            .collect()
    }

    fn accountant(&self) -> &Accountant {
        &self.hub.accountants[self.rank]
    }
}

impl Exchange for InMemFabric {
    fn exchange<T: Record>(&self, send_buckets: Vec<Vec<T>>) -> Result<Vec<Vec<T>>, FabricError> {
        let start = Instant::now();
        let p = self.hub.p;
        if send_buckets.len() != p {
            return Err(FabricError::BucketCountMismatch {
                expected: p,
                actual: send_buckets.len(),
            });
        }

        // Chunk each destination bucket so no single wire message exceeds
        // CHUNK_LIMIT_BYTES.
        let mut per_dest_chunks: Vec<Vec<Vec<T>>> = Vec::with_capacity(p);
        for (dest, bucket) in send_buckets.into_iter().enumerate() {
            per_dest_chunks.push(chunk_by_encoded_size(dest, &bucket, CHUNK_LIMIT_BYTES)?);
        }
        let local_rounds = per_dest_chunks
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(1)
            .max(1);
        let total_rounds = self.allreduce_max_u64(local_rounds as u64)? as usize;

        let mut recv_buckets: Vec<Vec<T>> = (0..p).map(|_| Vec::new()).collect();

        for round in 0..total_rounds {
            self.hub.check_poisoned(round)?;
            let empty: Vec<T> = Vec::new();
            {
                let mut slot = self.hub.round_slot.lock().map_err(|_| {
                    self.hub.mark_poisoned();
                    FabricError::Transport {
                        round,
                        detail: "round slot lock poisoned".to_owned(),
                    }
                })?;
                for dest in 0..p {
                    let chunk = per_dest_chunks[dest].get(round).unwrap_or(&empty);
                    let bytes = encode_bucket(dest, chunk)?;
                    self.accountant().record_out(bytes.len() as u64);
                    slot[self.rank][dest] = bytes;
                }
            }

            self.hub.barrier.wait();
            self.hub.check_poisoned(round)?;

            {
                let slot = self.hub.round_slot.lock().map_err(|_| {
                    self.hub.mark_poisoned();
                    FabricError::Transport {
                        round,
                        detail: "round slot lock poisoned".to_owned(),
                    }
                })?;
                for source in 0..p {
                    let bytes = &slot[source][self.rank];
                    self.accountant().record_in(bytes.len() as u64);
                    let mut decoded: Vec<T> = decode_bucket(source, bytes)?;
                    recv_buckets[source].append(&mut decoded);
                }
            }

            // Second wait: nobody overwrites `round_slot` for the next round
            // until every worker has read this round's data.
            self.hub.barrier.wait();
        }

        self.accountant().record_call(start.elapsed());
        Ok(recv_buckets)
    }

    fn allreduce_max_u64(&self, value: u64) -> Result<u64, FabricError> {
        let start = Instant::now();
        {
            let mut slot = self.hub.reduce_slot.lock().map_err(|_| FabricError::Transport {
                round: 0,
                detail: "reduce slot lock poisoned".to_owned(),
            })?;
            slot[self.rank] = value;
        }
        self.hub.barrier.wait();
        let result = {
            let slot = self.hub.reduce_slot.lock().map_err(|_| FabricError::Transport {
                round: 0,
                detail: "reduce slot lock poisoned".to_owned(),
            })?;
            slot.iter().copied().max().unwrap_or(0)
        };
        self.hub.barrier.wait();
        self.accountant().record_call(start.elapsed());
        Ok(result)
    }

    fn allreduce_sum_u64(&self, value: u64) -> Result<u64, FabricError> {
        let start = Instant::now();
        {
            let mut slot = self.hub.reduce_slot.lock().map_err(|_| FabricError::Transport {
                round: 0,
                detail: "reduce slot lock poisoned".to_owned(),
            })?;
            slot[self.rank] = value;
        }
        self.hub.barrier.wait();
        let result = {
            let slot = self.hub.reduce_slot.lock().map_err(|_| FabricError::Transport {
                round: 0,
                detail: "reduce slot lock poisoned".to_owned(),
            })?;
            slot.iter().copied().fold(0u64, |acc, v| acc.saturating_add(v))
        };
        self.hub.barrier.wait();
        self.accountant().record_call(start.elapsed());
        Ok(result)
    }

    fn barrier(&self) -> Result<(), FabricError> {
        self.hub.barrier.wait();
        Ok(())
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.hub.p
    }

    fn stats(&self) -> FabricStats {
        self.accountant().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn exchange_delivers_all_to_all() {
        let pool = InMemFabric::new_pool(3);
        let handles: Vec<_> = pool
            .into_iter()
            .map(|fabric| {
                thread::spawn(move || {
                    let rank = fabric.rank();
                    let mut send = vec![Vec::new(); 3];
                    for dest in 0..3 {
                        send[dest].push((rank as u64, dest as u64));
                    }
                    fabric.exchange(send).unwrap()
                })
            })
            .collect();

        let results: Vec<Vec<Vec<(u64, u64)>>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        for (rank, recv) in results.iter().enumerate() {
            for (source, bucket) in recv.iter().enumerate() {
                assert_eq!(bucket, &vec![(source as u64, rank as u64)]);
            }
        }
    }

    #[test]
    fn allreduce_max_agrees_across_workers() {
        let pool = InMemFabric::new_pool(4);
        let handles: Vec<_> = pool
            .into_iter()
            .map(|fabric| {
                thread::spawn(move || {
                    let rank = fabric.rank() as u64;
                    fabric.allreduce_max_u64(rank * 10).unwrap()
                })
            })
            .collect();
        let results: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|&r| r == 30));
    }

    #[test]
    fn chunked_exchange_preserves_order_and_contents() {
        let pool = InMemFabric::new_pool(2);
        let handles: Vec<_> = pool
            .into_iter()
            .map(|fabric| {
                thread::spawn(move || {
                    let rank = fabric.rank();
                    let payload: Vec<(u64, u64)> = (0..5000).map(|i| (rank as u64, i)).collect();
                    let mut send = vec![Vec::new(), Vec::new()];
                    send[1 - rank] = payload.clone();
                    let recv = fabric.exchange(send).unwrap();
                    (rank, payload, recv)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for (rank, _payload, recv) in &results {
            let other = 1 - rank;
            let expected: Vec<(u64, u64)> = (0..5000).map(|i| (*other as u64, i)).collect();
            assert_eq!(recv[*other], expected);
        }
    }
}

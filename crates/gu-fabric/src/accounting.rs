//! Per-worker fabric accounting counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Snapshot of a worker's accumulated exchange-fabric counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FabricStats {
    /// Total bytes sent across all `exchange` calls.
    pub bytes_out: u64,
    /// Total bytes received across all `exchange` calls.
    pub bytes_in: u64,
    /// Largest single encoded chunk observed, in bytes.
    pub max_message_bytes: u64,
    /// Cumulative wall time spent inside `exchange`/`allreduce`/`barrier`.
    pub wall_time: Duration,
    /// Number of completed `exchange` calls.
    pub exchange_calls: u64,
}

/// Interior-mutable accumulator; one instance lives per fabric handle and is
/// updated after every call.
#[derive(Debug, Default)]
pub(crate) struct Accountant {
    bytes_out: AtomicU64,
    bytes_in: AtomicU64,
    max_message_bytes: AtomicU64,
    wall_time_nanos: AtomicU64,
    exchange_calls: AtomicU64,
}

impl Accountant {
    pub(crate) fn record_out(&self, bytes: u64) {
        self.bytes_out.fetch_add(bytes, Ordering::Relaxed);
        self.max_message_bytes.fetch_max(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_in(&self, bytes: u64) {
        self.bytes_in.fetch_add(bytes, Ordering::Relaxed);
        self.max_message_bytes.fetch_max(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_call(&self, elapsed: Duration) {
        self.exchange_calls.fetch_add(1, Ordering::Relaxed);
        self.wall_time_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> FabricStats {
        FabricStats {
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            max_message_bytes: self.max_message_bytes.load(Ordering::Relaxed),
            wall_time: Duration::from_nanos(self.wall_time_nanos.load(Ordering::Relaxed)),
            exchange_calls: self.exchange_calls.load(Ordering::Relaxed),
        }
    }
}

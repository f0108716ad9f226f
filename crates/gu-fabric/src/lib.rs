//! Exchange fabric: chunked sparse all-to-all over typed record buffers.
//!
//! The engine's only communication primitive is [`Exchange::exchange`]:
//! every worker hands it `p` send buckets (one per destination rank) and
//! receives `p` receive buckets (one per source rank) back. Everything else
//! — barriers, allreduce, chunking, accounting — is implemented in terms of
//! this one call.

mod accounting;
pub mod inmem;
mod wire;

pub use accounting::FabricStats;
pub use wire::CHUNK_LIMIT_BYTES;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// A record type that can be carried across the fabric.
///
/// Anything `Serialize + DeserializeOwned + Clone + Send` qualifies; the
/// fabric never interprets record contents, only their serialized size for
/// chunking.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + 'static {}
impl<T> Record for T where T: Serialize + DeserializeOwned + Clone + Send + 'static {}

/// Errors surfaced by the exchange fabric. Every variant here is fatal and
/// triggers a coordinated abort; the fabric never partially succeeds.
#[derive(Debug, Error)]
pub enum FabricError {
    /// The underlying transport reported a failure mid-round.
    #[error("transport failure during exchange round {round}: {detail}")]
    Transport {
        /// Chunk round during which the failure occurred.
        round: usize,
        /// Opaque transport-provided detail string.
        detail: String,
    },
    /// A record could not be serialized for transmission.
    #[error("failed to encode record for destination rank {dest}: {detail}")]
    Encode {
        /// Destination rank of the bucket being encoded.
        dest: usize,
        /// Underlying encoding error detail.
        detail: String,
    },
    /// A received byte stream could not be decoded into the expected type.
    #[error("failed to decode record from source rank {source}: {detail}")]
    Decode {
        /// Source rank the bytes were received from.
        source: usize,
        /// Underlying decoding error detail.
        detail: String,
    },
    /// The number of send buckets did not match the configured worker count.
    #[error("expected {expected} send buckets, got {actual}")]
    BucketCountMismatch {
        /// Expected bucket count (the worker count `p`).
        expected: usize,
        /// Actual bucket count supplied by the caller.
        actual: usize,
    },
}

/// The exchange contract every transport implementation must satisfy.
///
/// Implementations MUST preserve per-(source, destination) send order and
/// MUST treat any underlying transport error as fatal (no partial results).
pub trait Exchange {
    /// Performs one logical all-to-all exchange. `send_buckets[j]` holds the
    /// records this worker addresses to rank `j`; the returned
    /// `recv_buckets[i]` holds everything rank `i` addressed to this worker,
    /// in the order rank `i` sent it. Large buckets are chunked internally
    /// so that no single wire message exceeds [`CHUNK_LIMIT_BYTES`); the
    /// result is equivalent to one logical exchange regardless of chunking.
    ///
    /// # Errors
    /// Returns [`FabricError`] on any transport failure or bucket-count
    /// mismatch; callers treat this as fatal.
    fn exchange<T: Record>(&self, send_buckets: Vec<Vec<T>>) -> Result<Vec<Vec<T>>, FabricError>;

    /// Reduces a single `u64` to its maximum across all workers, the
    /// primitive the Parameter Oracle uses to refresh `Δ_est` each phase.
    ///
    /// # Errors
    /// Returns [`FabricError`] on transport failure.
    fn allreduce_max_u64(&self, value: u64) -> Result<u64, FabricError>;

    /// Reduces a single `u64` to its sum across all workers, used for global
    /// active-edge counts and the residual-convergence check.
    ///
    /// # Errors
    /// Returns [`FabricError`] on transport failure.
    fn allreduce_sum_u64(&self, value: u64) -> Result<u64, FabricError>;

    /// A synchronous rendezvous point with no payload, used between pipeline
    /// steps in the barrier-synchronous scheduling model.
    ///
    /// # Errors
    /// Returns [`FabricError`] on transport failure.
    fn barrier(&self) -> Result<(), FabricError>;

    /// This worker's rank `0..p-1`.
    fn rank(&self) -> usize;

    /// Total worker count `p`.
    fn world_size(&self) -> usize;

    /// A snapshot of this worker's accumulated fabric accounting counters:
    /// bytes in/out, max single-message size, wall time per call.
    fn stats(&self) -> FabricStats;
}

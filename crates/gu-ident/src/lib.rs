//! Deterministic keyed hashing and global identifier scheme.
//!
//! Every worker in the engine must derive the same owner assignments, sample
//! draws, and priorities from the same inputs without coordination. A single
//! keyed 64-bit hash, tag-separated per use, is the only primitive this
//! requires; see [`keyed_hash64`].

mod eid;
mod owner;

pub use eid::{edge_id, EdgeId};
pub use owner::{edge_owner, owner, VertexId};

/// Domain-separation tags for [`keyed_hash64`]. Each call site uses exactly
/// one tag so that the same `(inputs)` pair never collides across purposes.
pub mod tag {
    /// Tag for `owner(v) = H(v, "owner") mod p`.
    pub const OWNER: &str = "owner";
    /// Tag for `edge_owner(eid) = H(eid, "edge_owner") mod p`.
    pub const EDGE_OWNER: &str = "edge_owner";
    /// Tag for the symmetric edge id: `H(min(u,v), max(u,v), "eid")`.
    pub const EID: &str = "eid";
    /// Tag for the per-phase participation draw.
    pub const SAMPLE: &str = "sample";
    /// Tag for the per-phase MIS priority.
    pub const PRIORITY: &str = "priority";
    /// Tag for the sampled invariant-check draw.
    pub const CHECK: &str = "check";

    #[cfg(test)]
    /// Tag reserved for test fixtures that need a private namespace.
    pub const TEST: &str = "test";
}

/// Computes a deterministic, avalanche-mixed 64-bit hash of `parts`, keyed by
/// `tag` so the same numeric inputs never collide between different uses
/// (owner assignment, sampling, priority, ...).
///
/// Implementation note: this is a thin wrapper over BLAKE3 truncated to its
/// first 8 bytes. BLAKE3 already gives us a cryptographically mixed, keyed
/// digest; truncation is safe here because we only need uniform 64-bit
/// outputs, not collision resistance at 256 bits.
#[must_use]
pub fn keyed_hash64(parts: &[u64], tag: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(tag.as_bytes());
    for part in parts {
        hasher.update(&part.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest.as_bytes()[0..8]);
    u64::from_le_bytes(buf)
}

/// Draws a deterministic boolean decision with probability `p` (clamped to
/// `[0, 1]`) from `(parts, tag)`, per the engine's numeric semantics: compare
/// the hash against `floor(p * 2^64)` as unsigned integers.
#[must_use]
pub fn bernoulli_draw(parts: &[u64], tag: &str, p: f64) -> bool {
    let p = p.clamp(0.0, 1.0);
    if p >= 1.0 {
        return true;
    }
    if p <= 0.0 {
        return false;
    }
    let threshold = (p * (u64::MAX as f64 + 1.0)) as u64;
    keyed_hash64(parts, tag) < threshold
}

//! Phase-scoped ball arena.
//!
//! Balls are sorted, duplicate-free sequences of eids. Rather than give each
//! candidate edge an owned `Vec<EdgeId>`, the arena is one flat
//! `Vec<EdgeId>` plus an `(offset, length)` pair per edge — avoiding the
//! cyclic-reference problem of balls pointing at other balls. The arena is
//! allocated per batch and released (`clear`) at batch end; it never
//! outlives the batch that built it.

use std::collections::HashMap;

use gu_ident::EdgeId;

/// Flat storage for every ball built during the current exponentiation
/// batch.
#[derive(Debug, Default)]
pub struct BallArena {
    flat: Vec<EdgeId>,
    spans: HashMap<usize, (u32, u32)>,
}

impl BallArena {
    /// Creates an arena pre-sized for `batch_size` candidates, each expected
    /// to hold up to `expected_ball_size` eids. This is an allocation hint
    /// only (`B_max` peak-hold estimate from the Parameter Oracle); the
    /// arena grows past it if needed.
    #[must_use]
    pub fn with_capacity(batch_size: usize, expected_ball_size: usize) -> Self {
        Self {
            flat: Vec::with_capacity(batch_size.saturating_mul(expected_ball_size)),
            spans: HashMap::with_capacity(batch_size),
        }
    }

    /// Stores `ball` (already sorted ascending, duplicate-free) for the
    /// candidate at local edge index `local_index`, overwriting any prior
    /// ball for that index within this batch.
    pub fn set(&mut self, local_index: usize, ball: &[EdgeId]) {
        let offset = self.flat.len() as u32;
        self.flat.extend_from_slice(ball);
        let length = ball.len() as u32;
        self.spans.insert(local_index, (offset, length));
    }

    /// Returns the stored ball for `local_index`, if one was set this batch.
    #[must_use]
    pub fn get(&self, local_index: usize) -> Option<&[EdgeId]> {
        self.spans.get(&local_index).map(|&(offset, length)| {
            let start = offset as usize;
            let end = start + length as usize;
            &self.flat[start..end]
        })
    }

    /// True if `candidate` appears in `owner_index`'s stored ball — the
    /// membership oracle Local MIS uses instead of any adjacency structure.
    #[must_use]
    pub fn contains(&self, owner_index: usize, candidate: EdgeId) -> bool {
        self.get(owner_index)
            .is_some_and(|ball| ball.binary_search(&candidate).is_ok())
    }

    /// Number of balls currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// True if no balls are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Releases all storage for this batch. The arena is reusable
    /// afterwards (starts the next batch empty) rather than being dropped.
    pub fn release(&mut self) {
        self.flat.clear();
        self.spans.clear();
    }
}

/// Merges two sorted, duplicate-free eid sequences into one sorted,
/// duplicate-free sequence.
#[must_use]
pub fn merge_sorted_unique(a: &[EdgeId], b: &[EdgeId]) -> Vec<EdgeId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

//! Per-worker state store: the stable edge array, `id_to_index` map, and
//! the phase-scoped ball arena.

mod arena;
mod edges;
mod error;

pub use arena::{merge_sorted_unique, BallArena};
pub use edges::{EdgeSlot, EdgeStore};
pub use error::StoreError;

pub use gu_ident::{EdgeId, VertexId};

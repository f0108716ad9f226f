//! Binary framing for fabric records.
//!
//! Grounded in the session hub's length-prefixed packet framing, adapted to
//! an internal binary codec (`bincode`) since these records never cross a
//! language boundary the way the session protocol's CBOR frames do.

use crate::FabricError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Any single wire message is kept under this many bytes; buckets whose
/// encoded size would exceed it are split across multiple exchange rounds by
/// [`crate::inmem::InMemFabric`], chosen so any single buffer stays well
/// under the 2 GiB a `Vec<u8>` length could address. Kept far smaller here
/// since the reference fabric runs in-process.
pub const CHUNK_LIMIT_BYTES: usize = 8 * 1024 * 1024;

/// Encodes a whole bucket (a `Vec<T>`) to bytes.
pub fn encode_bucket<T: Serialize>(dest: usize, items: &[T]) -> Result<Vec<u8>, FabricError> {
    bincode::serialize(items).map_err(|e| FabricError::Encode {
        dest,
        detail: e.to_string(),
    })
}

/// Decodes a whole bucket back into `Vec<T>`.
pub fn decode_bucket<T: DeserializeOwned>(source: usize, bytes: &[u8]) -> Result<Vec<T>, FabricError> {
    bincode::deserialize(bytes).map_err(|e| FabricError::Decode {
        source,
        detail: e.to_string(),
    })
}

/// Splits `items` into chunks whose encoded size stays under `limit_bytes`,
/// preserving order. A single oversized item still gets its own chunk (the
/// limit is a packing target, not a hard per-item cap).
pub fn chunk_by_encoded_size<T: Serialize + Clone>(
    dest: usize,
    items: &[T],
    limit_bytes: usize,
) -> Result<Vec<Vec<T>>, FabricError> {
    if items.is_empty() {
        return Ok(vec![Vec::new()]);
    }
    let mut chunks = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut current_size = 0usize;
    for item in items {
        let item_size = bincode::serialized_size(item)
            .map_err(|e| FabricError::Encode {
                dest,
                detail: e.to_string(),
            })?
            .try_into()
            .unwrap_or(usize::MAX);
        if !current.is_empty() && current_size + item_size > limit_bytes {
            chunks.push(std::mem::take(&mut current));
            current_size = 0;
        }
        current.push(item.clone());
        current_size += item_size;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    Ok(chunks)
}

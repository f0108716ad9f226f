//! Determinism sandbox: runs the same input graph through two independently
//! constructed engine instances and checks they land on bit-identical
//! matchings.
//!
//! Modeled on the retrieval pattern of spinning up isolated instances from
//! factories and diffing a canonical hash of their output.

use std::collections::BTreeSet;

use gu_ident::VertexId;

use crate::config::Config;
use crate::engine::run_in_process;
use crate::error::GuError;

/// One sandboxed run's description: its own edge ordering/partition and
/// world size, so two runs can differ in everything except the graph's
/// logical content and still be checked for identical output.
pub struct RunSpec {
    /// Human label for error messages.
    pub label: String,
    /// The edge list, in whatever order this run wants to present it.
    pub edges: Vec<(VertexId, VertexId)>,
    /// Worker pool size for this run.
    pub world_size: usize,
    /// Approximate vertex count.
    pub n_hint: u64,
    /// Engine configuration.
    pub cfg: Config,
}

/// Failure from comparing two sandboxed runs.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// One of the two runs failed outright.
    #[error("run {label} failed: {source}")]
    RunFailed {
        /// Label of the failing run.
        label: String,
        /// Underlying engine error.
        #[source]
        source: GuError,
    },
    /// Both runs completed but produced different matchings.
    #[error("matchings diverged between {label_a} and {label_b}: {only_a} edges only in {label_a}, {only_b} edges only in {label_b}")]
    Mismatch {
        /// Label of the first run.
        label_a: String,
        /// Label of the second run.
        label_b: String,
        /// Count of matched edges unique to the first run.
        only_a: usize,
        /// Count of matched edges unique to the second run.
        only_b: usize,
    },
}

fn canonical_matching(spec: &RunSpec) -> Result<BTreeSet<u64>, SandboxError> {
    let results = run_in_process(spec.edges.iter().copied(), spec.world_size, spec.n_hint, spec.cfg)
        .map_err(|source| SandboxError::RunFailed {
            label: spec.label.clone(),
            source,
        })?;
    Ok(results.into_iter().flat_map(|r| r.matched_local).collect())
}

/// Runs both specs and asserts they produce exactly the same matched edge
/// set, regardless of edge ordering, partitioning, or world size.
///
/// # Errors
/// Returns [`SandboxError::RunFailed`] if either run errors, or
/// [`SandboxError::Mismatch`] if their matchings differ.
pub fn compare_runs(a: &RunSpec, b: &RunSpec) -> Result<(), SandboxError> {
    let matching_a = canonical_matching(a)?;
    let matching_b = canonical_matching(b)?;

    if matching_a == matching_b {
        return Ok(());
    }

    let only_a = matching_a.difference(&matching_b).count();
    let only_b = matching_b.difference(&matching_a).count();
    Err(SandboxError::Mismatch {
        label_a: a.label.clone(),
        label_b: b.label.clone(),
        only_a,
        only_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_specs_never_diverge() {
        let edges = vec![(1u64, 2u64), (2, 3), (3, 4), (4, 1)];
        let a = RunSpec {
            label: "a".into(),
            edges: edges.clone(),
            world_size: 4,
            n_hint: 4,
            cfg: Config::default(),
        };
        let b = RunSpec {
            label: "b".into(),
            edges,
            world_size: 4,
            n_hint: 4,
            cfg: Config::default(),
        };
        assert!(compare_runs(&a, &b).is_ok());
    }

    #[test]
    fn reordered_edges_still_agree() {
        let mut edges = vec![(1u64, 2u64), (2, 3), (3, 4), (4, 1)];
        let a = RunSpec {
            label: "forward".into(),
            edges: edges.clone(),
            world_size: 4,
            n_hint: 4,
            cfg: Config::default(),
        };
        edges.reverse();
        let b = RunSpec {
            label: "reversed".into(),
            edges,
            world_size: 4,
            n_hint: 4,
            cfg: Config::default(),
        };
        assert!(compare_runs(&a, &b).is_ok());
    }

    #[test]
    fn repeated_run_of_the_same_spec_is_stable() {
        let edges = vec![(1u64, 2u64), (2, 3), (1, 3)];
        let a = RunSpec {
            label: "run-1".into(),
            edges: edges.clone(),
            world_size: 3,
            n_hint: 3,
            cfg: Config::default(),
        };
        let b = RunSpec {
            label: "run-2".into(),
            edges,
            world_size: 3,
            n_hint: 3,
            cfg: Config::default(),
        };
        assert!(compare_runs(&a, &b).is_ok());
    }
}

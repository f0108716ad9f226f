//! Determinism, idempotence, and order-independence laws, exercised through
//! the public sandbox API that the same module uses internally to
//! cross-check two runs.

use gu_core::{compare_runs, Config, RunSpec};

fn spec(label: &str, edges: Vec<(u64, u64)>, world_size: usize, n_hint: u64) -> RunSpec {
    RunSpec {
        label: label.to_string(),
        edges,
        world_size,
        n_hint,
        cfg: Config::default(),
    }
}

/// Determinism: identical inputs and configuration produce identical output.
#[test]
fn determinism_identical_inputs_identical_output() {
    let edges = vec![(1u64, 2u64), (2, 3), (3, 4), (4, 5), (5, 1)];
    let a = spec("a", edges.clone(), 3, 5);
    let b = spec("b", edges, 3, 5);
    assert!(compare_runs(&a, &b).is_ok());
}

/// Order-independence: the same edge set presented in a different order
/// yields the same matching.
#[test]
fn order_independence_of_ingest() {
    let mut edges = vec![(1u64, 2u64), (2, 3), (3, 4), (4, 5), (5, 1), (10, 11), (11, 12)];
    let a = spec("forward", edges.clone(), 3, 12);
    edges.reverse();
    let b = spec("reversed", edges, 3, 12);
    assert!(compare_runs(&a, &b).is_ok());
}

/// Idempotence: running the same spec back-to-back never yields a different
/// terminal matching (the Finisher's own idempotence guarantee, observed at
/// the whole-run level since the Finisher itself is a private component).
#[test]
fn idempotence_of_repeated_runs() {
    let edges = vec![(1u64, 2u64), (2, 3), (1, 3), (4, 5)];
    let first = spec("first", edges.clone(), 2, 5);
    let second = spec("second", edges, 2, 5);
    assert!(compare_runs(&first, &second).is_ok());
}

//! Per-phase pipeline of a strongly-sublinear distributed maximal matching
//! engine: sample a sparsified line graph, discover local neighborhoods by
//! hop-by-hop exponentiation, pick a greedy independent set from
//! deterministic priorities, arbitrate conflicting vertex claims, and hand
//! the shrinking residual to the Finisher once the main pipeline stalls
//! out. See the [Ghaffari-Uitto] sublinear MPC matching algorithm this
//! engine's phase structure follows.
//!
//! [Ghaffari-Uitto]: https://arxiv.org/abs/1807.07645

mod checks;
mod config;
mod driver;
mod engine;
mod error;
mod exponentiator;
mod finisher;
mod integrator;
mod local_mis;
mod messages;
mod oracle;
mod reference;
mod result;
mod sandbox;
mod sparsifier;
mod staller;
mod telemetry;
mod worker;

pub use checks::{
    check_ball_sorted_unique, check_matching_is_disjoint, check_matching_is_subset,
    check_symmetric_ids,
};
pub use config::{
    CheckConfig, Config, ConfigError, Estimator, FinishConfig, FinishStrategy, MemoryConfig,
    SamplingConfig, SamplingMode, StallConfig, StallMode,
};
pub use driver::{run as run_phase_driver, MemoryProbe, NullMemoryProbe, RunOptions};
pub use engine::{run_in_process, run_in_process_with};
pub use error::GuError;
pub use oracle::{derive_phase_params, OracleState, PhaseParams};
pub use reference::{sequential_greedy, Edge};
pub use result::MatchingResult;
pub use sandbox::{compare_runs, RunSpec, SandboxError};
pub use telemetry::{MetricsSink, NullSink, PhaseMetrics, RunMetrics, TracingSink};
pub use worker::Worker;

pub use gu_fabric::{Exchange, FabricError};
pub use gu_ident::{edge_id, edge_owner, owner, EdgeId, VertexId};
pub use gu_store::{BallArena, EdgeSlot, EdgeStore, StoreError};

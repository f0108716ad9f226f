//! Parameter Oracle: derives each phase's `R`, sampling
//! probability, stall threshold, and exponentiation batch size from the
//! configuration and the previous phase's observed degree/ball-size
//! estimates. Every formula here is a pure function of already-agreed
//! values (config plus allreduced estimates), so every worker derives the
//! same parameters without further coordination.

use crate::config::{Config, Estimator, SamplingMode, StallMode};

/// Parameters governing one phase, as derived by the oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseParams {
    /// Number of ball-growth rounds to run this phase.
    pub rounds: u32,
    /// Sampling probability for candidate participation.
    pub sampling_p: f64,
    /// Sparse-degree threshold above which a candidate stalls.
    pub stall_threshold: u64,
    /// Number of candidates to process per exponentiation batch.
    pub batch_size: usize,
}

/// Running state the oracle threads across phases: the maximum observed
/// degree estimate and ball-size estimate, each under the peak-hold or
/// last-value policy selected by [`Config::sampling`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleState {
    delta_est: u64,
    b_est: u64,
}

impl OracleState {
    /// Folds in this phase's allreduced maximum degree observation.
    pub fn observe_delta(&mut self, estimator: Estimator, observed_max_degree: u64) {
        self.delta_est = match estimator {
            Estimator::Last => observed_max_degree,
            Estimator::PeakHold => self.delta_est.max(observed_max_degree),
        };
    }

    /// Folds in this phase's allreduced maximum ball size observation.
    pub fn observe_ball(&mut self, estimator: Estimator, observed_max_ball: u64) {
        self.b_est = match estimator {
            Estimator::Last => observed_max_ball,
            Estimator::PeakHold => self.b_est.max(observed_max_ball),
        };
    }

    /// Current degree estimate `Delta_est`.
    #[must_use]
    pub fn delta_est(&self) -> u64 {
        self.delta_est
    }

    /// Current ball-size estimate `B_est`.
    #[must_use]
    pub fn b_est(&self) -> u64 {
        self.b_est
    }
}

/// Derives this phase's parameters.
///
/// `edge_budget` is the per-machine edge budget `S`; `n` is the total vertex
/// count, used only to seed a sane `delta_est` floor before any phase has
/// run.
#[must_use]
pub fn derive_phase_params(cfg: &Config, state: &OracleState, edge_budget: usize) -> PhaseParams {
    let delta_est = state.delta_est().max(2);
    let b_est = state.b_est().max(1);

    let rounds = cfg
        .r_rounds
        .unwrap_or_else(|| (delta_est as f64).log2().ceil().max(1.0) as u32 + 1);

    let sampling_p = match cfg.sampling.mode {
        SamplingMode::Fixed => cfg.sampling.p,
        SamplingMode::Adaptive => {
            let target = cfg.sampling.safety * edge_budget as f64 / delta_est as f64;
            target.clamp(0.0, 1.0)
        }
    };

    let stall_threshold = match cfg.stall.mode {
        StallMode::HardThreshold => cfg.stall.t_base,
        StallMode::Dynamic => {
            let expected_sparse_degree = sampling_p * delta_est as f64;
            (expected_sparse_degree * 4.0).ceil().max(cfg.stall.t_base as f64) as u64
        }
    };

    let batch_size = ((edge_budget as f64 / cfg.batch_safety_c) / b_est as f64)
        .floor()
        .max(1.0) as usize;

    PhaseParams {
        rounds,
        sampling_p,
        stall_threshold,
        batch_size,
    }
}

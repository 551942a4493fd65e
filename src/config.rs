use serde::{Deserialize, Serialize};

/// Weight vector driving the static evaluator. GA-tunable (see `crate::ga`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationWeights {
    /// Kept for forward compatibility and GA tuning; the shipped
    /// `StaticEvaluator` does not read this field.
    pub road3: f64,
    /// Same caveat as `road3`.
    pub road4: f64,
    pub live4: f64,
    pub live5: f64,
    pub vcdt_bonus: f64,
}

impl Default for EvaluationWeights {
    fn default() -> Self {
        EvaluationWeights {
            road3: 100.0,
            road4: 350.0,
            live4: 3000.0,
            live5: 10000.0,
            vcdt_bonus: 1500.0,
        }
    }
}

/// Config for the PVS engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchConfig {
    pub max_depth: u32,
    pub time_limit_ms: u64,
    /// Reserved: no internal parallelism is implemented.
    pub use_multithreading: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_depth: 4,
            time_limit_ms: 2000,
            use_multithreading: false,
        }
    }
}

impl SearchConfig {
    /// Adaptive depth/time policy: deepens and loosens the clock as the
    /// game goes long.
    pub fn adapted_for_move(&self, move_number: u32) -> SearchConfig {
        let mut cfg = *self;
        if move_number > 24 {
            cfg.max_depth = (cfg.max_depth + 1).min(6);
        }
        if move_number > 16 {
            cfg.time_limit_ms += 400;
        }
        cfg
    }
}

/// Config for the MCTS engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MctsConfig {
    pub simulation_count: u32,
    pub simulation_steps: u32,
    pub expand_nodes: u32,
    pub min_win_rate_threshold: f64,
    pub ucb_constant: f64,
    pub dirichlet_epsilon: f64,
    pub max_transposition_size: usize,
    pub rollout_top_k: usize,
    /// Seed for root Dirichlet noise and rollout sampling. Search is fully
    /// deterministic given a fixed oracle, weight vector, and seed.
    pub seed: u64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            simulation_count: 1000,
            simulation_steps: 20,
            expand_nodes: 16,
            min_win_rate_threshold: 0.1,
            ucb_constant: 1.4,
            dirichlet_epsilon: 0.25,
            max_transposition_size: 50_000,
            rollout_top_k: 6,
            seed: 42,
        }
    }
}

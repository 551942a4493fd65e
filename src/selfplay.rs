//! Self-play matches between two weight vectors, driving two `PvsEngine`
//! instances through a complete game. This generalizes the bot-vs-bot
//! match loop the GA's fitness function needs (see `crate::ga`).

use crate::board::{GameState, Player, Winner};
use crate::config::{EvaluationWeights, SearchConfig};
use crate::error::Result;
use crate::pvs::PvsEngine;
use log::debug;

#[derive(Debug, Clone, Copy)]
pub struct SelfPlayConfig {
    pub max_plies: u32,
    pub search: SearchConfig,
    /// Overrides `search` with a per-ply `SearchConfig` when present (e.g.
    /// the GA's depth-2-then-3 fitness schedule); falls back to `search`
    /// when absent.
    pub ply_search: Option<fn(u32) -> SearchConfig>,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig { max_plies: 200, search: SearchConfig::default(), ply_search: None }
    }
}

#[derive(Debug, Clone)]
pub struct SelfPlayOutcome {
    pub winner: Option<Winner>,
    pub plies: u32,
    pub black_weights: EvaluationWeights,
    pub white_weights: EvaluationWeights,
    pub final_state: GameState,
}

pub struct SelfPlayMatch {
    config: SelfPlayConfig,
}

impl SelfPlayMatch {
    pub fn new(config: SelfPlayConfig) -> Self {
        SelfPlayMatch { config }
    }

    /// Play one complete game, `black_weights` always opening as Black.
    pub fn play(&self, black_weights: EvaluationWeights, white_weights: EvaluationWeights) -> Result<SelfPlayOutcome> {
        let mut state = GameState::create_initial();
        let mut black_engine = PvsEngine::new(black_weights);
        let mut white_engine = PvsEngine::new(white_weights);

        while !state.is_game_over() && state.move_number() < self.config.max_plies {
            let search = match self.config.ply_search {
                Some(f) => f(state.move_number()),
                None => self.config.search,
            };
            let decision = match state.current_player() {
                Player::Black => black_engine.decide(&state, search)?,
                Player::White => white_engine.decide(&state, search)?,
            };
            state = state.apply(&decision.mv)?;
        }

        debug!("self-play match ended at ply {} winner={:?}", state.move_number(), state.winner());

        Ok(SelfPlayOutcome {
            winner: state.winner(),
            plies: state.move_number(),
            black_weights,
            white_weights,
            final_state: state,
        })
    }
}

/// Play the `k`-th self-play match between `a` and `b`: per the tournament
/// schedule, `a` opens as Black iff `k` is even.
pub fn play_match(k: u32, a: EvaluationWeights, b: EvaluationWeights, config: SelfPlayConfig) -> Result<SelfPlayOutcome> {
    let m = SelfPlayMatch::new(config);
    if k % 2 == 0 {
        m.play(a, b)
    } else {
        m.play(b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_full_match_terminates_with_a_result() {
        let config = SelfPlayConfig {
            max_plies: 40,
            search: SearchConfig { max_depth: 1, time_limit_ms: 50, use_multithreading: false },
            ply_search: None,
        };
        let outcome = play_match(0, EvaluationWeights::default(), EvaluationWeights::default(), config).unwrap();
        assert!(outcome.plies <= 40);
    }

    #[test]
    fn odd_index_swaps_who_opens_as_black() {
        let config = SelfPlayConfig {
            max_plies: 2,
            search: SearchConfig { max_depth: 1, time_limit_ms: 50, use_multithreading: false },
            ply_search: None,
        };
        let a = EvaluationWeights { vcdt_bonus: 1.0, ..EvaluationWeights::default() };
        let b = EvaluationWeights { vcdt_bonus: 2.0, ..EvaluationWeights::default() };
        let even = play_match(0, a, b, config).unwrap();
        let odd = play_match(1, a, b, config).unwrap();
        assert_eq!(even.black_weights.vcdt_bonus, 1.0);
        assert_eq!(odd.black_weights.vcdt_bonus, 2.0);
    }
}

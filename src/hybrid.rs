//! Hybrid strategy selector: picks PVS or MCTS by move number and board
//! complexity, with operator overrides for forcing one engine or the other.

use crate::board::{Cell, GameState};
use crate::config::{EvaluationWeights, MctsConfig, SearchConfig};
use crate::error::Result;
use crate::mcts::{Evaluator, MctsEngine};
use crate::pvs::{Decision as PvsDecision, PvsEngine};
use crate::road::RoadTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineChoice {
    Pvs,
    Mcts,
    /// Run both engines and keep whichever scored higher.
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Let the move-number/complexity table decide.
    Auto,
    /// Always use the PVS engine.
    Traditional,
    /// Always use the MCTS engine.
    Deep,
}

#[derive(Debug, Clone)]
pub struct HybridDecision {
    pub engine: EngineChoice,
    pub mv: crate::board::Move,
    pub score: f64,
}

/// Board complexity `c = 0.5·stonesRatio + 0.5·mixedRoadRatio ∈ [0,1]`:
/// stonesRatio is the fraction of the board filled, mixedRoadRatio is the
/// fraction of roads carrying both colors.
fn complexity(state: &GameState, table: &RoadTable) -> f64 {
    let n = state.board_size();
    let mut stones = 0usize;
    for y in 0..n {
        for x in 0..n {
            if state.get(crate::board::Position::new(x, y)) != Cell::Empty {
                stones += 1;
            }
        }
    }
    let stones_ratio = stones as f64 / (n * n) as f64;

    let roads = table.roads();
    let mixed = roads
        .iter()
        .filter(|road| {
            let mut black = false;
            let mut white = false;
            for &cell in &road.cells {
                match state.get(cell) {
                    Cell::Black => black = true,
                    Cell::White => white = true,
                    Cell::Empty => {}
                }
            }
            black && white
        })
        .count();
    let mixed_road_ratio = mixed as f64 / roads.len() as f64;

    0.5 * stones_ratio + 0.5 * mixed_road_ratio
}

/// Move-number/complexity table per the hybrid selector's rule: opens
/// always favor PVS, crowded midgames with `c > 0.6` run both engines and
/// keep the higher score, and deep midgames fall back to PVS.
fn choose_engine(state: &GameState, table: &RoadTable, operator: Operator) -> EngineChoice {
    match operator {
        Operator::Traditional => return EngineChoice::Pvs,
        Operator::Deep => return EngineChoice::Mcts,
        Operator::Auto => {}
    }

    let move_number = state.move_number();
    if move_number <= 10 {
        return EngineChoice::Pvs;
    }
    if move_number <= 30 {
        let c = complexity(state, table);
        if c > 0.6 {
            return EngineChoice::Both;
        }
        return EngineChoice::Pvs;
    }
    EngineChoice::Pvs
}

pub struct HybridSelector<'a> {
    table: RoadTable,
    weights: EvaluationWeights,
    mcts_config: MctsConfig,
    evaluator: &'a dyn Evaluator,
}

impl<'a> HybridSelector<'a> {
    pub fn new(weights: EvaluationWeights, mcts_config: MctsConfig, evaluator: &'a dyn Evaluator) -> Self {
        HybridSelector { table: RoadTable::new(), weights, mcts_config, evaluator }
    }

    pub fn decide(&self, state: &GameState, search_config: SearchConfig, operator: Operator) -> Result<HybridDecision> {
        match choose_engine(state, &self.table, operator) {
            EngineChoice::Pvs => self.decide_pvs(state, search_config),
            EngineChoice::Mcts => self.decide_mcts(state),
            EngineChoice::Both => {
                let pvs = self.decide_pvs(state, search_config)?;
                let mcts = self.decide_mcts(state)?;
                if mcts.score > pvs.score {
                    Ok(mcts)
                } else {
                    Ok(pvs)
                }
            }
        }
    }

    fn decide_pvs(&self, state: &GameState, search_config: SearchConfig) -> Result<HybridDecision> {
        let mut engine = PvsEngine::new(self.weights);
        let PvsDecision { mv, score, .. } = engine.decide(state, search_config)?;
        Ok(HybridDecision { engine: EngineChoice::Pvs, mv, score })
    }

    fn decide_mcts(&self, state: &GameState) -> Result<HybridDecision> {
        let mut engine = MctsEngine::new(self.mcts_config, self.evaluator);
        let decision = engine.search(state)?;
        Ok(HybridDecision { engine: EngineChoice::Mcts, mv: decision.mv, score: decision.score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::UniformEvaluator;

    #[test]
    fn opening_prefers_pvs() {
        let table = RoadTable::new();
        let state = GameState::create_initial();
        assert_eq!(choose_engine(&state, &table, Operator::Auto), EngineChoice::Pvs);
    }

    #[test]
    fn traditional_override_forces_pvs() {
        let table = RoadTable::new();
        let state = GameState::create_initial();
        assert_eq!(choose_engine(&state, &table, Operator::Traditional), EngineChoice::Pvs);
    }

    #[test]
    fn deep_override_forces_mcts() {
        let table = RoadTable::new();
        let state = GameState::create_initial();
        assert_eq!(choose_engine(&state, &table, Operator::Deep), EngineChoice::Mcts);
    }

    #[test]
    fn hybrid_selector_returns_a_move() {
        let evaluator = UniformEvaluator;
        let selector = HybridSelector::new(EvaluationWeights::default(), MctsConfig::default(), &evaluator);
        let state = GameState::create_initial();
        let decision = selector.decide(&state, SearchConfig::default(), Operator::Auto).unwrap();
        assert_eq!(decision.engine, EngineChoice::Pvs);
    }

    #[test]
    fn empty_board_has_zero_complexity() {
        let table = RoadTable::new();
        let state = GameState::create_initial();
        assert_eq!(complexity(&state, &table), 0.0);
    }

    #[test]
    fn deep_midgame_falls_back_to_pvs_regardless_of_complexity() {
        let table = RoadTable::new();
        let mut state = GameState::create_initial();
        while state.move_number() <= 30 {
            let mv = state.complete_move(state.current_player(), &[]);
            state = state.apply(&mv).unwrap();
        }
        assert_eq!(choose_engine(&state, &table, Operator::Auto), EngineChoice::Pvs);
    }
}

//! Static position evaluator: a terminal term, a pattern term driven by
//! VCDT-detected threats, a threat-defense term, and a positional term
//! favoring central stones.

use crate::board::{GameState, Player, Position, Winner};
use crate::config::EvaluationWeights;
use crate::road::RoadTable;
use crate::vcdt::{self, ThreatLevel};

const WIN_SCORE: f64 = 1_000_000.0;
const CENTER: Position = Position { x: 9, y: 9 };
const POSITIONAL_WEIGHT: f64 = 2.0;
/// `2 * ((19 - 1) / 2)`, fixed regardless of board size.
const POSITIONAL_MAX_DIST: f64 = 18.0;

/// `per_when_many` per live-four when there are 2 or more; `when_one` when
/// there is exactly one; 0 when there are none.
fn live_four_magnitude(count: usize, per_when_many: f64, when_one: f64) -> f64 {
    match count {
        0 => 0.0,
        1 => when_one,
        n => per_when_many * n as f64,
    }
}

pub struct StaticEvaluator<'a> {
    weights: EvaluationWeights,
    table: &'a RoadTable,
}

impl<'a> StaticEvaluator<'a> {
    pub fn new(weights: EvaluationWeights, table: &'a RoadTable) -> Self {
        StaticEvaluator { weights, table }
    }

    /// Score `state` from `perspective`'s point of view: positive favors
    /// `perspective`, negative favors the opponent.
    pub fn evaluate(&self, state: &GameState, perspective: Player) -> f64 {
        if let Some(winner) = state.winner() {
            return match winner {
                Winner::Black if perspective == Player::Black => WIN_SCORE,
                Winner::White if perspective == Player::White => WIN_SCORE,
                Winner::Draw => 0.0,
                _ => -WIN_SCORE,
            };
        }

        let opponent = perspective.opponent();

        self.pattern_term(state, perspective, opponent)
            + self.threat_defense_term(state, perspective, opponent)
            + self.positional_term(state)
    }

    /// `myLive4·live4 + myLive5·live5 − oppLive4·live4·0.8 − oppLive5·live5·0.9
    /// + (myVcdts − oppVcdts)·vcdtBonus`.
    fn pattern_term(&self, state: &GameState, perspective: Player, opponent: Player) -> f64 {
        let mine_live4 = vcdt::two_stone_and_live_four_wins(state, self.table, perspective).len() as f64;
        let theirs_live4 = vcdt::two_stone_and_live_four_wins(state, self.table, opponent).len() as f64;
        let mine_live5 = vcdt::single_point_wins(state, self.table, perspective).len() as f64;
        let theirs_live5 = vcdt::single_point_wins(state, self.table, opponent).len() as f64;
        let mine_vcdts = vcdt::find_threats(state, self.table, perspective).len() as f64;
        let theirs_vcdts = vcdt::find_threats(state, self.table, opponent).len() as f64;

        mine_live4 * self.weights.live4 + mine_live5 * self.weights.live5
            - theirs_live4 * self.weights.live4 * 0.8
            - theirs_live5 * self.weights.live5 * 0.9
            + (mine_vcdts - theirs_vcdts) * self.weights.vcdt_bonus
    }

    /// Fixed mate/threat magnitudes.
    fn threat_defense_term(&self, state: &GameState, perspective: Player, opponent: Player) -> f64 {
        let mine_mate = vcdt::single_point_wins(state, self.table, perspective).len();
        let theirs_mate = vcdt::single_point_wins(state, self.table, opponent).len();

        let mine_two_live = vcdt::two_stone_and_live_four_wins(state, self.table, perspective);
        let theirs_two_live = vcdt::two_stone_and_live_four_wins(state, self.table, opponent);

        let mine_two_stone = mine_two_live.iter().filter(|t| t.threat_level == ThreatLevel::TwoStone).count();
        let theirs_two_stone = theirs_two_live.iter().filter(|t| t.threat_level == ThreatLevel::TwoStone).count();

        let mine_live4 = mine_two_live.iter().filter(|t| t.threat_level == ThreatLevel::LiveFour).count();
        let theirs_live4 = theirs_two_live.iter().filter(|t| t.threat_level == ThreatLevel::LiveFour).count();

        let mut score = 0.0;
        score += mine_mate as f64 * 200_000.0;
        score -= theirs_mate as f64 * 200_000.0;
        score += mine_two_stone as f64 * 100_000.0;
        score -= theirs_two_stone as f64 * 120_000.0;
        score += live_four_magnitude(mine_live4, 30_000.0, 10_000.0);
        score -= live_four_magnitude(theirs_live4, 80_000.0, 40_000.0);
        score
    }

    fn positional_term(&self, state: &GameState) -> f64 {
        let mut score = 0.0;
        for y in 0..state.board_size() {
            for x in 0..state.board_size() {
                let pos = Position::new(x, y);
                let cell = state.get(pos);
                if cell == crate::board::Cell::Empty {
                    continue;
                }
                let closeness = POSITIONAL_MAX_DIST - pos.manhattan(CENTER) as f64;
                let signed = if cell == crate::board::Cell::Black { closeness } else { -closeness };
                score += signed * POSITIONAL_WEIGHT;
            }
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Move;

    #[test]
    fn terminal_win_scores_extreme() {
        let table = RoadTable::new();
        let weights = EvaluationWeights::default();
        let evaluator = StaticEvaluator::new(weights, &table);

        let mut state = GameState::create_initial();
        state = state.apply(&Move::single(Player::Black, Position::new(1, 1))).unwrap();
        state = state
            .apply(&Move::pair(Player::White, Position::new(10, 10), Position::new(10, 11)))
            .unwrap();
        state = state
            .apply(&Move::pair(Player::Black, Position::new(2, 1), Position::new(3, 1)))
            .unwrap();
        state = state
            .apply(&Move::pair(Player::White, Position::new(10, 12), Position::new(10, 13)))
            .unwrap();
        state = state
            .apply(&Move::pair(Player::Black, Position::new(4, 1), Position::new(5, 1)))
            .unwrap();

        assert_eq!(state.winner(), Some(Winner::Black));
        assert_eq!(evaluator.evaluate(&state, Player::Black), WIN_SCORE);
        assert_eq!(evaluator.evaluate(&state, Player::White), -WIN_SCORE);
    }

    #[test]
    fn empty_board_is_neutral() {
        let table = RoadTable::new();
        let weights = EvaluationWeights::default();
        let evaluator = StaticEvaluator::new(weights, &table);
        let state = GameState::create_initial();
        assert_eq!(evaluator.evaluate(&state, Player::Black), 0.0);
    }
}

//! Defense against an opponent live four: prefer spending only one stone on
//! the block when a single open end can be closed off safely, falling back
//! to blocking both ends when neither end is safe alone.

use crate::board::{GameState, Move, Player, Position};
use crate::road::RoadTable;
use crate::rzop;
use crate::vcdt::{self, ThreatLevel};

const CENTER: Position = Position { x: 9, y: 9 };

pub fn defend_live_four(state: &GameState, table: &RoadTable, player: Player) -> Option<Move> {
    let opponent = player.opponent();
    let threats = vcdt::two_stone_and_live_four_wins(state, table, opponent);
    let live_four = threats.iter().find(|t| t.threat_level == ThreatLevel::LiveFour)?;
    let e1 = *live_four.positions.first()?;
    let e2 = *live_four.positions.get(1)?;

    let safe_ends: Vec<Position> =
        [e1, e2].into_iter().filter(|&e| is_safe_single_block(state, table, player, opponent, e)).collect();

    if let Some(&safe) = safe_ends.iter().min_by_key(|&&p| p.manhattan(CENTER)) {
        let other_end = if safe == e1 { e2 } else { e1 };
        let companion = rzop::generate_candidates(state, table, player)
            .into_iter()
            .find(|&c| c != safe)
            .filter(|&c| c != safe)
            .or(Some(other_end).filter(|&o| o != safe))
            .unwrap_or(CENTER);
        return Some(state.complete_move(player, &[safe, companion]));
    }

    Some(state.complete_move(player, &[e1, e2]))
}

/// Simulate `player` playing a full turn anchored at `e`; `e` is safe if the
/// opponent has no remaining single-point or two-stone win afterward.
fn is_safe_single_block(state: &GameState, table: &RoadTable, player: Player, opponent: Player, e: Position) -> bool {
    let simulated = state.complete_move(player, &[e]);
    let next = match state.apply(&simulated) {
        Ok(s) => s,
        Err(_) => return false,
    };
    vcdt::single_point_wins(&next, table, opponent).is_empty()
        && vcdt::two_stone_and_live_four_wins(&next, table, opponent)
            .iter()
            .all(|t| t.threat_level != ThreatLevel::TwoStone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Move as BMove;

    #[test]
    fn no_defense_needed_on_empty_board() {
        let table = RoadTable::new();
        let state = GameState::create_initial();
        assert!(defend_live_four(&state, &table, Player::Black).is_none());
    }

    #[test]
    fn blocks_one_end_of_an_opponent_live_four() {
        let table = RoadTable::new();
        let mut state = GameState::create_initial();
        state = state.apply(&BMove::single(Player::Black, Position::new(0, 0))).unwrap();
        state = state
            .apply(&BMove::pair(Player::White, Position::new(1, 1), Position::new(2, 1)))
            .unwrap();
        state = state
            .apply(&BMove::pair(Player::Black, Position::new(17, 17), Position::new(17, 18)))
            .unwrap();
        state = state
            .apply(&BMove::pair(Player::White, Position::new(3, 1), Position::new(4, 1)))
            .unwrap();
        // White now has an open four at (1..4, 1); Black must respond.
        let mv = defend_live_four(&state, &table, Player::Black);
        assert!(mv.is_some());
        let mv = mv.unwrap();
        assert!(mv.positions.contains(&Position::new(0, 1)) || mv.positions.contains(&Position::new(5, 1)));
    }

    #[test]
    fn blocks_both_ends_when_neither_single_end_is_safe() {
        let table = RoadTable::new();
        let mut state = GameState::create_initial();
        // White builds an open four at (1..4,1) -- the live four to defend
        // against -- plus an independent closed four at (0..3,3) whose gaps
        // at (4,3)/(5,3) make it a standing two-stone win. Blocking either
        // end of the row-1 four leaves the row-3 two-stone win completely
        // untouched, so neither end alone is a safe block.
        state = state.apply(&BMove::single(Player::Black, Position::new(18, 18))).unwrap();
        state = state
            .apply(&BMove::pair(Player::White, Position::new(1, 1), Position::new(2, 1)))
            .unwrap();
        state = state.apply(&BMove::pair(Player::Black, Position::new(17, 17), Position::new(17, 16))).unwrap();
        state = state
            .apply(&BMove::pair(Player::White, Position::new(3, 1), Position::new(4, 1)))
            .unwrap();
        state = state.apply(&BMove::pair(Player::Black, Position::new(16, 17), Position::new(16, 16))).unwrap();
        state = state
            .apply(&BMove::pair(Player::White, Position::new(0, 3), Position::new(1, 3)))
            .unwrap();
        state = state.apply(&BMove::pair(Player::Black, Position::new(15, 17), Position::new(15, 16))).unwrap();
        state = state
            .apply(&BMove::pair(Player::White, Position::new(2, 3), Position::new(3, 3)))
            .unwrap();

        let mv = defend_live_four(&state, &table, Player::Black).unwrap();
        assert!(mv.positions.contains(&Position::new(0, 1)));
        assert!(mv.positions.contains(&Position::new(5, 1)));
    }
}

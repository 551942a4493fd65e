//! VCDT: Victory-by-Continuous-Double-Threat detection.
//!
//! Scans the precomputed road table for forcing patterns a single turn
//! (one or two stones) can exploit or must answer: single-point wins,
//! two-stone wins, live fours, and composed two-point mates.

use crate::board::{Cell, GameState, Player, Position};
use crate::road::{Road, RoadTable};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThreatLevel {
    /// A 4-in-window / 2-empty pattern, completable by one full turn.
    TwoStone,
    /// Four-in-a-row with both window ends open: two independent completions.
    LiveFour,
    /// A single empty cell away from six-in-a-row.
    Immediate,
    /// Two stones that simultaneously open two or more immediate threats.
    ComposedMate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCDTThreat {
    pub positions: Vec<Position>,
    pub is_winning: bool,
    pub threat_level: ThreatLevel,
}

impl VCDTThreat {
    fn new(mut positions: Vec<Position>, is_winning: bool, threat_level: ThreatLevel) -> Self {
        positions.sort_by_key(|p| (p.x, p.y));
        VCDTThreat { positions, is_winning, threat_level }
    }

    fn dedup_key(&self) -> BTreeSet<(usize, usize)> {
        self.positions.iter().map(|p| (p.x, p.y)).collect()
    }
}

/// Count stones of each color and empties within `road`, given the real
/// board plus a hypothetical overlay of `player` stones at `overlay`.
fn road_counts(state: &GameState, road: &Road, player: Player, overlay: &[Position]) -> (usize, usize, usize) {
    let mut mine = 0;
    let mut theirs = 0;
    let mut empty = 0;
    let player_cell = match player {
        Player::Black => Cell::Black,
        Player::White => Cell::White,
    };
    for &cell in &road.cells {
        let occupied = if overlay.contains(&cell) { player_cell } else { state.get(cell) };
        if occupied == player_cell {
            mine += 1;
        } else if occupied == Cell::Empty {
            empty += 1;
        } else {
            theirs += 1;
        }
    }
    (mine, theirs, empty)
}

fn empties_in_road(state: &GameState, road: &Road) -> Vec<Position> {
    road.cells.iter().copied().filter(|&c| state.get(c) == Cell::Empty).collect()
}

/// Roads with five `player` stones and one empty cell: placing there wins now.
pub fn single_point_wins(state: &GameState, table: &RoadTable, player: Player) -> Vec<VCDTThreat> {
    let mut out = Vec::new();
    for road in table.roads() {
        let (mine, theirs, empty) = road_counts(state, road, player, &[]);
        if mine == 5 && theirs == 0 && empty == 1 {
            let gap = empties_in_road(state, road);
            out.push(VCDTThreat::new(gap, true, ThreatLevel::Immediate));
        }
    }
    dedup(out)
}

/// Roads with four `player` stones and two empties: a full turn wins.
/// When the two empties sit at both window ends the pattern is a live four
/// and is reported at a higher threat level.
pub fn two_stone_and_live_four_wins(state: &GameState, table: &RoadTable, player: Player) -> Vec<VCDTThreat> {
    let mut out = Vec::new();
    for road in table.roads() {
        let (mine, theirs, empty) = road_counts(state, road, player, &[]);
        if mine == 4 && theirs == 0 && empty == 2 {
            let gaps = empties_in_road(state, road);
            let ends_open = gaps.contains(&road.cells[0]) && gaps.contains(&road.cells[5]);
            let level = if ends_open { ThreatLevel::LiveFour } else { ThreatLevel::TwoStone };
            out.push(VCDTThreat::new(gaps, true, level));
        }
    }
    dedup(out)
}

/// Pairs of empty cells such that filling both with `player` stones opens
/// at least two distinct immediate (5+1) threats elsewhere. Candidates are
/// restricted to cells already within a road carrying 3+ of `player`'s
/// stones, to keep the search bounded.
pub fn composed_two_point_mates(state: &GameState, table: &RoadTable, player: Player) -> Vec<VCDTThreat> {
    let mut candidates: BTreeSet<Position> = BTreeSet::new();
    for road in table.roads() {
        let (mine, theirs, empty) = road_counts(state, road, player, &[]);
        if mine >= 3 && theirs == 0 && empty >= 1 {
            for &cell in &road.cells {
                if state.get(cell) == Cell::Empty {
                    candidates.insert(cell);
                }
            }
        }
    }

    let candidates: Vec<Position> = candidates.into_iter().collect();
    let mut out = Vec::new();

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let overlay = [candidates[i], candidates[j]];
            let mut immediate_threats = 0;
            for road in table.roads() {
                let (mine, theirs, empty) = road_counts(state, road, player, &overlay);
                if mine == 5 && theirs == 0 && empty == 1 {
                    immediate_threats += 1;
                }
            }
            if immediate_threats >= 2 {
                out.push(VCDTThreat::new(overlay.to_vec(), true, ThreatLevel::ComposedMate));
            }
        }
    }

    dedup(out)
}

/// All threats for `player`, deduplicated by the unordered set of cells involved.
pub fn find_threats(state: &GameState, table: &RoadTable, player: Player) -> Vec<VCDTThreat> {
    let mut all = single_point_wins(state, table, player);
    all.extend(two_stone_and_live_four_wins(state, table, player));
    all.extend(composed_two_point_mates(state, table, player));
    dedup(all)
}

fn dedup(threats: Vec<VCDTThreat>) -> Vec<VCDTThreat> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for t in threats {
        let key = t.dedup_key();
        if seen.insert(key) {
            out.push(t);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Move;

    fn apply_singles(mut state: GameState, player: Player, cells: &[(usize, usize)]) -> GameState {
        for &(x, y) in cells {
            state = state.apply(&Move::single(player, Position::new(x, y))).unwrap_or(state.clone());
        }
        state
    }

    #[test]
    fn five_in_a_row_is_an_immediate_threat() {
        let table = RoadTable::new();
        let mut state = GameState::create_initial();
        // Force move-number accounting: place via direct pair moves for black.
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

        let threats = single_point_wins(&state, &table, Player::Black);
        assert!(threats.iter().any(|t| t.positions == vec![Position::new(6, 1)]
            || t.positions == vec![Position::new(0, 1)]));
        let _ = apply_singles;
    }

    #[test]
    fn empty_board_has_no_threats() {
        let table = RoadTable::new();
        let state = GameState::create_initial();
        assert!(find_threats(&state, &table, Player::Black).is_empty());
    }
}

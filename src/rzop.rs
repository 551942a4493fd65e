//! RZOP: Relevance-Zone, Ordered-and-Pruned candidate generation.
//!
//! Narrows the legal-move space down to a manageable, well-ordered set of
//! single-cell candidates, then composes them into two-stone moves.

use crate::board::{Cell, GameState, Move, Player, Position};
use crate::road::RoadTable;
use crate::vcdt;
use std::collections::BTreeSet;

const RELEVANCE_RADIUS: i32 = 3;
const MAX_PER_LINE: usize = 4;
const MAX_PAIRS: usize = 1000;

/// Empty cells within `radius` (Chebyshev distance) of any occupied cell.
/// On an empty board, falls back to the center plus its four orthogonal
/// neighbors.
fn relevance_zone(state: &GameState, radius: i32) -> BTreeSet<Position> {
    let mut zone = BTreeSet::new();
    let n = state.board_size();

    for y in 0..n {
        for x in 0..n {
            if state.get(Position::new(x, y)) == Cell::Empty {
                continue;
            }
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx as usize >= n || ny as usize >= n {
                        continue;
                    }
                    let p = Position::new(nx as usize, ny as usize);
                    if state.get(p) == Cell::Empty {
                        zone.insert(p);
                    }
                }
            }
        }
    }

    if zone.is_empty() {
        let cx = (n / 2) as i32;
        let cy = (n / 2) as i32;
        for &(dx, dy) in &[(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)] {
            let x = cx + dx;
            let y = cy + dy;
            if x >= 0 && y >= 0 && (x as usize) < n && (y as usize) < n {
                zone.insert(Position::new(x as usize, y as usize));
            }
        }
    }

    zone
}

/// A line is "dead" when it already carries both colors: no placement can
/// ever turn it into a six-in-a-row.
fn is_dead_line(state: &GameState, table: &RoadTable, pos: Position) -> bool {
    table.roads_through(pos).all(|road| {
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
}

/// True when some road through `pos` already has 5 or more contiguous
/// same-color stones: placing here would merely extend an already-settled
/// line rather than open new shape.
fn is_pure_line_extension(state: &GameState, table: &RoadTable, pos: Position) -> bool {
    table.roads_through(pos).any(|road| {
        let mut best_run = 0usize;
        let mut run = 0usize;
        let mut current: Option<Cell> = None;
        for &cell in &road.cells {
            let occupant = state.get(cell);
            if occupant != Cell::Empty && Some(occupant) == current {
                run += 1;
            } else if occupant != Cell::Empty {
                current = Some(occupant);
                run = 1;
            } else {
                current = None;
                run = 0;
            }
            best_run = best_run.max(run);
        }
        best_run >= 5
    })
}

/// Single-cell candidates for `player` to consider at this node: the
/// relevance zone plus any VCDT threat cells for either side, filtered down
/// to high-value non-extension non-dead cells (urgent cells always kept),
/// quota-limited per originating road, and ordered urgent-first then by
/// road density. Falls back to the unfiltered relevance zone if filtering
/// or quoting would leave nothing.
pub fn generate_candidates(state: &GameState, table: &RoadTable, player: Player) -> Vec<Position> {
    let mut zone = relevance_zone(state, RELEVANCE_RADIUS);

    let mut urgent: BTreeSet<Position> = BTreeSet::new();
    for threat in vcdt::find_threats(state, table, player) {
        urgent.extend(threat.positions);
    }
    for threat in vcdt::find_threats(state, table, player.opponent()) {
        urgent.extend(threat.positions);
    }
    zone.extend(urgent.iter().copied());

    let unfiltered_zone: Vec<Position> = zone.iter().copied().collect();

    let filtered: Vec<Position> = zone
        .into_iter()
        .filter(|&p| {
            urgent.contains(&p)
                || (table.is_high_value_road_cell(state, p, 3)
                    && !is_pure_line_extension(state, table, p)
                    && !is_dead_line(state, table, p))
        })
        .collect();

    if filtered.is_empty() {
        return unfiltered_zone;
    }

    let mut per_line_count: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
    let mut quota_applied = Vec::new();
    for pos in filtered {
        let best_line = table.road_indices_through(pos).first().copied();
        let within_quota = match best_line {
            Some(line) => {
                let count = per_line_count.entry(line).or_insert(0);
                let ok = *count < MAX_PER_LINE;
                *count += 1;
                ok
            }
            None => true,
        };
        if urgent.contains(&pos) || within_quota {
            quota_applied.push(pos);
        }
    }

    quota_applied.sort_by_key(|&p| {
        let is_urgent = !urgent.contains(&p);
        let density = std::cmp::Reverse(table.road_count_through(p));
        (is_urgent, density)
    });

    if quota_applied.is_empty() {
        unfiltered_zone
    } else {
        quota_applied
    }
}

/// Compose single-cell candidates into two-stone moves for `player`,
/// preferring urgent-threat pairs, then center-center pairs, then
/// center-periphery pairs, deduplicated and capped at `MAX_PAIRS`.
pub fn generate_move_pairs(state: &GameState, table: &RoadTable, player: Player) -> Vec<Move> {
    let candidates = generate_candidates(state, table, player);
    if candidates.len() < 2 {
        return candidates
            .into_iter()
            .map(|p| Move::single(player, p))
            .collect();
    }

    let urgent: BTreeSet<Position> = vcdt::find_threats(state, table, player)
        .into_iter()
        .chain(vcdt::find_threats(state, table, player.opponent()))
        .flat_map(|t| t.positions)
        .collect();

    let mut seen: BTreeSet<(Position, Position)> = BTreeSet::new();
    let mut pairs = Vec::new();

    let mut push_pair = |a: Position, b: Position, pairs: &mut Vec<Move>, seen: &mut BTreeSet<(Position, Position)>| {
        let key = if (a.x, a.y) <= (b.x, b.y) { (a, b) } else { (b, a) };
        if seen.insert(key) && pairs.len() < MAX_PAIRS {
            pairs.push(Move::pair(player, a, b));
        }
    };

    // Band 1: urgent-urgent pairs.
    let urgent_vec: Vec<Position> = candidates.iter().copied().filter(|p| urgent.contains(p)).collect();
    for i in 0..urgent_vec.len() {
        for j in (i + 1)..urgent_vec.len() {
            push_pair(urgent_vec[i], urgent_vec[j], &mut pairs, &mut seen);
        }
    }

    // Band 2: urgent-periphery pairs (urgent cell paired with the next-best candidate).
    for &u in &urgent_vec {
        for &c in candidates.iter().take(20) {
            if c != u {
                push_pair(u, c, &mut pairs, &mut seen);
            }
        }
    }

    // Band 3: best-candidate-with-best-candidate pairs.
    let top: Vec<Position> = candidates.iter().copied().take(30).collect();
    for i in 0..top.len() {
        for j in (i + 1)..top.len() {
            push_pair(top[i], top[j], &mut pairs, &mut seen);
            if pairs.len() >= MAX_PAIRS {
                break;
            }
        }
        if pairs.len() >= MAX_PAIRS {
            break;
        }
    }

    pairs.truncate(MAX_PAIRS);
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_falls_back_to_center_and_its_neighbors() {
        let table = RoadTable::new();
        let state = GameState::create_initial();
        let candidates = generate_candidates(&state, &table, Player::Black);
        assert!(candidates.contains(&Position::new(9, 9)));
        assert_eq!(candidates.len(), 5);
        for c in &candidates {
            assert!(c.manhattan(Position::new(9, 9)) <= 1);
        }
    }

    #[test]
    fn move_pairs_respect_cap() {
        let table = RoadTable::new();
        let mut state = GameState::create_initial();
        state = state.apply(&Move::single(Player::Black, Position::new(9, 9))).unwrap();
        let pairs = generate_move_pairs(&state, &table, Player::White);
        assert!(!pairs.is_empty());
        assert!(pairs.len() <= MAX_PAIRS);
    }

    #[test]
    fn candidates_stay_within_relevance_zone_near_one_stone() {
        let table = RoadTable::new();
        let mut state = GameState::create_initial();
        state = state.apply(&Move::single(Player::Black, Position::new(9, 9))).unwrap();
        let candidates = generate_candidates(&state, &table, Player::White);
        for c in candidates {
            assert!(c.manhattan(Position::new(9, 9)) <= 6);
        }
    }
}

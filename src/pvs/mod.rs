//! PVS (Principal Variation Search) engine: iterative deepening with
//! aspiration windows over a negamax-alpha-beta core, a transposition
//! table, killer/history move ordering, and quiescence search.

mod smart_defense;

use crate::board::{GameState, Move, Player, Position};
use crate::config::{EvaluationWeights, SearchConfig};
use crate::error::{Connect6Error, Result};
use crate::eval::StaticEvaluator;
use crate::road::RoadTable;
use crate::rzop;
use crate::vcdt::{self, ThreatLevel};
use log::{debug, trace};
use std::collections::HashMap;
use std::time::Instant;

const WIN_SCORE: f64 = 1_000_000.0;
const MAX_PLY: usize = 64;
const MAX_TT_ENTRIES: usize = 1_000_000;
const TT_EVICTION_KEEP_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TtFlag {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone)]
struct TtEntry {
    depth: u32,
    score_milli: i64,
    flag: TtFlag,
    best_move: Option<Move>,
}

#[derive(Debug, Clone)]
pub struct DecisionMeta {
    pub depth_reached: u32,
    pub nodes: u64,
    pub elapsed_ms: u128,
    pub mode: String,
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub mv: Move,
    pub score: f64,
    pub meta: DecisionMeta,
}

pub struct PvsEngine {
    weights: EvaluationWeights,
    table: RoadTable,
    tt: HashMap<u64, TtEntry>,
    killer_moves: Vec<[Option<Move>; 2]>,
    history: HashMap<(usize, usize), f64>,
    nodes: u64,
}

impl PvsEngine {
    pub fn new(weights: EvaluationWeights) -> Self {
        PvsEngine {
            weights,
            table: RoadTable::new(),
            tt: HashMap::new(),
            killer_moves: vec![[None, None]; MAX_PLY],
            history: HashMap::new(),
            nodes: 0,
        }
    }

    pub fn decide(&mut self, state: &GameState, config: SearchConfig) -> Result<Decision> {
        if state.is_game_over() {
            return Err(Connect6Error::TerminalState);
        }

        let config = config.adapted_for_move(state.move_number());
        let player = state.current_player();

        if let Some(mv) = self.root_forcing_move(state, player) {
            return Ok(Decision {
                mv,
                score: WIN_SCORE,
                meta: DecisionMeta { depth_reached: 0, nodes: 0, elapsed_ms: 0, mode: "forced_win".into() },
            });
        }

        if let Some(mv) = self.block_opponent_two_stone_mate(state, player) {
            return Ok(Decision {
                mv,
                score: -WIN_SCORE / 2.0,
                meta: DecisionMeta { depth_reached: 0, nodes: 0, elapsed_ms: 0, mode: "forced_block".into() },
            });
        }

        if let Some(mv) = self.block_opponent_single_point_mate(state, player) {
            return Ok(Decision {
                mv,
                score: -WIN_SCORE / 2.0,
                meta: DecisionMeta { depth_reached: 0, nodes: 0, elapsed_ms: 0, mode: "forced_block".into() },
            });
        }

        if let Some(mv) = smart_defense::defend_live_four(state, &self.table, player) {
            return Ok(Decision {
                mv,
                score: -WIN_SCORE / 2.0,
                meta: DecisionMeta { depth_reached: 0, nodes: 0, elapsed_ms: 0, mode: "smart_defense".into() },
            });
        }

        if state.move_number() == 0 {
            let center = Position::new(state.board_size() / 2, state.board_size() / 2);
            return Ok(Decision {
                mv: Move::single(player, center),
                score: 0.0,
                meta: DecisionMeta { depth_reached: 0, nodes: 0, elapsed_ms: 0, mode: "opening_book".into() },
            });
        }

        self.nodes = 0;
        let start = Instant::now();
        let deadline = start + std::time::Duration::from_millis(config.time_limit_ms);

        let mut best_move: Option<Move> = None;
        let mut best_score = 0.0;
        let mut depth_reached = 0;
        let mut window_center = 0.0;

        let mut depth = 1;
        while depth <= config.max_depth {
            if Instant::now() >= deadline {
                break;
            }

            let mut half_width = 250.0;
            let mut result = None;
            loop {
                let alpha = window_center - half_width;
                let beta = window_center + half_width;
                let root_result = self.search_root(state, depth, alpha, beta, &deadline);
                match root_result {
                    Some((mv, score)) if score <= alpha || score >= beta => {
                        half_width *= 4.0;
                        if half_width > WIN_SCORE * 2.0 {
                            result = Some((mv, score));
                            break;
                        }
                        trace!("aspiration re-search at depth {depth}, widened to {half_width}");
                    }
                    Some((mv, score)) => {
                        result = Some((mv, score));
                        break;
                    }
                    None => break,
                }
            }

            if Instant::now() >= deadline && result.is_none() {
                break;
            }

            if let Some((mv, score)) = result {
                best_move = Some(mv);
                best_score = score;
                window_center = score;
                depth_reached = depth;
                debug!("depth {depth} complete: score={score} nodes={}", self.nodes);
            }

            depth += 1;
        }

        let mv = match best_move {
            Some(mv) => mv,
            None => rzop::generate_move_pairs(state, &self.table, player)
                .into_iter()
                .next()
                .ok_or(Connect6Error::EmptyMctsRoot)?,
        };

        Ok(Decision {
            mv,
            score: best_score,
            meta: DecisionMeta {
                depth_reached,
                nodes: self.nodes,
                elapsed_ms: start.elapsed().as_millis(),
                mode: "pvs".into(),
            },
        })
    }

    /// A won-already root: a single or two-stone completion available now.
    fn root_forcing_move(&self, state: &GameState, player: Player) -> Option<Move> {
        let single = vcdt::single_point_wins(state, &self.table, player);
        if let Some(t) = single.first() {
            return Some(state.complete_move(player, &t.positions));
        }
        let two_stone = vcdt::two_stone_and_live_four_wins(state, &self.table, player);
        if let Some(t) = two_stone.iter().find(|t| t.positions.len() == 2) {
            return Some(state.complete_move(player, &t.positions));
        }
        None
    }

    /// Block an opponent two-stone mate: a common cell across every pair
    /// blocks them all at once, a single pair is blocked at both its cells,
    /// and multiple unrelated pairs are blocked at their two most-shared
    /// cells.
    fn block_opponent_two_stone_mate(&self, state: &GameState, player: Player) -> Option<Move> {
        let opponent = player.opponent();
        let threats: Vec<_> = vcdt::two_stone_and_live_four_wins(state, &self.table, opponent)
            .into_iter()
            .filter(|t| t.threat_level == ThreatLevel::TwoStone)
            .collect();
        if threats.is_empty() {
            return None;
        }

        if let Some(first) = threats.first() {
            for &candidate in &first.positions {
                if threats.iter().all(|t| t.positions.contains(&candidate)) {
                    return Some(state.complete_move(player, &[candidate]));
                }
            }
        }

        if threats.len() == 1 {
            return Some(state.complete_move(player, &threats[0].positions));
        }

        let mut coverage: HashMap<Position, usize> = HashMap::new();
        for t in &threats {
            for &p in &t.positions {
                *coverage.entry(p).or_insert(0) += 1;
            }
        }
        let mut cells: Vec<Position> = coverage.keys().copied().collect();
        cells.sort_by_key(|&p| std::cmp::Reverse(coverage[&p]));
        cells.truncate(2);
        Some(state.complete_move(player, &cells))
    }

    /// Occupy an opponent's single-point mate cell before they can play it.
    fn block_opponent_single_point_mate(&self, state: &GameState, player: Player) -> Option<Move> {
        let opponent = player.opponent();
        let t = vcdt::single_point_wins(state, &self.table, opponent).into_iter().next()?;
        Some(state.complete_move(player, &t.positions))
    }

    fn search_root(
        &mut self,
        state: &GameState,
        depth: u32,
        mut alpha: f64,
        beta: f64,
        deadline: &Instant,
    ) -> Option<(Move, f64)> {
        let player = state.current_player();
        let moves = self.ordered_moves(state, player, 0);
        if moves.is_empty() {
            return None;
        }

        let mut best_move = moves[0].clone();
        let mut best_score = f64::NEG_INFINITY;

        for mv in moves {
            if Instant::now() >= *deadline {
                return if best_score > f64::NEG_INFINITY { Some((best_move, best_score)) } else { None };
            }
            let child = match state.apply(&mv) {
                Ok(s) => s,
                Err(_) => continue,
            };
            let score = -self.pvs(&child, depth - 1, -beta, -alpha, 1, deadline);
            if score > best_score {
                best_score = score;
                best_move = mv;
            }
            alpha = alpha.max(best_score);
            if alpha >= beta {
                break;
            }
        }

        Some((best_move, best_score))
    }

    fn pvs(&mut self, state: &GameState, depth: u32, mut alpha: f64, beta: f64, ply: usize, deadline: &Instant) -> f64 {
        self.nodes += 1;

        if let Some(winner) = state.winner() {
            let player = state.current_player();
            return terminal_score(winner, player);
        }

        let key = state.position_key();
        let alpha_orig = alpha;
        if let Some(entry) = self.tt.get(&key) {
            if entry.depth >= depth {
                let score = entry.score_milli as f64 / 1000.0;
                match entry.flag {
                    TtFlag::Exact => return score,
                    TtFlag::Lower if score >= beta => return score,
                    TtFlag::Upper if score <= alpha => return score,
                    _ => {}
                }
            }
        }

        if depth == 0 || Instant::now() >= *deadline {
            return self.quiescence(state, alpha, beta, ply, deadline);
        }

        let player = state.current_player();
        let moves = self.ordered_moves(state, player, ply);
        if moves.is_empty() {
            return self.evaluator().evaluate(state, player);
        }

        let mut best_score = f64::NEG_INFINITY;
        let mut best_move = None;

        for (i, mv) in moves.iter().enumerate() {
            let child = match state.apply(mv) {
                Ok(s) => s,
                Err(_) => continue,
            };

            let score = if i == 0 {
                -self.pvs(&child, depth.saturating_sub(1), -beta, -alpha, ply + 1, deadline)
            } else {
                let probe = -self.pvs(&child, depth.saturating_sub(1), -alpha - 1.0, -alpha, ply + 1, deadline);
                if probe > alpha && probe < beta {
                    -self.pvs(&child, depth.saturating_sub(1), -beta, -probe, ply + 1, deadline)
                } else {
                    probe
                }
            };

            if score > best_score {
                best_score = score;
                best_move = Some(mv.clone());
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                self.record_killer(ply, mv.clone());
                self.bump_history(mv);
                break;
            }
        }

        let flag = if best_score <= alpha_orig {
            TtFlag::Upper
        } else if best_score >= beta {
            TtFlag::Lower
        } else {
            TtFlag::Exact
        };
        self.store_tt(key, depth, best_score, flag, best_move);

        best_score
    }

    /// Extend the search over VCDT-forcing replies only, until the position is quiet.
    fn quiescence(&mut self, state: &GameState, mut alpha: f64, beta: f64, ply: usize, deadline: &Instant) -> f64 {
        let player = state.current_player();
        let stand_pat = self.evaluator().evaluate(state, player);
        if stand_pat >= beta {
            return stand_pat;
        }
        alpha = alpha.max(stand_pat);

        if ply >= MAX_PLY || Instant::now() >= *deadline {
            return stand_pat;
        }

        let forcing = self.forcing_moves(state, player);
        if forcing.is_empty() {
            return stand_pat;
        }

        let mut best = stand_pat;
        for mv in forcing {
            let child = match state.apply(&mv) {
                Ok(s) => s,
                Err(_) => continue,
            };
            let score = -self.quiescence(&child, -beta, -alpha, ply + 1, deadline);
            if score > best {
                best = score;
            }
            if best > alpha {
                alpha = best;
            }
            if alpha >= beta {
                break;
            }
        }
        best
    }

    fn forcing_moves(&self, state: &GameState, player: Player) -> Vec<Move> {
        let mut moves = Vec::new();
        for t in vcdt::single_point_wins(state, &self.table, player) {
            moves.push(state.complete_move(player, &t.positions));
        }
        for t in vcdt::two_stone_and_live_four_wins(state, &self.table, player) {
            moves.push(state.complete_move(player, &t.positions));
        }
        moves
    }

    /// Blend RZOP candidate order with killer moves and history scores.
    fn ordered_moves(&self, state: &GameState, player: Player, ply: usize) -> Vec<Move> {
        let mut moves = rzop::generate_move_pairs(state, &self.table, player);

        let killers = self.killer_moves.get(ply).copied().unwrap_or([None, None]);
        moves.sort_by(|a, b| {
            let score_a = self.move_order_score(a, &killers);
            let score_b = self.move_order_score(b, &killers);
            score_b.partial_cmp(&score_a).unwrap_or(std::cmp::Ordering::Equal)
        });
        moves
    }

    fn move_order_score(&self, mv: &Move, killers: &[Option<Move>; 2]) -> f64 {
        let mut score = 0.0;
        if killers.iter().any(|k| k.as_ref() == Some(mv)) {
            score += 10_000.0;
        }
        for pos in &mv.positions {
            score += self.history.get(&(pos.x, pos.y)).copied().unwrap_or(0.0);
        }
        score
    }

    fn record_killer(&mut self, ply: usize, mv: Move) {
        if ply >= self.killer_moves.len() {
            return;
        }
        let slot = &mut self.killer_moves[ply];
        if slot[0].as_ref() != Some(&mv) {
            slot[1] = slot[0].take();
            slot[0] = Some(mv);
        }
    }

    fn bump_history(&mut self, mv: &Move) {
        for pos in &mv.positions {
            *self.history.entry((pos.x, pos.y)).or_insert(0.0) += 1.0;
        }
    }

    fn store_tt(&mut self, key: u64, depth: u32, score: f64, flag: TtFlag, best_move: Option<Move>) {
        if self.tt.len() >= MAX_TT_ENTRIES {
            self.evict_tt();
        }
        self.tt.insert(key, TtEntry { depth, score_milli: (score * 1000.0) as i64, flag, best_move });
    }

    /// Keep the deepest `TT_EVICTION_KEEP_FRACTION` of entries, drop the rest.
    fn evict_tt(&mut self) {
        let mut depths: Vec<u32> = self.tt.values().map(|e| e.depth).collect();
        depths.sort_unstable();
        let cutoff_idx = ((depths.len() as f64) * (1.0 - TT_EVICTION_KEEP_FRACTION)) as usize;
        let cutoff = depths.get(cutoff_idx).copied().unwrap_or(0);
        self.tt.retain(|_, e| e.depth >= cutoff);
    }

    fn evaluator(&self) -> StaticEvaluator<'_> {
        StaticEvaluator::new(self.weights, &self.table)
    }
}

fn terminal_score(winner: crate::board::Winner, to_move: Player) -> f64 {
    use crate::board::Winner;
    match winner {
        Winner::Draw => 0.0,
        Winner::Black if to_move == Player::Black => WIN_SCORE,
        Winner::White if to_move == Player::White => WIN_SCORE,
        _ => -WIN_SCORE,
    }
}

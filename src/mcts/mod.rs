//! MCTS engine: PUCT selection, Dirichlet root noise, a pluggable
//! policy/value `Evaluator`, bounded rollouts, and a two-table
//! (self/opponent) LRU-evicted transposition scheme.

use crate::board::{GameState, Move, Player, Winner};
use crate::config::MctsConfig;
use crate::error::{Connect6Error, Result};
use crate::road::RoadTable;
use crate::rzop;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Dirichlet, Distribution};
use std::collections::HashMap;

/// Policy/value oracle boundary. `policy` is a flat, row-major
/// `board_size * board_size` distribution over cells.
pub struct EvaluatorOutput {
    pub policy: Vec<f64>,
    pub value: f64,
}

pub trait Evaluator {
    fn evaluate(&self, state: &GameState) -> EvaluatorOutput;
}

/// Perspective-symmetric stub oracle: uniform policy, zero value.
/// Used for tests and demos where no trained oracle is wired in.
pub struct UniformEvaluator;

impl Evaluator for UniformEvaluator {
    fn evaluate(&self, state: &GameState) -> EvaluatorOutput {
        let n = state.board_size() * state.board_size();
        EvaluatorOutput { policy: vec![1.0 / n as f64; n], value: 0.0 }
    }
}

struct Node {
    player_to_move: Player,
    incoming_move: Option<Move>,
    parent: Option<usize>,
    children: Vec<usize>,
    visits: u32,
    value_sum: f64,
    prior: f64,
    terminal: Option<Winner>,
    expanded: bool,
}

pub struct MctsEngine<'a> {
    config: MctsConfig,
    table: RoadTable,
    evaluator: &'a dyn Evaluator,
    rng: StdRng,
    self_tt: HashMap<u64, usize>,
    opponent_tt: HashMap<u64, usize>,
    self_tick: HashMap<u64, u64>,
    opponent_tick: HashMap<u64, u64>,
    tick: u64,
}

impl<'a> MctsEngine<'a> {
    pub fn new(config: MctsConfig, evaluator: &'a dyn Evaluator) -> Self {
        MctsEngine {
            config,
            table: RoadTable::new(),
            evaluator,
            rng: StdRng::seed_from_u64(config.seed),
            self_tt: HashMap::new(),
            opponent_tt: HashMap::new(),
            self_tick: HashMap::new(),
            opponent_tick: HashMap::new(),
            tick: 0,
        }
    }

    pub fn search(&mut self, root_state: &GameState) -> Result<Decision> {
        if root_state.is_game_over() {
            return Err(Connect6Error::TerminalState);
        }

        let root_player = root_state.current_player();
        let mut arena: Vec<Node> = vec![Node {
            player_to_move: root_player,
            incoming_move: None,
            parent: None,
            children: Vec::new(),
            visits: 0,
            value_sum: 0.0,
            prior: 1.0,
            terminal: None,
            expanded: false,
        }];
        let mut states: Vec<GameState> = vec![root_state.clone()];

        self.expand(&mut arena, &mut states, 0, root_player);
        self.apply_root_dirichlet_noise(&mut arena, 0);

        for _ in 0..self.config.simulation_count {
            self.simulate(&mut arena, &mut states);
        }

        let root = &arena[0];
        if root.children.is_empty() {
            return Err(Connect6Error::EmptyMctsRoot);
        }

        let best_idx = *root
            .children
            .iter()
            .max_by_key(|&&c| arena[c].visits)
            .expect("root has children");

        let best = &arena[best_idx];
        let mv = best.incoming_move.clone().expect("child has incoming move");
        let score = if best.visits > 0 { -(best.value_sum / best.visits as f64) } else { 0.0 };

        debug!("mcts root: {} simulations, best child visits={}", self.config.simulation_count, best.visits);

        Ok(Decision {
            mv,
            score,
            meta: DecisionMeta { simulations: self.config.simulation_count, root_visits: root.visits },
        })
    }

    fn simulate(&mut self, arena: &mut Vec<Node>, states: &mut Vec<GameState>) {
        let mut path = vec![0usize];
        let mut node_idx = 0;

        while arena[node_idx].expanded && !arena[node_idx].children.is_empty() && arena[node_idx].terminal.is_none() {
            node_idx = self.select_child(arena, node_idx);
            path.push(node_idx);
        }

        let value = if let Some(winner) = arena[node_idx].terminal {
            terminal_value(winner, arena[node_idx].player_to_move)
        } else if !arena[node_idx].expanded {
            let player = arena[node_idx].player_to_move;
            self.expand(arena, states, node_idx, player);
            if arena[node_idx].children.is_empty() {
                self.rollout(&states[node_idx])
            } else {
                self.evaluator.evaluate(&states[node_idx]).value
            }
        } else {
            self.rollout(&states[node_idx])
        };

        self.backup(arena, &path, value);
    }

    fn select_child(&mut self, arena: &[Node], parent_idx: usize) -> usize {
        let parent = &arena[parent_idx];
        let parent_visits = parent.visits.max(1) as f64;
        let c = self.config.ucb_constant;

        *parent
            .children
            .iter()
            .max_by(|&&a, &&b| {
                let sa = puct_score(&arena[a], parent_visits, c);
                let sb = puct_score(&arena[b], parent_visits, c);
                sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("node has children")
    }

    fn expand(&mut self, arena: &mut Vec<Node>, states: &mut Vec<GameState>, idx: usize, player: Player) {
        let state = states[idx].clone();
        arena[idx].expanded = true;

        if state.is_game_over() {
            arena[idx].terminal = state.winner();
            return;
        }

        let candidates = rzop::generate_move_pairs(&state, &self.table, player);
        let output = self.evaluator.evaluate(&state);
        let n = state.board_size();

        let mut scored: Vec<(Move, f64)> = candidates
            .into_iter()
            .take(self.config.expand_nodes as usize)
            .map(|mv| {
                let prior = mv
                    .positions
                    .iter()
                    .map(|p| output.policy.get(p.y * n + p.x).copied().unwrap_or(0.0))
                    .sum::<f64>()
                    / mv.positions.len().max(1) as f64;
                (mv, prior.max(1e-6))
            })
            .collect();

        let total: f64 = scored.iter().map(|(_, p)| p).sum();
        if total > 0.0 {
            for (_, p) in scored.iter_mut() {
                *p /= total;
            }
        }

        for (mv, prior) in scored {
            let child_state = match state.apply(&mv) {
                Ok(s) => s,
                Err(_) => continue,
            };
            let child_player = child_state.current_player();
            let key = child_state.position_key();

            let child_idx = arena.len();
            arena.push(Node {
                player_to_move: child_player,
                incoming_move: Some(mv),
                parent: Some(idx),
                children: Vec::new(),
                visits: 0,
                value_sum: 0.0,
                prior,
                terminal: child_state.winner(),
                expanded: false,
            });
            states.push(child_state);
            arena[idx].children.push(child_idx);
            self.remember(key, child_idx, player, child_player);
        }
        trace!("expanded node into {} children", arena[idx].children.len());
    }

    fn apply_root_dirichlet_noise(&mut self, arena: &mut [Node], root_idx: usize) {
        let children = arena[root_idx].children.clone();
        if children.len() < 2 {
            return;
        }
        let alpha = vec![0.3; children.len()];
        let Ok(dirichlet) = Dirichlet::new(&alpha) else { return };
        let noise: Vec<f64> = dirichlet.sample(&mut self.rng);
        let eps = self.config.dirichlet_epsilon;

        for (child, n) in children.iter().zip(noise) {
            let p = &mut arena[*child].prior;
            *p = (1.0 - eps) * *p + eps * n;
        }
    }

    /// Semi-random rollout over RZOP candidates, top-K softmax-sampled from
    /// the oracle's policy, for up to `simulation_steps` plies.
    fn rollout(&mut self, start: &GameState) -> f64 {
        let mut state = start.clone();
        let perspective = state.current_player();

        for _ in 0..self.config.simulation_steps {
            if state.is_game_over() {
                break;
            }
            let player = state.current_player();
            let candidates = rzop::generate_move_pairs(&state, &self.table, player);
            if candidates.is_empty() {
                break;
            }
            let output = self.evaluator.evaluate(&state);
            let n = state.board_size();
            let mut scored: Vec<(Move, f64)> = candidates
                .into_iter()
                .map(|mv| {
                    let score = mv
                        .positions
                        .iter()
                        .map(|p| output.policy.get(p.y * n + p.x).copied().unwrap_or(0.0))
                        .sum::<f64>();
                    (mv, score)
                })
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(self.config.rollout_top_k.max(1));

            let mv = self.softmax_sample(&scored);
            match state.apply(&mv) {
                Ok(next) => state = next,
                Err(_) => break,
            }
        }

        if let Some(winner) = state.winner() {
            terminal_value(winner, perspective)
        } else {
            self.evaluator.evaluate(&state).value
        }
    }

    fn softmax_sample(&mut self, scored: &[(Move, f64)]) -> Move {
        let max_score = scored.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = scored.iter().map(|(_, s)| (s - max_score).exp()).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return scored[0].0.clone();
        }
        let mut pick = self.rng.gen::<f64>() * total;
        for (w, (mv, _)) in weights.iter().zip(scored.iter()) {
            if pick < *w {
                return mv.clone();
            }
            pick -= w;
        }
        scored.last().expect("non-empty").0.clone()
    }

    fn backup(&self, arena: &mut [Node], path: &[usize], leaf_value: f64) {
        let mut value = leaf_value;
        for &idx in path.iter().rev() {
            arena[idx].visits += 1;
            arena[idx].value_sum += value;
            value = -value;
        }
    }

    /// Record a child node in whichever of the two transposition tables
    /// matches its side to move, evicting the least-recently-touched entry
    /// from that table when it is full.
    fn remember(&mut self, key: u64, idx: usize, root_player: Player, child_player: Player) {
        self.tick += 1;
        let (table, ticks) = if child_player == root_player {
            (&mut self.self_tt, &mut self.self_tick)
        } else {
            (&mut self.opponent_tt, &mut self.opponent_tick)
        };

        if table.len() >= self.config.max_transposition_size {
            evict_lru(table, ticks);
        }
        table.entry(key).or_insert(idx);
        ticks.insert(key, self.tick);
    }
}

fn evict_lru(table: &mut HashMap<u64, usize>, ticks: &mut HashMap<u64, u64>) {
    if let Some((&oldest_key, _)) = ticks.iter().min_by_key(|(_, &t)| t) {
        table.remove(&oldest_key);
        ticks.remove(&oldest_key);
    }
}

fn puct_score(child: &Node, parent_visits: f64, c: f64) -> f64 {
    let q = if child.visits > 0 { -(child.value_sum / child.visits as f64) } else { 0.0 };
    let u = c * child.prior * parent_visits.sqrt() / (1.0 + child.visits as f64);
    q + u
}

fn terminal_value(winner: Winner, perspective: Player) -> f64 {
    match winner {
        Winner::Draw => 0.0,
        Winner::Black if perspective == Player::Black => 1.0,
        Winner::White if perspective == Player::White => 1.0,
        _ => -1.0,
    }
}

#[derive(Debug, Clone)]
pub struct DecisionMeta {
    pub simulations: u32,
    pub root_visits: u32,
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub mv: Move,
    pub score: f64,
    pub meta: DecisionMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;

    #[test]
    fn search_returns_a_legal_move_on_empty_board() {
        let evaluator = UniformEvaluator;
        let mut config = MctsConfig::default();
        config.simulation_count = 20;
        config.simulation_steps = 4;
        let mut engine = MctsEngine::new(config, &evaluator);
        let state = GameState::create_initial();
        let decision = engine.search(&state).unwrap();
        assert_eq!(decision.mv.positions, vec![Position::new(9, 9)]);
    }

    #[test]
    fn errors_on_terminal_root() {
        let evaluator = UniformEvaluator;
        let config = MctsConfig::default();
        let mut engine = MctsEngine::new(config, &evaluator);
        let mut state = GameState::create_initial();
        state = state.apply(&Move::single(Player::Black, Position::new(0, 1))).unwrap();
        state = state
            .apply(&Move::pair(Player::White, Position::new(10, 10), Position::new(10, 11)))
            .unwrap();
        state = state
            .apply(&Move::pair(Player::Black, Position::new(1, 1), Position::new(2, 1)))
            .unwrap();
        state = state
            .apply(&Move::pair(Player::White, Position::new(10, 12), Position::new(10, 13)))
            .unwrap();
        state = state
            .apply(&Move::pair(Player::Black, Position::new(3, 1), Position::new(4, 1)))
            .unwrap();
        state = state
            .apply(&Move::pair(Player::White, Position::new(10, 14), Position::new(10, 15)))
            .unwrap();
        state = state
            .apply(&Move::pair(Player::Black, Position::new(5, 1), Position::new(15, 15)))
            .unwrap();
        assert!(state.is_game_over());
        let result = engine.search(&state);
        assert!(matches!(result, Err(Connect6Error::TerminalState)));
    }
}

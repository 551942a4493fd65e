use connect6_engine::config::{EvaluationWeights, MctsConfig, SearchConfig};
use connect6_engine::mcts::{MctsEngine, UniformEvaluator};
use connect6_engine::{GameState, Move, Player, Position, PvsEngine};

fn fast_search_config() -> SearchConfig {
    SearchConfig { max_depth: 2, time_limit_ms: 200, use_multithreading: false }
}

#[test]
fn opening_move_is_board_center() {
    let mut engine = PvsEngine::new(EvaluationWeights::default());
    let state = GameState::create_initial();
    let decision = engine.decide(&state, fast_search_config()).unwrap();
    assert_eq!(decision.mv.positions, vec![Position::new(9, 9)]);
}

#[test]
fn engine_takes_an_immediate_win_over_further_search() {
    let mut engine = PvsEngine::new(EvaluationWeights::default());
    let mut state = GameState::create_initial();
    state = state.apply(&Move::single(Player::Black, Position::new(1, 1))).unwrap();
    state = state.apply(&Move::pair(Player::White, Position::new(10, 10), Position::new(10, 11))).unwrap();
    state = state.apply(&Move::pair(Player::Black, Position::new(2, 1), Position::new(3, 1))).unwrap();
    state = state.apply(&Move::pair(Player::White, Position::new(10, 12), Position::new(10, 13))).unwrap();
    state = state.apply(&Move::pair(Player::Black, Position::new(4, 1), Position::new(5, 1))).unwrap();
    state = state.apply(&Move::pair(Player::White, Position::new(10, 14), Position::new(10, 15))).unwrap();

    let decision = engine.decide(&state, fast_search_config()).unwrap();
    assert_eq!(decision.meta.mode, "forced_win");
    let next = state.apply(&decision.mv).unwrap();
    assert_eq!(next.winner(), Some(connect6_engine::Winner::Black));
}

#[test]
fn engine_blocks_an_opponent_live_four() {
    let mut engine = PvsEngine::new(EvaluationWeights::default());
    let mut state = GameState::create_initial();
    state = state.apply(&Move::single(Player::Black, Position::new(0, 0))).unwrap();
    state = state.apply(&Move::pair(Player::White, Position::new(1, 1), Position::new(2, 1))).unwrap();
    state = state.apply(&Move::pair(Player::Black, Position::new(17, 17), Position::new(17, 18))).unwrap();
    state = state.apply(&Move::pair(Player::White, Position::new(3, 1), Position::new(4, 1))).unwrap();

    let decision = engine.decide(&state, fast_search_config()).unwrap();
    assert_eq!(decision.meta.mode, "smart_defense");
    assert!(
        decision.mv.positions.contains(&Position::new(0, 1))
            || decision.mv.positions.contains(&Position::new(5, 1))
    );
}

#[test]
fn two_stone_win_completes_a_five_stone_line() {
    let mut engine = PvsEngine::new(EvaluationWeights::default());
    let mut state = GameState::create_initial();
    state = state.apply(&Move::single(Player::Black, Position::new(6, 6))).unwrap();
    state = state.apply(&Move::pair(Player::White, Position::new(12, 12), Position::new(12, 13))).unwrap();
    state = state.apply(&Move::pair(Player::Black, Position::new(7, 6), Position::new(8, 6))).unwrap();
    state = state.apply(&Move::pair(Player::White, Position::new(12, 14), Position::new(12, 15))).unwrap();
    // Black has three in a row at x=6..8,y=6; deliberately leave two gaps
    // to complete on the next turn via a two-stone win.
    state = state.apply(&Move::pair(Player::Black, Position::new(9, 6), Position::new(18, 18))).unwrap();
    state = state.apply(&Move::pair(Player::White, Position::new(12, 16), Position::new(12, 17))).unwrap();

    assert!(!state.is_game_over());
    let decision = engine.decide(&state, fast_search_config()).unwrap();
    assert_eq!(decision.meta.mode, "forced_win");
    let next = state.apply(&decision.mv).unwrap();
    assert_eq!(next.winner(), Some(connect6_engine::Winner::Black));
}

#[test]
fn mcts_is_deterministic_under_the_uniform_oracle_for_a_fixed_seed() {
    let evaluator = UniformEvaluator;
    let mut config = MctsConfig::default();
    config.simulation_count = 40;
    config.simulation_steps = 6;
    config.seed = 123;

    let state = GameState::create_initial();

    let mut engine_a = MctsEngine::new(config, &evaluator);
    let decision_a = engine_a.search(&state).unwrap();

    let mut engine_b = MctsEngine::new(config, &evaluator);
    let decision_b = engine_b.search(&state).unwrap();

    assert_eq!(decision_a.mv.positions, decision_b.mv.positions);
}

use connect6_engine::config::{EvaluationWeights, SearchConfig};
use connect6_engine::{GameState, PvsEngine};

fn main() {
    println!("Connect6 Decision Core - Self-Play Demo");
    println!("========================================\n");

    let weights = EvaluationWeights::default();
    let search_config = SearchConfig::default();
    let mut engine = PvsEngine::new(weights);
    let mut state = GameState::create_initial();

    let mut ply = 0;
    while !state.is_game_over() && ply < 40 {
        let decision = match engine.decide(&state, search_config) {
            Ok(d) => d,
            Err(e) => {
                println!("engine error: {e}");
                break;
            }
        };

        println!(
            "ply {:>3}: {} (mode={}, score={:.1})",
            ply, decision.mv, decision.meta.mode, decision.score
        );

        state = match state.apply(&decision.mv) {
            Ok(s) => s,
            Err(e) => {
                println!("illegal move rejected: {e}");
                break;
            }
        };
        ply += 1;
    }

    println!("\n{}", state.display_board());
    match state.winner() {
        Some(winner) => println!("Result: {winner:?}"),
        None => println!("Result: move limit reached"),
    }
}

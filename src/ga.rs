//! Self-play genetic algorithm: tunes `EvaluationWeights` by playing
//! population members against each other and breeding the winners.

use crate::board::{Player, Winner};
use crate::config::{EvaluationWeights, SearchConfig};
use crate::error::Result;
use crate::eval::StaticEvaluator;
use crate::road::RoadTable;
use crate::selfplay::{self, SelfPlayConfig};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// `(min, max)` initialization range for each tunable weight.
const ROAD3_RANGE: (f64, f64) = (80.0, 120.0);
const ROAD4_RANGE: (f64, f64) = (300.0, 400.0);
const LIVE4_RANGE: (f64, f64) = (2_500.0, 3_500.0);
const LIVE5_RANGE: (f64, f64) = (8_000.0, 12_000.0);
const VCDT_BONUS_RANGE: (f64, f64) = (1_000.0, 2_000.0);

/// Clamp range shared by every mutated field.
const MUTATION_CLAMP: (f64, f64) = (50.0, 20_000.0);

/// Ply cap and per-ply search schedule for GA fitness self-play: depth 2
/// for the first 10 plies, depth 3 after, 120 ms budget.
const GA_MAX_PLIES: u32 = 36;

fn ga_search_schedule(ply: u32) -> SearchConfig {
    SearchConfig {
        max_depth: if ply < 10 { 2 } else { 3 },
        time_limit_ms: 120,
        use_multithreading: false,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GaConfig {
    pub population_size: usize,
    pub generations: u32,
    pub match_count: u32,
    pub mutation_rate: f64,
    pub mutation_scale: f64,
    pub elite_count: usize,
    pub selfplay: SelfPlayConfig,
}

impl Default for GaConfig {
    fn default() -> Self {
        GaConfig {
            population_size: 12,
            generations: 20,
            match_count: 4,
            mutation_rate: 0.15,
            mutation_scale: 0.075,
            elite_count: 2,
            selfplay: SelfPlayConfig {
                max_plies: GA_MAX_PLIES,
                search: SearchConfig { max_depth: 3, time_limit_ms: 120, use_multithreading: false },
                ply_search: Some(ga_search_schedule),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Individual {
    weights: EvaluationWeights,
    fitness: f64,
}

pub struct GeneticOptimizer {
    config: GaConfig,
    rng: StdRng,
    population: Vec<Individual>,
    table: RoadTable,
}

/// Portable JSON persistence format for a tuned weight vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaExport {
    pub name: String,
    pub exported_at: String,
    pub weights: EvaluationWeights,
    pub search_config: SearchConfig,
    pub note: String,
}

impl GeneticOptimizer {
    pub fn new(config: GaConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let population = (0..config.population_size)
            .map(|_| Individual { weights: random_weights(&mut rng), fitness: 0.0 })
            .collect();
        GeneticOptimizer { config, rng, population, table: RoadTable::new() }
    }

    pub fn run(&mut self) -> Result<EvaluationWeights> {
        let mut best = self.population[0].clone();

        for generation in 0..self.config.generations {
            self.evaluate_fitness()?;

            if let Some(top) = self.population.iter().max_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap()) {
                if top.fitness > best.fitness {
                    best = top.clone();
                }
            }

            info!(
                "generation {generation}: best_fitness={:.3} population_best={:.3}",
                best.fitness,
                self.population.iter().map(|i| i.fitness).fold(f64::MIN, f64::max)
            );

            self.population = self.next_generation();
        }

        self.evaluate_fitness()?;
        if let Some(top) = self.population.iter().max_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap()) {
            if top.fitness > best.fitness {
                best = top.clone();
            }
        }

        Ok(best.weights)
    }

    fn evaluate_fitness(&mut self) -> Result<()> {
        let n = self.population.len();
        for i in 0..n {
            let mut total = 0.0;
            for k in 0..self.config.match_count {
                let opponent = (i + 1 + (k as usize % n.max(1))) % n;
                let candidate = self.population[i].weights;
                let rival = self.population[opponent].weights;
                let outcome = selfplay::play_match(k, candidate, rival, self.config.selfplay)?;
                let candidate_is_black = k % 2 == 0;
                let candidate_player = if candidate_is_black { Player::Black } else { Player::White };
                let evaluator = StaticEvaluator::new(candidate, &self.table);
                let eval = evaluator.evaluate(&outcome.final_state, candidate_player);
                total += score_for(&outcome.winner, candidate_is_black, outcome.plies, eval);
            }
            self.population[i].fitness = total / self.config.match_count.max(1) as f64;
        }
        Ok(())
    }

    fn next_generation(&mut self) -> Vec<Individual> {
        let mut ranked = self.population.clone();
        ranked.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap());

        let mut next: Vec<Individual> = ranked.iter().take(self.config.elite_count).cloned().collect();

        while next.len() < self.config.population_size {
            let parent_a = self.select_proportionate(&ranked);
            let parent_b = self.select_proportionate(&ranked);
            let child_weights = self.mutate(crossover(parent_a, parent_b));
            next.push(Individual { weights: child_weights, fitness: 0.0 });
        }

        next
    }

    fn select_proportionate(&mut self, ranked: &[Individual]) -> EvaluationWeights {
        let total: f64 = ranked.iter().map(|i| i.fitness.max(0.0) + 1e-6).sum();
        let mut pick = self.rng.gen::<f64>() * total;
        for individual in ranked {
            let share = individual.fitness.max(0.0) + 1e-6;
            if pick < share {
                return individual.weights;
            }
            pick -= share;
        }
        ranked.last().expect("non-empty population").weights
    }

    fn mutate(&mut self, weights: EvaluationWeights) -> EvaluationWeights {
        let scale = self.config.mutation_scale;
        let rate = self.config.mutation_rate;

        EvaluationWeights {
            road3: maybe_mutate(&mut self.rng, weights.road3, rate, scale),
            road4: maybe_mutate(&mut self.rng, weights.road4, rate, scale),
            live4: maybe_mutate(&mut self.rng, weights.live4, rate, scale),
            live5: maybe_mutate(&mut self.rng, weights.live5, rate, scale),
            vcdt_bonus: maybe_mutate(&mut self.rng, weights.vcdt_bonus, rate, scale),
        }
    }
}

fn crossover(a: EvaluationWeights, b: EvaluationWeights) -> EvaluationWeights {
    EvaluationWeights {
        road3: (a.road3 + b.road3) / 2.0,
        road4: (a.road4 + b.road4) / 2.0,
        live4: (a.live4 + b.live4) / 2.0,
        live5: (a.live5 + b.live5) / 2.0,
        vcdt_bonus: (a.vcdt_bonus + b.vcdt_bonus) / 2.0,
    }
}

fn maybe_mutate(rng: &mut StdRng, value: f64, rate: f64, scale: f64) -> f64 {
    if rng.gen::<f64>() >= rate {
        return value;
    }
    let factor = 1.0 + rng.gen_range(-scale..=scale);
    (value * factor).clamp(MUTATION_CLAMP.0, MUTATION_CLAMP.1)
}

fn random_weights(rng: &mut StdRng) -> EvaluationWeights {
    EvaluationWeights {
        road3: rng.gen_range(ROAD3_RANGE.0..=ROAD3_RANGE.1),
        road4: rng.gen_range(ROAD4_RANGE.0..=ROAD4_RANGE.1),
        live4: rng.gen_range(LIVE4_RANGE.0..=LIVE4_RANGE.1),
        live5: rng.gen_range(LIVE5_RANGE.0..=LIVE5_RANGE.1),
        vcdt_bonus: rng.gen_range(VCDT_BONUS_RANGE.0..=VCDT_BONUS_RANGE.1),
    }
}

/// `winBlackBonus + longevityBonus(steps/40·0.1) + stabilityBonus(eval/50,000·0.05)`,
/// where `winBlackBonus` is 1/0/0.5 for a candidate win/loss/draw and `eval`
/// is the final position scored from the candidate's own perspective with
/// its own weights.
fn score_for(winner: &Option<Winner>, candidate_is_black: bool, steps: u32, eval: f64) -> f64 {
    let win_bonus = match winner {
        None => 0.5,
        Some(Winner::Draw) => 0.5,
        Some(Winner::Black) => if candidate_is_black { 1.0 } else { 0.0 },
        Some(Winner::White) => if candidate_is_black { 0.0 } else { 1.0 },
    };
    let longevity_bonus = (steps as f64 / 40.0) * 0.1;
    let stability_bonus = (eval / 50_000.0) * 0.05;
    win_bonus + longevity_bonus + stability_bonus
}

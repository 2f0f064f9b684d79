//! Generation-to-generation population management.
//!
//! Takes a ranked generation (best first) and builds the next one: the top
//! `elite_size` genomes carry over unchanged, and the rest are offspring of
//! tournament winners.

use rand::Rng;

use crate::config::OptimizerConfig;
use crate::constants::TOURNAMENT_SIZE;
use crate::fitness::FitnessRecord;
use crate::variation::VariationGenerator;
use crate::Genome;

/// Pick one parent from `ranked` (sorted by descending fitness).
///
/// Draws [`TOURNAMENT_SIZE`] contestants with replacement and returns the
/// fittest; ties go to the better-ranked contestant. `None` for an empty
/// slice.
pub fn tournament_select<'a, R: Rng>(
    ranked: &'a [FitnessRecord],
    rng: &mut R,
) -> Option<&'a FitnessRecord> {
    if ranked.is_empty() {
        return None;
    }

    let mut winner = rng.gen_range(0..ranked.len());
    for _ in 1..TOURNAMENT_SIZE {
        let challenger = rng.gen_range(0..ranked.len());
        let (w, c) = (&ranked[winner], &ranked[challenger]);
        if c.fitness > w.fitness || (c.fitness == w.fitness && challenger < winner) {
            winner = challenger;
        }
    }

    ranked.get(winner)
}

/// Builds successive generations with elitism and tournament selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationManager {
    population_size: usize,
    elite_size: usize,
    variation: VariationGenerator,
}

impl PopulationManager {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            population_size: config.population_size,
            elite_size: config.elite_size.min(config.population_size),
            variation: VariationGenerator::from_config(config),
        }
    }

    /// Replace the variation operators.
    pub fn with_variation(mut self, variation: VariationGenerator) -> Self {
        self.variation = variation;
        self
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn elite_size(&self) -> usize {
        self.elite_size
    }

    pub fn variation(&self) -> &VariationGenerator {
        &self.variation
    }

    /// Build the next generation from `ranked`.
    ///
    /// The result has exactly `population_size` genomes whose first
    /// `min(elite_size, ranked.len())` entries are the leading genomes of
    /// `ranked`. Returns an empty population when `ranked` is empty.
    pub fn next_generation<R: Rng>(&self, ranked: &[FitnessRecord], rng: &mut R) -> Vec<Genome> {
        if ranked.is_empty() {
            return Vec::new();
        }

        let mut next: Vec<Genome> = ranked
            .iter()
            .take(self.elite_size)
            .map(|record| record.genome.clone())
            .collect();

        while next.len() < self.population_size {
            let parents = tournament_select(ranked, rng).zip(tournament_select(ranked, rng));
            let Some((parent1, parent2)) = parents else {
                break;
            };
            next.push(
                self.variation
                    .offspring(&parent1.genome, &parent2.genome, rng),
            );
        }

        next
    }
}

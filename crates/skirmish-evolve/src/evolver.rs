use rand::{Rng, seq::IndexedRandom};

use crate::{population::{Genome, Population}, weights};

/// Evolution parameters for producing the next generation.
#[derive(Debug, Clone)]
pub struct PopulationEvolver {
    /// Number of top genomes carried over unchanged.
    pub elite_count: usize,
    /// Tournament size for parent selection; larger means stronger pressure.
    pub tournament_size: usize,
    /// Standard deviation of Gaussian mutation noise.
    pub mutation_sigma: f32,
    /// BLX-α crossover expansion factor.
    pub blx_alpha: f32,
    /// Per-gene mutation probability.
    pub mutation_rate: f32,
    /// Weights are clamped to `[-max_weight, max_weight]`.
    pub max_weight: f32,
}

impl PopulationEvolver {
    /// Produces the next generation from a fitness-sorted population.
    ///
    /// Elites keep their genome keys; offspring are assigned fresh keys so
    /// identity-based fitness reassignment can never confuse generations.
    ///
    /// # Panics
    ///
    /// Panics if the population is not sorted best-first.
    #[must_use]
    pub fn evolve<R>(&self, population: &Population, rng: &mut R) -> Population
    where
        R: Rng + ?Sized,
    {
        assert!(
            population
                .genomes()
                .is_sorted_by(|a, b| a.fitness() >= b.fitness()),
            "population must be sorted by fitness before evolving"
        );

        let elites: Vec<Genome> = population
            .genomes()
            .iter()
            .take(self.elite_count)
            .cloned()
            .collect();
        let mut next = Population::from_parts(
            population.input_len(),
            population.output_len(),
            population.next_key(),
            elites,
        );

        while next.len() < population.len() {
            let p1 = tournament_select(population.genomes(), self.tournament_size, rng);
            let p2 = tournament_select(population.genomes(), self.tournament_size, rng);

            let mut child = weights::blx_alpha(
                p1.weights(),
                p2.weights(),
                self.blx_alpha,
                self.max_weight,
                rng,
            );
            weights::mutate(
                &mut child,
                self.mutation_sigma,
                self.max_weight,
                self.mutation_rate,
                rng,
            );
            next.push_offspring(child);
        }

        next
    }
}

/// Picks the fittest of `tournament_size` randomly chosen genomes.
fn tournament_select<'a, R>(
    genomes: &'a [Genome],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Genome
where
    R: Rng + ?Sized,
{
    assert!(tournament_size > 0);
    genomes
        .choose_multiple(rng, tournament_size)
        .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
        .expect("population must not be empty")
}

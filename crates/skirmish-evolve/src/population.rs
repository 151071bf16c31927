use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{policy::FeedForwardPolicy, weights};

/// Stable identity of a genome within one engine.
///
/// Keys survive cloning and serialization, and are never reused within a
/// run. Parallel evaluation reassigns fitness by key, so two genomes in the
/// same population must never share one.
pub type GenomeKey = u64;

/// One candidate policy: a weight vector plus its most recent fitness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    key: GenomeKey,
    weights: Vec<f32>,
    fitness: f32,
}

impl Genome {
    #[must_use]
    pub fn key(&self) -> GenomeKey {
        self.key
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }
}

/// An ordered collection of genomes sharing one policy topology.
///
/// Ordering is load-bearing: the generation evaluator pairs genome `i` of
/// one population with genome `i` of the other, so the slice returned by
/// [`genomes`](Self::genomes) is the canonical pairing representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    input_len: usize,
    output_len: usize,
    next_key: GenomeKey,
    genomes: Vec<Genome>,
}

impl Population {
    /// Creates a population of random genomes for the given topology.
    #[must_use]
    pub fn random<R>(
        input_len: usize,
        output_len: usize,
        count: usize,
        max_weight: f32,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let weight_len = FeedForwardPolicy::weight_len(input_len, output_len);
        let genomes = (0..count as GenomeKey)
            .map(|key| Genome {
                key,
                weights: weights::random(rng, max_weight, weight_len),
                fitness: f32::MIN,
            })
            .collect();
        Self {
            input_len,
            output_len,
            next_key: count as GenomeKey,
            genomes,
        }
    }

    #[must_use]
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    #[must_use]
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    pub fn genomes_mut(&mut self) -> &mut [Genome] {
        &mut self.genomes
    }

    /// Builds the decision function for one genome.
    #[must_use]
    pub fn policy_for(&self, genome: &Genome) -> FeedForwardPolicy {
        FeedForwardPolicy::new(self.input_len, self.output_len, genome.weights.clone())
    }

    /// Sorts genomes best-first. Evolution requires this ordering.
    pub fn sort_by_fitness_desc(&mut self) {
        self.genomes
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    }

    /// Mean fitness across the population.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn mean_fitness(&self) -> f32 {
        if self.genomes.is_empty() {
            return 0.0;
        }
        self.genomes.iter().map(Genome::fitness).sum::<f32>() / self.genomes.len() as f32
    }

    pub(crate) fn allocate_key(&mut self) -> GenomeKey {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    pub(crate) fn next_key(&self) -> GenomeKey {
        self.next_key
    }

    pub(crate) fn from_parts(
        input_len: usize,
        output_len: usize,
        next_key: GenomeKey,
        genomes: Vec<Genome>,
    ) -> Self {
        Self {
            input_len,
            output_len,
            next_key,
            genomes,
        }
    }

    pub(crate) fn push_offspring(&mut self, weights: Vec<f32>) {
        let key = self.allocate_key();
        self.genomes.push(Genome {
            key,
            weights,
            fitness: 0.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    fn small_population() -> Population {
        let mut rng = Pcg32::seed_from_u64(3);
        Population::random(8, 8, 6, 4.0, &mut rng)
    }

    #[test]
    fn test_random_population_has_unique_keys() {
        let population = small_population();
        let mut keys: Vec<_> = population.genomes().iter().map(Genome::key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), population.len());
    }

    #[test]
    fn test_genome_weight_length_matches_topology() {
        let population = small_population();
        for genome in population.genomes() {
            assert_eq!(
                genome.weights().len(),
                FeedForwardPolicy::weight_len(8, 8)
            );
        }
    }

    #[test]
    fn test_sort_by_fitness_desc() {
        let mut population = small_population();
        let scores = [3.0, -1.0, 10.0, 0.0, 7.0, 2.0];
        for (genome, score) in population.genomes_mut().iter_mut().zip(scores) {
            genome.set_fitness(score);
        }
        population.sort_by_fitness_desc();
        let sorted: Vec<_> = population.genomes().iter().map(Genome::fitness).collect();
        assert_eq!(sorted, vec![10.0, 7.0, 3.0, 2.0, 0.0, -1.0]);
    }

    #[test]
    fn test_mean_fitness() {
        let mut population = small_population();
        for (i, genome) in population.genomes_mut().iter_mut().enumerate() {
            genome.set_fitness(i as f32);
        }
        assert!((population.mean_fitness() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_offspring_receive_fresh_keys() {
        let mut population = small_population();
        let before = population.next_key();
        population.push_offspring(vec![0.0; FeedForwardPolicy::weight_len(8, 8)]);
        let newest = population.genomes().last().unwrap();
        assert_eq!(newest.key(), before);
        assert_eq!(population.next_key(), before + 1);
    }
}

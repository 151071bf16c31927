use crate::population::{Genome, Population};

/// Hook invoked after every generation's fitness evaluation completes.
///
/// The population is sorted best-first when the hook runs, and `generation`
/// is the 1-indexed count of completed generations.
pub trait GenerationReporter {
    fn generation_complete(&mut self, generation: u32, population: &Population);
}

/// Prints a one-line generation summary to stderr.
#[derive(Debug)]
pub struct StdOutReporter {
    label: String,
}

impl StdOutReporter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl GenerationReporter for StdOutReporter {
    fn generation_complete(&mut self, generation: u32, population: &Population) {
        let best = population.genomes().first().map_or(0.0, Genome::fitness);
        eprintln!(
            "[{}] generation {generation}: best {best:.1}, mean {:.1} over {} genomes",
            self.label,
            population.mean_fitness(),
            population.len(),
        );
    }
}

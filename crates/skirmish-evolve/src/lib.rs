//! Generation-based population optimization for control policies.
//!
//! This crate is the evolution-engine side of the training system. The
//! episode harness only touches it through a narrow surface:
//!
//! - [`Population`] - an ordered collection of [`Genome`]s with mutable
//!   fitness, addressed positionally during pairing and by [`GenomeKey`]
//!   when parallel evaluation results are reassigned
//! - [`Policy`] / [`FeedForwardPolicy`] - the decision function built from a
//!   genome, exposing an ordered activation vector per observation
//! - [`EvolutionEngine`] - generation bookkeeping, reporter hooks, and
//!   serializable [`EngineState`] snapshots for checkpointing
//!
//! Everything else (selection, crossover, mutation) is internal to this
//! crate and can change without touching the harness.

pub use self::{engine::*, evolver::*, policy::*, population::*, reporter::*};

mod engine;
mod evolver;
mod policy;
mod population;
mod reporter;
pub mod weights;

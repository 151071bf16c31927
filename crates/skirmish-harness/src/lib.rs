//! Episode harness: drives matches, assigns fitness, checkpoints runs.
//!
//! The crate sits between the combat simulation (`skirmish-arena`), the
//! evolution engine (`skirmish-evolve`), and the episode archive
//! (`skirmish-archive`):
//!
//! - [`run_episode`] plays one match between two policies to a terminal
//!   outcome and produces a fully populated [`skirmish_archive::EpisodeRecord`]
//! - [`GenerationEvaluator`] maps a whole population pairing to fitness,
//!   sequentially or across a worker pool
//! - [`CheckpointManager`] makes multi-generation runs resumable across
//!   process restarts
//! - [`Trainer`] alternates the two sides through the co-training schedule
//!
//! All mutable evaluation state travels through an explicit [`EvalContext`];
//! nothing here relies on process-global counters, which is what keeps the
//! parallel evaluator honest.

pub use self::{
    checkpoint::*, context::*, episode::*, fitness::*, generation::*, input::*, render::*,
    trainer::*,
};

mod checkpoint;
mod context;
mod episode;
mod fitness;
mod generation;
mod input;
mod render;
mod trainer;
